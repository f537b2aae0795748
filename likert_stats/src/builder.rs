pub use crate::config::*;
use crate::run_survey_analysis;

use std::collections::HashMap;

/// A builder for assembling survey data from code.
///
/// Most callers load rows from a file through the command line interface;
/// the builder is the programmatic path for embedding the analysis in
/// another tool or in tests.
///
/// ```
/// use likert_stats::builder::Builder;
/// use likert_stats::{AnalysisRules, ScoreScale, SubsetSelection};
///
/// let mut builder = Builder::new(ScoreScale::default_scale(), AnalysisRules::DEFAULT_RULES)
///     .category("Culture", &["Q1", "Q2"]);
///
/// builder.add_row("Eng", "HQ", &[("Q1", "4"), ("Q2", "5")]);
/// builder.add_row("Ops", "Remote", &[("Q1", "2"), ("Q2", "")]);
///
/// let report = builder.run(&SubsetSelection::all())?;
/// assert_eq!(report.population.response_count, 2);
/// assert_eq!(report.population.categories[0].valid, 3);
/// # Ok::<(), likert_stats::StatsErrors>(())
/// ```
pub struct Builder {
    pub(crate) _scale: ScoreScale,
    pub(crate) _rules: AnalysisRules,
    pub(crate) _categories: Vec<Category>,
    pub(crate) _rows: Vec<ResponseRow>,
}

impl Builder {
    pub fn new(scale: ScoreScale, rules: AnalysisRules) -> Builder {
        Builder {
            _scale: scale,
            _rules: rules,
            _categories: Vec::new(),
            _rows: Vec::new(),
        }
    }

    /// Declares a category and the questions that roll up into it.
    pub fn category(mut self, name: &str, questions: &[&str]) -> Builder {
        self._categories.push(Category {
            name: name.to_string(),
            questions: questions.iter().map(|q| q.to_string()).collect(),
        });
        self
    }

    /// Adds one response. Answers are textual cell values; the normalizer
    /// takes care of labels, numeric text and blanks.
    pub fn add_row(&mut self, team: &str, location: &str, answers: &[(&str, &str)]) {
        let id = format!("row-{:08}", self._rows.len() + 1);
        let answers: HashMap<String, RawValue> = answers
            .iter()
            .map(|(question, value)| {
                let raw = if value.trim().is_empty() {
                    RawValue::Empty
                } else {
                    RawValue::Text((*value).to_string())
                };
                ((*question).to_string(), raw)
            })
            .collect();
        self._rows.push(ResponseRow {
            id,
            team: team.to_string(),
            location: location.to_string(),
            answers,
        });
    }

    /// Adds an already-assembled row, for callers that build their own.
    pub fn add_row_raw(&mut self, row: &ResponseRow) {
        self._rows.push(row.clone());
    }

    /// Runs the analysis for the given selection over everything added so
    /// far. The builder can be run repeatedly with different selections.
    pub fn run(&self, selection: &SubsetSelection) -> Result<AnalysisReport, StatsErrors> {
        run_survey_analysis(
            &self._rows,
            &self._categories,
            &self._scale,
            &self._rules,
            selection,
        )
    }
}
