mod config;
pub mod builder;
pub mod quick_start;

use log::{debug, info};

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

pub use crate::config::*;

// **** Score normalization ****

/// Collapses every whitespace run into a single space and trims the ends.
/// Column headers and labels are compared in this form.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Converts one raw cell value into a normalized Likert score.
///
/// The mapping is total and pure: every input has a defined outcome and
/// repeated normalization of the same input yields the same result.
/// - a number whose (optionally rounded) value falls inside the scale maps
///   to that integer;
/// - a number outside the scale, or fractional with rounding disabled, is
///   missing;
/// - text matching a configured label (case- and whitespace-insensitive)
///   maps to the label's score;
/// - numeric text is re-read as a number;
/// - everything else, including blanks, is missing.
pub fn normalize_value(raw: &RawValue, scale: &ScoreScale) -> NormalizedScore {
    match raw {
        RawValue::Empty => NormalizedScore::Missing,
        RawValue::Number(x) => {
            let candidate = if scale.round_fractional {
                x.round()
            } else if x.fract() == 0.0 {
                *x
            } else {
                return NormalizedScore::Missing;
            };
            if candidate >= scale.min as f64 && candidate <= scale.max as f64 {
                NormalizedScore::Valid(candidate as i32)
            } else {
                NormalizedScore::Missing
            }
        }
        RawValue::Text(s) => {
            let cleaned = collapse_whitespace(s);
            if cleaned.is_empty() {
                return NormalizedScore::Missing;
            }
            for (label, score) in scale.labels.iter() {
                if collapse_whitespace(label).eq_ignore_ascii_case(&cleaned) {
                    return normalize_value(&RawValue::Number(*score as f64), scale);
                }
            }
            if let Ok(x) = cleaned.parse::<f64>() {
                return normalize_value(&RawValue::Number(x), scale);
            }
            NormalizedScore::Missing
        }
    }
}

// **** Score matrix ****

/// Normalized scores for every (row, question) pair of the run, computed
/// once and shared by all aggregation passes.
///
/// The cache is keyed by (row identifier, question name) so that the
/// population pass and any number of selection passes never re-normalize a
/// cell. Building the matrix also collects the data-quality notes.
#[derive(PartialEq, Debug, Clone)]
pub struct ScoreMatrix {
    scores: HashMap<(String, String), NormalizedScore>,
    notes: Vec<DataQualityNote>,
}

impl ScoreMatrix {
    pub fn build(rows: &[ResponseRow], categories: &[Category], scale: &ScoreScale) -> ScoreMatrix {
        let mut scores: HashMap<(String, String), NormalizedScore> = HashMap::new();
        let mut notes: Vec<DataQualityNote> = Vec::new();

        // Questions the configuration references but no row carries.
        for category in categories.iter() {
            for question in category.questions.iter() {
                let anywhere = rows.iter().any(|r| r.answers.contains_key(question));
                if !anywhere {
                    notes.push(DataQualityNote::MissingQuestion {
                        category: category.name.clone(),
                        question: question.clone(),
                    });
                }
            }
        }

        for row in rows.iter() {
            for category in categories.iter() {
                for question in category.questions.iter() {
                    let raw = match row.answer(question) {
                        Some(raw) => raw,
                        None => continue,
                    };
                    let score = normalize_value(raw, scale);
                    if score == NormalizedScore::Missing {
                        match raw {
                            RawValue::Number(x) => notes.push(DataQualityNote::InvalidNumber {
                                row_id: row.id.clone(),
                                question: question.clone(),
                                value: *x,
                            }),
                            RawValue::Text(s) if !collapse_whitespace(s).is_empty() => {
                                notes.push(DataQualityNote::UnrecognizedValue {
                                    row_id: row.id.clone(),
                                    question: question.clone(),
                                    value: collapse_whitespace(s),
                                })
                            }
                            _ => {}
                        }
                    }
                    scores.insert((row.id.clone(), question.clone()), score);
                }
            }
        }

        debug!(
            "ScoreMatrix::build: {} cells normalized, {} notes",
            scores.len(),
            notes.len()
        );
        ScoreMatrix { scores, notes }
    }

    /// The normalized score for a (row, question) pair. A pair that was never
    /// observed is missing, it is not an error.
    pub fn score(&self, row_id: &str, question: &str) -> NormalizedScore {
        self.scores
            .get(&(row_id.to_string(), question.to_string()))
            .cloned()
            .unwrap_or(NormalizedScore::Missing)
    }

    pub fn notes(&self) -> &[DataQualityNote] {
        &self.notes
    }
}

// **** Aggregation ****

fn mean_of(sum: f64, count: usize) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Computes the aggregate statistics for the rows matched by `selection`.
///
/// Category and overall means are flattened means over all valid scores, not
/// means of question means, so that a category with few questions cannot
/// dominate the rollup. A subset with zero rows, or a category with zero
/// valid responses, yields `None` means rather than any numeric output.
pub fn aggregate_stats(
    rows: &[ResponseRow],
    matrix: &ScoreMatrix,
    categories: &[Category],
    scale: &ScoreScale,
    selection: &SubsetSelection,
) -> SurveyStats {
    let selected: Vec<&ResponseRow> = rows.iter().filter(|r| selection.matches(r)).collect();
    debug!(
        "aggregate_stats: {} of {} rows selected",
        selected.len(),
        rows.len()
    );

    let mut category_stats: Vec<CategoryStats> = Vec::new();
    let mut all_sum = 0.0;
    let mut all_valid = 0usize;

    for category in categories.iter() {
        let mut question_stats: Vec<QuestionStats> = Vec::new();
        let mut cat_sum = 0.0;
        let mut cat_valid = 0usize;
        let mut cat_missing = 0usize;
        let mut distribution: BTreeMap<i32, usize> =
            (scale.min..=scale.max).map(|s| (s, 0)).collect();

        for question in category.questions.iter() {
            let mut q_sum = 0.0;
            let mut q_valid = 0usize;
            let mut q_missing = 0usize;
            for row in selected.iter() {
                match matrix.score(&row.id, question) {
                    NormalizedScore::Valid(score) => {
                        q_sum += score as f64;
                        q_valid += 1;
                        if let Some(slot) = distribution.get_mut(&score) {
                            *slot += 1;
                        }
                    }
                    NormalizedScore::Missing => {
                        q_missing += 1;
                    }
                }
            }
            cat_sum += q_sum;
            cat_valid += q_valid;
            cat_missing += q_missing;
            question_stats.push(QuestionStats {
                question: question.clone(),
                mean: mean_of(q_sum, q_valid),
                valid: q_valid,
                missing: q_missing,
            });
        }

        all_sum += cat_sum;
        all_valid += cat_valid;
        category_stats.push(CategoryStats {
            name: category.name.clone(),
            mean: mean_of(cat_sum, cat_valid),
            valid: cat_valid,
            missing: cat_missing,
            questions: question_stats,
            distribution: distribution.into_iter().collect(),
        });
    }

    SurveyStats {
        response_count: selected.len(),
        overall_mean: mean_of(all_sum, all_valid),
        categories: category_stats,
    }
}

/// The distinct team values observed in the rows, with response counts,
/// sorted by name. Blank values are skipped.
pub fn distinct_teams(rows: &[ResponseRow]) -> Vec<(String, usize)> {
    distinct_values(rows.iter().map(|r| r.team.as_str()))
}

/// The distinct location values observed in the rows, with response counts,
/// sorted by name. Blank values are skipped.
pub fn distinct_locations(rows: &[ResponseRow]) -> Vec<(String, usize)> {
    distinct_values(rows.iter().map(|r| r.location.as_str()))
}

fn distinct_values<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in values {
        if value.is_empty() {
            continue;
        }
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

// **** Comparison ****

/// Compares a selection pass against the population pass.
///
/// Categories (and questions inside them) are matched by name; the result is
/// ranked by descending delta, ties broken by ascending category name, and
/// categories without a comparable delta after the rest.
pub fn compare_stats(selection: &SurveyStats, population: &SurveyStats) -> ComparisonResult {
    let population_by_name: HashMap<&str, &CategoryStats> = population
        .categories
        .iter()
        .map(|c| (c.name.as_str(), c))
        .collect();

    let mut categories: Vec<CategoryComparison> = Vec::new();
    for sel_cat in selection.categories.iter() {
        let pop_cat = match population_by_name.get(sel_cat.name.as_str()) {
            Some(c) => *c,
            None => continue,
        };
        let pop_questions: HashMap<&str, &QuestionStats> = pop_cat
            .questions
            .iter()
            .map(|q| (q.question.as_str(), q))
            .collect();

        let questions: Vec<QuestionComparison> = sel_cat
            .questions
            .iter()
            .map(|sel_q| {
                let pop_q = pop_questions.get(sel_q.question.as_str()).cloned();
                let pop_mean = pop_q.and_then(|q| q.mean);
                QuestionComparison {
                    question: sel_q.question.clone(),
                    selection_mean: sel_q.mean,
                    population_mean: pop_mean,
                    delta: delta_of(sel_q.mean, pop_mean),
                    selection_responses: sel_q.valid,
                    population_responses: pop_q.map(|q| q.valid).unwrap_or(0),
                }
            })
            .collect();

        categories.push(CategoryComparison {
            name: sel_cat.name.clone(),
            selection_mean: sel_cat.mean,
            population_mean: pop_cat.mean,
            delta: delta_of(sel_cat.mean, pop_cat.mean),
            questions,
        });
    }

    categories.sort_by(|a, b| match (a.delta, b.delta) {
        (Some(x), Some(y)) => y
            .partial_cmp(&x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });

    ComparisonResult { categories }
}

fn delta_of(selection: Option<f64>, population: Option<f64>) -> Option<f64> {
    match (selection, population) {
        (Some(s), Some(p)) => Some(s - p),
        _ => None,
    }
}

// **** Recommendation engine ****

/// Classifies a delta against the configured thresholds. The mapping is an
/// ordered rule table: larger deltas never classify worse than smaller ones.
pub fn classify_delta(delta: f64, rules: &AnalysisRules) -> PerformanceStatus {
    if delta > rules.significant_threshold {
        PerformanceStatus::SignificantlyAbove
    } else if delta > rules.similar_threshold {
        PerformanceStatus::Above
    } else if delta.abs() <= rules.similar_threshold {
        PerformanceStatus::Similar
    } else if delta < -rules.significant_threshold {
        PerformanceStatus::SignificantlyBelow
    } else {
        PerformanceStatus::Below
    }
}

/// Classifies an absolute selection mean against the scale midpoint.
pub fn classify_level(mean: f64, scale: &ScoreScale) -> ScoreLevel {
    if mean < scale.midpoint() {
        ScoreLevel::BelowExpectations
    } else {
        ScoreLevel::MeetsExpectations
    }
}

/// Assigns the qualitative labels for every compared category. Categories
/// without a defined delta or mean keep `None` labels.
pub fn assess_categories(
    comparison: &ComparisonResult,
    rules: &AnalysisRules,
    scale: &ScoreScale,
) -> Vec<CategoryAssessment> {
    comparison
        .categories
        .iter()
        .map(|cat| CategoryAssessment {
            name: cat.name.clone(),
            status: cat.delta.map(|d| classify_delta(d, rules)),
            level: cat.selection_mean.map(|m| classify_level(m, scale)),
        })
        .collect()
}

/// Derives the textual guidance for one comparison. Pure: identical inputs
/// always produce identical recommendations.
pub fn derive_recommendations(
    comparison: &ComparisonResult,
    assessments: &[CategoryAssessment],
    selection: &SubsetSelection,
    selection_responses: usize,
) -> Vec<String> {
    if selection_responses == 0 {
        return vec![
            "No data available for this combination - unable to provide recommendations."
                .to_string(),
        ];
    }

    let mut recommendations: Vec<String> = Vec::new();
    let status_by_name: HashMap<&str, Option<PerformanceStatus>> = assessments
        .iter()
        .map(|a| (a.name.as_str(), a.status))
        .collect();

    // Focus on the weakest category when it also sits below the population.
    let worst = comparison
        .categories
        .iter()
        .filter(|c| c.selection_mean.is_some())
        .min_by(|a, b| {
            a.selection_mean
                .partial_cmp(&b.selection_mean)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
    if let Some(worst) = worst {
        let status = status_by_name.get(worst.name.as_str()).cloned().flatten();
        if let (Some(score), Some(status)) = (worst.selection_mean, status) {
            if status.is_below() {
                recommendations.push(format!(
                    "CATEGORY FOCUS: Address {} (score: {:.2}, {})",
                    worst.name,
                    score,
                    status.description()
                ));
            }
        }
    }

    // A concrete team+location pair underperforming in several categories is
    // worth calling out as a combination.
    if let (GroupChoice::Value(team), GroupChoice::Value(location)) =
        (&selection.team, &selection.location)
    {
        let below = assessments
            .iter()
            .filter(|a| a.status.map(|s| s.is_below()).unwrap_or(false))
            .count();
        if below > 0 {
            recommendations.push(format!(
                "COMBINATION IMPACT: {} in {} shows lower performance in {} categories",
                team, location, below
            ));
        }
    }

    if recommendations.is_empty() {
        recommendations.push(
            "No specific issues identified - performance appears satisfactory for this combination."
                .to_string(),
        );
    }
    recommendations
}

// **** Entry point ****

/// Runs the full analysis for one selection: population pass, selection
/// pass, comparison and recommendations.
///
/// Arguments:
/// * `rows` the loaded responses
/// * `categories` the category to questions mapping
/// * `scale` the valid score range and label mapping
/// * `rules` the classification thresholds
/// * `selection` the subset to contrast against the population
pub fn run_survey_analysis(
    rows: &[ResponseRow],
    categories: &[Category],
    scale: &ScoreScale,
    rules: &AnalysisRules,
    selection: &SubsetSelection,
) -> Result<AnalysisReport, StatsErrors> {
    info!(
        "Processing {:?} responses over {:?} categories, selection: {:?}",
        rows.len(),
        categories.len(),
        selection
    );
    if categories.is_empty() {
        return Err(StatsErrors::NoCategories);
    }

    let matrix = ScoreMatrix::build(rows, categories, scale);
    let population = aggregate_stats(rows, &matrix, categories, scale, &SubsetSelection::all());
    let selection_stats = aggregate_stats(rows, &matrix, categories, scale, selection);
    debug!(
        "run_survey_analysis: population mean {:?}, selection mean {:?}",
        population.overall_mean, selection_stats.overall_mean
    );

    let comparison = compare_stats(&selection_stats, &population);
    let assessments = assess_categories(&comparison, rules, scale);
    let recommendations = derive_recommendations(
        &comparison,
        &assessments,
        selection,
        selection_stats.response_count,
    );

    Ok(AnalysisReport {
        selection: selection.clone(),
        population,
        selection_stats,
        comparison,
        assessments,
        recommendations,
        notes: matrix.notes().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, team: &str, location: &str, answers: &[(&str, RawValue)]) -> ResponseRow {
        ResponseRow {
            id: id.to_string(),
            team: team.to_string(),
            location: location.to_string(),
            answers: answers
                .iter()
                .map(|(q, v)| (q.to_string(), v.clone()))
                .collect(),
        }
    }

    fn num(x: f64) -> RawValue {
        RawValue::Number(x)
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    // The three-row scenario used throughout: two Eng respondents scoring
    // high and one Ops respondent scoring low on a single category.
    fn sample_rows() -> Vec<ResponseRow> {
        vec![
            row("r1", "Eng", "HQ", &[("Q1", num(5.0)), ("Q2", num(4.0))]),
            row("r2", "Eng", "HQ", &[("Q1", num(3.0)), ("Q2", num(3.0))]),
            row("r3", "Ops", "HQ", &[("Q1", num(1.0)), ("Q2", num(2.0))]),
        ]
    }

    fn sample_categories() -> Vec<Category> {
        vec![Category {
            name: "C1".to_string(),
            questions: vec!["Q1".to_string(), "Q2".to_string()],
        }]
    }

    fn labeled_scale() -> ScoreScale {
        let mut scale = ScoreScale::default_scale();
        scale.labels = vec![
            ("Strongly Disagree".to_string(), 1),
            ("Disagree".to_string(), 2),
            ("Neutral".to_string(), 3),
            ("Agree".to_string(), 4),
            ("Strongly Agree".to_string(), 5),
        ];
        scale
    }

    fn team_selection(team: &str) -> SubsetSelection {
        SubsetSelection {
            team: GroupChoice::Value(team.to_string()),
            location: GroupChoice::All,
        }
    }

    #[test]
    fn normalizer_maps_configured_labels() {
        let scale = labeled_scale();
        assert_eq!(
            normalize_value(&text("Strongly Agree"), &scale),
            NormalizedScore::Valid(5)
        );
        assert_eq!(
            normalize_value(&text("  strongly   agree "), &scale),
            NormalizedScore::Valid(5)
        );
        assert_eq!(
            normalize_value(&text("Disagree"), &scale),
            NormalizedScore::Valid(2)
        );
    }

    #[test]
    fn normalizer_rejects_unknown_text_and_blanks() {
        let scale = labeled_scale();
        assert_eq!(normalize_value(&text("N/A"), &scale), NormalizedScore::Missing);
        assert_eq!(normalize_value(&text("   "), &scale), NormalizedScore::Missing);
        assert_eq!(normalize_value(&RawValue::Empty, &scale), NormalizedScore::Missing);
    }

    #[test]
    fn normalizer_accepts_in_range_numbers_only() {
        let scale = ScoreScale::default_scale();
        assert_eq!(normalize_value(&num(3.0), &scale), NormalizedScore::Valid(3));
        assert_eq!(normalize_value(&num(5.0), &scale), NormalizedScore::Valid(5));
        assert_eq!(normalize_value(&num(0.0), &scale), NormalizedScore::Missing);
        assert_eq!(normalize_value(&num(7.0), &scale), NormalizedScore::Missing);
        assert_eq!(normalize_value(&num(f64::NAN), &scale), NormalizedScore::Missing);
    }

    #[test]
    fn normalizer_rounds_fractional_input_when_configured() {
        let mut scale = ScoreScale::default_scale();
        assert_eq!(normalize_value(&num(4.4), &scale), NormalizedScore::Valid(4));
        assert_eq!(normalize_value(&num(4.6), &scale), NormalizedScore::Valid(5));
        assert_eq!(normalize_value(&num(5.6), &scale), NormalizedScore::Missing);
        scale.round_fractional = false;
        assert_eq!(normalize_value(&num(4.4), &scale), NormalizedScore::Missing);
        assert_eq!(normalize_value(&num(4.0), &scale), NormalizedScore::Valid(4));
    }

    #[test]
    fn normalizer_reads_numeric_text() {
        let scale = ScoreScale::default_scale();
        assert_eq!(normalize_value(&text("4"), &scale), NormalizedScore::Valid(4));
        assert_eq!(normalize_value(&text("4.0"), &scale), NormalizedScore::Valid(4));
        assert_eq!(normalize_value(&text("12"), &scale), NormalizedScore::Missing);
    }

    #[test]
    fn normalizer_is_idempotent() {
        let scale = labeled_scale();
        for raw in [text("Agree"), text("bogus"), num(2.0), RawValue::Empty] {
            assert_eq!(
                normalize_value(&raw, &scale),
                normalize_value(&raw, &scale)
            );
        }
    }

    #[test]
    fn matrix_flags_unknown_questions_and_values() {
        let rows = vec![row("r1", "Eng", "HQ", &[("Q1", text("whenever"))])];
        let categories = vec![Category {
            name: "C1".to_string(),
            questions: vec!["Q1".to_string(), "Q9".to_string()],
        }];
        let matrix = ScoreMatrix::build(&rows, &categories, &ScoreScale::default_scale());
        assert_eq!(matrix.score("r1", "Q1"), NormalizedScore::Missing);
        assert_eq!(matrix.notes().len(), 2);
        assert!(matches!(
            matrix.notes()[0],
            DataQualityNote::MissingQuestion { .. }
        ));
        assert!(matches!(
            matrix.notes()[1],
            DataQualityNote::UnrecognizedValue { .. }
        ));
    }

    #[test]
    fn aggregates_population_and_selection_means() {
        let rows = sample_rows();
        let categories = sample_categories();
        let scale = ScoreScale::default_scale();
        let matrix = ScoreMatrix::build(&rows, &categories, &scale);

        let population =
            aggregate_stats(&rows, &matrix, &categories, &scale, &SubsetSelection::all());
        assert_eq!(population.response_count, 3);
        assert_eq!(population.categories[0].mean, Some(3.0));
        assert_eq!(population.categories[0].valid, 6);

        let eng = aggregate_stats(&rows, &matrix, &categories, &scale, &team_selection("Eng"));
        assert_eq!(eng.response_count, 2);
        assert_eq!(eng.categories[0].mean, Some(3.75));
        assert_eq!(eng.overall_mean, Some(3.75));
    }

    #[test]
    fn aggregates_distribution_counts() {
        let rows = sample_rows();
        let categories = sample_categories();
        let scale = ScoreScale::default_scale();
        let matrix = ScoreMatrix::build(&rows, &categories, &scale);
        let population =
            aggregate_stats(&rows, &matrix, &categories, &scale, &SubsetSelection::all());
        // Scores observed: 5, 4, 3, 3, 1, 2.
        assert_eq!(
            population.categories[0].distribution,
            vec![(1, 1), (2, 1), (3, 2), (4, 1), (5, 1)]
        );
    }

    #[test]
    fn empty_subset_yields_no_data_not_zero() {
        let rows = sample_rows();
        let categories = sample_categories();
        let scale = ScoreScale::default_scale();
        let matrix = ScoreMatrix::build(&rows, &categories, &scale);
        let stats = aggregate_stats(&rows, &matrix, &categories, &scale, &team_selection("Sales"));
        assert_eq!(stats.response_count, 0);
        assert_eq!(stats.overall_mean, None);
        assert_eq!(stats.categories[0].mean, None);
        assert_eq!(stats.categories[0].questions[0].mean, None);
    }

    #[test]
    fn category_with_only_unscorable_rows_is_no_data() {
        let scale = ScoreScale::default_scale();
        let rows = vec![
            row("r1", "Eng", "HQ", &[("Q1", text("N/A"))]),
            row("r2", "Eng", "HQ", &[("Q1", RawValue::Empty)]),
        ];
        let categories = vec![Category {
            name: "C1".to_string(),
            questions: vec!["Q1".to_string()],
        }];
        let matrix = ScoreMatrix::build(&rows, &categories, &scale);
        let stats = aggregate_stats(&rows, &matrix, &categories, &scale, &SubsetSelection::all());
        assert_eq!(stats.categories[0].mean, None);
        assert_eq!(stats.categories[0].missing, 2);
        let comparison = compare_stats(&stats, &stats);
        assert_eq!(comparison.categories[0].delta, None);
    }

    // Partitioning the population by team and recombining the partition
    // means weighted by their valid counts must reproduce the population
    // mean. This is the law that motivates the flattened-mean policy.
    #[test]
    fn partition_means_recombine_to_population_mean() {
        let rows = sample_rows();
        let categories = sample_categories();
        let scale = ScoreScale::default_scale();
        let matrix = ScoreMatrix::build(&rows, &categories, &scale);

        let population =
            aggregate_stats(&rows, &matrix, &categories, &scale, &SubsetSelection::all());
        let mut weighted_sum = 0.0;
        let mut total_valid = 0usize;
        for (team, _) in distinct_teams(&rows) {
            let part = aggregate_stats(&rows, &matrix, &categories, &scale, &team_selection(&team));
            if let Some(mean) = part.overall_mean {
                weighted_sum += mean * part.categories.iter().map(|c| c.valid).sum::<usize>() as f64;
                total_valid += part.categories.iter().map(|c| c.valid).sum::<usize>();
            }
        }
        let recombined = weighted_sum / total_valid as f64;
        assert!((recombined - population.overall_mean.unwrap()).abs() < 1e-12);
    }

    #[test]
    fn comparing_stats_with_themselves_gives_zero_deltas() {
        let rows = sample_rows();
        let categories = sample_categories();
        let scale = ScoreScale::default_scale();
        let matrix = ScoreMatrix::build(&rows, &categories, &scale);
        let stats = aggregate_stats(&rows, &matrix, &categories, &scale, &SubsetSelection::all());
        let comparison = compare_stats(&stats, &stats);
        for category in comparison.categories.iter() {
            assert_eq!(category.delta, Some(0.0));
            for question in category.questions.iter() {
                assert_eq!(question.delta, Some(0.0));
            }
        }
    }

    #[test]
    fn comparison_ranks_by_descending_delta_then_name() {
        let make = |name: &str, mean: Option<f64>| CategoryStats {
            name: name.to_string(),
            mean,
            valid: if mean.is_some() { 1 } else { 0 },
            missing: 0,
            questions: vec![],
            distribution: vec![],
        };
        let selection = SurveyStats {
            response_count: 1,
            overall_mean: Some(3.0),
            categories: vec![
                make("Alpha", Some(3.0)),
                make("Beta", Some(4.0)),
                make("Gamma", Some(3.0)),
                make("Delta", None),
            ],
        };
        let population = SurveyStats {
            response_count: 2,
            overall_mean: Some(3.0),
            categories: vec![
                make("Alpha", Some(3.0)),
                make("Beta", Some(3.0)),
                make("Gamma", Some(3.0)),
                make("Delta", Some(3.0)),
            ],
        };
        let comparison = compare_stats(&selection, &population);
        let names: Vec<&str> = comparison
            .categories
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        // Beta wins with +1.0, Alpha/Gamma tie at 0.0 in name order, Delta
        // has no comparable delta and comes last.
        assert_eq!(names, vec!["Beta", "Alpha", "Gamma", "Delta"]);
    }

    #[test]
    fn delta_classification_follows_thresholds() {
        let rules = AnalysisRules::DEFAULT_RULES;
        assert_eq!(classify_delta(0.75, &rules), PerformanceStatus::SignificantlyAbove);
        assert_eq!(classify_delta(0.15, &rules), PerformanceStatus::Above);
        assert_eq!(classify_delta(0.05, &rules), PerformanceStatus::Similar);
        assert_eq!(classify_delta(-0.05, &rules), PerformanceStatus::Similar);
        assert_eq!(classify_delta(-0.15, &rules), PerformanceStatus::Below);
        assert_eq!(classify_delta(-0.75, &rules), PerformanceStatus::SignificantlyBelow);
    }

    #[test]
    fn delta_classification_is_monotonic() {
        let rules = AnalysisRules {
            significant_threshold: 0.5,
            similar_threshold: 0.1,
        };
        let deltas = [-1.0, -0.6, -0.3, -0.1, 0.0, 0.1, 0.3, 0.6, 1.0];
        for pair in deltas.windows(2) {
            assert!(classify_delta(pair[0], &rules) <= classify_delta(pair[1], &rules));
        }
    }

    #[test]
    fn level_classification_uses_scale_midpoint() {
        let scale = ScoreScale::default_scale();
        assert_eq!(classify_level(2.9, &scale), ScoreLevel::BelowExpectations);
        assert_eq!(classify_level(3.0, &scale), ScoreLevel::MeetsExpectations);
    }

    #[test]
    fn full_run_matches_worked_scenario() {
        let rows = sample_rows();
        let categories = sample_categories();
        let scale = ScoreScale::default_scale();
        let report = run_survey_analysis(
            &rows,
            &categories,
            &scale,
            &AnalysisRules::DEFAULT_RULES,
            &team_selection("Eng"),
        )
        .unwrap();
        let c1 = &report.comparison.categories[0];
        assert_eq!(c1.selection_mean, Some(3.75));
        assert_eq!(c1.population_mean, Some(3.0));
        assert_eq!(c1.delta, Some(0.75));
        assert_eq!(
            report.assessments[0].status,
            Some(PerformanceStatus::SignificantlyAbove)
        );
        assert_eq!(
            report.assessments[0].level,
            Some(ScoreLevel::MeetsExpectations)
        );
    }

    #[test]
    fn empty_category_list_fails_fast() {
        let rows = sample_rows();
        let res = run_survey_analysis(
            &rows,
            &[],
            &ScoreScale::default_scale(),
            &AnalysisRules::DEFAULT_RULES,
            &SubsetSelection::all(),
        );
        assert_eq!(res, Err(StatsErrors::NoCategories));
    }

    #[test]
    fn recommendations_for_empty_selection() {
        let comparison = ComparisonResult { categories: vec![] };
        let recs = derive_recommendations(&comparison, &[], &SubsetSelection::all(), 0);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].starts_with("No data available"));
    }

    #[test]
    fn recommendations_flag_weakest_category() {
        let rows = vec![
            row("r1", "Eng", "HQ", &[("Q1", num(2.0)), ("Q2", num(5.0))]),
            row("r2", "Eng", "HQ", &[("Q1", num(1.0)), ("Q2", num(5.0))]),
            row("r3", "Ops", "HQ", &[("Q1", num(5.0)), ("Q2", num(5.0))]),
        ];
        let categories = vec![
            Category {
                name: "Culture".to_string(),
                questions: vec!["Q1".to_string()],
            },
            Category {
                name: "Tools".to_string(),
                questions: vec!["Q2".to_string()],
            },
        ];
        let report = run_survey_analysis(
            &rows,
            &categories,
            &ScoreScale::default_scale(),
            &AnalysisRules::DEFAULT_RULES,
            &team_selection("Eng"),
        )
        .unwrap();
        assert!(report.recommendations[0].starts_with("CATEGORY FOCUS: Address Culture"));
    }

    #[test]
    fn recommendations_flag_combination_impact() {
        let rows = vec![
            row("r1", "Eng", "Remote", &[("Q1", num(1.0))]),
            row("r2", "Eng", "HQ", &[("Q1", num(5.0))]),
            row("r3", "Ops", "HQ", &[("Q1", num(5.0))]),
        ];
        let categories = vec![Category {
            name: "Culture".to_string(),
            questions: vec!["Q1".to_string()],
        }];
        let selection = SubsetSelection {
            team: GroupChoice::Value("Eng".to_string()),
            location: GroupChoice::Value("Remote".to_string()),
        };
        let report = run_survey_analysis(
            &rows,
            &categories,
            &ScoreScale::default_scale(),
            &AnalysisRules::DEFAULT_RULES,
            &selection,
        )
        .unwrap();
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.starts_with("COMBINATION IMPACT: Eng in Remote")));
    }

    #[test]
    fn recommendations_fall_back_to_satisfactory() {
        let rows = sample_rows();
        let report = run_survey_analysis(
            &rows,
            &sample_categories(),
            &ScoreScale::default_scale(),
            &AnalysisRules::DEFAULT_RULES,
            &team_selection("Eng"),
        )
        .unwrap();
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].starts_with("No specific issues identified"));
    }

    #[test]
    fn distinct_groups_are_sorted_with_counts() {
        let rows = sample_rows();
        assert_eq!(
            distinct_teams(&rows),
            vec![("Eng".to_string(), 2), ("Ops".to_string(), 1)]
        );
        assert_eq!(distinct_locations(&rows), vec![("HQ".to_string(), 3)]);
    }
}
