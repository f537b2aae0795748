// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// A raw cell value, as handed over by the ingestion layer.
///
/// The core never sees file formats: readers decode every cell into one of
/// these three shapes and normalization takes it from there.
#[derive(PartialEq, Debug, Clone)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Empty,
}

/// One respondent's record. Immutable once loaded.
///
/// `answers` maps a question name (the sanitized column header) to the raw
/// cell content for this respondent.
#[derive(PartialEq, Debug, Clone)]
pub struct ResponseRow {
    pub id: String,
    pub team: String,
    pub location: String,
    pub answers: HashMap<String, RawValue>,
}

impl ResponseRow {
    pub fn answer(&self, question: &str) -> Option<&RawValue> {
        self.answers.get(question)
    }
}

/// A normalized Likert score.
///
/// Normalization is total: every raw value maps deterministically to exactly
/// one of these two states. A raw string never survives normalization.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum NormalizedScore {
    Valid(i32),
    Missing,
}

impl NormalizedScore {
    pub fn valid(&self) -> Option<i32> {
        match self {
            NormalizedScore::Valid(x) => Some(*x),
            NormalizedScore::Missing => None,
        }
    }
}

/// A named grouping of related questions for rollup reporting.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Category {
    pub name: String,
    pub questions: Vec<String>,
}

// ********* Configuration **********

/// The valid score range and the textual labels that map into it.
#[derive(PartialEq, Debug, Clone)]
pub struct ScoreScale {
    pub min: i32,
    pub max: i32,
    /// Accept fractional numeric input by rounding to the nearest integer.
    /// When disabled, fractional numeric input is treated as missing.
    pub round_fractional: bool,
    /// Label to score mapping, e.g. ("Strongly Agree", 5). Matching is
    /// case-insensitive and ignores whitespace differences.
    pub labels: Vec<(String, i32)>,
}

impl ScoreScale {
    pub fn with_range(min: i32, max: i32) -> ScoreScale {
        ScoreScale {
            min,
            max,
            round_fractional: true,
            labels: Vec::new(),
        }
    }

    /// The conventional 1-5 agreement scale with no label mapping.
    pub fn default_scale() -> ScoreScale {
        ScoreScale::with_range(1, 5)
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) as f64 / 2.0
    }
}

/// Thresholds driving the qualitative classification of deltas.
///
/// Deltas beyond `significant_threshold` in magnitude are significant,
/// deltas within `similar_threshold` count as on par with the population.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct AnalysisRules {
    pub significant_threshold: f64,
    pub similar_threshold: f64,
}

impl AnalysisRules {
    pub const DEFAULT_RULES: AnalysisRules = AnalysisRules {
        significant_threshold: 0.2,
        similar_threshold: 0.1,
    };
}

/// One dimension of a subset selection: a concrete value or the wildcard.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum GroupChoice {
    All,
    Value(String),
}

impl GroupChoice {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            GroupChoice::All => true,
            GroupChoice::Value(v) => v == value,
        }
    }

    /// The display form, with the wildcard spelled out as `all_label`.
    pub fn label(&self, all_label: &str) -> String {
        match self {
            GroupChoice::All => all_label.to_string(),
            GroupChoice::Value(v) => v.clone(),
        }
    }
}

/// The team/location filter chosen for a single analysis run, contrasted
/// against the unfiltered population.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SubsetSelection {
    pub team: GroupChoice,
    pub location: GroupChoice,
}

impl SubsetSelection {
    /// The selection matching every row. This is the population pass.
    pub fn all() -> SubsetSelection {
        SubsetSelection {
            team: GroupChoice::All,
            location: GroupChoice::All,
        }
    }

    pub fn matches(&self, row: &ResponseRow) -> bool {
        self.team.matches(&row.team) && self.location.matches(&row.location)
    }
}

// ******** Output data structures *********

/// Aggregates for a single question within one aggregation pass.
///
/// `mean` is `None` when the question collected no valid score, which every
/// consumer must render distinctly from a mean of zero.
#[derive(PartialEq, Debug, Clone)]
pub struct QuestionStats {
    pub question: String,
    pub mean: Option<f64>,
    pub valid: usize,
    pub missing: usize,
}

/// Aggregates for one category: the flattened mean over all valid scores of
/// all its questions, the per-question rollup and the score histogram.
#[derive(PartialEq, Debug, Clone)]
pub struct CategoryStats {
    pub name: String,
    pub mean: Option<f64>,
    pub valid: usize,
    pub missing: usize,
    pub questions: Vec<QuestionStats>,
    /// Count of valid responses per discrete score value, covering the whole
    /// configured range (zero counts included).
    pub distribution: Vec<(i32, usize)>,
}

/// The result of one aggregation pass over a subset of the rows.
#[derive(PartialEq, Debug, Clone)]
pub struct SurveyStats {
    pub response_count: usize,
    pub overall_mean: Option<f64>,
    pub categories: Vec<CategoryStats>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct QuestionComparison {
    pub question: String,
    pub selection_mean: Option<f64>,
    pub population_mean: Option<f64>,
    /// selection mean minus population mean; `None` when not comparable.
    pub delta: Option<f64>,
    pub selection_responses: usize,
    pub population_responses: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CategoryComparison {
    pub name: String,
    pub selection_mean: Option<f64>,
    pub population_mean: Option<f64>,
    pub delta: Option<f64>,
    pub questions: Vec<QuestionComparison>,
}

/// Per-category deltas between a selection pass and the population pass,
/// ranked by descending delta (ties broken by category name, categories
/// without a comparable delta last).
#[derive(PartialEq, Debug, Clone)]
pub struct ComparisonResult {
    pub categories: Vec<CategoryComparison>,
}

/// Qualitative classification of a category delta. Variants are ordered from
/// worst to best so that the natural ordering matches the threshold ordering.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum PerformanceStatus {
    SignificantlyBelow,
    Below,
    Similar,
    Above,
    SignificantlyAbove,
}

impl PerformanceStatus {
    /// Stable machine-readable form, used in serialized summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceStatus::SignificantlyBelow => "significantly_below",
            PerformanceStatus::Below => "below",
            PerformanceStatus::Similar => "similar",
            PerformanceStatus::Above => "above",
            PerformanceStatus::SignificantlyAbove => "significantly_above",
        }
    }

    /// Human-readable form for report prose.
    pub fn description(&self) -> &'static str {
        match self {
            PerformanceStatus::SignificantlyBelow => "significantly below",
            PerformanceStatus::Below => "below",
            PerformanceStatus::Similar => "similar",
            PerformanceStatus::Above => "above",
            PerformanceStatus::SignificantlyAbove => "significantly above",
        }
    }

    pub fn is_below(&self) -> bool {
        matches!(
            self,
            PerformanceStatus::Below | PerformanceStatus::SignificantlyBelow
        )
    }
}

/// Absolute level of a selection mean against the scale midpoint, independent
/// of how the population performed.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ScoreLevel {
    BelowExpectations,
    MeetsExpectations,
}

impl ScoreLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreLevel::BelowExpectations => "below_expectations",
            ScoreLevel::MeetsExpectations => "meets_expectations",
        }
    }
}

/// The qualitative labels assigned to one category by the recommendation
/// engine. Both labels are `None` when the underlying means are undefined.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CategoryAssessment {
    pub name: String,
    pub status: Option<PerformanceStatus>,
    pub level: Option<ScoreLevel>,
}

/// Non-fatal observations about the input data, surfaced to the caller as
/// warnings. None of these abort an analysis run.
#[derive(PartialEq, Debug, Clone)]
pub enum DataQualityNote {
    /// A category references a question that no loaded row carries.
    MissingQuestion { category: String, question: String },
    /// A textual cell value that matches no configured label.
    UnrecognizedValue {
        row_id: String,
        question: String,
        value: String,
    },
    /// A numeric cell value outside the configured range (or fractional with
    /// rounding disabled).
    InvalidNumber {
        row_id: String,
        question: String,
        value: f64,
    },
}

impl Display for DataQualityNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataQualityNote::MissingQuestion { category, question } => write!(
                f,
                "configured question '{}' (category '{}') was not found in the data",
                question, category
            ),
            DataQualityNote::UnrecognizedValue {
                row_id,
                question,
                value,
            } => write!(
                f,
                "row '{}': unrecognized value '{}' for question '{}'",
                row_id, value, question
            ),
            DataQualityNote::InvalidNumber {
                row_id,
                question,
                value,
            } => write!(
                f,
                "row '{}': numeric value {} is not a valid score for question '{}'",
                row_id, value, question
            ),
        }
    }
}

/// Everything one analysis run produces, as plain structured data. The
/// reporting layer owns all serialization.
#[derive(PartialEq, Debug, Clone)]
pub struct AnalysisReport {
    pub selection: SubsetSelection,
    pub population: SurveyStats,
    pub selection_stats: SurveyStats,
    pub comparison: ComparisonResult,
    pub assessments: Vec<CategoryAssessment>,
    pub recommendations: Vec<String>,
    pub notes: Vec<DataQualityNote>,
}

/// Errors that prevent an analysis run from starting. Malformed individual
/// cells are never an error, only data-quality notes.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum StatsErrors {
    NoCategories,
}

impl Error for StatsErrors {}

impl Display for StatsErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsErrors::NoCategories => {
                write!(f, "no categories were configured for the analysis")
            }
        }
    }
}
