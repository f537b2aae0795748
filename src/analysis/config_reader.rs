use crate::analysis::*;

use likert_stats::{AnalysisRules, Category, ScoreScale};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::collections::HashMap;
use std::fs;

use crate::analysis::io_common::sanitize_text;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "surveyName")]
    pub survey_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "teamColumn")]
    pub team_column: String,
    #[serde(rename = "locationColumn")]
    pub location_column: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "firstResponseRowIndex")]
    first_response_row_index: Option<u64>,
}

impl FileSource {
    /// The 1-based row where responses start. The header is always row 1, so
    /// anything below 2 is clamped up to 2.
    pub fn first_response_row(&self) -> usize {
        self.first_response_row_index
            .map(|x| x as usize)
            .unwrap_or(2)
            .max(2)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyCategory {
    pub name: String,
    pub questions: Vec<String>,
    /// Free-text column whose remarks are collected under this category.
    #[serde(rename = "commentColumn")]
    pub comment_column: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScaleSettings {
    pub min: Option<i32>,
    pub max: Option<i32>,
    #[serde(rename = "roundFractional")]
    pub round_fractional: Option<bool>,
    pub labels: Option<HashMap<String, i32>>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(rename = "significantDifferenceThreshold")]
    pub significant_difference_threshold: Option<f64>,
    #[serde(rename = "similarThreshold")]
    pub similar_threshold: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "responseFileSources")]
    pub response_file_sources: Vec<FileSource>,
    pub categories: Vec<SurveyCategory>,
    pub scale: Option<ScaleSettings>,
    pub analysis: Option<AnalysisSettings>,
}

pub fn read_config(path: &str) -> AnResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.to_string(),
    })?;
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

/// Checks the configuration once and turns it into the typed structures the
/// analysis engine consumes. Defaults: a 1-5 scale with rounding and no
/// label mapping, thresholds 0.2/0.1.
pub fn validate_config(
    config: &SurveyConfig,
) -> AnResult<(Vec<Category>, ScoreScale, AnalysisRules)> {
    if config.response_file_sources.is_empty() {
        return InvalidConfigSnafu {
            message: "no response file sources configured".to_string(),
        }
        .fail();
    }
    if config.categories.is_empty() {
        return InvalidConfigSnafu {
            message: "the category list is empty".to_string(),
        }
        .fail();
    }
    for category in config.categories.iter() {
        if category.questions.is_empty() {
            return InvalidConfigSnafu {
                message: format!("category {:?} has no questions", category.name),
            }
            .fail();
        }
    }

    let categories: Vec<Category> = config
        .categories
        .iter()
        .map(|c| Category {
            name: c.name.clone(),
            questions: c.questions.iter().map(|q| sanitize_text(q)).collect(),
        })
        .collect();

    let scale_settings = config.scale.clone().unwrap_or(ScaleSettings {
        min: None,
        max: None,
        round_fractional: None,
        labels: None,
    });
    let mut scale = ScoreScale::with_range(
        scale_settings.min.unwrap_or(1),
        scale_settings.max.unwrap_or(5),
    );
    if scale.min >= scale.max {
        return InvalidConfigSnafu {
            message: format!("invalid scale range {}-{}", scale.min, scale.max),
        }
        .fail();
    }
    scale.round_fractional = scale_settings.round_fractional.unwrap_or(true);
    if let Some(labels) = scale_settings.labels {
        // The JSON object has no usable order; sort for determinism.
        let mut labels: Vec<(String, i32)> = labels.into_iter().collect();
        labels.sort();
        for (label, score) in labels.iter() {
            if *score < scale.min || *score > scale.max {
                return InvalidConfigSnafu {
                    message: format!("label {:?} maps to {} outside the scale", label, score),
                }
                .fail();
            }
        }
        scale.labels = labels;
    }

    let analysis_settings = config.analysis.clone().unwrap_or(AnalysisSettings {
        significant_difference_threshold: None,
        similar_threshold: None,
    });
    let rules = AnalysisRules {
        significant_threshold: analysis_settings
            .significant_difference_threshold
            .unwrap_or(AnalysisRules::DEFAULT_RULES.significant_threshold),
        similar_threshold: analysis_settings
            .similar_threshold
            .unwrap_or(AnalysisRules::DEFAULT_RULES.similar_threshold),
    };
    if rules.similar_threshold < 0.0 || rules.significant_threshold < rules.similar_threshold {
        return InvalidConfigSnafu {
            message: format!(
                "thresholds must satisfy 0 <= similar ({}) <= significant ({})",
                rules.similar_threshold, rules.significant_threshold
            ),
        }
        .fail();
    }

    Ok((categories, scale, rules))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config(categories_js: &str) -> SurveyConfig {
        let js = format!(
            r#"{{
                "outputSettings": {{ "surveyName": "Pulse" }},
                "responseFileSources": [
                    {{
                        "provider": "csv",
                        "filePath": "responses.csv",
                        "teamColumn": "Team",
                        "locationColumn": "Location"
                    }}
                ],
                "categories": {}
            }}"#,
            categories_js
        );
        serde_json::from_str(&js).unwrap()
    }

    #[test]
    fn defaults_apply_when_sections_are_omitted() {
        let config = minimal_config(r#"[{"name": "C1", "questions": ["Q1"]}]"#);
        let (categories, scale, rules) = validate_config(&config).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!((scale.min, scale.max), (1, 5));
        assert!(scale.round_fractional);
        assert_eq!(rules.significant_threshold, 0.2);
        assert_eq!(rules.similar_threshold, 0.1);
        assert_eq!(config.response_file_sources[0].first_response_row(), 2);
    }

    #[test]
    fn question_names_are_sanitized() {
        let config = minimal_config(r#"[{"name": "C1", "questions": ["  Q1   extra  spaces "]}]"#);
        let (categories, _, _) = validate_config(&config).unwrap();
        assert_eq!(categories[0].questions[0], "Q1 extra spaces");
    }

    #[test]
    fn empty_categories_are_rejected() {
        let config = minimal_config("[]");
        assert!(validate_config(&config).is_err());
        let config = minimal_config(r#"[{"name": "C1", "questions": []}]"#);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn out_of_scale_labels_are_rejected() {
        let mut config = minimal_config(r#"[{"name": "C1", "questions": ["Q1"]}]"#);
        config.scale = Some(ScaleSettings {
            min: Some(1),
            max: Some(5),
            round_fractional: None,
            labels: Some([("Outstanding".to_string(), 7)].into_iter().collect()),
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn inverted_scale_is_rejected() {
        let mut config = minimal_config(r#"[{"name": "C1", "questions": ["Q1"]}]"#);
        config.scale = Some(ScaleSettings {
            min: Some(5),
            max: Some(1),
            round_fractional: None,
            labels: None,
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn inconsistent_thresholds_are_rejected() {
        let mut config = minimal_config(r#"[{"name": "C1", "questions": ["Q1"]}]"#);
        config.analysis = Some(AnalysisSettings {
            significant_difference_threshold: Some(0.1),
            similar_threshold: Some(0.3),
        });
        assert!(validate_config(&config).is_err());
    }
}
