// Serialization of analysis results: the JSON summary, the plain-text
// report and the free-text comment collection. The core hands over plain
// structured data; everything presentation-shaped happens here.

use std::collections::HashMap;
use std::fmt::Write;

use serde_json::{json, Map as JSMap, Value as JSValue};

use likert_stats::{
    AnalysisReport, CategoryAssessment, CategoryStats, GroupChoice, RawValue, ResponseRow,
    SubsetSelection,
};

use crate::analysis::config_reader::SurveyCategory;
use crate::analysis::io_common::sanitize_text;

/// Comments shorter than this are treated as noise and dropped.
const MIN_COMMENT_LEN: usize = 3;

#[derive(Debug, Clone)]
pub struct CommentEntry {
    pub text: String,
    pub team: String,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct CategoryComments {
    pub category: String,
    pub comments: Vec<CommentEntry>,
}

/// Collects the free-text remarks of the selected rows, organized by the
/// category whose `commentColumn` they came from.
pub fn collect_comments(
    rows: &[ResponseRow],
    selection: &SubsetSelection,
    categories: &[SurveyCategory],
) -> Vec<CategoryComments> {
    let mut res: Vec<CategoryComments> = Vec::new();
    for category in categories.iter() {
        let column = match &category.comment_column {
            Some(column) => sanitize_text(column),
            None => continue,
        };
        let mut comments: Vec<CommentEntry> = Vec::new();
        for row in rows.iter().filter(|r| selection.matches(r)) {
            let text = match row.answer(&column) {
                Some(RawValue::Text(s)) => sanitize_text(s),
                _ => continue,
            };
            if text.len() < MIN_COMMENT_LEN {
                continue;
            }
            comments.push(CommentEntry {
                text,
                team: row.team.clone(),
                location: row.location.clone(),
            });
        }
        if !comments.is_empty() {
            res.push(CategoryComments {
                category: category.name.clone(),
                comments,
            });
        }
    }
    res
}

/// Assembles the JSON summary for one analysis run. The shape is stable:
/// the end-to-end tests compare it against stored reference summaries.
pub fn build_summary_js(
    survey_name: &str,
    report: &AnalysisReport,
    comments: &[CategoryComments],
) -> JSValue {
    let selection_by_name: HashMap<&str, &CategoryStats> = report
        .selection_stats
        .categories
        .iter()
        .map(|c| (c.name.as_str(), c))
        .collect();
    let population_by_name: HashMap<&str, &CategoryStats> = report
        .population
        .categories
        .iter()
        .map(|c| (c.name.as_str(), c))
        .collect();
    let assessment_by_name: HashMap<&str, &CategoryAssessment> = report
        .assessments
        .iter()
        .map(|a| (a.name.as_str(), a))
        .collect();

    let mut categories_js: Vec<JSValue> = Vec::new();
    for (idx, comparison) in report.comparison.categories.iter().enumerate() {
        let questions_js: Vec<JSValue> = comparison
            .questions
            .iter()
            .map(|q| {
                json!({
                    "question": q.question.clone(),
                    "selectionMean": q.selection_mean,
                    "populationMean": q.population_mean,
                    "delta": q.delta,
                    "selectionResponses": q.selection_responses,
                    "populationResponses": q.population_responses,
                })
            })
            .collect();

        let selection_stats = selection_by_name.get(comparison.name.as_str()).copied();
        let population_stats = population_by_name.get(comparison.name.as_str()).copied();
        let assessment = assessment_by_name.get(comparison.name.as_str()).copied();

        let mut distribution: JSMap<String, JSValue> = JSMap::new();
        if let Some(stats) = selection_stats {
            for (score, count) in stats.distribution.iter() {
                distribution.insert(score.to_string(), json!(count));
            }
        }

        categories_js.push(json!({
            "category": comparison.name.clone(),
            "rank": idx + 1,
            "selectionMean": comparison.selection_mean,
            "populationMean": comparison.population_mean,
            "delta": comparison.delta,
            "status": assessment.and_then(|a| a.status.map(|s| s.as_str())),
            "level": assessment.and_then(|a| a.level.map(|l| l.as_str())),
            "selectionValid": selection_stats.map(|s| s.valid).unwrap_or(0),
            "selectionMissing": selection_stats.map(|s| s.missing).unwrap_or(0),
            "populationValid": population_stats.map(|s| s.valid).unwrap_or(0),
            "populationMissing": population_stats.map(|s| s.missing).unwrap_or(0),
            "distribution": distribution,
            "questions": questions_js,
        }));
    }

    let comments_js: Vec<JSValue> = comments
        .iter()
        .map(|category| {
            let entries: Vec<JSValue> = category
                .comments
                .iter()
                .map(|c| {
                    json!({
                        "text": c.text.clone(),
                        "team": c.team.clone(),
                        "location": c.location.clone(),
                    })
                })
                .collect();
            json!({
                "category": category.category.clone(),
                "comments": entries,
            })
        })
        .collect();

    let notes_js: Vec<JSValue> = report.notes.iter().map(|n| json!(n.to_string())).collect();

    json!({
        "metadata": {
            "surveyName": survey_name,
            "selectedTeam": report.selection.team.label("all"),
            "selectedLocation": report.selection.location.label("all"),
            "selectionResponses": report.selection_stats.response_count,
            "totalResponses": report.population.response_count,
        },
        "overall": {
            "selectionMean": report.selection_stats.overall_mean,
            "populationMean": report.population.overall_mean,
        },
        "categories": categories_js,
        "comments": comments_js,
        "dataQualityNotes": notes_js,
        "recommendations": report.recommendations.clone(),
    })
}

fn fmt_mean(mean: Option<f64>) -> String {
    match mean {
        Some(x) => format!("{:.2}", x),
        None => "no data".to_string(),
    }
}

/// Renders the plain-text report for one analysis run.
pub fn render_text_report(
    survey_name: &str,
    report: &AnalysisReport,
    comments: &[CategoryComments],
) -> String {
    let mut output = String::new();
    let team_label = report.selection.team.label("All Teams");
    let location_label = report.selection.location.label("All Locations");
    let status_by_name: HashMap<&str, &CategoryAssessment> = report
        .assessments
        .iter()
        .map(|a| (a.name.as_str(), a))
        .collect();

    let _ = writeln!(
        output,
        "SURVEY ANALYSIS REPORT - {} - {} + {}",
        survey_name, team_label, location_label
    );
    let _ = writeln!(output, "{}", "=".repeat(80));
    let _ = writeln!(
        output,
        "Responses: {} of {} total",
        report.selection_stats.response_count, report.population.response_count
    );
    let _ = writeln!(
        output,
        "Categories analyzed: {}",
        report.comparison.categories.len()
    );
    let _ = writeln!(output);

    if report.selection_stats.response_count == 0 {
        let _ = writeln!(output, "No responses found for this combination.");
    } else {
        let _ = writeln!(output, "CATEGORY PERFORMANCE");
        let _ = writeln!(output, "{}", "-".repeat(40));
        for (idx, category) in report.comparison.categories.iter().enumerate() {
            let status = status_by_name
                .get(category.name.as_str())
                .and_then(|a| a.status);
            match (category.selection_mean, category.delta) {
                (Some(mean), Some(delta)) => {
                    let _ = writeln!(
                        output,
                        "{}. {}: {:.2} (vs overall {}, {:+.2}){}",
                        idx + 1,
                        category.name,
                        mean,
                        fmt_mean(category.population_mean),
                        delta,
                        status
                            .map(|s| format!(" [{}]", s.description()))
                            .unwrap_or_default()
                    );
                }
                _ => {
                    let _ = writeln!(output, "{}. {}: no data", idx + 1, category.name);
                }
            }
        }
        let _ = writeln!(output);

        let _ = writeln!(output, "DETAILED QUESTION ANALYSIS");
        let _ = writeln!(output, "{}", "-".repeat(40));
        for category in report.comparison.categories.iter() {
            let _ = writeln!(output, "{}:", category.name);
            let mut scored: Vec<(&str, f64)> = category
                .questions
                .iter()
                .filter_map(|q| q.selection_mean.map(|m| (q.question.as_str(), m)))
                .collect();
            if scored.len() >= 2 {
                scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                let _ = writeln!(output, "   highest: {} ({:.2})", scored[0].0, scored[0].1);
                let last = scored.len() - 1;
                let _ = writeln!(
                    output,
                    "   lowest: {} ({:.2})",
                    scored[last].0, scored[last].1
                );
            }
            for question in category.questions.iter() {
                match (question.selection_mean, question.delta) {
                    (Some(mean), Some(delta)) => {
                        let _ = writeln!(
                            output,
                            "   - {}: {:.2} (vs overall {}, {:+.2}) ({} responses)",
                            question.question,
                            mean,
                            fmt_mean(question.population_mean),
                            delta,
                            question.selection_responses
                        );
                    }
                    _ => {
                        let _ = writeln!(
                            output,
                            "   - {}: no data ({} responses)",
                            question.question, question.selection_responses
                        );
                    }
                }
            }
            let _ = writeln!(output);
        }

        if !comments.is_empty() {
            let _ = writeln!(output, "COMMENTS BY CATEGORY");
            let _ = writeln!(output, "{}", "-".repeat(40));
            for category in comments.iter() {
                let _ = writeln!(
                    output,
                    "{} ({} comments):",
                    category.category,
                    category.comments.len()
                );
                for (idx, comment) in category.comments.iter().enumerate() {
                    // Attribute the comment for the dimensions that were not
                    // pinned by the selection.
                    let team_info = match report.selection.team {
                        GroupChoice::All => format!(" - {}", comment.team),
                        _ => String::new(),
                    };
                    let location_info = match report.selection.location {
                        GroupChoice::All => format!(" ({})", comment.location),
                        _ => String::new(),
                    };
                    let _ = writeln!(
                        output,
                        "   {}. \"{}\"{}{}",
                        idx + 1,
                        comment.text,
                        team_info,
                        location_info
                    );
                }
            }
            let _ = writeln!(output);
        }
    }

    let _ = writeln!(output, "RECOMMENDATIONS");
    let _ = writeln!(output, "{}", "-".repeat(40));
    for (idx, recommendation) in report.recommendations.iter().enumerate() {
        let _ = writeln!(output, "{}. {}", idx + 1, recommendation);
    }

    if !report.notes.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "DATA QUALITY NOTES");
        let _ = writeln!(output, "{}", "-".repeat(40));
        for note in report.notes.iter() {
            let _ = writeln!(output, "- {}", note);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use likert_stats::GroupChoice;
    use std::collections::HashMap as StdHashMap;

    fn row(id: &str, team: &str, location: &str, comment: Option<&str>) -> ResponseRow {
        let mut answers: StdHashMap<String, RawValue> = StdHashMap::new();
        if let Some(comment) = comment {
            answers.insert("Comments".to_string(), RawValue::Text(comment.to_string()));
        }
        ResponseRow {
            id: id.to_string(),
            team: team.to_string(),
            location: location.to_string(),
            answers,
        }
    }

    fn comment_category() -> SurveyCategory {
        SurveyCategory {
            name: "Culture".to_string(),
            questions: vec!["Q1".to_string()],
            comment_column: Some("Comments".to_string()),
        }
    }

    #[test]
    fn comments_respect_the_selection() {
        let rows = vec![
            row("r1", "Eng", "HQ", Some("Great team culture")),
            row("r2", "Ops", "HQ", Some("Too many meetings")),
        ];
        let selection = SubsetSelection {
            team: GroupChoice::Value("Eng".to_string()),
            location: GroupChoice::All,
        };
        let collected = collect_comments(&rows, &selection, &[comment_category()]);
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].comments.len(), 1);
        assert_eq!(collected[0].comments[0].text, "Great team culture");
    }

    #[test]
    fn short_or_missing_comments_are_dropped() {
        let rows = vec![
            row("r1", "Eng", "HQ", Some("ok")),
            row("r2", "Eng", "HQ", Some("   ")),
            row("r3", "Eng", "HQ", None),
        ];
        let collected = collect_comments(&rows, &SubsetSelection::all(), &[comment_category()]);
        assert!(collected.is_empty());
    }

    #[test]
    fn categories_without_comment_column_are_skipped() {
        let rows = vec![row("r1", "Eng", "HQ", Some("Great team culture"))];
        let category = SurveyCategory {
            name: "Culture".to_string(),
            questions: vec!["Q1".to_string()],
            comment_column: None,
        };
        let collected = collect_comments(&rows, &SubsetSelection::all(), &[category]);
        assert!(collected.is_empty());
    }
}
