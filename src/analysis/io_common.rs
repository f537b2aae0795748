// Primitives shared by the response file readers.

use std::path::Path;

use likert_stats::{RawValue, ResponseRow};

use crate::analysis::config_reader::FileSource;
use crate::analysis::{AnResult, MissingColumnSnafu};

/// Collapses any whitespace run (spaces, tabs, new lines) into a single
/// space. Column headers, configured question names and selection values are
/// all compared in this form.
pub fn sanitize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Row identifiers are derived from the file name and the 1-based line
/// number, so repeated runs over the same file produce the same ids.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Decodes one CSV field. Numeric text is promoted to a number so that the
/// normalizer sees the same shape a spreadsheet cell would produce.
pub fn csv_field(field: &str) -> RawValue {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        RawValue::Empty
    } else if let Ok(x) = trimmed.parse::<f64>() {
        RawValue::Number(x)
    } else {
        RawValue::Text(field.to_string())
    }
}

/// Decodes one spreadsheet cell.
pub fn decode_cell(cell: &calamine::DataType) -> RawValue {
    match cell {
        calamine::DataType::Float(x) => RawValue::Number(*x),
        calamine::DataType::Int(x) => RawValue::Number(*x as f64),
        calamine::DataType::String(s) if s.trim().is_empty() => RawValue::Empty,
        calamine::DataType::String(s) => RawValue::Text(s.clone()),
        calamine::DataType::Bool(b) => RawValue::Text(b.to_string()),
        _ => RawValue::Empty,
    }
}

fn cell_to_group_value(cell: Option<&RawValue>) -> String {
    match cell {
        Some(RawValue::Text(s)) => sanitize_text(s),
        Some(RawValue::Number(x)) => format!("{}", x),
        _ => String::new(),
    }
}

/// The mapping from header positions to the team/location columns and the
/// question columns, resolved once per file.
pub struct RowLayout {
    team_idx: usize,
    location_idx: usize,
    questions: Vec<(usize, String)>,
}

impl RowLayout {
    pub fn from_header(header: &[String], source: &FileSource, path: &str) -> AnResult<RowLayout> {
        let names: Vec<String> = header.iter().map(|h| sanitize_text(h)).collect();
        let team_idx = find_column(&names, &source.team_column, path)?;
        let location_idx = find_column(&names, &source.location_column, path)?;
        let questions: Vec<(usize, String)> = names
            .iter()
            .enumerate()
            .filter(|(idx, name)| {
                *idx != team_idx && *idx != location_idx && !name.is_empty()
            })
            .map(|(idx, name)| (idx, name.clone()))
            .collect();
        Ok(RowLayout {
            team_idx,
            location_idx,
            questions,
        })
    }

    /// Builds one response row out of decoded cells. Cells beyond the end of
    /// a short record count as empty; missing team/location values become
    /// blank group values, which the analysis records as unselectable.
    pub fn assemble(&self, id: String, cells: &[RawValue]) -> ResponseRow {
        ResponseRow {
            id,
            team: cell_to_group_value(cells.get(self.team_idx)),
            location: cell_to_group_value(cells.get(self.location_idx)),
            answers: self
                .questions
                .iter()
                .map(|(idx, name)| {
                    (
                        name.clone(),
                        cells.get(*idx).cloned().unwrap_or(RawValue::Empty),
                    )
                })
                .collect(),
        }
    }
}

fn find_column(names: &[String], column: &str, path: &str) -> AnResult<usize> {
    let wanted = sanitize_text(column);
    match names.iter().position(|name| *name == wanted) {
        Some(idx) => Ok(idx),
        None => MissingColumnSnafu {
            column: column.to_string(),
            path: path.to_string(),
        }
        .fail(),
    }
}
