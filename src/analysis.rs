use log::{info, warn};

use likert_stats::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod reports;
pub mod selection;

use crate::analysis::config_reader::{read_config, validate_config, FileSource};

#[derive(Debug, Snafu)]
pub enum AnalysisError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Workbook has no readable rows"))]
    EmptyExcel {},
    #[snafu(display("Error opening {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a CSV record"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Missing header row in {path}"))]
    MissingHeader { path: String },
    #[snafu(display("Missing required column {column:?} in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Invalid configuration: {message}"))]
    InvalidConfig { message: String },
    #[snafu(display("Could not locate the parent directory of the configuration file"))]
    MissingParentDir {},
    #[snafu(display("Error reading the selection prompt"))]
    PromptIo { source: std::io::Error },
    #[snafu(display("Could not create output directory {path}"))]
    CreatingOutputDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Could not write {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The analysis engine failed: {source}"))]
    Stats { source: StatsErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AnResult<T> = Result<T, AnalysisError>;

/// Command-line level options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub team: Option<String>,
    pub location: Option<String>,
    pub out: Option<String>,
    pub reference: Option<String>,
}

fn read_responses(root_path: &Path, source: &FileSource) -> AnResult<Vec<ResponseRow>> {
    let p: PathBuf = root_path.join(&source.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read response file {:?}", p2);
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_responses(&p2, source),
        "excel" | "xlsx" => io_excel::read_excel_responses(&p2, source),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

fn check_reference(reference_path: &str, computed_pretty: &str) -> AnResult<()> {
    let contents = fs::read_to_string(reference_path).context(OpeningJsonSnafu {
        path: reference_path.to_string(),
    })?;
    let reference: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    // Re-serializing canonicalizes key order and number formatting on both
    // sides, so the string comparison is a value comparison.
    let pretty_reference = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    if pretty_reference != computed_pretty {
        warn!("Found differences with the reference summary");
        print_diff(pretty_reference.as_str(), computed_pretty, "\n");
        whatever!("Difference detected between calculated summary and reference summary");
    }
    Ok(())
}

fn run_directory(base: &str, selection: &SubsetSelection) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let team_part = match &selection.team {
        GroupChoice::All => "AllTeams".to_string(),
        GroupChoice::Value(v) => v.replace(' ', "_"),
    };
    let location_part = match &selection.location {
        GroupChoice::All => "AllLocations".to_string(),
        GroupChoice::Value(v) => v.replace(' ', "_"),
    };
    format!("{}/{}_{}_{}", base, timestamp, team_part, location_part)
}

/// Loads the configuration and the responses, resolves the selection, runs
/// the analysis and emits the summary and the report.
pub fn run_analysis(config_path: &str, opts: &RunOptions) -> AnResult<()> {
    let config = read_config(config_path)?;
    info!("config: {:?}", config);
    let (categories, scale, rules) = validate_config(&config)?;

    let root_path = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu {})?;
    let mut rows: Vec<ResponseRow> = Vec::new();
    for source in config.response_file_sources.iter() {
        let mut file_rows = read_responses(root_path, source)?;
        rows.append(&mut file_rows);
    }
    info!(
        "Loaded {} responses from {} file source(s)",
        rows.len(),
        config.response_file_sources.len()
    );

    let groups = selection::available_groups(&rows);
    let subset = match (&opts.team, &opts.location) {
        (None, None) => selection::prompt_selection(&groups)?,
        (team, location) => selection::resolve_selection(
            &groups,
            team.as_deref().unwrap_or(selection::ALL_CHOICE),
            location.as_deref().unwrap_or(selection::ALL_CHOICE),
        )?,
    };
    info!("Selection: {:?}", subset);

    let report =
        run_survey_analysis(&rows, &categories, &scale, &rules, &subset).context(StatsSnafu)?;
    for note in report.notes.iter() {
        warn!("data quality: {}", note);
    }

    let comments = reports::collect_comments(&rows, &subset, &config.categories);
    let summary_js = reports::build_summary_js(
        &config.output_settings.survey_name,
        &report,
        &comments,
    );
    let pretty_summary = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    let text_report =
        reports::render_text_report(&config.output_settings.survey_name, &report, &comments);

    match opts.out.as_deref() {
        Some("stdout") => println!("{}", pretty_summary),
        Some(path) => {
            print!("{}", text_report);
            fs::write(path, &pretty_summary).context(WritingOutputSnafu {
                path: path.to_string(),
            })?;
            println!("Summary written to {}", path);
        }
        None => {
            print!("{}", text_report);
            let base = config
                .output_settings
                .output_directory
                .clone()
                .unwrap_or_else(|| "output".to_string());
            let run_dir = run_directory(&base, &subset);
            fs::create_dir_all(&run_dir).context(CreatingOutputDirSnafu {
                path: run_dir.clone(),
            })?;
            let summary_path = format!("{}/summary.json", run_dir);
            fs::write(&summary_path, &pretty_summary).context(WritingOutputSnafu {
                path: summary_path.clone(),
            })?;
            let report_path = format!("{}/report.txt", run_dir);
            fs::write(&report_path, &text_report).context(WritingOutputSnafu {
                path: report_path.clone(),
            })?;
            println!("Analysis artifacts written to {}", run_dir);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &opts.reference {
        check_reference(reference_path, &pretty_summary)?;
    }

    Ok(())
}
