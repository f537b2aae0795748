use clap::Parser;

/// This is a survey analysis program for Likert-scale form exports.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the survey: response file
    /// sources, team/location columns, categories, score scale and analysis
    /// thresholds.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (team name or 'all') The team to analyze. When both --team and
    /// --location are omitted, the selection is prompted interactively.
    #[clap(short, long, value_parser)]
    pub team: Option<String>,

    /// (location name or 'all') The location to analyze.
    #[clap(short, long, value_parser)]
    pub location: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the JSON summary is
    /// written to the given location instead of a timestamped run directory.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected JSON summary. If
    /// provided, likertlens will check that the computed summary matches the
    /// reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
