mod analysis;
mod args;

use clap::Parser;
use log::warn;
use snafu::ErrorCompat;

use crate::analysis::{run_analysis, RunOptions};

fn main() {
    let args = args::Args::parse();
    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    let opts = RunOptions {
        team: args.team,
        location: args.location,
        out: args.out,
        reference: args.reference,
    };

    let res = run_analysis(&args.config, &opts);
    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
