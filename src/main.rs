//! Batting average CLI
//!
//! Computes one batting average per player per season from a Lahman-style
//! batting statistics file, resolving team names from a teams file.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- Batting.csv
//! cargo run -- --year 1914 Batting.csv
//! cargo run -- --year 1914 --team DET --teams data/Teams.csv -o averages.csv Batting.csv
//! ```
//!
//! Without an input file the usage text is printed. The teams file and the
//! output file default to `Teams.csv` and `result.csv` next to the executable.
//!
//! # Exit Codes
//!
//! - 0: Success, or usage printed
//! - 1: Error (file not found, unknown column, unresolved team with
//!   `--strict-references`, etc.)

use rust_batting_average::cli::{self, BarProgress};
use rust_batting_average::core::{generate_report, NoProgress, ProgressReporter};
use std::path::PathBuf;
use std::process;
use tracing::{info, warn};

/// Directory holding the executable, falling back to the working directory
fn program_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn main() {
    let args = cli::parse_args();
    cli::init_logging(args.verbose);

    let config = match args.to_report_config(&program_dir()) {
        Some(config) => config,
        None => {
            if let Err(e) = cli::print_usage() {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
            return;
        }
    };

    let mut progress: Box<dyn ProgressReporter> = if args.no_progress {
        Box::new(NoProgress)
    } else {
        Box::new(BarProgress::new())
    };

    match generate_report(&config, progress.as_mut()) {
        Ok(summary) => {
            info!(
                rows_read = summary.rows_read,
                keys_written = summary.keys_written,
                repeated_keys = summary.repeated_keys,
                rows_skipped = summary.rows_skipped,
                "report written to {}",
                config.output.display()
            );
            if !summary.missing_references.is_empty() {
                warn!(
                    "{} season(s) have teams missing from {}",
                    summary.missing_references.len(),
                    config.reference.display()
                );
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
