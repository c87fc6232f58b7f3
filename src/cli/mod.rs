// CLI module
// Command-line interface, logging setup and progress display

mod args;
mod progress;

pub use args::{CliArgs, DEFAULT_OUTPUT_FILE, DEFAULT_TEAMS_FILE};
pub use progress::BarProgress;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

/// Parse command-line arguments using clap
///
/// Invalid arguments and `--help` are handled by clap, which prints a
/// message and exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Print the usage text to stdout
pub fn print_usage() -> std::io::Result<()> {
    CliArgs::command().print_help()
}

/// Default log filter for a `-v` count
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the stderr tracing subscriber
///
/// `RUST_LOG` wins over the verbosity flag when set. Calling this twice is
/// harmless; the second subscriber is ignored.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
