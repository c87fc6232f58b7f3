use crate::core::{MissingReferencePolicy, ReportConfig};
use crate::types::FieldCountPolicy;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Default reference file name, looked up next to the executable
pub const DEFAULT_TEAMS_FILE: &str = "Teams.csv";

/// Default output file name, written next to the executable
pub const DEFAULT_OUTPUT_FILE: &str = "result.csv";

/// Compute per-player-per-season batting averages
#[derive(Parser, Debug)]
#[command(name = "batting-average")]
#[command(
    about = "Compute per-player-per-season batting averages from a batting statistics CSV",
    long_about = None
)]
pub struct CliArgs {
    /// Input CSV file path containing batting records
    #[arg(value_name = "INPUT", help = "Path to the batting statistics CSV file")]
    pub input_file: Option<PathBuf>,

    /// Keep only this season
    #[arg(long = "year", value_name = "YYYY", help = "Only aggregate this season")]
    pub year: Option<String>,

    /// Keep only this team
    #[arg(long = "team", value_name = "TEAM_ID", help = "Only aggregate stints for this team")]
    pub team: Option<String>,

    /// Reference file with team names
    #[arg(
        long = "teams",
        value_name = "PATH",
        help = "Teams CSV used to resolve team names (default: Teams.csv next to the executable)"
    )]
    pub teams_file: Option<PathBuf>,

    /// Output file
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Output CSV path (default: result.csv next to the executable)"
    )]
    pub output_file: Option<PathBuf>,

    /// Abort when a team cannot be resolved
    #[arg(
        long = "strict-references",
        help = "Fail instead of warning when a stint's team has no row in the teams file"
    )]
    pub strict_references: bool,

    /// Zip mismatched rows instead of skipping them
    #[arg(
        long = "lenient-rows",
        help = "Accept rows whose field count differs from the header"
    )]
    pub lenient_rows: bool,

    /// Hide the progress bar
    #[arg(long = "no-progress", help = "Do not display a progress bar")]
    pub no_progress: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    /// Build a ReportConfig from CLI arguments
    ///
    /// Relative defaults for the teams and output files resolve against
    /// `program_dir`. Returns `None` when no input file was given.
    pub fn to_report_config(&self, program_dir: &Path) -> Option<ReportConfig> {
        let input = self.input_file.clone()?;
        let reference = self
            .teams_file
            .clone()
            .unwrap_or_else(|| program_dir.join(DEFAULT_TEAMS_FILE));
        let output = self
            .output_file
            .clone()
            .unwrap_or_else(|| program_dir.join(DEFAULT_OUTPUT_FILE));

        let mut config = ReportConfig::new(input, reference, output);
        if let Some(year) = &self.year {
            config = config.with_year(year.clone());
        }
        if let Some(team) = &self.team {
            config = config.with_team(team.clone());
        }
        if self.strict_references {
            config = config.with_missing_reference(MissingReferencePolicy::Fail);
        }
        if self.lenient_rows {
            config = config.with_field_count(FieldCountPolicy::Lenient);
        }

        Some(config)
    }
}
