//! Report orchestration
//!
//! Opens the input, reference and output files described by a
//! [`ReportConfig`] and runs the [`BattingAggregator`] over them.

use crate::core::aggregator::{
    AggregationSummary, BattingAggregator, MissingReferencePolicy, ReportColumns,
};
use crate::core::filter::EqualityFilter;
use crate::core::traits::ProgressReporter;
use crate::io::{TableOptions, TabularFile};
use crate::types::{FieldCountPolicy, TableError};
use std::path::PathBuf;
use tracing::info;

/// Everything needed for one report run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Batting statistics file
    pub input: PathBuf,
    /// Teams file used to resolve team names
    pub reference: PathBuf,
    /// Destination, created or truncated
    pub output: PathBuf,
    pub filter: EqualityFilter,
    pub columns: ReportColumns,
    pub missing_reference: MissingReferencePolicy,
    pub field_count: FieldCountPolicy,
}

impl ReportConfig {
    /// Config with Lahman column names, no filters and default policies
    pub fn new(
        input: impl Into<PathBuf>,
        reference: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        ReportConfig {
            input: input.into(),
            reference: reference.into(),
            output: output.into(),
            filter: EqualityFilter::default(),
            columns: ReportColumns::default(),
            missing_reference: MissingReferencePolicy::default(),
            field_count: FieldCountPolicy::default(),
        }
    }

    /// Keep only one season
    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.filter = self.filter.with(self.columns.period.clone(), year);
        self
    }

    /// Keep only one team
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.filter = self.filter.with(self.columns.sub_entity.clone(), team);
        self
    }

    pub fn with_missing_reference(mut self, policy: MissingReferencePolicy) -> Self {
        self.missing_reference = policy;
        self
    }

    pub fn with_field_count(mut self, policy: FieldCountPolicy) -> Self {
        self.field_count = policy;
        self
    }
}

/// Produce the report file described by `config`
///
/// # Errors
///
/// Fatal errors only: missing or unreadable files, unknown columns, and
/// missing references under [`MissingReferencePolicy::Fail`]. Row-level data
/// problems are skipped and counted in the returned summary.
pub fn generate_report(
    config: &ReportConfig,
    progress: &mut dyn ProgressReporter,
) -> Result<AggregationSummary, TableError> {
    let options = TableOptions::new().field_count(config.field_count);
    let mut primary = TabularFile::open_with(&config.input, options.clone())?;
    let mut reference = TabularFile::open_with(&config.reference, options)?;

    let aggregator = BattingAggregator::new(config.columns.clone())
        .with_missing_reference(config.missing_reference);
    aggregator.validate(&primary, &reference, &config.filter)?;

    let mut output = TabularFile::make(aggregator.output_header(), Some(&config.output))?;

    info!(
        input = %config.input.display(),
        reference = %config.reference.display(),
        output = %config.output.display(),
        "generating report"
    );

    aggregator.run(
        &mut primary,
        &mut reference,
        &config.filter,
        &mut output,
        progress,
    )
}
