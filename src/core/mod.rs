//! Core business logic module
//!
//! This module contains the aggregation components:
//! - `traits` - progress reporting seam
//! - `filter` - column equality filters
//! - `aggregator` - per-player-per-season batting averages
//! - `report` - opening files and running a report from a config

pub mod aggregator;
pub mod filter;
pub mod report;
pub mod traits;

pub use aggregator::{
    batting_average, format_average, AggregationSummary, BattingAggregator,
    MissingReferencePolicy, ReportColumns, SeasonAverage, SeasonKey,
};
pub use filter::EqualityFilter;
pub use report::{generate_report, ReportConfig};
pub use traits::{NoProgress, ProgressReporter};
