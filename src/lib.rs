//! Rust Batting Average Library
//! # Overview
//!
//! This library provides a cursor-based CSV table abstraction and a
//! batting-average aggregator built on top of it.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Header, Row, TableError)
//! - [`io`] - The [`TabularFile`] cursor, bookmarks and row sinks
//! - [`core`] - Business logic components:
//!   - [`core::filter`] - Column equality filters
//!   - [`core::aggregator`] - Per-player-per-season batting averages
//!   - [`core::report`] - Report orchestration from a [`ReportConfig`]
//! - [`cli`] - CLI arguments parsing, logging and progress display
//!
//! # Cursor Model
//!
//! A [`TabularFile`] keeps one read position. Bulk operations started from
//! [`Origin::Cursor`] put it back where they found it, so nested scans over
//! the same file (the aggregator does this for every output row) never
//! disturb an outer pass.
//!
//! # Batting Average
//!
//! For every distinct `(playerID, yearID)` key the aggregator sums hits and
//! at-bats across all stints, joins the team name of every stint in file
//! order, and writes `hits / at_bats` rounded to three places.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod types;

pub use core::{
    generate_report, AggregationSummary, BattingAggregator, EqualityFilter, ReportConfig,
};
pub use io::{Bookmark, Origin, RowSink, TableOptions, TabularFile};
pub use types::{FieldCountPolicy, Header, Row, TableError};
