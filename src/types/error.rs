//! Error types for the batting average report
//!
//! This module defines every error that can occur while reading, scanning,
//! writing and aggregating delimited files.
//!
//! # Error Categories
//!
//! - **Fatal**: file not found, I/O failures, CSV parse failures and invalid
//!   arguments. These abort the run.
//! - **Recoverable**: malformed rows, invalid counters and missing reference
//!   rows. Bulk operations and the aggregator skip the offending data and
//!   continue.

use std::path::Path;
use thiserror::Error;

/// Main error type for tabular file access and aggregation
///
/// Each variant carries enough context to produce a useful CLI message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// File not found at the specified path
    ///
    /// Raised when opening an existing file that does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading, writing or removing a file
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error (invalid UTF-8, broken quoting)
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// An argument cannot be applied to the file it targets
    ///
    /// For example an equality filter on a column the header does not have.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the misuse
        message: String,
    },

    /// A data line whose field count does not match the header
    ///
    /// Recoverable: the line is skipped.
    #[error("Malformed row at line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        /// Line number of the offending record
        line: u64,
        /// Number of header fields
        expected: usize,
        /// Number of fields on the line
        found: usize,
    },

    /// A counter field that is not a non-negative integer
    ///
    /// Recoverable: the stint is skipped.
    #[error("Invalid number '{value}' in field '{field}' at line {line}")]
    InvalidNumber {
        /// Line number of the offending record
        line: u64,
        /// Field name
        field: String,
        /// Raw field value
        value: String,
    },

    /// No reference row exists for a (sub-entity, period) pair
    ///
    /// Recoverable unless the caller asks for strict reference lookups.
    #[error("No reference row for {sub_entity} in {period} (key {key})")]
    ReferenceNotFound {
        /// The `entity::period` key being aggregated
        key: String,
        /// Sub-entity identifier that was looked up
        sub_entity: String,
        /// Period identifier that was looked up
        period: String,
    },
}

impl From<std::io::Error> for TableError {
    fn from(error: std::io::Error) -> Self {
        TableError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for TableError {
    fn from(error: csv::Error) -> Self {
        if error.is_io_error() {
            return TableError::IoError {
                message: error.to_string(),
            };
        }

        let line = error.position().map(|pos| pos.line());

        TableError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl TableError {
    /// Create a FileNotFound error
    pub fn file_not_found(path: &Path) -> Self {
        TableError::FileNotFound {
            path: path.display().to_string(),
        }
    }

    /// Create an IoError that names the file involved
    pub fn io_at(path: &Path, error: std::io::Error) -> Self {
        TableError::IoError {
            message: format!("{}: {}", path.display(), error),
        }
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        TableError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an InvalidArgument error for a column missing from a header
    pub fn unknown_column(column: &str, path: &Path) -> Self {
        TableError::invalid_argument(format!(
            "column '{}' does not exist in {}",
            column,
            path.display()
        ))
    }

    /// Create a MalformedRow error
    pub fn malformed_row(line: u64, expected: usize, found: usize) -> Self {
        TableError::MalformedRow {
            line,
            expected,
            found,
        }
    }

    /// Create an InvalidNumber error
    pub fn invalid_number(line: u64, field: &str, value: &str) -> Self {
        TableError::InvalidNumber {
            line,
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Create a ReferenceNotFound error
    pub fn reference_not_found(key: &str, sub_entity: &str, period: &str) -> Self {
        TableError::ReferenceNotFound {
            key: key.to_string(),
            sub_entity: sub_entity.to_string(),
            period: period.to_string(),
        }
    }

    /// Whether this error only concerns a single row of data
    ///
    /// Recoverable errors are skipped with a warning; everything else aborts.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TableError::MalformedRow { .. }
                | TableError::InvalidNumber { .. }
                | TableError::ReferenceNotFound { .. }
        )
    }
}
