//! Column equality filters
//!
//! The CLI narrows both input files with `--year` and `--team`. Each flag is
//! one `column == value` condition; a row passes when every condition holds.

use crate::io::TabularFile;
use crate::types::{Row, TableError};

/// Conjunction of `column == value` conditions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EqualityFilter {
    conditions: Vec<(String, String)>,
}

impl EqualityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(String, String)] {
        &self.conditions
    }

    /// Whether every condition holds for `row`
    ///
    /// A row that lacks a filtered field does not match.
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions
            .iter()
            .all(|(column, value)| row.get(column) == Some(value.as_str()))
    }

    /// Check that `file` has every filtered column
    ///
    /// # Errors
    ///
    /// `InvalidArgument` naming the first missing column.
    pub fn validate(&self, file: &TabularFile) -> Result<(), TableError> {
        match self
            .conditions
            .iter()
            .find(|(column, _)| !file.header().contains(column))
        {
            Some((column, _)) => Err(TableError::unknown_column(column, file.path())),
            None => Ok(()),
        }
    }
}
