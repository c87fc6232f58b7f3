//! Destinations for filtered rows
//!
//! `filter`, `scan` and `each` push every selected row into a [`RowSink`].
//! Collecting in memory and materializing into a new file are the same
//! operation with a different sink.

use crate::io::tabular_file::TabularFile;
use crate::types::{Row, TableError};

/// Receives rows selected by a predicate
pub trait RowSink {
    fn accept(&mut self, row: Row) -> Result<(), TableError>;
}

/// In-memory collector
impl RowSink for Vec<Row> {
    fn accept(&mut self, row: Row) -> Result<(), TableError> {
        self.push(row);
        Ok(())
    }
}

/// File-backed sink: each row is appended in the file's field order
impl RowSink for TabularFile {
    fn accept(&mut self, row: Row) -> Result<(), TableError> {
        self.add_row(&row).map(|_| ())
    }
}

/// Counts rows without keeping them
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountSink(pub usize);

impl RowSink for CountSink {
    fn accept(&mut self, _row: Row) -> Result<(), TableError> {
        self.0 += 1;
        Ok(())
    }
}
