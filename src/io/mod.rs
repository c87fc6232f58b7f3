//! I/O module
//!
//! Streaming access to delimited files.
//!
//! # Components
//!
//! - `tabular_file` - cursor-based reader/writer with filter, scan and find
//! - `bookmark` - scoped cursor save/restore
//! - `sink` - destinations for filtered rows (memory or file)

pub mod bookmark;
pub mod sink;
pub mod tabular_file;

pub use bookmark::Bookmark;
pub use sink::{CountSink, RowSink};
pub use tabular_file::{Origin, Rows, TableOptions, TabularFile};
