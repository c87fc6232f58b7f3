//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `row`: rows, headers and the field-count policy
//! - `error`: error types for file access and aggregation

pub mod error;
pub mod row;

pub use error::TableError;
pub use row::{FieldCountPolicy, Header, Row};
