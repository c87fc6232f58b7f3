//! Row and header types
//!
//! A [`Row`] is a mapping from field name to string value. Rows read from the
//! same file share one [`Header`] through an `Arc`, so a row only owns its
//! values.

use super::error::TableError;
use csv::StringRecord;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// How a data line whose field count differs from the header is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldCountPolicy {
    /// Report the line as [`TableError::MalformedRow`]
    #[default]
    Strict,
    /// Zip what lines up: extra values are dropped, missing values are absent
    Lenient,
}

/// Ordered field names with a name-to-position index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    names: StringRecord,
    index: HashMap<String, usize>,
}

impl Header {
    /// Build a header from field names
    ///
    /// If a name appears twice, lookups resolve to its first position.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut record = StringRecord::new();
        let mut index = HashMap::new();

        for (position, name) in names.into_iter().enumerate() {
            let name = name.as_ref();
            index.entry(name.to_string()).or_insert(position);
            record.push_field(name);
        }

        Header {
            names: record,
            index,
        }
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a field name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Field names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter()
    }

    /// Field names as owned strings
    pub fn to_vec(&self) -> Vec<String> {
        self.names().map(str::to_string).collect()
    }

    pub(crate) fn as_record(&self) -> &StringRecord {
        &self.names
    }
}

/// One data record, addressable by field name
///
/// Equality compares field names and values; the line a row was read from is
/// not part of its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    header: Arc<Header>,
    values: StringRecord,
}

impl Row {
    pub(crate) fn new(header: Arc<Header>, values: StringRecord) -> Self {
        Row { header, values }
    }

    /// Build a row from a header and values in field order
    pub fn from_values<I, S>(header: Arc<Header>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut record = StringRecord::new();
        for value in values {
            record.push_field(value.as_ref());
        }
        Row::new(header, record)
    }

    /// Value of a field, `None` if the header lacks it or the line was short
    pub fn get(&self, name: &str) -> Option<&str> {
        self.header
            .position(name)
            .and_then(|position| self.values.get(position))
    }

    /// Value of a field, empty if absent
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    pub fn header(&self) -> &Arc<Header> {
        &self.header
    }

    /// Values in field order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter()
    }

    /// `(name, value)` pairs in field order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.header.names().zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Line number the row was read from, if it came from a file
    pub fn line(&self) -> Option<u64> {
        self.values.position().map(|pos| pos.line())
    }

    /// Deserialize the row into a typed record using the header names
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, TableError> {
        self.values
            .deserialize(Some(self.header.as_record()))
            .map_err(TableError::from)
    }

    pub(crate) fn record(&self) -> &StringRecord {
        &self.values
    }
}
