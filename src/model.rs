//! Core data types shared by the differ, codec and compiler

use crate::error::{Result, TabsyncError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Tag of the header row in a diff stream
pub const HEADER_TAG: &str = "@@";
/// Tag of an inserted row
pub const INSERT_TAG: &str = "+++";
/// Tag of a deleted row
pub const DELETE_TAG: &str = "---";
/// Tag signalling that the compared sources have incompatible columns
pub const SCHEMA_CHANGE_TAG: &str = "!";
/// Tags of context, skipped and reordered rows
pub const SKIP_TAGS: [&str; 3] = ["", "...", ":"];
/// Update tag the differ starts from when picking a separator
pub const DEFAULT_UPDATE_TAG: &str = "->";
/// Cell text standing for SQL NULL, as in the COPY text format
pub const NULL_CELL: &str = "\\N";

/// A single column of a header
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
        }
    }

    pub fn typed(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type.into()),
        }
    }

    /// Parse a header label. In typed mode `id integer` becomes name `id`,
    /// type `integer`; a label without a type is accepted.
    pub fn from_label(label: &str, typed: bool) -> Self {
        if !typed {
            return Self::new(label);
        }
        match label.trim().split_once(char::is_whitespace) {
            Some((name, data_type)) if !data_type.trim().is_empty() => {
                Self::typed(name, data_type.trim())
            }
            _ => Self::new(label.trim()),
        }
    }

    /// Label as written in a diff header or an echoed parameter header
    pub fn label(&self, typed: bool) -> String {
        match (&self.data_type, typed) {
            (Some(data_type), true) => format!("{} {}", self.name, data_type),
            _ => self.name.clone(),
        }
    }
}

/// Ordered columns defining cell count and position of every row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub columns: Vec<Column>,
}

impl Header {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Build an untyped header from bare column names
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(names.iter().map(|n| Column::new(n.as_ref())).collect())
    }

    pub fn from_labels<S: AsRef<str>>(labels: &[S], typed: bool) -> Self {
        Self::new(
            labels
                .iter()
                .map(|l| Column::from_label(l.as_ref(), typed))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn labels(&self, typed: bool) -> Vec<String> {
        self.columns.iter().map(|c| c.label(typed)).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Ordered subset of column names used to correlate rows and narrow predicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(Vec<String>);

impl Key {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(TabsyncError::configuration("key must name at least one column"));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.trim().is_empty() {
                return Err(TabsyncError::configuration("key contains an empty column name"));
            }
            if !seen.insert(column.as_str()) {
                return Err(TabsyncError::configuration(format!(
                    "key column '{}' listed more than once",
                    column
                )));
            }
        }

        Ok(Self(columns))
    }

    /// Parse a comma-separated column list such as `id,name`
    pub fn parse(s: &str) -> Result<Self> {
        Self::new(s.split(',').map(|c| c.trim().to_string()))
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    /// Header positions of the key columns, in key order
    pub fn positions(&self, header: &Header) -> std::result::Result<Vec<usize>, String> {
        self.0
            .iter()
            .map(|name| {
                header
                    .position(name)
                    .ok_or_else(|| format!("key column '{}' not found in header", name))
            })
            .collect()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

/// Tag in front of every diff row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowTag {
    Header,
    Insert,
    Delete,
    Skip(String),
    SchemaChange,
    /// An update row; the tag text doubles as the separator of its changed cells
    Update(String),
}

impl RowTag {
    pub fn parse(tag: &str) -> Self {
        match tag {
            HEADER_TAG => Self::Header,
            INSERT_TAG => Self::Insert,
            DELETE_TAG => Self::Delete,
            SCHEMA_CHANGE_TAG => Self::SchemaChange,
            t if SKIP_TAGS.contains(&t) => Self::Skip(t.to_string()),
            t => Self::Update(t.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Header => HEADER_TAG,
            Self::Insert => INSERT_TAG,
            Self::Delete => DELETE_TAG,
            Self::SchemaChange => SCHEMA_CHANGE_TAG,
            Self::Skip(t) | Self::Update(t) => t,
        }
    }
}

impl fmt::Display for RowTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged row of a diff stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRow {
    pub tag: RowTag,
    pub cells: Vec<String>,
}

impl DiffRow {
    pub fn new(tag: RowTag, cells: Vec<String>) -> Self {
        Self { tag, cells }
    }

    pub fn header(header: &Header, typed: bool) -> Self {
        Self::new(RowTag::Header, header.labels(typed))
    }

    pub fn insert(cells: Vec<String>) -> Self {
        Self::new(RowTag::Insert, cells)
    }

    pub fn delete(cells: Vec<String>) -> Self {
        Self::new(RowTag::Delete, cells)
    }

    pub fn is_header(&self) -> bool {
        self.tag == RowTag::Header
    }
}

/// Materialized rows of a table or query, all values as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSet {
    pub header: Header,
    pub rows: Vec<Vec<String>>,
}

impl RowSet {
    pub fn new(header: Header, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
