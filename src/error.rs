//! Error types for tabsync operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TabsyncError>;

#[derive(Error, Debug)]
pub enum TabsyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Diff framing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Compared column sets differ, or a `!` marker was found in a diff stream.
    #[error("NotSupported: schema change: {message}")]
    SchemaChange { message: String },

    #[error("Malformed diff: {message}")]
    MalformedDiff { message: String },

    #[error("Store execution error on '{table}': {message}")]
    StoreExecution { table: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Failed to read rows from '{source_ref}': {message}")]
    RowSource { source_ref: String, message: String },

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl TabsyncError {
    pub fn schema_change(msg: impl Into<String>) -> Self {
        Self::SchemaChange {
            message: msg.into(),
        }
    }

    pub fn malformed_diff(msg: impl Into<String>) -> Self {
        Self::MalformedDiff {
            message: msg.into(),
        }
    }

    pub fn store_execution(table: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::StoreExecution {
            table: table.into(),
            message: msg.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    pub fn row_source(source_ref: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::RowSource {
            source_ref: source_ref.into(),
            message: msg.into(),
        }
    }

    /// True for errors raised because the compared schemas are incompatible
    pub fn is_schema_change(&self) -> bool {
        matches!(self, Self::SchemaChange { .. })
    }
}
