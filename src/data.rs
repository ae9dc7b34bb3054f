//! DuckDB-backed row source and store executor

use crate::error::{Result, TabsyncError};
use crate::model::{Column, Header, RowSet, NULL_CELL};
use crate::patch::StoreExecutor;
use crate::sync::{RowSource, SourceRef};
use duckdb::{params_from_iter, Connection};
use std::path::Path;

/// Name of the temporary view rows are read through
const READ_VIEW: &str = "tabsync_read_view";

/// A DuckDB database used as row source and patch target
pub struct DuckDbStore {
    connection: Connection,
}

impl DuckDbStore {
    /// Open a database file; `:memory:` opens an in-memory database
    pub fn open(path: &str) -> Result<Self> {
        let connection = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if !Path::new(path).exists() {
                log::info!("Database '{}' does not exist yet, creating it", path);
            }
            Connection::open(path)?
        };
        Ok(Self { connection })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            connection: Connection::open_in_memory()?,
        })
    }

    /// Run setup SQL such as `CREATE TABLE` statements
    pub fn execute_sql(&self, sql: &str) -> Result<()> {
        self.connection.execute_batch(sql)?;
        Ok(())
    }

    /// Read a table or query into memory
    pub fn read(&self, source: &SourceRef) -> Result<RowSet> {
        let create_view_sql = format!(
            "CREATE OR REPLACE TEMP VIEW {} AS {}",
            READ_VIEW,
            source.to_query()
        );
        self.connection
            .execute(&create_view_sql, [])
            .map_err(|e| TabsyncError::row_source(source.to_string(), e.to_string()))?;

        let result = self.read_view();
        self.connection
            .execute(&format!("DROP VIEW IF EXISTS {}", READ_VIEW), [])?;

        let rows = result?;
        log::debug!("Read {} rows from '{}'", rows.len(), source);
        Ok(rows)
    }

    fn read_view(&self) -> Result<RowSet> {
        let header = self.describe_view()?;
        if header.is_empty() {
            return Ok(RowSet::new(header, Vec::new()));
        }

        // Every value is exchanged as text; NULL reads as NULL_CELL
        let select_list = header
            .columns
            .iter()
            .map(|c| format!("CAST(\"{}\" AS VARCHAR)", c.name.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = self
            .connection
            .prepare(&format!("SELECT {} FROM {}", select_list, READ_VIEW))?;

        let width = header.len();
        let rows = stmt.query_map([], |row| {
            (0..width)
                .map(|i| {
                    row.get::<_, Option<String>>(i)
                        .map(|value| value.unwrap_or_else(|| NULL_CELL.to_string()))
                })
                .collect::<std::result::Result<Vec<String>, _>>()
        })?;

        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }
        Ok(RowSet::new(header, data))
    }

    fn describe_view(&self) -> Result<Header> {
        let mut stmt = self.connection.prepare(&format!("DESCRIBE {}", READ_VIEW))?;
        let columns = stmt.query_map([], |row| {
            Ok(Column::typed(
                row.get::<_, String>(0)?, // column_name
                row.get::<_, String>(1)?, // column_type
            ))
        })?;

        let mut header = Vec::new();
        for column in columns {
            header.push(column?);
        }
        Ok(Header::new(header))
    }

    /// Execute one statement for every parameter row inside a single
    /// transaction. `NULL_CELL` parameters are bound as SQL NULL. Returns the
    /// number of affected rows.
    pub fn execute_statement(&mut self, statement: &str, rows: &[Vec<String>]) -> Result<usize> {
        let tx = self.connection.transaction()?;
        let mut affected = 0;
        {
            let mut stmt = tx.prepare(statement)?;
            for row in rows {
                let params = row
                    .iter()
                    .map(|cell| (cell != NULL_CELL).then_some(cell.as_str()));
                affected += stmt.execute(params_from_iter(params))?;
            }
        }
        tx.commit()?;
        Ok(affected)
    }
}

impl RowSource for DuckDbStore {
    fn read_rows(&mut self, source: &SourceRef) -> anyhow::Result<RowSet> {
        Ok(self.read(source)?)
    }
}

impl StoreExecutor for DuckDbStore {
    fn execute_batch(&mut self, table: &str, statement: &str, rows: &[Vec<String>]) -> anyhow::Result<()> {
        log::debug!("Executing {} rows against '{}'", rows.len(), table);
        let affected = self.execute_statement(statement, rows)?;
        if affected < rows.len() {
            log::warn!(
                "'{}' matched {} rows for {} parameter rows: {}",
                table,
                affected,
                rows.len(),
                statement
            );
        }
        Ok(())
    }

    fn null_safe_predicates(&self) -> bool {
        true
    }
}
