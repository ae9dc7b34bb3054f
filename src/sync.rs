//! Synchronization of a destination table with a source
//!
//! Reads both sides, diffs destination (old) against source (new), compiles
//! the diff for the target table and applies it to the destination store.

use crate::config::EngineConfig;
use crate::differ::{DiffStats, TableDiffer};
use crate::error::{Result, TabsyncError};
use crate::model::RowSet;
use crate::patch::{ApplyReport, PatchApplier, StoreExecutor};
use crate::progress::ProgressReporter;
use crate::sql::{DiffToSqlCompiler, StatementGroup};
use serde::Serialize;
use std::fmt;

/// A table name or an ad-hoc query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SourceRef {
    Table(String),
    Query(String),
}

impl SourceRef {
    /// Text containing whitespace is a query, anything else a table name
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.contains(char::is_whitespace) {
            Self::Query(s.to_string())
        } else {
            Self::Table(s.to_string())
        }
    }

    pub fn table_name(&self) -> Option<&str> {
        match self {
            Self::Table(name) => Some(name),
            Self::Query(_) => None,
        }
    }

    /// Query text that reads this source
    pub fn to_query(&self) -> String {
        match self {
            Self::Table(name) => format!("select * from {}", quote_table_name(name)),
            Self::Query(query) => query.clone(),
        }
    }
}

/// Quote each dot-separated part of a table name as an identifier
fn quote_table_name(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(name) => f.write_str(name),
            Self::Query(query) => f.write_str(query),
        }
    }
}

/// Produces the header and rows of a table or query, all values as text
pub trait RowSource {
    fn read_rows(&mut self, source: &SourceRef) -> anyhow::Result<RowSet>;
}

impl<T: RowSource + ?Sized> RowSource for &mut T {
    fn read_rows(&mut self, source: &SourceRef) -> anyhow::Result<RowSet> {
        (**self).read_rows(source)
    }
}

/// Outcome of a sync run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub target_table: String,
    pub source_rows: usize,
    pub dest_rows: usize,
    pub diff: DiffStats,
    pub groups: Vec<StatementGroup>,
    /// None for dry runs
    pub applied: Option<ApplyReport>,
}

impl SyncReport {
    pub fn is_dry_run(&self) -> bool {
        self.applied.is_none()
    }
}

/// Composes differ, compiler and applier
#[derive(Debug, Clone, Default)]
pub struct SyncOrchestrator {
    config: EngineConfig,
    dry_run: bool,
}

impl SyncOrchestrator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Table the patch is written to: the override, else the destination table
    pub fn target_table(&self, dest: &SourceRef) -> Result<String> {
        match (&self.config.target_table, dest.table_name()) {
            (Some(target), _) => Ok(target.clone()),
            (None, Some(table)) => Ok(table.to_string()),
            (None, None) => Err(TabsyncError::configuration(
                "destination is a query; a target table must be given",
            )),
        }
    }

    /// Bring `dest` in line with `source`
    pub fn sync<S, D>(
        &self,
        source_store: &mut S,
        source: &SourceRef,
        dest_store: &mut D,
        dest: &SourceRef,
    ) -> Result<SyncReport>
    where
        S: RowSource + ?Sized,
        D: RowSource + StoreExecutor + ?Sized,
    {
        let target_table = self.target_table(dest)?;
        log::info!("Syncing '{}' into '{}' (target '{}')", source, dest, target_table);

        let mut progress = self.progress();
        let source_rows = read_source(source_store, source)?;
        let dest_rows = read_source(dest_store, dest)?;
        progress.finish_read(&read_summary(&source_rows, &dest_rows));
        drop(progress);

        self.diff_and_apply(target_table, &source_rows, &dest_rows, dest_store)
    }

    /// Sync two tables or queries living in the same store
    pub fn sync_same_store<D>(&self, store: &mut D, source: &SourceRef, dest: &SourceRef) -> Result<SyncReport>
    where
        D: RowSource + StoreExecutor + ?Sized,
    {
        let target_table = self.target_table(dest)?;
        log::info!("Syncing '{}' into '{}' (target '{}')", source, dest, target_table);

        let mut progress = self.progress();
        let source_rows = read_source(store, source)?;
        let dest_rows = read_source(store, dest)?;
        progress.finish_read(&read_summary(&source_rows, &dest_rows));
        drop(progress);

        self.diff_and_apply(target_table, &source_rows, &dest_rows, store)
    }

    fn progress(&self) -> ProgressReporter {
        if self.config.progress {
            ProgressReporter::new_for_sync()
        } else {
            ProgressReporter::new_minimal()
        }
    }

    fn diff_and_apply<D>(
        &self,
        target_table: String,
        source_rows: &RowSet,
        dest_rows: &RowSet,
        dest_store: &mut D,
    ) -> Result<SyncReport>
    where
        D: StoreExecutor + ?Sized,
    {
        let diff = TableDiffer::new()
            .with_key(self.config.key.clone())
            .typed_header(self.config.typed_header)
            .diff(dest_rows, source_rows)?;
        let stats = DiffStats::from_rows(&diff);

        let groups = DiffToSqlCompiler::new(&target_table)
            .with_key(self.config.key.clone())
            .typed_header(self.config.typed_header)
            .compile(&diff)?;

        let applied = if self.dry_run {
            log::info!("Dry run: {} statement groups not applied", groups.len());
            None
        } else {
            let mut applier = PatchApplier::new(dest_store).show_progress(self.config.progress);
            Some(applier.apply(&groups)?)
        };

        Ok(SyncReport {
            target_table,
            source_rows: source_rows.len(),
            dest_rows: dest_rows.len(),
            diff: stats,
            groups,
            applied,
        })
    }
}

fn read_source<S: RowSource + ?Sized>(store: &mut S, source: &SourceRef) -> Result<RowSet> {
    store
        .read_rows(source)
        .map_err(|e| TabsyncError::row_source(source.to_string(), format!("{:#}", e)))
}

fn read_summary(source_rows: &RowSet, dest_rows: &RowSet) -> String {
    format!(
        "Read {} source rows, {} destination rows",
        source_rows.len(),
        dest_rows.len()
    )
}
