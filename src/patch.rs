//! Application of compiled statement groups to a target store

use crate::error::{Result, TabsyncError};
use crate::progress::ProgressReporter;
use crate::sql::{StatementGroup, StatementKind};
use serde::Serialize;

/// Executes one statement with a batch of parameter rows against the store.
///
/// Implementations own the connection; the applier never opens one itself.
pub trait StoreExecutor {
    fn execute_batch(&mut self, table: &str, statement: &str, rows: &[Vec<String>]) -> anyhow::Result<()>;

    /// Whether predicates should be rendered `IS NOT DISTINCT FROM ?`, for
    /// stores that bind NULL cells as SQL NULL
    fn null_safe_predicates(&self) -> bool {
        false
    }
}

impl<T: StoreExecutor + ?Sized> StoreExecutor for &mut T {
    fn execute_batch(&mut self, table: &str, statement: &str, rows: &[Vec<String>]) -> anyhow::Result<()> {
        (**self).execute_batch(table, statement, rows)
    }

    fn null_safe_predicates(&self) -> bool {
        (**self).null_safe_predicates()
    }
}

/// Rows and groups applied, per statement kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub groups: usize,
    pub inserted: usize,
    pub deleted: usize,
    pub updated: usize,
}

impl ApplyReport {
    pub fn rows(&self) -> usize {
        self.inserted + self.deleted + self.updated
    }

    fn record(&mut self, group: &StatementGroup) {
        self.groups += 1;
        match group.kind {
            StatementKind::Insert => self.inserted += group.rows.len(),
            StatementKind::Delete => self.deleted += group.rows.len(),
            StatementKind::Update => self.updated += group.rows.len(),
        }
    }
}

/// Runs statement groups strictly in order, stopping at the first failure
pub struct PatchApplier<E> {
    executor: E,
    show_progress: bool,
}

impl<E: StoreExecutor> PatchApplier<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            show_progress: false,
        }
    }

    pub fn show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    /// Apply every group. Later groups may rely on earlier ones, so there is
    /// no reordering and no retry.
    pub fn apply(&mut self, groups: &[StatementGroup]) -> Result<ApplyReport> {
        let total_rows: usize = groups.iter().map(|g| g.rows.len()).sum();
        let mut progress = if self.show_progress {
            ProgressReporter::new_for_apply(total_rows as u64)
        } else {
            ProgressReporter::new_minimal()
        };

        let null_safe = self.executor.null_safe_predicates();
        let mut report = ApplyReport::default();
        for (idx, group) in groups.iter().enumerate() {
            let statement = if null_safe {
                group.null_safe_sql()
            } else {
                group.sql()
            };
            log::debug!(
                "Applying group {}/{} ({} rows): {}",
                idx + 1,
                groups.len(),
                group.rows.len(),
                statement
            );
            progress.start_group(&statement);

            self.executor
                .execute_batch(&group.table, &statement, &group.rows)
                .map_err(|e| {
                    log::error!("Group {} failed, {} groups not applied", idx + 1, groups.len() - idx - 1);
                    TabsyncError::store_execution(&group.table, format!("{:#}", e))
                })?;

            progress.finish_group(group.rows.len() as u64);
            report.record(group);
        }

        progress.finish_all(&format!("Applied {} rows", report.rows()));
        log::info!(
            "Applied {} groups: {} inserted, {} deleted, {} updated",
            report.groups,
            report.inserted,
            report.deleted,
            report.updated
        );
        Ok(report)
    }
}
