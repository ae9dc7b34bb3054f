//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for reading row sources and applying statement groups
#[derive(Debug)]
pub struct ProgressReporter {
    pub read_pb: Option<ProgressBar>,
    pub apply_pb: Option<ProgressBar>,
    total_rows: u64,
    show_progress: bool,
}

impl ProgressReporter {
    /// Create progress reporter for a run that reads sources before applying
    pub fn new_for_sync() -> Self {
        Self {
            read_pb: Some(create_spinner("Reading rows...")),
            apply_pb: None,
            total_rows: 0,
            show_progress: true,
        }
    }

    /// Create progress reporter for applying a known number of parameter rows
    pub fn new_for_apply(total_rows: u64) -> Self {
        Self {
            read_pb: None,
            apply_pb: None,
            total_rows,
            show_progress: true,
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self {
            read_pb: None,
            apply_pb: None,
            total_rows: 0,
            show_progress: false,
        }
    }

    /// Finish the read spinner
    pub fn finish_read(&mut self, message: &str) {
        if let Some(pb) = self.read_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    fn ensure_apply_pb(&mut self) {
        if self.show_progress && self.apply_pb.is_none() {
            self.apply_pb = Some(create_progress_bar(self.total_rows, "Applying"));
        }
    }

    /// Show which group is being executed
    pub fn start_group(&mut self, message: &str) {
        self.ensure_apply_pb();
        if let Some(pb) = &self.apply_pb {
            pb.set_message(message.to_string());
        }
    }

    /// Advance by the rows of a finished group
    pub fn finish_group(&mut self, rows: u64) {
        if let Some(pb) = &self.apply_pb {
            pb.inc(rows);
        }
    }

    /// Finish all progress bars
    pub fn finish_all(&mut self, message: &str) {
        self.finish_read(message);
        if let Some(pb) = self.apply_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(pb) = self.read_pb.take() {
            pb.finish_and_clear();
        }
        if let Some(pb) = self.apply_pb.take() {
            pb.finish_and_clear();
        }
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a progress bar with known total
fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(message.to_string());
    pb
}
