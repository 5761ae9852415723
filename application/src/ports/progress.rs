//! Progress notification port
//!
//! Defines the interface for reporting per-record progress during a labeling
//! run. Implementations live in the cli crate and must not affect control
//! flow or stored data.

use std::path::Path;

/// Callback for progress updates during a labeling run
pub trait LabelProgress: Send + Sync {
    /// Called once before the first record is processed.
    fn on_run_start(&self, total: usize);

    /// Called when a record has been labeled. `raw` is the verbatim backend
    /// response, for verbose display.
    fn on_record_labeled(&self, index: usize, path: &Path, label: &str, raw: &str);

    /// Called when a record's backend call failed (continue-on-error mode
    /// only; in fail-stop mode the error terminates the run instead).
    fn on_record_failed(&self, index: usize, path: &Path);

    /// Called once after the last record, with the number of labeled rows.
    fn on_run_complete(&self, labeled: usize);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl LabelProgress for NoProgress {
    fn on_run_start(&self, _total: usize) {}
    fn on_record_labeled(&self, _index: usize, _path: &Path, _label: &str, _raw: &str) {}
    fn on_record_failed(&self, _index: usize, _path: &Path) {}
    fn on_run_complete(&self, _labeled: usize) {}
}
