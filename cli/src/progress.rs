//! Progress reporting for labeling runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use nepho_application::LabelProgress;
use std::path::Path;
use std::sync::Mutex;

/// Reports per-record progress with a progress bar
///
/// With `echo_raw` set (verbose mode) the assigned category and the verbatim
/// model response are printed above the bar for human audit.
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
    echo_raw: bool,
}

impl ProgressReporter {
    pub fn new(echo_raw: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            echo_raw,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-")
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}

impl LabelProgress for ProgressReporter {
    fn on_run_start(&self, total: usize) {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::style());
        pb.set_message("Starting...");
        *self.bar.lock().unwrap() = Some(pb);
    }

    fn on_record_labeled(&self, _index: usize, path: &Path, label: &str, raw: &str) {
        if let Some(pb) = self.bar.lock().unwrap().as_ref() {
            if self.echo_raw {
                pb.println(format!(
                    "{}: {}\n{}",
                    Self::file_name(path),
                    label.green().bold(),
                    raw.dimmed()
                ));
            }
            pb.set_message(format!("{} {}", label.green(), Self::file_name(path)));
            pb.inc(1);
        }
    }

    fn on_record_failed(&self, _index: usize, path: &Path) {
        if let Some(pb) = self.bar.lock().unwrap().as_ref() {
            pb.set_message(format!("{} {}", "x".red(), Self::file_name(path)));
            pb.inc(1);
        }
    }

    fn on_run_complete(&self, labeled: usize) {
        if let Some(pb) = self.bar.lock().unwrap().take() {
            pb.finish_with_message(format!("{labeled} records labeled"));
        }
    }
}
