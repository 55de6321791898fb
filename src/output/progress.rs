//! Progress reporting for a backup run.

use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::Error;
use crate::pool::{Job, ProgressSink};

/// Counters collected over a backup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupStats {
    pub downloaded: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub skipped: u64,
}

/// Progress sink driving a terminal progress bar.
///
/// The bar length grows as courses are planned, since the full set of
/// files is not known when the run starts.
pub struct ProgressReporter {
    bar: ProgressBar,
    downloaded: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    skipped: AtomicU64,
}

impl ProgressReporter {
    /// Create a reporter; a hidden bar is used when `visible` is false.
    pub fn new(visible: bool) -> Self {
        let bar = if visible {
            create_file_bar(0)
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            downloaded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    /// Account for newly planned files.
    pub fn add_planned(&self, to_download: u64, skipped: u64) {
        self.bar.inc_length(to_download + skipped);
        self.bar.inc(skipped);
        self.skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn stats(&self) -> BackupStats {
        BackupStats {
            downloaded: self.downloaded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

impl ProgressSink for ProgressReporter {
    fn on_job_complete(&self, job: &Job, error: Option<&Error>) {
        match error {
            None => {
                self.downloaded.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Downloaded: {}", job.destination().display());
            }
            Some(e) if e.is_cancellation() => {
                self.cancelled.fetch_add(1, Ordering::Relaxed);
            }
            Some(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.bar.suspend(|| {
                    tracing::warn!("Failed: {}: {}", job.destination().display(), e);
                });
            }
        }
        self.bar.inc(1);
    }
}

/// Create a progress bar counting files.
pub fn create_file_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );
    bar
}
