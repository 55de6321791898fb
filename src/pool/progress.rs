//! Completion notifications.

use crate::error::Error;
use crate::pool::job::Job;

/// Observer notified once per job reaching a terminal outcome.
///
/// Called concurrently from every worker, in completion order.
pub trait ProgressSink: Send + Sync {
    fn on_job_complete(&self, job: &Job, error: Option<&Error>);
}

/// Sink that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_job_complete(&self, _job: &Job, _error: Option<&Error>) {}
}
