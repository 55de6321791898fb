//! Per-job download logic with bounded retries.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::pool::fetch::Fetcher;
use crate::pool::job::{Job, JobSource};
use crate::pool::progress::ProgressSink;
use crate::pool::writer::{write_atomic, write_bytes_atomic};

/// How often and how fast a failed fetch is retried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub retry_limit: u32,
    /// Upper bound of the jittered delay before a retry; 0 retries immediately.
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(retry_limit: u32) -> Self {
        Self {
            retry_limit,
            backoff_ms: 0,
        }
    }

    pub fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }

    /// Total number of attempts allowed per job.
    pub fn max_attempts(&self) -> u32 {
        self.retry_limit.saturating_add(1)
    }

    fn next_delay(&self) -> Option<Duration> {
        if self.backoff_ms == 0 {
            return None;
        }
        let ms = rand::thread_rng().gen_range(0..=self.backoff_ms);
        Some(Duration::from_millis(ms))
    }
}

/// Performs jobs: fetch and write, retrying transient failures.
pub struct DownloadExecutor {
    fetcher: Arc<dyn Fetcher>,
    progress: Arc<dyn ProgressSink>,
    retry: RetryPolicy,
}

impl DownloadExecutor {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        progress: Arc<dyn ProgressSink>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            fetcher,
            progress,
            retry,
        }
    }

    /// Run `job` to a terminal outcome and notify the progress sink once.
    ///
    /// Returns [`Error::Cancelled`] without touching the network when `cancel`
    /// fires before or during an attempt.
    pub async fn execute(&self, cancel: &CancellationToken, job: &Job) -> Result<()> {
        let result = self.run_job(cancel, job).await;
        self.progress.on_job_complete(job, result.as_ref().err());
        result
    }

    async fn run_job(&self, cancel: &CancellationToken, job: &Job) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        match job.source() {
            JobSource::Inline(bytes) => {
                write_bytes_atomic(job.destination(), bytes).await?;
                Ok(())
            }
            JobSource::Remote(locator) => self.download(cancel, locator, job.destination()).await,
        }
    }

    async fn download(&self, cancel: &CancellationToken, locator: &str, dest: &Path) -> Result<()> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                outcome = self.attempt(locator, dest) => outcome,
            };

            match outcome {
                Ok(bytes) => {
                    tracing::debug!(
                        "Downloaded {} ({} bytes, attempt {}/{})",
                        dest.display(),
                        bytes,
                        attempt,
                        max_attempts
                    );
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        max_attempts,
                        locator,
                        e
                    );
                    if let Some(delay) = self.retry.next_delay() {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return Err(Error::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, locator: &str, dest: &Path) -> Result<u64> {
        let mut body = self.fetcher.fetch(locator).await?;
        write_atomic(dest, &mut body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::Ordering;

    use crate::pool::testing::{FlakyFetcher, HangingFetcher, RecordingSink};

    fn executor(
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<RecordingSink>,
        retry_limit: u32,
    ) -> DownloadExecutor {
        DownloadExecutor::new(fetcher, sink, RetryPolicy::new(retry_limit))
    }

    #[tokio::test]
    async fn test_inline_payload_written_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("article.html");
        let fetcher = Arc::new(FlakyFetcher::always_ok(b"unused"));
        let sink = Arc::new(RecordingSink::default());
        let exec = executor(fetcher.clone(), sink.clone(), 2);

        let job = Job::inline(b"<h1>Welcome</h1>".to_vec(), &dest);
        exec.execute(&CancellationToken::new(), &job).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"<h1>Welcome</h1>");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(sink.completed(), vec![(dest, true)]);
    }

    #[tokio::test]
    async fn test_succeeds_on_last_allowed_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.mp4");
        let fetcher = Arc::new(FlakyFetcher::failing_first(2, b"frames"));
        let sink = Arc::new(RecordingSink::default());
        let exec = executor(fetcher.clone(), sink.clone(), 2);

        let job = Job::remote("https://cdn.example.com/video.mp4", &dest);
        exec.execute(&CancellationToken::new(), &job).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        assert_eq!(std::fs::read(&dest).unwrap(), b"frames");
        assert_eq!(sink.completed(), vec![(dest, true)]);
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_last_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.mp4");
        let fetcher = Arc::new(FlakyFetcher::always_failing());
        let sink = Arc::new(RecordingSink::default());
        let exec = executor(fetcher.clone(), sink.clone(), 2);

        let job = Job::remote("https://cdn.example.com/video.mp4", &dest);
        let err = exec
            .execute(&CancellationToken::new(), &job)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TransientFetch { .. }));
        assert!(err.to_string().contains("attempt 3"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        assert!(!dest.exists());
        assert_eq!(sink.completed(), vec![(dest, false)]);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FlakyFetcher::always_failing());
        let sink = Arc::new(RecordingSink::default());
        let exec = executor(fetcher.clone(), sink, 0);

        let job = Job::remote("https://cdn.example.com/a.pdf", dir.path().join("a.pdf"));
        assert!(exec.execute(&CancellationToken::new(), &job).await.is_err());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_write_error_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no-such-dir").join("a.pdf");
        let fetcher = Arc::new(FlakyFetcher::always_ok(b"pdf"));
        let sink = Arc::new(RecordingSink::default());
        let exec = executor(fetcher.clone(), sink, 3);

        let job = Job::remote("https://cdn.example.com/a.pdf", &dest);
        let err = exec
            .execute(&CancellationToken::new(), &job)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FlakyFetcher::always_ok(b"data"));
        let sink = Arc::new(RecordingSink::default());
        let exec = executor(fetcher.clone(), sink.clone(), 2);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let dest = dir.path().join("a.bin");
        let job = Job::remote("https://cdn.example.com/a.bin", &dest);
        let err = exec.execute(&cancel, &job).await.unwrap_err();

        assert!(err.is_cancellation());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(!dest.exists());
        assert_eq!(sink.completed(), vec![(dest, false)]);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_inflight_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(HangingFetcher::default());
        let sink = Arc::new(RecordingSink::default());
        let exec = executor(fetcher.clone(), sink, 5);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let job = Job::remote("https://cdn.example.com/slow.mp4", dir.path().join("slow.mp4"));
        let err = tokio::time::timeout(Duration::from_secs(5), exec.execute(&cancel, &job))
            .await
            .expect("execute should return after cancellation")
            .unwrap_err();

        assert!(err.is_cancellation());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_policy_attempts() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
        assert_eq!(RetryPolicy::new(2).max_attempts(), 3);
        assert_eq!(RetryPolicy::new(u32::MAX).max_attempts(), u32::MAX);
        assert!(RetryPolicy::new(2).next_delay().is_none());

        let delay = RetryPolicy::new(2).with_backoff_ms(50).next_delay().unwrap();
        assert!(delay <= Duration::from_millis(50));
    }
}
