//! Bounded worker pool.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::pool::context::{BackupContext, PoolShared};
use crate::pool::executor::{DownloadExecutor, RetryPolicy};
use crate::pool::fetch::{Fetcher, HttpFetcher};
use crate::pool::job::Job;
use crate::pool::progress::{NoProgress, ProgressSink};

/// Fixed set of workers fed by a job intake channel.
///
/// A pool serves a single run: [`WorkerPool::run`] consumes it.
pub struct WorkerPool {
    worker_count: usize,
    retry: RetryPolicy,
    intake_capacity: usize,
    fetcher: Option<Arc<dyn Fetcher>>,
    progress: Arc<dyn ProgressSink>,
    shared: Arc<PoolShared>,
    intake: mpsc::Receiver<Job>,
}

impl WorkerPool {
    /// Create an idle pool with `worker_count` workers and `retry_limit`
    /// extra attempts per failed download.
    pub fn new(worker_count: usize, retry_limit: u32) -> Result<Self> {
        if worker_count == 0 {
            return Err(Error::ConfigValidation {
                field: "concurrency".to_string(),
                message: "Worker pool needs at least one worker".to_string(),
            });
        }

        let (tx, rx) = intake_channel(0);

        Ok(Self {
            worker_count,
            retry: RetryPolicy::new(retry_limit),
            intake_capacity: 0,
            fetcher: None,
            progress: Arc::new(NoProgress),
            shared: Arc::new(PoolShared::new(tx)),
            intake: rx,
        })
    }

    /// Number of jobs the intake buffers before submissions block.
    ///
    /// A capacity of 0 hands jobs over one at a time: a submission waits
    /// until the previously submitted job has been taken by a worker.
    pub fn with_intake_capacity(mut self, capacity: usize) -> Self {
        let (tx, rx) = intake_channel(capacity);
        self.shared.replace_intake(tx);
        self.intake = rx;
        self.intake_capacity = capacity;
        self
    }

    /// Jittered delay bound between retries, in milliseconds.
    pub fn with_retry_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.retry = self.retry.with_backoff_ms(backoff_ms);
        self
    }

    /// Use `fetcher` instead of the default HTTP client.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn intake_capacity(&self) -> usize {
        self.intake_capacity
    }

    pub(crate) fn shared(&self) -> &Arc<PoolShared> {
        &self.shared
    }

    /// Process submitted jobs until the producer is done and the intake is
    /// drained, or until the run is cancelled.
    ///
    /// `ctx` must be bound to this pool. Returns the first error any job
    /// ended with; later errors are only logged. A run cancelled from the
    /// outside without any job failing returns [`Error::Cancelled`].
    pub async fn run(self, ctx: &BackupContext) -> Result<()> {
        if !ctx.is_bound_to(&self.shared) {
            return Err(Error::NoPoolBound);
        }

        let cancel = ctx.cancellation_token().clone();
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(&NetworkConfig::default())?),
        };
        let executor = Arc::new(DownloadExecutor::new(fetcher, self.progress, self.retry));

        self.shared.status().mark_started();
        tracing::info!(
            "Starting worker pool: {} workers, {} retries",
            self.worker_count,
            self.retry.retry_limit
        );

        let intake = Arc::new(Mutex::new(self.intake));
        let (results_tx, mut results_rx) = mpsc::channel::<Error>(self.worker_count);

        let mut workers = JoinSet::new();
        for id in 0..self.worker_count {
            workers.spawn(worker_loop(
                id,
                intake.clone(),
                executor.clone(),
                cancel.clone(),
                results_tx.clone(),
            ));
        }
        drop(results_tx);

        // Closes once every worker has exited.
        let mut first_error: Option<Error> = None;
        while let Some(err) = results_rx.recv().await {
            if first_error.is_none() {
                if !err.is_cancellation() {
                    tracing::error!("Job failed, cancelling remaining work: {}", err);
                }
                cancel.cancel();
                first_error = Some(err);
            } else {
                tracing::debug!("Discarding error after first failure: {}", err);
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
                if first_error.is_none() {
                    cancel.cancel();
                    first_error = Some(Error::Worker(e.to_string()));
                }
            }
        }

        self.shared.status().mark_terminated();

        match first_error {
            Some(err) => Err(err),
            None if cancel.is_cancelled() => {
                tracing::info!("Worker pool cancelled");
                Err(Error::Cancelled)
            }
            None => {
                tracing::info!("Worker pool finished");
                Ok(())
            }
        }
    }
}

/// Smallest tokio channel is 1, which already gives hand-over semantics for 0.
fn intake_channel(capacity: usize) -> (mpsc::Sender<Job>, mpsc::Receiver<Job>) {
    mpsc::channel(capacity.max(1))
}

async fn worker_loop(
    id: usize,
    intake: Arc<Mutex<mpsc::Receiver<Job>>>,
    executor: Arc<DownloadExecutor>,
    cancel: CancellationToken,
    results: mpsc::Sender<Error>,
) {
    tracing::debug!("Worker {} started", id);

    loop {
        let job = {
            let mut rx = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                rx = intake.lock() => rx,
            };
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                job = rx.recv() => job,
            }
        };

        let Some(job) = job else {
            break;
        };

        if let Err(e) = executor.execute(&cancel, &job).await {
            if results.send(e).await.is_err() {
                break;
            }
        }
    }

    tracing::debug!("Worker {} exiting", id);
}
