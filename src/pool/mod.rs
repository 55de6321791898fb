//! Concurrent download engine.
//!
//! This module provides:
//! - Job descriptions
//! - Atomic file writes
//! - The fetch abstraction and its HTTP implementation
//! - The per-job executor with retries
//! - The worker pool and its submission context
//!
//! A run looks like this: bind a [`BackupContext`] to a [`WorkerPool`],
//! hand the context to one producer task that submits jobs and finally calls
//! [`BackupContext::mark_producer_done`], and await [`WorkerPool::run`].
//! The first failed job cancels the context, which rejects further
//! submissions and stops the workers.

pub mod context;
pub mod executor;
pub mod fetch;
pub mod job;
pub mod progress;
pub mod worker;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{BackupContext, PoolState};
pub use executor::{DownloadExecutor, RetryPolicy};
pub use fetch::{ByteStream, Fetcher, HttpFetcher};
pub use job::{Job, JobSource};
pub use progress::{NoProgress, ProgressSink};
pub use worker::WorkerPool;
pub use writer::{write_atomic, write_bytes_atomic};
