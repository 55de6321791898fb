//! Fakes shared by the pool tests.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::pool::fetch::{ByteStream, Fetcher};
use crate::pool::job::Job;
use crate::pool::progress::ProgressSink;

/// Fails the first `failures` calls, then serves `body`.
pub struct FlakyFetcher {
    pub calls: AtomicUsize,
    failures: usize,
    body: Vec<u8>,
}

impl FlakyFetcher {
    pub fn failing_first(failures: usize, body: &[u8]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures,
            body: body.to_vec(),
        }
    }

    pub fn always_ok(body: &[u8]) -> Self {
        Self::failing_first(0, body)
    }

    pub fn always_failing() -> Self {
        Self::failing_first(usize::MAX, b"")
    }
}

#[async_trait]
impl Fetcher for FlakyFetcher {
    async fn fetch(&self, locator: &str) -> Result<ByteStream> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(Error::TransientFetch {
                locator: locator.to_string(),
                message: format!("HTTP 503 on attempt {}", attempt),
            });
        }
        Ok(Box::pin(Cursor::new(self.body.clone())))
    }
}

/// Serves `locator` as the body, failing every locator containing `poison`.
pub struct ScriptedFetcher {
    pub calls: AtomicUsize,
    poison: String,
}

impl ScriptedFetcher {
    pub fn failing_on(poison: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            poison: poison.to_string(),
        }
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, locator: &str) -> Result<ByteStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if locator.contains(&self.poison) {
            return Err(Error::TransientFetch {
                locator: locator.to_string(),
                message: "HTTP 404".to_string(),
            });
        }
        Ok(Box::pin(Cursor::new(locator.as_bytes().to_vec())))
    }
}

/// Never completes a fetch.
#[derive(Default)]
pub struct HangingFetcher {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Fetcher for HangingFetcher {
    async fn fetch(&self, _locator: &str) -> Result<ByteStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        futures::future::pending().await
    }
}

/// Records every completion as `(destination, succeeded)`.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(PathBuf, bool)>>,
}

impl RecordingSink {
    pub fn completed(&self) -> Vec<(PathBuf, bool)> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn on_job_complete(&self, job: &Job, error: Option<&Error>) {
        self.events
            .lock()
            .unwrap()
            .push((job.destination().to_path_buf(), error.is_none()));
    }
}
