//! Download job description.

use std::fmt;
use std::path::{Path, PathBuf};

/// Where the bytes of a job come from.
#[derive(Clone, PartialEq, Eq)]
pub enum JobSource {
    /// Fetched from a remote locator (URL).
    Remote(String),
    /// Already in memory, written as-is.
    Inline(Vec<u8>),
}

impl fmt::Debug for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobSource::Remote(url) => f.debug_tuple("Remote").field(url).finish(),
            JobSource::Inline(bytes) => write!(f, "Inline({} bytes)", bytes.len()),
        }
    }
}

/// One unit of download work.
///
/// A job is immutable once created. Exactly one of the source locator or the
/// inline payload is set, which the [`JobSource`] enum enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    source: JobSource,
    destination: PathBuf,
}

impl Job {
    /// Create a job that fetches `locator` into `destination`.
    pub fn remote(locator: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: JobSource::Remote(locator.into()),
            destination: destination.into(),
        }
    }

    /// Create a job that writes `payload` into `destination`.
    pub fn inline(payload: impl Into<Vec<u8>>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: JobSource::Inline(payload.into()),
            destination: destination.into(),
        }
    }

    pub fn source(&self) -> &JobSource {
        &self.source
    }

    /// Remote locator, if this job downloads from the network.
    pub fn source_locator(&self) -> Option<&str> {
        match &self.source {
            JobSource::Remote(url) => Some(url),
            JobSource::Inline(_) => None,
        }
    }

    /// In-memory payload, if this job needs no network access.
    pub fn inline_payload(&self) -> Option<&[u8]> {
        match &self.source {
            JobSource::Remote(_) => None,
            JobSource::Inline(bytes) => Some(bytes),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}
