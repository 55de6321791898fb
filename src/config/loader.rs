//! Configuration structures and loading logic.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound of the default worker count.
const MAX_DEFAULT_CONCURRENCY: usize = 8;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub options: OptionsConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Backup options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Base directory for backups.
    #[serde(default)]
    pub download_directory: Option<PathBuf>,

    /// Number of parallel downloads.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Extra attempts for a failed download.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Upper bound of the random delay before a retry, in milliseconds.
    #[serde(default)]
    pub retry_backoff_ms: u64,

    /// Jobs buffered ahead of the workers.
    #[serde(default)]
    pub intake_capacity: usize,

    /// Download files again even if they already exist.
    #[serde(default)]
    pub redownload: bool,

    /// Whether to download subtitle files.
    #[serde(default)]
    pub download_subtitles: bool,

    /// Only download videos of this resolution (e.g. 720).
    #[serde(default)]
    pub preferred_resolution: Option<u32>,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            download_directory: None,
            concurrency: default_concurrency(),
            retry_count: default_retry_count(),
            retry_backoff_ms: 0,
            intake_capacity: 0,
            redownload: false,
            download_subtitles: false,
            preferred_resolution: None,
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Seconds to wait for a connection to be established.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_CONCURRENCY)
}

fn default_retry_count() -> u32 {
    2
}

fn default_user_agent() -> String {
    concat!("course-backup/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the effective download directory.
    pub fn download_directory(&self) -> PathBuf {
        self.options
            .download_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}
