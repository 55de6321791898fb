//! Error types for the course-backup application.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // Course manifest errors
    #[error("Invalid course manifest: {0}")]
    Manifest(String),

    // Download errors
    #[error("Failed to fetch {locator}: {message}")]
    TransientFetch { locator: String, message: String },

    #[error("Stream error: {0}")]
    Stream(std::io::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation cancelled")]
    Cancelled,

    // Pool wiring errors
    #[error("No worker pool bound to this context")]
    NoPoolBound,

    #[error("Worker pool is no longer accepting jobs")]
    PoolClosed,

    #[error("Worker task failed: {0}")]
    Worker(String),

    // File system errors
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Whether another attempt of the same job may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::TransientFetch { .. } | Error::Stream(_) | Error::Http(_)
        )
    }

    /// Whether this error only reports that the run was cancelled.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}
