//! Configuration validation logic.

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Maximum number of parallel downloads.
const MAX_CONCURRENCY: usize = 64;

/// Maximum number of extra attempts per download.
const MAX_RETRY_COUNT: u32 = 20;

/// Resolutions offered by course video players.
const KNOWN_RESOLUTIONS: [u32; 7] = [144, 240, 360, 480, 720, 1080, 2160];

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_concurrency(config.options.concurrency)?;
    validate_retry_count(config.options.retry_count)?;
    validate_resolution(config.options.preferred_resolution)?;
    validate_user_agent(&config.network.user_agent)?;

    if config.network.connect_timeout_secs == 0 {
        return Err(Error::ConfigValidation {
            field: "connect_timeout_secs".to_string(),
            message: "Connect timeout must be at least one second".to_string(),
        });
    }

    Ok(())
}

/// Validate the number of parallel downloads.
pub fn validate_concurrency(concurrency: usize) -> Result<()> {
    if concurrency == 0 {
        return Err(Error::ConfigValidation {
            field: "concurrency".to_string(),
            message: "At least one worker is required".to_string(),
        });
    }

    if concurrency > MAX_CONCURRENCY {
        return Err(Error::ConfigValidation {
            field: "concurrency".to_string(),
            message: format!(
                "Concurrency must be at most {} (got {})",
                MAX_CONCURRENCY, concurrency
            ),
        });
    }

    Ok(())
}

/// Validate the retry count.
pub fn validate_retry_count(retry_count: u32) -> Result<()> {
    if retry_count > MAX_RETRY_COUNT {
        return Err(Error::ConfigValidation {
            field: "retry_count".to_string(),
            message: format!(
                "Retry count must be at most {} (got {})",
                MAX_RETRY_COUNT, retry_count
            ),
        });
    }

    Ok(())
}

/// Validate the preferred video resolution.
pub fn validate_resolution(resolution: Option<u32>) -> Result<()> {
    match resolution {
        Some(r) if !KNOWN_RESOLUTIONS.contains(&r) => Err(Error::ConfigValidation {
            field: "preferred_resolution".to_string(),
            message: format!(
                "Unsupported resolution {}. Expected one of {:?}",
                r, KNOWN_RESOLUTIONS
            ),
        }),
        _ => Ok(()),
    }
}

/// Validate the user agent string.
pub fn validate_user_agent(user_agent: &str) -> Result<()> {
    if user_agent.trim().is_empty() {
        return Err(Error::MissingConfig("user_agent".to_string()));
    }

    Ok(())
}
