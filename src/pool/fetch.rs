//! Network layer used by the download executor.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Client;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

use crate::config::NetworkConfig;
use crate::error::{Error, Result};

/// Readable body of a successful fetch.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Fetch-by-locator capability.
///
/// Returns the response body on success. Transport failures and non-success
/// responses are reported as retryable errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<ByteStream>;
}

/// HTTP(S) fetcher backed by reqwest.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a new fetcher from network settings.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &str) -> Result<ByteStream> {
        let url = url::Url::parse(locator)?;

        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::TransientFetch {
                locator: locator.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::TransientFetch {
                locator: locator.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::pin(StreamReader::new(stream)))
    }
}
