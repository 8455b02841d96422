//! HTTP client for downloading bi5 archives.

use bytes::Bytes;
use rand::Rng;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Configuration for the download client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum concurrent downloads (sizes the idle connection pool).
    pub concurrency: usize,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for failed requests.
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds).
    pub max_delay_ms: u64,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            concurrency: 4, // The feed blocks aggressive clients
            timeout: Duration::from_secs(60),
            max_retries: 5,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            user_agent: format!("candela/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Errors that can occur during downloads.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error status.
    #[error("Server error: {status}")]
    ServerError {
        /// HTTP status code.
        status: u16,
    },
}

/// HTTP client with connection pooling and retry logic.
#[derive(Debug, Clone)]
pub struct DownloadClient {
    client: Client,
    config: ClientConfig,
}

impl DownloadClient {
    /// Creates a new download client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(ClientConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Downloads a single bi5 file, returning the compressed bytes.
    ///
    /// Returns `Ok(None)` if the file does not exist (404).
    ///
    /// # Errors
    ///
    /// Returns an error for any other non-success status, or if the request
    /// still fails after all retries.
    pub async fn download(&self, url: &str) -> Result<Option<Bytes>, DownloadError> {
        let mut attempts = 0;

        loop {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Ok(None);
                    }

                    // Retry on server errors (5xx) and rate limiting (429)
                    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    {
                        if attempts < self.config.max_retries {
                            attempts += 1;
                            let delay = self.calculate_backoff_delay(attempts);
                            debug!(url, status = status.as_u16(), ?delay, "retrying download");
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(DownloadError::ServerError {
                            status: status.as_u16(),
                        });
                    }

                    if !status.is_success() {
                        return Err(DownloadError::ServerError {
                            status: status.as_u16(),
                        });
                    }
                    return Ok(Some(response.bytes().await?));
                }
                Err(e) if Self::is_retryable_error(&e) && attempts < self.config.max_retries => {
                    attempts += 1;
                    let delay = self.calculate_backoff_delay(attempts);
                    debug!(url, error = %e, ?delay, "retrying download");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Calculates the backoff delay with exponential backoff and jitter.
    fn calculate_backoff_delay(&self, attempt: u32) -> Duration {
        // Exponential backoff: base_delay * 2^attempt
        let exp_delay = self
            .config
            .base_delay_ms
            .saturating_mul(1u64 << attempt.min(10));

        let capped_delay = exp_delay.min(self.config.max_delay_ms);

        // Add jitter (±25%)
        let jitter_range = capped_delay / 4;
        let jitter = if jitter_range > 0 {
            rand::rng().random_range(0..=jitter_range * 2) as i64 - jitter_range as i64
        } else {
            0
        };

        let final_delay = (capped_delay as i64 + jitter).max(100) as u64;
        Duration::from_millis(final_delay)
    }

    /// Determines if an error is retryable.
    fn is_retryable_error(error: &reqwest::Error) -> bool {
        if error.is_builder() {
            return false;
        }
        error.is_timeout() || error.is_connect() || error.is_request()
    }
}
