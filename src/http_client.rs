use crate::config::NetworkConfig;
use crate::error::{Result, TestNodError};
use crate::retry::{DEFAULT_ATTEMPTS, DEFAULT_DELAY_MS, RetryPolicy};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds, applied per attempt
    pub timeout_seconds: u64,
    /// Total number of attempts per request
    pub retry_attempts: u32,
    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            retry_attempts: DEFAULT_ATTEMPTS,
            retry_delay_ms: DEFAULT_DELAY_MS,
            user_agent: format!("testnod-uploader/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&NetworkConfig> for HttpClientConfig {
    fn from(network: &NetworkConfig) -> Self {
        Self {
            timeout_seconds: network.timeout_seconds,
            retry_attempts: network.retry_attempts,
            retry_delay_ms: network.retry_delay_ms,
            ..Default::default()
        }
    }
}

/// Async HTTP client shared by the test-run registration and file upload calls
pub struct AsyncHttpClient {
    client: Client,
    config: HttpClientConfig,
    retry_policy: RetryPolicy,
}

impl AsyncHttpClient {
    /// Create a new async HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .build()
            .map_err(TestNodError::from)?;

        let retry_policy = RetryPolicy::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_delay_ms),
        );

        Ok(Self {
            client,
            config,
            retry_policy,
        })
    }

    /// Send a single request, bounded by the configured per-attempt timeout
    pub(crate) async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        debug!(url, "sending request");

        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            request.send(),
        )
        .await
        .map_err(|_| TestNodError::Timeout {
            url: url.to_string(),
            timeout_seconds: self.config.timeout_seconds,
        })?
        .map_err(TestNodError::from)?;

        debug!(url, status = %response.status(), "received response");
        Ok(response)
    }

    /// Get the underlying reqwest client (for advanced usage)
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}
