//! HTTP access to SEC EDGAR and the listing service.

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// `Accept` header for index pages and filed documents
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// `Accept` header for the listing service
pub const ACCEPT_JSON: &str = "application/json";

/// Source of remote text.
///
/// Any status other than success must surface as
/// [`ResolveError::NetworkFailure`] so strategies can tell "not there" from
/// "there but unusable".
#[async_trait]
pub trait Fetch: Send + Sync + std::fmt::Debug {
    /// GET `url` with the given `Accept` header and return the body as text.
    async fn get_text(&self, url: &str, accept: &str) -> Result<String>;
}

/// Spaces requests at least `min_interval` apart.
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            last_request: now.checked_sub(min_interval).unwrap_or(now),
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// SEC EDGAR HTTP client with rate limiting.
///
/// Every request carries the configured `User-Agent`; EDGAR rejects anonymous
/// clients. Requests through one client (and its clones) are spaced by the
/// configured interval, 100ms by default to stay under SEC's 10 requests per
/// second. No timeout is set unless the configuration asks for one.
#[derive(Clone)]
pub struct EdgarClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    user_agent: String,
}

impl EdgarClient {
    /// Create a client with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(&ResolverConfig::default())
    }

    /// Create a client with the default configuration and a custom rate limit.
    pub fn with_rate_limit(min_interval: Duration) -> Result<Self> {
        let config = ResolverConfig {
            min_request_interval_ms: u64::try_from(min_interval.as_millis()).unwrap_or(u64::MAX),
            ..ResolverConfig::default()
        };
        Self::with_config(&config)
    }

    /// Create a client from `config` (user agent, rate limit and optional timeout).
    ///
    /// # Example
    /// ```no_run
    /// use folio_edgar::{EdgarClient, ResolverConfig};
    ///
    /// # fn example() -> folio_edgar::Result<()> {
    /// let config = ResolverConfig::default().with_user_agent("Acme Research research@acme.example");
    /// let client = EdgarClient::with_config(&config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_config(config: &ResolverConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(config.request_interval()))),
            user_agent: config.user_agent.clone(),
        })
    }

    /// Configured `User-Agent`.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Minimum spacing between requests.
    pub async fn rate_limit(&self) -> Duration {
        self.rate_limiter.lock().await.min_interval
    }

    async fn send(&self, url: &str, accept: &str) -> Result<reqwest::Response> {
        self.rate_limiter.lock().await.wait().await;
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| ResolveError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::network(url, format!("HTTP {}", status)));
        }
        Ok(response)
    }

    /// Download a document as raw bytes.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(url, "*/*").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ResolveError::network(url, format!("failed to read body: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Fetch for EdgarClient {
    async fn get_text(&self, url: &str, accept: &str) -> Result<String> {
        let response = self.send(url, accept).await?;
        response
            .text()
            .await
            .map_err(|e| ResolveError::network(url, format!("failed to read body: {}", e)))
    }
}

impl std::fmt::Debug for EdgarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgarClient")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}
