//! Resolver configuration.
//!
//! Everything the resolver needs from its environment is passed in here at
//! construction time: endpoints, the client identification header, and the
//! two curated tables (deterministic form paths and filename patterns).
//!
//! Configuration files are JSON; every field is optional:
//!
//! ```json
//! {
//!   "archive_root": "https://www.sec.gov/Archives/edgar/data",
//!   "user_agent": "Acme Research research@acme.example",
//!   "listing_url": "https://listing.example/{cik}/{accession}",
//!   "timeout_secs": 60,
//!   "min_request_interval_ms": 100,
//!   "form_paths": { "N-PX": "xslN-PX_X01/primary_doc.xml" },
//!   "filename_patterns": { "10-K": ["(?i)acme-?10k"] }
//! }
//! ```

use crate::error::{ResolveError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// SEC EDGAR archive root
pub const DEFAULT_ARCHIVE_ROOT: &str = "https://www.sec.gov/Archives/edgar/data";

/// User agent for SEC EDGAR requests (SEC requires identifying information)
pub const DEFAULT_USER_AGENT: &str = "Folio-FilingResolver/0.1 (contact@example.com)";

/// Default spacing between requests: 10 requests per second (SEC requirement)
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 100;

/// Environment variable overriding [`DEFAULT_USER_AGENT`]
pub const USER_AGENT_ENV: &str = "SEC_EDGAR_USER_AGENT";

/// Configuration for [`crate::PrimaryDocumentResolver`] and [`crate::EdgarClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Root under which filing folders live
    pub archive_root: String,
    /// Value of the `User-Agent` header
    pub user_agent: String,
    /// Listing-service URL template (`{cik}`, `{accession}`, `{accession_raw}`, `{form}`)
    pub listing_url: Option<String>,
    /// Per-request timeout; `None` leaves the bound to the caller
    pub timeout_secs: Option<u64>,
    /// Minimum spacing between requests of one client, in milliseconds
    pub min_request_interval_ms: u64,
    /// Extra or overriding deterministic form paths
    pub form_paths: BTreeMap<String, String>,
    /// Filename patterns per form, tried in order; none are built in
    pub filename_patterns: BTreeMap<String, Vec<String>>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            archive_root: DEFAULT_ARCHIVE_ROOT.to_string(),
            user_agent: std::env::var(USER_AGENT_ENV)
                .ok()
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            listing_url: None,
            timeout_secs: None,
            min_request_interval_ms: DEFAULT_REQUEST_INTERVAL_MS,
            form_paths: BTreeMap::new(),
            filename_patterns: BTreeMap::new(),
        }
    }
}

impl ResolverConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Set the listing-service URL template.
    pub fn with_listing_url(mut self, template: impl Into<String>) -> Self {
        self.listing_url = Some(template.into());
        self
    }

    /// Set the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the archive root.
    pub fn with_archive_root(mut self, root: impl Into<String>) -> Self {
        self.archive_root = root.into();
        self
    }

    /// Per-request timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Minimum spacing between requests.
    pub const fn request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.archive_root.trim().is_empty() {
            return Err(ResolveError::Config("archive_root is empty".to_string()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ResolveError::Config(
                "user_agent is empty; SEC requires an identifying User-Agent".to_string(),
            ));
        }
        if let Some(template) = &self.listing_url
            && template.trim().is_empty()
        {
            return Err(ResolveError::Config("listing_url is empty".to_string()));
        }
        if self.timeout_secs == Some(0) {
            return Err(ResolveError::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}
