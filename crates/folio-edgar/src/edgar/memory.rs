//! In-memory [`Fetch`] implementation.
//!
//! Serves canned bodies keyed by exact URL and records every request, which
//! makes it suitable for offline fixtures and for asserting which URLs a
//! resolution touched.

use super::client::Fetch;
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Fetcher answering from a fixed URL -> body table.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    /// A fetcher with no responses; every request fails with HTTP 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with_response(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Number of requests made so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|log| log.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Fetch for MemoryFetcher {
    async fn get_text(&self, url: &str, _accept: &str) -> Result<String> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(url.to_string());
        }
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| ResolveError::network(url, "HTTP 404 Not Found"))
    }
}
