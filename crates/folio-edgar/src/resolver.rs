//! The primary-document resolver.
//!
//! Resolution walks an ordered chain of strategies and stops at the first one
//! that produces a document:
//!
//! 1. [`DeterministicStrategy`]: fixed path for structured forms, no network
//! 2. [`IndexStrategy`]: parse the filing index page and rank its rows
//! 3. [`ListingStrategy`]: ask the listing service
//!
//! Failures before the last strategy are logged as warnings and swallowed;
//! the last strategy's failure is returned to the caller. Nothing is retried
//! and nothing is cached, so resolving the same filing twice against an
//! unchanged upstream yields the same URL.

use crate::config::ResolverConfig;
use crate::edgar::client::{EdgarClient, Fetch};
use crate::edgar::index::IndexStrategy;
use crate::edgar::listing::ListingStrategy;
use crate::error::{ResolveError, Result};
use crate::filing::{FilingReference, ResolvedDocument};
use crate::forms::FormMap;
use crate::patterns::FilenamePatterns;
use crate::strategy::{DeterministicStrategy, ResolveStrategy};
use std::sync::Arc;

/// Resolves a filing to the URL of its primary document.
///
/// # Example
/// ```no_run
/// use folio_edgar::{PrimaryDocumentResolver, ResolverConfig};
///
/// # async fn example() -> folio_edgar::Result<()> {
/// let resolver = PrimaryDocumentResolver::from_config(&ResolverConfig::default())?;
/// let doc = resolver
///     .resolve("0000320193", "0000320193-23-000106", "10-K")
///     .await?;
/// println!("{} (via {})", doc.url, doc.source);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PrimaryDocumentResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl PrimaryDocumentResolver {
    /// Build the standard chain over `fetcher`.
    pub fn new(config: &ResolverConfig, fetcher: Arc<dyn Fetch>) -> Result<Self> {
        config.validate()?;

        let mut forms = FormMap::with_defaults();
        forms.extend(&config.form_paths);
        let patterns = Arc::new(FilenamePatterns::from_map(&config.filename_patterns)?);

        Ok(Self::with_strategies(vec![
            Box::new(DeterministicStrategy::new(&config.archive_root, forms)),
            Box::new(IndexStrategy::new(
                Arc::clone(&fetcher),
                &config.archive_root,
                Arc::clone(&patterns),
            )),
            Box::new(ListingStrategy::new(
                fetcher,
                config.listing_url.clone(),
                &config.archive_root,
                patterns,
            )),
        ]))
    }

    /// Build the standard chain over a live [`EdgarClient`].
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let client = EdgarClient::with_config(config)?;
        Self::new(config, Arc::new(client))
    }

    /// Use a custom chain, evaluated in order.
    pub fn with_strategies(strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { strategies }
    }

    /// Strategy names in evaluation order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve from raw identifiers; they are normalized first.
    pub async fn resolve(
        &self,
        filer_id: &str,
        accession_number: &str,
        form_type: &str,
    ) -> Result<ResolvedDocument> {
        let filing = FilingReference::new(filer_id, accession_number, form_type);
        self.resolve_filing(&filing).await
    }

    /// Resolve an already-built reference.
    ///
    /// The terminal error keeps the variant of the last failure; failures of
    /// earlier strategies are appended to its message.
    pub async fn resolve_filing(&self, filing: &FilingReference) -> Result<ResolvedDocument> {
        let mut last_error: Option<(&'static str, ResolveError)> = None;
        let mut earlier = Vec::new();
        let last = self.strategies.len().saturating_sub(1);

        for (position, strategy) in self.strategies.iter().enumerate() {
            match strategy.resolve(filing).await {
                Ok(Some(doc)) => {
                    tracing::info!(
                        filing = %filing,
                        strategy = strategy.name(),
                        url = %doc.url,
                        "resolved primary document"
                    );
                    return Ok(doc);
                }
                Ok(None) => {
                    tracing::debug!(filing = %filing, strategy = strategy.name(), "not applicable");
                }
                Err(e) => {
                    if position < last {
                        if e.is_recoverable() {
                            tracing::warn!(
                                filing = %filing,
                                strategy = strategy.name(),
                                error = %e,
                                "strategy failed, falling back"
                            );
                        } else {
                            tracing::error!(
                                filing = %filing,
                                strategy = strategy.name(),
                                error = %e,
                                "strategy failed unexpectedly, falling back"
                            );
                        }
                    }
                    if let Some((name, previous)) = last_error.replace((strategy.name(), e)) {
                        earlier.push(format!("{}: {}", name, previous));
                    }
                }
            }
        }

        match last_error {
            Some((_, e)) => Err(e.with_prior_failures(&earlier)),
            None => Err(ResolveError::NoCandidateFound(format!(
                "no strategy resolved {}",
                filing
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::memory::MemoryFetcher;
    use crate::filing::DocumentSource;

    fn resolver(fetcher: MemoryFetcher) -> (PrimaryDocumentResolver, Arc<MemoryFetcher>) {
        let fetcher = Arc::new(fetcher);
        let config = ResolverConfig::default();
        let resolver = PrimaryDocumentResolver::new(&config, fetcher.clone()).unwrap();
        (resolver, fetcher)
    }

    #[test]
    fn test_standard_chain_order() {
        let (resolver, _) = resolver(MemoryFetcher::new());
        assert_eq!(resolver.strategy_names(), vec!["deterministic", "index", "listing"]);
    }

    #[tokio::test]
    async fn test_deterministic_form_skips_network() {
        let (resolver, fetcher) = resolver(MemoryFetcher::new());
        let doc = resolver
            .resolve("0001683168", "0001683168-25-008885", "4")
            .await
            .unwrap();
        assert_eq!(doc.source, DocumentSource::Deterministic);
        assert!(doc.url.ends_with("/1683168/000168316825008885/xslF345X05/ownership.xml"));
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_listing_error() {
        let (resolver, fetcher) = resolver(MemoryFetcher::new());
        let err = resolver
            .resolve("320193", "0000320193-23-000106", "10-K")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ListingUnavailable(_)));
        assert_eq!(fetcher.request_count(), 2);

        // The index failure that preceded it is still visible.
        let message = err.to_string();
        assert!(message.starts_with("Listing service unavailable: "));
        assert!(message.contains("index: Network failure for "));
        assert!(message.contains("-index.html: HTTP 404 Not Found"));
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let resolver = PrimaryDocumentResolver::with_strategies(Vec::new());
        let err = resolver.resolve("1", "2", "10-K").await.unwrap_err();
        assert!(matches!(err, ResolveError::NoCandidateFound(_)));
    }

    #[test]
    fn test_invalid_configured_pattern_fails_construction() {
        let mut config = ResolverConfig::default();
        config
            .filename_patterns
            .insert("10-K".to_string(), vec!["[".to_string()]);
        let result = PrimaryDocumentResolver::new(&config, Arc::new(MemoryFetcher::new()));
        assert!(matches!(result, Err(ResolveError::InvalidPattern { .. })));
    }
}
