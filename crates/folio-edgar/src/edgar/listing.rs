//! Listing-service fallback.
//!
//! The listing service returns a flat JSON array of file descriptors for an
//! accession:
//!
//! ```json
//! [{"filename": "main.htm", "type": "html", "url": "https://.../main.htm"}]
//! ```
//!
//! It covers filings whose index page cannot be read (very old filings,
//! non-standard index markup) at the cost of carrying no declared types or
//! sizes.

use super::client::{ACCEPT_JSON, Fetch};
use super::index::{SelectionRule, has_html_extension};
use crate::error::{ResolveError, Result};
use crate::filing::{DocumentSource, FilingReference, ResolvedDocument};
use crate::patterns::FilenamePatterns;
use crate::strategy::ResolveStrategy;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One descriptor from the listing service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingEntry {
    /// File name inside the filing folder
    pub filename: String,
    /// Absolute or folder-relative URL; may be empty
    pub url: String,
    /// Loose type label ("html", "pdf", "text/html", ...)
    #[serde(rename = "type")]
    pub kind: String,
}

impl ListingEntry {
    /// Filename, or the last URL segment when the filename is missing.
    pub fn name(&self) -> &str {
        if self.filename.is_empty() {
            self.url
                .rsplit('/')
                .next()
                .unwrap_or_default()
        } else {
            &self.filename
        }
    }

    /// Typed or named as HTML.
    pub fn is_html(&self) -> bool {
        let kind = self.kind.to_ascii_lowercase();
        matches!(kind.as_str(), "html" | "htm" | "text/html") || has_html_extension(self.name())
    }

    /// Typed or named as PDF.
    pub fn is_pdf(&self) -> bool {
        let kind = self.kind.to_ascii_lowercase();
        matches!(kind.as_str(), "pdf" | "application/pdf")
            || self.name().to_ascii_lowercase().ends_with(".pdf")
    }

    /// Name suggests an index or header file rather than a document.
    pub fn looks_like_index(&self) -> bool {
        let name = self.name().to_ascii_lowercase();
        name.contains("index") || name.contains("header")
    }
}

/// Fill a listing URL template.
///
/// Placeholders: `{cik}` (no leading zeros), `{accession}` (no dashes),
/// `{accession_raw}` (as supplied) and `{form}`.
///
/// # Example
/// ```
/// # use folio_edgar::FilingReference;
/// # use folio_edgar::edgar::listing::listing_url;
/// let filing = FilingReference::new("0000320193", "0000320193-23-000106", "10-K");
/// assert_eq!(
///     listing_url("https://list.example/{cik}/{accession}?form={form}", &filing),
///     "https://list.example/320193/000032019323000106?form=10-K"
/// );
/// ```
pub fn listing_url(template: &str, filing: &FilingReference) -> String {
    template
        .replace("{cik}", filing.filer_id())
        .replace("{accession_raw}", filing.raw_accession())
        .replace("{accession}", filing.accession_number())
        .replace("{form}", filing.form_type())
}

/// Pick the primary document among listing descriptors.
///
/// Filename patterns first, then HTML that is not an index/header file, then a
/// native PDF, then the first descriptor.
pub fn select_listing_entry<'a>(
    entries: &'a [ListingEntry],
    form: &str,
    patterns: &FilenamePatterns,
) -> Option<(&'a ListingEntry, SelectionRule)> {
    if let Some(entry) = patterns.first_match(form, entries, ListingEntry::name) {
        return Some((entry, SelectionRule::FilenamePattern));
    }
    if let Some(entry) = entries
        .iter()
        .find(|e| e.is_html() && !e.looks_like_index())
    {
        return Some((entry, SelectionRule::ListedHtml));
    }
    if let Some(entry) = entries.iter().find(|e| e.is_pdf()) {
        return Some((entry, SelectionRule::NativePdf));
    }
    entries.first().map(|e| (e, SelectionRule::FirstEntry))
}

/// Strategy that queries the listing service.
pub struct ListingStrategy {
    fetcher: Arc<dyn Fetch>,
    template: Option<String>,
    archive_root: String,
    patterns: Arc<FilenamePatterns>,
}

impl ListingStrategy {
    /// Create the strategy; without a template every call fails.
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        template: Option<String>,
        archive_root: impl Into<String>,
        patterns: Arc<FilenamePatterns>,
    ) -> Self {
        Self {
            fetcher,
            template,
            archive_root: archive_root.into(),
            patterns,
        }
    }

    /// Fetch and decode the descriptors for `filing`.
    pub async fn fetch_entries(&self, filing: &FilingReference) -> Result<Vec<ListingEntry>> {
        let template = self.template.as_deref().ok_or_else(|| {
            ResolveError::ListingUnavailable("no listing service configured".to_string())
        })?;
        let url = listing_url(template, filing);

        let body = self
            .fetcher
            .get_text(&url, ACCEPT_JSON)
            .await
            .map_err(|e| ResolveError::ListingUnavailable(e.to_string()))?;
        let entries: Vec<ListingEntry> = serde_json::from_str(&body).map_err(|e| {
            ResolveError::ListingUnavailable(format!("undecodable listing from {}: {}", url, e))
        })?;

        if entries.is_empty() {
            return Err(ResolveError::ListingUnavailable(format!(
                "listing for {} is empty",
                filing
            )));
        }
        tracing::debug!(url = %url, entries = entries.len(), "fetched listing");
        Ok(entries)
    }

    fn entry_url(&self, filing: &FilingReference, entry: &ListingEntry) -> String {
        let url = entry.url.trim();
        if url.is_empty() {
            filing.document_url(&self.archive_root, entry.name())
        } else if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            filing.document_url(&self.archive_root, url)
        }
    }
}

#[async_trait]
impl ResolveStrategy for ListingStrategy {
    fn name(&self) -> &'static str {
        "listing"
    }

    async fn resolve(&self, filing: &FilingReference) -> Result<Option<ResolvedDocument>> {
        let entries = self.fetch_entries(filing).await?;
        let (entry, rule) = select_listing_entry(&entries, filing.form_type(), &self.patterns)
            .ok_or_else(|| ResolveError::ListingUnavailable("no listing entries".to_string()))?;

        tracing::debug!(filename = %entry.name(), rule = %rule, "selected listing entry");
        let url = self.entry_url(filing, entry);
        if url.is_empty() {
            return Err(ResolveError::ListingUnavailable(
                "selected listing entry has neither url nor filename".to_string(),
            ));
        }
        Ok(Some(ResolvedDocument::new(url, DocumentSource::Listing)))
    }
}

impl fmt::Debug for ListingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingStrategy")
            .field("template", &self.template)
            .field("archive_root", &self.archive_root)
            .finish_non_exhaustive()
    }
}
