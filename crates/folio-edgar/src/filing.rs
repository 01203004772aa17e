//! Filing identifiers and the resolved output.
//!
//! EDGAR archive folders are keyed by the filer's CIK without zero padding and
//! by the accession number without dashes:
//! `https://www.sec.gov/Archives/edgar/data/1683168/000168316825008885/`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strip leading zeros from a CIK.
///
/// A CIK made only of zeros collapses to `"0"`.
///
/// # Example
/// ```
/// # use folio_edgar::filing::normalize_filer_id;
/// assert_eq!(normalize_filer_id("0001683168"), "1683168");
/// ```
pub fn normalize_filer_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed.trim_start_matches('0');
    if stripped.is_empty() && !trimmed.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// Remove every dash from an accession number.
///
/// # Example
/// ```
/// # use folio_edgar::filing::normalize_accession;
/// assert_eq!(normalize_accession("0001683168-25-008885"), "000168316825008885");
/// ```
pub fn normalize_accession(raw: &str) -> String {
    raw.trim().replace('-', "")
}

/// Canonical form-type key: trimmed and upper-cased.
pub fn normalize_form_type(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// A filing to resolve, with identifiers already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilingReference {
    filer_id: String,
    accession_number: String,
    raw_accession: String,
    form_type: String,
}

impl FilingReference {
    /// Build a reference from caller-supplied identifiers.
    ///
    /// No validation happens beyond normalization; a malformed CIK simply
    /// produces a URL that fails downstream.
    pub fn new(filer_id: &str, accession_number: &str, form_type: &str) -> Self {
        Self {
            filer_id: normalize_filer_id(filer_id),
            accession_number: normalize_accession(accession_number),
            raw_accession: accession_number.trim().to_string(),
            form_type: normalize_form_type(form_type),
        }
    }

    /// CIK without leading zeros.
    pub fn filer_id(&self) -> &str {
        &self.filer_id
    }

    /// Accession number without dashes.
    pub fn accession_number(&self) -> &str {
        &self.accession_number
    }

    /// Accession number exactly as the caller supplied it (trimmed).
    pub fn raw_accession(&self) -> &str {
        &self.raw_accession
    }

    /// Upper-cased form type.
    pub fn form_type(&self) -> &str {
        &self.form_type
    }

    /// Folder URL under `archive_root`, always ending in `/`.
    ///
    /// # Example
    /// ```
    /// # use folio_edgar::FilingReference;
    /// let filing = FilingReference::new("0001683168", "0001683168-25-008885", "10-K");
    /// assert_eq!(
    ///     filing.folder_url("https://www.sec.gov/Archives/edgar/data"),
    ///     "https://www.sec.gov/Archives/edgar/data/1683168/000168316825008885/"
    /// );
    /// ```
    pub fn folder_url(&self, archive_root: &str) -> String {
        format!(
            "{}/{}/{}/",
            archive_root.trim_end_matches('/'),
            self.filer_id,
            self.accession_number
        )
    }

    /// URL of a file inside the filing folder.
    pub fn document_url(&self, archive_root: &str, relative_path: &str) -> String {
        format!(
            "{}{}",
            self.folder_url(archive_root),
            relative_path.trim_start_matches('/')
        )
    }
}

impl fmt::Display for FilingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CIK {} accession {} form {}",
            self.filer_id, self.accession_number, self.form_type
        )
    }
}

/// Which resolution strategy produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    /// Fixed path from the deterministic form map
    Deterministic,
    /// Selected from the filing's index page
    Index,
    /// Selected from the listing service
    Listing,
}

impl DocumentSource {
    /// Short lowercase label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deterministic => "deterministic",
            Self::Index => "index",
            Self::Listing => "listing",
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolved primary document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDocument {
    /// Absolute URL of the document
    pub url: String,
    /// Strategy that selected it
    pub source: DocumentSource,
}

impl ResolvedDocument {
    /// Create a resolved document.
    pub fn new(url: impl Into<String>, source: DocumentSource) -> Self {
        Self {
            url: url.into(),
            source,
        }
    }
}
