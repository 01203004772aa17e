//! Resolution strategies.
//!
//! A strategy answers one of three ways for a filing: a resolved document,
//! "not applicable" (`Ok(None)`, the chain moves on silently) or an error (the
//! chain logs it and moves on, unless it was the last strategy).

use crate::error::Result;
use crate::filing::{DocumentSource, FilingReference, ResolvedDocument};
use crate::forms::FormMap;
use async_trait::async_trait;

/// One step in the resolution chain.
#[async_trait]
pub trait ResolveStrategy: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Try to resolve `filing`.
    async fn resolve(&self, filing: &FilingReference) -> Result<Option<ResolvedDocument>>;
}

/// Fixed paths for structured forms; never touches the network.
#[derive(Debug, Clone)]
pub struct DeterministicStrategy {
    archive_root: String,
    forms: FormMap,
}

impl DeterministicStrategy {
    /// Create the strategy over `forms`.
    pub fn new(archive_root: impl Into<String>, forms: FormMap) -> Self {
        Self {
            archive_root: archive_root.into(),
            forms,
        }
    }

    /// Synchronous lookup behind [`ResolveStrategy::resolve`].
    pub fn lookup(&self, filing: &FilingReference) -> Option<ResolvedDocument> {
        self.forms.path_for(filing.form_type()).map(|path| {
            ResolvedDocument::new(
                filing.document_url(&self.archive_root, path),
                DocumentSource::Deterministic,
            )
        })
    }

    /// The form map in use.
    pub const fn forms(&self) -> &FormMap {
        &self.forms
    }
}

#[async_trait]
impl ResolveStrategy for DeterministicStrategy {
    fn name(&self) -> &'static str {
        "deterministic"
    }

    async fn resolve(&self, filing: &FilingReference) -> Result<Option<ResolvedDocument>> {
        Ok(self.lookup(filing))
    }
}
