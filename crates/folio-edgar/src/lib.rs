#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/folio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod edgar;
pub mod error;
pub mod filing;
pub mod forms;
pub mod html;
pub mod patterns;
pub mod resolver;
pub mod strategy;

pub use config::ResolverConfig;
pub use edgar::{EdgarClient, Fetch, MemoryFetcher};
pub use error::{ResolveError, Result};
pub use filing::{DocumentSource, FilingReference, ResolvedDocument};
pub use forms::FormMap;
pub use patterns::FilenamePatterns;
pub use resolver::PrimaryDocumentResolver;
pub use strategy::{DeterministicStrategy, ResolveStrategy};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
