//! Error types for primary-document resolution.

use thiserror::Error;

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors that can occur while resolving a filing's primary document.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A fetch did not return a success status or never completed
    #[error("Network failure for {url}: {reason}")]
    NetworkFailure {
        /// URL that was requested
        url: String,
        /// Status line or transport error
        reason: String,
    },

    /// Expected table or rows were absent from the index markup
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    /// Rows existed but no document could be selected
    #[error("No candidate document found: {0}")]
    NoCandidateFound(String),

    /// The listing-service fallback failed
    #[error("Listing service unavailable: {0}")]
    ListingUnavailable(String),

    /// A configured filename pattern is not a valid regular expression
    #[error("Invalid filename pattern {pattern:?} for form {form}: {source}")]
    InvalidPattern {
        /// Form type the pattern was registered for
        form: String,
        /// The offending pattern text
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    /// Build a [`ResolveError::NetworkFailure`] for `url`.
    pub fn network(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::NetworkFailure {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Append `prior` failures to the message, keeping the variant.
    pub fn with_prior_failures(self, prior: &[String]) -> Self {
        if prior.is_empty() {
            return self;
        }
        let note = format!(" (after {})", prior.join("; "));
        match self {
            Self::NetworkFailure { url, reason } => Self::NetworkFailure {
                url,
                reason: reason + &note,
            },
            Self::ParseFailure(message) => Self::ParseFailure(message + &note),
            Self::NoCandidateFound(message) => Self::NoCandidateFound(message + &note),
            Self::ListingUnavailable(message) => Self::ListingUnavailable(message + &note),
            Self::Config(message) => Self::Config(message + &note),
            other => other,
        }
    }

    /// Returns true for failures a strategy chain recovers from by moving on.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NetworkFailure { .. } | Self::ParseFailure(_) | Self::NoCandidateFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_message() {
        let err = ResolveError::network("https://example.com/a", "HTTP 404 Not Found");
        assert_eq!(
            err.to_string(),
            "Network failure for https://example.com/a: HTTP 404 Not Found"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_prior_failures_appended() {
        let err = ResolveError::ListingUnavailable("no listing service configured".to_string())
            .with_prior_failures(&["index: Parse failure: no table in index page".to_string()]);
        assert!(matches!(err, ResolveError::ListingUnavailable(_)));
        assert_eq!(
            err.to_string(),
            "Listing service unavailable: no listing service configured \
             (after index: Parse failure: no table in index page)"
        );

        let untouched = ResolveError::ParseFailure("x".to_string()).with_prior_failures(&[]);
        assert_eq!(untouched.to_string(), "Parse failure: x");
    }

    #[test]
    fn test_listing_unavailable_is_terminal() {
        let err = ResolveError::ListingUnavailable("empty listing".to_string());
        assert!(!err.is_recoverable());
    }
}
