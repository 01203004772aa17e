//! Configuration loading for the CLI.
//!
//! Built-in defaults, then a JSON file, then command-line flags.

use folio_edgar::{ResolverConfig, Result};
use std::path::{Path, PathBuf};

/// Get the default configuration directory.
///
/// Uses platform-specific config directories:
/// - Linux: `~/.config/folio/`
/// - macOS: `~/Library/Application Support/folio/`
/// - Windows: `%APPDATA%\folio\`
pub(crate) fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio")
}

/// Get the default configuration file path.
pub(crate) fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

/// Settings supplied on the command line.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConfigOverrides {
    /// Explicit configuration file; must exist when given
    pub(crate) config: Option<PathBuf>,
    /// Listing-service URL template
    pub(crate) listing_url: Option<String>,
    /// `User-Agent` header value
    pub(crate) user_agent: Option<String>,
}

/// Build the effective configuration.
pub(crate) fn load_config(overrides: &ConfigOverrides) -> Result<ResolverConfig> {
    let base = match &overrides.config {
        Some(path) => read_file(path)?,
        None => {
            let path = default_config_path();
            if path.is_file() {
                read_file(&path)?
            } else {
                ResolverConfig::default()
            }
        }
    };
    apply_overrides(base, overrides)
}

fn read_file(path: &Path) -> Result<ResolverConfig> {
    tracing::debug!(path = %path.display(), "loading configuration");
    ResolverConfig::from_file(path)
}

fn apply_overrides(mut config: ResolverConfig, overrides: &ConfigOverrides) -> Result<ResolverConfig> {
    if let Some(template) = &overrides.listing_url {
        config = config.with_listing_url(template.as_str());
    }
    if let Some(user_agent) = &overrides.user_agent {
        config = config.with_user_agent(user_agent.as_str());
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_edgar::ResolveError;

    #[test]
    fn test_default_path_under_folio_dir() {
        let path = default_config_path();
        assert!(path.ends_with("folio/config.json"));
    }

    #[test]
    fn test_flags_override_file() {
        let file = ResolverConfig::from_json(
            r#"{"listing_url": "https://a.example/{cik}", "timeout_secs": 5}"#,
        )
        .unwrap();
        let overrides = ConfigOverrides {
            listing_url: Some("https://b.example/{cik}/{accession}".to_string()),
            user_agent: Some("Acme research@acme.example".to_string()),
            ..Default::default()
        };
        let config = apply_overrides(file, &overrides).unwrap();
        assert_eq!(
            config.listing_url.as_deref(),
            Some("https://b.example/{cik}/{accession}")
        );
        assert_eq!(config.user_agent, "Acme research@acme.example");
        assert_eq!(config.timeout_secs, Some(5));
    }

    #[test]
    fn test_blank_user_agent_rejected() {
        let overrides = ConfigOverrides {
            user_agent: Some("  ".to_string()),
            ..Default::default()
        };
        let result = apply_overrides(ResolverConfig::default(), &overrides);
        assert!(matches!(result, Err(ResolveError::Config(_))));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let overrides = ConfigOverrides {
            config: Some(PathBuf::from("/nonexistent/folio/config.json")),
            ..Default::default()
        };
        assert!(matches!(load_config(&overrides), Err(ResolveError::Io(_))));
    }

    #[test]
    fn test_explicit_file_is_read() {
        let path = std::env::temp_dir().join(format!("folio-settings-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"form_paths": {"N-PX": "xslN-PX_X01/primary_doc.xml"}}"#).unwrap();

        let overrides = ConfigOverrides {
            config: Some(path.clone()),
            ..Default::default()
        };
        let config = load_config(&overrides).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            config.form_paths.get("N-PX").map(String::as_str),
            Some("xslN-PX_X01/primary_doc.xml")
        );
    }
}
