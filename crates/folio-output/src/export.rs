//! Export of extracted tables and resolution results.
//!
//! This module provides CSV and JSON export for the data the CLI produces:
//! tables pulled out of a filing's primary document, and batch resolution
//! results.

use crate::tables::ExtractedTable;
use folio_edgar::ResolvedDocument;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output was not valid UTF-8.
    #[error("Invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" | "prettyjson" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Outcome of resolving one filing in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    /// Filer CIK as supplied.
    pub cik: String,

    /// Accession number as supplied.
    pub accession: String,

    /// Form type as supplied.
    pub form: String,

    /// Resolved URL; empty on failure.
    pub url: String,

    /// Strategy that resolved the filing; empty on failure.
    pub strategy: String,

    /// Error message; empty on success.
    pub error: String,
}

impl ResolutionRecord {
    /// Record a successful resolution.
    pub fn resolved(cik: &str, accession: &str, form: &str, doc: &ResolvedDocument) -> Self {
        Self {
            cik: cik.to_string(),
            accession: accession.to_string(),
            form: form.to_string(),
            url: doc.url.clone(),
            strategy: doc.source.to_string(),
            error: String::new(),
        }
    }

    /// Record a failed resolution.
    pub fn failed(cik: &str, accession: &str, form: &str, error: impl std::fmt::Display) -> Self {
        Self {
            cik: cik.to_string(),
            accession: accession.to_string(),
            form: form.to_string(),
            error: error.to_string(),
            ..Self::default()
        }
    }

    /// Whether the filing resolved.
    pub fn is_resolved(&self) -> bool {
        self.error.is_empty() && !self.url.is_empty()
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

impl Exporter for ExtractedTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::WriterBuilder::new()
                    .flexible(true)
                    .from_writer(vec![]);
                for row in &self.rows {
                    wtr.write_record(row)?;
                }
                finish_csv(wtr)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<ExtractedTable> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                // Tables are separated by an empty record.
                let mut wtr = csv::WriterBuilder::new()
                    .flexible(true)
                    .from_writer(vec![]);
                for (i, table) in self.iter().enumerate() {
                    if i > 0 {
                        wtr.write_record(None::<&[u8]>)?;
                    }
                    for row in &table.rows {
                        wtr.write_record(row)?;
                    }
                }
                finish_csv(wtr)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<ResolutionRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for record in self {
                    wtr.serialize(record)?;
                }
                finish_csv(wtr)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
