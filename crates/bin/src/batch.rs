//! Batch resolution of filings listed in a CSV file.
//!
//! Input rows carry `cik,accession,form`. Filings are resolved with bounded
//! concurrency; a failed row is recorded and the batch carries on.

use folio_edgar::PrimaryDocumentResolver;
use folio_output::ResolutionRecord;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// Default number of concurrent resolutions.
pub(crate) const DEFAULT_CONCURRENCY: usize = 8;

/// Error type for batch input.
#[derive(Debug, thiserror::Error)]
pub(crate) enum BatchError {
    /// Malformed CSV input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Input had a header but no filings.
    #[error("No filings in batch input")]
    Empty,
}

/// One filing to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct BatchRow {
    /// Filer CIK.
    pub(crate) cik: String,
    /// Accession number, dashed or not.
    pub(crate) accession: String,
    /// Form type.
    pub(crate) form: String,
}

/// Read batch rows from CSV with a header line.
pub(crate) fn read_rows<R: Read>(reader: R) -> Result<Vec<BatchRow>, BatchError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let rows = rdr
        .deserialize()
        .collect::<Result<Vec<BatchRow>, csv::Error>>()?;
    if rows.is_empty() {
        return Err(BatchError::Empty);
    }
    Ok(rows)
}

/// Read batch rows from a CSV file.
pub(crate) fn read_rows_from_path(path: &Path) -> Result<Vec<BatchRow>, BatchError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    read_rows(file)
}

/// Resolve every row; results come back in input order.
pub(crate) async fn resolve_all(
    resolver: &PrimaryDocumentResolver,
    rows: Vec<BatchRow>,
    concurrency: usize,
    progress: Option<&ProgressBar>,
) -> Vec<ResolutionRecord> {
    let mut results: Vec<(usize, ResolutionRecord)> = stream::iter(rows.into_iter().enumerate())
        .map(|(position, row)| async move {
            let record = match resolver.resolve(&row.cik, &row.accession, &row.form).await {
                Ok(doc) => ResolutionRecord::resolved(&row.cik, &row.accession, &row.form, &doc),
                Err(e) => {
                    tracing::warn!(cik = %row.cik, accession = %row.accession, error = %e, "resolution failed");
                    ResolutionRecord::failed(&row.cik, &row.accession, &row.form, e)
                }
            };
            (position, record)
        })
        .buffer_unordered(concurrency.max(1))
        .inspect(|_| {
            if let Some(pb) = progress {
                pb.inc(1);
            }
        })
        .collect()
        .await;

    results.sort_by_key(|(position, _)| *position);
    results.into_iter().map(|(_, record)| record).collect()
}
