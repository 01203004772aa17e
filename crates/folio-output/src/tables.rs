//! Table extraction from filed HTML documents.
//!
//! Filings use tables for two things: financial data and page layout. Layout
//! tables tend to be a single row or a single column, so anything below the
//! configured minimum size is dropped.

use folio_edgar::html::{HtmlTable, parse_tables};
use serde::{Deserialize, Serialize};

/// Limits applied while extracting tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Minimum number of non-blank rows
    pub min_rows: usize,
    /// Minimum number of columns in the widest row
    pub min_columns: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
        }
    }
}

/// A table as rows of cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTable {
    /// Position among all tables in the document, counting dropped ones
    pub index: usize,
    /// Cell text, row by row
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    /// Number of columns in the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Rows padded with empty cells to [`Self::width`].
    pub fn padded_rows(&self) -> Vec<Vec<String>> {
        let width = self.width();
        self.rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.resize(width, String::new());
                row
            })
            .collect()
    }

    fn from_html(index: usize, table: &HtmlTable) -> Self {
        let rows = table
            .rows
            .iter()
            .filter(|r| !r.is_blank())
            .map(|r| r.cells.iter().map(|c| c.text.clone()).collect())
            .collect();
        Self { index, rows }
    }
}

/// Extract every data-bearing table from `markup`.
pub fn extract_tables(markup: &str, options: &ExtractOptions) -> Vec<ExtractedTable> {
    parse_tables(markup)
        .iter()
        .enumerate()
        .map(|(index, table)| ExtractedTable::from_html(index, table))
        .filter(|t| t.rows.len() >= options.min_rows && t.width() >= options.min_columns)
        .collect()
}
