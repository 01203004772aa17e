//! Filing index pages.
//!
//! Every EDGAR filing folder has an HTML index (`{acc}-index.html`, and for
//! most filings `{acc}-index-headers.html`) listing the documents in the
//! package with their declared type, description and size. This module reads
//! that listing and picks the primary document out of it.

use super::client::{ACCEPT_HTML, Fetch};
use crate::error::{ResolveError, Result};
use crate::filing::{DocumentSource, FilingReference, ResolvedDocument};
use crate::html::{HtmlCell, HtmlRow, HtmlTable, parse_tables};
use crate::patterns::FilenamePatterns;
use crate::strategy::ResolveStrategy;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Class EDGAR puts on its document tables
pub const DOCUMENT_TABLE_CLASS: &str = "tableFile";

/// One document row of a filing index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Document filename inside the filing folder
    pub filename: String,
    /// Declared document type, upper-cased (e.g. "10-K", "EX-21.1")
    pub declared_type: String,
    /// Free-text description
    pub description: String,
    /// Declared size in bytes; 0 when the size column is missing or unreadable
    pub size_bytes: f64,
}

impl IndexEntry {
    /// Whether the filename has an `.htm`/`.html` extension.
    pub fn is_html(&self) -> bool {
        has_html_extension(&self.filename)
    }
}

/// Which selection rule chose a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    /// A curated filename pattern for the form type matched
    FilenamePattern,
    /// Declared type equals the form type
    DeclaredType,
    /// Largest HTML document in the filing
    LargestHtml,
    /// HTML descriptor from the listing service
    ListedHtml,
    /// Native PDF descriptor from the listing service
    NativePdf,
    /// Nothing better; first entry in listing order
    FirstEntry,
}

impl fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FilenamePattern => "filename pattern",
            Self::DeclaredType => "declared type",
            Self::LargestHtml => "largest html",
            Self::ListedHtml => "listed html",
            Self::NativePdf => "native pdf",
            Self::FirstEntry => "first entry",
        };
        f.write_str(label)
    }
}

pub(crate) fn has_html_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".htm") || lower.ends_with(".html")
}

/// Parse a size column: keep only digits and `.`, read as a float, default 0.
///
/// # Example
/// ```
/// # use folio_edgar::edgar::index::parse_size;
/// assert_eq!(parse_size("1,234,567"), 1_234_567.0);
/// assert_eq!(parse_size("n/a"), 0.0);
/// ```
pub fn parse_size(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Column positions of the fields in a document table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    filename: usize,
    declared_type: usize,
    description: Option<usize>,
    size: Option<usize>,
}

impl ColumnLayout {
    /// Filename, type, description, size.
    const POSITIONAL: Self = Self {
        filename: 0,
        declared_type: 1,
        description: Some(2),
        size: Some(3),
    };

    /// Locate columns by header label; needs at least `Document` and `Type`.
    fn from_header(row: &HtmlRow) -> Option<Self> {
        let position = |label: &str| {
            row.cells
                .iter()
                .position(|c| c.text.trim().eq_ignore_ascii_case(label))
        };
        Some(Self {
            filename: position("document")?,
            declared_type: position("type")?,
            description: position("description"),
            size: position("size"),
        })
    }

    fn detect(table: &HtmlTable) -> Self {
        table
            .rows
            .iter()
            .filter(|r| r.is_header())
            .find_map(Self::from_header)
            .unwrap_or(Self::POSITIONAL)
    }

    fn entry(&self, row: &HtmlRow) -> Option<IndexEntry> {
        let filename = row.cells.get(self.filename).map(cell_filename)?;
        if filename.is_empty() {
            return None;
        }
        let text = |idx: Option<usize>| {
            idx.and_then(|i| row.cells.get(i))
                .map(|c| c.text.clone())
                .unwrap_or_default()
        };
        Some(IndexEntry {
            filename,
            declared_type: text(Some(self.declared_type)).to_uppercase(),
            description: text(self.description),
            size_bytes: self
                .size
                .and_then(|i| row.cells.get(i))
                .map_or(0.0, |c| parse_size(&c.text)),
        })
    }
}

/// Filename shown in a document cell.
///
/// Link text wins over the cell text; EDGAR appends markers such as `iXBRL`
/// after the name, so only the first token counts.
fn cell_filename(cell: &HtmlCell) -> String {
    let shown = cell
        .link
        .as_ref()
        .map(|l| l.text.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or(cell.text.as_str());
    if let Some(token) = shown.split_whitespace().next() {
        return token.to_string();
    }
    cell.link
        .as_ref()
        .and_then(|l| l.href.rsplit('/').next())
        .unwrap_or_default()
        .to_string()
}

/// Parse the document rows out of an index page.
///
/// Uses the table with class [`DOCUMENT_TABLE_CLASS`], or the first table on
/// the page. Fails when there is no table or no row names a document.
pub fn parse_index(markup: &str) -> Result<Vec<IndexEntry>> {
    let tables = parse_tables(markup);
    let table = tables
        .iter()
        .find(|t| t.has_class(DOCUMENT_TABLE_CLASS))
        .or_else(|| tables.first())
        .ok_or_else(|| ResolveError::ParseFailure("no table in index page".to_string()))?;

    let layout = ColumnLayout::detect(table);
    let entries: Vec<IndexEntry> = table
        .rows
        .iter()
        .filter(|r| !r.is_header() && r.cells.len() >= 2)
        .filter_map(|r| layout.entry(r))
        .collect();

    if entries.is_empty() {
        return Err(ResolveError::ParseFailure(
            "index table has no document rows".to_string(),
        ));
    }
    Ok(entries)
}

fn largest<'a, T>(items: impl IntoIterator<Item = &'a T>, size: impl Fn(&T) -> f64) -> Option<&'a T>
where
    T: 'a,
{
    items
        .into_iter()
        .reduce(|best, item| if size(item) > size(best) { item } else { best })
}

/// Pick the primary document among index rows.
///
/// Rules, first hit wins:
/// 1. a filename pattern registered for `form`;
/// 2. rows declared as `form` (those mentioning the form in their description
///    first), the largest HTML among them, else the first row declared as `form`;
/// 3. the largest HTML row overall;
/// 4. the first row.
///
/// Size ties keep the earliest row.
pub fn select_entry<'a>(
    entries: &'a [IndexEntry],
    form: &str,
    patterns: &FilenamePatterns,
) -> Option<(&'a IndexEntry, SelectionRule)> {
    if let Some(entry) = patterns.first_match(form, entries, |e| e.filename.as_str()) {
        return Some((entry, SelectionRule::FilenamePattern));
    }

    let typed: Vec<&IndexEntry> = entries
        .iter()
        .filter(|e| e.declared_type.eq_ignore_ascii_case(form))
        .collect();
    if !typed.is_empty() {
        let form_lower = form.to_lowercase();
        let described: Vec<&IndexEntry> = typed
            .iter()
            .copied()
            .filter(|e| e.description.to_lowercase().contains(&form_lower))
            .collect();
        let candidates = if described.is_empty() { &typed } else { &described };

        let chosen = largest(
            candidates.iter().copied().filter(|e| e.is_html()),
            |e: &IndexEntry| e.size_bytes,
        )
        .or_else(|| typed.first().copied());
        return chosen.map(|e| (e, SelectionRule::DeclaredType));
    }

    if let Some(entry) = largest(entries.iter().filter(|e| e.is_html()), |e: &IndexEntry| {
        e.size_bytes
    }) {
        return Some((entry, SelectionRule::LargestHtml));
    }

    entries.first().map(|e| (e, SelectionRule::FirstEntry))
}

/// Index page candidates, most detailed first.
pub fn index_urls(filing: &FilingReference, archive_root: &str) -> [String; 2] {
    let acc = filing.accession_number();
    [
        filing.document_url(archive_root, &format!("{}-index-headers.html", acc)),
        filing.document_url(archive_root, &format!("{}-index.html", acc)),
    ]
}

/// Strategy that reads the filing index page.
pub struct IndexStrategy {
    fetcher: Arc<dyn Fetch>,
    archive_root: String,
    patterns: Arc<FilenamePatterns>,
}

impl IndexStrategy {
    /// Create the strategy.
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        archive_root: impl Into<String>,
        patterns: Arc<FilenamePatterns>,
    ) -> Self {
        Self {
            fetcher,
            archive_root: archive_root.into(),
            patterns,
        }
    }

    /// Fetch and parse the first index candidate that yields document rows.
    ///
    /// Candidates are tried one after the other, never concurrently.
    pub async fn fetch_entries(&self, filing: &FilingReference) -> Result<Vec<IndexEntry>> {
        let mut last_error = None;
        for url in index_urls(filing, &self.archive_root) {
            let attempt = match self.fetcher.get_text(&url, ACCEPT_HTML).await {
                Ok(markup) => parse_index(&markup),
                Err(e) => Err(e),
            };
            match attempt {
                Ok(entries) => {
                    tracing::debug!(url = %url, rows = entries.len(), "parsed filing index");
                    return Ok(entries);
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "index candidate unusable");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| ResolveError::ParseFailure("no index candidates".to_string())))
    }
}

#[async_trait]
impl ResolveStrategy for IndexStrategy {
    fn name(&self) -> &'static str {
        "index"
    }

    async fn resolve(&self, filing: &FilingReference) -> Result<Option<ResolvedDocument>> {
        let entries = self.fetch_entries(filing).await?;
        let (entry, rule) = select_entry(&entries, filing.form_type(), &self.patterns)
            .ok_or_else(|| {
                ResolveError::NoCandidateFound(format!("{} index rows, none selectable", entries.len()))
            })?;

        tracing::debug!(
            filename = %entry.filename,
            declared_type = %entry.declared_type,
            size = entry.size_bytes,
            rule = %rule,
            "selected index entry"
        );
        let url = filing.document_url(&self.archive_root, &entry.filename);
        Ok(Some(ResolvedDocument::new(url, DocumentSource::Index)))
    }
}

impl fmt::Debug for IndexStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexStrategy")
            .field("archive_root", &self.archive_root)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(filename: &str, declared_type: &str, description: &str, size: f64) -> IndexEntry {
        IndexEntry {
            filename: filename.to_string(),
            declared_type: declared_type.to_string(),
            description: description.to_string(),
            size_bytes: size,
        }
    }

    fn no_patterns() -> FilenamePatterns {
        FilenamePatterns::empty()
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("50000"), 50_000.0);
        assert_eq!(parse_size("1,024 bytes"), 1024.0);
        assert_eq!(parse_size("12.5 KB"), 12.5);
        assert_eq!(parse_size(""), 0.0);
        assert_eq!(parse_size("1.2.3"), 0.0);
        assert_eq!(parse_size("&nbsp;"), 0.0);
    }

    #[test]
    fn test_parse_positional_table() {
        let html = r#"<table>
            <tr><td>main.htm</td><td>10-k</td><td>Annual report</td><td>50,000</td></tr>
            <tr><td>ex21.htm</td><td>EX-21</td></tr>
            <tr><td></td><td>EX-99</td><td>missing name</td><td>10</td></tr>
            <tr><td>lonely.htm</td></tr>
        </table>"#;
        let entries = parse_index(html).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entry("main.htm", "10-K", "Annual report", 50_000.0));
        assert_eq!(entries[1], entry("ex21.htm", "EX-21", "", 0.0));
    }

    #[test]
    fn test_parse_edgar_layout_by_header() {
        let html = r#"
            <table class="tableFile" summary="Document Format Files">
              <tr><th scope="col">Seq</th><th scope="col">Description</th>
                  <th scope="col">Document</th><th scope="col">Type</th><th scope="col">Size</th></tr>
              <tr class="blueRow"><td scope="row">1</td><td scope="row">10-K</td>
                  <td scope="row"><a href="/ix?doc=/Archives/edgar/data/320193/000032019323000106/aapl-20230930.htm">aapl-20230930.htm</a> &nbsp;&nbsp;<span class="small">iXBRL</span></td>
                  <td scope="row">10-K</td><td scope="row">1,207,358</td></tr>
              <tr><td scope="row">2</td><td scope="row">EX-21.1</td>
                  <td scope="row"><a href="/Archives/edgar/data/320193/000032019323000106/a10-kexhibit2112023.htm">a10-kexhibit2112023.htm</a></td>
                  <td scope="row">EX-21.1</td><td scope="row">&nbsp;</td></tr>
            </table>"#;
        let entries = parse_index(html).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].filename, "aapl-20230930.htm");
        assert_eq!(entries[0].declared_type, "10-K");
        assert_eq!(entries[0].description, "10-K");
        assert_eq!(entries[0].size_bytes, 1_207_358.0);
        assert_eq!(entries[1].declared_type, "EX-21.1");
        assert_eq!(entries[1].size_bytes, 0.0);
    }

    #[test]
    fn test_prefers_document_table_class() {
        let html = r#"
            <table><tr><td>nav</td><td>links</td></tr></table>
            <table class="tableFile"><tr><td>main.htm</td><td>8-K</td></tr></table>"#;
        let entries = parse_index(html).unwrap();
        assert_eq!(entries[0].filename, "main.htm");
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(
            parse_index("<html><pre>SEC-HEADER</pre></html>"),
            Err(ResolveError::ParseFailure(_))
        ));
        assert!(matches!(
            parse_index("<table><tr><td>only one cell</td></tr></table>"),
            Err(ResolveError::ParseFailure(_))
        ));
    }

    #[test]
    fn test_declared_type_prefers_largest_html() {
        let entries = vec![
            entry("cover.htm", "10-K", "", 500.0),
            entry("main.htm", "10-K", "", 50_000.0),
            entry("data.xml", "EX-101.INS", "", 900_000.0),
        ];
        let (chosen, rule) = select_entry(&entries, "10-K", &no_patterns()).unwrap();
        assert_eq!(chosen.filename, "main.htm");
        assert_eq!(rule, SelectionRule::DeclaredType);
    }

    #[test]
    fn test_declared_type_prefers_description_match() {
        let entries = vec![
            entry("letter.htm", "S-1", "Cover letter", 90_000.0),
            entry("prospectus.htm", "S-1", "Form S-1 registration", 40_000.0),
        ];
        let (chosen, _) = select_entry(&entries, "S-1", &no_patterns()).unwrap();
        assert_eq!(chosen.filename, "prospectus.htm");
    }

    #[test]
    fn test_declared_type_without_html_returns_first_candidate() {
        let entries = vec![
            entry("other.htm", "EX-99", "", 10.0),
            entry("form.txt", "N-CSR", "", 10.0),
            entry("form.pdf", "N-CSR", "", 99.0),
        ];
        let (chosen, rule) = select_entry(&entries, "N-CSR", &no_patterns()).unwrap();
        assert_eq!(chosen.filename, "form.txt");
        assert_eq!(rule, SelectionRule::DeclaredType);
    }

    #[test]
    fn test_declared_type_without_html_ignores_description_order() {
        let entries = vec![
            entry("form.txt", "N-CSR", "", 10.0),
            entry("form.pdf", "N-CSR", "N-CSR report", 99.0),
        ];
        let (chosen, rule) = select_entry(&entries, "N-CSR", &no_patterns()).unwrap();
        assert_eq!(chosen.filename, "form.txt");
        assert_eq!(rule, SelectionRule::DeclaredType);
    }

    #[test]
    fn test_global_html_fallback() {
        let entries = vec![
            entry("a.xml", "EX-101.SCH", "", 100.0),
            entry("b.htm", "EX-99.1", "", 10.0),
            entry("c.xml", "EX-101.LAB", "", 100.0),
        ];
        let (chosen, rule) = select_entry(&entries, "10-Q", &no_patterns()).unwrap();
        assert_eq!(chosen.filename, "b.htm");
        assert_eq!(rule, SelectionRule::LargestHtml);
    }

    #[test]
    fn test_absolute_fallback() {
        let entries = vec![entry("a.xml", "EX-101", "", 0.0), entry("b.txt", "EX-99", "", 5.0)];
        let (chosen, rule) = select_entry(&entries, "10-Q", &no_patterns()).unwrap();
        assert_eq!(chosen.filename, "a.xml");
        assert_eq!(rule, SelectionRule::FirstEntry);
        assert!(select_entry(&[], "10-Q", &no_patterns()).is_none());
    }

    #[test]
    fn test_filename_pattern_beats_declared_type() {
        let mut patterns = FilenamePatterns::empty();
        patterns.set("10-K", [r"(?i)^acme-?10-?k"]).unwrap();
        let entries = vec![
            entry("cover.htm", "10-K", "10-K", 900_000.0),
            entry("acme-10k_2024.htm", "EX-13", "", 1.0),
        ];
        let (chosen, rule) = select_entry(&entries, "10-K", &patterns).unwrap();
        assert_eq!(chosen.filename, "acme-10k_2024.htm");
        assert_eq!(rule, SelectionRule::FilenamePattern);
    }

    #[test]
    fn test_exhibits_named_after_form_do_not_win_by_default() {
        let patterns =
            FilenamePatterns::from_map(&crate::ResolverConfig::default().filename_patterns).unwrap();
        let entries = vec![
            entry("aapl-20230930.htm", "10-K", "10-K", 1_207_358.0),
            entry("a10-kexhibit412023.htm", "EX-4.1", "EX-4.1", 52_110.0),
            entry("a10-kexhibit2112023.htm", "EX-21.1", "EX-21.1", 0.0),
            entry("a10-kexhibit3112023.htm", "EX-31.1", "EX-31.1", 11_450.0),
        ];
        let (chosen, rule) = select_entry(&entries, "10-K", &patterns).unwrap();
        assert_eq!(chosen.filename, "aapl-20230930.htm");
        assert_eq!(rule, SelectionRule::DeclaredType);
    }

    #[test]
    fn test_unparsable_sizes_keep_first_occurrence() {
        let html = r#"<table>
            <tr><td>first.htm</td><td>10-K</td><td></td><td>n/a</td></tr>
            <tr><td>second.htm</td><td>10-K</td><td></td><td>unknown</td></tr>
        </table>"#;
        let entries = parse_index(html).unwrap();
        assert!(entries.iter().all(|e| e.size_bytes == 0.0));
        let (chosen, _) = select_entry(&entries, "10-K", &no_patterns()).unwrap();
        assert_eq!(chosen.filename, "first.htm");
    }

    #[test]
    fn test_index_urls() {
        let filing = FilingReference::new("0001683168", "0001683168-25-008885", "10-K");
        let [headers, plain] = index_urls(&filing, "https://www.sec.gov/Archives/edgar/data");
        assert_eq!(
            headers,
            "https://www.sec.gov/Archives/edgar/data/1683168/000168316825008885/000168316825008885-index-headers.html"
        );
        assert_eq!(
            plain,
            "https://www.sec.gov/Archives/edgar/data/1683168/000168316825008885/000168316825008885-index.html"
        );
    }
}
