//! Lenient HTML table reader.
//!
//! EDGAR index pages and filed documents are HTML, not XML: end tags are
//! optional, attributes may lack values and entities such as `&nbsp;` appear
//! everywhere. The reader drives `quick-xml` with name checking disabled and
//! only tracks the elements that shape a table (`table`, `tr`, `td`, `th`, `a`).
//! `script` and `style` bodies are raw text in HTML, so those elements are cut
//! out before tokenizing. Malformed markup never fails the read; whatever was
//! collected before the tokenizer gave up is returned.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;

/// Elements whose content is raw text rather than markup.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// Longest entity name looked for between `&` and `;`.
const MAX_ENTITY_LEN: usize = 32;

/// A hyperlink found inside a table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlLink {
    /// `href` attribute as written
    pub href: String,
    /// Visible link text, whitespace-collapsed
    pub text: String,
}

/// One `td`/`th` cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlCell {
    /// Visible cell text, whitespace-collapsed
    pub text: String,
    /// Whether the cell was a `th`
    pub header: bool,
    /// First link inside the cell
    pub link: Option<HtmlLink>,
}

/// One `tr` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlRow {
    /// Cells in column order
    pub cells: Vec<HtmlCell>,
}

impl HtmlRow {
    /// A row made only of `th` cells.
    pub fn is_header(&self) -> bool {
        !self.cells.is_empty() && self.cells.iter().all(|c| c.header)
    }

    /// Whether every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.text.is_empty())
    }
}

/// One `table` element, without the rows of any nested table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlTable {
    /// Tokens of the `class` attribute
    pub classes: Vec<String>,
    /// Rows in document order
    pub rows: Vec<HtmlRow>,
}

impl HtmlTable {
    /// Whether the `class` attribute lists `class` (ASCII case-insensitive).
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c.eq_ignore_ascii_case(class))
    }

    /// Widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct CellBuilder {
    text: String,
    header: bool,
    link: Option<HtmlLink>,
    in_link: bool,
}

impl CellBuilder {
    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
        if self.in_link
            && let Some(link) = self.link.as_mut()
        {
            link.text.push_str(text);
        }
    }

    fn finish(self) -> HtmlCell {
        HtmlCell {
            text: collapse_whitespace(&self.text),
            header: self.header,
            link: self.link.map(|l| HtmlLink {
                href: l.href,
                text: collapse_whitespace(&l.text),
            }),
        }
    }
}

#[derive(Debug)]
struct TableBuilder {
    order: usize,
    table: HtmlTable,
    row: Option<HtmlRow>,
    cell: Option<CellBuilder>,
}

impl TableBuilder {
    fn new(order: usize, classes: Vec<String>) -> Self {
        Self {
            order,
            table: HtmlTable {
                classes,
                rows: Vec::new(),
            },
            row: None,
            cell: None,
        }
    }

    fn close_cell(&mut self) {
        if let Some(cell) = self.cell.take() {
            self.row.get_or_insert_with(HtmlRow::default).cells.push(cell.finish());
        }
    }

    fn close_row(&mut self) {
        self.close_cell();
        if let Some(row) = self.row.take()
            && !row.cells.is_empty()
        {
            self.table.rows.push(row);
        }
    }

    fn open_row(&mut self) {
        self.close_row();
        self.row = Some(HtmlRow::default());
    }

    fn open_cell(&mut self, header: bool) {
        self.close_cell();
        if self.row.is_none() {
            self.row = Some(HtmlRow::default());
        }
        self.cell = Some(CellBuilder {
            header,
            ..CellBuilder::default()
        });
    }

    fn finish(mut self) -> (usize, HtmlTable) {
        self.close_row();
        (self.order, self.table)
    }
}

#[derive(Debug, Default)]
struct TableCollector {
    open: Vec<TableBuilder>,
    done: Vec<(usize, HtmlTable)>,
    opened: usize,
}

impl TableCollector {
    fn start(&mut self, e: &BytesStart<'_>, self_closing: bool) {
        let name = e.local_name().as_ref().to_ascii_lowercase();
        match name.as_slice() {
            b"table" => {
                let classes = attribute(e, b"class")
                    .map(|v| v.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default();
                self.open.push(TableBuilder::new(self.opened, classes));
                self.opened += 1;
                if self_closing {
                    self.close_table();
                }
            }
            b"tr" => {
                if let Some(table) = self.open.last_mut() {
                    table.open_row();
                }
            }
            b"td" | b"th" => {
                if let Some(table) = self.open.last_mut() {
                    table.open_cell(name.as_slice() == b"th");
                    if self_closing {
                        table.close_cell();
                    }
                }
            }
            b"a" => {
                if let Some(cell) = self.current_cell()
                    && cell.link.is_none()
                {
                    cell.link = Some(HtmlLink {
                        href: attribute(e, b"href").unwrap_or_default(),
                        text: String::new(),
                    });
                    cell.in_link = !self_closing;
                }
            }
            b"br" | b"p" | b"div" | b"li" => {
                if let Some(cell) = self.current_cell() {
                    cell.push_text(" ");
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        let name = name.to_ascii_lowercase();
        match name.as_slice() {
            b"table" => self.close_table(),
            b"tr" => {
                if let Some(table) = self.open.last_mut() {
                    table.close_row();
                }
            }
            b"td" | b"th" => {
                if let Some(table) = self.open.last_mut() {
                    table.close_cell();
                }
            }
            b"a" => {
                if let Some(cell) = self.current_cell() {
                    cell.in_link = false;
                }
            }
            b"p" | b"div" | b"li" => {
                if let Some(cell) = self.current_cell() {
                    cell.push_text(" ");
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(cell) = self.current_cell() {
            cell.push_text(text);
        }
    }

    fn current_cell(&mut self) -> Option<&mut CellBuilder> {
        self.open.last_mut().and_then(|t| t.cell.as_mut())
    }

    fn close_table(&mut self) {
        if let Some(table) = self.open.pop() {
            self.done.push(table.finish());
        }
    }

    fn finish(mut self) -> Vec<HtmlTable> {
        while !self.open.is_empty() {
            self.close_table();
        }
        self.done.sort_by_key(|(order, _)| *order);
        self.done.into_iter().map(|(_, table)| table).collect()
    }
}

/// Read every table in `markup`, in document order of their opening tags.
///
/// # Example
/// ```
/// # use folio_edgar::html::parse_tables;
/// let tables = parse_tables(r#"<table class="tableFile"><tr><td>a.htm<td>10-K</table>"#);
/// assert_eq!(tables.len(), 1);
/// assert!(tables[0].has_class("tableFile"));
/// assert_eq!(tables[0].rows[0].cells[1].text, "10-K");
/// ```
pub fn parse_tables(markup: &str) -> Vec<HtmlTable> {
    let markup = strip_raw_text_elements(markup);
    let mut reader = Reader::from_str(&markup);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.check_comments = false;

    let mut collector = TableCollector::default();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => collector.start(&e, false),
            Ok(Event::Empty(e)) => collector.start(&e, true),
            Ok(Event::End(e)) => collector.end(e.local_name().as_ref()),
            Ok(Event::Text(t)) => collector.text(&decode_text(&String::from_utf8_lossy(&t))),
            Ok(Event::CData(t)) => collector.text(&String::from_utf8_lossy(&t)),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(
                    position = reader.error_position(),
                    error = %e,
                    "HTML tokenizer stopped early"
                );
                break;
            }
        }
    }
    collector.finish()
}

/// Collapse runs of whitespace (including non-breaking spaces) to one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.html_attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.local_name().as_ref().eq_ignore_ascii_case(key))
        .map(|a| decode_text(&String::from_utf8_lossy(&a.value)).into_owned())
}

/// Remove `script` and `style` elements, tags included.
///
/// An element left open runs to the end of the markup.
fn strip_raw_text_elements(markup: &str) -> Cow<'_, str> {
    // ASCII lowering keeps byte offsets valid for `markup`.
    let lower = markup.to_ascii_lowercase();
    let mut kept = String::new();
    let mut copied = 0;

    while let Some((start, tag)) = next_raw_text_open(&lower, copied) {
        let Some(open_end) = lower[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        let end = if lower[..open_end].ends_with("/>") {
            open_end
        } else {
            let close = format!("</{}", tag);
            lower[open_end..]
                .find(&close)
                .map(|i| open_end + i)
                .and_then(|close_start| lower[close_start..].find('>').map(|j| close_start + j + 1))
                .unwrap_or(lower.len())
        };
        kept.push_str(&markup[copied..start]);
        copied = end;
    }

    if copied == 0 {
        return Cow::Borrowed(markup);
    }
    kept.push_str(&markup[copied..]);
    Cow::Owned(kept)
}

/// Earliest `<script`/`<style` open tag at or after `from`.
fn next_raw_text_open(lower: &str, from: usize) -> Option<(usize, &'static str)> {
    RAW_TEXT_ELEMENTS
        .iter()
        .filter_map(|&tag| {
            let opener = format!("<{}", tag);
            let mut at = from;
            while let Some(i) = lower[at..].find(&opener) {
                let start = at + i;
                let after = lower.as_bytes().get(start + opener.len()).copied();
                if after.is_none_or(|b| b == b'>' || b == b'/' || b.is_ascii_whitespace()) {
                    return Some((start, tag));
                }
                at = start + opener.len();
            }
            None
        })
        .min_by_key(|(start, _)| *start)
}

/// Decode character references one at a time; unknown ones stay as written.
fn decode_text(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let entity = tail
            .find(';')
            .filter(|&end| end <= MAX_ENTITY_LEN)
            .and_then(|end| resolve_entity(&tail[..end]).map(|text| (text, end)));
        match entity {
            Some((text, end)) => {
                decoded.push_str(&text);
                rest = &tail[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = tail;
            }
        }
    }
    decoded.push_str(rest);
    Cow::Owned(decoded)
}

fn resolve_entity(entity: &str) -> Option<Cow<'static, str>> {
    if let Some(code) = entity.strip_prefix('#') {
        let value = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse::<u32>().ok()?,
        };
        return char::from_u32(value).map(|c| Cow::Owned(c.to_string()));
    }
    html_entity(entity).map(Cow::Borrowed)
}

fn html_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        "nbsp" => Some(" "),
        "ndash" => Some("-"),
        "mdash" => Some("--"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_well_formed_table() {
        let html = r#"
            <html><body>
            <table class="tableFile" summary="Document Format Files">
              <tr><th>Seq</th><th>Document</th></tr>
              <tr><td>1</td><td><a href="/Archives/a.htm">a.htm</a></td></tr>
            </table>
            </body></html>"#;
        let tables = parse_tables(html);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert!(table.has_class("TABLEFILE"));
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows[0].is_header());
        assert!(!table.rows[1].is_header());

        let link = table.rows[1].cells[1].link.as_ref().unwrap();
        assert_eq!(link.href, "/Archives/a.htm");
        assert_eq!(link.text, "a.htm");
    }

    #[test]
    fn test_unclosed_cells_and_rows() {
        let html = "<table><tr><td>one<td>two<tr><td>three</table>";
        let tables = parse_tables(html);
        let rows = &tables[0].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells.len(), 2);
        assert_eq!(rows[0].cells[1].text, "two");
        assert_eq!(rows[1].cells[0].text, "three");
    }

    #[test]
    fn test_entities_and_whitespace() {
        let html = "<table><tr><td>AT&amp;T&nbsp;&nbsp;Inc.\n  10-K</td><td>R&D</td></tr></table>";
        let tables = parse_tables(html);
        let cells = &tables[0].rows[0].cells;
        assert_eq!(cells[0].text, "AT&T Inc. 10-K");
        assert_eq!(cells[1].text, "R&D");
    }

    #[test]
    fn test_unknown_entity_keeps_its_neighbours_decoded() {
        let html = "<table><tr><td>AT&T&nbsp;Inc</td><td>&copy;&#169;&#xA9; &amp;c</td></tr></table>";
        let cells = &parse_tables(html)[0].rows[0].cells;
        assert_eq!(cells[0].text, "AT&T Inc");
        assert_eq!(cells[1].text, "&copy;\u{a9}\u{a9} &c");
    }

    #[test]
    fn test_decode_text_passes_bare_ampersands() {
        assert_eq!(decode_text("Q&A; R & D"), "Q&A; R & D");
        assert_eq!(decode_text("a&#xZZ;b&lt;"), "a&#xZZ;b<");
        assert!(matches!(decode_text("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_nested_tables_are_separate() {
        let html = "<table id=outer><tr><td>outer\
                    <table><tr><td>inner</td></tr></table>\
                    </td></tr></table>";
        let tables = parse_tables(html);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows[0].cells[0].text, "outer");
        assert_eq!(tables[1].rows[0].cells[0].text, "inner");
    }

    #[test]
    fn test_script_text_is_ignored() {
        let html = "<table><tr><td>x<script>var a = 'y';</script></td></tr></table>";
        let tables = parse_tables(html);
        assert_eq!(tables[0].rows[0].cells[0].text, "x");
    }

    #[test]
    fn test_script_with_markup_characters_before_table() {
        let html = r#"<html><head>
            <script type="text/javascript">for (i=0;i<n;i++){ if (a<b && c>d) {} }</script>
            <STYLE>td > p { margin: 0 }</STYLE>
            </head><body>
            <table class="tableFile"><tr><td>main.htm</td><td>10-K</td></tr></table>
            </body></html>"#;
        let tables = parse_tables(html);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0].cells[0].text, "main.htm");
    }

    #[test]
    fn test_strip_raw_text_elements() {
        assert_eq!(
            strip_raw_text_elements("a<script src=x.js/>b<style>p<q</style >c<scripts>d"),
            "abc<scripts>d"
        );
        assert_eq!(strip_raw_text_elements("a<script>never closed<td>"), "a");
        assert!(matches!(strip_raw_text_elements("<p>x</p>"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_no_tables() {
        assert!(parse_tables("<html><pre>header only</pre></html>").is_empty());
        assert!(parse_tables("").is_empty());
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \u{a0} b\n\tc "), "a b c");
    }
}
