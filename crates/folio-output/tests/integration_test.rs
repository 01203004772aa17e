//! Integration tests for table extraction and export.

use folio_output::{ExportFormat, Exporter, ExtractOptions, ExtractedTable, extract_tables};
use rstest::rstest;

/// Fragment shaped like an EDGAR 10-K: a layout table wrapping a statement
/// table, inline styling, entity-encoded text and spacer rows.
const STATEMENT: &str = r#"<html><head><style>td { font-size: 10pt }</style></head><body>
<table width="100%"><tr><td>
  <p>CONSOLIDATED STATEMENTS OF OPERATIONS</p>
  <table style="border-collapse:collapse">
    <tr><td></td><td colspan="2"><b>Years ended September</b></td></tr>
    <tr><td style="padding:0"><span>Net sales</span></td>
        <td>$&#160;383,285</td><td>$&#160;394,328</td></tr>
    <tr><td>&nbsp;</td><td>&nbsp;</td><td>&nbsp;</td></tr>
    <tr><td>Cost of sales</td><td>214,137</td><td>223,546</td></tr>
    <tr><td>Research &amp; development</td><td>29,915</td><td>26,251</td></tr>
  </table>
</td></tr></table>
<script>var t = "<table><tr><td>x</td><td>y</td></tr></table>";</script>
</body></html>"#;

#[test]
fn test_statement_extraction_workflow() {
    let tables = extract_tables(STATEMENT, &ExtractOptions::default());

    // The one-cell wrapper is layout; the script is ignored.
    assert_eq!(tables.len(), 1);
    let statement = &tables[0];
    assert_eq!(statement.rows.len(), 4);
    assert_eq!(statement.rows[1], vec!["Net sales", "$ 383,285", "$ 394,328"]);
    assert_eq!(statement.rows[3][0], "Research & development");
    assert_eq!(statement.width(), 3);

    let csv = tables.export_to_string(ExportFormat::Csv).unwrap();
    assert!(csv.contains("Net sales,\"$ 383,285\",\"$ 394,328\"\n"));
    assert!(csv.contains("Research & development,\"29,915\",\"26,251\"\n"));
}

#[rstest]
#[case(ExportFormat::Csv, "csv")]
#[case(ExportFormat::Json, "json")]
#[case(ExportFormat::PrettyJson, "json")]
fn test_export_to_file(#[case] format: ExportFormat, #[case] extension: &str) {
    let tables = extract_tables(STATEMENT, &ExtractOptions::default());
    assert_eq!(format.extension(), extension);

    let path = std::env::temp_dir().join(format!(
        "folio-tables-{}-{:?}.{}",
        std::process::id(),
        format,
        format.extension()
    ));
    tables.export_to_file(&path, format).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(written, tables.export_to_string(format).unwrap());
    if format != ExportFormat::Csv {
        let decoded: Vec<ExtractedTable> = serde_json::from_str(&written).unwrap();
        assert_eq!(decoded, tables);
    }
}
