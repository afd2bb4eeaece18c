//! Integration Tests for docxmerge
//!
//! End-to-end tests for the merge pipeline: spreadsheet parsing,
//! placeholder expansion, document substitution and report aggregation.
//! Fixtures are generated in memory (rust_xlsxwriter for spreadsheets,
//! a handcrafted minimal DOCX for templates).

use std::fs;
use std::io::{Cursor, Read, Write};

use docxmerge::{parse_records, MergerBuilder};
use rust_xlsxwriter::{Workbook, XlsxError};

// Helper module for generating test fixtures
mod fixtures {
    use super::*;

    pub const DOCUMENT_XML_HEAD: &str = concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
        "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
    );

    /// Wrap a body fragment into a full document.xml
    pub fn document_xml(body: &str) -> String {
        format!("{}<w:body>{}</w:body></w:document>", DOCUMENT_XML_HEAD, body)
    }

    /// Build a minimal DOCX archive from (entry name, XML content) pairs
    pub fn build_docx(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
        zip.start_file("_rels/.rels", options).unwrap();
        zip.write_all(b"<?xml version=\"1.0\"?><Relationships/>")
            .unwrap();
        for (name, content) in parts {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }

    /// Build a DOCX whose document.xml has a single paragraph with one run
    pub fn simple_docx(text: &str) -> Vec<u8> {
        let body = format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text);
        build_docx(&[("word/document.xml", document_xml(&body).as_str())])
    }

    /// Generate a spreadsheet: "name"/"city"/"amount" headers and two rows
    pub fn generate_people_spreadsheet() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        // Header row
        worksheet.write_string(0, 0, "name")?;
        worksheet.write_string(0, 1, "city")?;
        worksheet.write_string(0, 2, "amount")?;

        // Data rows
        worksheet.write_string(1, 0, "Alice")?;
        worksheet.write_string(1, 1, "Kyoto")?;
        worksheet.write_number(1, 2, 42.0)?;

        worksheet.write_string(2, 0, "Bob")?;
        worksheet.write_string(2, 1, "Osaka")?;
        worksheet.write_number(2, 2, 7.5)?;

        Ok(workbook.save_to_buffer()?)
    }

    /// Read one entry of a DOCX archive as a string
    pub fn docx_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }
}

#[test]
fn test_merge_produces_one_output_per_pair() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("people.xlsx"),
        fixtures::generate_people_spreadsheet().unwrap(),
    )
    .unwrap();
    fs::write(
        dir.path().join("contract.docx"),
        fixtures::simple_docx("Contract for {name} in {city}"),
    )
    .unwrap();
    fs::write(
        dir.path().join("letter.docx"),
        fixtures::simple_docx("Dear [name], amount: [amount]"),
    )
    .unwrap();

    let merger = MergerBuilder::new().build().unwrap();
    let report = merger.merge_directory(dir.path()).unwrap();

    // 2 records x 2 templates = 4 outputs
    assert_eq!(report.success_count(), 4);
    assert!(report.failures.is_empty());
    assert!(report.skipped.is_empty());

    let expected = [
        "contract_Alice.docx",
        "contract_Bob.docx",
        "letter_Alice.docx",
        "letter_Bob.docx",
    ];
    for name in expected {
        assert!(
            report.produced.contains(&name.to_string()),
            "missing output: {}",
            name
        );
        assert!(dir.path().join("generated").join(name).exists());
    }

    // No duplicate names when keys are unique
    let mut sorted = report.produced.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), 4);

    // Substituted content check
    let bytes = fs::read(dir.path().join("generated/contract_Alice.docx")).unwrap();
    let document = fixtures::docx_part(&bytes, "word/document.xml");
    assert!(document.contains("Contract for Alice in Kyoto"));

    let bytes = fs::read(dir.path().join("generated/letter_Bob.docx")).unwrap();
    let document = fixtures::docx_part(&bytes, "word/document.xml");
    assert!(document.contains("Dear Bob, amount: 7.5"));
}

#[test]
fn test_all_placeholder_styles_are_replaced() {
    let dir = tempfile::tempdir().unwrap();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "name").unwrap();
    worksheet.write_string(1, 0, "Alice").unwrap();
    fs::write(
        dir.path().join("data.xlsx"),
        workbook.save_to_buffer().unwrap(),
    )
    .unwrap();

    // The angle style is stored escaped inside the XML. The double-curly
    // spelling is tested separately: its token overlaps the single-curly
    // one, and overlapping tokens in one map are undefined behavior.
    fs::write(
        dir.path().join("styles.docx"),
        fixtures::simple_docx("{name} [name] &lt;name&gt;"),
    )
    .unwrap();

    let merger = MergerBuilder::new().build().unwrap();
    let report = merger.merge_directory(dir.path()).unwrap();
    assert_eq!(report.success_count(), 1);

    let bytes = fs::read(dir.path().join("generated/styles_Alice.docx")).unwrap();
    let document = fixtures::docx_part(&bytes, "word/document.xml");
    assert!(document.contains("Alice Alice Alice"));
    assert!(!document.contains("name}"));
}

#[test]
fn test_double_curly_style_with_restricted_set() {
    let dir = tempfile::tempdir().unwrap();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "name").unwrap();
    worksheet.write_string(1, 0, "Alice").unwrap();
    fs::write(
        dir.path().join("data.xlsx"),
        workbook.save_to_buffer().unwrap(),
    )
    .unwrap();
    fs::write(
        dir.path().join("tpl.docx"),
        fixtures::simple_docx("Hello {{name}}"),
    )
    .unwrap();

    let merger = MergerBuilder::new()
        .with_placeholder_styles(vec![docxmerge::PlaceholderStyle::CurlyDouble])
        .build()
        .unwrap();
    merger.merge_directory(dir.path()).unwrap();

    let bytes = fs::read(dir.path().join("generated/tpl_Alice.docx")).unwrap();
    let document = fixtures::docx_part(&bytes, "word/document.xml");
    assert!(document.contains("Hello Alice"));
}

#[test]
fn test_headers_footers_and_tables_are_processed() {
    let dir = tempfile::tempdir().unwrap();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "name").unwrap();
    worksheet.write_string(0, 1, "city").unwrap();
    worksheet.write_string(1, 0, "Alice").unwrap();
    worksheet.write_string(1, 1, "Kyoto").unwrap();
    fs::write(
        dir.path().join("data.xlsx"),
        workbook.save_to_buffer().unwrap(),
    )
    .unwrap();

    // Body with a nested-table cell, plus first-page header and footer parts
    let body = concat!(
        "<w:tbl><w:tr><w:tc>",
        "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell: {name}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        "</w:tc></w:tr></w:tbl>",
        "<w:p><w:r><w:t>body: {name}</w:t></w:r></w:p>",
    );
    let header_xml = format!(
        "{}{}{}",
        "<?xml version=\"1.0\"?><w:hdr xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
        "<w:p><w:r><w:t>header: {city}</w:t></w:r></w:p>",
        "</w:hdr>"
    );
    let footer_xml = format!(
        "{}{}{}",
        "<?xml version=\"1.0\"?><w:ftr xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
        "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>footer: {city}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        "</w:ftr>"
    );
    let docx = fixtures::build_docx(&[
        ("word/document.xml", fixtures::document_xml(body).as_str()),
        ("word/header2.xml", header_xml.as_str()),
        ("word/footer1.xml", footer_xml.as_str()),
    ]);
    fs::write(dir.path().join("report.docx"), docx).unwrap();

    let merger = MergerBuilder::new().build().unwrap();
    let report = merger.merge_directory(dir.path()).unwrap();
    assert_eq!(report.success_count(), 1);

    let bytes = fs::read(dir.path().join("generated/report_Alice.docx")).unwrap();
    assert!(fixtures::docx_part(&bytes, "word/document.xml").contains("cell: Alice"));
    assert!(fixtures::docx_part(&bytes, "word/document.xml").contains("body: Alice"));
    assert!(fixtures::docx_part(&bytes, "word/header2.xml").contains("header: Kyoto"));
    assert!(fixtures::docx_part(&bytes, "word/footer1.xml").contains("footer: Kyoto"));
}

#[test]
fn test_unmatched_placeholder_passes_through() {
    let dir = tempfile::tempdir().unwrap();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "name").unwrap();
    worksheet.write_string(1, 0, "Alice").unwrap();
    fs::write(
        dir.path().join("data.xlsx"),
        workbook.save_to_buffer().unwrap(),
    )
    .unwrap();
    fs::write(
        dir.path().join("tpl.docx"),
        fixtures::simple_docx("{name} works at {company}"),
    )
    .unwrap();

    let merger = MergerBuilder::new().build().unwrap();
    merger.merge_directory(dir.path()).unwrap();

    let bytes = fs::read(dir.path().join("generated/tpl_Alice.docx")).unwrap();
    let document = fixtures::docx_part(&bytes, "word/document.xml");
    // Unknown field's token is left verbatim (intentional pass-through)
    assert!(document.contains("Alice works at {company}"));
}

#[test]
fn test_empty_cell_leaves_placeholder() {
    let dir = tempfile::tempdir().unwrap();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "name").unwrap();
    worksheet.write_string(0, 1, "city").unwrap();
    // Bob has no city value
    worksheet.write_string(1, 0, "Bob").unwrap();
    fs::write(
        dir.path().join("data.xlsx"),
        workbook.save_to_buffer().unwrap(),
    )
    .unwrap();
    fs::write(
        dir.path().join("tpl.docx"),
        fixtures::simple_docx("{name} / {city}"),
    )
    .unwrap();

    let merger = MergerBuilder::new().build().unwrap();
    merger.merge_directory(dir.path()).unwrap();

    let bytes = fs::read(dir.path().join("generated/tpl_Bob.docx")).unwrap();
    let document = fixtures::docx_part(&bytes, "word/document.xml");
    assert!(document.contains("Bob / {city}"));
}

#[test]
fn test_untouched_part_survives_byte_identical() {
    let dir = tempfile::tempdir().unwrap();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "name").unwrap();
    worksheet.write_string(1, 0, "Alice").unwrap();
    fs::write(
        dir.path().join("data.xlsx"),
        workbook.save_to_buffer().unwrap(),
    )
    .unwrap();

    // A template without any placeholder token
    let original_xml =
        fixtures::document_xml("<w:p><w:r><w:rPr><w:i/></w:rPr><w:t>Nothing to replace</w:t></w:r></w:p>");
    fs::write(
        dir.path().join("plain.docx"),
        fixtures::build_docx(&[("word/document.xml", original_xml.as_str())]),
    )
    .unwrap();

    let merger = MergerBuilder::new().build().unwrap();
    let report = merger.merge_directory(dir.path()).unwrap();
    assert_eq!(report.success_count(), 1);

    let bytes = fs::read(dir.path().join("generated/plain_Alice.docx")).unwrap();
    let document = fixtures::docx_part(&bytes, "word/document.xml");
    assert_eq!(document, original_xml);
}

#[test]
fn test_record_parsing_properties() {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    // Headers with a gap: column C has no header
    worksheet.write_string(0, 0, "name").unwrap();
    worksheet.write_string(0, 1, "city").unwrap();
    worksheet.write_string(0, 3, "amount").unwrap();

    worksheet.write_string(1, 0, "Alice").unwrap();
    worksheet.write_string(1, 1, "Kyoto").unwrap();
    worksheet.write_string(1, 2, "ignored").unwrap(); // no header for this column
    worksheet.write_number(1, 3, 42.0).unwrap();

    // Row with an empty key column is not a data row
    worksheet.write_string(2, 1, "Nara").unwrap();

    worksheet.write_string(3, 0, "  Bob  ").unwrap(); // key is trimmed
    let bytes = workbook.save_to_buffer().unwrap();

    let record_set = parse_records(Cursor::new(bytes), "test.xlsx").unwrap();

    assert_eq!(record_set.header().len(), 3);
    assert_eq!(record_set.records().len(), 2);

    let alice = &record_set.records()[0];
    assert_eq!(alice.key(), "Alice");
    assert_eq!(alice.get("city"), Some("Kyoto"));
    assert_eq!(alice.get("amount"), Some("42")); // integral float, no decimal point
    assert_eq!(alice.fields().len(), 3);

    let bob = &record_set.records()[1];
    assert_eq!(bob.key(), "Bob");
    // Only the key column has a value, so only "name" is present
    assert_eq!(bob.fields().len(), 1);
    assert_eq!(bob.get("city"), None);
}

#[test]
fn test_merge_report_serializes() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("people.xlsx"),
        fixtures::generate_people_spreadsheet().unwrap(),
    )
    .unwrap();
    fs::write(
        dir.path().join("tpl.docx"),
        fixtures::simple_docx("{name}"),
    )
    .unwrap();

    let merger = MergerBuilder::new().build().unwrap();
    let report = merger.merge_directory(dir.path()).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
    assert_eq!(json["produced"].as_array().unwrap().len(), 2);
    assert_eq!(json["failures"].as_array().unwrap().len(), 0);
}
