//! End-to-end tests: real PDFs through collection, inference and batch output.

use std::fs;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use pdf_outline::batch::{process_directory, BatchEvent, BatchOptions, DocumentOutcome};
use pdf_outline::render::from_json;
use pdf_outline::{
    extract_outline, extract_outline_from_bytes, DocumentResult, HeadingLevel, OutlineEntry,
    Outliner,
};

/// A line of text: (font resource, size, x, baseline, text).
type Line = (&'static str, i64, i64, i64, &'static str);

fn text_ops(lines: &[Line]) -> Vec<Operation> {
    let mut ops = Vec::new();
    for &(font, size, x, y, text) in lines {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
        ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(text)]));
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

/// Build a US Letter PDF with one content stream per page.
fn build_pdf(pages: &[Vec<Line>], title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids = Vec::new();
    for lines in pages {
        let content = Content {
            operations: text_ops(lines),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let page_tree = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
        });
        doc.trailer.set("Info", info_id);
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Two pages: a centered title, numbered headings and body text.
fn report_pdf() -> Vec<u8> {
    build_pdf(
        &[
            vec![
                ("F1", 24, 228, 700, "Annual Report"),
                ("F2", 16, 72, 640, "1. Introduction"),
                ("F1", 10, 72, 620, "This report describes the results of the year."),
                ("F1", 10, 72, 606, "It is organised by business unit and region."),
                ("F1", 10, 72, 592, "Figures are unaudited unless stated otherwise."),
            ],
            vec![
                ("F2", 13, 72, 720, "1.1 Scope"),
                ("F1", 10, 72, 700, "The scope covers all subsidiaries in the group."),
                ("F1", 10, 72, 686, "Joint ventures are reported separately below."),
                ("F1", 10, 72, 672, "Comparatives have been restated where needed."),
                ("F2", 16, 72, 600, "2. Results"),
            ],
        ],
        None,
    )
}

/// Only body-sized text, with a title in the document information dictionary.
fn memo_pdf() -> Vec<u8> {
    build_pdf(
        &[vec![
            ("F1", 10, 72, 720, "Please find the agenda for next week attached."),
            ("F1", 10, 72, 706, "The meeting starts at ten in the main room."),
            ("F1", 10, 72, 692, "Bring the quarterly figures if you have them."),
        ]],
        Some("Team Memo"),
    )
}

fn report_result() -> DocumentResult {
    DocumentResult::new(
        "Annual Report",
        vec![
            OutlineEntry::new(HeadingLevel::H1, "1. Introduction", 1),
            OutlineEntry::new(HeadingLevel::H2, "1.1 Scope", 2),
            OutlineEntry::new(HeadingLevel::H1, "2. Results", 2),
        ],
    )
}

#[test]
fn test_collect_spans_from_pdf() {
    let document = Outliner::new().collect_bytes(&report_pdf()).unwrap();

    assert_eq!(document.page_count, 2);
    assert_eq!(document.metadata_title, None);

    let title = &document.spans[0];
    assert_eq!(title.text, "Annual Report");
    assert_eq!(title.font_size, 24.0);
    assert_eq!(title.page, 1);
    assert!(!title.is_bold);
    // Top edge: 792 - (700 + 0.8 * 24)
    assert!((title.y - 72.8).abs() < 0.01);

    let heading = &document.spans[1];
    assert_eq!(heading.text, "1. Introduction");
    assert!(heading.is_bold);
    assert_eq!(document.page_spans(2).count(), 5);
}

#[test]
fn test_extract_outline_from_bytes() {
    let result = extract_outline_from_bytes(&report_pdf()).unwrap();
    assert_eq!(result, report_result());
}

#[test]
fn test_metadata_title_used_when_layout_has_none() {
    let result = extract_outline_from_bytes(&memo_pdf()).unwrap();
    assert_eq!(result.title, "Team Memo");
    assert!(result.outline.is_empty());
}

#[test]
fn test_extract_outline_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    fs::write(&path, report_pdf()).unwrap();

    assert_eq!(extract_outline(&path).unwrap(), report_result());
}

#[test]
fn test_extraction_is_deterministic() {
    let bytes = report_pdf();
    let first = extract_outline_from_bytes(&bytes).unwrap();
    let second = extract_outline_from_bytes(&bytes).unwrap();
    assert_eq!(first, second);
}

fn read_result(path: &Path) -> DocumentResult {
    from_json(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_batch_writes_one_json_per_readable_pdf() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("report.pdf"), report_pdf()).unwrap();
    fs::write(input.path().join("memo.PDF"), memo_pdf()).unwrap();
    fs::write(input.path().join("corrupt.pdf"), b"%PDF-1.4\n1 0 obj <<").unwrap();
    fs::write(input.path().join("notes.txt"), b"not a pdf").unwrap();

    let report = process_directory(input.path(), output.path(), &BatchOptions::default()).unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.written(), 2);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.degraded(), 1);

    let names: Vec<String> = report
        .documents
        .iter()
        .map(|d| d.input.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["corrupt.pdf", "memo.PDF", "report.pdf"]);
    assert!(matches!(report.documents[0].outcome, DocumentOutcome::Skipped { .. }));

    assert_eq!(read_result(&output.path().join("report.json")), report_result());
    assert_eq!(read_result(&output.path().join("memo.json")).title, "Team Memo");
    assert!(!output.path().join("corrupt.json").exists());
    assert!(!output.path().join("notes.json").exists());
}

#[test]
fn test_sequential_batch_matches_parallel() {
    let input = tempfile::tempdir().unwrap();
    let parallel_out = tempfile::tempdir().unwrap();
    let sequential_out = tempfile::tempdir().unwrap();
    for i in 0..4 {
        fs::write(input.path().join(format!("doc{}.pdf", i)), report_pdf()).unwrap();
    }

    process_directory(input.path(), parallel_out.path(), &BatchOptions::default()).unwrap();
    process_directory(
        input.path(),
        sequential_out.path(),
        &BatchOptions::default().sequential(),
    )
    .unwrap();

    for i in 0..4 {
        let name = format!("doc{}.json", i);
        assert_eq!(
            fs::read(parallel_out.path().join(&name)).unwrap(),
            fs::read(sequential_out.path().join(&name)).unwrap()
        );
    }
}

#[test]
fn test_batch_reports_progress() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("a.pdf"), report_pdf()).unwrap();
    fs::write(input.path().join("b.pdf"), memo_pdf()).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    let options = BatchOptions::default().with_events(tx);
    process_directory(input.path(), output.path(), &options).unwrap();
    drop(options);

    let events: Vec<BatchEvent> = rx.iter().collect();
    assert_eq!(events.first(), Some(&BatchEvent::Started { total: 2 }));
    let finished = events
        .iter()
        .filter(|e| matches!(e, BatchEvent::Finished(report) if report.is_written()))
        .count();
    assert_eq!(finished, 2);
}

#[test]
fn test_compact_output() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("memo.pdf"), memo_pdf()).unwrap();

    let options = BatchOptions::default().with_format(pdf_outline::JsonFormat::Compact);
    process_directory(input.path(), output.path(), &options).unwrap();

    let json = fs::read_to_string(output.path().join("memo.json")).unwrap();
    assert_eq!(json, r#"{"title":"Team Memo","outline":[]}"#);
}
