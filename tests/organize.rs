//! Page-organising tools driven through `DocumentSession`, the way a user
//! works: load, toggle page state, run a tool, take the artifacts.

mod common;

use common::{numbered_pdf, page_labels, page_rotations};
use pdftools::{
    merge, AcceptSet, CanvasMap, CanvasSpace, DocumentSession, ExtractMode, InputFile, PageFlags,
    PageSpec, PdfToolsError, Rotation, SplitMode, ToolConfig,
};
use pdftools::{Annotation, Language};
use std::io::Write;

#[test]
fn extract_pages_one_and_three_into_single_pdf() {
    let mut session = DocumentSession::new();
    assert_eq!(session.load("report.pdf", numbered_pdf(3)).unwrap(), 3);

    let flags = session.flags_mut().unwrap();
    flags.toggle(1);
    flags.toggle(3);

    let out = session.extract(ExtractMode::SinglePdf).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].filename, "extracted_report.pdf");
    assert_eq!(out[0].media_type, "application/pdf");
    assert_eq!(page_labels(&out[0].bytes), vec!["Page 1", "Page 3"]);
}

#[test]
fn extract_separate_files_one_per_page() {
    let mut session = DocumentSession::new();
    session.load("report.pdf", numbered_pdf(4)).unwrap();
    *session.flags_mut().unwrap() = PageFlags::from_spec(4, &PageSpec::parse("2,4").unwrap());

    let out = session.extract(ExtractMode::SeparateFiles).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(page_labels(&out[0].bytes), vec!["Page 2"]);
    assert_eq!(page_labels(&out[1].bytes), vec!["Page 4"]);
}

#[test]
fn delete_two_and_four_of_five_keeps_order() {
    let mut session = DocumentSession::new();
    session.load("deck.pdf", numbered_pdf(5)).unwrap();
    let flags = session.flags_mut().unwrap();
    flags.toggle(2);
    flags.toggle(4);

    let out = session.delete_marked().unwrap();
    assert_eq!(out.filename, "edited_deck.pdf");
    assert_eq!(page_labels(&out.bytes), vec!["Page 1", "Page 3", "Page 5"]);
}

#[test]
fn text_file_renamed_to_pdf_is_rejected_before_parsing() {
    let mut session = DocumentSession::new();
    let err = session
        .load("notes.pdf", b"meeting notes, not a pdf".to_vec())
        .unwrap_err();
    assert!(matches!(err, PdfToolsError::NotAPdf { .. }));
    assert!(!session.is_loaded());
    assert_eq!(
        err.user_message(Language::English),
        "This is not a valid PDF file."
    );
}

#[tokio::test]
async fn renamed_text_file_fails_intake_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.pdf");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(b"hello")
        .unwrap();

    let err = pdftools::read_input(path.to_str().unwrap(), AcceptSet::PDF, 5)
        .await
        .unwrap_err();
    assert!(matches!(err, PdfToolsError::NotAPdf { .. }));
}

#[test]
fn empty_selection_is_a_precondition_failure() {
    let mut session = DocumentSession::new();
    session.load("a.pdf", numbered_pdf(2)).unwrap();

    let err = session.extract(ExtractMode::SinglePdf).unwrap_err();
    assert!(matches!(err, PdfToolsError::NoPagesSelected));
    assert!(err.is_precondition());
    assert_eq!(
        err.user_message(Language::Korean),
        "처리할 페이지를 선택해주세요."
    );
}

#[test]
fn rotation_adds_to_existing_page_rotation() {
    let mut session = DocumentSession::new();
    session.load("scan.pdf", numbered_pdf(3)).unwrap();
    session.rotations_mut().unwrap().set(2, Rotation::R90);

    let once = session.rotate().unwrap();
    assert_eq!(once.filename, "rotated_scan.pdf");
    assert_eq!(page_rotations(&once.bytes), vec![0, 90, 0]);

    session.load("scan.pdf", once.bytes).unwrap();
    let rotations = session.rotations_mut().unwrap();
    rotations.set(2, Rotation::R270);
    rotations.set(3, Rotation::R180);
    let twice = session.rotate().unwrap();
    assert_eq!(page_rotations(&twice.bytes), vec![0, 0, 180]);
}

#[test]
fn rotate_without_any_angle_is_rejected() {
    let mut session = DocumentSession::new();
    session.load("scan.pdf", numbered_pdf(2)).unwrap();
    assert!(matches!(session.rotate(), Err(PdfToolsError::NoRotationSet)));
}

#[test]
fn split_every_two_pages() {
    let mut session = DocumentSession::new();
    session.load("book.pdf", numbered_pdf(5)).unwrap();

    let parts = session.split(&SplitMode::EveryN(2)).unwrap();
    let labels: Vec<Vec<String>> = parts.iter().map(|a| page_labels(&a.bytes)).collect();
    assert_eq!(
        labels,
        vec![
            vec!["Page 1", "Page 2"],
            vec!["Page 3", "Page 4"],
            vec!["Page 5"],
        ]
    );
}

#[test]
fn split_by_ranges_in_given_order() {
    let mut session = DocumentSession::new();
    session.load("book.pdf", numbered_pdf(4)).unwrap();

    let parts = session.split(&SplitMode::Ranges(vec![(3, 4), (1, 1)])).unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(page_labels(&parts[0].bytes), vec!["Page 3", "Page 4"]);
    assert_eq!(page_labels(&parts[1].bytes), vec!["Page 1"]);
}

#[test]
fn merge_keeps_input_order() {
    let inputs = vec![
        InputFile::from_bytes("a.pdf", numbered_pdf(2)),
        InputFile::from_bytes("b.pdf", numbered_pdf(1)),
    ];
    let merged = merge(&inputs, &ToolConfig::default()).unwrap();
    assert_eq!(merged.filename, "merged.pdf");
    assert_eq!(page_labels(&merged.bytes), vec!["Page 1", "Page 2", "Page 1"]);
}

#[test]
fn merge_needs_two_files() {
    let inputs = vec![InputFile::from_bytes("a.pdf", numbered_pdf(2))];
    let err = merge(&inputs, &ToolConfig::default()).unwrap_err();
    assert!(matches!(err, PdfToolsError::NotEnoughFiles { needed: 2, got: 1 }));
}

#[test]
fn annotations_keep_page_count_and_text() {
    let mut session = DocumentSession::new();
    session.load("form.pdf", numbered_pdf(2)).unwrap();
    let layer = session.annotations_mut().unwrap();
    layer.add(Annotation::highlight(1, 50.0, 50.0, 200.0, 30.0));
    layer.add(Annotation::text(2, 72.0, 100.0, "Approved", 14.0));

    let out = session
        .annotate(&CanvasMap::uniform(CanvasSpace::new(612.0, 792.0)))
        .unwrap();
    assert_eq!(out.filename, "edited_form.pdf");
    let labels = page_labels(&out.bytes);
    assert_eq!(labels.len(), 2);
    assert!(labels[1].contains("Approved"));
}
