//! Tests for the `pdftools` binary. Each test gets its own settings
//! directory so a stored language never leaks between tests.

mod common;

use assert_cmd::Command;
use common::{numbered_pdf, page_labels};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn pdftools(settings: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pdftools").unwrap();
    cmd.env("PDFTOOLS_CONFIG_DIR", settings)
        .env_remove("RUST_LOG")
        .env_remove("PDFTOOLS_LANG")
        .arg("--no-progress");
    cmd
}

fn fixture(dir: &TempDir, name: &str, pages: usize) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, numbered_pdf(pages)).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn help_lists_tools() {
    let settings = TempDir::new().unwrap();
    pdftools(settings.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("merge"))
        .stdout(predicate::str::contains("ocr"))
        .stdout(predicate::str::contains("convert"));
}

#[test]
fn delete_writes_edited_file() {
    let work = TempDir::new().unwrap();
    let input = fixture(&work, "deck.pdf", 5);
    let out = work.path().join("out");

    pdftools(work.path())
        .args(["delete", &input, "--pages", "2,4", "-o"])
        .arg(&out)
        .assert()
        .success();

    let bytes = std::fs::read(out.join("edited_deck.pdf")).unwrap();
    assert_eq!(page_labels(&bytes), vec!["Page 1", "Page 3", "Page 5"]);
}

#[test]
fn empty_selection_reports_in_korean_by_default() {
    let work = TempDir::new().unwrap();
    let input = fixture(&work, "a.pdf", 2);

    pdftools(work.path())
        .args(["extract", &input, "--pages", "9", "-o"])
        .arg(work.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("처리할 페이지를 선택해주세요."));
}

#[test]
fn lang_flag_overrides_for_one_run() {
    let work = TempDir::new().unwrap();
    let input = fixture(&work, "a.pdf", 2);

    pdftools(work.path())
        .args(["--lang", "en", "delete", &input, "--pages", "1-2", "-o"])
        .arg(work.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("You cannot delete every page."));

    pdftools(work.path())
        .args(["lang", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ko"));
}

#[test]
fn stored_language_is_used_on_later_runs() {
    let work = TempDir::new().unwrap();
    let notes = work.path().join("notes.pdf");
    std::fs::write(&notes, b"just some text").unwrap();

    pdftools(work.path()).args(["lang", "set", "en"]).assert().success();
    pdftools(work.path())
        .args(["lang", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("en"));

    pdftools(work.path())
        .arg("info")
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("This is not a valid PDF file."));
}

#[test]
fn split_bundles_parts_into_zip() {
    let work = TempDir::new().unwrap();
    let input = fixture(&work, "book.pdf", 3);
    let out = work.path().join("out");

    pdftools(work.path())
        .args(["--zip", "split", &input, "-o"])
        .arg(&out)
        .assert()
        .success();

    let archive = std::fs::read(out.join("book.zip")).unwrap();
    let zip = zip::ZipArchive::new(std::io::Cursor::new(archive)).unwrap();
    assert_eq!(zip.len(), 3);
}

#[test]
fn info_prints_json_metadata() {
    let work = TempDir::new().unwrap();
    let input = fixture(&work, "a.pdf", 4);

    let output = pdftools(work.path())
        .args(["--json", "info", &input])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let meta: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(meta["page_count"], 4);
    assert_eq!(meta["is_encrypted"], false);
}

#[test]
fn convert_to_text_extracts_every_page() {
    let work = TempDir::new().unwrap();
    let input = fixture(&work, "a.pdf", 2);

    pdftools(work.path())
        .args(["convert", "to-text", &input, "--separator", "header", "-o"])
        .arg(work.path())
        .assert()
        .success();

    let text = std::fs::read_to_string(work.path().join("a.txt")).unwrap();
    assert!(text.contains("Page 1"));
    assert!(text.contains("=== Page 2 ==="));
}

#[test]
fn merge_skips_files_that_are_not_pdfs() {
    let work = TempDir::new().unwrap();
    let a = fixture(&work, "a.pdf", 1);
    let b = fixture(&work, "b.pdf", 2);
    let photo = work.path().join("photo.png");
    std::fs::write(&photo, b"not used").unwrap();

    pdftools(work.path())
        .args(["merge", &a])
        .arg(&photo)
        .arg(&b)
        .arg("-o")
        .arg(work.path())
        .assert()
        .success();

    let merged = std::fs::read(work.path().join("merged.pdf")).unwrap();
    assert_eq!(page_labels(&merged).len(), 3);
}

#[test]
fn rotate_rejects_odd_angles() {
    let work = TempDir::new().unwrap();
    let input = fixture(&work, "a.pdf", 1);

    pdftools(work.path())
        .args(["--lang", "en", "rotate", &input, "--angle", "45"])
        .assert()
        .failure();
}
