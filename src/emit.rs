//! Emitting results: in-memory artifacts, atomic writes, ZIP bundles.
//!
//! Every tool returns [`Artifact`]s rather than writing to disk itself, so
//! the same result can be saved, bundled or inspected in tests.

use crate::error::PdfToolsError;
use serde::Serialize;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const MEDIA_PDF: &str = "application/pdf";
pub const MEDIA_TEXT: &str = "text/plain; charset=utf-8";
pub const MEDIA_ZIP: &str = "application/zip";
pub const MEDIA_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MEDIA_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MEDIA_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// A named, typed blob of output bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub filename: String,
    pub media_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(filename: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn pdf(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(filename, MEDIA_PDF, bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Filename derivation for outputs.
pub struct OutputNaming;

impl OutputNaming {
    /// `report.pdf` → `extracted_report.pdf`.
    pub fn prefixed(prefix: &str, name: &str) -> String {
        format!("{prefix}{}", base_name(name))
    }

    /// `scan.pdf` + `_ocr` + `txt` → `scan_ocr.txt`.
    pub fn suffixed(name: &str, suffix: &str, extension: &str) -> String {
        format!("{}{suffix}.{extension}", Self::stem(name))
    }

    /// `slides.pptx` + `pdf` → `slides.pdf`.
    pub fn with_extension(name: &str, extension: &str) -> String {
        format!("{}.{extension}", Self::stem(name))
    }

    /// File name without directories or the last extension.
    pub fn stem(name: &str) -> String {
        let base = base_name(name);
        match base.rfind('.') {
            Some(0) | None => base.to_string(),
            Some(dot) => base[..dot].to_string(),
        }
    }
}

fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Write one artifact into `dir` atomically and return its final path.
///
/// The bytes go to `<filename>.tmp` first and are renamed into place, so a
/// crash never leaves a truncated output behind.
pub fn save_artifact(artifact: &Artifact, dir: &Path) -> Result<PathBuf, PdfToolsError> {
    std::fs::create_dir_all(dir).map_err(|e| PdfToolsError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let path = dir.join(base_name(&artifact.filename));
    let tmp = dir.join(format!("{}.tmp", base_name(&artifact.filename)));

    std::fs::write(&tmp, &artifact.bytes).map_err(|e| PdfToolsError::OutputWriteFailed {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, &path).map_err(|e| PdfToolsError::OutputWriteFailed {
        path: path.clone(),
        source: e,
    })?;

    info!(
        "Wrote {} ({} bytes, {})",
        path.display(),
        artifact.len(),
        artifact.media_type
    );
    Ok(path)
}

pub fn save_all(artifacts: &[Artifact], dir: &Path) -> Result<Vec<PathBuf>, PdfToolsError> {
    artifacts.iter().map(|a| save_artifact(a, dir)).collect()
}

/// Pack several artifacts into one ZIP archive.
///
/// Duplicate filenames get a numeric suffix so no entry is shadowed.
pub fn bundle_zip(artifacts: &[Artifact], zip_name: &str) -> Result<Artifact, PdfToolsError> {
    let archive_err = |e: zip::result::ZipError| PdfToolsError::Archive(e.to_string());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut used: Vec<String> = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let mut entry = base_name(&artifact.filename).to_string();
        let mut n = 1;
        while used.contains(&entry) {
            n += 1;
            entry = format!(
                "{}_{n}.{}",
                OutputNaming::stem(&artifact.filename),
                extension_of(&artifact.filename)
            );
        }
        debug!("zip entry: {}", entry);
        writer.start_file(entry.as_str(), options).map_err(archive_err)?;
        writer
            .write_all(&artifact.bytes)
            .map_err(|e| PdfToolsError::Archive(e.to_string()))?;
        used.push(entry);
    }

    let cursor = writer.finish().map_err(archive_err)?;
    Ok(Artifact::new(zip_name, MEDIA_ZIP, cursor.into_inner()))
}

fn extension_of(name: &str) -> &str {
    let base = base_name(name);
    match base.rfind('.') {
        Some(dot) if dot > 0 => &base[dot + 1..],
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn naming_helpers() {
        assert_eq!(
            OutputNaming::prefixed("extracted_", "dir/report.pdf"),
            "extracted_report.pdf"
        );
        assert_eq!(OutputNaming::suffixed("scan.pdf", "_ocr", "txt"), "scan_ocr.txt");
        assert_eq!(OutputNaming::with_extension("deck.pptx", "pdf"), "deck.pdf");
        assert_eq!(OutputNaming::stem(".hidden"), ".hidden");
        assert_eq!(OutputNaming::stem("a.b.c"), "a.b");
    }

    #[test]
    fn save_artifact_writes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let artifact = Artifact::pdf("edited_x.pdf", b"%PDF-1.7 test".to_vec());
        let path = save_artifact(&artifact, &out).unwrap();

        assert_eq!(path, out.join("edited_x.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 test");
        assert!(!out.join("edited_x.pdf.tmp").exists());
    }

    #[test]
    fn bundle_zip_contains_every_artifact() {
        let artifacts = vec![
            Artifact::pdf("a_page_1.pdf", b"one".to_vec()),
            Artifact::pdf("a_page_2.pdf", b"two".to_vec()),
            Artifact::pdf("a_page_2.pdf", b"dup".to_vec()),
        ];
        let zip = bundle_zip(&artifacts, "pages.zip").unwrap();
        assert_eq!(zip.media_type, MEDIA_ZIP);

        let mut archive = zip::ZipArchive::new(Cursor::new(zip.bytes)).unwrap();
        assert_eq!(archive.len(), 3);
        let mut second = String::new();
        archive
            .by_name("a_page_2_2.pdf")
            .unwrap()
            .read_to_string(&mut second)
            .unwrap();
        assert_eq!(second, "dup");
    }
}
