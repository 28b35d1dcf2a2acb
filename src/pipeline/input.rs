//! Input intake: resolve a path or URL, classify it, and read its bytes.
//!
//! URL inputs are downloaded into a `TempDir` that lives as long as the
//! returned [`ResolvedInput`]. PDF inputs are checked for the `%PDF-`
//! header here, before any parser sees them.

use crate::error::PdfToolsError;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// The five bytes every PDF file starts with.
pub const PDF_MAGIC: &[u8; 5] = b"%PDF-";

/// Raster formats accepted wherever images are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Webp,
    Tiff,
}

/// File kind, detected from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileKind {
    Pdf,
    Word,
    LegacyWord,
    Excel,
    LegacyExcel,
    PowerPoint,
    LegacyPowerPoint,
    Image(ImageKind),
    Text,
    Unknown,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => FileKind::Pdf,
            "docx" => FileKind::Word,
            "doc" => FileKind::LegacyWord,
            "xlsx" => FileKind::Excel,
            "xls" => FileKind::LegacyExcel,
            "pptx" => FileKind::PowerPoint,
            "ppt" => FileKind::LegacyPowerPoint,
            "png" => FileKind::Image(ImageKind::Png),
            "jpg" | "jpeg" => FileKind::Image(ImageKind::Jpeg),
            "gif" => FileKind::Image(ImageKind::Gif),
            "bmp" => FileKind::Image(ImageKind::Bmp),
            "webp" => FileKind::Image(ImageKind::Webp),
            "tif" | "tiff" => FileKind::Image(ImageKind::Tiff),
            "txt" => FileKind::Text,
            _ => FileKind::Unknown,
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileKind::LegacyWord => "application/msword",
            FileKind::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            FileKind::LegacyExcel => "application/vnd.ms-excel",
            FileKind::PowerPoint => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            FileKind::LegacyPowerPoint => "application/vnd.ms-powerpoint",
            FileKind::Image(ImageKind::Png) => "image/png",
            FileKind::Image(ImageKind::Jpeg) => "image/jpeg",
            FileKind::Image(ImageKind::Gif) => "image/gif",
            FileKind::Image(ImageKind::Bmp) => "image/bmp",
            FileKind::Image(ImageKind::Webp) => "image/webp",
            FileKind::Image(ImageKind::Tiff) => "image/tiff",
            FileKind::Text => "text/plain",
            FileKind::Unknown => "application/octet-stream",
        }
    }

    pub fn is_image(self) -> bool {
        matches!(self, FileKind::Image(_))
    }
}

/// The set of file kinds a tool accepts (the file picker's `accept` attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptSet {
    pdf: bool,
    office: bool,
    images: bool,
    text: bool,
}

impl AcceptSet {
    pub const PDF: AcceptSet = AcceptSet {
        pdf: true,
        office: false,
        images: false,
        text: false,
    };
    pub const OFFICE: AcceptSet = AcceptSet {
        pdf: false,
        office: true,
        images: false,
        text: false,
    };
    pub const IMAGES: AcceptSet = AcceptSet {
        pdf: false,
        office: false,
        images: true,
        text: false,
    };
    pub const TEXT: AcceptSet = AcceptSet {
        pdf: false,
        office: false,
        images: false,
        text: true,
    };

    pub const fn union(self, other: AcceptSet) -> AcceptSet {
        AcceptSet {
            pdf: self.pdf || other.pdf,
            office: self.office || other.office,
            images: self.images || other.images,
            text: self.text || other.text,
        }
    }

    pub fn accepts(self, kind: FileKind) -> bool {
        match kind {
            FileKind::Pdf => self.pdf,
            FileKind::Word
            | FileKind::LegacyWord
            | FileKind::Excel
            | FileKind::LegacyExcel
            | FileKind::PowerPoint
            | FileKind::LegacyPowerPoint => self.office,
            FileKind::Image(_) => self.images,
            FileKind::Text => self.text,
            FileKind::Unknown => false,
        }
    }
}

impl fmt::Display for AcceptSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.pdf {
            parts.push(".pdf");
        }
        if self.office {
            parts.push(".doc,.docx,.xls,.xlsx,.ppt,.pptx");
        }
        if self.images {
            parts.push("image/*");
        }
        if self.text {
            parts.push(".txt");
        }
        f.write_str(&parts.join(","))
    }
}

/// Result of filtering a batch of candidate paths.
#[derive(Debug, Default)]
pub struct Intake {
    pub accepted: Vec<PathBuf>,
    pub rejected: Vec<PathBuf>,
}

/// Split `paths` into accepted and rejected by kind, keeping input order.
///
/// Rejected files are logged and otherwise skipped.
pub fn filter_accepted<P: AsRef<Path>>(paths: &[P], accept: AcceptSet) -> Intake {
    let mut intake = Intake::default();
    for p in paths {
        let path = p.as_ref().to_path_buf();
        if accept.accepts(FileKind::from_path(&path)) {
            intake.accepted.push(path);
        } else {
            warn!("Skipping '{}': not one of {}", path.display(), accept);
            intake.rejected.push(path);
        }
    }
    intake
}

/// Reject anything that does not begin with `%PDF-`.
pub fn validate_pdf_header(path: &Path, bytes: &[u8]) -> Result<(), PdfToolsError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(PdfToolsError::NotAPdf {
            path: path.to_path_buf(),
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }
    Ok(())
}

/// A file read fully into memory.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Display name (file name only), used to derive output names.
    pub name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub kind: FileKind,
}

impl InputFile {
    /// Wrap bytes that did not come from disk (tests, embedding callers).
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let path = PathBuf::from(&name);
        let kind = FileKind::from_path(&path);
        Self {
            name,
            path,
            bytes,
            kind,
        }
    }
}

/// The resolved input: either a local path or a downloaded temp file.
pub enum ResolvedInput {
    Local(PathBuf),
    /// The `TempDir` is kept alive until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or URL to a local file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, PdfToolsError> {
    if input.trim().is_empty() {
        return Err(PdfToolsError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Resolve, check the kind against `accept`, and read the whole file.
pub async fn read_input(
    input: &str,
    accept: AcceptSet,
    download_timeout_secs: u64,
) -> Result<InputFile, PdfToolsError> {
    let resolved = resolve_input(input, download_timeout_secs).await?;
    let path = resolved.path().to_path_buf();
    let kind = FileKind::from_path(&path);
    if !accept.accepts(kind) {
        return Err(PdfToolsError::UnsupportedFileType {
            path,
            accepted: accept.to_string(),
        });
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| io_error_for(&path, e))?;

    if kind == FileKind::Pdf {
        validate_pdf_header(&path, &bytes)?;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    debug!("Read '{}' ({:?}, {} bytes)", name, kind, bytes.len());

    Ok(InputFile {
        name,
        path,
        bytes,
        kind,
    })
}

fn io_error_for(path: &Path, e: std::io::Error) -> PdfToolsError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => PdfToolsError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => PdfToolsError::FileNotFound {
            path: path.to_path_buf(),
        },
    }
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, PdfToolsError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(PdfToolsError::FileNotFound { path });
    }

    std::fs::File::open(&path).map_err(|e| io_error_for(&path, e))?;

    debug!("Resolved local input: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, PdfToolsError> {
    info!("Downloading {}", url);

    let failed = |reason: String| PdfToolsError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            PdfToolsError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = filename_from_url(url);
    let temp_dir = TempDir::new().map_err(|e| PdfToolsError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| PdfToolsError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment when it looks like a file name, else `downloaded.pdf`.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn kind_from_extension_is_case_insensitive() {
        assert_eq!(FileKind::from_path(Path::new("A.PDF")), FileKind::Pdf);
        assert_eq!(
            FileKind::from_path(Path::new("photo.JPEG")),
            FileKind::Image(ImageKind::Jpeg)
        );
        assert_eq!(FileKind::from_path(Path::new("old.ppt")), FileKind::LegacyPowerPoint);
        assert_eq!(FileKind::from_path(Path::new("noext")), FileKind::Unknown);
    }

    #[test]
    fn accept_sets() {
        assert!(AcceptSet::PDF.accepts(FileKind::Pdf));
        assert!(!AcceptSet::PDF.accepts(FileKind::Word));
        assert!(AcceptSet::OFFICE.accepts(FileKind::LegacyExcel));
        assert!(AcceptSet::IMAGES.accepts(FileKind::Image(ImageKind::Webp)));
        let mixed = AcceptSet::PDF.union(AcceptSet::IMAGES);
        assert!(mixed.accepts(FileKind::Pdf));
        assert!(mixed.accepts(FileKind::Image(ImageKind::Png)));
        assert!(!mixed.accepts(FileKind::Text));
        assert_eq!(AcceptSet::PDF.to_string(), ".pdf");
    }

    #[test]
    fn filter_keeps_order_and_reports_rejects() {
        let intake = filter_accepted(&["b.pdf", "notes.txt", "a.pdf"], AcceptSet::PDF);
        assert_eq!(
            intake.accepted,
            vec![PathBuf::from("b.pdf"), PathBuf::from("a.pdf")]
        );
        assert_eq!(intake.rejected, vec![PathBuf::from("notes.txt")]);
    }

    #[test]
    fn header_check() {
        let p = Path::new("x.pdf");
        assert!(validate_pdf_header(p, b"%PDF-1.7\n...").is_ok());
        assert!(matches!(
            validate_pdf_header(p, b"hello world"),
            Err(PdfToolsError::NotAPdf { .. })
        ));
        assert!(validate_pdf_header(p, b"%PDF").is_err());
        assert!(validate_pdf_header(p, b"").is_err());
    }

    #[test]
    fn filename_from_url_falls_back() {
        assert_eq!(filename_from_url("https://x.org/files/a.pdf"), "a.pdf");
        assert_eq!(filename_from_url("https://x.org/download"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn read_input_rejects_renamed_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, "just some notes").unwrap();

        let err = read_input(path.to_str().unwrap(), AcceptSet::PDF, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PdfToolsError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn read_input_rejects_wrong_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hi").unwrap();

        let err = read_input(path.to_str().unwrap(), AcceptSet::PDF, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PdfToolsError::UnsupportedFileType { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = read_input("/definitely/not/here.pdf", AcceptSet::PDF, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PdfToolsError::FileNotFound { .. }));
    }
}
