//! Error types for the pdftools library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PdfToolsError`] — **Fatal**: the operation cannot proceed at all
//!   (bad input file, unmet precondition, unreadable PDF). Returned as
//!   `Err(PdfToolsError)` from every tool entry point. Nothing has been
//!   written and no page state has been changed when one is returned.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed during OCR (render
//!   glitch, transient API error) but the other pages are fine. Stored inside
//!   [`crate::output::OcrPageResult`] so callers can inspect partial success.

use crate::messages::{self, Message};
use crate::settings::Language;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdftools library.
#[derive(Debug, Error)]
pub enum PdfToolsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file does not start with the `%PDF-` header.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    /// The file kind is not accepted by the tool it was given to.
    #[error("Unsupported file type: '{path}' (accepted: {accepted})")]
    UnsupportedFileType { path: PathBuf, accepted: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF is encrypted; page operations would produce an unreadable file.
    #[error("PDF '{path}' is encrypted and cannot be edited")]
    Encrypted { path: PathBuf },

    /// A page number lies outside `[1, total]`.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Rendering pages to images (PDF → image, OCR of PDFs) needs the pdfium\n\
shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/dir-containing-libpdfium.\n\
  • Install pdfium system-wide so the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Precondition errors ───────────────────────────────────────────────
    /// A session tool was applied before any document was loaded.
    #[error("No document loaded")]
    NoDocumentLoaded,

    /// The operation needs at least one marked page.
    #[error("No pages selected")]
    NoPagesSelected,

    /// Every page of the document was marked for deletion.
    #[error("Cannot delete all {total} pages of the document")]
    CannotDeleteAllPages { total: usize },

    /// The rotate tool was applied without any page rotated.
    #[error("No page rotation set")]
    NoRotationSet,

    /// A multi-file tool received too few inputs.
    #[error("At least {needed} files are required (got {got})")]
    NotEnoughFiles { needed: usize, got: usize },

    /// The annotate tool was applied to an empty annotation layer.
    #[error("No annotations to apply")]
    NoAnnotations,

    /// The request is understood but cannot be carried out (e.g. legacy `.ppt`).
    #[error("Unsupported operation: {detail}")]
    UnsupportedOperation { detail: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// A `.docx` / `.xlsx` / `.pptx` package could not be read.
    #[error("Failed to read office document '{path}': {detail}")]
    OfficeParse { path: PathBuf, detail: String },

    /// An input image could not be decoded.
    #[error("Failed to decode image '{path}': {detail}")]
    ImageDecode { path: PathBuf, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The configured LLM provider is not initialised (missing API key etc.).
    #[error("OCR provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Every page failed after all retries; output would be empty.
    #[error("All {total} pages failed after {retries} retries each.\nFirst error: {first_error}")]
    AllPagesFailed {
        total: usize,
        retries: u32,
        first_error: String,
    },

    /// The local OCR engine failed to initialise or run.
    #[error("OCR engine error: {0}")]
    OcrEngine(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Building a ZIP or OOXML package failed.
    #[error("Archive error: {0}")]
    Archive(String),

    // ── Config / environment errors ───────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The settings file could not be read or written.
    #[error("Settings error at '{path}': {detail}")]
    Settings { path: PathBuf, detail: String },

    /// A required platform facility is missing (config directory, runtime).
    #[error("Environment unavailable: {0}")]
    EnvironmentUnavailable(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PdfToolsError {
    /// The message shown to the user in place of a browser `alert()`.
    ///
    /// Precondition failures get a fixed sentence; unreadable files get the
    /// localised sentence followed by the library detail.
    pub fn user_message(&self, lang: Language) -> String {
        let message = match self {
            PdfToolsError::NoDocumentLoaded => Message::NoDocumentLoaded,
            PdfToolsError::NoPagesSelected => Message::NoPagesSelected,
            PdfToolsError::CannotDeleteAllPages { .. } => Message::CannotDeleteAllPages,
            PdfToolsError::NoRotationSet => Message::NoRotationSet,
            PdfToolsError::NoAnnotations => Message::NoAnnotations,
            PdfToolsError::NotEnoughFiles { needed, .. } => {
                return messages::not_enough_files(lang, *needed)
            }
            PdfToolsError::NotAPdf { .. } => Message::NotAPdf,
            PdfToolsError::UnsupportedFileType { .. } => Message::UnsupportedFileType,
            PdfToolsError::UnsupportedOperation { .. } => Message::UnsupportedOperation,
            PdfToolsError::PageOutOfRange { page, total } => {
                return messages::page_out_of_range(lang, *page, *total)
            }
            PdfToolsError::FileNotFound { .. } | PdfToolsError::PermissionDenied { .. } => {
                Message::FileUnreadable
            }
            PdfToolsError::Encrypted { .. } => Message::Encrypted,
            PdfToolsError::CorruptPdf { .. }
            | PdfToolsError::OfficeParse { .. }
            | PdfToolsError::ImageDecode { .. }
            | PdfToolsError::RasterisationFailed { .. } => Message::ProcessingFailed,
            PdfToolsError::ProviderNotConfigured { .. }
            | PdfToolsError::AllPagesFailed { .. }
            | PdfToolsError::OcrEngine(_) => Message::OcrFailed,
            PdfToolsError::PdfiumBindingFailed(_) | PdfToolsError::EnvironmentUnavailable(_) => {
                Message::EnvironmentUnavailable
            }
            _ => Message::GenericFailure,
        };

        let headline = message.text(lang);
        if self.carries_library_detail() {
            format!("{headline}\n{self}")
        } else {
            headline.to_string()
        }
    }

    /// Errors that come from a precondition the user can fix by changing
    /// the page state, as opposed to errors about the file itself.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            PdfToolsError::NoDocumentLoaded
                | PdfToolsError::NoPagesSelected
                | PdfToolsError::CannotDeleteAllPages { .. }
                | PdfToolsError::NoRotationSet
                | PdfToolsError::NotEnoughFiles { .. }
                | PdfToolsError::NoAnnotations
        )
    }

    fn carries_library_detail(&self) -> bool {
        !self.is_precondition()
            && !matches!(
                self,
                PdfToolsError::NotAPdf { .. }
                    | PdfToolsError::UnsupportedFileType { .. }
                    | PdfToolsError::PageOutOfRange { .. }
            )
    }
}

/// A non-fatal error for a single OCR page.
///
/// Stored alongside [`crate::output::OcrPageResult`] when a page fails.
/// The overall run continues unless ALL pages fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// OCR call failed after retries.
    #[error("Page {page}: OCR failed after {retries} retries: {detail}")]
    OcrFailed {
        page: usize,
        retries: u8,
        detail: String,
    },

    /// OCR call timed out.
    #[error("Page {page}: OCR timed out after {secs}s")]
    Timeout { page: usize, secs: u64 },
}
