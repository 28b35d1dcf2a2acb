//! # pdftools
//!
//! Everyday PDF utilities: merge, split, extract, delete and rotate pages,
//! draw annotations, convert to and from images, Office files and text, and
//! recognise text in scans with a vision LLM.
//!
//! ## How a tool runs
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Intake   extension filter, `%PDF-` header check
//!  ├─ 2. State    page flags / rotations / annotations chosen by the user
//!  ├─ 3. Check    precondition on the state (≥1 page selected, …)
//!  ├─ 4. Apply    lopdf page-tree edits, pdfium rendering or OCR
//!  └─ 5. Emit     Artifact { filename, media_type, bytes } → disk or ZIP
//! ```
//!
//! A precondition failure is reported before the document is parsed, and
//! the page state is never changed by a tool, so the caller can fix the
//! selection and try again.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdftools::{DocumentSession, ExtractMode};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = DocumentSession::new();
//!     session.load("report.pdf", std::fs::read("report.pdf")?)?;
//!
//!     let flags = session.flags_mut()?;
//!     flags.toggle(1);
//!     flags.toggle(3);
//!
//!     for artifact in session.extract(ExtractMode::SinglePdf)? {
//!         pdftools::save_artifact(&artifact, std::path::Path::new("out"))?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature     | Default | Description |
//! |-------------|---------|-------------|
//! | `cli`       | on      | The `pdftools` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `tesseract` | off     | Local OCR through tesseract/leptonica instead of a vision LLM |
//!
//! Rendering (PDF → image, OCR of PDFs) needs the pdfium shared library at
//! runtime; point `PDFIUM_LIB_PATH` at it or install it system-wide.

pub mod annotation;
pub mod config;
pub mod emit;
pub mod error;
pub mod messages;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;
pub mod settings;
pub mod state;
pub mod tools;

pub use annotation::{
    Annotation, AnnotationFile, AnnotationKind, AnnotationLayer, CanvasMap, CanvasSpace, Color,
    Geometry, Point, ShapeKind,
};
pub use config::{
    ImageFormat, OcrBackend, PageSeparator, PageSize, PageSpec, ToolConfig, ToolConfigBuilder,
};
pub use emit::{bundle_zip, save_all, save_artifact, Artifact, OutputNaming};
pub use error::{PageError, PdfToolsError};
pub use output::{DocumentMetadata, OcrOutput, OcrPageResult, OcrStats};
pub use pipeline::input::{filter_accepted, read_input, AcceptSet, FileKind, InputFile, Intake};
pub use progress::{NoopProgressCallback, ProgressCallback, ToolProgressCallback};
pub use session::DocumentSession;
pub use settings::{AppSettings, Language, LanguageSetting, SettingsStore};
pub use state::{PageFlags, PageRotations, Rotation};
pub use tools::annotate::apply_annotations;
pub use tools::convert::{
    file_to_pdf, images_to_pdf, office_to_pdf, pdf_to_docx, pdf_to_images, pdf_to_pptx,
    pdf_to_text, pdf_to_xlsx, text_to_pdf,
};
pub use tools::info::inspect;
pub use tools::merge::merge;
pub use tools::ocr::{ocr, ocr_artifact};
pub use tools::organize::{
    delete_pages, extract_pages, rotate_pages, split, ExtractMode, SplitMode,
};
