//! Building blocks shared by the tools.
//!
//! ```text
//! input ──▶ document ──▶ (tools) ──▶ emit
//!   │
//!   ├─▶ render ──▶ encode ──▶ llm ──▶ postprocess      OCR / PDF → image
//!   └─▶ office ──▶ layout ──▶ document                 office / text → PDF
//! ```
//!
//! 1. [`input`]    resolve a path or URL, filter by accepted kind, check `%PDF-`
//! 2. [`document`] lopdf load/save, page subsets, merging, metadata
//! 3. [`layout`]   wrap plain text onto Helvetica pages
//! 4. [`office`]   text in and out of `.docx` / `.xlsx` / `.pptx`
//! 5. [`render`]   rasterise pages with pdfium inside `spawn_blocking`
//! 6. [`encode`]   PNG/JPEG bytes and base64 `ImageData`
//! 7. [`llm`]      vision OCR call with retry/backoff
//! 8. [`postprocess`] deterministic cleanup of OCR text

pub mod document;
pub mod encode;
pub mod input;
pub mod layout;
pub mod llm;
pub mod office;
pub mod postprocess;
pub mod render;
