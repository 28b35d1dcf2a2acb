//! Document information without modifying anything.

use crate::error::PdfToolsError;
use crate::output::DocumentMetadata;
use crate::pipeline::document;
use crate::pipeline::input::InputFile;
use tracing::debug;

/// Read title, author, version, page count and page sizes.
///
/// Encrypted files are reported rather than rejected.
pub fn inspect(input: &InputFile) -> Result<DocumentMetadata, PdfToolsError> {
    match document::load(&input.name, &input.bytes) {
        Ok(doc) => Ok(document::metadata(&doc)),
        Err(PdfToolsError::Encrypted { .. }) => {
            debug!("'{}' is encrypted; reporting header only", input.name);
            let doc = lopdf::Document::load_mem(&input.bytes).map_err(|e| {
                PdfToolsError::CorruptPdf {
                    path: input.path.clone(),
                    detail: e.to_string(),
                }
            })?;
            Ok(DocumentMetadata {
                page_count: doc.get_pages().len(),
                pdf_version: doc.version.clone(),
                is_encrypted: true,
                ..Default::default()
            })
        }
        Err(e) => Err(e),
    }
}
