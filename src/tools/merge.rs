//! Concatenate several PDFs into one.

use crate::config::ToolConfig;
use crate::emit::Artifact;
use crate::error::PdfToolsError;
use crate::pipeline::document;
use crate::pipeline::input::InputFile;
use crate::progress;
use tracing::info;

pub const MERGED_NAME: &str = "merged.pdf";

/// Merge `inputs` in the order given; pages keep their order within each file.
pub fn merge(inputs: &[InputFile], config: &ToolConfig) -> Result<Artifact, PdfToolsError> {
    if inputs.len() < 2 {
        return Err(PdfToolsError::NotEnoughFiles {
            needed: 2,
            got: inputs.len(),
        });
    }

    let cb = progress::resolve(&config.progress_callback);
    let total = inputs.len();
    cb.on_start("merge", total);

    let mut merged: Option<lopdf::Document> = None;
    for (i, input) in inputs.iter().enumerate() {
        cb.on_item_start(i + 1, total);
        let doc = document::load(&input.name, &input.bytes)?;
        info!(
            "Merging '{}' ({} pages)",
            input.name,
            document::page_count(&doc)
        );
        match merged.as_mut() {
            None => merged = Some(doc),
            Some(target) => document::append_document(target, doc)?,
        }
        cb.on_item_complete(i + 1, total);
    }

    let merged = merged.ok_or_else(|| PdfToolsError::Internal("nothing merged".into()))?;
    let pages = document::page_count(&merged);
    let bytes = document::to_bytes(merged)?;
    cb.on_complete(total, total);
    info!("Merged {} files into {} pages", total, pages);

    Ok(Artifact::pdf(MERGED_NAME, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::document::numbered_pdf;

    #[test]
    fn single_input_is_rejected() {
        let inputs = vec![InputFile::from_bytes("a.pdf", numbered_pdf(1))];
        let err = merge(&inputs, &ToolConfig::default()).unwrap_err();
        assert!(matches!(err, PdfToolsError::NotEnoughFiles { needed: 2, got: 1 }));
    }

    #[test]
    fn merge_keeps_input_order() {
        let inputs = vec![
            InputFile::from_bytes("a.pdf", numbered_pdf(2)),
            InputFile::from_bytes("b.pdf", numbered_pdf(1)),
            InputFile::from_bytes("c.pdf", numbered_pdf(3)),
        ];
        let out = merge(&inputs, &ToolConfig::default()).unwrap();
        assert_eq!(out.filename, "merged.pdf");

        let doc = document::load("m.pdf", &out.bytes).unwrap();
        assert_eq!(document::page_count(&doc), 6);
        let third = doc.extract_text(&[3]).unwrap();
        assert!(third.contains("Page 1"), "got {third}");
        let sixth = doc.extract_text(&[6]).unwrap();
        assert!(sixth.contains("Page 3"), "got {sixth}");
    }

    #[test]
    fn a_bad_input_fails_the_whole_merge() {
        let inputs = vec![
            InputFile::from_bytes("a.pdf", numbered_pdf(1)),
            InputFile::from_bytes("b.pdf", b"not a pdf".to_vec()),
        ];
        let err = merge(&inputs, &ToolConfig::default()).unwrap_err();
        assert!(matches!(err, PdfToolsError::NotAPdf { .. }));
    }
}
