//! One loaded document plus the page state the user builds up for it.
//!
//! Loading a file creates fresh page flags, rotations and an empty
//! annotation layer sized to the document. Replacing or removing the file
//! throws all of that away. Tools read the state but never change it, so
//! after a rejected request the user can adjust the selection and retry.

use crate::annotation::{AnnotationLayer, CanvasMap};
use crate::emit::Artifact;
use crate::error::PdfToolsError;
use crate::output::DocumentMetadata;
use crate::pipeline::document;
use crate::pipeline::input::InputFile;
use crate::state::{PageFlags, PageRotations};
use crate::tools::annotate;
use crate::tools::organize::{self, ExtractMode, SplitMode};
use tracing::info;

#[derive(Debug)]
struct Loaded {
    name: String,
    bytes: Vec<u8>,
    flags: PageFlags,
    rotations: PageRotations,
    annotations: AnnotationLayer,
}

#[derive(Debug, Default)]
pub struct DocumentSession {
    current: Option<Loaded>,
}

impl DocumentSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `bytes` as the session document and return its page count.
    ///
    /// A file that fails the header check or cannot be parsed leaves the
    /// previously loaded document (if any) in place.
    pub fn load(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<usize, PdfToolsError> {
        let name = name.into();
        let total = document::page_count(&document::load(&name, &bytes)?);

        info!("Loaded '{}' ({} pages)", name, total);
        self.current = Some(Loaded {
            name,
            bytes,
            flags: PageFlags::new(total),
            rotations: PageRotations::new(total),
            annotations: AnnotationLayer::new(),
        });
        Ok(total)
    }

    pub fn load_file(&mut self, input: InputFile) -> Result<usize, PdfToolsError> {
        self.load(input.name, input.bytes)
    }

    /// Drop the document and every piece of state attached to it.
    pub fn remove(&mut self) {
        if let Some(doc) = self.current.take() {
            info!("Removed '{}'", doc.name);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.current.as_ref().map(|d| d.name.as_str())
    }

    pub fn page_count(&self) -> usize {
        self.current.as_ref().map_or(0, |d| d.flags.total())
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|d| d.bytes.as_slice())
    }

    fn loaded(&self) -> Result<&Loaded, PdfToolsError> {
        self.current.as_ref().ok_or(PdfToolsError::NoDocumentLoaded)
    }

    fn loaded_mut(&mut self) -> Result<&mut Loaded, PdfToolsError> {
        self.current.as_mut().ok_or(PdfToolsError::NoDocumentLoaded)
    }

    pub fn flags(&self) -> Result<&PageFlags, PdfToolsError> {
        Ok(&self.loaded()?.flags)
    }

    pub fn flags_mut(&mut self) -> Result<&mut PageFlags, PdfToolsError> {
        Ok(&mut self.loaded_mut()?.flags)
    }

    pub fn rotations(&self) -> Result<&PageRotations, PdfToolsError> {
        Ok(&self.loaded()?.rotations)
    }

    pub fn rotations_mut(&mut self) -> Result<&mut PageRotations, PdfToolsError> {
        Ok(&mut self.loaded_mut()?.rotations)
    }

    pub fn annotations(&self) -> Result<&AnnotationLayer, PdfToolsError> {
        Ok(&self.loaded()?.annotations)
    }

    pub fn annotations_mut(&mut self) -> Result<&mut AnnotationLayer, PdfToolsError> {
        Ok(&mut self.loaded_mut()?.annotations)
    }

    pub fn metadata(&self) -> Result<DocumentMetadata, PdfToolsError> {
        let doc = self.loaded()?;
        Ok(document::metadata(&document::load(&doc.name, &doc.bytes)?))
    }

    /// Extract the selected pages.
    pub fn extract(&self, mode: ExtractMode) -> Result<Vec<Artifact>, PdfToolsError> {
        let doc = self.loaded()?;
        organize::extract_pages(&doc.bytes, &doc.name, &doc.flags, mode)
    }

    /// Delete the marked pages.
    pub fn delete_marked(&self) -> Result<Artifact, PdfToolsError> {
        let doc = self.loaded()?;
        organize::delete_pages(&doc.bytes, &doc.name, &doc.flags)
    }

    pub fn rotate(&self) -> Result<Artifact, PdfToolsError> {
        let doc = self.loaded()?;
        organize::rotate_pages(&doc.bytes, &doc.name, &doc.rotations)
    }

    pub fn split(&self, mode: &SplitMode) -> Result<Vec<Artifact>, PdfToolsError> {
        let doc = self.loaded()?;
        organize::split(&doc.bytes, &doc.name, mode)
    }

    pub fn annotate(&self, canvas: &CanvasMap) -> Result<Artifact, PdfToolsError> {
        let doc = self.loaded()?;
        annotate::apply_annotations(&doc.bytes, &doc.name, &doc.annotations, canvas)
    }
}
