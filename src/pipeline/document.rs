//! Structural PDF work on top of `lopdf`: load, keep/drop pages, merge,
//! page geometry, serialise, and building fresh documents.
//!
//! Everything here is synchronous and CPU-bound; callers on an async
//! runtime wrap it in `spawn_blocking`.

use crate::error::PdfToolsError;
use crate::output::DocumentMetadata;
use crate::pipeline::input::validate_pdf_header;
use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Fallback page size (A4) when a page has no usable `/MediaBox`.
const DEFAULT_MEDIA_BOX: (f32, f32) = (595.0, 842.0);

/// Parse PDF bytes after the header check, refusing encrypted documents.
pub fn load(name: &str, bytes: &[u8]) -> Result<Document, PdfToolsError> {
    let path = Path::new(name);
    validate_pdf_header(path, bytes)?;

    let doc = Document::load_mem(bytes).map_err(|e| PdfToolsError::CorruptPdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    if doc.is_encrypted() {
        return Err(PdfToolsError::Encrypted {
            path: path.to_path_buf(),
        });
    }

    let pages = doc.get_pages().len();
    if pages == 0 {
        return Err(PdfToolsError::CorruptPdf {
            path: path.to_path_buf(),
            detail: "document has no pages".into(),
        });
    }
    debug!("Loaded '{}': {} pages, PDF {}", name, pages, doc.version);
    Ok(doc)
}

pub fn page_count(doc: &Document) -> usize {
    doc.get_pages().len()
}

/// Serialise a document, dropping objects no longer reachable.
pub fn to_bytes(mut doc: Document) -> Result<Vec<u8>, PdfToolsError> {
    doc.prune_objects();
    doc.compress();
    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| PdfToolsError::Internal(format!("Failed to serialise PDF: {e}")))?;
    Ok(out)
}

/// Keep exactly `keep` (1-based page numbers), preserving original order.
pub fn keep_pages(mut doc: Document, keep: &[usize]) -> Result<Document, PdfToolsError> {
    let total = page_count(&doc);
    let keep: BTreeSet<u32> = keep.iter().map(|&p| p as u32).collect();
    if keep.is_empty() {
        return Err(PdfToolsError::NoPagesSelected);
    }
    if let Some(&bad) = keep.iter().find(|&&p| p == 0 || p as usize > total) {
        return Err(PdfToolsError::PageOutOfRange {
            page: bad as usize,
            total,
        });
    }
    let drop: Vec<u32> = (1..=total as u32).filter(|p| !keep.contains(p)).collect();
    if !drop.is_empty() {
        doc.delete_pages(&drop);
    }
    Ok(doc)
}

/// Append every page of `secondary` to the page tree of `primary`.
pub fn append_document(primary: &mut Document, mut secondary: Document) -> Result<(), PdfToolsError> {
    secondary.renumber_objects_with(primary.max_id + 1);
    let appended: Vec<ObjectId> = secondary.get_pages().into_values().collect();

    primary.objects.extend(secondary.objects);
    primary.max_id = primary.max_id.max(secondary.max_id);

    let pages_root = primary
        .catalog()
        .and_then(|c| c.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| PdfToolsError::Internal(format!("merge: no page tree root: {e}")))?;

    {
        let root = primary
            .get_object_mut(pages_root)
            .and_then(Object::as_dict_mut)
            .map_err(|e| PdfToolsError::Internal(format!("merge: bad page tree root: {e}")))?;
        let kids = root
            .get_mut(b"Kids")
            .and_then(Object::as_array_mut)
            .map_err(|e| PdfToolsError::Internal(format!("merge: page tree has no kids: {e}")))?;
        kids.extend(appended.iter().map(|&id| Object::Reference(id)));
        let count = root.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        root.set("Count", count + appended.len() as i64);
    }

    for page_id in appended {
        // Attributes the old parent supplied by inheritance must now live on the page.
        let inherited = inherited_attributes(primary, page_id);
        if let Ok(page) = primary.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            for (key, value) in inherited {
                if !page.has(&key) {
                    page.set(key, value);
                }
            }
            page.set("Parent", pages_root);
        }
    }
    Ok(())
}

const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    INHERITABLE
        .iter()
        .filter_map(|key| inherited(doc, page_id, key).map(|v| (key.to_vec(), v.clone())))
        .collect()
}

/// Look up `key` on the page, walking up `/Parent` links.
pub fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        let dict = doc.get_object(id).and_then(Object::as_dict).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
        if depth > 64 {
            return None;
        }
    }
    None
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f),
        _ => None,
    }
}

/// `(width, height)` of the page's media box in points.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let resolve = |obj: &Object| -> Option<Vec<f32>> {
        let obj = match obj {
            Object::Reference(id) => doc.get_object(*id).ok()?,
            other => other,
        };
        let arr = obj.as_array().ok()?;
        if arr.len() != 4 {
            return None;
        }
        arr.iter().map(number).collect()
    };
    inherited(doc, page_id, b"MediaBox")
        .and_then(resolve)
        .map(|b| ((b[2] - b[0]).abs(), (b[3] - b[1]).abs()))
        .filter(|(w, h)| *w > 0.0 && *h > 0.0)
        .unwrap_or(DEFAULT_MEDIA_BOX)
}

/// Current `/Rotate` of a page (inherited), normalised to `0..360`.
pub fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited(doc, page_id, b"Rotate")
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(0)
        .rem_euclid(360)
}

/// Give the page its own direct `/Resources` dictionary and return it.
///
/// Shared or inherited resources are copied so edits to one page never
/// leak into another.
pub fn page_resources_mut(
    doc: &mut Document,
    page_id: ObjectId,
) -> Result<&mut Dictionary, PdfToolsError> {
    let resolved: Dictionary = match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(d)) => d.clone(),
        Some(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(Object::as_dict)
            .cloned()
            .unwrap_or_default(),
        _ => Dictionary::new(),
    };

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfToolsError::Internal(format!("page {page_id:?} is not a dictionary: {e}")))?;
    page.set("Resources", Object::Dictionary(resolved));
    page.get_mut(b"Resources")
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfToolsError::Internal(e.to_string()))
}

/// Get (creating if needed) a named sub-dictionary such as `/Font` or `/ExtGState`.
pub fn sub_dict_mut<'a>(
    parent: &'a mut Dictionary,
    key: &[u8],
) -> Result<&'a mut Dictionary, PdfToolsError> {
    let direct = match parent.get(key) {
        Ok(Object::Dictionary(_)) => None,
        _ => Some(Dictionary::new()),
    };
    if let Some(fresh) = direct {
        parent.set(key.to_vec(), Object::Dictionary(fresh));
    }
    parent
        .get_mut(key)
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfToolsError::Internal(e.to_string()))
}

/// Read `/Info` and page geometry without rendering.
pub fn metadata(doc: &Document) -> DocumentMetadata {
    let info = doc
        .trailer
        .get(b"Info")
        .and_then(|o| match o {
            Object::Reference(id) => doc.get_object(*id),
            other => Ok(other),
        })
        .and_then(Object::as_dict)
        .ok();

    let field = |key: &[u8]| -> Option<String> {
        let value = info?.get(key).ok()?;
        let bytes = value.as_str().ok()?;
        let text = decode_text_string(bytes);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    };

    let pages = doc.get_pages();
    DocumentMetadata {
        title: field(b"Title"),
        author: field(b"Author"),
        subject: field(b"Subject"),
        creator: field(b"Creator"),
        producer: field(b"Producer"),
        creation_date: field(b"CreationDate"),
        modification_date: field(b"ModDate"),
        page_count: pages.len(),
        pdf_version: doc.version.clone(),
        is_encrypted: doc.is_encrypted(),
        page_sizes: pages.values().map(|&id| page_size(doc, id)).collect(),
    }
}

/// PDF text strings are UTF-16BE with a BOM, or PDFDocEncoding (≈ Latin-1).
fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Accumulates pages for a brand-new document.
pub struct DocumentBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Add a stream or dictionary object and return its id.
    pub fn add_object(&mut self, object: impl Into<Object>) -> ObjectId {
        self.doc.add_object(object)
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page of the given size drawing `content` with `resources`.
    pub fn add_page(
        &mut self,
        width: f32,
        height: f32,
        content: Content,
        resources: Dictionary,
    ) -> Result<ObjectId, PdfToolsError> {
        let encoded = content
            .encode()
            .map_err(|e| PdfToolsError::Internal(format!("content encoding failed: {e}")))?;
        let mut stream = Stream::new(dictionary! {}, encoded);
        // An uncompressible stream is still valid as-is.
        let _ = stream.compress();
        let content_id = self.doc.add_object(stream);

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id.into());
        Ok(page_id)
    }

    pub fn finish(mut self) -> Result<Vec<u8>, PdfToolsError> {
        if self.kids.is_empty() {
            return Err(PdfToolsError::Internal("document has no pages".into()));
        }
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        to_bytes(self.doc)
    }
}

/// Build small test documents whose pages carry their page number as text.
#[cfg(test)]
pub(crate) fn numbered_pdf(pages: usize) -> Vec<u8> {
    use lopdf::content::Operation;

    let mut builder = DocumentBuilder::new();
    let font_id = builder.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {n}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let resources = dictionary! { "Font" => dictionary! { "F1" => font_id } };
        builder
            .add_page(612.0, 792.0, content, resources)
            .expect("add page");
    }
    builder.finish().expect("finish")
}
