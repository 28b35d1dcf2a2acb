//! Page-level reorganisation: extract, delete, rotate, split.
//!
//! Each function checks its precondition against the page state first and
//! only then parses the document, so a rejected request never touches the
//! PDF library. The input bytes are never modified.

use crate::emit::{Artifact, OutputNaming};
use crate::error::PdfToolsError;
use crate::pipeline::document;
use crate::state::{PageFlags, PageRotations};
use lopdf::{Document, Object};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtractMode {
    /// One PDF holding every selected page.
    #[default]
    SinglePdf,
    /// One PDF per selected page.
    SeparateFiles,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMode {
    /// One file per page.
    EveryPage,
    /// Consecutive chunks of `n` pages; the last chunk may be shorter.
    EveryN(usize),
    /// Inclusive 1-based ranges, one file each, in the order given.
    Ranges(Vec<(usize, usize)>),
    /// One file per marked page.
    Selected(PageFlags),
}

fn check_state_matches(flags_total: usize, doc: &Document) -> Result<usize, PdfToolsError> {
    let total = document::page_count(doc);
    if flags_total != total {
        return Err(PdfToolsError::InvalidConfig(format!(
            "page state covers {flags_total} pages but the document has {total}"
        )));
    }
    Ok(total)
}

fn page_subset(doc: &Document, pages: &[usize]) -> Result<Vec<u8>, PdfToolsError> {
    let kept = document::keep_pages(doc.clone(), pages)?;
    document::to_bytes(kept)
}

fn page_file_name(name: &str, page: usize) -> String {
    format!("{}_page_{page}.pdf", OutputNaming::stem(name))
}

/// Copy the selected pages into a new document (or one per page).
pub fn extract_pages(
    bytes: &[u8],
    name: &str,
    selected: &PageFlags,
    mode: ExtractMode,
) -> Result<Vec<Artifact>, PdfToolsError> {
    if selected.is_empty() {
        return Err(PdfToolsError::NoPagesSelected);
    }
    let doc = document::load(name, bytes)?;
    check_state_matches(selected.total(), &doc)?;
    let pages = selected.marked();
    info!("Extracting {} of {} pages from '{}'", pages.len(), selected.total(), name);

    match mode {
        ExtractMode::SinglePdf => {
            let out = page_subset(&doc, &pages)?;
            Ok(vec![Artifact::pdf(
                OutputNaming::prefixed("extracted_", name),
                out,
            )])
        }
        ExtractMode::SeparateFiles => pages
            .iter()
            .map(|&p| Ok(Artifact::pdf(page_file_name(name, p), page_subset(&doc, &[p])?)))
            .collect(),
    }
}

/// Remove the marked pages; the remaining pages keep their order.
pub fn delete_pages(bytes: &[u8], name: &str, marked: &PageFlags) -> Result<Artifact, PdfToolsError> {
    if marked.is_empty() {
        return Err(PdfToolsError::NoPagesSelected);
    }
    if marked.count() == marked.total() {
        return Err(PdfToolsError::CannotDeleteAllPages {
            total: marked.total(),
        });
    }
    let doc = document::load(name, bytes)?;
    check_state_matches(marked.total(), &doc)?;
    info!("Deleting pages {:?} from '{}'", marked.marked(), name);

    let out = page_subset(&doc, &marked.unmarked())?;
    Ok(Artifact::pdf(OutputNaming::prefixed("edited_", name), out))
}

/// Add each page's pending rotation to its `/Rotate` entry.
pub fn rotate_pages(
    bytes: &[u8],
    name: &str,
    rotations: &PageRotations,
) -> Result<Artifact, PdfToolsError> {
    if !rotations.any_rotated() {
        return Err(PdfToolsError::NoRotationSet);
    }
    let mut doc = document::load(name, bytes)?;
    check_state_matches(rotations.total(), &doc)?;
    let pages = doc.get_pages();

    for (page, rotation) in rotations.rotated_pages() {
        let page_id = pages[&(page as u32)];
        let updated = (document::page_rotation(&doc, page_id) + rotation.degrees()).rem_euclid(360);
        let dict = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| PdfToolsError::CorruptPdf {
                path: name.into(),
                detail: format!("page {page}: {e}"),
            })?;
        dict.set("Rotate", updated);
        debug!("Page {} rotated by {} → /Rotate {}", page, rotation, updated);
    }

    info!("Rotated {} pages of '{}'", rotations.rotated_pages().len(), name);
    Ok(Artifact::pdf(
        OutputNaming::prefixed("rotated_", name),
        document::to_bytes(doc)?,
    ))
}

/// Break a document into several.
pub fn split(bytes: &[u8], name: &str, mode: &SplitMode) -> Result<Vec<Artifact>, PdfToolsError> {
    if let SplitMode::Selected(flags) = mode {
        if flags.is_empty() {
            return Err(PdfToolsError::NoPagesSelected);
        }
    }
    if let SplitMode::Ranges(ranges) = mode {
        if ranges.is_empty() {
            return Err(PdfToolsError::NoPagesSelected);
        }
    }

    let doc = document::load(name, bytes)?;
    let total = document::page_count(&doc);
    let stem = OutputNaming::stem(name);

    let parts: Vec<(String, Vec<usize>)> = match mode {
        SplitMode::EveryPage => (1..=total).map(|p| (page_file_name(name, p), vec![p])).collect(),
        SplitMode::EveryN(n) => {
            if *n == 0 {
                return Err(PdfToolsError::InvalidConfig("split size must be ≥ 1".into()));
            }
            (1..=total)
                .collect::<Vec<_>>()
                .chunks(*n)
                .enumerate()
                .map(|(i, chunk)| (format!("{stem}_part_{}.pdf", i + 1), chunk.to_vec()))
                .collect()
        }
        SplitMode::Ranges(ranges) => {
            let mut parts = Vec::with_capacity(ranges.len());
            for (i, &(from, to)) in ranges.iter().enumerate() {
                if from == 0 || from > total {
                    return Err(PdfToolsError::PageOutOfRange { page: from, total });
                }
                if to < from || to > total {
                    return Err(PdfToolsError::PageOutOfRange { page: to, total });
                }
                parts.push((format!("{stem}_part_{}.pdf", i + 1), (from..=to).collect()));
            }
            parts
        }
        SplitMode::Selected(flags) => {
            check_state_matches(flags.total(), &doc)?;
            flags
                .marked()
                .into_iter()
                .map(|p| (page_file_name(name, p), vec![p]))
                .collect()
        }
    };

    info!("Splitting '{}' into {} files", name, parts.len());
    parts
        .into_iter()
        .map(|(filename, pages)| Ok(Artifact::pdf(filename, page_subset(&doc, &pages)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::document::numbered_pdf;
    use crate::state::Rotation;

    fn pages_of(artifact: &Artifact) -> Vec<String> {
        let doc = document::load(&artifact.filename, &artifact.bytes).unwrap();
        (1..=document::page_count(&doc) as u32)
            .map(|p| doc.extract_text(&[p]).unwrap().trim().to_string())
            .collect()
    }

    #[test]
    fn extract_with_nothing_selected_is_rejected() {
        for n in [1, 3, 7] {
            let err = extract_pages(b"irrelevant", "a.pdf", &PageFlags::new(n), ExtractMode::SinglePdf)
                .unwrap_err();
            assert!(matches!(err, PdfToolsError::NoPagesSelected));
        }
    }

    #[test]
    fn extract_single_pdf_keeps_order() {
        let pdf = numbered_pdf(3);
        let mut flags = PageFlags::new(3);
        flags.toggle(3);
        flags.toggle(1);
        let out = extract_pages(&pdf, "doc.pdf", &flags, ExtractMode::SinglePdf).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].filename, "extracted_doc.pdf");
        assert_eq!(pages_of(&out[0]), vec!["Page 1", "Page 3"]);
    }

    #[test]
    fn extract_separate_files() {
        let pdf = numbered_pdf(4);
        let flags = PageFlags::from_spec(4, &crate::config::PageSpec::Set(vec![2, 4]));
        let out = extract_pages(&pdf, "doc.pdf", &flags, ExtractMode::SeparateFiles).unwrap();
        let names: Vec<_> = out.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["doc_page_2.pdf", "doc_page_4.pdf"]);
        assert_eq!(pages_of(&out[1]), vec!["Page 4"]);
    }

    #[test]
    fn delete_all_pages_is_rejected() {
        let mut flags = PageFlags::new(4);
        flags.select_all();
        let err = delete_pages(b"irrelevant", "a.pdf", &flags).unwrap_err();
        assert!(matches!(err, PdfToolsError::CannotDeleteAllPages { total: 4 }));
    }

    #[test]
    fn delete_nothing_is_rejected() {
        let err = delete_pages(b"irrelevant", "a.pdf", &PageFlags::new(2)).unwrap_err();
        assert!(matches!(err, PdfToolsError::NoPagesSelected));
    }

    #[test]
    fn delete_all_but_one_leaves_one_page() {
        let pdf = numbered_pdf(3);
        let mut flags = PageFlags::new(3);
        flags.toggle(1);
        flags.toggle(3);
        let out = delete_pages(&pdf, "doc.pdf", &flags).unwrap();
        assert_eq!(out.filename, "edited_doc.pdf");
        assert_eq!(pages_of(&out), vec!["Page 2"]);
    }

    #[test]
    fn mismatched_page_state_is_rejected() {
        let pdf = numbered_pdf(3);
        let mut flags = PageFlags::new(5);
        flags.toggle(1);
        let err = extract_pages(&pdf, "doc.pdf", &flags, ExtractMode::SinglePdf).unwrap_err();
        assert!(matches!(err, PdfToolsError::InvalidConfig(_)));
    }

    #[test]
    fn rotate_without_rotation_is_rejected() {
        let err = rotate_pages(b"irrelevant", "a.pdf", &PageRotations::new(2)).unwrap_err();
        assert!(matches!(err, PdfToolsError::NoRotationSet));
    }

    #[test]
    fn rotate_adds_to_existing_rotation() {
        let pdf = numbered_pdf(2);
        let mut rotations = PageRotations::new(2);
        rotations.set(2, Rotation::R270);
        let once = rotate_pages(&pdf, "doc.pdf", &rotations).unwrap();
        assert_eq!(once.filename, "rotated_doc.pdf");

        let twice = rotate_pages(&once.bytes, "doc.pdf", &rotations).unwrap();
        let doc = document::load("r.pdf", &twice.bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(document::page_rotation(&doc, pages[&1]), 0);
        assert_eq!(document::page_rotation(&doc, pages[&2]), 180);
    }

    #[test]
    fn split_every_n() {
        let pdf = numbered_pdf(5);
        let out = split(&pdf, "doc.pdf", &SplitMode::EveryN(2)).unwrap();
        let names: Vec<_> = out.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["doc_part_1.pdf", "doc_part_2.pdf", "doc_part_3.pdf"]);
        assert_eq!(pages_of(&out[2]), vec!["Page 5"]);
    }

    #[test]
    fn split_ranges_checks_bounds() {
        let pdf = numbered_pdf(3);
        let err = split(&pdf, "doc.pdf", &SplitMode::Ranges(vec![(2, 4)])).unwrap_err();
        assert!(matches!(err, PdfToolsError::PageOutOfRange { page: 4, total: 3 }));

        let out = split(&pdf, "doc.pdf", &SplitMode::Ranges(vec![(2, 3), (1, 1)])).unwrap();
        assert_eq!(pages_of(&out[0]), vec!["Page 2", "Page 3"]);
        assert_eq!(pages_of(&out[1]), vec!["Page 1"]);
    }

    #[test]
    fn split_every_page() {
        let out = split(&numbered_pdf(3), "doc.pdf", &SplitMode::EveryPage).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].filename, "doc_page_1.pdf");
    }
}
