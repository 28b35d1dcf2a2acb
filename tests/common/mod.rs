//! Fixture helpers shared by the integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object};
use pdftools::pipeline::document::DocumentBuilder;

/// A US-Letter PDF whose page `n` reads "Page n".
pub fn numbered_pdf(pages: usize) -> Vec<u8> {
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

/// The "Page n" label on every page, in document order.
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("load");
    let total = doc.get_pages().len() as u32;
    (1..=total)
        .map(|n| doc.extract_text(&[n]).expect("text").trim().to_string())
        .collect()
}

/// `/Rotate` of every page, 0 when absent.
pub fn page_rotations(bytes: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(bytes).expect("load");
    doc.get_pages()
        .values()
        .map(|id| {
            doc.get_dictionary(*id)
                .ok()
                .and_then(|d| d.get(b"Rotate").ok())
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(0)
        })
        .collect()
}
