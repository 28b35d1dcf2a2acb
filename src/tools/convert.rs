//! Format conversion to and from PDF.
//!
//! Into PDF: images (one page each), `.docx`/`.xlsx`/`.pptx` text, plain text.
//! Out of PDF: page images via pdfium, and text-only `.txt`/`.docx`/`.xlsx`/
//! `.pptx` built from lopdf's text extraction. The text outputs carry no
//! layout, fonts or images.

use crate::config::{PageSpec, ToolConfig};
use crate::emit::{Artifact, OutputNaming, MEDIA_DOCX, MEDIA_PPTX, MEDIA_TEXT, MEDIA_XLSX};
use crate::error::PdfToolsError;
use crate::pipeline::document::{self, DocumentBuilder};
use crate::pipeline::input::{AcceptSet, FileKind, ImageKind, InputFile};
use crate::pipeline::layout::{Block, TextLayout};
use crate::pipeline::{encode, office, render};
use crate::progress;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, ObjectId, Stream};
use tracing::{debug, info, warn};

pub const IMAGES_PDF_NAME: &str = "images.pdf";

// ── Into PDF ────────────────────────────────────────────────────────────────

/// One page per image, each fitted and centred inside the page margins.
pub fn images_to_pdf(images: &[InputFile], config: &ToolConfig) -> Result<Artifact, PdfToolsError> {
    if images.is_empty() {
        return Err(PdfToolsError::NotEnoughFiles { needed: 1, got: 0 });
    }
    if let Some(other) = images.iter().find(|f| !f.kind.is_image()) {
        return Err(PdfToolsError::UnsupportedFileType {
            path: other.path.clone(),
            accepted: AcceptSet::IMAGES.to_string(),
        });
    }

    let cb = progress::resolve(&config.progress_callback);
    let total = images.len();
    cb.on_start("images-to-pdf", total);

    let (page_w, page_h) = config.page_size.dimensions_pt();
    let margin = config.margin_pt;
    let mut builder = DocumentBuilder::new();

    for (i, input) in images.iter().enumerate() {
        cb.on_item_start(i + 1, total);
        let (image_id, w, h) = embed_image(&mut builder, input)?;

        let box_w = (page_w - 2.0 * margin).max(1.0);
        let box_h = (page_h - 2.0 * margin).max(1.0);
        let scale = (box_w / w as f32).min(box_h / h as f32);
        let (draw_w, draw_h) = (w as f32 * scale, h as f32 * scale);
        let x = (page_w - draw_w) / 2.0;
        let y = (page_h - draw_h) / 2.0;
        debug!(
            "'{}': {}x{} px drawn at {:.1}x{:.1} pt",
            input.name, w, h, draw_w, draw_h
        );

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(draw_w),
                        0.into(),
                        0.into(),
                        Object::Real(draw_h),
                        Object::Real(x),
                        Object::Real(y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let resources = dictionary! { "XObject" => dictionary! { "Im0" => image_id } };
        builder.add_page(page_w, page_h, content, resources)?;
        cb.on_item_complete(i + 1, total);
    }

    let bytes = builder.finish()?;
    cb.on_complete(total, total);
    info!("Converted {} images into {}", total, IMAGES_PDF_NAME);
    Ok(Artifact::pdf(IMAGES_PDF_NAME, bytes))
}

/// Add `input` as an image XObject; returns its id and pixel size.
fn embed_image(
    builder: &mut DocumentBuilder,
    input: &InputFile,
) -> Result<(ObjectId, u32, u32), PdfToolsError> {
    let img = image::load_from_memory(&input.bytes).map_err(|e| PdfToolsError::ImageDecode {
        path: input.path.clone(),
        detail: e.to_string(),
    })?;
    let (w, h) = (img.width(), img.height());

    // Baseline JPEGs go in untouched.
    if input.kind == FileKind::Image(ImageKind::Jpeg) {
        if let Some(color_space) = jpeg_color_space(&input.bytes) {
            let stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => w as i64,
                    "Height" => h as i64,
                    "ColorSpace" => color_space,
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                input.bytes.clone(),
            );
            return Ok((builder.add_object(stream), w, h));
        }
    }

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => w as i64,
        "Height" => h as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };

    if img.color().has_alpha() {
        let alpha: Vec<u8> = img.to_rgba8().pixels().map(|p| p[3]).collect();
        if alpha.iter().any(|&a| a != u8::MAX) {
            let mut smask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => w as i64,
                    "Height" => h as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            );
            let _ = smask.compress();
            dict.set("SMask", builder.add_object(smask));
        }
    }

    let mut stream = Stream::new(dict, img.to_rgb8().into_raw());
    let _ = stream.compress();
    Ok((builder.add_object(stream), w, h))
}

/// PDF colour space for a JPEG, read from its SOF segment.
///
/// `None` for CMYK or anything unparseable; those are re-encoded.
fn jpeg_color_space(bytes: &[u8]) -> Option<&'static str> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }
    let mut i = 2;
    while i + 4 <= bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        if marker == 0xFF {
            i += 1;
            continue;
        }
        let len = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            return match bytes.get(i + 9)? {
                1 => Some("DeviceGray"),
                3 => Some("DeviceRGB"),
                _ => None,
            };
        }
        i += 2 + len;
    }
    None
}

/// `.docx` / `.xlsx` / `.pptx` → PDF of their text.
pub fn office_to_pdf(input: &InputFile, config: &ToolConfig) -> Result<Artifact, PdfToolsError> {
    let blocks = match input.kind {
        FileKind::Word => office::docx_blocks(&input.name, &input.bytes)?,
        FileKind::Excel => office::xlsx_blocks(&input.name, &input.bytes)?,
        FileKind::PowerPoint => office::pptx_blocks(&input.name, &input.bytes)?,
        FileKind::LegacyWord | FileKind::LegacyExcel | FileKind::LegacyPowerPoint => {
            return Err(PdfToolsError::UnsupportedOperation {
                detail: format!(
                    "'{}' is a legacy binary Office file; save it as .docx/.xlsx/.pptx first",
                    input.name
                ),
            })
        }
        _ => {
            return Err(PdfToolsError::UnsupportedFileType {
                path: input.path.clone(),
                accepted: AcceptSet::OFFICE.to_string(),
            })
        }
    };

    let bytes = TextLayout::from_config(config).render(&blocks)?;
    info!("Converted '{}' ({} blocks) to PDF", input.name, blocks.len());
    Ok(Artifact::pdf(OutputNaming::with_extension(&input.name, "pdf"), bytes))
}

/// Plain text → PDF; `name` only decides the output file name.
pub fn text_to_pdf(name: &str, text: &str, config: &ToolConfig) -> Result<Artifact, PdfToolsError> {
    let bytes = TextLayout::from_config(config).render(&[Block::Paragraph(text.to_string())])?;
    Ok(Artifact::pdf(OutputNaming::with_extension(name, "pdf"), bytes))
}

/// Any single non-image input → PDF.
pub fn file_to_pdf(input: &InputFile, config: &ToolConfig) -> Result<Artifact, PdfToolsError> {
    match input.kind {
        FileKind::Text => text_to_pdf(&input.name, &String::from_utf8_lossy(&input.bytes), config),
        kind if kind.is_image() => images_to_pdf(std::slice::from_ref(input), config),
        _ => office_to_pdf(input, config),
    }
}

// ── Out of PDF ──────────────────────────────────────────────────────────────

/// Extracted text of every page; a page lopdf cannot decode comes back empty.
fn page_texts(name: &str, bytes: &[u8]) -> Result<Vec<String>, PdfToolsError> {
    let doc = document::load(name, bytes)?;
    let total = document::page_count(&doc) as u32;
    let texts = (1..=total)
        .map(|n| {
            doc.extract_text(&[n]).unwrap_or_else(|e| {
                warn!("'{}' page {}: no text extracted: {}", name, n, e);
                String::new()
            })
        })
        .map(|t| t.trim_end().to_string())
        .collect();
    Ok(texts)
}

pub fn pdf_to_text(bytes: &[u8], name: &str, config: &ToolConfig) -> Result<Artifact, PdfToolsError> {
    let pages = page_texts(name, bytes)?;
    let mut text = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            text.push_str(&config.page_separator.render(i + 1));
        }
        text.push_str(page);
    }
    text.push('\n');
    Ok(Artifact::new(
        OutputNaming::with_extension(name, "txt"),
        MEDIA_TEXT,
        text.into_bytes(),
    ))
}

pub fn pdf_to_docx(bytes: &[u8], name: &str) -> Result<Artifact, PdfToolsError> {
    let pages = page_texts(name, bytes)?;
    Ok(Artifact::new(
        OutputNaming::with_extension(name, "docx"),
        MEDIA_DOCX,
        office::write_docx(&pages)?,
    ))
}

pub fn pdf_to_xlsx(bytes: &[u8], name: &str) -> Result<Artifact, PdfToolsError> {
    let pages = page_texts(name, bytes)?;
    Ok(Artifact::new(
        OutputNaming::with_extension(name, "xlsx"),
        MEDIA_XLSX,
        office::write_xlsx(&pages)?,
    ))
}

pub fn pdf_to_pptx(bytes: &[u8], name: &str) -> Result<Artifact, PdfToolsError> {
    let pages = page_texts(name, bytes)?;
    Ok(Artifact::new(
        OutputNaming::with_extension(name, "pptx"),
        MEDIA_PPTX,
        office::write_pptx(&pages)?,
    ))
}

/// Rasterise the selected pages; one `<stem>_page_<n>.<ext>` per page.
pub async fn pdf_to_images(
    bytes: &[u8],
    name: &str,
    pages: &PageSpec,
    config: &ToolConfig,
) -> Result<Vec<Artifact>, PdfToolsError> {
    let doc = document::load(name, bytes)?;
    let indices = pages.to_indices(document::page_count(&doc));
    drop(doc);
    if indices.is_empty() {
        return Err(PdfToolsError::NoPagesSelected);
    }

    let cb = progress::resolve(&config.progress_callback);
    let total = indices.len();
    cb.on_start("to-images", total);

    let rendered = render::render_pages(name, bytes, config, &indices).await?;
    let stem = OutputNaming::stem(name);
    let format = config.image_format;

    let mut artifacts = Vec::with_capacity(rendered.len());
    for (i, (idx, img)) in rendered.iter().enumerate() {
        cb.on_item_start(i + 1, total);
        let encoded = encode::encode_image(img, format)?;
        artifacts.push(Artifact::new(
            format!("{stem}_page_{}.{}", idx + 1, format.extension()),
            format.media_type(),
            encoded,
        ));
        cb.on_item_complete(i + 1, total);
    }
    cb.on_complete(total, artifacts.len());
    info!("Rendered {} pages of '{}'", artifacts.len(), name);
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageFormat;
    use crate::pipeline::document::numbered_pdf;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn png_with_alpha() -> Vec<u8> {
        let mut img = RgbaImage::from_pixel(20, 10, Rgba([0, 128, 255, 255]));
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        encode::encode_image(&DynamicImage::ImageRgba8(img), ImageFormat::Png).unwrap()
    }

    fn jpeg() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 30, Rgba([200, 10, 10, 255])));
        encode::encode_image(&img, ImageFormat::Jpeg { quality: 90 }).unwrap()
    }

    fn has_filter(doc: &lopdf::Document, filter: &[u8]) -> bool {
        doc.objects.values().any(|o| match o {
            Object::Stream(s) => s
                .dict
                .get(b"Filter")
                .ok()
                .and_then(|f| f.as_name().ok())
                .is_some_and(|n| n == filter),
            _ => false,
        })
    }

    #[test]
    fn images_become_one_page_each() {
        let inputs = vec![
            InputFile::from_bytes("a.png", png_with_alpha()),
            InputFile::from_bytes("b.jpg", jpeg()),
        ];
        let out = images_to_pdf(&inputs, &ToolConfig::default()).unwrap();
        assert_eq!(out.filename, "images.pdf");

        let doc = document::load("images.pdf", &out.bytes).unwrap();
        assert_eq!(document::page_count(&doc), 2);
        assert!(has_filter(&doc, b"DCTDecode"));
        assert!(doc
            .objects
            .values()
            .any(|o| matches!(o, Object::Stream(s) if s.dict.has(b"SMask"))));
    }

    #[test]
    fn images_to_pdf_rejects_non_images() {
        let inputs = vec![InputFile::from_bytes("a.pdf", numbered_pdf(1))];
        let err = images_to_pdf(&inputs, &ToolConfig::default()).unwrap_err();
        assert!(matches!(err, PdfToolsError::UnsupportedFileType { .. }));
    }

    #[test]
    fn corrupt_image_is_reported() {
        let inputs = vec![InputFile::from_bytes("a.png", b"\x89PNG broken".to_vec())];
        let err = images_to_pdf(&inputs, &ToolConfig::default()).unwrap_err();
        assert!(matches!(err, PdfToolsError::ImageDecode { .. }));
    }

    #[test]
    fn jpeg_sof_components() {
        assert_eq!(jpeg_color_space(&jpeg()), Some("DeviceRGB"));
        assert_eq!(jpeg_color_space(b"\x89PNG"), None);
    }

    #[test]
    fn text_to_pdf_keeps_words() {
        let out = text_to_pdf("notes.txt", "Hello PDF\nSecond line", &ToolConfig::default()).unwrap();
        assert_eq!(out.filename, "notes.pdf");
        let doc = document::load("notes.pdf", &out.bytes).unwrap();
        let text = doc.extract_text(&[1]).unwrap();
        assert!(text.contains("Hello PDF"), "got {text}");
    }

    #[test]
    fn docx_to_pdf() {
        let docx = office::write_docx(&["Quarterly report".to_string()]).unwrap();
        let input = InputFile::from_bytes("report.docx", docx);
        let out = office_to_pdf(&input, &ToolConfig::default()).unwrap();
        assert_eq!(out.filename, "report.pdf");
        let doc = document::load("report.pdf", &out.bytes).unwrap();
        assert!(doc.extract_text(&[1]).unwrap().contains("Quarterly report"));
    }

    #[test]
    fn pptx_to_pdf_one_page_per_slide() {
        let pptx = office::write_pptx(&["one".to_string(), "two".to_string()]).unwrap();
        let input = InputFile::from_bytes("deck.pptx", pptx);
        let out = office_to_pdf(&input, &ToolConfig::default()).unwrap();
        let doc = document::load("deck.pdf", &out.bytes).unwrap();
        assert_eq!(document::page_count(&doc), 2);
    }

    #[test]
    fn legacy_office_is_unsupported() {
        let input = InputFile::from_bytes("old.doc", vec![0xD0, 0xCF, 0x11, 0xE0]);
        let err = office_to_pdf(&input, &ToolConfig::default()).unwrap_err();
        assert!(matches!(err, PdfToolsError::UnsupportedOperation { .. }));
    }

    #[test]
    fn pdf_to_text_has_every_page() {
        let out = pdf_to_text(&numbered_pdf(2), "doc.pdf", &ToolConfig::default()).unwrap();
        assert_eq!(out.filename, "doc.txt");
        let text = String::from_utf8(out.bytes).unwrap();
        assert!(text.contains("Page 1"));
        assert!(text.contains("Page 2"));
    }

    #[test]
    fn pdf_to_docx_round_trips_text() {
        let out = pdf_to_docx(&numbered_pdf(2), "doc.pdf").unwrap();
        assert_eq!(out.filename, "doc.docx");
        let blocks = office::docx_blocks("doc.docx", &out.bytes).unwrap();
        assert!(format!("{blocks:?}").contains("Page 2"));
    }

    #[test]
    fn pdf_to_pptx_has_slide_per_page() {
        let out = pdf_to_pptx(&numbered_pdf(3), "doc.pdf").unwrap();
        let blocks = office::pptx_blocks("doc.pptx", &out.bytes).unwrap();
        assert_eq!(blocks.iter().filter(|b| **b == Block::PageBreak).count(), 2);
    }

    #[test]
    fn pdf_to_xlsx_names_output() {
        let out = pdf_to_xlsx(&numbered_pdf(1), "doc.pdf").unwrap();
        assert_eq!(out.filename, "doc.xlsx");
        assert_eq!(out.media_type, MEDIA_XLSX);
    }

    #[tokio::test]
    async fn pdf_to_images_needs_a_selection() {
        let err = pdf_to_images(&numbered_pdf(2), "doc.pdf", &PageSpec::Set(vec![7]), &ToolConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PdfToolsError::NoPagesSelected));
    }
}
