//! End-to-end tests that need the pdfium shared library and, for OCR, a
//! live vision-LLM API key.
//!
//! They are gated behind the `E2E_ENABLED` environment variable so they do
//! not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/lib cargo test --test e2e -- --nocapture

mod common;

use common::numbered_pdf;
use pdftools::pipeline::render::bind_pdfium;
use pdftools::{ocr, pdf_to_images, ImageFormat, InputFile, PageSpec, ToolConfig};

/// Skip unless E2E_ENABLED is set *and* pdfium can be bound.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if let Err(e) = bind_pdfium() {
            println!("SKIP — pdfium not available: {e}");
            return;
        }
    }};
}

#[tokio::test]
async fn test_render_selected_pages_to_png() {
    e2e_skip_unless_ready!();

    let config = ToolConfig::builder().dpi(72).build().unwrap();
    let out = pdf_to_images(&numbered_pdf(3), "a.pdf", &PageSpec::parse("1,3").unwrap(), &config)
        .await
        .expect("rendering should succeed");

    let names: Vec<&str> = out.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, vec!["a_page_1.png", "a_page_3.png"]);

    let img = image::load_from_memory(&out[0].bytes).expect("valid PNG");
    // US Letter at 72 DPI.
    assert_eq!(img.width(), 612);
}

#[tokio::test]
async fn test_render_jpeg_quality_setting() {
    e2e_skip_unless_ready!();

    let config = ToolConfig::builder()
        .dpi(100)
        .image_format(ImageFormat::Jpeg { quality: 60 })
        .build()
        .unwrap();
    let out = pdf_to_images(&numbered_pdf(1), "scan.pdf", &PageSpec::All, &config)
        .await
        .expect("rendering should succeed");

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].filename, "scan_page_1.jpg");
    assert_eq!(out[0].media_type, "image/jpeg");
    assert!(out[0].bytes.starts_with(&[0xFF, 0xD8]));
}

#[tokio::test]
async fn test_vision_ocr_reads_page_label() {
    e2e_skip_unless_ready!();
    if std::env::var("OPENAI_API_KEY").is_err() {
        println!("SKIP — OPENAI_API_KEY not set");
        return;
    }

    let input = InputFile::from_bytes("numbers.pdf", numbered_pdf(2));
    let config = ToolConfig::builder()
        .provider_name("openai")
        .max_retries(2)
        .build()
        .unwrap();

    let output = ocr(&input, &PageSpec::Single(2), &config)
        .await
        .expect("OCR should succeed");

    assert_eq!(output.stats.processed_pages, 1);
    assert!(output.text.ends_with('\n'));
    assert!(
        output.text.contains("Page 2"),
        "expected the page label, got {:?}",
        output.text
    );
}
