//! Image encoding: `DynamicImage` → PNG/JPEG bytes, and base64 `ImageData`
//! for the vision API.
//!
//! OCR always uses PNG: JPEG artefacts on rendered text degrade recognition.
//! `detail: "high"` lets GPT-4-class models tile the full image instead of
//! reading a single 512 px overview.

use crate::config::ImageFormat;
use crate::error::PdfToolsError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rendered page in the requested output format.
pub fn encode_image(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, PdfToolsError> {
    let mut buf = Vec::new();
    let result = match format {
        ImageFormat::Png => img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png),
        // JPEG has no alpha channel.
        ImageFormat::Jpeg { quality } => {
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(&rgb)
        }
    };
    result.map_err(|e| PdfToolsError::Internal(format!("image encoding failed: {e}")))?;
    debug!("Encoded {}x{} image → {} bytes", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Encode a page as a base64 PNG ready for the vision API.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, PdfToolsError> {
    let png = encode_image(img, ImageFormat::Png)?;
    Ok(encode_bytes(&png, "image/png"))
}

/// Wrap already-encoded image bytes, e.g. a JPEG given directly to OCR.
pub fn encode_bytes(bytes: &[u8], mime: &str) -> ImageData {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64", b64.len());
    ImageData::new(b64, mime).with_detail("high")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn red() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn encode_small_image() {
        let data = encode_page(&red()).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert!(decoded.starts_with(b"\x89PNG"));
    }

    #[test]
    fn jpeg_output_has_soi_marker() {
        let bytes = encode_image(&red(), ImageFormat::Jpeg { quality: 80 }).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let back = image::load_from_memory(&bytes).unwrap();
        assert_eq!(back.width(), 10);
    }
}
