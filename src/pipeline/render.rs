//! PDF rasterisation: render selected pages to `DynamicImage` via pdfium.
//!
//! pdfium keeps thread-local state and is not async-safe, so all work runs
//! inside `tokio::task::spawn_blocking`.
//!
//! The output size is capped by `max_rendered_pixels` on the longest edge
//! as well as by DPI, so an A0 poster cannot exhaust memory.

use crate::config::ToolConfig;
use crate::error::PdfToolsError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Points to either the pdfium shared library itself or its directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to pdfium: `PDFIUM_LIB_PATH` first, then the system library.
pub fn bind_pdfium() -> Result<Pdfium, PdfToolsError> {
    let bindings = match std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from) {
        Some(path) if path.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&path))
        }
        Some(path) => Pdfium::bind_to_library(&path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| PdfToolsError::PdfiumBindingFailed(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

/// Rasterise selected pages of a PDF held in memory.
///
/// `page_indices` are 0-based; the returned tuples keep them.
pub async fn render_pages(
    name: &str,
    bytes: &[u8],
    config: &ToolConfig,
    page_indices: &[usize],
) -> Result<Vec<(usize, DynamicImage)>, PdfToolsError> {
    let name = name.to_string();
    let bytes = bytes.to_vec();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&name, &bytes, dpi, max_pixels, &indices)
    })
    .await
    .map_err(|e| PdfToolsError::Internal(format!("Render task panicked: {}", e)))?
}

fn render_pages_blocking(
    name: &str,
    bytes: &[u8],
    dpi: u32,
    max_pixels: u32,
    page_indices: &[usize],
) -> Result<Vec<(usize, DynamicImage)>, PdfToolsError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| PdfToolsError::CorruptPdf {
            path: PathBuf::from(name),
            detail: e.to_string(),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("Rendering {} of {} pages from '{}'", page_indices.len(), total_pages, name);

    let mut results = Vec::with_capacity(page_indices.len());

    for &idx in page_indices {
        if idx >= total_pages {
            return Err(PdfToolsError::PageOutOfRange {
                page: idx + 1,
                total: total_pages,
            });
        }

        let failed = |e: PdfiumError| PdfToolsError::RasterisationFailed {
            page: idx + 1,
            detail: e.to_string(),
        };

        let page = pages.get(idx as u16).map_err(failed)?;

        // Points are 1/72 inch.
        let width_px = (page.width().value * dpi as f32 / 72.0).round() as i32;
        let height_px = (page.height().value * dpi as f32 / 72.0).round() as i32;
        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px.clamp(1, max_pixels as i32))
            .set_maximum_height(height_px.clamp(1, max_pixels as i32))
            .render_form_data(true);

        let bitmap = page.render_with_config(&render_config).map_err(failed)?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push((idx, image));
    }

    Ok(results)
}
