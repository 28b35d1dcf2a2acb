//! Text recognition for scanned PDFs and images.
//!
//! ```text
//! input ──▶ pages ──▶ render (pdfium) ──▶ recognise ──▶ clean ──▶ join
//!            (spec)     or decode image    (vision LLM / tesseract)
//! ```
//!
//! A failed page does not abort the run; its error is kept in the page
//! result. Only when every page fails is the whole run an error.

use crate::config::{OcrBackend, PageSpec, ToolConfig};
use crate::emit::{Artifact, OutputNaming, MEDIA_TEXT};
use crate::error::{PageError, PdfToolsError};
use crate::output::{OcrOutput, OcrPageResult, OcrStats};
use crate::pipeline::input::{AcceptSet, FileKind, InputFile};
use crate::pipeline::{document, encode, llm, postprocess, render};
use crate::progress::{self, ProgressCallback};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const DEFAULT_VISION_MODEL: &str = "gpt-4.1-nano";

/// Recognise the text of `input` (a PDF or a single image).
///
/// `pages` selects PDF pages and is ignored for images.
pub async fn ocr(
    input: &InputFile,
    pages: &PageSpec,
    config: &ToolConfig,
) -> Result<OcrOutput, PdfToolsError> {
    let start = Instant::now();
    info!("Starting OCR: {} ({:?})", input.name, config.ocr_backend);

    let images = page_images(input, pages, config).await?;
    let total = images.len();
    let cb = progress::resolve(&config.progress_callback);
    cb.on_start("ocr", total);

    let mut results = match config.ocr_backend {
        OcrBackend::Vision => {
            let provider = resolve_provider(config).await?;
            recognise_vision(&provider, images, config, &cb).await
        }
        OcrBackend::Tesseract => recognise_tesseract(images, config, &cb).await?,
    };

    for page in results.iter_mut().filter(|p| p.error.is_none()) {
        page.text = postprocess::clean_ocr_text(&page.text);
    }
    results.sort_by_key(|p| p.page_num);

    let stats = OcrStats::from_pages(&results, start.elapsed().as_millis() as u64);
    cb.on_complete(total, stats.processed_pages);

    if stats.processed_pages == 0 {
        let first_error = results
            .iter()
            .find_map(|p| p.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(PdfToolsError::AllPagesFailed {
            total,
            retries: config.max_retries,
            first_error,
        });
    }

    info!(
        "OCR complete: {}/{} pages, {}ms",
        stats.processed_pages, total, stats.total_duration_ms
    );

    Ok(OcrOutput {
        text: assemble_text(&results, config),
        pages: results,
        stats,
    })
}

/// `scan.pdf` → `scan_ocr.txt`.
pub fn ocr_artifact(source_name: &str, output: &OcrOutput) -> Artifact {
    Artifact::new(
        OutputNaming::suffixed(source_name, "_ocr", "txt"),
        MEDIA_TEXT,
        output.text.clone().into_bytes(),
    )
}

/// Join successful pages; failed pages are left out.
fn assemble_text(pages: &[OcrPageResult], config: &ToolConfig) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().filter(|p| p.error.is_none()).enumerate() {
        if i > 0 {
            out.push_str(&config.page_separator.render(page.page_num));
        }
        out.push_str(page.text.trim_end());
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// 1-based page numbers with their images.
async fn page_images(
    input: &InputFile,
    pages: &PageSpec,
    config: &ToolConfig,
) -> Result<Vec<(usize, DynamicImage)>, PdfToolsError> {
    match input.kind {
        FileKind::Pdf => {
            let doc = document::load(&input.name, &input.bytes)?;
            let total = document::page_count(&doc);
            let indices = pages.to_indices(total);
            if indices.is_empty() {
                return Err(PdfToolsError::NoPagesSelected);
            }
            debug!("Selected {} of {} pages", indices.len(), total);
            drop(doc);
            let rendered = render::render_pages(&input.name, &input.bytes, config, &indices).await?;
            Ok(rendered.into_iter().map(|(idx, img)| (idx + 1, img)).collect())
        }
        kind if kind.is_image() => {
            let img = image::load_from_memory(&input.bytes).map_err(|e| {
                PdfToolsError::ImageDecode {
                    path: input.path.clone(),
                    detail: e.to_string(),
                }
            })?;
            Ok(vec![(1, img)])
        }
        _ => Err(PdfToolsError::UnsupportedFileType {
            path: input.path.clone(),
            accepted: AcceptSet::PDF.union(AcceptSet::IMAGES).to_string(),
        }),
    }
}

async fn recognise_vision(
    provider: &Arc<dyn LLMProvider>,
    images: Vec<(usize, DynamicImage)>,
    config: &ToolConfig,
    cb: &ProgressCallback,
) -> Vec<OcrPageResult> {
    let total = images.len();
    stream::iter(images.into_iter().map(|(page_num, img)| {
        let provider = Arc::clone(provider);
        let cb = Arc::clone(cb);
        async move {
            cb.on_item_start(page_num, total);
            let result = match encode::encode_page(&img) {
                Ok(data) => llm::ocr_page(&provider, page_num, data, config).await,
                Err(e) => OcrPageResult::failed(
                    page_num,
                    PageError::RenderFailed {
                        page: page_num,
                        detail: e.to_string(),
                    },
                ),
            };
            report(&cb, &result, total);
            result
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await
}

fn report(cb: &ProgressCallback, result: &OcrPageResult, total: usize) {
    match &result.error {
        None => cb.on_item_complete(result.page_num, total),
        Some(e) => {
            warn!("{}", e);
            cb.on_item_error(result.page_num, total, &e.to_string())
        }
    }
}

#[cfg(feature = "tesseract")]
async fn recognise_tesseract(
    images: Vec<(usize, DynamicImage)>,
    config: &ToolConfig,
    cb: &ProgressCallback,
) -> Result<Vec<OcrPageResult>, PdfToolsError> {
    let language = config.ocr_language.clone();
    let total = images.len();

    // Fail fast when the language data is missing.
    {
        let probe = language.clone();
        tokio::task::spawn_blocking(move || leptess::LepTess::new(None, &probe).map(|_| ()))
            .await
            .map_err(|e| PdfToolsError::Internal(format!("OCR task panicked: {e}")))?
            .map_err(|e| {
                PdfToolsError::OcrEngine(format!(
                    "failed to initialise tesseract with '{language}': {e}"
                ))
            })?;
    }

    let mut results = Vec::with_capacity(total);
    for (page_num, img) in images {
        cb.on_item_start(page_num, total);
        let language = language.clone();
        let result = tokio::task::spawn_blocking(move || tesseract_page(page_num, &img, &language))
            .await
            .map_err(|e| PdfToolsError::Internal(format!("OCR task panicked: {e}")))?;
        report(cb, &result, total);
        results.push(result);
    }
    Ok(results)
}

#[cfg(feature = "tesseract")]
fn tesseract_page(page_num: usize, img: &DynamicImage, language: &str) -> OcrPageResult {
    use crate::config::ImageFormat;

    let start = Instant::now();
    let run = || -> Result<String, String> {
        let png = encode::encode_image(img, ImageFormat::Png).map_err(|e| e.to_string())?;
        let mut lt = leptess::LepTess::new(None, language).map_err(|e| e.to_string())?;
        lt.set_image_from_mem(&png).map_err(|e| e.to_string())?;
        lt.get_utf8_text().map_err(|e| e.to_string())
    };
    match run() {
        Ok(text) => {
            debug!("Page {}: tesseract read {} chars", page_num, text.len());
            OcrPageResult {
                page_num,
                text,
                input_tokens: 0,
                output_tokens: 0,
                duration_ms: start.elapsed().as_millis() as u64,
                retries: 0,
                error: None,
            }
        }
        Err(detail) => OcrPageResult::failed(
            page_num,
            PageError::OcrFailed {
                page: page_num,
                retries: 0,
                detail,
            },
        ),
    }
}

#[cfg(not(feature = "tesseract"))]
async fn recognise_tesseract(
    _images: Vec<(usize, DynamicImage)>,
    _config: &ToolConfig,
    _cb: &ProgressCallback,
) -> Result<Vec<OcrPageResult>, PdfToolsError> {
    Err(PdfToolsError::UnsupportedOperation {
        detail: "this build has no tesseract support (enable the `tesseract` feature)".into(),
    })
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, PdfToolsError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PdfToolsError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the vision provider, most specific first:
///
/// 1. `config.provider`, used as-is
/// 2. `config.provider_name` with `config.model`
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. OpenAI when `OPENAI_API_KEY` is set
/// 5. whatever `ProviderFactory::from_env` detects
async fn resolve_provider(config: &ToolConfig) -> Result<Arc<dyn LLMProvider>, PdfToolsError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_VISION_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_vision_provider(&prov, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_vision_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PdfToolsError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No vision provider could be detected from the environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY or GEMINI_API_KEY, or pass --provider.\n\
                Error: {e}"
            ),
        })?;

    Ok(llm_provider)
}
