//! Configuration types shared by every tool.
//!
//! All tunable behaviour is controlled through [`ToolConfig`], built via its
//! [`ToolConfigBuilder`]. Page state (which pages are selected, how each page
//! is rotated) is *not* configuration; it lives in [`crate::state`].

use crate::error::PdfToolsError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for a tool run.
///
/// Built via [`ToolConfig::builder()`] or using [`ToolConfig::default()`].
///
/// # Example
/// ```rust
/// use pdftools::{ImageFormat, ToolConfig};
///
/// let config = ToolConfig::builder()
///     .dpi(200)
///     .image_format(ImageFormat::Jpeg { quality: 85 })
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Clone)]
pub struct ToolConfig {
    /// Rendering DPI used when rasterising PDF pages. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    ///
    /// Caps either dimension independently of DPI so an A0 poster cannot
    /// exhaust memory.
    pub max_rendered_pixels: u32,

    /// Encoding for PDF → image output. Default: PNG.
    pub image_format: ImageFormat,

    /// Page size of PDFs generated from images, office files or text. Default: A4.
    pub page_size: PageSize,

    /// Margin in points for generated text PDFs. Default: 56 (≈ 2 cm).
    pub margin_pt: f32,

    /// Body font size in points for generated text PDFs. Default: 11.
    pub font_size: f32,

    /// Which engine recognises text in the OCR tool. Default: vision LLM.
    pub ocr_backend: OcrBackend,

    /// Tesseract language string (only used by [`OcrBackend::Tesseract`]).
    pub ocr_language: String,

    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for OCR completions. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per page. Default: 4096.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient OCR failure. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Number of concurrent OCR calls. Default: 4.
    pub concurrency: usize,

    /// Per-OCR-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Separator between pages in OCR text output. Default: a rule line.
    pub page_separator: PageSeparator,

    /// Optional progress events for multi-file and multi-page work.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_rendered_pixels: 2000,
            image_format: ImageFormat::default(),
            page_size: PageSize::default(),
            margin_pt: 56.0,
            font_size: 11.0,
            ocr_backend: OcrBackend::default(),
            ocr_language: "kor+eng".to_string(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            concurrency: 4,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            page_separator: PageSeparator::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ToolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("image_format", &self.image_format)
            .field("page_size", &self.page_size)
            .field("margin_pt", &self.margin_pt)
            .field("font_size", &self.font_size)
            .field("ocr_backend", &self.ocr_backend)
            .field("ocr_language", &self.ocr_language)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("max_retries", &self.max_retries)
            .field("concurrency", &self.concurrency)
            .field("page_separator", &self.page_separator)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ToolProgressCallback>"),
            )
            .finish()
    }
}

impl ToolConfig {
    /// Create a new builder for `ToolConfig`.
    pub fn builder() -> ToolConfigBuilder {
        ToolConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ToolConfig`].
#[derive(Debug)]
pub struct ToolConfigBuilder {
    config: ToolConfig,
}

impl ToolConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn image_format(mut self, format: ImageFormat) -> Self {
        self.config.image_format = format;
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn margin_pt(mut self, margin: f32) -> Self {
        self.config.margin_pt = margin.max(0.0);
        self
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.config.font_size = size.clamp(4.0, 72.0);
        self
    }

    pub fn ocr_backend(mut self, backend: OcrBackend) -> Self {
        self.config.ocr_backend = backend;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ToolConfig, PdfToolsError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(PdfToolsError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(PdfToolsError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if let ImageFormat::Jpeg { quality } = c.image_format {
            if quality == 0 || quality > 100 {
                return Err(PdfToolsError::InvalidConfig(format!(
                    "JPEG quality must be 1–100, got {quality}"
                )));
            }
        }
        let (w, h) = c.page_size.dimensions_pt();
        if 2.0 * c.margin_pt >= w.min(h) {
            return Err(PdfToolsError::InvalidConfig(format!(
                "Margin {}pt leaves no printable area on a {w}×{h}pt page",
                c.margin_pt
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Encoding used when writing rendered pages to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg { quality: u8 },
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg { .. } => "jpg",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// Page size of generated PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    /// Landscape A4, used for slide decks.
    A4Landscape,
    Custom { width_pt: f32, height_pt: f32 },
}

impl PageSize {
    /// Width and height in PDF points (1/72 inch).
    pub fn dimensions_pt(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4Landscape => (841.89, 595.28),
            PageSize::Custom {
                width_pt,
                height_pt,
            } => (width_pt.max(1.0), height_pt.max(1.0)),
        }
    }
}

/// Text-recognition engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrBackend {
    /// Vision LLM through `edgequake-llm` (default).
    #[default]
    Vision,
    /// Local tesseract via `leptess`. Requires the `tesseract` feature.
    Tesseract,
}

/// Specifies a set of pages on the command line or in library calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSpec {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated on expansion).
    Set(Vec<usize>),
    /// Comma list mixing pages and ranges; each part is clipped on expansion.
    Mixed(Vec<PageSpec>),
}

impl PageSpec {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    ///
    /// Pages outside `[1, total_pages]` are dropped.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSpec::All => (0..total_pages).collect(),
            PageSpec::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSpec::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSpec::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
            PageSpec::Mixed(parts) => parts
                .iter()
                .flat_map(|part| part.to_indices(total_pages))
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Parse `all`, `5`, `3-15`, `1,3,5` or mixed `1-3,7`.
    pub fn parse(s: &str) -> Result<Self, PdfToolsError> {
        let s = s.trim().to_lowercase();
        let invalid = |detail: String| PdfToolsError::InvalidConfig(detail);

        if s == "all" || s.is_empty() {
            return Ok(PageSpec::All);
        }

        let parse_page = |p: &str| -> Result<usize, PdfToolsError> {
            let page: usize = p
                .trim()
                .parse()
                .map_err(|_| invalid(format!("Invalid page number: '{}'", p.trim())))?;
            if page < 1 {
                return Err(invalid(format!(
                    "Pages are 1-indexed, minimum is 1 (got {page})"
                )));
            }
            Ok(page)
        };

        let parse_range = |part: &str| -> Result<(usize, usize), PdfToolsError> {
            let (start, end) = part
                .split_once('-')
                .ok_or_else(|| invalid(format!("Invalid page range '{part}'")))?;
            let start = parse_page(start)?;
            let end = parse_page(end)?;
            if start > end {
                return Err(invalid(format!(
                    "Invalid page range '{start}-{end}': start must be <= end"
                )));
            }
            Ok((start, end))
        };

        if !s.contains(',') {
            if s.contains('-') {
                let (start, end) = parse_range(&s)?;
                return Ok(PageSpec::Range(start, end));
            }
            return Ok(PageSpec::Single(parse_page(&s)?));
        }

        let mut parts = Vec::new();
        for part in s.split(',').filter(|p| !p.trim().is_empty()) {
            if part.contains('-') {
                let (start, end) = parse_range(part)?;
                parts.push(PageSpec::Range(start, end));
            } else {
                parts.push(PageSpec::Single(parse_page(part)?));
            }
        }
        if parts.iter().all(|p| matches!(p, PageSpec::Single(_))) {
            let pages = parts
                .into_iter()
                .filter_map(|p| match p {
                    PageSpec::Single(n) => Some(n),
                    _ => None,
                })
                .collect();
            return Ok(PageSpec::Set(pages));
        }
        Ok(PageSpec::Mixed(parts))
    }
}

impl FromStr for PageSpec {
    type Err = PdfToolsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageSpec::parse(s)
    }
}

/// How to separate pages in assembled OCR text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// Pages joined with a blank line.
    None,
    /// A line of dashes between pages. (default)
    #[default]
    Rule,
    /// A header line naming the page: "=== Page N ===".
    Header,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator string placed before the given page (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::Rule => "\n\n----------------------------------------\n\n".to_string(),
            PageSeparator::Header => format!("\n\n=== Page {} ===\n\n", page_num),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }

    /// Parse the CLI form: none, rule, header, or any custom string.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => PageSeparator::None,
            "rule" | "hr" | "---" => PageSeparator::Rule,
            "header" | "page" => PageSeparator::Header,
            _ => PageSeparator::Custom(s.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let config = ToolConfig::builder().build().unwrap();
        assert_eq!(config.dpi, 150);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.image_format, ImageFormat::Png);
    }

    #[test]
    fn builder_clamps_dpi() {
        let config = ToolConfig::builder().dpi(1000).build().unwrap();
        assert_eq!(config.dpi, 400);
    }

    #[test]
    fn jpeg_quality_zero_is_rejected() {
        let err = ToolConfig::builder()
            .image_format(ImageFormat::Jpeg { quality: 0 })
            .build()
            .unwrap_err();
        assert!(matches!(err, PdfToolsError::InvalidConfig(_)));
    }

    #[test]
    fn oversized_margin_is_rejected() {
        let err = ToolConfig::builder().margin_pt(400.0).build().unwrap_err();
        assert!(matches!(err, PdfToolsError::InvalidConfig(_)));
    }

    #[test]
    fn page_spec_to_indices() {
        assert_eq!(PageSpec::All.to_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageSpec::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSpec::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSpec::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(PageSpec::Range(3, 10).to_indices(4), vec![2, 3]);
        assert_eq!(PageSpec::Set(vec![3, 1, 3]).to_indices(5), vec![0, 2]);
    }

    #[test]
    fn page_spec_parse_forms() {
        assert_eq!(PageSpec::parse("all").unwrap(), PageSpec::All);
        assert_eq!(PageSpec::parse(" 5 ").unwrap(), PageSpec::Single(5));
        assert_eq!(PageSpec::parse("3-15").unwrap(), PageSpec::Range(3, 15));
        assert_eq!(
            PageSpec::parse("1,3,5").unwrap(),
            PageSpec::Set(vec![1, 3, 5])
        );
        assert_eq!(
            PageSpec::parse("1-3,7").unwrap(),
            PageSpec::Mixed(vec![PageSpec::Range(1, 3), PageSpec::Single(7)])
        );
        assert_eq!(
            PageSpec::parse("1-3,7").unwrap().to_indices(10),
            vec![0, 1, 2, 6]
        );
    }

    #[test]
    fn huge_ranges_in_lists_are_clipped_not_expanded() {
        let spec = PageSpec::parse("1,2-18446744073709551615").unwrap();
        assert_eq!(spec.to_indices(3), vec![0, 1, 2]);

        let spec = PageSpec::parse("1,1-4000000000").unwrap();
        assert_eq!(spec.to_indices(2), vec![0, 1]);

        let spec = PageSpec::parse("9,5-4000000000").unwrap();
        assert!(spec.to_indices(4).is_empty());
    }

    #[test]
    fn page_spec_parse_rejects_bad_input() {
        assert!(PageSpec::parse("0").is_err());
        assert!(PageSpec::parse("5-2").is_err());
        assert!(PageSpec::parse("x").is_err());
        assert!(PageSpec::parse("1,,b").is_err());
    }

    #[test]
    fn separator_render() {
        assert_eq!(PageSeparator::None.render(2), "\n\n");
        assert!(PageSeparator::Header.render(4).contains("Page 4"));
        assert_eq!(PageSeparator::parse("hr"), PageSeparator::Rule);
        assert_eq!(
            PageSeparator::parse("***"),
            PageSeparator::Custom("***".into())
        );
    }
}
