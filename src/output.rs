//! Result types returned by the inspection and OCR entry points.

use crate::error::PageError;
use serde::{Deserialize, Serialize};

/// Document information read from the trailer `/Info` dictionary and page tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
    pub is_encrypted: bool,
    /// `(width, height)` in points for every page, in page order.
    pub page_sizes: Vec<(f32, f32)>,
}

/// Outcome of recognising one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Cleaned text; empty when `error` is set.
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    pub retries: u8,
    pub error: Option<PageError>,
}

impl OcrPageResult {
    pub(crate) fn failed(page_num: usize, error: PageError) -> Self {
        Self {
            page_num,
            text: String::new(),
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 0,
            retries: 0,
            error: Some(error),
        }
    }
}

/// Aggregate numbers for an OCR run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrStats {
    pub total_pages: usize,
    pub processed_pages: usize,
    pub failed_pages: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
}

impl OcrStats {
    pub(crate) fn from_pages(pages: &[OcrPageResult], total_duration_ms: u64) -> Self {
        let failed_pages = pages.iter().filter(|p| p.error.is_some()).count();
        Self {
            total_pages: pages.len(),
            processed_pages: pages.len() - failed_pages,
            failed_pages,
            total_input_tokens: pages.iter().map(|p| p.input_tokens as u64).sum(),
            total_output_tokens: pages.iter().map(|p| p.output_tokens as u64).sum(),
            total_duration_ms,
        }
    }
}

/// Assembled OCR text plus per-page detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOutput {
    pub text: String,
    pub pages: Vec<OcrPageResult>,
    pub stats: OcrStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_failures_and_tokens() {
        let ok = OcrPageResult {
            page_num: 1,
            text: "hello".into(),
            input_tokens: 100,
            output_tokens: 20,
            duration_ms: 5,
            retries: 0,
            error: None,
        };
        let bad = OcrPageResult::failed(
            2,
            PageError::Timeout {
                page: 2,
                secs: 60,
            },
        );
        let stats = OcrStats::from_pages(&[ok, bad], 42);
        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.processed_pages, 1);
        assert_eq!(stats.failed_pages, 1);
        assert_eq!(stats.total_input_tokens, 100);
        assert_eq!(stats.total_duration_ms, 42);
    }
}
