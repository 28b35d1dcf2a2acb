//! Vision-model OCR: send one page image and collect the transcription.
//!
//! Transient 429 / 503 responses are common under concurrent load, so each
//! page is retried with exponential backoff (`retry_backoff_ms * 2^attempt`).
//! With 500 ms base and 3 retries the waits are 500 ms → 1 s → 2 s.

use crate::config::ToolConfig;
use crate::error::PageError;
use crate::output::OcrPageResult;
use crate::prompts::{ocr_user_prompt, OCR_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Transcribe a single page image.
///
/// Never returns an error: a page that fails after all retries comes back
/// as an [`OcrPageResult`] with `error` set so one bad page does not abort
/// the document.
pub async fn ocr_page(
    provider: &Arc<dyn LLMProvider>,
    page_num: usize,
    image_data: ImageData,
    config: &ToolConfig,
) -> OcrPageResult {
    let start = Instant::now();
    let messages = vec![
        ChatMessage::system(OCR_SYSTEM_PROMPT),
        ChatMessage::user_with_images(&ocr_user_prompt(page_num), vec![image_data]),
    ];
    let options = build_options(config);
    let call_timeout = Duration::from_secs(config.api_timeout_secs);

    let mut last_err: Option<PageError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Page {}: retry {}/{} after {}ms",
                page_num, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(call_timeout, provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                let duration = start.elapsed();
                debug!(
                    "Page {}: {} input tokens, {} output tokens, {:?}",
                    page_num, response.prompt_tokens, response.completion_tokens, duration
                );
                return OcrPageResult {
                    page_num,
                    text: response.content,
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                    duration_ms: duration.as_millis() as u64,
                    retries: attempt as u8,
                    error: None,
                };
            }
            Ok(Err(e)) => {
                warn!("Page {}: attempt {} failed: {}", page_num, attempt + 1, e);
                last_err = Some(PageError::OcrFailed {
                    page: page_num,
                    retries: config.max_retries as u8,
                    detail: e.to_string(),
                });
            }
            Err(_) => {
                warn!(
                    "Page {}: attempt {} timed out after {}s",
                    page_num,
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_err = Some(PageError::Timeout {
                    page: page_num,
                    secs: config.api_timeout_secs,
                });
            }
        }
    }

    let err = last_err.unwrap_or(PageError::OcrFailed {
        page: page_num,
        retries: config.max_retries as u8,
        detail: "Unknown error".to_string(),
    });
    let mut result = OcrPageResult::failed(page_num, err);
    result.retries = config.max_retries as u8;
    result.duration_ms = start.elapsed().as_millis() as u64;
    result
}

fn build_options(config: &ToolConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_follow_config() {
        let config = ToolConfig::builder()
            .temperature(0.3)
            .max_tokens(1024)
            .build()
            .unwrap();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.3));
        assert_eq!(opts.max_tokens, Some(1024));
    }
}
