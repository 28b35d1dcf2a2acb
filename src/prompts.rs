//! Prompts for vision-model OCR.

/// System prompt for transcribing one page image to plain text.
pub const OCR_SYSTEM_PROMPT: &str = r#"You are a precise OCR engine. Transcribe all text visible in the page image.

Rules:

1. Reproduce the text exactly as written, in its original language and script.
   Korean, Chinese, Japanese and other scripts must not be translated or romanised.
2. Follow the natural reading order of the page. For multi-column layouts,
   finish one column before starting the next.
3. Keep paragraph breaks as blank lines and keep line breaks inside lists and
   addresses.
4. Render tables as rows of cells separated by a tab character.
5. Skip purely decorative elements. Do not describe images.
6. Output ONLY the transcribed text. No commentary, no Markdown fences,
   no "Page X" markers.
7. If the page contains no legible text, output nothing."#;

/// The user turn that accompanies the image.
pub fn ocr_user_prompt(page_num: usize) -> String {
    format!("Transcribe page {page_num}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_forbids_translation() {
        assert!(OCR_SYSTEM_PROMPT.contains("must not be translated"));
    }

    #[test]
    fn user_prompt_names_page() {
        assert_eq!(ocr_user_prompt(4), "Transcribe page 4.");
    }
}
