//! Post-processing: deterministic cleanup of OCR output.
//!
//! Even well-prompted vision models sometimes wrap the answer in code
//! fences, open with a chatty preamble, or emit `\r\n` and zero-width
//! characters. Each rule here is a pure `&str → String` pass.
//!
//! Order matters: fences and preambles are stripped before line endings
//! are normalised and whitespace is trimmed, and the final-newline pass
//! runs last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to raw model output.
///
/// Rules (applied in order):
/// 1. Strip outer code fences
/// 2. Drop a leading "Here is the text…:" preamble line
/// 3. Normalise line endings (CRLF → LF)
/// 4. Trim trailing whitespace per line
/// 5. Collapse runs of blank lines down to one
/// 6. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 7. End with exactly one newline; blank input stays empty
pub fn clean_ocr_text(input: &str) -> String {
    let s = strip_fences(input);
    let s = strip_preamble(&s);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    ensure_final_newline(&s)
}

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\r?\n(.*?)\r?\n```\s*$").expect("static regex")
});

fn strip_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

static RE_PREAMBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:here(?:'s| is) (?:the )?(?:transcribed |extracted )?text[^\n]*:|transcription:)[ \t]*\r?\n")
        .expect("static regex")
});

fn strip_preamble(input: &str) -> String {
    RE_PREAMBLE.replace(input, "").into_owned()
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("static regex"));

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        ['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}'],
        "",
    )
}

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}
