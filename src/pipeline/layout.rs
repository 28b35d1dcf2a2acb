//! Plain-text layout onto PDF pages using the standard Helvetica font.
//!
//! Glyph widths are estimated rather than read from font metrics: each
//! character falls into a width class expressed as a fraction of the font
//! size. Lines are wrapped greedily at word boundaries; words wider than
//! the printable area are broken by character.

use crate::config::ToolConfig;
use crate::error::PdfToolsError;
use crate::pipeline::document::DocumentBuilder;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, StringFormat};

const LINE_SPACING: f32 = 1.35;
const TITLE_SCALE: f32 = 1.5;
const BODY_FONT: &str = "F1";
const TITLE_FONT: &str = "F2";

/// A unit of laid-out text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Bold heading line (sheet name, slide title).
    Title(String),
    /// Body text; embedded newlines are hard breaks.
    Paragraph(String),
    /// Start a new page (one slide per page).
    PageBreak,
}

/// Estimated advance width of `c` as a fraction of the font size.
pub fn char_width_ratio(c: char) -> f32 {
    match c {
        ' ' | 'i' | 'j' | 'l' | '.' | ',' | ';' | ':' | '\'' | '!' | '|' | 'I' => 0.28,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.35,
        'm' | 'w' | 'M' | 'W' | '@' => 0.85,
        '0'..='9' => 0.556,
        'A'..='Z' => 0.68,
        c if c.is_ascii() => 0.52,
        // CJK and other full-width scripts.
        c if (c as u32) >= 0x1100 => 1.0,
        _ => 0.6,
    }
}

pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_ratio).sum::<f32>() * font_size
}

/// Encode for a WinAnsi Helvetica string; anything outside Latin-1 becomes `?`.
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| *c != '\r')
        .map(|c| match c {
            '\t' => b' ',
            c if (c as u32) < 0x20 => b' ',
            c if (c as u32) <= 0xFF => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Greedy word wrap to `max_width` points.
pub fn wrap_line(text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate_width = if current.is_empty() {
            text_width(word, font_size)
        } else {
            text_width(&current, font_size) + text_width(" ", font_size) + text_width(word, font_size)
        };

        if candidate_width <= max_width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if text_width(word, font_size) <= max_width {
            current.push_str(word);
            continue;
        }

        // Word longer than a whole line: break it by character.
        for c in word.chars() {
            let next = char_width_ratio(c) * font_size;
            if !current.is_empty() && text_width(&current, font_size) + next > max_width {
                lines.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Page geometry and typography for generated text documents.
#[derive(Debug, Clone, Copy)]
pub struct TextLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub font_size: f32,
}

impl TextLayout {
    pub fn from_config(config: &ToolConfig) -> Self {
        let (page_width, page_height) = config.page_size.dimensions_pt();
        Self {
            page_width,
            page_height,
            margin: config.margin_pt,
            font_size: config.font_size,
        }
    }

    pub fn printable_width(&self) -> f32 {
        (self.page_width - 2.0 * self.margin).max(self.font_size)
    }

    /// Lay out `blocks` and return the finished PDF bytes.
    pub fn render(&self, blocks: &[Block]) -> Result<Vec<u8>, PdfToolsError> {
        let mut builder = DocumentBuilder::new();
        let body_font = builder.add_object(helvetica("Helvetica"));
        let title_font = builder.add_object(helvetica("Helvetica-Bold"));
        let resources = dictionary! {
            "Font" => dictionary! { BODY_FONT => body_font, TITLE_FONT => title_font },
        };

        let mut page = PageCursor::new(self);
        for block in blocks {
            match block {
                Block::PageBreak => {
                    if !page.is_blank() {
                        page.flush(&mut builder, self, &resources)?;
                    }
                }
                Block::Title(title) => {
                    let size = self.font_size * TITLE_SCALE;
                    for line in wrap_line(title, size, self.printable_width()) {
                        page.line(&mut builder, self, &resources, TITLE_FONT, size, &line)?;
                    }
                    page.gap(self.font_size * 0.5);
                }
                Block::Paragraph(text) => {
                    for hard_line in text.lines() {
                        for line in wrap_line(hard_line, self.font_size, self.printable_width()) {
                            page.line(&mut builder, self, &resources, BODY_FONT, self.font_size, &line)?;
                        }
                    }
                    page.gap(self.font_size * 0.5);
                }
            }
        }

        if !page.is_blank() || builder.page_count() == 0 {
            page.flush(&mut builder, self, &resources)?;
        }
        builder.finish()
    }
}

fn helvetica(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Content operations for one line of text at `(x, y)`.
pub fn text_line_ops(font: &str, size: f32, x: f32, y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Real(size)]),
        Operation::new(
            "Tm",
            vec![
                1.into(),
                0.into(),
                0.into(),
                1.into(),
                Object::Real(x),
                Object::Real(y),
            ],
        ),
        Operation::new("Tj", vec![Object::String(to_win_ansi(text), StringFormat::Literal)]),
        Operation::new("ET", vec![]),
    ]
}

/// Write position on the page currently being filled.
struct PageCursor {
    ops: Vec<Operation>,
    y: f32,
}

impl PageCursor {
    fn new(layout: &TextLayout) -> Self {
        Self {
            ops: Vec::new(),
            y: layout.page_height - layout.margin,
        }
    }

    fn is_blank(&self) -> bool {
        self.ops.is_empty()
    }

    fn gap(&mut self, points: f32) {
        if !self.is_blank() {
            self.y -= points;
        }
    }

    fn line(
        &mut self,
        builder: &mut DocumentBuilder,
        layout: &TextLayout,
        resources: &Dictionary,
        font: &str,
        size: f32,
        text: &str,
    ) -> Result<(), PdfToolsError> {
        let advance = size * LINE_SPACING;
        if self.y - advance < layout.margin {
            if self.is_blank() {
                self.y = layout.page_height - layout.margin;
            } else {
                self.flush(builder, layout, resources)?;
            }
        }
        self.y -= advance;
        if !text.is_empty() {
            self.ops
                .extend(text_line_ops(font, size, layout.margin, self.y, text));
        }
        Ok(())
    }

    fn flush(
        &mut self,
        builder: &mut DocumentBuilder,
        layout: &TextLayout,
        resources: &Dictionary,
    ) -> Result<(), PdfToolsError> {
        let content = Content {
            operations: std::mem::take(&mut self.ops),
        };
        builder.add_page(layout.page_width, layout.page_height, content, resources.clone())?;
        self.y = layout.page_height - layout.margin;
        Ok(())
    }
}
