//! User annotations recorded in canvas coordinates.
//!
//! The canvas is the rendered page image the user draws on: origin at the
//! top-left corner, y growing downwards, units in pixels. Conversion to PDF
//! user space happens only at export time through [`CanvasSpace`].

use crate::error::PdfToolsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// A point in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Points(Vec<Point>),
}

impl Geometry {
    /// Normalise negative width/height so the rect origin is its top-left corner.
    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
        let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
        Geometry::Rect {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Highlight,
    Text { content: String, font_size: f32 },
    Draw,
    Shape(ShapeKind),
}

impl AnnotationKind {
    pub fn default_color(&self) -> Color {
        match self {
            AnnotationKind::Highlight => Color::rgba(255, 255, 0, 102),
            AnnotationKind::Text { .. } => Color::rgb(0, 0, 0),
            AnnotationKind::Draw | AnnotationKind::Shape(_) => Color::rgb(255, 0, 0),
        }
    }
}

/// RGBA colour, serialised as `#RRGGBB` or `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn parse_hex(s: &str) -> Result<Self, PdfToolsError> {
        let hex = s.trim().trim_start_matches('#');
        let bad = || PdfToolsError::InvalidConfig(format!("invalid colour '{s}'"));
        if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 255 },
        })
    }

    /// Components scaled to `0.0..=1.0` for PDF colour operators.
    pub fn unit_rgb(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = PdfToolsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::parse_hex(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> String {
        c.to_string()
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn default_stroke_width() -> f32 {
    2.0
}

/// One user mark on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default = "new_id")]
    pub id: String,
    /// 1-based page number.
    pub page: usize,
    pub kind: AnnotationKind,
    pub geometry: Geometry,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
}

impl Annotation {
    pub fn new(page: usize, kind: AnnotationKind, geometry: Geometry) -> Self {
        Self {
            id: new_id(),
            page,
            kind,
            geometry,
            color: None,
            stroke_width: default_stroke_width(),
        }
    }

    pub fn highlight(page: usize, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(page, AnnotationKind::Highlight, Geometry::rect(x, y, width, height))
    }

    pub fn text(page: usize, x: f32, y: f32, content: impl Into<String>, font_size: f32) -> Self {
        Self::new(
            page,
            AnnotationKind::Text {
                content: content.into(),
                font_size,
            },
            Geometry::Points(vec![Point::new(x, y)]),
        )
    }

    pub fn draw(page: usize, points: Vec<Point>) -> Self {
        Self::new(page, AnnotationKind::Draw, Geometry::Points(points))
    }

    pub fn shape(page: usize, shape: ShapeKind, x: f32, y: f32, width: f32, height: f32) -> Self {
        let geometry = match shape {
            ShapeKind::Line => Geometry::Points(vec![Point::new(x, y), Point::new(x + width, y + height)]),
            _ => Geometry::rect(x, y, width, height),
        };
        Self::new(page, AnnotationKind::Shape(shape), geometry)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_stroke_width(mut self, width: f32) -> Self {
        self.stroke_width = width.max(0.1);
        self
    }

    pub fn effective_color(&self) -> Color {
        self.color.unwrap_or_else(|| self.kind.default_color())
    }

    /// Geometry must match the kind: rects for highlight/rectangle/ellipse,
    /// at least one point for text, two for lines and strokes.
    pub fn validate(&self) -> Result<(), PdfToolsError> {
        let invalid = |why: &str| {
            Err(PdfToolsError::InvalidConfig(format!(
                "annotation {} on page {}: {why}",
                self.id, self.page
            )))
        };
        if self.page == 0 {
            return invalid("pages are 1-based");
        }
        match (&self.kind, &self.geometry) {
            (AnnotationKind::Highlight, Geometry::Rect { .. })
            | (AnnotationKind::Shape(ShapeKind::Rectangle), Geometry::Rect { .. })
            | (AnnotationKind::Shape(ShapeKind::Ellipse), Geometry::Rect { .. }) => Ok(()),
            (AnnotationKind::Text { content, .. }, Geometry::Points(p)) => {
                if p.is_empty() {
                    invalid("text needs an anchor point")
                } else if content.is_empty() {
                    invalid("text is empty")
                } else {
                    Ok(())
                }
            }
            (AnnotationKind::Draw, Geometry::Points(p))
            | (AnnotationKind::Shape(ShapeKind::Line), Geometry::Points(p)) => {
                if p.len() < 2 {
                    invalid("needs at least two points")
                } else {
                    Ok(())
                }
            }
            _ => invalid("geometry does not match annotation kind"),
        }
    }
}

/// Flat, unordered collection of annotations for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationLayer {
    annotations: Vec<Annotation>,
}

impl AnnotationLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotation and return its id.
    pub fn add(&mut self, annotation: Annotation) -> String {
        let id = annotation.id.clone();
        self.annotations.push(annotation);
        id
    }

    pub fn remove(&mut self, id: &str) -> Option<Annotation> {
        let pos = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(pos))
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    pub fn for_page(&self, page: usize) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.page == page)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Highest page number any annotation refers to.
    pub fn max_page(&self) -> Option<usize> {
        self.annotations.iter().map(|a| a.page).max()
    }
}

impl FromIterator<Annotation> for AnnotationLayer {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        Self {
            annotations: iter.into_iter().collect(),
        }
    }
}

/// Size of the canvas a page was drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSpace {
    pub width_px: f32,
    pub height_px: f32,
}

impl CanvasSpace {
    pub fn new(width_px: f32, height_px: f32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }

    /// Horizontal and vertical points-per-pixel for a page of the given size.
    pub fn scale(&self, page_width: f32, page_height: f32) -> (f32, f32) {
        let sx = if self.width_px > 0.0 { page_width / self.width_px } else { 1.0 };
        let sy = if self.height_px > 0.0 { page_height / self.height_px } else { 1.0 };
        (sx, sy)
    }

    /// Map a canvas point to PDF user space (origin bottom-left, y up).
    pub fn to_pdf(&self, p: Point, page_width: f32, page_height: f32) -> (f32, f32) {
        let (sx, sy) = self.scale(page_width, page_height);
        (p.x * sx, page_height - p.y * sy)
    }
}

/// Canvas size per page; pages without an entry use `default`, and with no
/// default one canvas pixel is one PDF point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasMap {
    #[serde(default)]
    pub default: Option<CanvasSpace>,
    #[serde(default)]
    pub pages: BTreeMap<usize, CanvasSpace>,
}

impl CanvasMap {
    pub fn uniform(canvas: CanvasSpace) -> Self {
        Self {
            default: Some(canvas),
            pages: BTreeMap::new(),
        }
    }

    pub fn set_page(&mut self, page: usize, canvas: CanvasSpace) {
        self.pages.insert(page, canvas);
    }

    pub fn for_page(&self, page: usize, page_width: f32, page_height: f32) -> CanvasSpace {
        self.pages
            .get(&page)
            .copied()
            .or(self.default)
            .unwrap_or(CanvasSpace::new(page_width, page_height))
    }
}

/// The on-disk form used by the `annotate` command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationFile {
    #[serde(default)]
    pub canvas: CanvasMap,
    pub annotations: Vec<Annotation>,
}

impl AnnotationFile {
    pub fn from_json(json: &str) -> Result<Self, PdfToolsError> {
        let file: AnnotationFile = serde_json::from_str(json)
            .map_err(|e| PdfToolsError::InvalidConfig(format!("annotation file: {e}")))?;
        for a in &file.annotations {
            a.validate()?;
        }
        Ok(file)
    }

    pub fn into_parts(self) -> (AnnotationLayer, CanvasMap) {
        (self.annotations.into_iter().collect(), self.canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_colours() {
        assert_eq!(Color::parse_hex("#ff8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(Color::parse_hex("FFFF0066").unwrap(), Color::rgba(255, 255, 0, 0x66));
        assert!(Color::parse_hex("#fff").is_err());
        assert!(Color::parse_hex("#gg0000").is_err());
        assert!(Color::parse_hex("#+f+f+f").is_err());
        assert!(Color::parse_hex("+f+f+f+f").is_err());
        assert_eq!(Color::rgba(1, 2, 3, 4).to_string(), "#01020304");
    }

    #[test]
    fn ids_are_unique() {
        let a = Annotation::highlight(1, 0.0, 0.0, 10.0, 10.0);
        let b = Annotation::highlight(1, 0.0, 0.0, 10.0, 10.0);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 32);
    }

    #[test]
    fn layer_add_remove_clear() {
        let mut layer = AnnotationLayer::new();
        let id = layer.add(Annotation::highlight(1, 0.0, 0.0, 5.0, 5.0));
        layer.add(Annotation::draw(2, vec![Point::new(0.0, 0.0), Point::new(3.0, 3.0)]));
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.for_page(2).count(), 1);
        assert_eq!(layer.max_page(), Some(2));

        assert!(layer.remove(&id).is_some());
        assert!(layer.remove(&id).is_none());
        layer.clear();
        assert!(layer.is_empty());
    }

    #[test]
    fn negative_rect_is_normalised() {
        assert_eq!(
            Geometry::rect(10.0, 10.0, -4.0, -6.0),
            Geometry::Rect {
                x: 6.0,
                y: 4.0,
                width: 4.0,
                height: 6.0
            }
        );
    }

    #[test]
    fn validate_rejects_mismatched_geometry() {
        let mut a = Annotation::highlight(1, 0.0, 0.0, 1.0, 1.0);
        a.geometry = Geometry::Points(vec![]);
        assert!(a.validate().is_err());
        assert!(Annotation::draw(1, vec![Point::new(0.0, 0.0)]).validate().is_err());
        assert!(Annotation::text(1, 5.0, 5.0, "hi", 12.0).validate().is_ok());
    }

    #[test]
    fn canvas_maps_to_pdf_space() {
        let canvas = CanvasSpace::new(1224.0, 1584.0);
        let (x, y) = canvas.to_pdf(Point::new(612.0, 0.0), 612.0, 792.0);
        assert_eq!((x, y), (306.0, 792.0));
        let (_, y) = canvas.to_pdf(Point::new(0.0, 1584.0), 612.0, 792.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn canvas_map_falls_back_to_points() {
        let mut map = CanvasMap::default();
        assert_eq!(map.for_page(1, 612.0, 792.0), CanvasSpace::new(612.0, 792.0));
        map.set_page(2, CanvasSpace::new(100.0, 100.0));
        assert_eq!(map.for_page(2, 612.0, 792.0), CanvasSpace::new(100.0, 100.0));
    }

    #[test]
    fn annotation_file_from_json() {
        let json = r##"{
            "canvas": { "default": { "width_px": 800, "height_px": 1000 } },
            "annotations": [
                { "page": 1, "kind": "highlight",
                  "geometry": { "rect": { "x": 10, "y": 20, "width": 100, "height": 15 } } },
                { "page": 2, "kind": { "text": { "content": "Note", "font_size": 14 } },
                  "geometry": { "points": [ { "x": 50, "y": 60 } ] }, "color": "#0000FF" }
            ]
        }"##;
        let file = AnnotationFile::from_json(json).unwrap();
        let (layer, canvas) = file.into_parts();
        assert_eq!(layer.len(), 2);
        assert_eq!(canvas.default, Some(CanvasSpace::new(800.0, 1000.0)));
        let text = layer.for_page(2).next().unwrap();
        assert_eq!(text.effective_color(), Color::rgb(0, 0, 255));
        assert!(!text.id.is_empty());
    }
}
