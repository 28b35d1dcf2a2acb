//! Burn annotations into page content streams.
//!
//! Annotations are drawn as ordinary page content, not as PDF annotation
//! objects, so every viewer shows them identically. The existing content is
//! wrapped in `q … Q` first; whatever graphics state it leaves behind cannot
//! shift the new marks.

use crate::annotation::{
    Annotation, AnnotationKind, AnnotationLayer, CanvasMap, CanvasSpace, Geometry, Point, ShapeKind,
};
use crate::emit::{Artifact, OutputNaming};
use crate::error::PdfToolsError;
use crate::pipeline::document;
use crate::pipeline::layout::text_line_ops;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeSet;
use tracing::{debug, info};

const FONT_RESOURCE: &str = "PtHelv";
/// Bézier control-point factor for approximating a quarter ellipse.
const KAPPA: f32 = 0.552_284_8;

/// Draw every annotation onto its page and return `edited_<name>`.
pub fn apply_annotations(
    bytes: &[u8],
    name: &str,
    layer: &AnnotationLayer,
    canvas: &CanvasMap,
) -> Result<Artifact, PdfToolsError> {
    if layer.is_empty() {
        return Err(PdfToolsError::NoAnnotations);
    }
    for a in layer.iter() {
        a.validate()?;
    }

    let mut doc = document::load(name, bytes)?;
    let pages = doc.get_pages();
    let total = pages.len();
    if let Some(max) = layer.max_page().filter(|&p| p > total) {
        return Err(PdfToolsError::PageOutOfRange { page: max, total });
    }

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    for (&page_num, &page_id) in &pages {
        let on_page: Vec<&Annotation> = layer.for_page(page_num as usize).collect();
        if on_page.is_empty() {
            continue;
        }
        let (w, h) = document::page_size(&doc, page_id);
        let space = canvas.for_page(page_num as usize, w, h);
        let painter = Painter { space, width: w, height: h };

        let mut ops = Vec::new();
        let mut opacities = BTreeSet::new();
        for a in &on_page {
            let color = a.effective_color();
            if !color.is_opaque() {
                opacities.insert(color.a);
            }
            ops.extend(painter.draw(a));
        }

        register_resources(&mut doc, page_id, font_id, &opacities)?;
        append_wrapped(&mut doc, page_id, ops)?;
        debug!("Page {}: drew {} annotations", page_num, on_page.len());
    }

    info!("Applied {} annotations to '{}'", layer.len(), name);
    Ok(Artifact::pdf(
        OutputNaming::prefixed("edited_", name),
        document::to_bytes(doc)?,
    ))
}

fn gs_name(alpha: u8) -> String {
    format!("PtGS{alpha}")
}

fn register_resources(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    opacities: &BTreeSet<u8>,
) -> Result<(), PdfToolsError> {
    let resources = document::page_resources_mut(doc, page_id)?;
    document::sub_dict_mut(resources, b"Font")?.set(FONT_RESOURCE, font_id);
    let ext = document::sub_dict_mut(resources, b"ExtGState")?;
    for &alpha in opacities {
        let a = alpha as f32 / 255.0;
        ext.set(
            gs_name(alpha),
            dictionary! {
                "Type" => "ExtGState",
                "ca" => Object::Real(a),
                "CA" => Object::Real(a),
            },
        );
    }
    Ok(())
}

/// Contents becomes `[q, …original…, Q + ops]`.
fn append_wrapped(doc: &mut Document, page_id: ObjectId, ops: Vec<Operation>) -> Result<(), PdfToolsError> {
    let mut existing: Vec<Object> = match document::inherited(doc, page_id, b"Contents") {
        Some(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Some(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let encoded = Content { operations: ops }
        .encode()
        .map_err(|e| PdfToolsError::Internal(format!("content encoding failed: {e}")))?;
    let prefix = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let suffix = doc.add_object(Stream::new(dictionary! {}, [b"Q\n".as_slice(), encoded.as_slice()].concat()));

    existing.insert(0, Object::Reference(prefix));
    existing.push(Object::Reference(suffix));

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfToolsError::Internal(e.to_string()))?;
    page.set("Contents", existing);
    Ok(())
}

/// Turns canvas-space annotations into PDF drawing operators for one page.
struct Painter {
    space: CanvasSpace,
    width: f32,
    height: f32,
}

impl Painter {
    fn pt(&self, p: Point) -> (f32, f32) {
        self.space.to_pdf(p, self.width, self.height)
    }

    /// Lower-left corner plus size of a canvas rect, in PDF space.
    fn rect(&self, x: f32, y: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
        let (sx, sy) = self.space.scale(self.width, self.height);
        let (px, top) = self.pt(Point::new(x, y));
        (px, top - h * sy, w * sx, h * sy)
    }

    fn line_width(&self, canvas_width: f32) -> f32 {
        let (sx, sy) = self.space.scale(self.width, self.height);
        canvas_width * (sx + sy) / 2.0
    }

    fn draw(&self, a: &Annotation) -> Vec<Operation> {
        let color = a.effective_color();
        let (r, g, b) = color.unit_rgb();
        let mut ops = vec![Operation::new("q", vec![])];
        if !color.is_opaque() {
            ops.push(Operation::new("gs", vec![Object::Name(gs_name(color.a).into_bytes())]));
        }

        match (&a.kind, &a.geometry) {
            (AnnotationKind::Highlight, Geometry::Rect { x, y, width, height }) => {
                let (px, py, pw, ph) = self.rect(*x, *y, *width, *height);
                ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
                ops.push(Operation::new("re", vec![px.into(), py.into(), pw.into(), ph.into()]));
                ops.push(Operation::new("f", vec![]));
            }
            (AnnotationKind::Shape(ShapeKind::Rectangle), Geometry::Rect { x, y, width, height }) => {
                let (px, py, pw, ph) = self.rect(*x, *y, *width, *height);
                ops.extend(self.stroke_setup(a, (r, g, b)));
                ops.push(Operation::new("re", vec![px.into(), py.into(), pw.into(), ph.into()]));
                ops.push(Operation::new("S", vec![]));
            }
            (AnnotationKind::Shape(ShapeKind::Ellipse), Geometry::Rect { x, y, width, height }) => {
                let (px, py, pw, ph) = self.rect(*x, *y, *width, *height);
                ops.extend(self.stroke_setup(a, (r, g, b)));
                ops.extend(ellipse_path(px + pw / 2.0, py + ph / 2.0, pw / 2.0, ph / 2.0));
                ops.push(Operation::new("S", vec![]));
            }
            (AnnotationKind::Draw, Geometry::Points(points))
            | (AnnotationKind::Shape(ShapeKind::Line), Geometry::Points(points)) => {
                ops.extend(self.stroke_setup(a, (r, g, b)));
                for (i, p) in points.iter().enumerate() {
                    let (px, py) = self.pt(*p);
                    let op = if i == 0 { "m" } else { "l" };
                    ops.push(Operation::new(op, vec![px.into(), py.into()]));
                }
                ops.push(Operation::new("S", vec![]));
            }
            (AnnotationKind::Text { content, font_size }, Geometry::Points(points)) => {
                let (_, sy) = self.space.scale(self.width, self.height);
                let size = font_size * sy;
                let (x, top) = self.pt(points[0]);
                ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
                for (i, line) in content.lines().enumerate() {
                    let baseline = top - size - i as f32 * size * 1.2;
                    ops.extend(text_line_ops(FONT_RESOURCE, size, x, baseline, line));
                }
            }
            // Rejected by Annotation::validate before drawing.
            _ => {}
        }

        ops.push(Operation::new("Q", vec![]));
        ops
    }

    fn stroke_setup(&self, a: &Annotation, (r, g, b): (f32, f32, f32)) -> Vec<Operation> {
        vec![
            Operation::new("RG", vec![r.into(), g.into(), b.into()]),
            Operation::new("w", vec![self.line_width(a.stroke_width).into()]),
            Operation::new("J", vec![1.into()]),
            Operation::new("j", vec![1.into()]),
        ]
    }
}

fn ellipse_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Vec<Operation> {
    let (ox, oy) = (rx * KAPPA, ry * KAPPA);
    let curve = |pts: [f32; 6]| Operation::new("c", pts.iter().map(|&v| v.into()).collect());
    vec![
        Operation::new("m", vec![(cx + rx).into(), cy.into()]),
        curve([cx + rx, cy + oy, cx + ox, cy + ry, cx, cy + ry]),
        curve([cx - ox, cy + ry, cx - rx, cy + oy, cx - rx, cy]),
        curve([cx - rx, cy - oy, cx - ox, cy - ry, cx, cy - ry]),
        curve([cx + ox, cy - ry, cx + rx, cy - oy, cx + rx, cy]),
        Operation::new("h", vec![]),
    ]
}
