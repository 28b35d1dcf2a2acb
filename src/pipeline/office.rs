//! Office Open XML packages: text out of `.docx`/`.pptx`/`.xlsx`, and
//! minimal packages written from per-page text.
//!
//! Only text is carried across in either direction. Styles, tables,
//! images and positioning are dropped.

use crate::error::PdfToolsError;
use crate::pipeline::layout::Block;
use calamine::{open_workbook_from_rs, Reader as _, Xlsx};
use once_cell::sync::Lazy;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

static RE_SLIDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").expect("static regex"));

fn parse_err(name: &str, detail: impl ToString) -> PdfToolsError {
    PdfToolsError::OfficeParse {
        path: Path::new(name).to_path_buf(),
        detail: detail.to_string(),
    }
}

fn open_archive<'a>(name: &str, bytes: &'a [u8]) -> Result<ZipArchive<Cursor<&'a [u8]>>, PdfToolsError> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| parse_err(name, e))
}

fn read_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
    entry: &str,
) -> Result<String, PdfToolsError> {
    let mut file = archive
        .by_name(entry)
        .map_err(|e| parse_err(name, format!("{entry}: {e}")))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| parse_err(name, format!("{entry}: {e}")))?;
    Ok(xml)
}

/// Collect the text of every `<*:p>` paragraph, reading only `<*:t>` runs.
///
/// Matches on local names, so the same walk serves WordprocessingML
/// (`w:p`/`w:t`) and DrawingML (`a:p`/`a:t`).
fn paragraphs(name: &str, xml: &str) -> Result<Vec<String>, PdfToolsError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_para = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => {
                    in_para = true;
                    current.clear();
                }
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" if in_para => current.push('\t'),
                b"br" if in_para => current.push('\n'),
                b"p" => out.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| parse_err(name, e))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    in_para = false;
                    out.push(std::mem::take(&mut current));
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_err(name, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// Paragraphs of `word/document.xml`.
pub fn docx_blocks(name: &str, bytes: &[u8]) -> Result<Vec<Block>, PdfToolsError> {
    let mut archive = open_archive(name, bytes)?;
    let xml = read_entry(&mut archive, name, "word/document.xml")?;
    let paras = paragraphs(name, &xml)?;
    debug!("'{}': {} paragraphs", name, paras.len());
    Ok(vec![Block::Paragraph(paras.join("\n"))])
}

/// Visit every element named `local`, start or empty, in document order.
fn scan_elements(
    name: &str,
    xml: &str,
    local: &[u8],
    mut visit: impl FnMut(&BytesStart) -> Result<(), PdfToolsError>,
) -> Result<(), PdfToolsError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == local => {
                visit(&e)?
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_err(name, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn attr_value(
    name: &str,
    e: &BytesStart,
    key: impl Fn(&[u8]) -> bool,
) -> Result<Option<String>, PdfToolsError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| parse_err(name, e))?;
        if key(attr.key.as_ref()) {
            let value = attr.unescape_value().map_err(|e| parse_err(name, e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Slide parts in presentation order, from `<p:sldIdLst>` resolved through
/// `ppt/_rels/presentation.xml.rels`.
///
/// Empty when either part is missing or lists nothing that exists.
fn presentation_order(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<String>, PdfToolsError> {
    const PRESENTATION: &str = "ppt/presentation.xml";
    const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

    let parts: HashSet<String> = archive.file_names().map(str::to_string).collect();
    if !parts.contains(PRESENTATION) || !parts.contains(PRESENTATION_RELS) {
        return Ok(Vec::new());
    }

    let mut rel_ids = Vec::new();
    let presentation = read_entry(archive, name, PRESENTATION)?;
    scan_elements(name, &presentation, b"sldId", |e| {
        if let Some(id) = attr_value(name, e, |k| k.ends_with(b":id"))? {
            rel_ids.push(id);
        }
        Ok(())
    })?;

    let mut targets = HashMap::new();
    let rels = read_entry(archive, name, PRESENTATION_RELS)?;
    scan_elements(name, &rels, b"Relationship", |e| {
        let id = attr_value(name, e, |k| k == b"Id")?;
        let target = attr_value(name, e, |k| k == b"Target")?;
        if let (Some(id), Some(target)) = (id, target) {
            targets.insert(id, target);
        }
        Ok(())
    })?;

    Ok(rel_ids
        .iter()
        .filter_map(|id| targets.get(id))
        .map(|target| match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("ppt/{}", target.trim_start_matches("./")),
        })
        .filter(|part| parts.contains(part))
        .collect())
}

/// One titled block per slide, in presentation order.
///
/// Falls back to slide-number order when `ppt/presentation.xml` gives none.
pub fn pptx_blocks(name: &str, bytes: &[u8]) -> Result<Vec<Block>, PdfToolsError> {
    let mut archive = open_archive(name, bytes)?;
    let mut slides = presentation_order(&mut archive, name)?;
    if slides.is_empty() {
        let mut numbered: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|f| {
                let n = RE_SLIDE.captures(f)?.get(1)?.as_str().parse().ok()?;
                Some((n, f.to_string()))
            })
            .collect();
        numbered.sort_unstable_by_key(|(n, _)| *n);
        slides = numbered.into_iter().map(|(_, f)| f).collect();
    }

    if slides.is_empty() {
        return Err(parse_err(name, "presentation has no slides"));
    }

    let mut blocks = Vec::with_capacity(slides.len() * 3);
    for (i, entry) in slides.iter().enumerate() {
        let xml = read_entry(&mut archive, name, entry)?;
        let text: Vec<String> = paragraphs(name, &xml)?
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if i > 0 {
            blocks.push(Block::PageBreak);
        }
        blocks.push(Block::Title(format!("Slide {}", i + 1)));
        blocks.push(Block::Paragraph(text.join("\n")));
    }
    debug!("'{}': {} slides", name, slides.len());
    Ok(blocks)
}

/// Every sheet as a title plus one tab-separated line per row.
pub fn xlsx_blocks(name: &str, bytes: &[u8]) -> Result<Vec<Block>, PdfToolsError> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).map_err(|e| parse_err(name, e))?;

    let mut blocks = Vec::new();
    for sheet in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| parse_err(name, format!("sheet '{sheet}': {e}")))?;
        let rows: Vec<String> = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_string())
                    .collect::<Vec<_>>()
                    .join("\t")
                    .trim_end()
                    .to_string()
            })
            .collect();
        debug!("'{}': sheet '{}' has {} rows", name, sheet, rows.len());
        blocks.push(Block::Title(sheet));
        blocks.push(Block::Paragraph(rows.join("\n")));
    }
    Ok(blocks)
}

// ── Writers ─────────────────────────────────────────────────────────────────

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const REL_OFFICE_DOC: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// XML 1.0 forbids most control characters even when escaped.
fn xml_text(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .filter(|&c| c == '\t' || c == '\n' || c >= ' ')
        .collect();
    escape(cleaned.as_str()).into_owned()
}

struct Package {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl Package {
    fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    fn part(&mut self, path: &str, xml: &str) -> Result<(), PdfToolsError> {
        self.writer
            .start_file(path, self.options)
            .map_err(|e| PdfToolsError::Archive(e.to_string()))?;
        self.writer
            .write_all(XML_HEADER.as_bytes())
            .and_then(|_| self.writer.write_all(xml.as_bytes()))
            .map_err(|e| PdfToolsError::Archive(e.to_string()))
    }

    fn finish(self) -> Result<Vec<u8>, PdfToolsError> {
        self.writer
            .finish()
            .map(Cursor::into_inner)
            .map_err(|e| PdfToolsError::Archive(e.to_string()))
    }
}

fn content_types(overrides: &[(String, &str)]) -> String {
    let mut xml = String::from(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>"#,
    );
    for (part, ct) in overrides {
        xml.push_str(&format!(r#"<Override PartName="{part}" ContentType="{ct}"/>"#));
    }
    xml.push_str("</Types>");
    xml
}

fn relationships(rels: &[(String, &str, String)]) -> String {
    let mut xml = format!(r#"<Relationships xmlns="{NS_PKG_REL}">"#);
    for (id, kind, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{id}" Type="{kind}" Target="{target}"/>"#
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn root_rels(target: &str) -> String {
    relationships(&[("rId1".into(), REL_OFFICE_DOC, target.into())])
}

/// A `.docx` with one paragraph per line and a page break between pages.
pub fn write_docx(pages: &[String]) -> Result<Vec<u8>, PdfToolsError> {
    let mut body = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            body.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
        }
        for line in page.lines() {
            body.push_str(&format!(
                r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                xml_text(line)
            ));
        }
    }
    let document = format!(
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut pkg = Package::new();
    pkg.part(
        "[Content_Types].xml",
        &content_types(&[(
            "/word/document.xml".into(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        )]),
    )?;
    pkg.part("_rels/.rels", &root_rels("word/document.xml"))?;
    pkg.part("word/document.xml", &document)?;
    pkg.finish()
}

/// A `.xlsx` with one sheet: a header row, then `page | line | text` per line.
pub fn write_xlsx(pages: &[String]) -> Result<Vec<u8>, PdfToolsError> {
    let cell = |col: char, row: usize, value: &str| {
        format!(
            r#"<c r="{col}{row}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            xml_text(value)
        )
    };
    let num = |col: char, row: usize, value: usize| format!(r#"<c r="{col}{row}"><v>{value}</v></c>"#);

    let mut rows = format!(
        r#"<row r="1">{}{}{}</row>"#,
        cell('A', 1, "Page"),
        cell('B', 1, "Line"),
        cell('C', 1, "Text")
    );
    let mut r = 1;
    for (p, page) in pages.iter().enumerate() {
        for (l, line) in page.lines().filter(|l| !l.trim().is_empty()).enumerate() {
            r += 1;
            rows.push_str(&format!(
                r#"<row r="{r}">{}{}{}</row>"#,
                num('A', r, p + 1),
                num('B', r, l + 1),
                cell('C', r, line)
            ));
        }
    }

    let sheet = format!(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{rows}</sheetData></worksheet>"#
    );
    let workbook = format!(
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{NS_REL}"><sheets><sheet name="Text" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    );

    let mut pkg = Package::new();
    pkg.part(
        "[Content_Types].xml",
        &content_types(&[
            (
                "/xl/workbook.xml".into(),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
            ),
            (
                "/xl/worksheets/sheet1.xml".into(),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
            ),
        ]),
    )?;
    pkg.part("_rels/.rels", &root_rels("xl/workbook.xml"))?;
    pkg.part("xl/workbook.xml", &workbook)?;
    pkg.part(
        "xl/_rels/workbook.xml.rels",
        &relationships(&[(
            "rId1".into(),
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
            "worksheets/sheet1.xml".into(),
        )]),
    )?;
    pkg.part("xl/worksheets/sheet1.xml", &sheet)?;
    pkg.finish()
}

const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

const EMPTY_SP_TREE: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#;

const THEME: &str = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Plain"><a:themeElements><a:clrScheme name="Plain"><a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F1F1F"/></a:dk2><a:lt2><a:srgbClr val="EEEEEE"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Plain"><a:majorFont><a:latin typeface="Arial"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Arial"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Plain"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#;

/// A `.pptx` with one text-box slide per page.
pub fn write_pptx(pages: &[String]) -> Result<Vec<u8>, PdfToolsError> {
    let ns = format!(r#"xmlns:a="{NS_A}" xmlns:r="{NS_REL}" xmlns:p="{NS_P}""#);
    let slides = if pages.is_empty() { vec![String::new()] } else { pages.to_vec() };

    let mut overrides: Vec<(String, &str)> = vec![
        (
            "/ppt/presentation.xml".into(),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
        ),
        (
            "/ppt/slideMasters/slideMaster1.xml".into(),
            "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml",
        ),
        (
            "/ppt/slideLayouts/slideLayout1.xml".into(),
            "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml",
        ),
        (
            "/ppt/theme/theme1.xml".into(),
            "application/vnd.openxmlformats-officedocument.theme+xml",
        ),
    ];
    let mut pres_rels = vec![
        ("rId1".to_string(), REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml".to_string()),
        ("rId2".to_string(), REL_THEME, "theme/theme1.xml".to_string()),
    ];
    let mut slide_ids = String::new();
    for i in 1..=slides.len() {
        overrides.push((
            format!("/ppt/slides/slide{i}.xml"),
            "application/vnd.openxmlformats-officedocument.presentationml.slide+xml",
        ));
        pres_rels.push((format!("rId{}", i + 2), REL_SLIDE, format!("slides/slide{i}.xml")));
        slide_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i + 2));
    }

    let presentation = format!(
        r#"<p:presentation {ns}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    );
    let master = format!(
        r#"<p:sldMaster {ns}><p:cSld><p:spTree>{EMPTY_SP_TREE}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#
    );
    let layout = format!(
        r#"<p:sldLayout {ns}><p:cSld><p:spTree>{EMPTY_SP_TREE}</p:spTree></p:cSld></p:sldLayout>"#
    );

    let mut pkg = Package::new();
    pkg.part("[Content_Types].xml", &content_types(&overrides))?;
    pkg.part("_rels/.rels", &root_rels("ppt/presentation.xml"))?;
    pkg.part("ppt/presentation.xml", &presentation)?;
    pkg.part("ppt/_rels/presentation.xml.rels", &relationships(&pres_rels))?;
    pkg.part("ppt/slideMasters/slideMaster1.xml", &master)?;
    pkg.part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &relationships(&[
            ("rId1".into(), REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml".into()),
            ("rId2".into(), REL_THEME, "../theme/theme1.xml".into()),
        ]),
    )?;
    pkg.part("ppt/slideLayouts/slideLayout1.xml", &layout)?;
    pkg.part(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        &relationships(&[(
            "rId1".into(),
            REL_SLIDE_MASTER,
            "../slideMasters/slideMaster1.xml".into(),
        )]),
    )?;
    pkg.part("ppt/theme/theme1.xml", THEME)?;

    let slide_layout_rel = relationships(&[(
        "rId1".into(),
        REL_SLIDE_LAYOUT,
        "../slideLayouts/slideLayout1.xml".into(),
    )]);
    for (i, text) in slides.iter().enumerate() {
        let paras: String = text
            .lines()
            .map(|line| {
                if line.trim().is_empty() {
                    "<a:p/>".to_string()
                } else {
                    format!(
                        r#"<a:p><a:r><a:rPr lang="en-US" sz="1400" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                        xml_text(line)
                    )
                }
            })
            .collect();
        let paras = if paras.is_empty() { "<a:p/>".to_string() } else { paras };
        let slide = format!(
            r#"<p:sld {ns}><p:cSld><p:spTree>{EMPTY_SP_TREE}<p:sp><p:nvSpPr><p:cNvPr id="2" name="Text {n}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="457200"/><a:ext cx="8229600" cy="5943600"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr wrap="square"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paras}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            n = i + 1
        );
        pkg.part(&format!("ppt/slides/slide{}.xml", i + 1), &slide)?;
        pkg.part(
            &format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
            &slide_layout_rel,
        )?;
    }
    pkg.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph_text(blocks: &[Block]) -> String {
        blocks
            .iter()
            .filter_map(|b| match b {
                Block::Paragraph(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn paragraphs_keep_runs_and_breaks() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
            <w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>
            <w:p/>
            <w:p><w:r><w:t>a</w:t><w:tab/><w:t>b &amp; c</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let paras = paragraphs("t.docx", xml).unwrap();
        assert_eq!(paras, vec!["Hello world", "", "a\tb & c"]);
    }

    #[test]
    fn docx_written_then_read() {
        let pages = vec!["first line\nsecond <line>".to_string(), "next page".to_string()];
        let bytes = write_docx(&pages).unwrap();
        let blocks = docx_blocks("out.docx", &bytes).unwrap();
        let text = paragraph_text(&blocks);
        assert!(text.contains("first line"));
        assert!(text.contains("second <line>"));
        assert!(text.contains("next page"));
    }

    #[test]
    fn pptx_written_then_read_one_slide_per_page() {
        let pages = vec!["Title A\nbody".to_string(), "Title B".to_string()];
        let bytes = write_pptx(&pages).unwrap();
        let blocks = pptx_blocks("out.pptx", &bytes).unwrap();
        assert_eq!(blocks.iter().filter(|b| **b == Block::PageBreak).count(), 1);
        assert_eq!(blocks[0], Block::Title("Slide 1".into()));
        assert!(paragraph_text(&blocks).contains("Title B"));
    }

    fn slide(text: &str) -> String {
        format!(
            r#"<p:sld xmlns:a="{NS_A}" xmlns:p="{NS_P}"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
        )
    }

    #[test]
    fn pptx_slides_follow_presentation_order() {
        let mut pkg = Package::new();
        pkg.part(
            "ppt/presentation.xml",
            &format!(
                r#"<p:presentation xmlns:p="{NS_P}" xmlns:r="{NS_REL}"><p:sldIdLst><p:sldId id="256" r:id="rId3"/><p:sldId id="257" r:id="rId2"/></p:sldIdLst></p:presentation>"#
            ),
        )
        .unwrap();
        pkg.part(
            "ppt/_rels/presentation.xml.rels",
            &relationships(&[
                ("rId2".into(), REL_SLIDE, "slides/slide1.xml".into()),
                ("rId3".into(), REL_SLIDE, "slides/slide2.xml".into()),
            ]),
        )
        .unwrap();
        pkg.part("ppt/slides/slide1.xml", &slide("shown second")).unwrap();
        pkg.part("ppt/slides/slide2.xml", &slide("shown first")).unwrap();
        let bytes = pkg.finish().unwrap();

        let blocks = pptx_blocks("reordered.pptx", &bytes).unwrap();
        assert_eq!(
            blocks,
            vec![
                Block::Title("Slide 1".into()),
                Block::Paragraph("shown first".into()),
                Block::PageBreak,
                Block::Title("Slide 2".into()),
                Block::Paragraph("shown second".into()),
            ]
        );
    }

    #[test]
    fn pptx_without_presentation_part_uses_slide_numbers() {
        let mut pkg = Package::new();
        pkg.part("ppt/slides/slide10.xml", &slide("ten")).unwrap();
        pkg.part("ppt/slides/slide2.xml", &slide("two")).unwrap();
        let bytes = pkg.finish().unwrap();

        let blocks = pptx_blocks("bare.pptx", &bytes).unwrap();
        assert_eq!(blocks[1], Block::Paragraph("two".into()));
        assert_eq!(blocks[4], Block::Paragraph("ten".into()));
    }

    #[test]
    fn xlsx_written_then_read() {
        let pages = vec!["alpha\nbeta".to_string(), "gamma".to_string()];
        let bytes = write_xlsx(&pages).unwrap();
        let blocks = xlsx_blocks("out.xlsx", &bytes).unwrap();
        assert_eq!(blocks[0], Block::Title("Text".into()));
        let text = paragraph_text(&blocks);
        assert!(text.contains("Page\tLine\tText"));
        assert!(text.contains("2\t1\tgamma"));
    }

    #[test]
    fn not_a_zip_is_a_parse_error() {
        let err = docx_blocks("bad.docx", b"plain").unwrap_err();
        assert!(matches!(err, PdfToolsError::OfficeParse { .. }));
    }

    #[test]
    fn xml_text_drops_control_chars() {
        assert_eq!(xml_text("a\u{1}b<"), "ab&lt;");
    }
}
