use std::fmt::Write as _;
use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::geometry::pts_to_twips;

use super::styles::{footer_xml, paragraph_properties, runs, section_properties, styles_xml};
use super::{DocxBlock, DocxDocument, DocxParagraph, DocxTable};

const STYLES_REL: &str = "rId1";
const FOOTER_REL: &str = "rId2";

pub(crate) fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn paragraph(p: &DocxParagraph, sect_pr: Option<&str>, out: &mut String) {
    out.push_str("<w:p>");
    paragraph_properties(p, sect_pr, out);
    runs(p, out);
    out.push_str("</w:p>");
}

fn table(t: &DocxTable, width: f32, out: &mut String) {
    let col = pts_to_twips(width / 2.0);
    let _ = write!(
        out,
        r#"<w:tbl><w:tblPr><w:tblW w:w="{}" w:type="dxa"/><w:tblBorders>"#,
        col * 2
    );
    for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        let _ = write!(out, r#"<w:{side} w:val="nil"/>"#);
    }
    let _ = write!(
        out,
        r#"</w:tblBorders><w:tblLayout w:type="fixed"/></w:tblPr><w:tblGrid><w:gridCol w:w="{col}"/><w:gridCol w:w="{col}"/></w:tblGrid>"#
    );
    for row in &t.rows {
        out.push_str("<w:tr><w:trPr><w:cantSplit/></w:trPr>");
        for cell in row {
            let _ = write!(out, r#"<w:tc><w:tcPr><w:tcW w:w="{col}" w:type="dxa"/></w:tcPr>"#);
            for p in cell {
                paragraph(p, None, out);
            }
            out.push_str("</w:tc>");
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
}

fn document_xml(doc: &DocxDocument) -> String {
    let mut out = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#,
        r#" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#,
        r#" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing">"#,
        "<w:body>",
    ));
    let footer = doc.has_footer().then_some(FOOTER_REL);
    let last_section = doc.sections.len().saturating_sub(1);

    for (si, section) in doc.sections.iter().enumerate() {
        let mut sect_pr = String::new();
        section_properties(section, footer, &mut sect_pr);
        let width = section.geometry.writable_width();
        let is_final = si == last_section;
        let last_child = section.children.len().saturating_sub(1);

        for (ci, child) in section.children.iter().enumerate() {
            match child {
                DocxBlock::Paragraph(p) => {
                    let closes = !is_final && ci == last_child;
                    paragraph(p, closes.then_some(sect_pr.as_str()), &mut out);
                }
                DocxBlock::Table(t) => table(t, width, &mut out),
            }
        }
        let ends_in_paragraph = matches!(section.children.last(), Some(DocxBlock::Paragraph(_)));
        if is_final {
            out.push_str(&sect_pr);
        } else if !ends_in_paragraph {
            let _ = write!(out, "<w:p><w:pPr>{sect_pr}</w:pPr></w:p>");
        }
    }
    out.push_str("</w:body></w:document>");
    out
}

fn content_types_xml(doc: &DocxDocument) -> String {
    let mut out = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    ));
    let mut formats: Vec<_> = doc.media.iter().map(|m| m.format).collect();
    formats.sort_by_key(|f| f.extension());
    formats.dedup();
    for format in formats {
        let _ = write!(
            out,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.mime()
        );
    }
    out.push_str(concat!(
        r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
    ));
    if doc.has_footer() {
        out.push_str(r#"<Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#);
    }
    out.push_str("</Types>");
    out
}

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#,
);

fn document_rels_xml(doc: &DocxDocument) -> String {
    const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    let mut out = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    ));
    let _ = write!(
        out,
        r#"<Relationship Id="{STYLES_REL}" Type="{REL}/styles" Target="styles.xml"/>"#
    );
    if doc.has_footer() {
        let _ = write!(
            out,
            r#"<Relationship Id="{FOOTER_REL}" Type="{REL}/footer" Target="footer1.xml"/>"#
        );
    }
    for media in &doc.media {
        let _ = write!(
            out,
            r#"<Relationship Id="{}" Type="{REL}/image" Target="media/{}"/>"#,
            media.rel_id, media.file_name
        );
    }
    out.push_str("</Relationships>");
    out
}

pub(super) fn write(doc: &DocxDocument) -> Result<Vec<u8>> {
    let t0 = std::time::Instant::now();
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut parts: Vec<(String, Vec<u8>)> = vec![
        ("[Content_Types].xml".into(), content_types_xml(doc).into_bytes()),
        ("_rels/.rels".into(), ROOT_RELS.as_bytes().to_vec()),
        ("word/document.xml".into(), document_xml(doc).into_bytes()),
        ("word/styles.xml".into(), styles_xml(&doc.font_family, doc.line).into_bytes()),
        ("word/_rels/document.xml.rels".into(), document_rels_xml(doc).into_bytes()),
    ];
    if doc.has_footer() {
        parts.push(("word/footer1.xml".into(), footer_xml().into_bytes()));
    }
    for (path, data) in &parts {
        zip.start_file(path.as_str(), options)?;
        zip.write_all(data)?;
    }
    for media in &doc.media {
        zip.start_file(format!("word/media/{}", media.file_name), options)?;
        zip.write_all(&media.data)?;
    }
    let bytes = zip.finish()?.into_inner();

    log::debug!(
        "DOCX package: {} sections, {} images, {} bytes in {:.1}ms",
        doc.sections.len(),
        doc.media.len(),
        bytes.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(bytes)
}
