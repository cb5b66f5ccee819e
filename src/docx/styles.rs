//! `w:pPr` / `w:rPr` / `styles.xml` emitters.

use std::fmt::Write;

use crate::geometry::{BorderStyle, PageBorder, PageGeometry, pts_to_twips};
use crate::model::Alignment;

use super::package::escape_xml;
use super::{DocxParagraph, DocxRun, DocxSection};

pub(super) const SHADING_FILL: &str = "D9D9D9";

/// Page size of an A4 sheet in twips.
const A4_TWIPS: (u32, u32) = (11906, 16838);

/// Distance from the page edge to the border, in points.
const BORDER_SPACE: u32 = 24;

fn jc(align: Alignment) -> &'static str {
    match align {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "both",
    }
}

/// `sect_pr` closes a section when this is its last paragraph.
pub(super) fn paragraph_properties(p: &DocxParagraph, sect_pr: Option<&str>, out: &mut String) {
    let s = &p.style;
    out.push_str("<w:pPr>");
    if s.keep_next {
        out.push_str("<w:keepNext/>");
    }
    if p.keep_lines {
        out.push_str("<w:keepLines/>");
    }
    if p.page_break_before {
        out.push_str("<w:pageBreakBefore/>");
    }
    if s.shaded {
        let _ = write!(out, r#"<w:shd w:val="clear" w:color="auto" w:fill="{SHADING_FILL}"/>"#);
    }
    if let Some(tab) = p.right_tab {
        let leader = if tab.dotted { r#" w:leader="dot""# } else { "" };
        let _ = write!(
            out,
            r#"<w:tabs><w:tab w:val="right"{leader} w:pos="{}"/></w:tabs>"#,
            tab.position
        );
    }
    let _ = write!(out, r#"<w:spacing w:before="{}" w:after="{}"/>"#, s.before, s.after);
    if p.indent_first_line && s.first_line > 0 {
        let _ = write!(out, r#"<w:ind w:firstLine="{}"/>"#, s.first_line);
    }
    let _ = write!(out, r#"<w:jc w:val="{}"/>"#, jc(s.align));
    if let Some(sect_pr) = sect_pr {
        out.push_str(sect_pr);
    }
    out.push_str("</w:pPr>");
}

fn run_properties(bold: bool, italic: bool, underline: bool, size: u32, out: &mut String) {
    out.push_str("<w:rPr>");
    if bold {
        out.push_str("<w:b/>");
    }
    if italic {
        out.push_str("<w:i/>");
    }
    if underline {
        out.push_str(r#"<w:u w:val="single"/>"#);
    }
    let _ = write!(out, r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#);
    out.push_str("</w:rPr>");
}

fn drawing(rel_id: &str, id: u32, cx: i64, cy: i64, out: &mut String) {
    let _ = write!(
        out,
        concat!(
            r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
            r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="image{id}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#,
        ),
        cx = cx,
        cy = cy,
        id = id,
        rel = rel_id,
    );
}

pub(super) fn runs(p: &DocxParagraph, out: &mut String) {
    for run in &p.runs {
        out.push_str("<w:r>");
        match run {
            DocxRun::Text {
                text,
                bold,
                italic,
                underline,
                size,
            } => {
                run_properties(*bold, *italic, *underline, *size, out);
                let _ = write!(out, r#"<w:t xml:space="preserve">{}</w:t>"#, escape_xml(text));
            }
            DocxRun::Tab => {
                run_properties(p.style.bold, p.style.italic, false, p.style.size, out);
                out.push_str("<w:tab/>");
            }
            DocxRun::Image { rel_id, id, cx, cy } => drawing(rel_id, *id, *cx, *cy, out),
        }
        out.push_str("</w:r>");
    }
}

fn page_margins(g: &PageGeometry, out: &mut String) {
    let _ = write!(
        out,
        r#"<w:pgSz w:w="{}" w:h="{}"/><w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="720" w:footer="720" w:gutter="0"/>"#,
        A4_TWIPS.0,
        A4_TWIPS.1,
        pts_to_twips(g.margin_top),
        pts_to_twips(g.margin_right),
        pts_to_twips(g.margin_bottom),
        pts_to_twips(g.margin_left),
    );
}

fn page_borders(border: &PageBorder, first_only: bool, out: &mut String) {
    let (val, sz) = match border.style {
        BorderStyle::Double => ("double", 6),
        BorderStyle::Single => ("single", 8),
    };
    let display = if first_only { r#" w:display="firstPage""# } else { "" };
    let _ = write!(out, r#"<w:pgBorders w:offsetFrom="page"{display}>"#);
    for side in ["top", "left", "bottom", "right"] {
        let _ = write!(
            out,
            r#"<w:{side} w:val="{val}" w:sz="{sz}" w:space="{BORDER_SPACE}" w:color="auto"/>"#
        );
    }
    out.push_str("</w:pgBorders>");
}

/// `w:sectPr` for one section. `footer_rel` is set on numbered sections.
pub(super) fn section_properties(section: &DocxSection, footer_rel: Option<&str>, out: &mut String) {
    out.push_str("<w:sectPr>");
    if let Some(rel) = footer_rel.filter(|_| section.numbered) {
        let _ = write!(out, r#"<w:footerReference w:type="default" r:id="{rel}"/>"#);
    }
    out.push_str(r#"<w:type w:val="nextPage"/>"#);
    page_margins(&section.geometry, out);
    if let Some((border, first_only)) = &section.border {
        page_borders(border, *first_only, out);
    }
    if section.restart_numbering {
        out.push_str(r#"<w:pgNumType w:start="1"/>"#);
    }
    out.push_str("</w:sectPr>");
}

pub(super) fn styles_xml(font_family: &str, line: u32) -> String {
    let font = escape_xml(font_family);
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:docDefaults><w:rPrDefault><w:rPr>"#,
            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:eastAsia="{font}" w:cs="{font}"/>"#,
            r#"<w:sz w:val="24"/><w:szCs w:val="24"/><w:lang w:val="en-US"/>"#,
            r#"</w:rPr></w:rPrDefault>"#,
            r#"<w:pPrDefault><w:pPr><w:spacing w:after="0" w:line="{line}" w:lineRule="auto"/></w:pPr></w:pPrDefault>"#,
            r#"</w:docDefaults>"#,
            r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
            r#"<w:style w:type="paragraph" w:styleId="Footer"><w:name w:val="footer"/><w:basedOn w:val="Normal"/></w:style>"#,
            r#"<w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/>"#,
            r#"<w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar><w:left w:w="108" w:type="dxa"/>"#,
            r#"<w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>"#,
            r#"</w:styles>"#,
        ),
        font = font,
        line = line,
    )
}

/// Footer holding a centered PAGE field.
pub(super) fn footer_xml() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:ftr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        r#"<w:p><w:pPr><w:pStyle w:val="Footer"/><w:jc w:val="center"/></w:pPr>"#,
        r#"<w:r><w:rPr><w:sz w:val="20"/></w:rPr><w:fldChar w:fldCharType="begin"/></w:r>"#,
        r#"<w:r><w:rPr><w:sz w:val="20"/></w:rPr><w:instrText xml:space="preserve"> PAGE </w:instrText></w:r>"#,
        r#"<w:r><w:rPr><w:sz w:val="20"/></w:rPr><w:fldChar w:fldCharType="separate"/></w:r>"#,
        r#"<w:r><w:rPr><w:sz w:val="20"/></w:rPr><w:t>1</w:t></w:r>"#,
        r#"<w:r><w:rPr><w:sz w:val="20"/></w:rPr><w:fldChar w:fldCharType="end"/></w:r>"#,
        r#"</w:p></w:ftr>"#,
    )
    .to_string()
}
