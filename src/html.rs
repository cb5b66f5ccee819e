//! HTML preview: one fixed-size `.page` box per laid-out page.
//!
//! The preview only mirrors the page assignment; line breaking inside a page
//! is left to the browser.

use std::fmt::Write;

use base64::Engine;

use crate::flow::measure::{CAPTION_GAP, FIGURE_AFTER, FIGURE_BEFORE};
use crate::geometry::{BorderStyle, GeometryProfile, PageGeometry};
use crate::model::{Alignment, ContentBlock, Figure, Layout, Page, SignatoryGrid};
use crate::style::{Role, StyleSheet, TextStyle};
use crate::text;

pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

fn text_align(align: Alignment) -> &'static str {
    match align {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "justify",
    }
}

/// Inline CSS for a text style; `indent` applies the first-line indent.
fn css(style: &TextStyle, indent: bool) -> String {
    let mut out = format!(
        "font-size:{}pt;margin:{}pt 0 {}pt 0;text-align:{}",
        style.font_size(),
        style.space_before(),
        style.space_after(),
        text_align(style.align),
    );
    if style.bold {
        out.push_str(";font-weight:bold");
    }
    if style.italic {
        out.push_str(";font-style:italic");
    }
    if style.underline {
        out.push_str(";text-decoration:underline");
    }
    if style.shaded {
        out.push_str(";background:#d9d9d9");
    }
    if indent && style.first_line > 0 {
        let _ = write!(out, ";text-indent:{}pt", style.first_line_indent());
    }
    out
}

fn page_css(g: &PageGeometry) -> String {
    format!(
        "width:{}pt;height:{}pt;padding:{}pt {}pt {}pt {}pt;overflow-wrap:anywhere",
        g.page_width, g.page_height, g.margin_top, g.margin_right, g.margin_bottom, g.margin_left
    )
}

struct HtmlWriter<'a> {
    layout: &'a Layout,
    profile: &'a GeometryProfile,
    sheet: &'a StyleSheet,
    out: String,
}

impl HtmlWriter<'_> {
    fn page(&mut self, index: usize, page: &Page) {
        let _ = write!(
            self.out,
            r#"<div class="page" data-page="{}" style="{}">"#,
            index + 1,
            page_css(&page.geometry)
        );
        if let Some(border) = self.profile.border.filter(|b| b.applies_to(index)) {
            let line = match border.style {
                BorderStyle::Double => "3px double #000",
                BorderStyle::Single => "1px solid #000",
            };
            let _ = write!(
                self.out,
                r#"<div class="page-border" style="inset:{}pt;border:{line}"></div>"#,
                border.inset
            );
        }

        let stretch = page
            .blocks
            .iter()
            .filter(|b| matches!(b, ContentBlock::Spacer { stretch: true, .. }))
            .count();
        let extra = if stretch > 0 {
            page.remaining() / stretch as f32
        } else {
            0.0
        };
        for block in &page.blocks {
            self.block(block, extra);
        }

        if let Some(label) = page.label() {
            let style = self.sheet.style(Role::PageNumber);
            let _ = write!(
                self.out,
                r#"<div class="page-number" style="bottom:{}pt;{}">{}</div>"#,
                page.geometry.margin_bottom / 2.0,
                css(&style, false),
                escape_html(&label)
            );
        }
        self.out.push_str("</div>\n");
    }

    fn block(&mut self, block: &ContentBlock, extra: f32) {
        match block {
            ContentBlock::Section { title, .. } => {
                let _ = write!(self.out, "<!-- {} -->", escape_html(title));
            }
            ContentBlock::Heading {
                level,
                text: t,
                subtitle,
                role,
                anchor,
            } => {
                let tag = format!("h{}", level.saturating_add(1).min(6));
                let id = anchor
                    .as_ref()
                    .map(|a| format!(r#" id="{}""#, escape_html(a)))
                    .unwrap_or_default();
                let _ = write!(
                    self.out,
                    r#"<{tag}{id} style="{}">{}</{tag}>"#,
                    css(&self.sheet.style(*role), false),
                    escape_html(t)
                );
                if let Some(sub) = subtitle {
                    let _ = write!(
                        self.out,
                        r#"<p class="subtitle" style="{}">{}</p>"#,
                        css(&text::subtitle_style(), false),
                        escape_html(sub)
                    );
                }
            }
            ContentBlock::Paragraph {
                text: t,
                role,
                indent_first_line,
                justified,
                lead,
                tail,
                continuation,
            } => {
                let mut style = self.sheet.style(*role);
                if *justified {
                    style.align = Alignment::Justify;
                }
                let class = if *continuation { r#" class="continued""# } else { "" };
                let _ = write!(
                    self.out,
                    r#"<p{class} style="{}">"#,
                    css(&style, *indent_first_line && !*continuation)
                );
                if let Some(tail) = tail {
                    let _ = write!(
                        self.out,
                        r#"<span class="tail" style="float:right">{}</span>"#,
                        escape_html(tail)
                    );
                }
                if let Some(lead) = lead {
                    let _ = write!(self.out, "<strong>{}</strong>", escape_html(lead));
                }
                self.out.push_str(&escape_html(t));
                self.out.push_str("</p>");
            }
            ContentBlock::Figure(figure) => self.figure(figure),
            ContentBlock::Signature(sig) => {
                let column = |entries: Vec<(String, Role)>| -> String {
                    entries
                        .iter()
                        .map(|(t, role)| {
                            format!(
                                r#"<div style="{}">{}</div>"#,
                                css(&self.sheet.style(*role), false),
                                escape_html(t)
                            )
                        })
                        .collect()
                };
                let (left, right) = (column(sig.member_entries()), column(sig.guide_entries()));
                let _ = write!(
                    self.out,
                    r#"<table class="signatures" style="width:100%;border-collapse:collapse"><tr><td style="width:50%;vertical-align:top">{left}</td><td style="width:50%;vertical-align:top">{right}</td></tr></table>"#
                );
            }
            ContentBlock::Signatories(grid) => self.grid(grid),
            ContentBlock::Spacer { height, stretch } => {
                let grow = if *stretch { extra } else { 0.0 };
                let _ = write!(
                    self.out,
                    r#"<div class="spacer" style="height:{}pt"></div>"#,
                    height + grow
                );
            }
            ContentBlock::TocEntry {
                text: t,
                level,
                anchor,
            } => {
                let style = text::toc_style(self.sheet, *level);
                let label = self
                    .layout
                    .page_label(anchor)
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                let _ = write!(
                    self.out,
                    concat!(
                        r#"<div class="toc" style="display:flex;{}">"#,
                        r##"<a href="#{}">{}</a>"##,
                        r#"<span class="leader" style="flex:1;border-bottom:1px dotted #000;margin:0 4pt"></span>"#,
                        "<span>{}</span></div>",
                    ),
                    css(&style, false),
                    escape_html(anchor),
                    escape_html(t),
                    escape_html(&label)
                );
            }
        }
    }

    fn figure(&mut self, figure: &Figure) {
        let data = base64::engine::general_purpose::STANDARD.encode(&figure.image.data);
        let align = match figure.align {
            Alignment::Left => "left",
            Alignment::Right => "right",
            Alignment::Center | Alignment::Justify => "center",
        };
        let _ = write!(
            self.out,
            r#"<figure style="margin:{FIGURE_BEFORE}pt 0 {FIGURE_AFTER}pt 0;text-align:{align}"><img src="data:{};base64,{data}" style="width:{}%"/>"#,
            figure.image.format.mime(),
            figure.width_percent.min(100)
        );
        if let Some(caption) = &figure.caption {
            let mut style = self.sheet.style(Role::Caption);
            style.before = crate::geometry::pts_to_twips(CAPTION_GAP);
            let _ = write!(
                self.out,
                r#"<figcaption style="{}">{}</figcaption>"#,
                css(&style, false),
                escape_html(caption)
            );
        }
        self.out.push_str("</figure>");
    }

    fn grid(&mut self, grid: &SignatoryGrid) {
        self.out
            .push_str(r#"<table class="signatories" style="width:100%;border-collapse:collapse">"#);
        for row in &grid.rows {
            self.out.push_str("<tr>");
            for (c, cell) in row.iter().enumerate() {
                let align = match (grid.edge_aligned, c) {
                    (true, 0) => "left",
                    (true, _) => "right",
                    (false, _) => "center",
                };
                let _ = write!(
                    self.out,
                    r#"<td style="width:50%;vertical-align:top;text-align:{align}">"#
                );
                for (t, role) in cell.iter().flat_map(|s| s.entries()) {
                    let mut style = self.sheet.style(role);
                    style.align = Alignment::Left;
                    let _ = write!(
                        self.out,
                        r#"<div style="{};text-align:inherit">{}</div>"#,
                        css(&style, false),
                        escape_html(&t)
                    );
                }
                self.out.push_str("</td>");
            }
            self.out.push_str("</tr>");
        }
        self.out.push_str("</table>");
    }
}

/// Render the layout as a standalone HTML document.
pub fn render(layout: &Layout, profile: &GeometryProfile, sheet: &StyleSheet) -> String {
    let mut w = HtmlWriter {
        layout,
        profile,
        sheet,
        out: String::new(),
    };
    let _ = write!(
        w.out,
        concat!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><style>\n",
            "body{{background:#777;margin:0;padding:16px}}\n",
            ".page{{box-sizing:border-box;background:#fff;margin:0 auto 16px;position:relative;overflow:hidden;",
            "font-family:'{}',serif;line-height:{}}}\n",
            ".page-border{{position:absolute;pointer-events:none}}\n",
            ".page-number{{position:absolute;left:0;right:0}}\n",
            "</style></head><body>\n",
        ),
        escape_html(&sheet.font_family),
        sheet.line_factor() * 1.15,
    );
    for (i, page) in layout.pages.iter().enumerate() {
        w.page(i, page);
    }
    w.out.push_str("</body></html>\n");
    w.out
}
