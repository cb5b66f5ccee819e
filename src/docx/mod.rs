//! Structural DOCX output.
//!
//! The layout is not re-flowed here: every engine page boundary becomes a
//! hard break (`pageBreakBefore`, or an empty breaking paragraph before a
//! table), and headings also carry `keepNext`/`keepLines` as a fallback for
//! word processors that reflow anyway. Pages are grouped into sections by
//! region and geometry, so front matter stays unnumbered, the body restarts
//! numbering at 1, and a first body page with its own top margin gets its
//! own section.

mod package;
mod styles;

use std::sync::Arc;

use crate::error::Result;
use crate::flow::measure::{CAPTION_GAP, FIGURE_BEFORE};
use crate::geometry::{BorderScope, GeometryProfile, PageBorder, PageGeometry, pts_to_twips};
use crate::model::{Alignment, ContentBlock, ImageFormat, Layout, Page, Region};
use crate::style::{Role, StyleSheet, TextStyle};
use crate::text;

/// Points to English Metric Units.
pub const EMU_PER_PT: i64 = 12700;

/// Bottom spacing under the signature column headers and between grid rows.
const HEADER_GAP_TWIPS: u32 = 240;
const ROW_GAP_TWIPS: u32 = 400;

#[derive(Clone, Debug)]
pub struct Media {
    pub rel_id: String,
    pub file_name: String,
    pub format: ImageFormat,
    pub data: Arc<[u8]>,
}

#[derive(Clone, Debug)]
pub enum DocxRun {
    Text {
        text: String,
        bold: bool,
        italic: bool,
        underline: bool,
        size: u32,
    },
    Tab,
    Image {
        rel_id: String,
        id: u32,
        cx: i64,
        cy: i64,
    },
}

/// Right-aligned tab stop in twips from the left margin, optionally dotted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RightTab {
    pub position: u32,
    pub dotted: bool,
}

#[derive(Clone, Debug)]
pub struct DocxParagraph {
    pub style: TextStyle,
    pub indent_first_line: bool,
    pub page_break_before: bool,
    pub keep_lines: bool,
    pub right_tab: Option<RightTab>,
    pub runs: Vec<DocxRun>,
}

impl DocxParagraph {
    fn new(style: TextStyle) -> Self {
        DocxParagraph {
            style,
            indent_first_line: false,
            page_break_before: false,
            keep_lines: false,
            right_tab: None,
            runs: Vec::new(),
        }
    }

    fn text(style: TextStyle, text: &str) -> Self {
        let mut p = Self::new(style);
        p.push_text(text, &style);
        p
    }

    fn push_text(&mut self, text: &str, style: &TextStyle) {
        self.runs.push(DocxRun::Text {
            text: text.to_string(),
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
            size: style.size,
        });
    }

    pub fn plain_text(&self) -> String {
        self.runs
            .iter()
            .map(|r| match r {
                DocxRun::Text { text, .. } => text.as_str(),
                DocxRun::Tab => "\t",
                DocxRun::Image { .. } => "",
            })
            .collect()
    }
}

/// Borderless two-column table.
#[derive(Clone, Debug)]
pub struct DocxTable {
    pub rows: Vec<[Vec<DocxParagraph>; 2]>,
}

#[derive(Clone, Debug)]
pub enum DocxBlock {
    Paragraph(DocxParagraph),
    Table(DocxTable),
}

#[derive(Clone, Debug)]
pub struct DocxSection {
    pub region: Region,
    pub geometry: PageGeometry,
    /// Shows the page-number footer.
    pub numbered: bool,
    /// Restarts page numbering at 1.
    pub restart_numbering: bool,
    /// Border and whether it is limited to the section's first page.
    pub border: Option<(PageBorder, bool)>,
    pub children: Vec<DocxBlock>,
}

#[derive(Clone, Debug)]
pub struct DocxDocument {
    pub font_family: String,
    pub line: u32,
    pub sections: Vec<DocxSection>,
    pub media: Vec<Media>,
}

impl DocxDocument {
    pub fn from_layout(layout: &Layout, sheet: &StyleSheet, profile: &GeometryProfile) -> Self {
        let mut asm = Assembler {
            layout,
            sheet,
            profile,
            sections: Vec::new(),
            media: Vec::new(),
            body_seen: false,
        };
        for (index, page) in layout.pages.iter().enumerate() {
            asm.page(index, page);
        }
        DocxDocument {
            font_family: sheet.font_family.clone(),
            line: sheet.line,
            sections: asm.sections,
            media: asm.media,
        }
    }

    pub fn has_footer(&self) -> bool {
        self.sections.iter().any(|s| s.numbered)
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &DocxParagraph> {
        self.sections
            .iter()
            .flat_map(|s| s.children.iter())
            .filter_map(|b| match b {
                DocxBlock::Paragraph(p) => Some(p),
                DocxBlock::Table(_) => None,
            })
    }

    /// Serialise into a `.docx` (OPC zip) package.
    pub fn to_package(&self) -> Result<Vec<u8>> {
        package::write(self)
    }
}

struct Assembler<'a> {
    layout: &'a Layout,
    sheet: &'a StyleSheet,
    profile: &'a GeometryProfile,
    sections: Vec<DocxSection>,
    media: Vec<Media>,
    body_seen: bool,
}

impl Assembler<'_> {
    fn page(&mut self, index: usize, page: &Page) {
        let starts_section = match self.sections.last() {
            Some(last) => last.region != page.region || last.geometry != page.geometry,
            None => true,
        };
        if starts_section {
            let body = page.region == Region::Body;
            let numbered = body && self.profile.number_body_pages;
            let border = self
                .profile
                .border
                .filter(|b| b.applies_to(index))
                .map(|b| (b, b.scope == BorderScope::FirstPage));
            self.sections.push(DocxSection {
                region: page.region,
                geometry: page.geometry,
                numbered,
                restart_numbering: numbered && !self.body_seen,
                border,
                children: Vec::new(),
            });
            self.body_seen |= body;
        }

        let stretch = page
            .blocks
            .iter()
            .filter(|b| matches!(b, ContentBlock::Spacer { stretch: true, .. }))
            .count();
        let extra = if stretch > 0 {
            (page.capacity - page.used).max(0.0) / stretch as f32
        } else {
            0.0
        };

        let mut pending_break = !starts_section;
        let mut out = Vec::new();
        for block in &page.blocks {
            self.block(block, page, extra, &mut out);
        }
        if out.is_empty() && pending_break {
            out.push(DocxBlock::Paragraph(DocxParagraph::new(self.plain())));
        }
        for item in out {
            let item = match item {
                DocxBlock::Paragraph(mut p) if pending_break => {
                    p.page_break_before = true;
                    pending_break = false;
                    DocxBlock::Paragraph(p)
                }
                DocxBlock::Table(t) if pending_break => {
                    let mut breaker = DocxParagraph::new(self.plain());
                    breaker.page_break_before = true;
                    self.push(DocxBlock::Paragraph(breaker));
                    pending_break = false;
                    DocxBlock::Table(t)
                }
                other => other,
            };
            self.push(item);
        }
    }

    fn push(&mut self, block: DocxBlock) {
        if let Some(section) = self.sections.last_mut() {
            section.children.push(block);
        }
    }

    /// Zero-spacing body style for structural paragraphs.
    fn plain(&self) -> TextStyle {
        TextStyle {
            before: 0,
            after: 0,
            first_line: 0,
            keep_next: false,
            shaded: false,
            align: Alignment::Left,
            ..self.sheet.style(Role::SignatureText)
        }
    }

    fn block(&mut self, block: &ContentBlock, page: &Page, extra: f32, out: &mut Vec<DocxBlock>) {
        let width = page.geometry.writable_width();
        match block {
            ContentBlock::Section { .. } => {}
            ContentBlock::Heading {
                text: t,
                subtitle,
                role,
                ..
            } => {
                let style = TextStyle {
                    keep_next: true,
                    ..self.sheet.style(*role)
                };
                let mut p = DocxParagraph::text(style, t);
                p.keep_lines = true;
                out.push(DocxBlock::Paragraph(p));
                if let Some(sub) = subtitle {
                    out.push(DocxBlock::Paragraph(DocxParagraph::text(
                        text::subtitle_style(),
                        sub,
                    )));
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
                let mut p = DocxParagraph::new(style);
                p.indent_first_line = *indent_first_line && !*continuation;
                if let Some(lead) = lead {
                    p.push_text(lead, &TextStyle { bold: true, ..style });
                }
                p.push_text(t, &style);
                if let Some(tail) = tail {
                    p.right_tab = Some(RightTab {
                        position: pts_to_twips(width),
                        dotted: false,
                    });
                    p.runs.push(DocxRun::Tab);
                    p.push_text(tail, &style);
                }
                out.push(DocxBlock::Paragraph(p));
            }
            ContentBlock::Figure(figure) => {
                let id = self.media.len() as u32 + 1;
                let rel_id = format!("rIdImg{id}");
                self.media.push(Media {
                    rel_id: rel_id.clone(),
                    file_name: format!("image{id}.{}", figure.image.format.extension()),
                    format: figure.image.format,
                    data: figure.image.data.clone(),
                });
                let w = width * f32::from(figure.width_percent.min(100)) / 100.0;
                let h = w * figure.aspect_ratio;
                let mut style = self.plain();
                style.align = match figure.align {
                    Alignment::Justify => Alignment::Center,
                    other => other,
                };
                style.before = pts_to_twips(FIGURE_BEFORE);
                style.after = pts_to_twips(CAPTION_GAP);
                style.keep_next = figure.caption.is_some();
                let mut p = DocxParagraph::new(style);
                p.runs.push(DocxRun::Image {
                    rel_id,
                    id,
                    cx: (w * EMU_PER_PT as f32).round() as i64,
                    cy: (h * EMU_PER_PT as f32).round() as i64,
                });
                out.push(DocxBlock::Paragraph(p));
                if let Some(caption) = &figure.caption {
                    out.push(DocxBlock::Paragraph(DocxParagraph::text(
                        self.sheet.style(Role::Caption),
                        caption,
                    )));
                }
            }
            ContentBlock::Signature(sig) => {
                let column = |entries: Vec<(String, Role)>| -> Vec<DocxParagraph> {
                    entries
                        .iter()
                        .enumerate()
                        .map(|(i, (t, role))| {
                            let mut style = self.sheet.style(*role);
                            if i == 0 {
                                style.after = HEADER_GAP_TWIPS;
                            }
                            DocxParagraph::text(style, t)
                        })
                        .collect()
                };
                out.push(DocxBlock::Table(DocxTable {
                    rows: vec![[column(sig.member_entries()), column(sig.guide_entries())]],
                }));
            }
            ContentBlock::Signatories(grid) => {
                let last = grid.rows.len().saturating_sub(1);
                let rows = grid
                    .rows
                    .iter()
                    .enumerate()
                    .map(|(r, row)| {
                        let cell = |c: usize| -> Vec<DocxParagraph> {
                            let Some(s) = &row[c] else {
                                return vec![DocxParagraph::new(self.plain())];
                            };
                            let entries = s.entries();
                            let n = entries.len();
                            entries
                                .iter()
                                .enumerate()
                                .map(|(i, (t, role))| {
                                    let mut style = self.sheet.style(*role);
                                    style.align = match (grid.edge_aligned, c) {
                                        (true, 0) => Alignment::Left,
                                        (true, _) => Alignment::Right,
                                        (false, _) => Alignment::Center,
                                    };
                                    if i + 1 == n && r < last {
                                        style.after = ROW_GAP_TWIPS;
                                    }
                                    DocxParagraph::text(style, t)
                                })
                                .collect()
                        };
                        [cell(0), cell(1)]
                    })
                    .collect();
                out.push(DocxBlock::Table(DocxTable { rows }));
            }
            ContentBlock::Spacer { height, stretch } => {
                let mut style = self.plain();
                let grow = if *stretch { extra } else { 0.0 };
                style.before = pts_to_twips(height + grow);
                out.push(DocxBlock::Paragraph(DocxParagraph::new(style)));
            }
            ContentBlock::TocEntry {
                text: t,
                level,
                anchor,
            } => {
                let mut p = DocxParagraph::text(text::toc_style(self.sheet, *level), t);
                p.right_tab = Some(RightTab {
                    position: pts_to_twips(width),
                    dotted: true,
                });
                p.runs.push(DocxRun::Tab);
                let label = self
                    .layout
                    .page_label(anchor)
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                p.push_text(&label, &self.sheet.style(Role::TocLine));
                out.push(DocxBlock::Paragraph(p));
            }
        }
    }
}
