//! Page composition: turn a paginated `Page` into positioned marks.
//!
//! Vertical advances mirror `MetricsMeasurer` exactly (same line builder,
//! same pitches, same spacing), so nothing composed here runs past the
//! bottom margin unless the flow engine already flagged the page.

use crate::flow::measure::{CAPTION_GAP, FIGURE_AFTER, FIGURE_BEFORE, FigureBox};
use crate::fonts::{FontSet, FontVariant};
use crate::geometry::{BorderStyle, GeometryProfile};
use crate::model::{Alignment, ContentBlock, ImageData, Layout, Page};
use crate::style::{Role, StyleSheet, TextStyle};
use crate::text::{self, Span, StyledLine, TextLine};

use super::table;

/// Gray level of shaded headings (D9D9D9).
const SHADE_GRAY: f32 = 0.85;
const BORDER_LINE: f32 = 0.75;
const DOUBLE_BORDER_GAP: f32 = 3.0;
/// Padding between a contents entry, its dot leader and its label.
const LEADER_PAD: f32 = 4.0;

/// A wrapped line with its final position on the page.
pub(super) struct PlacedLine {
    pub line: TextLine,
    pub x: f32,
    pub baseline: f32,
    pub extra_per_gap: f32,
}

pub(super) enum Mark {
    Text(PlacedLine),
    Image {
        index: usize,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
    Fill {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        gray: f32,
    },
    Stroke {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        line_width: f32,
    },
}

pub(super) struct PageMarks {
    pub width: f32,
    pub height: f32,
    pub marks: Vec<Mark>,
}

/// Horizontal band text is laid into.
#[derive(Clone, Copy)]
pub(super) struct Column {
    pub left: f32,
    pub width: f32,
}

pub(super) fn ascent(style: &TextStyle, fonts: &FontSet) -> f32 {
    fonts
        .face(FontVariant::new(style.bold, style.italic))
        .ascent(style.font_size())
}

/// Position one line inside `col`. `indent` moves the line start right;
/// `reserve` is the total width withheld from the line (indent included),
/// as returned by `text::paragraph_lines`.
#[allow(clippy::too_many_arguments)]
pub(super) fn place_line(
    marks: &mut Vec<Mark>,
    line: TextLine,
    align: Alignment,
    col: Column,
    indent: f32,
    reserve: f32,
    baseline: f32,
    justify: bool,
) {
    let x0 = col.left + indent;
    let avail = col.width - reserve.max(indent);
    let slack = (avail - line.total_width).max(0.0);
    let x = match align {
        Alignment::Center => x0 + slack / 2.0,
        Alignment::Right => x0 + slack,
        Alignment::Left | Alignment::Justify => x0,
    };
    let extra_per_gap = if justify && line.chunks.len() > 1 {
        slack / (line.chunks.len() - 1) as f32
    } else {
        0.0
    };
    marks.push(Mark::Text(PlacedLine {
        line,
        x,
        baseline,
        extra_per_gap,
    }));
}

/// Stack pre-wrapped lines top-down, each aligned by its own style unless
/// `align` overrides it. `gap_after_first` opens space under the first line.
/// Returns the stack height.
pub(super) fn place_stack(
    marks: &mut Vec<Mark>,
    lines: &[StyledLine],
    col: Column,
    top: f32,
    align: Option<Alignment>,
    gap_after_first: f32,
    fonts: &FontSet,
) -> f32 {
    let mut y = top;
    for (i, l) in lines.iter().enumerate() {
        let baseline = y - ascent(&l.style, fonts);
        let align = align.unwrap_or(l.style.align);
        place_line(marks, l.line.clone(), align, col, 0.0, 0.0, baseline, false);
        y -= l.pitch;
        if i == 0 {
            y -= gap_after_first;
        }
    }
    top - y
}

pub(super) struct Composer<'a> {
    layout: &'a Layout,
    profile: &'a GeometryProfile,
    sheet: &'a StyleSheet,
    fonts: &'a FontSet,
    pub images: Vec<&'a ImageData>,
}

impl<'a> Composer<'a> {
    pub fn new(
        layout: &'a Layout,
        profile: &'a GeometryProfile,
        sheet: &'a StyleSheet,
        fonts: &'a FontSet,
    ) -> Self {
        Composer {
            layout,
            profile,
            sheet,
            fonts,
            images: Vec::new(),
        }
    }

    pub fn page(&mut self, index: usize, page: &'a Page) -> PageMarks {
        let g = &page.geometry;
        let col = Column {
            left: g.margin_left,
            width: g.writable_width(),
        };
        let mut marks = Vec::new();

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

        let mut y = g.page_height - g.margin_top;
        for block in &page.blocks {
            y = self.block(&mut marks, block, col, y, extra);
        }
        if page.overflowed {
            log::debug!("Page {} composed past its bottom margin", index + 1);
        }

        if let Some(n) = page.number {
            self.page_number(&mut marks, n, page);
        }
        if let Some(border) = self.profile.border.filter(|b| b.applies_to(index)) {
            let mut inset = border.inset;
            let rings = match border.style {
                BorderStyle::Single => 1,
                BorderStyle::Double => 2,
            };
            for _ in 0..rings {
                marks.push(Mark::Stroke {
                    x: inset,
                    y: inset,
                    w: g.page_width - 2.0 * inset,
                    h: g.page_height - 2.0 * inset,
                    line_width: BORDER_LINE,
                });
                inset += DOUBLE_BORDER_GAP;
            }
        }

        PageMarks {
            width: g.page_width,
            height: g.page_height,
            marks,
        }
    }

    fn page_number(&self, marks: &mut Vec<Mark>, n: u32, page: &Page) {
        let style = self.sheet.style(Role::PageNumber);
        let label = n.to_string();
        let line = text::build_lines(&[Span::styled(&label, &style)], self.fonts, f32::MAX, 0.0)
            .swap_remove(0);
        let g = &page.geometry;
        let col = Column {
            left: g.margin_left,
            width: g.writable_width(),
        };
        place_line(marks, line, Alignment::Center, col, 0.0, 0.0, g.margin_bottom / 2.0, false);
    }

    /// Compose one block whose margin box starts at `top`; returns the new top.
    fn block(
        &mut self,
        marks: &mut Vec<Mark>,
        block: &'a ContentBlock,
        col: Column,
        top: f32,
        extra: f32,
    ) -> f32 {
        let (sheet, fonts) = (self.sheet, self.fonts);
        match block {
            ContentBlock::Section { .. } => top,
            ContentBlock::Spacer { height, stretch } => {
                top - height - if *stretch { extra } else { 0.0 }
            }
            ContentBlock::Heading {
                text: t,
                subtitle,
                role,
                ..
            } => {
                let style = sheet.style(*role);
                let (main, sub) = text::heading_lines(t, subtitle.as_deref(), *role, sheet, fonts, col.width);
                let pitch = text::line_pitch(&style, sheet, fonts);
                let sub_style = text::subtitle_style();
                let sub_pitch = text::line_pitch(&sub_style, sheet, fonts);
                let mut y = top - style.space_before();
                let height = main.len() as f32 * pitch + sub.len() as f32 * sub_pitch;
                if style.shaded {
                    marks.push(Mark::Fill {
                        x: col.left,
                        y: y - height,
                        w: col.width,
                        h: height,
                        gray: SHADE_GRAY,
                    });
                }
                for line in main {
                    place_line(marks, line, style.align, col, 0.0, 0.0, y - ascent(&style, fonts), false);
                    y -= pitch;
                }
                for line in sub {
                    let baseline = y - ascent(&sub_style, fonts);
                    place_line(marks, line, sub_style.align, col, 0.0, 0.0, baseline, false);
                    y -= sub_pitch;
                }
                y - style.space_after()
            }
            ContentBlock::Paragraph {
                role,
                justified,
                indent_first_line,
                continuation,
                tail,
                ..
            } => {
                let style = sheet.style(*role);
                let Some((lines, reserve)) = text::paragraph_lines(block, sheet, fonts, col.width)
                else {
                    return top;
                };
                let align = if *justified { Alignment::Justify } else { style.align };
                let indent = if *indent_first_line && !*continuation {
                    style.first_line_indent()
                } else {
                    0.0
                };
                let pitch = text::line_pitch(&style, sheet, fonts);
                let asc = ascent(&style, fonts);
                let mut y = top - style.space_before();
                let first_baseline = y - asc;
                let count = lines.len();
                for (i, line) in lines.into_iter().enumerate() {
                    let justify = align == Alignment::Justify && i + 1 < count;
                    let (ind, res) = if i == 0 { (indent, reserve) } else { (0.0, 0.0) };
                    place_line(marks, line, align, col, ind, res, y - asc, justify);
                    y -= pitch;
                }
                if let Some(tail) = tail {
                    let line = text::build_lines(&[Span::styled(tail, &style)], fonts, f32::MAX, 0.0)
                        .swap_remove(0);
                    place_line(marks, line, Alignment::Right, col, 0.0, 0.0, first_baseline, false);
                }
                y - style.space_after()
            }
            ContentBlock::Figure(figure) => {
                let fb = FigureBox::new(figure, sheet, fonts, col.width);
                let y = top - FIGURE_BEFORE;
                let index = self.images.len();
                self.images.push(&figure.image);
                let x = match figure.align {
                    Alignment::Left => col.left,
                    Alignment::Right => col.left + col.width - fb.image_width,
                    Alignment::Center | Alignment::Justify => col.left + (col.width - fb.image_width) / 2.0,
                };
                marks.push(Mark::Image {
                    index,
                    x,
                    y: y - fb.image_height,
                    w: fb.image_width,
                    h: fb.image_height,
                });
                if !fb.caption.is_empty() {
                    let cap_top = y - fb.image_height - CAPTION_GAP;
                    place_stack(marks, &fb.caption, col, cap_top, None, 0.0, fonts);
                }
                y - fb.height(sheet) - FIGURE_AFTER
            }
            ContentBlock::Signature(sig) => top - table::signature(marks, sig, sheet, fonts, col, top),
            ContentBlock::Signatories(grid) => top - table::grid(marks, grid, sheet, fonts, col, top),
            ContentBlock::TocEntry {
                text: t,
                level,
                anchor,
            } => {
                let style = text::toc_style(sheet, *level);
                let line_style = sheet.style(Role::TocLine);
                let pitch = text::line_pitch(&style, sheet, fonts);
                let asc = ascent(&style, fonts);
                let mut y = top - line_style.space_before();
                let lines = text::toc_lines(t, *level, sheet, fonts, col.width);
                let last = lines.len() - 1;
                let mut last_end = col.left;
                let mut last_baseline = y - asc;
                for (i, line) in lines.into_iter().enumerate() {
                    if i == last {
                        last_end = col.left + line.total_width;
                        last_baseline = y - asc;
                    }
                    place_line(marks, line, Alignment::Left, col, 0.0, 0.0, y - asc, false);
                    y -= pitch;
                }
                if let Some(n) = self.layout.page_label(anchor) {
                    self.leader(marks, &n.to_string(), &style, col, last_end, last_baseline);
                }
                y - line_style.space_after()
            }
        }
    }

    /// Dot leader from `from_x` to a right-aligned page label.
    fn leader(
        &self,
        marks: &mut Vec<Mark>,
        label: &str,
        style: &TextStyle,
        col: Column,
        from_x: f32,
        baseline: f32,
    ) {
        let label_line = text::build_lines(&[Span::styled(label, style)], self.fonts, f32::MAX, 0.0)
            .swap_remove(0);
        let label_x = col.left + col.width - label_line.total_width;
        let face = self.fonts.face(FontVariant::new(style.bold, style.italic));
        let dot = face.word_width(".", style.font_size());
        let span = label_x - from_x - 2.0 * LEADER_PAD;
        if dot > 0.0 && span > dot {
            let dots = ".".repeat((span / dot).floor() as usize);
            let line = text::build_lines(&[Span::styled(&dots, style)], self.fonts, f32::MAX, 0.0)
                .swap_remove(0);
            let x = label_x - LEADER_PAD - line.total_width;
            marks.push(Mark::Text(PlacedLine {
                line,
                x,
                baseline,
                extra_per_gap: 0.0,
            }));
        }
        marks.push(Mark::Text(PlacedLine {
            line: label_line,
            x: label_x,
            baseline,
            extra_per_gap: 0.0,
        }));
    }
}
