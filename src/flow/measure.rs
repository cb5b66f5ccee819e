use std::sync::Arc;

use crate::fonts::FontSet;
use crate::model::{ContentBlock, Figure, SignatoryGrid, SignatureBlock};
use crate::style::{Role, StyleSheet};
use crate::text::{self, StyledLine};

/// Space above and below a figure (image plus caption), points.
pub const FIGURE_BEFORE: f32 = 12.0;
pub const FIGURE_AFTER: f32 = 6.0;
/// Gap between an image and its caption.
pub const CAPTION_GAP: f32 = 6.0;
/// Gap under the signature column headers.
pub const SIGNATURE_HEADER_GAP: f32 = 12.0;
/// Vertical gap between signatory grid rows.
pub const SIGNATORY_ROW_GAP: f32 = 20.0;

/// Height oracle for the flow engine.
///
/// `measure` returns the content height of a block at the given writable
/// width, `margin` the fixed vertical spacing around it (before + after).
/// `lead_height` is the smallest fragment of the block that can be placed on
/// its own, used by the keep-with-next look-ahead.
pub trait BlockMeasurer {
    fn measure(&self, block: &ContentBlock, width: f32) -> f32;

    fn margin(&self, _block: &ContentBlock) -> f32 {
        0.0
    }

    fn lead_height(&self, block: &ContentBlock, width: f32) -> f32 {
        self.measure(block, width)
    }
}

impl<M: BlockMeasurer + ?Sized> BlockMeasurer for &M {
    fn measure(&self, block: &ContentBlock, width: f32) -> f32 {
        (**self).measure(block, width)
    }

    fn margin(&self, block: &ContentBlock) -> f32 {
        (**self).margin(block)
    }

    fn lead_height(&self, block: &ContentBlock, width: f32) -> f32 {
        (**self).lead_height(block, width)
    }
}

impl<M: BlockMeasurer + ?Sized> BlockMeasurer for Box<M> {
    fn measure(&self, block: &ContentBlock, width: f32) -> f32 {
        (**self).measure(block, width)
    }

    fn margin(&self, block: &ContentBlock) -> f32 {
        (**self).margin(block)
    }

    fn lead_height(&self, block: &ContentBlock, width: f32) -> f32 {
        (**self).lead_height(block, width)
    }
}

/// Figure box: image size and the wrapped caption under it.
pub struct FigureBox {
    pub image_width: f32,
    pub image_height: f32,
    pub caption: Vec<StyledLine>,
}

impl FigureBox {
    pub fn new(figure: &Figure, sheet: &StyleSheet, fonts: &FontSet, width: f32) -> Self {
        let image_width = width * f32::from(figure.width_percent.min(100)) / 100.0;
        let image_height = image_width * figure.aspect_ratio;
        let caption = figure
            .caption
            .as_ref()
            .map(|c| text::wrap_entries(&[(c.clone(), Role::Caption)], sheet, fonts, width))
            .unwrap_or_default();
        FigureBox {
            image_width,
            image_height,
            caption,
        }
    }

    pub fn height(&self, sheet: &StyleSheet) -> f32 {
        if self.caption.is_empty() {
            return self.image_height;
        }
        self.image_height
            + CAPTION_GAP
            + text::stack_height(&self.caption)
            + sheet.style(Role::Caption).space_after()
    }
}

/// Two wrapped columns of a signature block.
pub fn signature_columns(
    block: &SignatureBlock,
    sheet: &StyleSheet,
    fonts: &FontSet,
    width: f32,
) -> (Vec<StyledLine>, Vec<StyledLine>) {
    let col = width / 2.0;
    (
        text::wrap_entries(&block.member_entries(), sheet, fonts, col),
        text::wrap_entries(&block.guide_entries(), sheet, fonts, col),
    )
}

pub fn signature_height(columns: &(Vec<StyledLine>, Vec<StyledLine>)) -> f32 {
    SIGNATURE_HEADER_GAP + text::stack_height(&columns.0).max(text::stack_height(&columns.1))
}

/// Wrapped cells of a signatory grid, row by row.
pub fn grid_cells(
    grid: &SignatoryGrid,
    sheet: &StyleSheet,
    fonts: &FontSet,
    width: f32,
) -> Vec<[Vec<StyledLine>; 2]> {
    let col = width / 2.0;
    grid.rows
        .iter()
        .map(|row| {
            row.clone().map(|cell| {
                cell.map(|s| text::wrap_entries(&s.entries(), sheet, fonts, col))
                    .unwrap_or_default()
            })
        })
        .collect()
}

pub fn grid_row_height(row: &[Vec<StyledLine>; 2]) -> f32 {
    text::stack_height(&row[0]).max(text::stack_height(&row[1]))
}

pub fn grid_height(rows: &[[Vec<StyledLine>; 2]]) -> f32 {
    let gaps = rows.len().saturating_sub(1) as f32 * SIGNATORY_ROW_GAP;
    rows.iter().map(grid_row_height).sum::<f32>() + gaps
}

/// Measures blocks by breaking lines against real font advance widths.
/// The PDF renderer lays text out with the same line builder and fonts, so
/// measured heights are the heights it draws.
#[derive(Clone)]
pub struct MetricsMeasurer {
    sheet: StyleSheet,
    fonts: Arc<FontSet>,
}

impl MetricsMeasurer {
    pub fn new(sheet: StyleSheet, fonts: Arc<FontSet>) -> Self {
        MetricsMeasurer { sheet, fonts }
    }

    pub fn sheet(&self) -> &StyleSheet {
        &self.sheet
    }

    pub fn fonts(&self) -> &Arc<FontSet> {
        &self.fonts
    }

    fn pitch(&self, role: Role) -> f32 {
        text::line_pitch(&self.sheet.style(role), &self.sheet, &self.fonts)
    }
}

impl BlockMeasurer for MetricsMeasurer {
    fn measure(&self, block: &ContentBlock, width: f32) -> f32 {
        let (sheet, fonts) = (&self.sheet, &*self.fonts);
        match block {
            ContentBlock::Heading {
                text: t,
                subtitle,
                role,
                ..
            } => {
                let (main, sub) = text::heading_lines(t, subtitle.as_deref(), *role, sheet, fonts, width);
                let sub_pitch = text::line_pitch(&text::subtitle_style(), sheet, fonts);
                main.len() as f32 * self.pitch(*role) + sub.len() as f32 * sub_pitch
            }
            ContentBlock::Paragraph { role, .. } => {
                let lines = text::paragraph_lines(block, sheet, fonts, width)
                    .map(|(lines, _)| lines.len())
                    .unwrap_or(1);
                lines as f32 * self.pitch(*role)
            }
            ContentBlock::Figure(figure) => FigureBox::new(figure, sheet, fonts, width).height(sheet),
            ContentBlock::Signature(sig) => {
                signature_height(&signature_columns(sig, sheet, fonts, width))
            }
            ContentBlock::Signatories(grid) => grid_height(&grid_cells(grid, sheet, fonts, width)),
            ContentBlock::Spacer { height, .. } => *height,
            ContentBlock::Section { .. } => 0.0,
            ContentBlock::TocEntry { text: t, level, .. } => {
                let lines = text::toc_lines(t, *level, sheet, fonts, width).len();
                lines as f32 * text::line_pitch(&text::toc_style(sheet, *level), sheet, fonts)
            }
        }
    }

    fn margin(&self, block: &ContentBlock) -> f32 {
        match block {
            ContentBlock::Figure(_) => FIGURE_BEFORE + FIGURE_AFTER,
            ContentBlock::TocEntry { .. } => {
                let style = self.sheet.style(Role::TocLine);
                style.space_before() + style.space_after()
            }
            other => other
                .role()
                .map(|role| {
                    let style = self.sheet.style(role);
                    style.space_before() + style.space_after()
                })
                .unwrap_or(0.0),
        }
    }

    fn lead_height(&self, block: &ContentBlock, width: f32) -> f32 {
        match block {
            ContentBlock::Paragraph { role, .. } => self.pitch(*role),
            other => self.measure(other, width),
        }
    }
}

/// Character budget of the heuristic measurer: how many characters of body
/// text fit on the first page and on every following page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharBudget {
    pub first_page: usize,
    pub per_page: usize,
    /// The first-page budget already leaves room for a trailing signature
    /// area, so its blocks are not charged again when placed.
    pub signature_area: bool,
}

/// Base first-page budget of the abstract page before signatures are deducted.
pub const ABSTRACT_FIRST_PAGE: usize = 1800;
pub const ABSTRACT_PER_PAGE: usize = 2800;
pub const MIN_FIRST_PAGE: usize = 500;
pub const CHARS_PER_MEMBER: usize = 150;
pub const GUIDE_CHARS: usize = 400;
/// Character cost of a heading below the document title.
pub const HEADING_CHARS: usize = 200;

impl Default for CharBudget {
    fn default() -> Self {
        CharBudget {
            first_page: ABSTRACT_PER_PAGE,
            per_page: ABSTRACT_PER_PAGE,
            signature_area: false,
        }
    }
}

impl CharBudget {
    /// First page shrinks by the room the signature block will take.
    pub fn abstract_page(members: usize, has_guide: bool) -> Self {
        let cost = signature_chars(members, has_guide);
        CharBudget {
            first_page: MIN_FIRST_PAGE.max(ABSTRACT_FIRST_PAGE.saturating_sub(cost)),
            per_page: ABSTRACT_PER_PAGE,
            signature_area: true,
        }
    }

    /// Characters the document title costs so that the rest of page one
    /// holds exactly `first_page` characters of text after one more heading.
    pub fn title_chars(&self) -> usize {
        self.per_page
            .saturating_sub(self.first_page)
            .saturating_sub(HEADING_CHARS)
            .max(HEADING_CHARS)
    }
}

pub fn signature_chars(members: usize, has_guide: bool) -> usize {
    members * CHARS_PER_MEMBER + if has_guide { GUIDE_CHARS } else { 0 }
}

/// Calibrated characters-per-page model for targets without a layout engine.
/// Every block costs a number of characters; a page holds `per_page` of them.
#[derive(Clone, Copy, Debug)]
pub struct HeuristicMeasurer {
    budget: CharBudget,
    points_per_char: f32,
}

impl HeuristicMeasurer {
    pub fn new(budget: CharBudget, writable_height: f32) -> Self {
        HeuristicMeasurer {
            budget,
            points_per_char: writable_height / budget.per_page.max(1) as f32,
        }
    }

    pub fn budget(&self) -> CharBudget {
        self.budget
    }

    /// Keywords line, the drop above the signatures and the signatures
    /// themselves, when the budget has reserved room for them.
    fn in_signature_area(&self, block: &ContentBlock) -> bool {
        self.budget.signature_area
            && matches!(
                block,
                ContentBlock::Signature(_)
                    | ContentBlock::Spacer { stretch: false, .. }
                    | ContentBlock::Paragraph {
                        role: Role::Keywords,
                        ..
                    }
            )
    }

    fn chars(&self, block: &ContentBlock) -> f32 {
        match block {
            ContentBlock::Heading { level: 0, .. } => self.budget.title_chars() as f32,
            ContentBlock::Heading { .. } => HEADING_CHARS as f32,
            ContentBlock::Paragraph {
                text, lead, tail, ..
            } => {
                let extra = lead.as_ref().map_or(0, |l| l.chars().count())
                    + tail.as_ref().map_or(0, |t| t.chars().count());
                (text.chars().count() + extra) as f32
            }
            ContentBlock::Signature(sig) => {
                let members = sig.members.iter().filter(|m| !m.name.trim().is_empty()).count();
                signature_chars(members, !sig.guide.name.trim().is_empty()) as f32
            }
            ContentBlock::Signatories(grid) => {
                (grid.rows.len() * 2 * CHARS_PER_MEMBER) as f32
            }
            ContentBlock::TocEntry { text, .. } => text.chars().count().max(80) as f32,
            ContentBlock::Figure(_) | ContentBlock::Spacer { .. } | ContentBlock::Section { .. } => 0.0,
        }
    }
}

impl BlockMeasurer for HeuristicMeasurer {
    fn measure(&self, block: &ContentBlock, width: f32) -> f32 {
        if self.in_signature_area(block) {
            return 0.0;
        }
        match block {
            ContentBlock::Spacer { height, .. } => *height,
            ContentBlock::Figure(f) => width * f32::from(f.width_percent.min(100)) / 100.0 * f.aspect_ratio,
            other => self.chars(other) * self.points_per_char,
        }
    }

    fn lead_height(&self, block: &ContentBlock, width: f32) -> f32 {
        match block {
            ContentBlock::Paragraph { .. } => self
                .measure(block, width)
                .min(HEADING_CHARS as f32 * self.points_per_char),
            other => self.measure(other, width),
        }
    }
}
