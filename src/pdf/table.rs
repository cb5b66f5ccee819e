use crate::flow::measure::{
    SIGNATORY_ROW_GAP, SIGNATURE_HEADER_GAP, grid_cells, grid_row_height, signature_columns,
    signature_height,
};
use crate::fonts::FontSet;
use crate::model::{Alignment, SignatoryGrid, SignatureBlock};
use crate::style::StyleSheet;

use super::layout::{Column, Mark, place_stack};

fn halves(col: Column) -> [Column; 2] {
    let half = col.width / 2.0;
    [
        Column {
            left: col.left,
            width: half,
        },
        Column {
            left: col.left + half,
            width: half,
        },
    ]
}

/// Members on the left, guide on the right, headers separated from names.
pub(super) fn signature(
    marks: &mut Vec<Mark>,
    sig: &SignatureBlock,
    sheet: &StyleSheet,
    fonts: &FontSet,
    col: Column,
    top: f32,
) -> f32 {
    let columns = signature_columns(sig, sheet, fonts, col.width);
    let [left, right] = halves(col);
    place_stack(marks, &columns.0, left, top, None, SIGNATURE_HEADER_GAP, fonts);
    place_stack(marks, &columns.1, right, top, None, SIGNATURE_HEADER_GAP, fonts);
    signature_height(&columns)
}

pub(super) fn grid(
    marks: &mut Vec<Mark>,
    grid: &SignatoryGrid,
    sheet: &StyleSheet,
    fonts: &FontSet,
    col: Column,
    top: f32,
) -> f32 {
    let rows = grid_cells(grid, sheet, fonts, col.width);
    let cols = halves(col);
    let mut y = top;
    for (r, row) in rows.iter().enumerate() {
        if r > 0 {
            y -= SIGNATORY_ROW_GAP;
        }
        for (c, cell) in row.iter().enumerate() {
            let align = match (grid.edge_aligned, c) {
                (true, 0) => Alignment::Left,
                (true, _) => Alignment::Right,
                (false, _) => Alignment::Center,
            };
            place_stack(marks, cell, cols[c], y, Some(align), 0.0, fonts);
        }
        y -= grid_row_height(row);
    }
    top - y
}
