// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cell segmentation — turn rule positions into cell rectangles.

use tablescan_core::{Cell, LineSet};

/// Pixels trimmed inside each bounding rule so the rule itself is not cropped.
pub const RULE_INSET: u32 = 1;

/// Build the row-major grid of cells bounded by adjacent rules.
///
/// Each cell spans `[x_i + 1, x_{i+1} - 1)` by `[y_j + 1, y_{j+1} - 1)`. Bands
/// too narrow to hold a pixel after the inset collapse to a zero-sized cell at
/// the band start, which crops to an empty image rather than panicking.
pub fn segment_cells(lines: &LineSet) -> Vec<Vec<Cell>> {
    lines
        .y_centers
        .windows(2)
        .enumerate()
        .map(|(row, ys)| {
            let (y1, y2) = inset(ys[0], ys[1]);
            lines
                .x_centers
                .windows(2)
                .enumerate()
                .map(|(col, xs)| {
                    let (x1, x2) = inset(xs[0], xs[1]);
                    Cell {
                        row,
                        col,
                        x1,
                        x2,
                        y1,
                        y2,
                    }
                })
                .collect()
        })
        .collect()
}

fn inset(low: u32, high: u32) -> (u32, u32) {
    let start = low + RULE_INSET;
    let end = high.saturating_sub(RULE_INSET).max(start);
    (start, end)
}
