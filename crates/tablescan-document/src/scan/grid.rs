// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grid rule detection — find the horizontal and vertical table rules of a
// binarized page.
//
// ## Pipeline
//
// 1. Morphological opening (erode, then dilate) with a long horizontal
//    structuring element keeps only long horizontal strokes; the same with a
//    long vertical element keeps only long vertical strokes. Glyphs are short
//    strokes and vanish, rules survive, so a grid is found even through text.
// 2. Each opened mask is projected onto the perpendicular axis (foreground
//    count per column for vertical rules, per row for horizontal rules).
// 3. Positions whose count exceeds `min_line_fraction` of the orthogonal
//    dimension are kept.
// 4. Consecutive kept positions are grouped into runs and each run is
//    replaced by its midpoint, collapsing a thick rule to one coordinate.

use image::GrayImage;
use tablescan_core::LineSet;
use tracing::{debug, info, instrument};

/// Horizontal element length is `width / HORIZONTAL_KERNEL_DIVISOR`.
const HORIZONTAL_KERNEL_DIVISOR: u32 = 40;
/// Vertical element length is `height / VERTICAL_KERNEL_DIVISOR`.
const VERTICAL_KERNEL_DIVISOR: u32 = 35;
/// Structuring elements are never shorter than this.
const MIN_KERNEL_LEN: u32 = 10;

/// Result of grid detection on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridDetection {
    /// Both axes carry at least two rules.
    Grid(LineSet),
    /// Fewer than two rules on at least one axis. The partial rules are kept
    /// for diagnostics; they must not be segmented.
    NoGrid(LineSet),
}

impl GridDetection {
    pub fn is_grid(&self) -> bool {
        matches!(self, Self::Grid(_))
    }

    pub fn lines(&self) -> &LineSet {
        match self {
            Self::Grid(lines) | Self::NoGrid(lines) => lines,
        }
    }
}

/// Finds table rules in a binary line-candidate mask.
#[derive(Debug, Clone, Copy)]
pub struct GridLineDetector {
    /// Fraction of the orthogonal dimension a rule must cover, in (0, 1).
    pub min_line_fraction: f32,
}

impl GridLineDetector {
    pub fn new(min_line_fraction: f32) -> Self {
        Self { min_line_fraction }
    }

    /// Detect rule positions in `mask` (foreground = non-zero).
    #[instrument(skip(self, mask), fields(width = mask.width(), height = mask.height()))]
    pub fn detect(&self, mask: &GrayImage) -> GridDetection {
        let (width, height) = mask.dimensions();
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 {
            return GridDetection::NoGrid(LineSet::default());
        }

        let horizontal_len = (width / HORIZONTAL_KERNEL_DIVISOR).max(MIN_KERNEL_LEN) as usize;
        let vertical_len = (height / VERTICAL_KERNEL_DIVISOR).max(MIN_KERNEL_LEN) as usize;
        debug!(horizontal_len, vertical_len, "Structuring elements sized");

        let src = mask.as_raw();
        let horizontal = open(src, w, h, horizontal_len, Axis::Horizontal);
        let vertical = open(src, w, h, vertical_len, Axis::Vertical);

        let column_counts = project(&vertical, w, h, Axis::Vertical);
        let row_counts = project(&horizontal, w, h, Axis::Horizontal);

        let column_floor = (height as f32 * self.min_line_fraction) as usize;
        let row_floor = (width as f32 * self.min_line_fraction) as usize;

        let x_centers = run_midpoints(&positions_above(&column_counts, column_floor));
        let y_centers = run_midpoints(&positions_above(&row_counts, row_floor));
        let lines = LineSet::from_centers(x_centers, y_centers);

        info!(
            vertical_rules = lines.x_centers.len(),
            horizontal_rules = lines.y_centers.len(),
            "Grid rules detected"
        );

        if lines.is_grid() {
            GridDetection::Grid(lines)
        } else {
            GridDetection::NoGrid(lines)
        }
    }
}

/// Group sorted pixel indices into maximal runs of consecutive integers and
/// return each run's midpoint (rounded down).
///
/// Applying this to its own output returns the output unchanged, since
/// midpoints of distinct runs are never adjacent.
pub fn run_midpoints(indices: &[u32]) -> Vec<u32> {
    let mut centers = Vec::new();
    let mut iter = indices.iter().copied();
    let Some(first) = iter.next() else {
        return centers;
    };

    let (mut start, mut prev) = (first, first);
    for index in iter {
        if index == prev + 1 {
            prev = index;
        } else {
            centers.push(start + (prev - start) / 2);
            start = index;
            prev = index;
        }
    }
    centers.push(start + (prev - start) / 2);
    centers
}

// -- Morphology helpers -------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Morph {
    Erode,
    Dilate,
}

/// Opening along one axis with a line element of length `kernel_len`.
fn open(src: &[u8], w: usize, h: usize, kernel_len: usize, axis: Axis) -> Vec<u8> {
    let mut eroded = vec![0u8; w * h];
    sweep(src, &mut eroded, w, h, kernel_len, axis, Morph::Erode);
    let mut opened = vec![0u8; w * h];
    sweep(&eroded, &mut opened, w, h, kernel_len, axis, Morph::Dilate);
    opened
}

/// Sliding-window binary erosion or dilation along `axis`.
///
/// For erosion the window at position `i` spans
/// `[i - anchor, i + kernel_len - 1 - anchor]` with `anchor = kernel_len / 2`;
/// dilation uses the mirrored window. Out-of-bounds pixels are ignored, so
/// erosion near the border only requires the in-bounds part of the window to
/// be set.
fn sweep(
    input: &[u8],
    output: &mut [u8],
    w: usize,
    h: usize,
    kernel_len: usize,
    axis: Axis,
    morph: Morph,
) {
    let (line_len, line_count, step, line_step) = match axis {
        Axis::Horizontal => (w, h, 1, w),
        Axis::Vertical => (h, w, w, 1),
    };
    let anchor = kernel_len / 2;
    let (before, after) = match morph {
        Morph::Erode => (anchor, kernel_len - 1 - anchor),
        // Dilation uses the reflected element so opening restores surviving runs.
        Morph::Dilate => (kernel_len - 1 - anchor, anchor),
    };

    for line in 0..line_count {
        let base = line * line_step;
        let at = |i: usize| input[base + i * step] > 0;

        // Window covering [0, min(after, line_len - 1)] for position 0.
        let mut count = (0..=after.min(line_len - 1)).filter(|&i| at(i)).count();

        for i in 0..line_len {
            let lo = i.saturating_sub(before);
            let hi = (i + after).min(line_len - 1);
            let window = hi - lo + 1;

            let set = match morph {
                Morph::Erode => count == window,
                Morph::Dilate => count > 0,
            };
            output[base + i * step] = if set { 255 } else { 0 };

            let enter = i + after + 1;
            if enter < line_len && at(enter) {
                count += 1;
            }
            if i >= before && at(i - before) {
                count -= 1;
            }
        }
    }
}

/// Foreground count per column (`Axis::Vertical`) or per row
/// (`Axis::Horizontal`).
fn project(mask: &[u8], w: usize, h: usize, axis: Axis) -> Vec<usize> {
    match axis {
        Axis::Vertical => (0..w)
            .map(|x| (0..h).filter(|&y| mask[y * w + x] > 0).count())
            .collect(),
        Axis::Horizontal => mask
            .chunks_exact(w)
            .map(|row| row.iter().filter(|&&p| p > 0).count())
            .collect(),
    }
}

fn positions_above(counts: &[usize], floor: usize) -> Vec<u32> {
    counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > floor)
        .map(|(index, _)| index as u32)
        .collect()
}

// -- Tests --------------------------------------------------------------------
