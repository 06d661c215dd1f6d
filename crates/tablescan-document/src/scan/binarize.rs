// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarization and denoising for scanned pages.
//
// Two thresholding strategies are used at different stages:
//
// - `line_mask` (adaptive, local mean, inverted) feeds grid detection. Local
//   thresholds keep faint rules visible under uneven scan illumination.
// - `otsu_binarize` (global, automatic) feeds the OCR backend, which reads a
//   clean black-on-white bitmap best.

use std::ops::Range;

use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use tracing::{debug, instrument};

/// Half-width of the patch compared by the non-local-means filter (7x7 patch).
const NLM_TEMPLATE_RADIUS: u32 = 3;
/// Half-width of the neighbourhood searched for similar patches (11x11).
const NLM_SEARCH_RADIUS: i64 = 5;

// -- Adaptive line mask -------------------------------------------------------

/// Produce a same-size binary mask where dark strokes are foreground (255).
///
/// For each pixel the threshold is the mean intensity of the
/// `(2 * block_radius + 1)` square around it minus `offset`; pixels at or
/// below the threshold become foreground, everything else background (0).
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn line_mask(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let integral = compute_integral_image(gray);
    let mut output = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let local_mean = region_mean(&integral, width, height, x, y, block_radius);
            let threshold = local_mean - f64::from(offset);
            let pixel_val = f64::from(gray.get_pixel(x, y).0[0]);
            let value = if pixel_val <= threshold { 255u8 } else { 0u8 };
            output.put_pixel(x, y, Luma([value]));
        }
    }

    debug!("Line mask computed");
    output
}

// -- Otsu ---------------------------------------------------------------------

/// Global binarization with an automatically chosen (Otsu) threshold.
///
/// Pixels brighter than the threshold become white (255), the rest black.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn otsu_binarize(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let threshold = otsu_level(gray);
    debug!(threshold, "Otsu threshold computed");

    let mut output = GrayImage::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let binary = if pixel.0[0] > threshold { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([binary]));
    }
    output
}

// -- Non-local means ----------------------------------------------------------

/// Image rows denoised per pass. Working buffers hold one band plus its
/// patch halo, not the whole page.
const NLM_BAND_ROWS: usize = 256;

/// Non-local-means denoising with filter strength `strength`.
///
/// Each output pixel is a weighted average of the pixels in its search
/// window, weighted by `exp(-d / strength^2)` where `d` is the mean squared
/// difference between the 7x7 patches around the two pixels. Edges are
/// replicated. Larger strengths smooth more.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn denoise_non_local_means(gray: &GrayImage, strength: f32) -> GrayImage {
    denoise_in_bands(gray, strength, NLM_BAND_ROWS)
}

fn denoise_in_bands(gray: &GrayImage, strength: f32, band_rows: usize) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || strength <= 0.0 {
        return gray.clone();
    }

    let w = width as usize;
    let h = height as usize;
    let h_sq = f64::from(strength) * f64::from(strength);
    // Weight by mean squared patch difference (0..=255^2).
    let weights: Vec<f32> = (0..=255u32 * 255)
        .map(|d| (-(f64::from(d)) / h_sq).exp() as f32)
        .collect();

    let mut pixels = Vec::with_capacity(w * h);
    for top in (0..h).step_by(band_rows.max(1)) {
        let rows = top..(top + band_rows.max(1)).min(h);
        denoise_band(gray.as_raw(), w, h, rows, &weights, &mut pixels);
    }

    debug!(strength, "Non-local-means denoising complete");
    GrayImage::from_raw(width, height, pixels).unwrap_or_else(|| gray.clone())
}

/// Denoise the image rows in `rows` and append them to `out`.
fn denoise_band(
    src: &[u8],
    w: usize,
    h: usize,
    rows: Range<usize>,
    weights: &[f32],
    out: &mut Vec<u8>,
) {
    let radius = NLM_TEMPLATE_RADIUS as usize;
    let patch_side = 2 * radius + 1;
    let patch_area = (patch_side * patch_side) as u32;

    // Patch sums for the band need `radius` extra rows on each side.
    let first = rows.start.saturating_sub(radius);
    let last = (rows.end + radius).min(h);
    let halo_len = (last - first) * w;
    let band_len = rows.len() * w;

    let mut weighted_sum = vec![0f32; band_len];
    let mut weight_total = vec![0f32; band_len];
    let mut diff = vec![0u32; halo_len];
    let mut row_pass = vec![0u32; halo_len];
    let mut patch = vec![0u32; band_len];

    for dy in -NLM_SEARCH_RADIUS..=NLM_SEARCH_RADIUS {
        for dx in -NLM_SEARCH_RADIUS..=NLM_SEARCH_RADIUS {
            for y in first..last {
                let sy = clamp_index(y as i64 + dy, h);
                for x in 0..w {
                    let sx = clamp_index(x as i64 + dx, w);
                    let d = i32::from(src[y * w + x]) - i32::from(src[sy * w + sx]);
                    diff[(y - first) * w + x] = (d * d) as u32;
                }
            }

            box_sum_horizontal(&diff, &mut row_pass, w, last - first, radius);
            box_sum_vertical(&row_pass, first, &mut patch, rows.clone(), w, h, radius);

            for y in rows.clone() {
                let sy = clamp_index(y as i64 + dy, h);
                for x in 0..w {
                    let sx = clamp_index(x as i64 + dx, w);
                    let idx = (y - rows.start) * w + x;
                    let weight = weights[(patch[idx] / patch_area) as usize];
                    weighted_sum[idx] += weight * f32::from(src[sy * w + sx]);
                    weight_total[idx] += weight;
                }
            }
        }
    }

    out.extend(
        weighted_sum
            .iter()
            .zip(&weight_total)
            .map(|(sum, total)| (sum / total).round().clamp(0.0, 255.0) as u8),
    );
}

fn clamp_index(value: i64, len: usize) -> usize {
    value.clamp(0, len as i64 - 1) as usize
}

/// Sliding-window horizontal sum over `[x - radius, x + radius]`, edges
/// replicated.
fn box_sum_horizontal(input: &[u32], output: &mut [u32], w: usize, h: usize, radius: usize) {
    for y in 0..h {
        let row = &input[y * w..(y + 1) * w];
        let at = |x: i64| row[clamp_index(x, w)];

        let mut sum: u32 = (-(radius as i64)..=radius as i64).map(at).sum();
        for x in 0..w {
            output[y * w + x] = sum;
            let xi = x as i64;
            sum = sum + at(xi + radius as i64 + 1) - at(xi - radius as i64);
        }
    }
}

/// Sliding-window vertical sum over `[y - radius, y + radius]` for the image
/// rows in `rows`, edges of the `h`-row image replicated.
///
/// `input` starts at image row `first_row` and must cover every row the
/// windows touch; `output` starts at `rows.start`.
fn box_sum_vertical(
    input: &[u32],
    first_row: usize,
    output: &mut [u32],
    rows: Range<usize>,
    w: usize,
    h: usize,
    radius: usize,
) {
    let r = radius as i64;
    for x in 0..w {
        let at = |y: i64| input[(clamp_index(y, h) - first_row) * w + x];

        let top = rows.start as i64;
        let mut sum: u32 = (top - r..=top + r).map(at).sum();
        for y in rows.clone() {
            output[(y - rows.start) * w + x] = sum;
            if y + 1 < rows.end {
                let yi = y as i64;
                sum = sum + at(yi + r + 1) - at(yi - r);
            }
        }
    }
}

// -- Integral image helpers ---------------------------------------------------

/// Compute the integral (summed-area table) of a grayscale image.
///
/// `integral[y * (width+1) + x]` contains the sum of all pixel values in the
/// rectangle [0, 0) to (x, y) (exclusive on both axes). The table has
/// dimensions `(width+1) x (height+1)` with a zero-padded border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += u64::from(gray.get_pixel(x, y).0[0]);
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value within the square of `radius` centred on (cx, cy),
/// clipped to the image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = ((cx + radius + 1) as usize).min(img_width as usize);
    let y2 = ((cy + radius + 1) as usize).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    // S = I[y2][x2] - I[y1][x2] - I[y2][x1] + I[y1][x1]
    let sum = integral[y2 * stride + x2] as f64 - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

// -- Tests --------------------------------------------------------------------
