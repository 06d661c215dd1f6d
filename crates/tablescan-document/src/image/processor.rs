// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — padded cell crops and grayscale conversion for page
// bitmaps, plus PNG encoding for OCR hand-off. Operates on in-memory images
// using the `image` crate.

use image::{DynamicImage, GrayImage, ImageFormat};
use tablescan_core::Cell;
use tablescan_core::error::TablescanError;
use tracing::{debug, trace};

/// Image processing pipeline operating on a single in-memory page or cell.
///
/// Each transforming method consumes `self` and returns a new
/// `ImageProcessor`, enabling method chaining:
///
/// ```ignore
/// let cell = ImageProcessor::from_dynamic(page)
///     .crop_padded(&cell, 6)
///     .grayscale()
///     .into_luma();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Consume the processor and return 8-bit luma pixels.
    pub fn into_luma(self) -> GrayImage {
        match self.image {
            DynamicImage::ImageLuma8(gray) => gray,
            other => other.to_luma8(),
        }
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Crop `cell` grown by `padding` pixels on every edge.
    ///
    /// See [`crop_cell`] for the clipping rules.
    pub fn crop_padded(self, cell: &Cell, padding: u32) -> Self {
        Self {
            image: crop_cell(&self.image, cell, padding),
        }
    }

    /// Convert the image to grayscale (luma).
    pub fn grayscale(self) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        }
    }
}

/// Copy `cell` grown by `padding` pixels on every edge out of `image`.
///
/// The grown rectangle is clipped to the image bounds. A cell lying fully
/// outside the image yields a zero-sized image.
pub fn crop_cell(image: &DynamicImage, cell: &Cell, padding: u32) -> DynamicImage {
    let (img_w, img_h) = (image.width(), image.height());

    let x_start = cell.x1.saturating_sub(padding).min(img_w);
    let y_start = cell.y1.saturating_sub(padding).min(img_h);
    let x_end = cell.x2.saturating_add(padding).min(img_w).max(x_start);
    let y_end = cell.y2.saturating_add(padding).min(img_h).max(y_start);

    trace!(
        row = cell.row,
        col = cell.col,
        padding,
        x_start,
        y_start,
        x_end,
        y_end,
        "Cropping cell"
    );

    image.crop_imm(x_start, y_start, x_end - x_start, y_end - y_start)
}

/// Encode a grayscale bitmap as PNG, the interchange format for OCR backends.
pub fn encode_gray_png(image: &GrayImage) -> Result<Vec<u8>, TablescanError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, ImageFormat::Png).map_err(|err| {
        TablescanError::Image(format!("PNG encoding failed: {}", err))
    })?;
    debug!(bytes = buffer.len(), "Encoded grayscale PNG");
    Ok(buffer)
}
