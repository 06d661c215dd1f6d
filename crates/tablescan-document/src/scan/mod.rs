// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — binarization, grid rule detection, cell segmentation,
// and optical character recognition (OCR).

pub mod binarize;
pub mod grid;
pub mod ocr;
pub mod segment;

pub use grid::{GridDetection, GridLineDetector};
pub use ocr::{CellOcr, OcrBackend, TesseractBackend};
pub use segment::segment_cells;
