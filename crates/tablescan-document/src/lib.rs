// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tablescan-document — Table reconstruction from scanned document pages.
//
// Provides PDF page enumeration and rasterization, image cropping, the grid
// pipeline (binarization, rule detection, cell segmentation), consensus cell
// OCR over a pluggable backend, and the row-level stages (fallback line
// splitting, continuation folding, per-document assembly).

pub mod image;
pub mod pdf;
pub mod pipeline;
pub mod scan;
pub mod table;
pub mod tool;

// Re-export the primary structs so callers can use `tablescan_document::TableExtractor` etc.
pub use image::processor::ImageProcessor;
pub use pdf::raster::{PdftoppmRasterizer, Rasterizer};
pub use pdf::reader::PdfReader;
pub use pipeline::TableExtractor;
pub use scan::grid::{GridDetection, GridLineDetector};
pub use scan::ocr::{CellOcr, ConsensusScorer, DensityScorer, OcrBackend, TesseractBackend};
pub use table::assemble::TableAssembler;
