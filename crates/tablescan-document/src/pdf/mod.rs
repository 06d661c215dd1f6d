// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page enumeration via `lopdf` and page rasterization.

pub mod raster;
pub mod reader;

pub use raster::{PdftoppmRasterizer, Rasterizer};
pub use reader::PdfReader;
