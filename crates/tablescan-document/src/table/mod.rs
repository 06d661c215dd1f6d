// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Row-level stages: splitting whole-page OCR text into rows, folding
// continuation rows, and assembling per-document tables.

pub mod assemble;
pub mod fallback;
pub mod fold;

pub use assemble::TableAssembler;
pub use fallback::split_lines;
pub use fold::{fold_row, fold_rows};
