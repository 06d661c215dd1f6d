// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tablescan-workbook — Persists reconstructed document tables as an `.xlsx`
// workbook, one sheet per source document.

pub mod naming;
pub mod writer;

pub use naming::SheetNamer;
pub use writer::WorkbookWriter;
