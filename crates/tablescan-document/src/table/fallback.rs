// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fallback line splitter — turns whole-page OCR text into logical rows when a
// page has no usable grid.

use tablescan_core::reference::split_reference_prefix;
use tablescan_core::{Column, LogicalRow};
use tracing::debug;

/// Split newline-delimited page text into rows.
///
/// A line starting with a reference token opens a new row (reference id plus
/// the rest of the line as query text). Other non-blank lines are appended to
/// the open row's query, or seed a row with an empty reference id when none
/// is open. Text yielding no rows at all becomes a single row carrying the
/// whole page text in its first field, so no page is dropped.
pub fn split_lines(text: &str) -> Vec<LogicalRow> {
    let mut rows: Vec<LogicalRow> = Vec::new();

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some((reference, rest)) = split_reference_prefix(line) {
            rows.push(LogicalRow::with_reference(reference, rest));
            continue;
        }

        match rows.last_mut() {
            Some(open) => {
                let query = open.get(Column::Query);
                let joined = if query.is_empty() {
                    line.to_string()
                } else {
                    format!("{query}\n{line}")
                };
                open.set(Column::Query, joined);
            }
            None => rows.push(LogicalRow::with_reference("", line)),
        }
    }

    if rows.is_empty() {
        rows.push(LogicalRow::from_fields([text.trim()]));
    }

    debug!(rows = rows.len(), "Page text split into rows");
    rows
}
