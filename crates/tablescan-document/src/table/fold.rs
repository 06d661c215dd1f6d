// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Continuation folder — merges wrapped OCR rows back into the logical record
// they continue.
//
// The fold is a pure reducer `fold_row(acc, row) -> acc`. The open row is the
// last row of the accumulator:
//
// - first field is a reference token: push the row, it becomes the open row
// - first field blank and a row is open: append each non-empty column to the
//   open row's column, newline-joined
// - anything else: push the row as-is (it becomes the open row)

use tablescan_core::LogicalRow;
use tablescan_core::reference::is_reference_token;

/// Fold one raw row into the accumulated logical rows.
pub fn fold_row(mut acc: Vec<LogicalRow>, row: LogicalRow) -> Vec<LogicalRow> {
    let row = trimmed(row);

    if is_reference_token(row.reference()) {
        acc.push(row);
        return acc;
    }

    if row.reference().is_empty() {
        if let Some(open) = acc.last_mut() {
            for (dest, text) in open.fields_mut().iter_mut().zip(row.fields()) {
                if text.is_empty() {
                    continue;
                }
                if !dest.is_empty() {
                    dest.push('\n');
                }
                dest.push_str(text);
            }
            return acc;
        }
    }

    acc.push(row);
    acc
}

/// Fold a whole raw row sequence, in order.
pub fn fold_rows<I>(rows: I) -> Vec<LogicalRow>
where
    I: IntoIterator<Item = LogicalRow>,
{
    rows.into_iter().fold(Vec::new(), fold_row)
}

fn trimmed(mut row: LogicalRow) -> LogicalRow {
    for field in row.fields_mut() {
        let trimmed = field.trim();
        if trimmed.len() != field.len() {
            *field = trimmed.to_string();
        }
    }
    row
}
