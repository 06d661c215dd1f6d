// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Workbook writer — serialise document tables to `.xlsx` using
// `rust_xlsxwriter`.
//
// Each document becomes one worksheet: the canonical header row, then one row
// per logical row. Every cell is text-wrapped, top-aligned and thin-bordered;
// panes are frozen below the header; columns are sized to their longest value
// and rows to their tallest multi-line field.

use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use tablescan_core::error::TablescanError;
use tablescan_core::{COLUMN_COUNT, DocumentTable, HEADER, LogicalRow};
use tracing::{debug, info, instrument};

use crate::naming::SheetNamer;

/// Column width bounds, in characters.
const MIN_COLUMN_WIDTH: usize = 12;
const MAX_COLUMN_WIDTH: usize = 60;
/// Points per text line.
const LINE_HEIGHT: f64 = 13.0;
/// Tallest row Excel allows, in points.
const MAX_ROW_HEIGHT: f64 = 409.0;

/// Builds a workbook with one sheet per document table.
pub struct WorkbookWriter {
    workbook: Workbook,
    namer: SheetNamer,
    cell_format: Format,
    sheet_names: Vec<String>,
}

impl Default for WorkbookWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookWriter {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            namer: SheetNamer::new(),
            cell_format: Format::new()
                .set_text_wrap()
                .set_align(FormatAlign::Top)
                .set_border(FormatBorder::Thin),
            sheet_names: Vec::new(),
        }
    }

    /// Names of the sheets added so far, in order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Add `document` as a new sheet and return the sheet's name.
    ///
    /// # Errors
    ///
    /// [`TablescanError::SheetNamesExhausted`] when no unique name is left,
    /// [`TablescanError::Workbook`] for writer failures.
    #[instrument(skip_all, fields(document = %document.name, rows = document.table.len()))]
    pub fn add_table(&mut self, document: &DocumentTable) -> Result<String, TablescanError> {
        let name = self.namer.next_name(&document.name)?;
        let format = &self.cell_format;
        let sheet = self.workbook.add_worksheet();
        sheet.set_name(&name).map_err(workbook_error)?;

        for (col, label) in HEADER.iter().enumerate() {
            sheet
                .write_string_with_format(0, col as u16, *label, format)
                .map_err(workbook_error)?;
        }
        sheet.set_freeze_panes(1, 0).map_err(workbook_error)?;

        for (index, row) in document.table.rows.iter().enumerate() {
            let sheet_row = index as u32 + 1;
            write_row(sheet, sheet_row, row, format).map_err(workbook_error)?;
            sheet
                .set_row_height(sheet_row, row_height(row))
                .map_err(workbook_error)?;
        }

        for (col, width) in column_widths(document).into_iter().enumerate() {
            sheet
                .set_column_width(col as u16, width as f64)
                .map_err(workbook_error)?;
        }

        debug!(sheet = %name, "Sheet written");
        self.sheet_names.push(name.clone());
        Ok(name)
    }

    /// Write the workbook to `path`.
    #[instrument(skip(self), fields(sheets = self.sheet_names.len()))]
    pub fn save(mut self, path: &Path) -> Result<(), TablescanError> {
        self.workbook.save(path).map_err(workbook_error)?;
        info!(path = %path.display(), sheets = self.sheet_names.len(), "Workbook saved");
        Ok(())
    }

    /// Serialise the workbook into memory.
    pub fn save_to_buffer(mut self) -> Result<Vec<u8>, TablescanError> {
        self.workbook.save_to_buffer().map_err(workbook_error)
    }
}

fn write_row(
    sheet: &mut Worksheet,
    sheet_row: u32,
    row: &LogicalRow,
    format: &Format,
) -> Result<(), XlsxError> {
    for (col, value) in row.fields().iter().enumerate() {
        sheet.write_string_with_format(sheet_row, col as u16, value, format)?;
    }
    Ok(())
}

/// Width of each column: its longest value (header included), clamped to
/// `[12, 60]` characters.
pub fn column_widths(document: &DocumentTable) -> [usize; COLUMN_COUNT] {
    let mut widths = [MIN_COLUMN_WIDTH; COLUMN_COUNT];
    let values = std::iter::once(HEADER.map(str::to_string))
        .chain(document.table.rows.iter().map(|row| row.fields().clone()));
    for fields in values {
        for (width, value) in widths.iter_mut().zip(&fields) {
            let len = value.chars().count().min(MAX_COLUMN_WIDTH);
            *width = (*width).max(len);
        }
    }
    widths
}

/// Height of a data row: 13 points per line of its tallest field, capped at
/// Excel's maximum.
pub fn row_height(row: &LogicalRow) -> f64 {
    (LINE_HEIGHT * row.line_count() as f64).min(MAX_ROW_HEIGHT)
}

fn workbook_error(err: XlsxError) -> TablescanError {
    TablescanError::Workbook(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablescan_core::Table;

    fn document(name: &str, rows: Vec<LogicalRow>) -> DocumentTable {
        DocumentTable {
            name: name.to_string(),
            table: Table { rows },
        }
    }

    #[test]
    fn widths_are_clamped() {
        let query = "q".repeat(90);
        let doc = document(
            "log",
            vec![LogicalRow::from_fields(["L1", "5", query.as_str(), "USPAT"])],
        );
        let widths = column_widths(&doc);
        assert_eq!(widths[0], 12);
        assert_eq!(widths[2], 60);
        // "Default Operator" and "British Equivalents" headers exceed the floor.
        assert_eq!(widths[4], 16);
        assert_eq!(widths[6], 19);
    }

    #[test]
    fn row_height_follows_line_count() {
        let single = LogicalRow::with_reference("L1", "one line");
        assert_eq!(row_height(&single), 13.0);

        let folded = LogicalRow::with_reference("L1", "a\nb\nc");
        assert_eq!(row_height(&folded), 39.0);

        let huge = LogicalRow::with_reference("L1", "x\n".repeat(100));
        assert_eq!(row_height(&huge), 409.0);
    }

    #[test]
    fn sheets_are_named_after_documents() {
        let mut writer = WorkbookWriter::new();
        let rows = vec![LogicalRow::with_reference("L1", "emf AND skin\nOR tissue")];
        writer.add_table(&document("Report:2024", rows.clone())).unwrap();
        writer.add_table(&document("Report:2024", rows)).unwrap();
        writer.add_table(&document("empty", Vec::new())).unwrap();

        assert_eq!(writer.sheet_names(), ["Report_2024", "Report_2024_1", "empty"]);
    }

    #[test]
    fn workbook_saves_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        let mut writer = WorkbookWriter::new();
        writer
            .add_table(&document("log", vec![LogicalRow::with_reference("L1", "radar")]))
            .unwrap();
        writer.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn workbook_serialises_to_memory() {
        let mut writer = WorkbookWriter::new();
        writer.add_table(&document("log", Vec::new())).unwrap();
        let bytes = writer.save_to_buffer().unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
