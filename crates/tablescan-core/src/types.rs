// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for search-log table reconstruction.

use serde::{Deserialize, Serialize};

/// Labels of the canonical search-log table, in column order.
pub const HEADER: [&str; COLUMN_COUNT] = [
    "Ref #",
    "Hits",
    "Search Query",
    "DBs",
    "Default Operator",
    "Plurals",
    "British Equivalents",
    "Time Stamp",
];

/// Width of every [`LogicalRow`].
pub const COLUMN_COUNT: usize = 8;

/// Named positions in the canonical header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    ReferenceId,
    HitCount,
    Query,
    Databases,
    Operator,
    Plurals,
    BritishEquivalents,
    Timestamp,
}

impl Column {
    /// Zero-based index into a [`LogicalRow`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Header label for this column.
    pub fn label(self) -> &'static str {
        HEADER[self.index()]
    }
}

/// OCR page-segmentation mode (Tesseract `--psm` numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageSegMode(pub u8);

impl PageSegMode {
    /// A single column of text of variable sizes.
    pub const SINGLE_COLUMN: Self = Self(4);
    /// A single uniform block of text.
    pub const UNIFORM_BLOCK: Self = Self(6);
    /// A single text line.
    pub const SINGLE_LINE: Self = Self(7);
}

impl std::fmt::Display for PageSegMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "psm {}", self.0)
    }
}

/// Detected grid rule positions for one page.
///
/// Both axes are strictly increasing with no duplicates. Adjacent coordinates
/// bound one band, so there are `x_centers.len() - 1` columns and
/// `y_centers.len() - 1` rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSet {
    /// Vertical rule positions (x coordinates).
    pub x_centers: Vec<u32>,
    /// Horizontal rule positions (y coordinates).
    pub y_centers: Vec<u32>,
}

impl LineSet {
    /// Build a line set from unordered coordinates, sorting and removing
    /// duplicates.
    pub fn from_centers(mut x_centers: Vec<u32>, mut y_centers: Vec<u32>) -> Self {
        x_centers.sort_unstable();
        x_centers.dedup();
        y_centers.sort_unstable();
        y_centers.dedup();
        Self {
            x_centers,
            y_centers,
        }
    }

    /// Whether both axes carry at least two rules, i.e. at least one cell.
    pub fn is_grid(&self) -> bool {
        self.x_centers.len() >= 2 && self.y_centers.len() >= 2
    }

    /// Number of column bands.
    pub fn columns(&self) -> usize {
        self.x_centers.len().saturating_sub(1)
    }

    /// Number of row bands.
    pub fn rows(&self) -> usize {
        self.y_centers.len().saturating_sub(1)
    }
}

/// A rectangular pixel region of the page, `x1 < x2`, `y1 < y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub x1: u32,
    pub x2: u32,
    pub y1: u32,
    pub y2: u32,
}

impl Cell {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

/// Outcome class of a cell read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStatus {
    /// At least one attempt produced text.
    Read,
    /// Every attempt succeeded but produced no text.
    Blank,
    /// Every attempt failed in the OCR backend.
    Unreadable,
}

/// Text recovered from one cell plus which attempt produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellText {
    /// Recognized text; empty is a valid result.
    pub text: String,
    /// Segmentation mode of the winning attempt, if any attempt succeeded.
    pub mode: Option<PageSegMode>,
    /// Extra padding level (pixels beyond the base padding) of the winning attempt.
    pub padding: u32,
    pub status: CellStatus,
}

impl CellText {
    pub fn blank(padding: u32) -> Self {
        Self {
            text: String::new(),
            mode: None,
            padding,
            status: CellStatus::Blank,
        }
    }

    pub fn unreadable(padding: u32) -> Self {
        Self {
            text: String::new(),
            mode: None,
            padding,
            status: CellStatus::Unreadable,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One semantically complete record with exactly [`COLUMN_COUNT`] fields.
///
/// Narrative fields may carry embedded newlines from folded continuations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalRow {
    fields: [String; COLUMN_COUNT],
}

impl LogicalRow {
    /// Normalize an arbitrary-width raw row: short rows are padded with empty
    /// strings, long rows are truncated.
    pub fn from_fields<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row = Self::default();
        for (slot, value) in row.fields.iter_mut().zip(raw) {
            *slot = value.into();
        }
        row
    }

    /// A row holding only a reference id and query text.
    pub fn with_reference(reference: impl Into<String>, query: impl Into<String>) -> Self {
        let mut row = Self::default();
        row.fields[Column::ReferenceId.index()] = reference.into();
        row.fields[Column::Query.index()] = query.into();
        row
    }

    pub fn get(&self, column: Column) -> &str {
        &self.fields[column.index()]
    }

    pub fn set(&mut self, column: Column, value: impl Into<String>) {
        self.fields[column.index()] = value.into();
    }

    pub fn reference(&self) -> &str {
        self.get(Column::ReferenceId)
    }

    pub fn fields(&self) -> &[String; COLUMN_COUNT] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [String; COLUMN_COUNT] {
        &mut self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(String::is_empty)
    }

    /// Number of lines in the tallest field.
    pub fn line_count(&self) -> usize {
        self.fields
            .iter()
            .map(|field| field.lines().count().max(1))
            .max()
            .unwrap_or(1)
    }
}

/// Ordered sequence of logical rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<LogicalRow>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append all rows of `other` after this table's rows.
    pub fn extend(&mut self, other: Table) {
        self.rows.extend(other.rows);
    }
}

/// Which path produced a page's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLayout {
    /// A ruled grid was found and every cell was read individually.
    Grid { rows: usize, columns: usize },
    /// No usable grid; the page was read whole and split on reference tokens.
    Fallback,
}

/// Raw (unfolded) rows recovered from one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRows {
    /// 1-based page number.
    pub page_number: u32,
    pub layout: PageLayout,
    pub rows: Vec<LogicalRow>,
}

/// The reconstructed table for one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTable {
    /// Source document name (file stem), used to name its sheet.
    pub name: String,
    pub table: Table,
}
