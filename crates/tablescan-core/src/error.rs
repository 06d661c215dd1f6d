// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for tablescan.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all tablescan operations.
#[derive(Debug, Error)]
pub enum TablescanError {
    // -- Environment --
    #[error("required external tool not found: {0}")]
    BackendNotFound(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Input --
    #[error("no PDFs found")]
    NoDocuments,

    #[error("missing input: {}", .0.display())]
    MissingInput(PathBuf),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("page rasterization failed: {0}")]
    Rasterize(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    // -- Persistence --
    #[error("sheet naming overflow: no free name for {0:?}")]
    SheetNamesExhausted(String),

    #[error("workbook write failed: {0}")]
    Workbook(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TablescanError>;
