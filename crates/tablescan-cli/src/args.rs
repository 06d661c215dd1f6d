// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and their overlay onto `ScanConfig`.

use std::path::PathBuf;

use clap::Parser;
use tablescan_core::ScanConfig;
use tablescan_core::error::TablescanError;

/// Reconstruct search-log tables from scanned PDFs into one Excel workbook.
#[derive(Debug, Parser)]
#[command(name = "tablescan", version, about)]
pub struct Cli {
    /// PDF files to process, after any found with --dir.
    pub inputs: Vec<PathBuf>,

    /// Directory to search for PDFs.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Pattern matched inside --dir.
    #[arg(long, default_value = "*.pdf")]
    pub glob: String,

    /// Output workbook path.
    #[arg(long)]
    pub out: PathBuf,

    /// JSON file with scan settings; flags below override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Rendering DPI for PDF pages.
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Fraction of the page a rule must span to count as a grid line.
    #[arg(long = "min-line-frac")]
    pub min_line_frac: Option<f32>,

    /// Padding in pixels around each cell before OCR.
    #[arg(long)]
    pub pad: Option<u32>,

    /// Default tesseract page segmentation mode.
    #[arg(long)]
    pub psm: Option<u8>,

    /// OCR language tag.
    #[arg(long)]
    pub lang: Option<String>,

    /// OCR the cells of each page in parallel.
    #[arg(long)]
    pub parallel: bool,

    /// Explicit tesseract binary instead of searching for one.
    #[arg(long)]
    pub tesseract: Option<PathBuf>,

    /// Explicit pdftoppm binary instead of searching for one.
    #[arg(long)]
    pub pdftoppm: Option<PathBuf>,
}

impl Cli {
    /// Settings from --config (or defaults) with command-line overrides
    /// applied, validated.
    pub fn scan_config(&self) -> Result<ScanConfig, TablescanError> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::from_json_file(path)?,
            None => ScanConfig::default(),
        };

        if let Some(dpi) = self.dpi {
            config.render_dpi = dpi;
        }
        if let Some(fraction) = self.min_line_frac {
            config.min_line_fraction = fraction;
        }
        if let Some(pad) = self.pad {
            config.cell_padding_px = pad;
        }
        if let Some(psm) = self.psm {
            config.page_segmentation_mode = psm;
        }
        if let Some(lang) = &self.lang {
            config.language = lang.clone();
        }
        if self.parallel {
            config.parallel = true;
        }

        config.validate()?;
        Ok(config)
    }
}
