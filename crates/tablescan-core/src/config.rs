// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TablescanError};
use crate::types::PageSegMode;

/// Tunables for the table reconstruction pipeline.
///
/// Every field has a default, so a JSON config file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Rasterization resolution for PDF pages.
    pub render_dpi: u32,
    /// Fraction of the orthogonal dimension a rule must cover to count as a
    /// grid line. Exclusive range (0, 1).
    pub min_line_fraction: f32,
    /// Padding added around every cell crop before OCR.
    pub cell_padding_px: u32,
    /// First segmentation mode tried during consensus OCR.
    pub page_segmentation_mode: u8,
    /// OCR language tag.
    pub language: String,
    /// Extra padding applied on each retry level when a cell reads empty.
    pub padding_steps: Vec<u32>,
    /// Radius of the local-mean window used by the line binarizer.
    pub adaptive_block_radius: u32,
    /// Constant subtracted from the local mean before comparing.
    pub adaptive_offset: i32,
    /// Non-local-means filter strength applied before OCR.
    pub denoise_strength: f32,
    /// OCR the cells of a page on a worker pool.
    pub parallel: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            render_dpi: 450,
            min_line_fraction: 0.38,
            cell_padding_px: 6,
            page_segmentation_mode: 6,
            language: "eng".to_string(),
            padding_steps: vec![0, 6, 12],
            adaptive_block_radius: 7,
            adaptive_offset: 10,
            denoise_strength: 15.0,
            parallel: false,
        }
    }
}

impl ScanConfig {
    /// Load a (possibly partial) JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// The configured default segmentation mode.
    pub fn default_mode(&self) -> PageSegMode {
        PageSegMode(self.page_segmentation_mode)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_line_fraction > 0.0 && self.min_line_fraction < 1.0) {
            return Err(TablescanError::Config(format!(
                "min_line_fraction must be in (0, 1), got {}",
                self.min_line_fraction
            )));
        }
        if self.render_dpi == 0 {
            return Err(TablescanError::Config("render_dpi must be positive".into()));
        }
        if self.padding_steps.is_empty() {
            return Err(TablescanError::Config(
                "padding_steps needs at least one level".into(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(TablescanError::Config("language tag is empty".into()));
        }
        Ok(())
    }
}
