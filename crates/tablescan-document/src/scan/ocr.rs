// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cell OCR — text extraction from table cells using a consensus of OCR
// attempts over a pluggable backend.
//
// # Consensus
//
// Every read runs the backend three times on the same preprocessed bitmap, with
// the configured default segmentation mode, then mode 4 (single column of
// variable-size text), then mode 7 (single text line). The attempt with the
// highest [`ConsensusScorer`] score wins; ties go to the earlier attempt.
//
// # Padding retries
//
// A grid cell that reads empty is re-cropped with progressively more padding
// (the configured schedule, `[0, 6, 12]` pixels by default, on top of the
// base cell padding) and the whole consensus runs again. The first non-empty
// result wins. An empty result after the last level means a blank cell.
//
// # Backend
//
// [`TesseractBackend`] drives the `tesseract` command-line tool. Tests and
// embedders can supply any other [`OcrBackend`].

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use image::{DynamicImage, GrayImage};
use regex::Regex;
use tablescan_core::error::TablescanError;
use tablescan_core::{Cell, CellStatus, CellText, PageSegMode, ScanConfig};
use tracing::{debug, info, instrument, warn};

use crate::image::processor::{ImageProcessor, crop_cell, encode_gray_png};
use crate::scan::binarize::{denoise_non_local_means, otsu_binarize};
use crate::tool;

/// `word-\nword` produced by in-cell line wrapping.
static HYPHEN_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)-\n(\w)").expect("hyphen regex is valid"));

/// Horizontal whitespace left dangling before a newline.
static TRAILING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+\n").expect("trailing space regex is valid"));

// -- Backend ------------------------------------------------------------------

/// A text recognizer for binary images.
///
/// Implementations are called concurrently from worker threads with
/// immutable inputs and must not rely on shared mutable state.
pub trait OcrBackend: Send + Sync {
    /// Recognize the text in `image` under segmentation mode `mode`.
    ///
    /// Returns the raw recognized text, possibly empty.
    fn recognize(
        &self,
        image: &GrayImage,
        mode: PageSegMode,
        language: &str,
    ) -> Result<String, TablescanError>;
}

impl<B: OcrBackend + ?Sized> OcrBackend for &B {
    fn recognize(
        &self,
        image: &GrayImage,
        mode: PageSegMode,
        language: &str,
    ) -> Result<String, TablescanError> {
        (**self).recognize(image, mode, language)
    }
}

/// OCR backend that pipes PNG images through the `tesseract` CLI.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    binary: PathBuf,
}

impl TesseractBackend {
    /// Locate `tesseract` on `PATH`, then in the usual install directories.
    ///
    /// # Errors
    ///
    /// Returns [`TablescanError::BackendNotFound`] when no binary is found.
    pub fn discover() -> Result<Self, TablescanError> {
        let binary = tool::locate("tesseract").ok_or_else(|| {
            TablescanError::BackendNotFound(
                "tesseract (install it, e.g. `brew install tesseract`)".to_string(),
            )
        })?;
        info!(binary = %binary.display(), "Using tesseract");
        Ok(Self { binary })
    }

    /// Use an explicit `tesseract` binary.
    pub fn at(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl OcrBackend for TesseractBackend {
    fn recognize(
        &self,
        image: &GrayImage,
        mode: PageSegMode,
        language: &str,
    ) -> Result<String, TablescanError> {
        let png = encode_gray_png(image)?;

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout"])
            .arg("--psm")
            .arg(mode.0.to_string())
            .args(["-l", language])
            .args(["-c", "preserve_interword_spaces=1"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => {
                    TablescanError::BackendNotFound(self.binary.display().to_string())
                }
                _ => TablescanError::Ocr(format!(
                    "failed to start {}: {}",
                    self.binary.display(),
                    err
                )),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(&png) {
                drop(stdin);
                let _ = child.kill();
                let _ = child.wait();
                return Err(TablescanError::Ocr(format!(
                    "failed to send image to tesseract: {}",
                    err
                )));
            }
        }

        let output = child.wait_with_output().map_err(|err| {
            TablescanError::Ocr(format!("tesseract did not finish: {}", err))
        })?;

        if !output.status.success() {
            return Err(TablescanError::Ocr(format!(
                "tesseract exited with {} ({}): {}",
                output.status,
                mode,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// -- Scoring ------------------------------------------------------------------

/// Ranks competing OCR attempts; the highest score wins.
pub trait ConsensusScorer: Send + Sync {
    type Score: Ord;

    fn score(&self, text: &str) -> Self::Score;
}

/// Prefers the most information-dense reading: the count of non-whitespace
/// characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DensityScorer;

impl ConsensusScorer for DensityScorer {
    type Score = usize;

    fn score(&self, text: &str) -> usize {
        text.chars().filter(|c| !c.is_whitespace()).count()
    }
}

// -- Engine -------------------------------------------------------------------

/// Tunables for [`CellOcr`], normally taken from a [`ScanConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct OcrSettings {
    /// First mode of every consensus round.
    pub default_mode: PageSegMode,
    pub language: String,
    /// Non-local-means strength applied before Otsu binarization.
    pub denoise_strength: f32,
    /// Padding always added around a cell.
    pub base_padding: u32,
    /// Extra padding per retry level, tried in order.
    pub padding_steps: Vec<u32>,
}

impl From<&ScanConfig> for OcrSettings {
    fn from(config: &ScanConfig) -> Self {
        Self {
            default_mode: config.default_mode(),
            language: config.language.clone(),
            denoise_strength: config.denoise_strength,
            base_padding: config.cell_padding_px,
            padding_steps: config.padding_steps.clone(),
        }
    }
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

/// Outcome of one consensus round.
#[derive(Debug)]
enum RoundOutcome {
    /// Winning text (already post-processed, may be empty) and its mode.
    Text(String, Option<PageSegMode>),
    /// Every attempt failed in the backend.
    Failed,
}

/// Consensus OCR engine for table cells and whole pages.
pub struct CellOcr<B, S = DensityScorer> {
    backend: B,
    scorer: S,
    settings: OcrSettings,
}

impl<B: OcrBackend> CellOcr<B> {
    /// Create an engine using the default [`DensityScorer`].
    pub fn new(backend: B, settings: OcrSettings) -> Self {
        Self {
            backend,
            scorer: DensityScorer,
            settings,
        }
    }
}

impl<B: OcrBackend, S: ConsensusScorer> CellOcr<B, S> {
    /// Swap the scoring function, keeping backend and settings.
    pub fn with_scorer<T: ConsensusScorer>(self, scorer: T) -> CellOcr<B, T> {
        CellOcr {
            backend: self.backend,
            scorer,
            settings: self.settings,
        }
    }

    pub fn settings(&self) -> &OcrSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Segmentation modes tried in one consensus round, in order.
    pub fn consensus_modes(&self) -> [PageSegMode; 3] {
        [
            self.settings.default_mode,
            PageSegMode::SINGLE_COLUMN,
            PageSegMode::SINGLE_LINE,
        ]
    }

    /// Grayscale, denoise, then Otsu-binarize an image for the backend.
    pub fn preprocess(&self, image: DynamicImage) -> GrayImage {
        let gray = ImageProcessor::from_dynamic(image)
            .grayscale()
            .into_luma();
        let denoised = denoise_non_local_means(&gray, self.settings.denoise_strength);
        otsu_binarize(&denoised)
    }

    /// Read a whole image with one consensus round and no padding retries.
    ///
    /// Used for pages without a detectable grid.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn read_image(&self, image: &DynamicImage) -> Result<CellText, TablescanError> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(CellText::blank(0));
        }
        let binary = self.preprocess(image.clone());
        Ok(match self.consensus(&binary)? {
            RoundOutcome::Text(text, mode) => finish(text, mode, 0),
            RoundOutcome::Failed => CellText::unreadable(0),
        })
    }

    /// Read one grid cell of `page`, retrying with more padding while the
    /// result is empty.
    ///
    /// # Errors
    ///
    /// Only [`TablescanError::BackendNotFound`] escapes; every other backend
    /// failure is logged and scored as an empty attempt.
    #[instrument(skip(self, page), fields(row = cell.row, col = cell.col))]
    pub fn read_cell(&self, page: &DynamicImage, cell: &Cell) -> Result<CellText, TablescanError> {
        let mut any_round_ran = false;
        let mut last_extra = 0;

        for &extra in &self.settings.padding_steps {
            last_extra = extra;
            let padding = self.settings.base_padding + extra;
            let crop = crop_cell(page, cell, padding);
            if crop.width() == 0 || crop.height() == 0 {
                any_round_ran = true;
                continue;
            }

            let binary = self.preprocess(crop);
            match self.consensus(&binary)? {
                RoundOutcome::Text(text, mode) => {
                    any_round_ran = true;
                    if !text.is_empty() {
                        debug!(extra, chars = text.len(), "Cell read");
                        return Ok(finish(text, mode, extra));
                    }
                }
                RoundOutcome::Failed => {}
            }
            debug!(extra, "Cell empty at this padding level");
        }

        Ok(if any_round_ran {
            CellText::blank(last_extra)
        } else {
            warn!(row = cell.row, col = cell.col, "Cell unreadable: every OCR attempt failed");
            CellText::unreadable(last_extra)
        })
    }

    /// Run every consensus mode on `binary` and keep the best-scoring text.
    fn consensus(&self, binary: &GrayImage) -> Result<RoundOutcome, TablescanError> {
        let mut best: Option<(S::Score, String, PageSegMode)> = None;
        let mut succeeded = false;

        for mode in self.consensus_modes() {
            let text = match self
                .backend
                .recognize(binary, mode, &self.settings.language)
            {
                Ok(text) => text.trim().to_string(),
                Err(err @ TablescanError::BackendNotFound(_)) => return Err(err),
                Err(err) => {
                    warn!(%mode, %err, "OCR attempt failed");
                    continue;
                }
            };
            succeeded = true;

            let score = self.scorer.score(&text);
            debug!(%mode, chars = text.len(), "OCR attempt");
            let better = best
                .as_ref()
                .is_none_or(|(best_score, _, _)| score > *best_score);
            if better {
                best = Some((score, text, mode));
            }
        }

        if !succeeded {
            return Ok(RoundOutcome::Failed);
        }
        Ok(match best {
            Some((_, text, mode)) => {
                let repaired = repair_text(&text);
                let mode = (!repaired.is_empty()).then_some(mode);
                RoundOutcome::Text(repaired, mode)
            }
            None => RoundOutcome::Text(String::new(), None),
        })
    }
}

fn finish(text: String, mode: Option<PageSegMode>, padding: u32) -> CellText {
    if text.is_empty() {
        return CellText::blank(padding);
    }
    CellText {
        text,
        mode,
        padding,
        status: CellStatus::Read,
    }
}

/// Undo renderer line wrapping inside a cell: join `word-\nword` into
/// `wordword`, drop spaces before newlines, and trim the ends.
pub fn repair_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let joined = HYPHEN_BREAK.replace_all(text, "$1$2");
    let tidied = TRAILING_SPACE.replace_all(&joined, "\n");
    tidied.trim().to_string()
}

// -- Test support -------------------------------------------------------------


// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::testing::ScriptedBackend;
    use super::*;
    use image::Luma;

    fn page() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 120, Luma([255])))
    }

    fn cell() -> Cell {
        Cell {
            row: 0,
            col: 0,
            x1: 50,
            x2: 90,
            y1: 40,
            y2: 60,
        }
    }

    fn settings() -> OcrSettings {
        OcrSettings {
            denoise_strength: 0.0,
            ..OcrSettings::default()
        }
    }

    #[test]
    fn consensus_picks_densest_attempt() {
        let backend = ScriptedBackend::new(["L1", "L1 5", ""]);
        let engine = CellOcr::new(&backend, settings());

        let result = engine.read_cell(&page(), &cell()).unwrap();
        assert_eq!(result.text, "L1 5");
        assert_eq!(result.mode, Some(PageSegMode::SINGLE_COLUMN));
        assert_eq!(result.status, CellStatus::Read);
    }

    #[test]
    fn ties_favour_the_default_mode() {
        let backend = ScriptedBackend::new(["abc", "a b c", "cba"]);
        let engine = CellOcr::new(&backend, settings());

        let result = engine.read_cell(&page(), &cell()).unwrap();
        assert_eq!(result.text, "abc");
        assert_eq!(result.mode, Some(PageSegMode::UNIFORM_BLOCK));
    }

    #[test]
    fn modes_are_default_then_column_then_line() {
        let backend = ScriptedBackend::answering("x");
        let engine = CellOcr::new(
            &backend,
            OcrSettings {
                default_mode: PageSegMode(11),
                ..settings()
            },
        );
        engine.read_cell(&page(), &cell()).unwrap();

        let modes: Vec<u8> = backend.calls().iter().map(|(mode, _)| mode.0).collect();
        assert_eq!(modes, vec![11, 4, 7]);
    }

    #[test]
    fn first_non_empty_level_short_circuits() {
        let backend = ScriptedBackend::answering("L7");
        let engine = CellOcr::new(&backend, settings());

        let result = engine.read_cell(&page(), &cell()).unwrap();
        assert_eq!(result.padding, 0);
        assert_eq!(backend.calls().len(), 3, "only one consensus round expected");
    }

    #[test]
    fn empty_cell_retries_with_growing_padding() {
        // Two empty rounds, then text on the third padding level.
        let mut script = vec![""; 6];
        script.extend(["OR tissue", "", ""]);
        let backend = ScriptedBackend::new(script);
        let engine = CellOcr::new(&backend, settings());

        let result = engine.read_cell(&page(), &cell()).unwrap();
        assert_eq!(result.text, "OR tissue");
        assert_eq!(result.padding, 12);

        let sizes: Vec<(u32, u32)> = backend.calls().iter().map(|(_, size)| *size).collect();
        // Cell is 40x20; base padding 6, then +6, then +12 per edge.
        assert_eq!(sizes[0], (52, 32));
        assert_eq!(sizes[3], (64, 44));
        assert_eq!(sizes[6], (76, 56));
    }

    #[test]
    fn blank_cell_after_all_levels() {
        let backend = ScriptedBackend::answering("   ");
        let engine = CellOcr::new(&backend, settings());

        let result = engine.read_cell(&page(), &cell()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.status, CellStatus::Blank);
        assert_eq!(result.mode, None);
        assert_eq!(backend.calls().len(), 9);
    }

    #[test]
    fn failing_backend_marks_cell_unreadable() {
        let failures = (0..9).map(|_| Err(TablescanError::Ocr("crashed".into())));
        let backend = ScriptedBackend::with_results(failures);
        let engine = CellOcr::new(&backend, settings());

        let result = engine.read_cell(&page(), &cell()).unwrap();
        assert_eq!(result.status, CellStatus::Unreadable);
        assert!(result.text.is_empty());
    }

    #[test]
    fn missing_backend_is_fatal() {
        let backend = ScriptedBackend::with_results([Err(TablescanError::BackendNotFound(
            "tesseract".into(),
        ))]);
        let engine = CellOcr::new(&backend, settings());

        assert!(matches!(
            engine.read_cell(&page(), &cell()),
            Err(TablescanError::BackendNotFound(_))
        ));
    }

    #[test]
    fn read_image_does_not_retry() {
        let backend = ScriptedBackend::answering("");
        let engine = CellOcr::new(&backend, settings());

        let result = engine.read_image(&page()).unwrap();
        assert_eq!(result.status, CellStatus::Blank);
        assert_eq!(backend.calls().len(), 3);
        assert_eq!(backend.calls()[0].1, (200, 120));
    }

    #[test]
    fn winning_text_is_repaired() {
        let backend = ScriptedBackend::new(["infor-\nmation retrieval  \nnext", "", ""]);
        let engine = CellOcr::new(&backend, settings());

        let result = engine.read_cell(&page(), &cell()).unwrap();
        assert_eq!(result.text, "information retrieval\nnext");
    }

    #[test]
    fn custom_scorer_changes_the_winner() {
        struct Shortest;
        impl ConsensusScorer for Shortest {
            type Score = std::cmp::Reverse<usize>;
            fn score(&self, text: &str) -> Self::Score {
                std::cmp::Reverse(text.len())
            }
        }

        let backend = ScriptedBackend::new(["long reading", "short", "medium one"]);
        let engine = CellOcr::new(&backend, settings()).with_scorer(Shortest);

        let result = engine.read_cell(&page(), &cell()).unwrap();
        assert_eq!(result.text, "short");
    }

    #[test]
    fn repair_joins_hyphenated_breaks() {
        assert_eq!(repair_text("infor-\nmation retrieval"), "information retrieval");
        assert_eq!(repair_text("a \t\nb"), "a\nb");
        assert_eq!(repair_text("keep - \nspaced"), "keep -\nspaced");
        assert_eq!(repair_text(""), "");
    }

    #[test]
    fn density_ignores_whitespace() {
        assert_eq!(DensityScorer.score(" L1 \n 5 "), 3);
        assert_eq!(DensityScorer.score(""), 0);
    }

    #[test]
    fn missing_tesseract_binary_reports_not_found() {
        let backend = TesseractBackend::at("/nonexistent/tesseract");
        let image = GrayImage::from_pixel(4, 4, Luma([255]));
        assert!(matches!(
            backend.recognize(&image, PageSegMode::UNIFORM_BLOCK, "eng"),
            Err(TablescanError::BackendNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn backend_that_ignores_stdin_fails_without_hanging() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("tesseract");
        std::fs::write(&binary, b"#!/bin/sh\nexit 3\n").unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Noisy enough that the PNG overflows the pipe buffer.
        let mut seed = 0x2545_f491_u32;
        let image = GrayImage::from_fn(600, 600, |_, _| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            Luma([seed as u8])
        });

        let backend = TesseractBackend::at(binary.clone());
        let result = backend.recognize(&image, PageSegMode::UNIFORM_BLOCK, "eng");
        assert!(matches!(result, Err(TablescanError::Ocr(_))), "got {result:?}");
    }
}
