// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page and document extraction.
//
// A page goes through one of two paths:
//
// - Grid: line mask -> rule detection -> cell segmentation -> consensus OCR
//   per cell -> one raw row per grid row.
// - Fallback (fewer than two rules on an axis): consensus OCR of the whole
//   page -> line splitter.
//
// Documents are rasterized page by page and the page results are handed to
// the `TableAssembler` in page order.

use std::path::Path;

use image::DynamicImage;
use rayon::prelude::*;
use tablescan_core::error::TablescanError;
use tablescan_core::{
    Cell, CellStatus, CellText, DocumentTable, LogicalRow, PageLayout, PageRows, ScanConfig,
};
use tracing::{info, instrument, warn};

use crate::image::processor::ImageProcessor;
use crate::pdf::raster::Rasterizer;
use crate::pdf::reader::PdfReader;
use crate::scan::binarize::line_mask;
use crate::scan::grid::{GridDetection, GridLineDetector};
use crate::scan::ocr::{CellOcr, ConsensusScorer, DensityScorer, OcrBackend, OcrSettings};
use crate::scan::segment::segment_cells;
use crate::table::assemble::TableAssembler;
use crate::table::fallback::split_lines;

/// Extracts raw table rows from page images and whole documents.
pub struct TableExtractor<B, R, S = DensityScorer> {
    config: ScanConfig,
    detector: GridLineDetector,
    ocr: CellOcr<B, S>,
    rasterizer: R,
    assembler: TableAssembler,
}

impl<B: OcrBackend, R: Rasterizer> TableExtractor<B, R> {
    pub fn new(config: ScanConfig, backend: B, rasterizer: R) -> Self {
        let ocr = CellOcr::new(backend, OcrSettings::from(&config));
        Self {
            detector: GridLineDetector::new(config.min_line_fraction),
            config,
            ocr,
            rasterizer,
            assembler: TableAssembler::new(),
        }
    }
}

impl<B: OcrBackend, R: Rasterizer, S: ConsensusScorer> TableExtractor<B, R, S> {
    /// Swap the consensus scoring function.
    pub fn with_scorer<T: ConsensusScorer>(self, scorer: T) -> TableExtractor<B, R, T> {
        TableExtractor {
            config: self.config,
            detector: self.detector,
            ocr: self.ocr.with_scorer(scorer),
            rasterizer: self.rasterizer,
            assembler: self.assembler,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Binarize `page` and look for its table rules.
    pub fn detect_grid(&self, page: &DynamicImage) -> GridDetection {
        let gray = ImageProcessor::from_dynamic(page.clone())
            .grayscale()
            .into_luma();
        let mask = line_mask(
            &gray,
            self.config.adaptive_block_radius,
            self.config.adaptive_offset,
        );
        self.detector.detect(&mask)
    }

    /// Recover the raw (unfolded) rows of one page image.
    ///
    /// # Errors
    ///
    /// Fails only when the OCR backend is missing. A page without a grid is
    /// not an error; it takes the fallback path.
    #[instrument(skip(self, page), fields(width = page.width(), height = page.height()))]
    pub fn extract_page(
        &self,
        page_number: u32,
        page: &DynamicImage,
    ) -> Result<PageRows, TablescanError> {
        match self.detect_grid(page) {
            GridDetection::Grid(lines) => {
                let grid = segment_cells(&lines);
                let layout = PageLayout::Grid {
                    rows: lines.rows(),
                    columns: lines.columns(),
                };
                info!(
                    page = page_number,
                    rows = lines.rows(),
                    columns = lines.columns(),
                    "Grid page"
                );

                let rows = self.read_grid(page, &grid)?;
                Ok(PageRows {
                    page_number,
                    layout,
                    rows,
                })
            }
            GridDetection::NoGrid(lines) => {
                warn!(
                    page = page_number,
                    vertical_rules = lines.x_centers.len(),
                    horizontal_rules = lines.y_centers.len(),
                    "No grid found, reading page as free text"
                );
                let text = self.ocr.read_image(page)?;
                if text.status == CellStatus::Unreadable {
                    warn!(page = page_number, "Whole-page OCR failed");
                }
                Ok(PageRows {
                    page_number,
                    layout: PageLayout::Fallback,
                    rows: split_lines(&text.text),
                })
            }
        }
    }

    /// OCR every cell and rebuild the grid rows in row-major order.
    fn read_grid(
        &self,
        page: &DynamicImage,
        grid: &[Vec<Cell>],
    ) -> Result<Vec<LogicalRow>, TablescanError> {
        let cells: Vec<&Cell> = grid.iter().flatten().collect();

        let texts: Vec<CellText> = if self.config.parallel {
            cells
                .par_iter()
                .map(|cell| self.ocr.read_cell(page, cell))
                .collect::<Result<_, _>>()?
        } else {
            cells
                .iter()
                .map(|cell| self.ocr.read_cell(page, cell))
                .collect::<Result<_, _>>()?
        };

        let unreadable = texts
            .iter()
            .filter(|text| text.status == CellStatus::Unreadable)
            .count();
        if unreadable > 0 {
            warn!(unreadable, "Cells could not be read");
        }

        let mut texts = texts.into_iter();
        Ok(grid
            .iter()
            .map(|row| LogicalRow::from_fields(texts.by_ref().take(row.len()).map(|t| t.text)))
            .collect())
    }

    /// Rasterize and extract every page of the PDF at `path`, then fold the
    /// pages into the document's table.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn extract_document(&self, path: &Path) -> Result<DocumentTable, TablescanError> {
        let reader = PdfReader::open(path)?;
        let name = reader.document_name();
        let page_numbers = reader.page_numbers();
        info!(document = %name, pages = page_numbers.len(), "Extracting document");

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page_number in page_numbers {
            let image = self
                .rasterizer
                .render_page(path, page_number, self.config.render_dpi)?;
            pages.push(self.extract_page(page_number, &image)?);
        }

        Ok(self.assembler.assemble(name, pages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::tests::blank_pdf;
    use crate::scan::ocr::testing::ScriptedBackend;
    use image::{GrayImage, Luma};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;
    use tablescan_core::Column;

    /// Rasterizer that renders every page as the same canned image.
    struct CannedRasterizer(DynamicImage);

    impl Rasterizer for CannedRasterizer {
        fn render_page(
            &self,
            _path: &Path,
            _page_number: u32,
            _dpi: u32,
        ) -> Result<DynamicImage, TablescanError> {
            Ok(self.0.clone())
        }
    }

    /// White 400x300 page with 3px black rules at the given centres.
    fn ruled_page(xs: &[i32], ys: &[i32]) -> DynamicImage {
        let mut page = GrayImage::from_pixel(400, 300, Luma([255]));
        for &x in xs {
            draw_filled_rect_mut(&mut page, Rect::at(x - 1, 0).of_size(3, 300), Luma([0]));
        }
        for &y in ys {
            draw_filled_rect_mut(&mut page, Rect::at(0, y - 1).of_size(400, 3), Luma([0]));
        }
        DynamicImage::ImageLuma8(page)
    }

    fn blank_page() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 300, Luma([255])))
    }

    fn config() -> ScanConfig {
        ScanConfig {
            denoise_strength: 0.0,
            ..ScanConfig::default()
        }
    }

    /// One consensus round where only the default mode reads `text`.
    fn round(text: &str) -> [&str; 3] {
        [text, "", ""]
    }

    fn grid_script() -> Vec<&'static str> {
        let mut script = Vec::new();
        script.extend(round("L1"));
        script.extend(round("5"));
        // Row 2, column 1 is blank on every padding level.
        script.extend([""; 9]);
        script.extend(round("OR tissue"));
        script
    }

    #[test]
    fn grid_page_reads_cells_row_major() {
        let backend = ScriptedBackend::new(grid_script());
        let extractor = TableExtractor::new(config(), &backend, CannedRasterizer(blank_page()));

        let page = ruled_page(&[20, 150, 380], &[15, 120, 280]);
        let rows = extractor.extract_page(1, &page).unwrap();

        assert_eq!(rows.layout, PageLayout::Grid { rows: 2, columns: 2 });
        assert_eq!(rows.rows.len(), 2);
        assert_eq!(rows.rows[0].reference(), "L1");
        assert_eq!(rows.rows[0].get(Column::HitCount), "5");
        assert_eq!(rows.rows[1].reference(), "");
        assert_eq!(rows.rows[1].get(Column::HitCount), "OR tissue");
        assert!(rows.rows.iter().all(|row| row.fields().len() == 8));
    }

    #[test]
    fn parallel_cells_keep_row_major_order() {
        // Every attempt answers the same text, so order must come from the
        // re-join, not from call order.
        let backend = ScriptedBackend::answering("x");
        let extractor = TableExtractor::new(
            ScanConfig {
                parallel: true,
                ..config()
            },
            &backend,
            CannedRasterizer(blank_page()),
        );

        let page = ruled_page(&[20, 150, 260, 380], &[15, 120, 280]);
        let rows = extractor.extract_page(1, &page).unwrap();

        assert_eq!(rows.layout, PageLayout::Grid { rows: 2, columns: 3 });
        assert_eq!(rows.rows.len(), 2);
        for row in &rows.rows {
            assert_eq!(&row.fields()[..3], ["x", "x", "x"]);
        }
        assert_eq!(backend.calls().len(), 6 * 3);
    }

    #[test]
    fn single_vertical_rule_routes_to_fallback() {
        let backend = ScriptedBackend::new(round("L1 emf AND skin\nOR tissue\nL2 radar"));
        let extractor = TableExtractor::new(config(), &backend, CannedRasterizer(blank_page()));

        let page = ruled_page(&[200], &[15, 120, 280]);
        assert_eq!(extractor.detect_grid(&page).lines().x_centers.len(), 1);

        let rows = extractor.extract_page(3, &page).unwrap();
        assert_eq!(rows.layout, PageLayout::Fallback);
        assert_eq!(rows.page_number, 3);
        assert_eq!(rows.rows.len(), 2);
        assert_eq!(rows.rows[0].get(Column::Query), "emf AND skin\nOR tissue");

        // Only whole-page reads, never a cell crop.
        assert!(backend.calls().iter().all(|(_, size)| *size == (400, 300)));
        assert_eq!(backend.calls().len(), 3);
    }

    #[test]
    fn document_pages_are_assembled_under_the_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Search Log.pdf");
        std::fs::write(&path, blank_pdf(2)).unwrap();

        let backend = ScriptedBackend::answering("L5 emf\nOR skin");
        let extractor = TableExtractor::new(config(), &backend, CannedRasterizer(blank_page()));

        let doc = extractor.extract_document(&path).unwrap();
        assert_eq!(doc.name, "Search Log");
        assert_eq!(doc.table.len(), 2);
        assert!(doc.table.rows.iter().all(|row| row.reference() == "L5"));
        assert_eq!(doc.table.rows[0].get(Column::Query), "emf\nOR skin");
    }

    #[test]
    fn unreadable_free_text_page_still_yields_a_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faded.pdf");
        std::fs::write(&path, blank_pdf(1)).unwrap();

        let backend = ScriptedBackend::answering("");
        let extractor = TableExtractor::new(config(), &backend, CannedRasterizer(blank_page()));

        let doc = extractor.extract_document(&path).unwrap();
        assert_eq!(doc.table.len(), 1);
        assert!(doc.table.rows[0].is_empty());
    }

    #[test]
    fn missing_backend_aborts_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.pdf");
        std::fs::write(&path, blank_pdf(1)).unwrap();

        let backend = ScriptedBackend::with_results([Err(TablescanError::BackendNotFound(
            "tesseract".into(),
        ))]);
        let extractor = TableExtractor::new(config(), &backend, CannedRasterizer(blank_page()));

        assert!(matches!(
            extractor.extract_document(&path),
            Err(TablescanError::BackendNotFound(_))
        ));
    }
}
