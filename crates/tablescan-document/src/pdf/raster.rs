// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization — turn one PDF page into a full-colour bitmap at a fixed
// DPI. The default implementation drives poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use tablescan_core::error::TablescanError;
use tracing::{debug, instrument};

use crate::tool;

/// Renders PDF pages to images.
///
/// Implementations must be deterministic: the same page at the same DPI
/// always yields the same pixel dimensions.
pub trait Rasterizer: Send + Sync {
    /// Render 1-based page `page_number` of the PDF at `path`.
    fn render_page(
        &self,
        path: &Path,
        page_number: u32,
        dpi: u32,
    ) -> Result<DynamicImage, TablescanError>;
}

/// Rasterizer backed by the `pdftoppm` command-line tool.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: PathBuf,
}

impl PdftoppmRasterizer {
    /// Locate `pdftoppm` on `PATH` or in the usual install directories.
    pub fn discover() -> Result<Self, TablescanError> {
        let binary = tool::locate("pdftoppm").ok_or_else(|| {
            TablescanError::BackendNotFound(
                "pdftoppm (install poppler, e.g. `brew install poppler`)".to_string(),
            )
        })?;
        Ok(Self { binary })
    }

    /// Use an explicit `pdftoppm` binary.
    pub fn at(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Rasterizer for PdftoppmRasterizer {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn render_page(
        &self,
        path: &Path,
        page_number: u32,
        dpi: u32,
    ) -> Result<DynamicImage, TablescanError> {
        let temp_dir = tempfile::tempdir()?;
        let prefix = temp_dir.path().join("page");
        let page = page_number.to_string();

        let output = Command::new(&self.binary)
            .arg("-r")
            .arg(dpi.to_string())
            .args(["-f", page.as_str(), "-l", page.as_str()])
            .args(["-png", "-singlefile"])
            .arg(path)
            .arg(&prefix)
            .output()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => {
                    TablescanError::BackendNotFound(self.binary.display().to_string())
                }
                _ => TablescanError::Rasterize(format!(
                    "failed to run {}: {}",
                    self.binary.display(),
                    err
                )),
            })?;

        if !output.status.success() {
            return Err(TablescanError::Rasterize(format!(
                "pdftoppm failed on page {} of {}: {}",
                page_number,
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let png_path = prefix.with_extension("png");
        let image = image::open(&png_path).map_err(|err| {
            TablescanError::Image(format!(
                "failed to decode rendered page {}: {}",
                png_path.display(),
                err
            ))
        })?;

        debug!(
            page_number,
            width = image.width(),
            height = image.height(),
            "Page rasterized"
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_backend_not_found() {
        let rasterizer = PdftoppmRasterizer::at("/nonexistent/bin/pdftoppm");
        let result = rasterizer.render_page(Path::new("/tmp/none.pdf"), 1, 72);
        match result {
            Err(TablescanError::BackendNotFound(name)) => {
                assert_eq!(name, "/nonexistent/bin/pdftoppm")
            }
            other => panic!("expected BackendNotFound, got {other:?}"),
        }
    }

    #[test]
    fn explicit_binary_is_kept() {
        let rasterizer = PdftoppmRasterizer::at("/opt/poppler/bin/pdftoppm");
        assert_eq!(rasterizer.binary(), Path::new("/opt/poppler/bin/pdftoppm"));
    }
}
