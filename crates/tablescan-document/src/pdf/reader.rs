// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open a source document and enumerate its pages using the
// `lopdf` crate. Rendering is left to a `Rasterizer`.

use std::path::{Path, PathBuf};

use lopdf::Document;
use tablescan_core::error::TablescanError;
use tracing::{debug, info, instrument};

/// Reads the page structure of a PDF file.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file.
    source_path: Option<PathBuf>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TablescanError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            TablescanError::Pdf(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.to_path_buf()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, TablescanError> {
        let document = Document::load_mem(data).map_err(|err| {
            TablescanError::Pdf(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// 1-based page numbers in document order.
    pub fn page_numbers(&self) -> Vec<u32> {
        // get_pages() is a BTreeMap keyed by page number, so keys are ordered.
        self.document.get_pages().keys().copied().collect()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Document name used for its output sheet: the file stem, or `document`
    /// for in-memory sources.
    pub fn document_name(&self) -> String {
        self.source_path
            .as_deref()
            .and_then(Path::file_stem)
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{Object, dictionary};

    /// Build an in-memory PDF with `pages` blank letter-size pages.
    pub(crate) fn blank_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                let page_id = doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                });
                page_id.into()
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn counts_pages_in_order() {
        let reader = PdfReader::from_bytes(&blank_pdf(3)).unwrap();
        assert_eq!(reader.page_count(), 3);
        assert_eq!(reader.page_numbers(), vec![1, 2, 3]);
        assert!(reader.source_path().is_none());
        assert_eq!(reader.document_name(), "document");
    }

    #[test]
    fn open_uses_file_stem_as_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Report:2024.pdf");
        std::fs::write(&path, blank_pdf(1)).unwrap();

        let reader = PdfReader::open(&path).unwrap();
        assert_eq!(reader.document_name(), "Report:2024");
        assert_eq!(reader.page_count(), 1);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            PdfReader::from_bytes(b"not a pdf"),
            Err(TablescanError::Pdf(_))
        ));
    }
}
