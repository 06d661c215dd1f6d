// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table assembler — folds each page's raw rows and concatenates the pages of
// one document into its table.

use tablescan_core::{DocumentTable, LogicalRow, PageLayout, PageRows, Table};
use tracing::{debug, info, instrument, warn};

use crate::table::fold::fold_rows;

/// Builds the per-document [`DocumentTable`] from page results.
///
/// Pages are folded independently, so a continuation row at the top of a
/// page never merges into the previous page's last record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableAssembler;

impl TableAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Fold one page.
    ///
    /// On grid pages, logical rows with every field empty (blank filler rows)
    /// are dropped. Fallback rows are always kept, so a free-text page that
    /// read as nothing still shows up as one empty row.
    pub fn fold_page(&self, page: PageRows) -> Table {
        let folded = fold_rows(page.rows);
        let rows: Vec<LogicalRow> = match page.layout {
            PageLayout::Grid { .. } => {
                folded.into_iter().filter(|row| !row.is_empty()).collect()
            }
            PageLayout::Fallback => folded,
        };
        debug!(page = page.page_number, rows = rows.len(), "Page folded");
        Table { rows }
    }

    /// Fold every page and concatenate them in page-number order.
    ///
    /// Pages that fold to nothing are skipped. A document with no rows at
    /// all still yields a (header-only) table.
    #[instrument(
        skip(self, name, pages),
        fields(document = tracing::field::Empty, pages = pages.len())
    )]
    pub fn assemble(&self, name: impl Into<String>, mut pages: Vec<PageRows>) -> DocumentTable {
        let name = name.into();
        tracing::Span::current().record("document", name.as_str());
        pages.sort_by_key(|page| page.page_number);

        let mut table = Table::new();
        for page in pages {
            let page_number = page.page_number;
            let folded = self.fold_page(page);
            if folded.is_empty() {
                warn!(page = page_number, "Skipping page without rows");
                continue;
            }
            table.extend(folded);
        }

        info!(document = %name, rows = table.len(), "Document table assembled");
        DocumentTable { name, table }
    }
}
