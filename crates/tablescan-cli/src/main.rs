// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tablescan — scanned search-log PDFs in, one Excel workbook out.
//
// Entry point. Initialises logging, locates the external tools, collects the
// input documents, and writes one sheet per document.

mod args;
mod inputs;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tablescan_core::error::TablescanError;
use tablescan_document::{PdftoppmRasterizer, TableExtractor, TesseractBackend};
use tablescan_workbook::WorkbookWriter;

use args::Cli;
use inputs::collect_inputs;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.scan_config().context("invalid scan settings")?;

    let backend = match &cli.tesseract {
        Some(path) if path.is_file() => TesseractBackend::at(path),
        Some(path) => {
            return Err(TablescanError::BackendNotFound(path.display().to_string()).into());
        }
        None => TesseractBackend::discover()?,
    };
    let rasterizer = match &cli.pdftoppm {
        Some(path) if path.is_file() => PdftoppmRasterizer::at(path),
        Some(path) => {
            return Err(TablescanError::BackendNotFound(path.display().to_string()).into());
        }
        None => PdftoppmRasterizer::discover()?,
    };

    let inputs = collect_inputs(cli.dir.as_deref(), &cli.glob, &cli.inputs)?;
    tracing::info!(documents = inputs.len(), "tablescan starting");

    let extractor = TableExtractor::new(config, backend, rasterizer);
    let mut writer = WorkbookWriter::new();

    for path in &inputs {
        let document = extractor
            .extract_document(path)
            .with_context(|| format!("failed to process {}", path.display()))?;
        let sheet = writer.add_table(&document)?;
        println!(
            " -> {} done ({} rows, sheet {:?})",
            path.file_name().unwrap_or_default().to_string_lossy(),
            document.table.len(),
            sheet
        );
    }

    writer
        .save(&cli.out)
        .with_context(|| format!("failed to save {}", cli.out.display()))?;
    println!("Saved workbook: {}", cli.out.display());
    Ok(())
}
