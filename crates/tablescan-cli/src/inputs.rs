// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input collection — directory matches (sorted) followed by explicit paths,
// resolved and de-duplicated in first-seen order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tablescan_core::error::TablescanError;
use tracing::{debug, warn};

/// Collect the documents to process.
///
/// # Errors
///
/// [`TablescanError::NoDocuments`] when nothing was found,
/// [`TablescanError::MissingInput`] for the first path that does not exist,
/// [`TablescanError::Config`] for a malformed pattern.
pub fn collect_inputs(
    dir: Option<&Path>,
    pattern: &str,
    explicit: &[PathBuf],
) -> Result<Vec<PathBuf>, TablescanError> {
    let mut candidates = Vec::new();
    if let Some(dir) = dir {
        candidates.extend(matches_in(dir, pattern)?);
    }
    candidates.extend(explicit.iter().cloned());

    let mut seen = HashSet::new();
    let ordered: Vec<PathBuf> = candidates
        .into_iter()
        .map(|path| resolve(&path))
        .filter(|path| seen.insert(path.clone()))
        .collect();

    if ordered.is_empty() {
        return Err(TablescanError::NoDocuments);
    }
    if let Some(missing) = ordered.iter().find(|path| !path.exists()) {
        return Err(TablescanError::MissingInput(missing.clone()));
    }

    debug!(count = ordered.len(), "Inputs collected");
    Ok(ordered)
}

/// Sorted paths in `dir` matching `pattern`.
fn matches_in(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, TablescanError> {
    let escaped = Pattern::escape(&dir.to_string_lossy());
    let full = format!("{}/{}", escaped.trim_end_matches('/'), pattern);

    let entries = glob::glob(&full)
        .map_err(|err| TablescanError::Config(format!("invalid glob {pattern:?}: {err}")))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(%err, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Absolute, symlink-free form of `path` when it exists; otherwise the
/// absolute form as given.
fn resolve(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
