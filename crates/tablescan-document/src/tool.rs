// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Discovery of external command-line tools (OCR engine, rasterizer).

use std::path::{Path, PathBuf};

use tracing::debug;

/// Install locations checked after `PATH` when it has no match.
pub const WELL_KNOWN_BIN_DIRS: [&str; 3] = ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

/// Find an executable named `name`, first on `PATH`, then in
/// [`WELL_KNOWN_BIN_DIRS`].
pub fn locate(name: &str) -> Option<PathBuf> {
    match which::which(name) {
        Ok(found) => {
            debug!(tool = name, found = %found.display(), "Tool found on PATH");
            Some(found)
        }
        Err(err) => {
            debug!(tool = name, error = %err, "Tool not on PATH");
            locate_in(name, WELL_KNOWN_BIN_DIRS.iter().map(PathBuf::from))
        }
    }
}

/// Find an executable named `name` in the given directories, in order.
pub fn locate_in<I>(name: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let search_path = std::env::join_paths(dirs).ok()?;
    let found = which::which_in(name, Some(search_path), Path::new(".")).ok();
    debug!(tool = name, found = ?found, "Tool lookup");
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn finds_first_executable_in_order() {
        use std::os::unix::fs::PermissionsExt;

        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();

        // Non-executable file in the first dir must be skipped.
        std::fs::write(first.path().join("fake-ocr"), b"").unwrap();
        let tool = second.path().join("fake-ocr");
        std::fs::write(&tool, b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let found = locate_in(
            "fake-ocr",
            [first.path().to_path_buf(), second.path().to_path_buf()],
        );
        assert_eq!(found, Some(tool));
    }

    #[test]
    fn locate_falls_back_to_none_for_unknown_tools() {
        assert!(locate("tablescan-no-such-tool-anywhere").is_none());
    }

    #[test]
    fn missing_tool_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(locate_in("definitely-not-installed", [dir.path().to_path_buf()]).is_none());
    }
}
