// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet naming — Excel-safe, unique worksheet names derived from document
// names.

use std::collections::HashSet;

use tablescan_core::error::TablescanError;
use tracing::debug;

/// Longest worksheet name Excel accepts, in characters.
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// Collision suffixes `_1` ..= `_999` are tried before giving up.
const MAX_SUFFIX: u32 = 999;

/// Characters Excel forbids in worksheet names.
const FORBIDDEN: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

/// Hands out unique sheet names for one workbook.
///
/// Uniqueness is case-insensitive, matching Excel.
#[derive(Debug, Default)]
pub struct SheetNamer {
    used: HashSet<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve and return the sheet name for a document called `base`.
    ///
    /// # Errors
    ///
    /// [`TablescanError::SheetNamesExhausted`] when the name and every
    /// numbered variant are already taken.
    pub fn next_name(&mut self, base: &str) -> Result<String, TablescanError> {
        let name = sanitize(base);
        if self.reserve(&name) {
            return Ok(name);
        }

        for i in 1..=MAX_SUFFIX {
            let suffix = format!("_{i}");
            let keep = MAX_SHEET_NAME_CHARS - suffix.len();
            let candidate: String = name.chars().take(keep).chain(suffix.chars()).collect();
            if self.reserve(&candidate) {
                debug!(base, name = %candidate, "Sheet name de-duplicated");
                return Ok(candidate);
            }
        }

        Err(TablescanError::SheetNamesExhausted(base.to_string()))
    }

    fn reserve(&mut self, name: &str) -> bool {
        self.used.insert(name.to_lowercase())
    }
}

/// Replace forbidden characters with `_` and truncate to 31 characters. An
/// empty result becomes `Sheet`.
///
/// Excel also rejects a leading or trailing apostrophe, so those are replaced
/// as well.
pub fn sanitize(base: &str) -> String {
    let mut name: String = base
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_CHARS)
        .collect();

    if name.starts_with('\'') {
        name.replace_range(..1, "_");
    }
    if name.ends_with('\'') {
        let last = name.len() - 1;
        name.replace_range(last.., "_");
    }

    if name.is_empty() {
        "Sheet".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_characters_become_underscores() {
        assert_eq!(sanitize("a:b\\c/d?e*f[g]h"), "a_b_c_d_e_f_g_h");
    }

    #[test]
    fn long_names_are_truncated_by_characters() {
        let long = "é".repeat(40);
        let name = sanitize(&long);
        assert_eq!(name.chars().count(), 31);
    }

    #[test]
    fn empty_name_becomes_sheet() {
        assert_eq!(sanitize(""), "Sheet");
        let mut namer = SheetNamer::new();
        assert_eq!(namer.next_name("").unwrap(), "Sheet");
        assert_eq!(namer.next_name("").unwrap(), "Sheet_1");
    }

    #[test]
    fn apostrophes_at_the_ends_are_replaced() {
        assert_eq!(sanitize("'quoted'"), "_quoted_");
        assert_eq!(sanitize("it's"), "it's");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let mut namer = SheetNamer::new();
        assert_eq!(namer.next_name("Report:2024").unwrap(), "Report_2024");
        assert_eq!(namer.next_name("Report:2024").unwrap(), "Report_2024_1");
        assert_eq!(namer.next_name("Report/2024").unwrap(), "Report_2024_2");
    }

    #[test]
    fn collisions_are_case_insensitive() {
        let mut namer = SheetNamer::new();
        assert_eq!(namer.next_name("log").unwrap(), "log");
        assert_eq!(namer.next_name("LOG").unwrap(), "LOG_1");
    }

    #[test]
    fn suffixed_long_names_stay_within_limit() {
        let mut namer = SheetNamer::new();
        let base = "x".repeat(40);
        namer.next_name(&base).unwrap();
        let second = namer.next_name(&base).unwrap();
        assert_eq!(second.chars().count(), 31);
        assert!(second.ends_with("_1"));
    }

    #[test]
    fn naming_space_can_be_exhausted() {
        let mut namer = SheetNamer::new();
        for _ in 0..=MAX_SUFFIX {
            namer.next_name("dup").unwrap();
        }
        assert!(matches!(
            namer.next_name("dup"),
            Err(TablescanError::SheetNamesExhausted(_))
        ));
    }
}
