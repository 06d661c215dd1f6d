// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reference-token grammar.
//
// A search-log reference id is the letter `L` followed by digits. OCR adds
// noise around it, so the grammar tolerates whitespace between `L` and the
// digits, surrounding whitespace, and one trailing `/` or `-`:
//
//   L1   " L 12 "   L3/   L4-
//
// Anything else (`L`, `Lx1`, `L1a`, `1`) is not a reference token.

use std::sync::LazyLock;

use regex::Regex;

/// Whole-field grammar, used when deciding whether a row starts a record.
static REFERENCE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*L\s*\d+\s*[/\-]?\s*$").expect("reference token regex is valid")
});

/// Same grammar anchored at the start of a line of free text.
static REFERENCE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*L\s*(\d+)\b\s*[/\-]?").expect("reference prefix regex is valid")
});

/// Whether `field` is exactly one reference token.
pub fn is_reference_token(field: &str) -> bool {
    REFERENCE_TOKEN.is_match(field)
}

/// Split a line that begins with a reference token into the normalized token
/// (`L<digits>`) and the trimmed remainder.
pub fn split_reference_prefix(line: &str) -> Option<(String, &str)> {
    let captures = REFERENCE_PREFIX.captures(line)?;
    let whole = captures.get(0)?;
    let digits = captures.get(1)?.as_str();
    Some((format!("L{digits}"), line[whole.end()..].trim()))
}
