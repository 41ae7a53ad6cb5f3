//! Import decoders - Turning external documents into typed import batches.
//!
//! Decoders never touch the database. They validate raw text into the records
//! consumed by [`crate::core::import`], reporting problems as
//! [`crate::errors::Error::Parse`] or [`crate::errors::Error::Validation`].

use std::collections::HashMap;

/// Parsed invoice documents
pub mod invoice;
/// Spreadsheet rows and `.xlsx` decoding
pub mod sheet;

/// One spreadsheet row keyed by header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// Row number as shown by the spreadsheet program (header is row 1)
    pub row_number: usize,
    /// Cell text by header
    pub values: HashMap<String, String>,
}

/// Parses a whole number written either plainly or with an all-zero fraction
/// (`"5"`, `"5.0"`, `"2.000000"`).
#[must_use]
pub fn parse_whole_number(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if !fraction.chars().all(|c| c == '0') {
        return None;
    }
    whole.parse().ok()
}
