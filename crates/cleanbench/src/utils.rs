//! Shared utilities for the cleaning pipeline.
//!
//! This module contains the string-level helpers the normalizer and the
//! coercer agree on (label keys, missing markers, numeric and boolean
//! parsing) plus a small table profiler.

use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

// =============================================================================
// Label Utilities
// =============================================================================

static LABEL_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_\-]+").expect("Invalid regex: label separators"));

/// Reduce a column label to its comparison key.
///
/// Trims, lowercases, and removes whitespace, underscores, and hyphens, so
/// `" Price "`, `"TotalCharges"` and `"total_charges"` compare by content only.
///
/// ```rust,ignore
/// assert_eq!(label_key(" Total Charges "), "totalcharges");
/// assert_eq!(label_key("is_Returned"), "isreturned");
/// ```
pub fn label_key(label: &str) -> String {
    LABEL_SEPARATORS
        .replace_all(label.trim(), "")
        .to_lowercase()
}

/// Reduce a cell value to its comparison key: trimmed, lowercase, inner
/// whitespace collapsed to single spaces.
pub fn value_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Cell values that mean "no value" rather than "bad value".
pub const MISSING_MARKERS: [&str; 9] = [
    "n/a", "na", "null", "none", "nan", "missing", "unknown", "error", "#n/a",
];

/// Clean a string for numeric parsing by removing formatting characters.
///
/// ```rust,ignore
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// assert_eq!(clean_numeric_string("  42%  "), "42");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !NUMERIC_FORMAT_CHARS.contains(c))
        .collect()
}

/// Check if a cell holds no value: blank, whitespace, or a missing marker.
pub fn is_missing_marker(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty()
        || MISSING_MARKERS
            .iter()
            .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Try to parse a string as a finite numeric value (f64).
///
/// Handles currency symbols, percentages, and thousands separators.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Boolean Encodings
// =============================================================================

/// Encodings read as 1 by binary columns.
pub const BINARY_TRUE_VALUES: [&str; 5] = ["yes", "true", "1", "y", "t"];

/// Encodings read as 0 by binary columns.
pub const BINARY_FALSE_VALUES: [&str; 5] = ["no", "false", "0", "n", "f"];

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Table Profiling
// =============================================================================

/// Shape and missing-value counts of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub missing: usize,
}

/// Shape and missing-value counts of a whole table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableProfile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
}

impl TableProfile {
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing).sum()
    }
}

/// Profile a table: row count, and per column its dtype and how many cells
/// are null or hold a missing marker.
pub fn profile_table(df: &DataFrame) -> PolarsResult<TableProfile> {
    let mut columns = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let mut missing = series.null_count();
        if series.dtype() == &DataType::String {
            missing += series
                .str()?
                .into_iter()
                .flatten()
                .filter(|v| is_missing_marker(v))
                .count();
        }
        columns.push(ColumnProfile {
            name: series.name().to_string(),
            dtype: series.dtype().to_string(),
            missing,
        });
    }

    Ok(TableProfile {
        rows: df.height(),
        columns,
    })
}

// =============================================================================
// Tests
// =============================================================================
