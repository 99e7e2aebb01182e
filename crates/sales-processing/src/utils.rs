//! Shared utilities for the cleaning pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use crate::types::Cell;
use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Sentinel Markers
// =============================================================================

/// Markers that turn a categorical field (or a date) missing.
pub const CATEGORY_SENTINELS: [&str; 3] = ["UNKNOWN", "ERROR", "NAN"];

/// Markers that turn a numeric field missing.
///
/// `NAN` is not listed: such text falls through to strip-and-parse and ends
/// up missing when no digits remain.
pub const NUMERIC_SENTINELS: [&str; 2] = ["UNKNOWN", "ERROR"];

/// Check whether `text` contains any of the given markers.
///
/// Matching is a case-sensitive substring test, so `"UNKNOWNABC"` matches
/// `UNKNOWN` while `"unknown"` does not.
///
/// # Example
///
/// ```rust,ignore
/// use sales_processing::utils::{contains_sentinel, CATEGORY_SENTINELS};
///
/// assert!(contains_sentinel("xERRORx", &CATEGORY_SENTINELS));
/// assert!(!contains_sentinel("error", &CATEGORY_SENTINELS));
/// ```
pub fn contains_sentinel(text: &str, sentinels: &[&str]) -> bool {
    sentinels.iter().any(|marker| text.contains(marker))
}

// =============================================================================
// Mode Utilities
// =============================================================================

/// Pick the most frequent value from a frequency table.
///
/// Ties resolve to the smallest value under [`Cell`] ordering, which keeps
/// the result independent of hash-map iteration order.
pub fn mode_from_counts(counts: &HashMap<Cell, usize>) -> Option<Cell> {
    counts
        .iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count.cmp(b_count).then_with(|| b_val.cmp(a_val))
        })
        .map(|(value, _)| value.clone())
}

// =============================================================================
// DataFrame Utilities
// =============================================================================

/// Total number of null cells across every column of a DataFrame.
pub fn count_frame_nulls(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|col| col.null_count()).sum()
}

/// Null count per column, in column order.
pub fn frame_null_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count()))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
