//! String sanitization for identifiers and categorical columns.

use crate::utils::{CATEGORY_SENTINELS, contains_sentinel};
use once_cell::sync::Lazy;
use regex::Regex;

/// Everything that may not appear in a transaction identifier.
static IDENTIFIER_JUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("Invalid regex: identifier junk"));

/// Sanitize a transaction identifier.
///
/// Removes every character outside `[A-Za-z0-9_]` and upper-cases the rest.
/// No length or uniqueness check is made. A missing identifier becomes the
/// empty string.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(sanitize_identifier(Some(" txn-1234 ")), "TXN1234");
/// ```
pub fn sanitize_identifier(text: Option<&str>) -> String {
    match text {
        Some(value) => IDENTIFIER_JUNK.replace_all(value, "").to_uppercase(),
        None => String::new(),
    }
}

/// Canonicalize a categorical value (`Item`, `Payment Method`, `Location`).
///
/// Any value containing `UNKNOWN`, `ERROR` or `NAN` (case-sensitive) becomes
/// missing as a whole. Everything else is kept verbatim: no trimming and no
/// case change.
pub fn canonicalize_category(text: Option<&str>) -> Option<String> {
    let value = text?;
    if value.is_empty() || contains_sentinel(value, &CATEGORY_SENTINELS) {
        return None;
    }
    Some(value.to_string())
}
