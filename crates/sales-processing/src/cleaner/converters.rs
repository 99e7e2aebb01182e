//! Numeric coercion for the quantity, price and total columns.

use super::numerals::parse_numeral;
use crate::utils::{NUMERIC_SENTINELS, contains_sentinel};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Everything that is not an ASCII digit or a decimal point.
static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.]").expect("Invalid regex: non-numeric"));

/// How a single numeric cell was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// The cell was already missing.
    Missing,
    /// The text parsed as a number after stripping.
    Parsed,
    /// The text was a number written in words.
    Numeral,
    /// The text contained a sentinel marker.
    Sentinel,
    /// Nothing numeric was left after stripping.
    Unparseable,
}

/// Per-column tally of coercion outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionStats {
    pub parsed: usize,
    pub numerals: usize,
    pub sentinels: usize,
    pub unparseable: usize,
}

impl CoercionStats {
    pub(crate) fn record(&mut self, outcome: Coercion) {
        match outcome {
            Coercion::Missing => {}
            Coercion::Parsed => self.parsed += 1,
            Coercion::Numeral => self.numerals += 1,
            Coercion::Sentinel => self.sentinels += 1,
            Coercion::Unparseable => self.unparseable += 1,
        }
    }

    /// Present cells that ended up missing.
    pub fn cleared(&self) -> usize {
        self.sentinels + self.unparseable
    }
}

/// Coerce numeric text and report how it was resolved.
///
/// Steps, in order:
/// 1. A number written in words is replaced by its digit rendering.
/// 2. Text containing `UNKNOWN` or `ERROR` becomes missing.
/// 3. Every character other than `0-9` and `.` is removed.
/// 4. The residue is parsed; an empty residue or a failed parse is missing.
///
/// Step 3 also removes minus signs, so negative input comes out positive.
pub fn coerce_numeric_traced(text: Option<&str>) -> (Option<f64>, Coercion) {
    let Some(raw) = text else {
        return (None, Coercion::Missing);
    };

    let numeral = parse_numeral(raw);
    let rendered = numeral.map(|value| value.to_string());
    let value = rendered.as_deref().unwrap_or(raw);

    if contains_sentinel(value, &NUMERIC_SENTINELS) {
        return (None, Coercion::Sentinel);
    }

    let digits = NON_NUMERIC.replace_all(value, "");
    match digits.parse::<f64>() {
        Ok(number) if numeral.is_some() => (Some(number), Coercion::Numeral),
        Ok(number) => (Some(number), Coercion::Parsed),
        Err(_) => (None, Coercion::Unparseable),
    }
}

/// Coerce numeric text to `f64`; never fails, bad input becomes missing.
pub fn coerce_numeric(text: Option<&str>) -> Option<f64> {
    coerce_numeric_traced(text).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(coerce_numeric(Some("3")), Some(3.0));
        assert_eq!(coerce_numeric(Some("4.5")), Some(4.5));
        assert_eq!(coerce_numeric(Some(".5")), Some(0.5));
        assert_eq!(coerce_numeric(None), None);
    }

    #[test]
    fn test_sentinels_become_missing() {
        assert_eq!(
            coerce_numeric_traced(Some("ERROR")),
            (None, Coercion::Sentinel)
        );
        assert_eq!(
            coerce_numeric_traced(Some("UNKNOWN")),
            (None, Coercion::Sentinel)
        );
        assert_eq!(
            coerce_numeric_traced(Some("12ERROR")),
            (None, Coercion::Sentinel)
        );
    }

    #[test]
    fn test_strips_non_numeric_characters() {
        assert_eq!(coerce_numeric(Some("$4.00")), Some(4.0));
        assert_eq!(coerce_numeric(Some(" 2 units")), Some(2.0));
        assert_eq!(coerce_numeric(Some("-3")), Some(3.0));
    }

    #[test]
    fn test_unparseable_residue_is_missing() {
        assert_eq!(
            coerce_numeric_traced(Some("abc")),
            (None, Coercion::Unparseable)
        );
        assert_eq!(coerce_numeric(Some("1.2.3")), None);
        assert_eq!(coerce_numeric(Some("NAN")), None);
        assert_eq!(coerce_numeric(Some("")), None);
        assert_eq!(coerce_numeric(Some(".")), None);
    }

    #[test]
    fn test_number_words() {
        assert_eq!(
            coerce_numeric_traced(Some("two")),
            (Some(2.0), Coercion::Numeral)
        );
        assert_eq!(coerce_numeric(Some("three point five")), Some(3.5));
        assert_eq!(coerce_numeric(Some("1.5 million")), Some(1_500_000.0));
        assert_eq!(coerce_numeric(Some("minus four")), Some(4.0));
    }

    #[test]
    fn test_coercion_stats() {
        let mut stats = CoercionStats::default();
        for text in [Some("1"), Some("two"), Some("ERROR"), Some("x"), None] {
            stats.record(coerce_numeric_traced(text).1);
        }
        assert_eq!(stats.parsed, 1);
        assert_eq!(stats.numerals, 1);
        assert_eq!(stats.sentinels, 1);
        assert_eq!(stats.unparseable, 1);
        assert_eq!(stats.cleared(), 2);
    }
}
