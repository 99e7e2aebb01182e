//! Multi-layout transaction date parsing.
//!
//! Dates arrive in many shapes (`01/02/2023`, `2023-02-01`, `Feb.01.23`,
//! `1 FEBRUARY 2023`...). Text is normalized to `/`-separated tokens and then
//! tried against a fixed, ordered list of 18 layouts; the first layout that
//! accepts the text wins. Day-first layouts come before month-first ones, so
//! `01/02/2023` is the 1st of February.

use super::converters::Coercion;
use crate::utils::{CATEGORY_SENTINELS, contains_sentinel};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static DATE_JUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._/\-]").expect("Invalid regex: date junk"));

static DATE_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9/]").expect("Invalid regex: date separators"));

const MONTH_NAMES: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

/// One component of a date layout, named after its strptime directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateToken {
    /// `%d`: day of month, one or two digits.
    Day,
    /// `%m`: month number, one or two digits.
    Month,
    /// `%b`: three-letter month abbreviation.
    MonthAbbrev,
    /// `%B`: full month name.
    MonthName,
    /// `%Y`: four-digit year.
    Year,
    /// `%y`: two-digit year; 69-99 map to the 1900s, 00-68 to the 2000s.
    ShortYear,
}

impl DateToken {
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Day => "%d",
            Self::Month => "%m",
            Self::MonthAbbrev => "%b",
            Self::MonthName => "%B",
            Self::Year => "%Y",
            Self::ShortYear => "%y",
        }
    }

    /// Read this component from an upper-cased token.
    fn read(&self, token: &str) -> Option<u32> {
        let all_digits = !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit());
        match self {
            Self::Day | Self::Month => {
                if all_digits && token.len() <= 2 {
                    token.parse().ok()
                } else {
                    None
                }
            }
            Self::Year => {
                if all_digits && token.len() == 4 {
                    token.parse().ok()
                } else {
                    None
                }
            }
            Self::ShortYear => {
                if all_digits && token.len() == 2 {
                    let yy: u32 = token.parse().ok()?;
                    Some(if yy >= 69 { 1900 + yy } else { 2000 + yy })
                } else {
                    None
                }
            }
            Self::MonthAbbrev => {
                if token.len() != 3 {
                    return None;
                }
                MONTH_NAMES
                    .iter()
                    .position(|name| name.starts_with(token))
                    .map(|pos| pos as u32 + 1)
            }
            Self::MonthName => MONTH_NAMES
                .iter()
                .position(|name| *name == token)
                .map(|pos| pos as u32 + 1),
        }
    }

    fn is_year(&self) -> bool {
        matches!(self, Self::Year | Self::ShortYear)
    }

    fn is_month(&self) -> bool {
        matches!(self, Self::Month | Self::MonthAbbrev | Self::MonthName)
    }
}

/// An ordered triple of date components separated by `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateLayout {
    pub tokens: [DateToken; 3],
}

impl DateLayout {
    const fn new(first: DateToken, second: DateToken, third: DateToken) -> Self {
        Self {
            tokens: [first, second, third],
        }
    }

    /// Parse normalized text with this layout.
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        let parts: Vec<&str> = text.split('/').collect();
        if parts.len() != 3 {
            return None;
        }

        let (mut year, mut month, mut day) = (None, None, None);
        for (token, part) in self.tokens.iter().zip(parts) {
            let value = token.read(part)?;
            if token.is_year() {
                year = Some(value);
            } else if token.is_month() {
                month = Some(value);
            } else {
                day = Some(value);
            }
        }

        NaiveDate::from_ymd_opt(year? as i32, month?, day?)
    }
}

impl fmt::Display for DateLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.tokens;
        write!(f, "{}/{}/{}", a.directive(), b.directive(), c.directive())
    }
}

use DateToken::{Day, Month, MonthAbbrev, MonthName, ShortYear, Year};

/// Layouts in priority order.
pub const DATE_LAYOUTS: [DateLayout; 18] = [
    DateLayout::new(Day, Month, Year),
    DateLayout::new(Day, Month, ShortYear),
    DateLayout::new(Month, Day, Year),
    DateLayout::new(Month, Day, ShortYear),
    DateLayout::new(Year, Month, Day),
    DateLayout::new(ShortYear, Month, Day),
    DateLayout::new(Day, MonthAbbrev, Year),
    DateLayout::new(Day, MonthAbbrev, ShortYear),
    DateLayout::new(MonthAbbrev, Day, Year),
    DateLayout::new(MonthAbbrev, Day, ShortYear),
    DateLayout::new(Year, MonthAbbrev, Day),
    DateLayout::new(ShortYear, MonthAbbrev, Day),
    DateLayout::new(Day, MonthName, Year),
    DateLayout::new(Day, MonthName, ShortYear),
    DateLayout::new(MonthName, Day, Year),
    DateLayout::new(MonthName, Day, ShortYear),
    DateLayout::new(Year, MonthName, Day),
    DateLayout::new(ShortYear, MonthName, Day),
];

/// Normalize raw date text for layout matching.
///
/// Upper-cases, returns `None` for `UNKNOWN`/`ERROR`/`NAN`, drops characters
/// outside `[A-Za-z0-9._/-]`, then turns every remaining separator into `/`.
/// Malformed input may have tokens merged by the first strip; whatever comes
/// out is still tried against the layouts.
pub fn normalize_date_text(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    if contains_sentinel(&upper, &CATEGORY_SENTINELS) {
        return None;
    }
    let kept = DATE_JUNK.replace_all(&upper, "");
    Some(DATE_SEPARATORS.replace_all(&kept, "/").into_owned())
}

/// First layout that accepts already-normalized text, with the parsed date.
pub fn matching_layout(normalized: &str) -> Option<(&'static DateLayout, NaiveDate)> {
    DATE_LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(normalized).map(|date| (layout, date)))
}

/// Parse a raw date cell and report how it was resolved.
pub fn parse_date_traced(text: Option<&str>) -> (Option<NaiveDate>, Coercion) {
    let Some(raw) = text else {
        return (None, Coercion::Missing);
    };
    let Some(normalized) = normalize_date_text(raw) else {
        return (None, Coercion::Sentinel);
    };
    match matching_layout(&normalized) {
        Some((_, date)) => (Some(date), Coercion::Parsed),
        None => (None, Coercion::Unparseable),
    }
}

/// Parse a raw date cell; anything unparseable becomes missing.
pub fn parse_transaction_date(text: Option<&str>) -> Option<NaiveDate> {
    parse_date_traced(text).0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_layout_order_matches_directives() {
        let rendered: Vec<String> = DATE_LAYOUTS.iter().map(|l| l.to_string()).collect();
        assert_eq!(rendered[0], "%d/%m/%Y");
        assert_eq!(rendered[5], "%y/%m/%d");
        assert_eq!(rendered[8], "%b/%d/%Y");
        assert_eq!(rendered[17], "%y/%B/%d");
    }

    #[test]
    fn test_day_first_wins() {
        assert_eq!(parse_transaction_date(Some("01/02/2023")), date(2023, 2, 1));
        assert_eq!(parse_transaction_date(Some("12/31/2023")), date(2023, 12, 31));
    }

    #[test]
    fn test_separator_normalization() {
        assert_eq!(parse_transaction_date(Some("2023-09-08")), date(2023, 9, 8));
        assert_eq!(parse_transaction_date(Some("08.09.2023")), date(2023, 9, 8));
        assert_eq!(parse_transaction_date(Some("08_09_23")), date(2023, 9, 8));
        assert_eq!(normalize_date_text("2023-09-08").as_deref(), Some("2023/09/08"));
    }

    #[test]
    fn test_month_names() {
        assert_eq!(parse_transaction_date(Some("5/Mar/2023")), date(2023, 3, 5));
        assert_eq!(parse_transaction_date(Some("Mar-05-23")), date(2023, 3, 5));
        assert_eq!(
            parse_transaction_date(Some("5/september/2023")),
            date(2023, 9, 5)
        );
        assert_eq!(
            parse_transaction_date(Some("2023/December/24")),
            date(2023, 12, 24)
        );
        assert_eq!(parse_transaction_date(Some("5/Sept/2023")), None);
    }

    #[test]
    fn test_short_year_pivot() {
        assert_eq!(parse_transaction_date(Some("01/02/68")), date(2068, 2, 1));
        assert_eq!(parse_transaction_date(Some("01/02/69")), date(1969, 2, 1));
    }

    #[test]
    fn test_year_first_layouts() {
        let (layout, parsed) = matching_layout("2023/02/01").unwrap();
        assert_eq!(layout.to_string(), "%Y/%m/%d");
        assert_eq!(Some(parsed), date(2023, 2, 1));
    }

    #[test]
    fn test_sentinels_and_garbage() {
        assert_eq!(parse_date_traced(Some("UNKNOWN")), (None, Coercion::Sentinel));
        assert_eq!(parse_date_traced(Some("error")), (None, Coercion::Sentinel));
        assert_eq!(parse_date_traced(Some("nan")), (None, Coercion::Sentinel));
        assert_eq!(parse_date_traced(None), (None, Coercion::Missing));
        assert_eq!(
            parse_date_traced(Some("not a date")),
            (None, Coercion::Unparseable)
        );
        assert_eq!(parse_transaction_date(Some("")), None);
        assert_eq!(parse_transaction_date(Some("31/02/2023")), None);
        assert_eq!(parse_transaction_date(Some("2023/02")), None);
    }
}
