//! Data cleaning stages that turn raw text rows into a typed table.
//!
//! This module provides functionality for:
//! - Sanitizing identifiers and canonicalizing categorical sentinels
//! - Coercing numeric text (including number words) to numbers
//! - Parsing transaction dates in 18 layouts
//! - Removing rows with too little information to recover
//! - Final type enforcement after imputation

mod converters;
mod dates;
mod numerals;
mod sanitizers;
mod type_corrector;

pub use converters::{Coercion, CoercionStats, coerce_numeric, coerce_numeric_traced};
pub use dates::{
    DATE_LAYOUTS, DateLayout, DateToken, matching_layout, normalize_date_text, parse_date_traced,
    parse_transaction_date,
};
pub use numerals::parse_numeral;
pub use sanitizers::{canonicalize_category, sanitize_identifier};
pub use type_corrector::{FinalTyping, TypeCorrector};

use crate::error::{CleaningError, Result};
use crate::types::{Cell, Field, RawRecord, Record, SalesTable};
use std::collections::BTreeMap;
use tracing::debug;

/// Coercion outcomes keyed by column header.
pub type ColumnStats = BTreeMap<String, CoercionStats>;

/// Data cleaner for the pre-imputation stages.
pub struct DataCleaner;

impl DataCleaner {
    /// Build the typed table from raw rows.
    ///
    /// Identifiers are sanitized and `Item`, `Payment Method` and `Location`
    /// are canonicalized. Numeric and date columns start missing and are
    /// filled by [`DataCleaner::coerce_numerics`] and
    /// [`DataCleaner::parse_dates`]. Each record's `row_id` is its index in
    /// `raw`.
    pub fn normalize_strings(&self, raw: &[RawRecord]) -> (SalesTable, ColumnStats) {
        let mut stats = ColumnStats::new();
        let categorical = [Field::Item, Field::PaymentMethod, Field::Location];

        let table = raw
            .iter()
            .enumerate()
            .map(|(row_id, row)| {
                let mut record =
                    Record::new(row_id, sanitize_identifier(row.get(Field::TransactionId)));

                for field in categorical {
                    let original = row.get(field);
                    let value = canonicalize_category(original);
                    let outcome = match (original, &value) {
                        (None, _) => Coercion::Missing,
                        (Some(_), Some(_)) => Coercion::Parsed,
                        (Some(""), None) => Coercion::Missing,
                        (Some(_), None) => Coercion::Sentinel,
                    };
                    stats
                        .entry(field.column_name().to_string())
                        .or_default()
                        .record(outcome);
                    if let Some(text) = value {
                        record.fill(field, Cell::Text(text));
                    }
                }

                record
            })
            .collect::<SalesTable>();

        debug!(
            "Normalized {} rows, cleared {} categorical sentinels",
            table.len(),
            stats.values().map(CoercionStats::cleared).sum::<usize>()
        );

        (table, stats)
    }

    /// Coerce `Quantity`, `Price Per Unit` and `Total Spent` for every record.
    pub fn coerce_numerics(&self, raw: &[RawRecord], table: &mut SalesTable) -> Result<ColumnStats> {
        let numeric = [Field::Quantity, Field::PricePerUnit, Field::TotalSpent];
        let mut stats = ColumnStats::new();

        for record in table.records_mut() {
            let row = source_row(raw, record.row_id, "numeric coercion")?;
            for field in numeric {
                let (value, outcome) = coerce_numeric_traced(row.get(field));
                stats
                    .entry(field.column_name().to_string())
                    .or_default()
                    .record(outcome);
                if let Some(number) = value {
                    record.fill(field, Cell::Number(number));
                }
            }
        }

        debug!("Numeric coercion: {:?}", stats);
        Ok(stats)
    }

    /// Parse `Transaction Date` for every record.
    pub fn parse_dates(&self, raw: &[RawRecord], table: &mut SalesTable) -> Result<CoercionStats> {
        let mut stats = CoercionStats::default();

        for record in table.records_mut() {
            let row = source_row(raw, record.row_id, "date parsing")?;
            let (date, outcome) = parse_date_traced(row.get(Field::TransactionDate));
            stats.record(outcome);
            record.transaction_date = date;
        }

        debug!(
            "Date parsing: {} parsed, {} sentinels, {} unparseable",
            stats.parsed, stats.sentinels, stats.unparseable
        );
        Ok(stats)
    }

    /// Remove records that cannot be recovered.
    ///
    /// A record is dropped when `Item`, `Quantity` and `Transaction Date` are
    /// all missing, or when `Item`, `Quantity` and `Price Per Unit` are all
    /// missing. Returns the dropped row ids.
    pub fn drop_critical_rows(&self, table: &mut SalesTable) -> Vec<usize> {
        let dropped = table.retain_rows(|r| !is_critical(r));
        if !dropped.is_empty() {
            debug!("Dropped {} unrecoverable rows", dropped.len());
        }
        dropped
    }
}

/// Whether a record lacks enough information to be rebuilt.
pub fn is_critical(record: &Record) -> bool {
    let core_missing = record.item.is_none() && record.quantity.is_none();
    core_missing && (record.transaction_date.is_none() || record.price_per_unit.is_none())
}

fn source_row<'a>(raw: &'a [RawRecord], row_id: usize, stage: &str) -> Result<&'a RawRecord> {
    raw.get(row_id).ok_or_else(|| {
        CleaningError::stage(
            stage,
            format!("row {} has no source row ({} raw rows)", row_id, raw.len()),
        )
    })
}
