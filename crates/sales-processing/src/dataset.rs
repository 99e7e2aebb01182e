//! Dataset I/O: reading raw CSV files into rows and building the typed output
//! frame.
//!
//! Every input column is read as text. Cleaning never relies on polars type
//! inference, so `"2"`, `"two"` and `"ERROR"` all reach the cleaner intact.

use crate::error::{CleaningError, Result, ResultExt};
use crate::types::{CleanRecord, Field, RawRecord};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Days from 0001-01-01 (CE) to 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Load a CSV file with every column as text.
///
/// Tries, in order: standard quoted parsing, parsing without a quote
/// character, and parsing pre-cleaned content (collapsed doubled quotes,
/// blank lines removed).
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();

    // Strategy 1: Standard loading with quote handling
    match text_read_options()
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .and_then(|reader| reader.finish())
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    // Strategy 2: Without quote handling
    match text_read_options()
        .with_parse_options(CsvParseOptions::default().with_quote_char(None))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .and_then(|reader| reader.finish())
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Loading without quotes failed: {}", e),
    }

    // Strategy 3: Pre-clean content
    let content = std::fs::read_to_string(path)
        .context(format!("Reading {}", path.display()))?;
    read_csv_str(&clean_csv_content(&content))
        .context(format!("Parsing {}", path.display()))
}

/// Parse CSV text with every column as text.
pub fn read_csv_str(content: &str) -> Result<DataFrame> {
    let cursor = Cursor::new(content.as_bytes().to_vec());
    let df = text_read_options()
        .into_reader_with_file_handle(cursor)
        .finish()?;
    Ok(df)
}

fn text_read_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
}

fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a frame into raw rows.
///
/// All eight sales columns must be present (extra columns are ignored);
/// non-text columns are cast to text first. A frame with no columns at all
/// is [`CleaningError::NoDataLoaded`].
pub fn raw_records_from_frame(df: &DataFrame) -> Result<Vec<RawRecord>> {
    if df.width() == 0 {
        return Err(CleaningError::NoDataLoaded);
    }

    let mut rows = vec![RawRecord::default(); df.height()];

    for field in Field::ALL {
        let name = field.column_name();
        let column = df
            .column(name)
            .map_err(|_| CleaningError::ColumnNotFound(name.to_string()))?;
        let series = column
            .as_materialized_series()
            .cast(&DataType::String)
            .context(format!("Casting '{}' to text", name))?;

        for (row, value) in rows.iter_mut().zip(series.str()?.into_iter()) {
            row.set(field, value.map(str::to_string));
        }
    }

    Ok(rows)
}

/// Build the typed output frame.
///
/// Column types: `Quantity` Int64, `Price Per Unit` and `Total Spent`
/// Float64, `Transaction Date` Date, everything else String.
pub fn clean_records_to_frame(records: &[CleanRecord]) -> Result<DataFrame> {
    let text = |f: fn(&CleanRecord) -> &str| -> Vec<String> {
        records.iter().map(|r| f(r).to_string()).collect()
    };

    let dates: Vec<Option<i32>> = records
        .iter()
        .map(|r| r.transaction_date.map(days_since_epoch))
        .collect();
    let date_series = Series::new(Field::TransactionDate.column_name().into(), dates)
        .cast(&DataType::Date)?;

    let columns = vec![
        Column::from(Series::new(
            Field::TransactionId.column_name().into(),
            text(|r| r.transaction_id.as_str()),
        )),
        Column::from(Series::new(
            Field::Item.column_name().into(),
            text(|r| r.item.as_str()),
        )),
        Column::from(Series::new(
            Field::Quantity.column_name().into(),
            records.iter().map(|r| r.quantity).collect::<Vec<_>>(),
        )),
        Column::from(Series::new(
            Field::PricePerUnit.column_name().into(),
            records.iter().map(|r| r.price_per_unit).collect::<Vec<_>>(),
        )),
        Column::from(Series::new(
            Field::TotalSpent.column_name().into(),
            records.iter().map(|r| r.total_spent).collect::<Vec<_>>(),
        )),
        Column::from(Series::new(
            Field::PaymentMethod.column_name().into(),
            text(|r| r.payment_method.as_str()),
        )),
        Column::from(Series::new(
            Field::Location.column_name().into(),
            text(|r| r.location.as_str()),
        )),
        Column::from(date_series),
    ];

    Ok(DataFrame::new(columns)?)
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Transaction ID,Item,Quantity,Price Per Unit,Total Spent,Payment Method,Location,Transaction Date
TXN_1,Coffee,2,2.0,4.0,Cash,In-store,2023-09-08
TXN_2,ERROR,two,,UNKNOWN,,Takeaway,01/02/2023
";

    #[test]
    fn test_read_csv_str_keeps_everything_as_text() {
        let df = read_csv_str(SAMPLE).unwrap();
        assert_eq!(df.shape(), (2, 8));
        for column in df.get_columns() {
            assert_eq!(column.dtype(), &DataType::String);
        }
    }

    #[test]
    fn test_raw_records_from_frame() {
        let df = read_csv_str(SAMPLE).unwrap();
        let rows = raw_records_from_frame(&df).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(Field::Quantity), Some("2"));
        assert_eq!(rows[1].get(Field::Quantity), Some("two"));
        assert_eq!(rows[1].get(Field::PricePerUnit), None);
        assert_eq!(rows[1].get(Field::TotalSpent), Some("UNKNOWN"));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let df = df![
            "Transaction ID" => ["T1"],
            "Item" => ["Coffee"],
        ]
        .unwrap();

        let err = raw_records_from_frame(&df).unwrap_err();
        assert!(matches!(err, CleaningError::ColumnNotFound(ref c) if c == "Quantity"));
    }

    #[test]
    fn test_empty_frame_is_no_data() {
        let err = raw_records_from_frame(&DataFrame::empty()).unwrap_err();
        assert!(matches!(err, CleaningError::NoDataLoaded));
    }

    #[test]
    fn test_clean_records_to_frame_types() {
        let records = vec![CleanRecord {
            row_id: 0,
            transaction_id: "TXN_1".into(),
            item: "Coffee".into(),
            quantity: Some(2),
            price_per_unit: None,
            total_spent: 4.0,
            payment_method: "nan".into(),
            location: "In-store".into(),
            transaction_date: NaiveDate::from_ymd_opt(1970, 1, 2),
        }];

        let df = clean_records_to_frame(&records).unwrap();

        assert_eq!(df.shape(), (1, 8));
        assert_eq!(df.column("Quantity").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("Total Spent").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Transaction Date").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("Price Per Unit").unwrap().null_count(), 1);
    }

    #[test]
    fn test_days_since_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(days_since_epoch(epoch), 0);
        let later = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        assert_eq!(days_since_epoch(later), 19389);
    }
}
