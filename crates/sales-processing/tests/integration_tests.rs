//! Integration tests for the sales cleaning pipeline.
//!
//! These tests verify end-to-end behavior of the pipeline on the fixture
//! dataset and on small hand-built tables.

use chrono::NaiveDate;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sales_processing::dataset::{load_csv, raw_records_from_frame};
use sales_processing::utils::count_frame_nulls;
use sales_processing::{
    CleanRecord, CleaningStage, Field, IterativeImputer, Pipeline, PipelineConfig,
    PipelineResult, RawRecord, Record, SalesTable,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture() -> DataFrame {
    load_csv(fixtures_path().join("dirty_cafe_sales.csv")).expect("Failed to read fixture")
}

fn in_memory_pipeline() -> Pipeline {
    Pipeline::builder()
        .config(PipelineConfig::builder().save_to_disk(false).build().unwrap())
        .build()
        .unwrap()
}

fn clean_fixture() -> PipelineResult {
    in_memory_pipeline()
        .process(load_fixture())
        .expect("Pipeline should complete successfully")
}

fn find<'a>(result: &'a PipelineResult, transaction_id: &str) -> &'a CleanRecord {
    result
        .records
        .iter()
        .find(|r| r.transaction_id == transaction_id)
        .unwrap_or_else(|| panic!("{} not in output", transaction_id))
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

// ============================================================================
// Full Pipeline Tests with the Fixture
// ============================================================================

#[test]
fn test_fixture_loads_as_text() {
    let df = load_fixture();

    assert_eq!(df.shape(), (18, 8));
    for column in df.get_columns() {
        assert_eq!(column.dtype(), &DataType::String, "{}", column.name());
    }

    let raw = raw_records_from_frame(&df).unwrap();
    assert_eq!(raw[13].get(Field::TransactionDate), Some("March 5, 2023"));
}

#[test]
fn test_full_pipeline_counters() {
    let result = clean_fixture();
    let summary = &result.summary;

    assert!(result.success);
    assert_eq!(summary.rows_before, 18);
    assert_eq!(summary.dropped_critical, vec![12, 17]);
    assert_eq!(summary.dropped_incomplete, vec![8, 11]);
    assert_eq!(summary.rows_after, 14);
    assert_eq!(summary.rows_removed, 4);
    assert_eq!(result.data.height(), 14);

    // Only the unparseable "March 5, 2023" date stays missing.
    assert_eq!(summary.remaining_missing, 1);
    assert_eq!(summary.remaining_missing, count_frame_nulls(&result.data));
    assert!(result.imputation.converged);
}

#[test]
fn test_full_pipeline_repairs_rows() {
    let result = clean_fixture();

    // Sanitized id, number word, seeded price, day-first date
    let coffee = find(&result, "TXN1000001");
    assert_eq!(coffee.quantity, Some(2));
    assert_eq!(coffee.price_per_unit, Some(2.0));
    assert_eq!(coffee.total_spent, 4.0);
    assert_eq!(coffee.transaction_date, date(2023, 9, 8));

    // Total from quantity x price
    let cookie = find(&result, "TXN_4271903");
    assert_eq!(cookie.total_spent, 4.0);

    // Quantity from total / price, then payment from (quantity, location)
    let cake = find(&result, "TXN_1000007");
    assert_eq!(cake.quantity, Some(4));
    assert_eq!(cake.payment_method, "Cash");

    // Item from (price, quantity)
    let juice = find(&result, "TXN_4433211");
    assert_eq!(juice.item, "Juice");

    // Categoricals with no group to learn from
    let salad = find(&result, "TXN_7034554");
    assert_eq!(salad.payment_method, "nan");
    assert_eq!(salad.location, "nan");

    let tea = find(&result, "TXN_1000004");
    assert_eq!(tea.total_spent, 1.5);
    assert_eq!(tea.transaction_date, None);

    let dashed = find(&result, "TXN_1000006");
    assert_eq!(dashed.transaction_date, date(2023, 5, 16));
    assert_eq!(dashed.price_per_unit, Some(3.0));
}

#[test]
fn test_output_has_no_sentinels() {
    let result = clean_fixture();

    for record in &result.records {
        for text in [&record.item, &record.payment_method, &record.location] {
            assert!(
                !text.contains("UNKNOWN") && !text.contains("ERROR"),
                "sentinel left in row {}: {}",
                record.row_id,
                text
            );
        }
        assert!(
            record
                .transaction_id
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        );
    }
}

#[test]
fn test_output_triads_are_consistent() {
    let result = clean_fixture();

    for record in &result.records {
        if let (Some(quantity), Some(price)) = (record.quantity, record.price_per_unit) {
            assert!(
                (quantity as f64 * price - record.total_spent).abs() < 1e-9,
                "row {}: {} x {} != {}",
                record.row_id,
                quantity,
                price,
                record.total_spent
            );
        }
    }
}

#[test]
fn test_output_frame_types() {
    let result = clean_fixture();
    let df = &result.data;

    let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
    let expected: Vec<&str> = Field::ALL.iter().map(|f| f.column_name()).collect();
    assert_eq!(names, expected);

    assert_eq!(df.column("Quantity").unwrap().dtype(), &DataType::Int64);
    assert_eq!(df.column("Price Per Unit").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("Total Spent").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("Transaction Date").unwrap().dtype(), &DataType::Date);
    assert_eq!(df.column("Item").unwrap().dtype(), &DataType::String);
}

#[test]
fn test_csv_round_trip_through_disk() {
    let dir = std::env::temp_dir().join(format!("sales_integration_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let result = Pipeline::builder()
        .config(
            PipelineConfig::builder()
                .output_dir(dir.clone())
                .generate_reports(false)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
        .process(load_fixture())
        .unwrap();

    let output = result.output_file.clone().expect("output should be written");
    assert_eq!(output, dir.join("clean_data.csv"));
    assert!(result.report_file.is_none());

    let reread = load_csv(&output).unwrap();
    assert_eq!(reread.shape(), (14, 8));

    let raw = raw_records_from_frame(&reread).unwrap();
    let coffee = raw
        .iter()
        .find(|r| r.get(Field::TransactionId) == Some("TXN1000001"))
        .unwrap();
    assert_eq!(coffee.get(Field::Quantity), Some("2"));
    assert_eq!(coffee.get(Field::TransactionDate), Some("2023-09-08"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_progress_reports_every_pass() {
    let passes = Arc::new(AtomicUsize::new(0));
    let passes_clone = passes.clone();

    let result = Pipeline::builder()
        .config(PipelineConfig::builder().save_to_disk(false).build().unwrap())
        .on_progress(move |update| {
            if update.stage == CleaningStage::Imputation && update.items_processed.is_some() {
                passes_clone.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build()
        .unwrap()
        .process(load_fixture())
        .unwrap();

    assert_eq!(passes.load(Ordering::SeqCst), result.imputation.passes_run());
}

// ============================================================================
// Behavioral Examples
// ============================================================================

#[test]
fn test_coffee_without_numeric_anchor_is_dropped() {
    let rows = vec![
        RawRecord::from_row(["ABC123", "Coffee", "", "2.5", "", "Cash", "In-store", "UNKNOWN"]),
        RawRecord::from_row([
            "DEF456", "Coffee", "3", "2.5", "7.5", "Card", "Takeaway", "2023-01-05",
        ]),
    ];

    let result = in_memory_pipeline().process_records(&rows).unwrap();

    // Quantity and total have nothing to derive from; the row survives the
    // first filter (item is known) but not the final one (total missing).
    assert!(result.summary.dropped_critical.is_empty());
    assert_eq!(result.summary.dropped_incomplete, vec![0]);
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].transaction_id, "DEF456");
}

#[test]
fn test_coffee_with_total_gets_quantity() {
    let rows = vec![
        RawRecord::from_row(["ABC123", "Coffee", "", "2.5", "5.0", "Cash", "In-store", "UNKNOWN"]),
        RawRecord::from_row([
            "DEF456", "Coffee", "3", "2.5", "7.5", "Card", "Takeaway", "2023-01-05",
        ]),
    ];

    let result = in_memory_pipeline().process_records(&rows).unwrap();

    let first = result.records.iter().find(|r| r.row_id == 0).unwrap();
    assert_eq!(first.quantity, Some(2));
    // No other Coffee with quantity 2 to borrow a date from
    assert_eq!(first.transaction_date, None);
    assert_eq!(result.summary.remaining_missing, 1);
}

#[test]
fn test_date_priority_is_day_first() {
    let rows = vec![RawRecord::from_row([
        "T1", "Tea", "1", "1.5", "1.5", "Cash", "In-store", "01/02/2023",
    ])];

    let result = in_memory_pipeline().process_records(&rows).unwrap();

    assert_eq!(result.records[0].transaction_date, date(2023, 2, 1));
}

#[test]
fn test_row_removal_conditions() {
    let rows = vec![
        // item, quantity and date missing: removed whatever else is known
        RawRecord::from_row(["A", "ERROR", "UNKNOWN", "2.0", "4.0", "Cash", "In-store", "NAN"]),
        // only payment missing: kept
        RawRecord::from_row([
            "B", "Cake", "1", "3.0", "3.0", "UNKNOWN", "In-store", "2023-01-01",
        ]),
    ];

    let result = in_memory_pipeline().process_records(&rows).unwrap();

    assert_eq!(result.summary.dropped_critical, vec![0]);
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].transaction_id, "B");
    assert_eq!(result.records[0].payment_method, "nan");
}

#[test]
fn test_consistent_rows_pass_through_unchanged() {
    let rows = vec![
        RawRecord::from_row(["T1", "Juice", "3", "3.0", "9.0", "Cash", "Takeaway", "2023-03-05"]),
        RawRecord::from_row([
            "T2", "Cookie", "4", "1.0", "4.0", "Card", "In-store", "2023-07-19",
        ]),
    ];

    let result = in_memory_pipeline().process_records(&rows).unwrap();

    assert_eq!(result.imputation.total_filled(), 0);
    assert_eq!(result.imputation.passes_run(), 1);
    let juice = &result.records[0];
    assert_eq!(
        (juice.quantity, juice.price_per_unit, juice.total_spent),
        (Some(3), Some(3.0), 9.0)
    );
}

// ============================================================================
// Convergence Property
// ============================================================================

const ITEMS: [&str; 4] = ["Coffee", "Tea", "Cake", "Juice"];
const PAYMENTS: [&str; 3] = ["Cash", "Card", "Digital Wallet"];
const LOCATIONS: [&str; 2] = ["In-store", "Takeaway"];

fn maybe<T>(rng: &mut StdRng, value: T) -> Option<T> {
    if rng.gen_bool(0.3) { None } else { Some(value) }
}

fn random_table(rng: &mut StdRng, rows: usize) -> SalesTable {
    (0..rows)
        .map(|row_id| {
            let item = rng.gen_range(0..ITEMS.len());
            let quantity = rng.gen_range(1..=5) as f64;
            let price = (item + 1) as f64;
            let payment = PAYMENTS[rng.gen_range(0..PAYMENTS.len())];
            let location = LOCATIONS[rng.gen_range(0..LOCATIONS.len())];
            let day = rng.gen_range(1..=28);

            Record {
                item: maybe(rng, ITEMS[item].to_string()),
                quantity: maybe(rng, quantity),
                price_per_unit: maybe(rng, price),
                total_spent: maybe(rng, quantity * price),
                payment_method: maybe(rng, payment.to_string()),
                location: maybe(rng, location.to_string()),
                transaction_date: NaiveDate::from_ymd_opt(2023, 1, day)
                    .and_then(|d| maybe(rng, d)),
                ..Record::new(row_id, format!("T{}", row_id))
            }
        })
        .collect()
}

#[test]
fn test_convergence_on_random_tables() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..50 {
        let mut table = random_table(&mut rng, 40);
        let before = table.clone();

        let report = IterativeImputer::default().impute(&mut table);

        assert!(report.passes_run() >= 1 && report.passes_run() <= 11);
        assert!(report.missing_after_seed <= report.missing_before);
        let mut previous = report.missing_after_seed;
        for pass in &report.passes {
            assert_eq!(pass.missing_before, previous);
            assert!(pass.missing_after <= pass.missing_before);
            previous = pass.missing_after;
        }
        if report.converged {
            let last = report.passes.last().unwrap();
            assert_eq!(last.missing_after, last.missing_before);
        }
        assert_eq!(report.missing_after(), table.missing_count());

        for (old, new) in before.records().iter().zip(table.records()) {
            assert_eq!(old.row_id, new.row_id);
            for field in Field::ALL {
                let original = old.get(field);
                if !original.is_absent() {
                    assert_eq!(new.get(field), original, "row {} {}", old.row_id, field);
                }
            }

            // A total the engine derived is exactly quantity x price.
            if old.total_spent.is_none()
                && let Some(total) = new.total_spent
            {
                let quantity = new.quantity.expect("derived total needs quantity");
                let price = new.price_per_unit.expect("derived total needs price");
                assert_eq!(total, quantity * price);
            }
        }
    }
}
