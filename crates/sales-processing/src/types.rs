//! Core data types: the typed transaction table and the result/summary types
//! produced by the pipeline.

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

// ============================================================================
// Columns
// ============================================================================

/// The eight columns of a sales transaction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    TransactionId,
    Item,
    Quantity,
    PricePerUnit,
    TotalSpent,
    PaymentMethod,
    Location,
    TransactionDate,
}

impl Field {
    /// All columns in input/output order.
    pub const ALL: [Field; 8] = [
        Field::TransactionId,
        Field::Item,
        Field::Quantity,
        Field::PricePerUnit,
        Field::TotalSpent,
        Field::PaymentMethod,
        Field::Location,
        Field::TransactionDate,
    ];

    /// Columns that may be missing. The identifier is always present.
    pub const OPTIONAL: [Field; 7] = [
        Field::Item,
        Field::Quantity,
        Field::PricePerUnit,
        Field::TotalSpent,
        Field::PaymentMethod,
        Field::Location,
        Field::TransactionDate,
    ];

    /// Header name used in CSV input and output.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::TransactionId => "Transaction ID",
            Self::Item => "Item",
            Self::Quantity => "Quantity",
            Self::PricePerUnit => "Price Per Unit",
            Self::TotalSpent => "Total Spent",
            Self::PaymentMethod => "Payment Method",
            Self::Location => "Location",
            Self::TransactionDate => "Transaction Date",
        }
    }

    /// Look up a column by its header name.
    pub fn from_column_name(name: &str) -> Option<Field> {
        Self::ALL.into_iter().find(|f| f.column_name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

// ============================================================================
// Cells
// ============================================================================

/// A single table value addressed without knowing its column type.
///
/// Used for grouping keys and grouped-mode values. Cells are totally ordered:
/// `Absent < Number < Text < Date`, numbers by IEEE total order (with `-0.0`
/// folded into `0.0`), text lexicographically, dates chronologically. The
/// ordering doubles as the tie-break rule for grouped modes.
#[derive(Debug, Clone)]
pub enum Cell {
    Absent,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Cell::Absent => 0,
            Cell::Number(_) => 1,
            Cell::Text(_) => 2,
            Cell::Date(_) => 3,
        }
    }

    fn canonical(v: f64) -> f64 {
        if v == 0.0 { 0.0 } else { v }
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Absent, Cell::Number)
    }
}

impl From<Option<&String>> for Cell {
    fn from(value: Option<&String>) -> Self {
        value.map_or(Cell::Absent, |s| Cell::Text(s.clone()))
    }
}

impl From<Option<NaiveDate>> for Cell {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map_or(Cell::Absent, Cell::Date)
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => Cell::canonical(*a).total_cmp(&Cell::canonical(*b)),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (Cell::Date(a), Cell::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Cell::Absent => {}
            Cell::Number(v) => Cell::canonical(*v).to_bits().hash(state),
            Cell::Text(s) => s.hash(state),
            Cell::Date(d) => d.hash(state),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Absent => f.write_str("<missing>"),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// One untyped input row exactly as read from the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub transaction_id: Option<String>,
    pub item: Option<String>,
    pub quantity: Option<String>,
    pub price_per_unit: Option<String>,
    pub total_spent: Option<String>,
    pub payment_method: Option<String>,
    pub location: Option<String>,
    pub transaction_date: Option<String>,
}

impl RawRecord {
    /// Build a raw row from cells in [`Field::ALL`] order; empty strings are missing.
    pub fn from_row(cells: [&str; 8]) -> Self {
        let mut raw = RawRecord::default();
        for (field, cell) in Field::ALL.into_iter().zip(cells) {
            raw.set(field, (!cell.is_empty()).then(|| cell.to_string()));
        }
        raw
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::TransactionId => self.transaction_id.as_deref(),
            Field::Item => self.item.as_deref(),
            Field::Quantity => self.quantity.as_deref(),
            Field::PricePerUnit => self.price_per_unit.as_deref(),
            Field::TotalSpent => self.total_spent.as_deref(),
            Field::PaymentMethod => self.payment_method.as_deref(),
            Field::Location => self.location.as_deref(),
            Field::TransactionDate => self.transaction_date.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        let slot = match field {
            Field::TransactionId => &mut self.transaction_id,
            Field::Item => &mut self.item,
            Field::Quantity => &mut self.quantity,
            Field::PricePerUnit => &mut self.price_per_unit,
            Field::TotalSpent => &mut self.total_spent,
            Field::PaymentMethod => &mut self.payment_method,
            Field::Location => &mut self.location,
            Field::TransactionDate => &mut self.transaction_date,
        };
        *slot = value;
    }
}

/// One typed transaction.
///
/// `row_id` is the position of the row in the raw input and never changes,
/// so drop operations can always be traced back to the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub row_id: usize,
    pub transaction_id: String,
    pub item: Option<String>,
    pub quantity: Option<f64>,
    pub price_per_unit: Option<f64>,
    pub total_spent: Option<f64>,
    pub payment_method: Option<String>,
    pub location: Option<String>,
    pub transaction_date: Option<NaiveDate>,
}

impl Record {
    /// A record with every optional field missing.
    pub fn new(row_id: usize, transaction_id: impl Into<String>) -> Self {
        Self {
            row_id,
            transaction_id: transaction_id.into(),
            item: None,
            quantity: None,
            price_per_unit: None,
            total_spent: None,
            payment_method: None,
            location: None,
            transaction_date: None,
        }
    }

    /// Read a column as a [`Cell`].
    pub fn get(&self, field: Field) -> Cell {
        match field {
            Field::TransactionId => Cell::Text(self.transaction_id.clone()),
            Field::Item => Cell::from(self.item.as_ref()),
            Field::Quantity => Cell::from(self.quantity),
            Field::PricePerUnit => Cell::from(self.price_per_unit),
            Field::TotalSpent => Cell::from(self.total_spent),
            Field::PaymentMethod => Cell::from(self.payment_method.as_ref()),
            Field::Location => Cell::from(self.location.as_ref()),
            Field::TransactionDate => Cell::from(self.transaction_date),
        }
    }

    pub fn is_missing(&self, field: Field) -> bool {
        match field {
            Field::TransactionId => false,
            Field::Item => self.item.is_none(),
            Field::Quantity => self.quantity.is_none(),
            Field::PricePerUnit => self.price_per_unit.is_none(),
            Field::TotalSpent => self.total_spent.is_none(),
            Field::PaymentMethod => self.payment_method.is_none(),
            Field::Location => self.location.is_none(),
            Field::TransactionDate => self.transaction_date.is_none(),
        }
    }

    /// Number of missing optional fields.
    pub fn missing_count(&self) -> usize {
        Field::OPTIONAL
            .iter()
            .filter(|f| self.is_missing(**f))
            .count()
    }

    /// Write `value` into `field` only if the field is currently missing and
    /// the cell variant matches the column type. Returns whether a value was
    /// written. Present values are never overwritten.
    pub fn fill(&mut self, field: Field, value: Cell) -> bool {
        if !self.is_missing(field) {
            return false;
        }
        match (field, value) {
            (Field::Item, Cell::Text(s)) => self.item = Some(s),
            (Field::PaymentMethod, Cell::Text(s)) => self.payment_method = Some(s),
            (Field::Location, Cell::Text(s)) => self.location = Some(s),
            (Field::Quantity, Cell::Number(v)) => self.quantity = Some(v),
            (Field::PricePerUnit, Cell::Number(v)) => self.price_per_unit = Some(v),
            (Field::TotalSpent, Cell::Number(v)) => self.total_spent = Some(v),
            (Field::TransactionDate, Cell::Date(d)) => self.transaction_date = Some(d),
            _ => return false,
        }
        true
    }
}

/// An ordered set of typed records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesTable {
    records: Vec<Record>,
}

impl SalesTable {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Find a record by its original row id.
    pub fn get(&self, row_id: usize) -> Option<&Record> {
        self.records.iter().find(|r| r.row_id == row_id)
    }

    pub fn row_ids(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.row_id).collect()
    }

    /// Total missing cells across all optional columns.
    pub fn missing_count(&self) -> usize {
        self.records.iter().map(Record::missing_count).sum()
    }

    /// Missing cells per column, keyed by header name.
    pub fn missing_by_column(&self) -> BTreeMap<String, usize> {
        Field::OPTIONAL
            .iter()
            .map(|field| {
                let count = self.records.iter().filter(|r| r.is_missing(*field)).count();
                (field.column_name().to_string(), count)
            })
            .collect()
    }

    /// Keep only records matching `keep`; returns the row ids that were dropped.
    pub fn retain_rows<F>(&mut self, mut keep: F) -> Vec<usize>
    where
        F: FnMut(&Record) -> bool,
    {
        let mut dropped = Vec::new();
        self.records.retain(|r| {
            let kept = keep(r);
            if !kept {
                dropped.push(r.row_id);
            }
            kept
        });
        dropped
    }
}

impl FromIterator<Record> for SalesTable {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A record after final typing: the shape written to the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub row_id: usize,
    pub transaction_id: String,
    pub item: String,
    pub quantity: Option<i64>,
    pub price_per_unit: Option<f64>,
    pub total_spent: f64,
    pub payment_method: String,
    pub location: String,
    pub transaction_date: Option<NaiveDate>,
}

impl CleanRecord {
    /// Number of cells with no typed value (quantity, price, date).
    pub fn missing_count(&self) -> usize {
        [
            self.quantity.is_none(),
            self.price_per_unit.is_none(),
            self.transaction_date.is_none(),
        ]
        .into_iter()
        .filter(|missing| *missing)
        .count()
    }
}

// ============================================================================
// Imputation reporting
// ============================================================================

/// Outcome of a single imputation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// 1-based pass number.
    pub pass: usize,
    pub missing_before: usize,
    pub missing_after: usize,
    /// Cells filled during this pass.
    pub filled: usize,
}

/// Outcome of a full imputation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImputationReport {
    /// Missing cells before the seeding step.
    pub missing_before: usize,
    /// Prices filled by the per-item seeding step.
    pub seeded_prices: usize,
    /// Missing cells after seeding, before the first pass.
    pub missing_after_seed: usize,
    pub passes: Vec<PassReport>,
    /// True when the loop stopped because a pass made no progress.
    pub converged: bool,
    /// Cells filled per column over the whole run, seeding included.
    pub fills: BTreeMap<String, usize>,
}

impl ImputationReport {
    pub fn passes_run(&self) -> usize {
        self.passes.len()
    }

    pub fn missing_after(&self) -> usize {
        self.passes
            .last()
            .map_or(self.missing_after_seed, |p| p.missing_after)
    }

    pub fn total_filled(&self) -> usize {
        self.fills.values().sum()
    }

    pub(crate) fn record_fills(&mut self, field: Field, count: usize) {
        if count > 0 {
            *self
                .fills
                .entry(field.column_name().to_string())
                .or_insert(0) += count;
        }
    }
}

// ============================================================================
// Pipeline summary
// ============================================================================

/// Types of actions taken during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Sentinel markers were turned into missing values.
    SentinelCleared,
    /// Text was converted to a number.
    ValueCoerced,
    /// Text was parsed as a date.
    DateParsed,
    /// Rows were removed.
    RowsRemoved,
    /// Missing values were imputed.
    ValueImputed,
    /// Final column types were enforced.
    TypeEnforced,
}

impl ActionType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SentinelCleared => "Sentinel Cleared",
            Self::ValueCoerced => "Value Coerced",
            Self::DateParsed => "Date Parsed",
            Self::RowsRemoved => "Rows Removed",
            Self::ValueImputed => "Value Imputed",
            Self::TypeEnforced => "Type Enforced",
        }
    }
}

/// A single action taken during cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningAction {
    pub action_type: ActionType,
    /// Column name or "dataset".
    pub target: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CleaningAction {
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Counters and audit trail for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub duration_ms: u64,
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_removed: usize,
    /// Row ids removed because item, quantity and date/price were all missing.
    pub dropped_critical: Vec<usize>,
    /// Row ids removed because total or item stayed missing after imputation.
    pub dropped_incomplete: Vec<usize>,
    /// Missing cells right after normalization.
    pub missing_after_normalization: usize,
    /// Output cells with no typed value (quantity, price, date).
    pub remaining_missing: usize,
    /// Output text cells rendered with the missing placeholder.
    pub placeholder_cells: usize,
    pub actions: Vec<CleaningAction>,
    pub warnings: Vec<String>,
}

impl CleaningSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&mut self, action: CleaningAction) {
        self.actions.push(action);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn rows_removed_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed as f32 / self.rows_before as f32) * 100.0
        }
    }
}

/// What a dry run found: missing cells after normalization and the rows the
/// filter would remove. Nothing is imputed or written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningPreview {
    pub rows: usize,
    pub missing_by_column: BTreeMap<String, usize>,
    pub missing_total: usize,
    /// Row ids the critical-row filter would remove.
    pub would_drop: Vec<usize>,
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub success: bool,
    /// The cleaned table as a typed DataFrame.
    #[serde(skip)]
    pub data: DataFrame,
    pub records: Vec<CleanRecord>,
    pub summary: CleaningSummary,
    pub imputation: ImputationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_file: Option<PathBuf>,
}
