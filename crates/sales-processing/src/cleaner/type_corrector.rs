//! Final type enforcement: the last drop and the output column types.

use crate::types::{CleanRecord, Record, SalesTable};
use tracing::debug;

/// Result of the final typing stage.
#[derive(Debug, Clone, Default)]
pub struct FinalTyping {
    pub records: Vec<CleanRecord>,
    /// Row ids removed because total or item was still missing.
    pub dropped: Vec<usize>,
    /// Payment/location cells rendered with the placeholder.
    pub placeholder_cells: usize,
}

/// Type corrector for converting imputed records to their output types.
pub struct TypeCorrector;

impl TypeCorrector {
    /// Drop unusable records and convert the rest to [`CleanRecord`]s.
    ///
    /// - records still missing `total_spent` or `item` are dropped;
    /// - `quantity` is truncated toward zero (missing stays missing);
    /// - missing `payment_method`/`location` become `placeholder`;
    /// - prices, totals and dates keep their types.
    pub fn enforce_final_types(&self, table: SalesTable, placeholder: &str) -> FinalTyping {
        let mut output = FinalTyping::default();

        for record in table.into_records() {
            match self.convert_record(record, placeholder, &mut output.placeholder_cells) {
                Ok(clean) => output.records.push(clean),
                Err(row_id) => output.dropped.push(row_id),
            }
        }

        debug!(
            "Final typing kept {} records, dropped {}, {} placeholder cells",
            output.records.len(),
            output.dropped.len(),
            output.placeholder_cells
        );

        output
    }

    /// Convert one record, or return its row id when it must be dropped.
    fn convert_record(
        &self,
        record: Record,
        placeholder: &str,
        placeholder_cells: &mut usize,
    ) -> Result<CleanRecord, usize> {
        let (Some(total_spent), Some(item)) = (record.total_spent, record.item) else {
            return Err(record.row_id);
        };

        let mut render = |value: Option<String>| {
            value.unwrap_or_else(|| {
                *placeholder_cells += 1;
                placeholder.to_string()
            })
        };

        Ok(CleanRecord {
            row_id: record.row_id,
            transaction_id: record.transaction_id,
            item,
            quantity: record.quantity.map(|q| q.trunc() as i64),
            price_per_unit: record.price_per_unit,
            total_spent,
            payment_method: render(record.payment_method),
            location: render(record.location),
            transaction_date: record.transaction_date,
        })
    }
}
