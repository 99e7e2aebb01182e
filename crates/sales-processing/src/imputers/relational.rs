//! Arithmetic imputation from `total = quantity × price`.

use crate::types::{Cell, Field, Record, SalesTable};
use tracing::debug;

/// One way of deriving a numeric column from the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `price_per_unit = total_spent / quantity`
    PriceFromTotal,
    /// `quantity = total_spent / price_per_unit`
    QuantityFromTotal,
    /// `total_spent = quantity × price_per_unit`
    TotalFromParts,
}

impl Relation {
    /// Relations in the order a pass applies them.
    pub const ALL: [Relation; 3] = [
        Relation::PriceFromTotal,
        Relation::QuantityFromTotal,
        Relation::TotalFromParts,
    ];

    pub fn target(&self) -> Field {
        match self {
            Self::PriceFromTotal => Field::PricePerUnit,
            Self::QuantityFromTotal => Field::Quantity,
            Self::TotalFromParts => Field::TotalSpent,
        }
    }

    /// Value implied by the other two columns, if both are present and the
    /// result is finite.
    pub fn derive(&self, record: &Record) -> Option<f64> {
        let value = match self {
            Self::PriceFromTotal => record.total_spent? / record.quantity?,
            Self::QuantityFromTotal => record.total_spent? / record.price_per_unit?,
            Self::TotalFromParts => record.quantity? * record.price_per_unit?,
        };
        value.is_finite().then_some(value)
    }

    /// Fill the target column wherever it is missing and derivable.
    /// Returns the number of cells filled.
    pub fn apply(&self, table: &mut SalesTable) -> usize {
        let target = self.target();
        let mut filled = 0;

        for record in table.records_mut() {
            if !record.is_missing(target) {
                continue;
            }
            if let Some(value) = self.derive(record)
                && record.fill(target, Cell::Number(value))
            {
                filled += 1;
            }
        }

        debug!("{:?}: filled {} cells", self, filled);
        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triad(qty: Option<f64>, price: Option<f64>, total: Option<f64>) -> Record {
        Record {
            quantity: qty,
            price_per_unit: price,
            total_spent: total,
            ..Record::new(0, "T")
        }
    }

    #[test]
    fn test_derive() {
        let record = triad(Some(2.0), None, Some(4.0));
        assert_eq!(Relation::PriceFromTotal.derive(&record), Some(2.0));

        let record = triad(None, Some(1.5), Some(6.0));
        assert_eq!(Relation::QuantityFromTotal.derive(&record), Some(4.0));

        let record = triad(Some(3.0), Some(2.5), None);
        assert_eq!(Relation::TotalFromParts.derive(&record), Some(7.5));
    }

    #[test]
    fn test_zero_divisor_never_fills() {
        let mut table = SalesTable::new(vec![
            triad(Some(0.0), None, Some(5.0)),
            triad(Some(0.0), None, Some(0.0)),
        ]);

        assert_eq!(Relation::PriceFromTotal.apply(&mut table), 0);
        assert!(table.records().iter().all(|r| r.price_per_unit.is_none()));
    }

    #[test]
    fn test_missing_operand_never_fills() {
        let mut table = SalesTable::new(vec![triad(None, None, Some(5.0))]);
        for relation in Relation::ALL {
            assert_eq!(relation.apply(&mut table), 0);
        }
    }

    #[test]
    fn test_present_value_is_not_overwritten() {
        let mut table = SalesTable::new(vec![triad(Some(2.0), Some(2.0), Some(5.0))]);

        for relation in Relation::ALL {
            assert_eq!(relation.apply(&mut table), 0);
        }
        assert_eq!(table.records()[0].total_spent, Some(5.0));
    }
}
