//! Grouped-mode imputation.
//!
//! A missing target cell is filled with the most frequent value of the target
//! column among records that share the same grouping key.

use crate::types::{Cell, Field, Record, SalesTable};
use crate::utils::mode_from_counts;
use std::collections::HashMap;
use tracing::debug;

/// Fills `target` with the per-group mode over `keys`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupedModeImputer {
    target: Field,
    keys: &'static [Field],
}

impl GroupedModeImputer {
    pub const fn new(target: Field, keys: &'static [Field]) -> Self {
        Self { target, keys }
    }

    pub fn target(&self) -> Field {
        self.target
    }

    pub fn keys(&self) -> &'static [Field] {
        self.keys
    }

    /// Grouping key of a record, or `None` if any key column is missing.
    fn group_key(&self, record: &Record) -> Option<Vec<Cell>> {
        self.keys
            .iter()
            .map(|field| {
                let cell = record.get(*field);
                (!cell.is_absent()).then_some(cell)
            })
            .collect()
    }

    /// Mode of the target column for every group that has at least one
    /// present target value.
    ///
    /// Ties resolve to the smallest value under [`Cell`] ordering.
    pub fn group_modes(&self, table: &SalesTable) -> HashMap<Vec<Cell>, Cell> {
        let mut counts: HashMap<Vec<Cell>, HashMap<Cell, usize>> = HashMap::new();

        for record in table.records() {
            let value = record.get(self.target);
            if value.is_absent() {
                continue;
            }
            if let Some(key) = self.group_key(record) {
                *counts.entry(key).or_default().entry(value).or_insert(0) += 1;
            }
        }

        counts
            .into_iter()
            .filter_map(|(key, values)| mode_from_counts(&values).map(|mode| (key, mode)))
            .collect()
    }

    /// Fill missing target cells from their group's mode.
    ///
    /// Modes are computed once from the table as it is on entry, so fills
    /// made here never feed back into this call. Returns the number of
    /// cells filled.
    pub fn apply(&self, table: &mut SalesTable) -> usize {
        let modes = self.group_modes(table);
        if modes.is_empty() {
            return 0;
        }

        let mut filled = 0;
        for record in table.records_mut() {
            if !record.is_missing(self.target) {
                continue;
            }
            let Some(key) = self.group_key(record) else {
                continue;
            };
            if let Some(mode) = modes.get(&key)
                && record.fill(self.target, mode.clone())
            {
                filled += 1;
            }
        }

        debug!(
            "Grouped mode {} by {:?}: filled {} cells from {} groups",
            self.target,
            self.keys,
            filled,
            modes.len()
        );
        filled
    }
}
