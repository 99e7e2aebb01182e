//! Iterative cross-column imputation.
//!
//! The engine seeds missing prices from the per-item mode, then repeats a
//! fixed sequence of arithmetic and grouped-mode fills until a pass leaves the
//! missing-cell count unchanged or the pass cap is reached.

use super::grouped::GroupedModeImputer;
use super::relational::Relation;
use crate::config::{DEFAULT_MAX_ITERATIONS, PipelineConfig};
use crate::types::{Field, ImputationReport, PassReport, SalesTable};
use tracing::{debug, info};

/// One fill step inside a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputationStep {
    Arithmetic(Relation),
    Mode(GroupedModeImputer),
}

impl ImputationStep {
    pub fn target(&self) -> Field {
        match self {
            Self::Arithmetic(relation) => relation.target(),
            Self::Mode(imputer) => imputer.target(),
        }
    }

    pub fn apply(&self, table: &mut SalesTable) -> usize {
        match self {
            Self::Arithmetic(relation) => relation.apply(table),
            Self::Mode(imputer) => imputer.apply(table),
        }
    }
}

/// Seeding step run once before the loop.
pub const PRICE_SEED: GroupedModeImputer =
    GroupedModeImputer::new(Field::PricePerUnit, &[Field::Item]);

/// Steps of a single pass, in order. Each step sees what earlier steps of the
/// same pass wrote.
pub const PASS_STEPS: [ImputationStep; 7] = [
    ImputationStep::Arithmetic(Relation::PriceFromTotal),
    ImputationStep::Arithmetic(Relation::QuantityFromTotal),
    ImputationStep::Arithmetic(Relation::TotalFromParts),
    ImputationStep::Mode(GroupedModeImputer::new(
        Field::PaymentMethod,
        &[Field::Quantity, Field::Location],
    )),
    ImputationStep::Mode(GroupedModeImputer::new(
        Field::TransactionDate,
        &[Field::Item, Field::Quantity],
    )),
    ImputationStep::Mode(GroupedModeImputer::new(
        Field::Location,
        &[Field::Item, Field::Quantity],
    )),
    ImputationStep::Mode(GroupedModeImputer::new(
        Field::Item,
        &[Field::PricePerUnit, Field::Quantity],
    )),
];

/// Fixed-point imputation engine.
#[derive(Debug, Clone)]
pub struct IterativeImputer {
    max_iterations: usize,
    seed_price_by_item: bool,
}

impl Default for IterativeImputer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl IterativeImputer {
    /// Create an engine with the given pass cap (at least 1).
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            seed_price_by_item: true,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_iterations).with_price_seed(config.seed_price_by_item)
    }

    /// Enable or disable the per-item price seeding step.
    pub fn with_price_seed(mut self, enabled: bool) -> Self {
        self.seed_price_by_item = enabled;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Fill missing prices with the mode price of the same item.
    pub fn seed_prices(&self, table: &mut SalesTable) -> usize {
        PRICE_SEED.apply(table)
    }

    /// Run seeding and the pass loop without progress callbacks.
    pub fn impute(&self, table: &mut SalesTable) -> ImputationReport {
        self.run(table, |_| {})
    }

    /// Run seeding and the pass loop, calling `on_pass` after every pass.
    pub fn run<F>(&self, table: &mut SalesTable, mut on_pass: F) -> ImputationReport
    where
        F: FnMut(&PassReport),
    {
        let mut report = ImputationReport {
            missing_before: table.missing_count(),
            ..Default::default()
        };

        if self.seed_price_by_item {
            report.seeded_prices = self.seed_prices(table);
            report.record_fills(Field::PricePerUnit, report.seeded_prices);
        }
        report.missing_after_seed = table.missing_count();

        info!(
            "Imputing {} records: {} missing cells ({} after price seeding)",
            table.len(),
            report.missing_before,
            report.missing_after_seed
        );

        for pass in 1..=self.max_iterations {
            let missing_before = table.missing_count();
            let mut filled = 0;

            for step in &PASS_STEPS {
                let count = step.apply(table);
                report.record_fills(step.target(), count);
                filled += count;
            }

            let missing_after = table.missing_count();
            let pass_report = PassReport {
                pass,
                missing_before,
                missing_after,
                filled,
            };
            debug!(
                "Pass {}: {} -> {} missing ({} filled)",
                pass, missing_before, missing_after, filled
            );
            on_pass(&pass_report);
            report.passes.push(pass_report);

            if missing_after == missing_before {
                report.converged = true;
                break;
            }
        }

        info!(
            "Imputation finished after {} passes ({}): {} missing cells remain",
            report.passes_run(),
            if report.converged { "converged" } else { "pass cap reached" },
            report.missing_after()
        );

        report
    }
}
