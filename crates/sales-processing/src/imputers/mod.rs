//! Imputation module for handling missing values.
//!
//! This module provides the cross-column imputation engine:
//! - Arithmetic fills from `total = quantity × price`
//! - Grouped-mode fills from correlated columns
//! - The iterative fixed-point loop that combines them

mod grouped;
mod iterative;
mod relational;

pub use grouped::GroupedModeImputer;
pub use iterative::{ImputationStep, IterativeImputer, PASS_STEPS, PRICE_SEED};
pub use relational::Relation;
