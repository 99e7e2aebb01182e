//! Sales Transaction Cleaning Library
//!
//! Cleans dirty sales transaction tables (number words, mixed date formats,
//! `UNKNOWN`/`ERROR` sentinels, malformed identifiers) into a typed,
//! minimally missing record set, built with Rust and Polars.
//!
//! # Overview
//!
//! The pipeline runs these stages in order:
//!
//! - **String Normalization**: identifier sanitization and categorical sentinel clearing
//! - **Numeric Coercion**: text (including English number words) to numbers
//! - **Date Parsing**: 18 day-first-leaning layouts after separator normalization
//! - **Row Filtering**: removal of rows too sparse to rebuild
//! - **Iterative Imputation**: arithmetic and grouped-mode fills until a fixed point
//! - **Final Typing**: last drop, integer quantities and placeholder text
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sales_processing::{Pipeline, PipelineConfig, dataset};
//!
//! let df = dataset::load_csv("data/dirty_cafe_sales.csv")?;
//!
//! let result = Pipeline::builder()
//!     .config(PipelineConfig::builder().output_dir("output").build()?)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//!
//! println!("Original rows: {}", result.summary.rows_before);
//! println!("Final rows: {}", result.summary.rows_after);
//! println!("Missing cells: {}", result.summary.remaining_missing);
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use sales_processing::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .max_iterations(11)           // Pass cap for the imputation loop
//!     .seed_price_by_item(true)     // Seed prices from the per-item mode
//!     .missing_placeholder("nan")   // Text for categoricals that stay missing
//!     .save_to_disk(false)          // Keep results in memory
//!     .build()?;
//! ```

pub mod cleaner;
pub mod config;
pub mod dataset;
pub mod error;
pub mod imputers;
pub mod pipeline;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{DataCleaner, TypeCorrector};
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use imputers::{GroupedModeImputer, IterativeImputer, Relation};
pub use pipeline::{
    CleaningStage, ClosureProgressReporter, Pipeline, PipelineBuilder, ProgressReporter,
    ProgressUpdate,
};
pub use reporting::{CleaningReport, ProcessingSummaryReport, ReportGenerator};
pub use types::{
    ActionType, Cell, CleanRecord, CleaningAction, CleaningPreview, CleaningSummary, Field,
    ImputationReport, PassReport, PipelineResult, RawRecord, Record, SalesTable,
};
