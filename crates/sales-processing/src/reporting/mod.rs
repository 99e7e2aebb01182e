//! Report generation module.
//!
//! This module provides functionality for writing the cleaned dataset and
//! generating run reports.
//!
//! # Reports
//!
//! Use [`CleaningReport`] for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_processing::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report("data/dirty_cafe_sales.csv", &result);
//!
//! // Print as JSON
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! // Or write to file
//! let generator = ReportGenerator::new(PathBuf::from("output"), None);
//! generator.write_report_to_file(&report, "dirty_cafe_sales")?;
//! ```

mod generator;

pub use generator::{CleaningReport, ProcessingSummaryReport, ReportGenerator};
