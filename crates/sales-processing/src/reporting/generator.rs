use crate::error::{Result, ResultExt};
use crate::types::{CleaningAction, ImputationReport, PipelineResult};
use crate::utils::frame_null_counts;
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// ============================================================================
// Report Types
// ============================================================================

/// Report of one cleaning run, for CLI and library output.
///
/// Use this for both JSON output (`--json`) and file writing (`--emit-report`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    // Metadata
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path to the output file (if written)
    pub output_file: Option<String>,

    /// Row and missing-value counters
    pub processing_summary: ProcessingSummaryReport,

    /// Per-pass imputation statistics
    pub imputation: ImputationReport,

    /// Missing cells per output column
    pub missing_by_column: BTreeMap<String, usize>,

    /// Actions taken, in order
    pub cleaning_actions: Vec<CleaningAction>,
}

/// Row and missing-value counters for the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummaryReport {
    /// Total execution time in milliseconds
    pub duration_ms: u64,
    /// Number of rows read
    pub rows_before: usize,
    /// Number of rows written
    pub rows_after: usize,
    /// Number of rows removed
    pub rows_removed: usize,
    /// Percentage of rows removed
    pub rows_removed_percent: f32,
    /// Rows removed before imputation
    pub dropped_critical: usize,
    /// Rows removed after imputation
    pub dropped_incomplete: usize,
    /// Missing cells after normalization
    pub missing_after_normalization: usize,
    /// Cells imputed by the engine
    pub cells_imputed: usize,
    /// Output cells still without a typed value
    pub remaining_missing: usize,
    /// Output cells written as the missing placeholder
    pub placeholder_cells: usize,
    /// Warnings generated during processing
    pub warnings: Vec<String>,
}

pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self { output_dir, output_name }
    }

    fn file_stem(&self) -> &str {
        self.output_name
            .as_deref()
            .unwrap_or(crate::config::DEFAULT_OUTPUT_NAME)
    }

    /// Write the cleaned dataset as `<output_dir>/<name>.csv`.
    pub fn save_dataset(&self, df: &mut DataFrame) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .context(format!("Creating {}", self.output_dir.display()))?;
        let output_path = self.output_dir.join(format!("{}.csv", self.file_stem()));
        let mut file = File::create(&output_path)
            .context(format!("Creating {}", output_path.display()))?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(df)
            .context(format!("Writing {}", output_path.display()))?;

        info!("Dataset saved: {}", output_path.display());

        self.verify_output(&output_path, df.width())?;

        Ok(output_path)
    }

    /// Re-read the header line of a written file and warn when it does not
    /// match the frame's column count.
    fn verify_output(&self, path: &Path, expected_width: usize) -> Result<()> {
        let content = fs::read_to_string(path)?;
        let header_width = content
            .lines()
            .next()
            .map_or(0, |line| line.split(',').count());

        if header_width != expected_width {
            warn!(
                "Output file {} has {} header fields, expected {}",
                path.display(),
                header_width,
                expected_width
            );
        } else {
            debug!("Output verification passed: {} columns", header_width);
        }

        Ok(())
    }

    /// Build a report from pipeline results.
    ///
    /// The report can be serialized to stdout (`--json`), written to a file
    /// (`--emit-report`) or used programmatically.
    pub fn build_report(input_file: &str, result: &PipelineResult) -> CleaningReport {
        let summary = &result.summary;

        let processing_summary = ProcessingSummaryReport {
            duration_ms: summary.duration_ms,
            rows_before: summary.rows_before,
            rows_after: summary.rows_after,
            rows_removed: summary.rows_removed,
            rows_removed_percent: summary.rows_removed_percentage(),
            dropped_critical: summary.dropped_critical.len(),
            dropped_incomplete: summary.dropped_incomplete.len(),
            missing_after_normalization: summary.missing_after_normalization,
            cells_imputed: result.imputation.total_filled(),
            remaining_missing: summary.remaining_missing,
            placeholder_cells: summary.placeholder_cells,
            warnings: summary.warnings.clone(),
        };

        let missing_by_column = frame_null_counts(&result.data).into_iter().collect();

        CleaningReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            output_file: result
                .output_file
                .as_ref()
                .map(|p| p.display().to_string()),
            processing_summary,
            imputation: result.imputation.clone(),
            missing_by_column,
            cleaning_actions: summary.actions.clone(),
        }
    }

    /// Write a report to a JSON file.
    ///
    /// The report is written to the output directory with the specified base name.
    /// For example, if `report_base_name` is "sales", the file will be "sales_report.json".
    pub fn write_report_to_file(
        &self,
        report: &CleaningReport,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}
