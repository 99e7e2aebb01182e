//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the cleaning workflow.

use crate::cleaner::{ColumnStats, CoercionStats, DataCleaner, TypeCorrector};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::dataset::{clean_records_to_frame, raw_records_from_frame};
use crate::error::{CleaningError, Result, ResultExt};
use crate::imputers::IterativeImputer;
use crate::pipeline::progress::{
    ClosureProgressReporter, CleaningStage, ProgressReporter, ProgressUpdate,
};
use crate::reporting::ReportGenerator;
use crate::types::{
    ActionType, CleanRecord, CleaningAction, CleaningPreview, CleaningSummary, PipelineResult,
    RawRecord,
};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Share of removed rows above which a run carries a data-loss warning.
const HIGH_LOSS_PERCENT: f32 = 30.0;

/// The main cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use sales_processing::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().save_to_disk(false).build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(dataframe)?;
///
/// println!("{} rows left", result.summary.rows_after);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    source: String,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cleaner: DataCleaner,
    imputer: IterativeImputer,
    reporter: ReportGenerator,
    type_corrector: TypeCorrector,
}

// Ensure Pipeline is Send (can be moved to another thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Clean a DataFrame holding the eight sales columns.
    ///
    /// Columns may be of any type; they are read as text.
    ///
    /// # Errors
    ///
    /// Returns [`CleaningError::ColumnNotFound`] when a sales column is absent
    /// and [`CleaningError::NoDataLoaded`] for a frame without columns.
    /// Malformed cell content never fails a run.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Initializing,
            0.0,
            "Reading rows...",
        ));
        let outcome = raw_records_from_frame(&df).and_then(|raw| self.process_internal(&raw));
        self.finish(outcome)
    }

    /// Clean rows that were already read.
    pub fn process_records(&self, raw: &[RawRecord]) -> Result<PipelineResult> {
        self.finish(self.process_internal(raw))
    }

    /// Run normalization and the row filter only, reporting what a full run
    /// would start from.
    pub fn preview(&self, df: &DataFrame) -> Result<CleaningPreview> {
        let raw = raw_records_from_frame(df)?;
        let (mut table, _) = self.cleaner.normalize_strings(&raw);
        self.cleaner.coerce_numerics(&raw, &mut table)?;
        self.cleaner.parse_dates(&raw, &mut table)?;

        let missing_by_column = table.missing_by_column();
        let missing_total = table.missing_count();
        let would_drop = self.cleaner.drop_critical_rows(&mut table);

        Ok(CleaningPreview {
            rows: raw.len(),
            missing_by_column,
            missing_total,
            would_drop,
        })
    }

    fn finish(&self, outcome: Result<PipelineResult>) -> Result<PipelineResult> {
        match outcome {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, raw: &[RawRecord]) -> Result<PipelineResult> {
        let start_time = Instant::now();

        info!("Starting cleaning pipeline on {} rows...", raw.len());
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Initializing,
            1.0,
            format!("Loaded {} rows", raw.len()),
        ));

        let mut summary = CleaningSummary::new();
        summary.rows_before = raw.len();
        if raw.is_empty() {
            summary.add_warning("Input contains no rows");
        }

        // Step 1: Identifiers and categorical sentinels
        self.report_progress(ProgressUpdate::new(
            CleaningStage::StringNormalization,
            0.0,
            "Normalizing strings...",
        ));
        info!("Step 1: Normalizing identifiers and categories...");
        let (mut table, text_stats) = self.cleaner.normalize_strings(raw);
        record_column_actions(&mut summary, &text_stats);

        // Step 2: Numeric columns
        self.report_progress(ProgressUpdate::new(
            CleaningStage::NumericCoercion,
            0.0,
            "Coercing numeric columns...",
        ));
        info!("Step 2: Coercing numeric columns...");
        let numeric_stats = self
            .cleaner
            .coerce_numerics(raw, &mut table)
            .context("Numeric coercion")?;
        record_column_actions(&mut summary, &numeric_stats);

        // Step 3: Dates
        self.report_progress(ProgressUpdate::new(
            CleaningStage::DateParsing,
            0.0,
            "Parsing transaction dates...",
        ));
        info!("Step 3: Parsing transaction dates...");
        let date_stats = self
            .cleaner
            .parse_dates(raw, &mut table)
            .context("Date parsing")?;
        record_date_action(&mut summary, &date_stats);

        summary.missing_after_normalization = table.missing_count();
        info!(
            "{} missing cells after normalization",
            summary.missing_after_normalization
        );

        // Step 4: Unrecoverable rows
        self.report_progress(ProgressUpdate::new(
            CleaningStage::RowFiltering,
            0.0,
            "Removing unrecoverable rows...",
        ));
        info!("Step 4: Removing unrecoverable rows...");
        let dropped = self.cleaner.drop_critical_rows(&mut table);
        if !dropped.is_empty() {
            summary.add_action(CleaningAction::new(
                ActionType::RowsRemoved,
                "dataset",
                format!(
                    "Removed {} rows missing item, quantity and date or price",
                    dropped.len()
                ),
            ));
        }
        summary.dropped_critical = dropped;

        // Step 5: Imputation
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Imputation,
            0.0,
            "Imputing missing values...",
        ));
        info!("Step 5: Imputing missing values...");
        let total_passes = self.imputer.max_iterations();
        let imputation = self.imputer.run(&mut table, |pass| {
            self.report_progress(ProgressUpdate::with_items(
                CleaningStage::Imputation,
                format!("Pass {}/{}", pass.pass, total_passes),
                pass.pass,
                total_passes,
                format!(
                    "Pass {}: {} missing cells remain",
                    pass.pass, pass.missing_after
                ),
            ));
        });
        for (column, count) in &imputation.fills {
            summary.add_action(CleaningAction::new(
                ActionType::ValueImputed,
                column.clone(),
                format!("Imputed {} values", count),
            ));
        }
        if !imputation.converged {
            summary.add_warning(format!(
                "Imputation stopped at the pass cap ({}) while still making progress",
                total_passes
            ));
        }

        // Step 6: Final drop and output types
        self.report_progress(ProgressUpdate::new(
            CleaningStage::FinalTyping,
            0.0,
            "Enforcing final types...",
        ));
        info!("Step 6: Enforcing final types...");
        let typed = self
            .type_corrector
            .enforce_final_types(table, &self.config.missing_placeholder);
        if !typed.dropped.is_empty() {
            summary.add_action(CleaningAction::new(
                ActionType::RowsRemoved,
                "dataset",
                format!(
                    "Removed {} rows still missing total or item",
                    typed.dropped.len()
                ),
            ));
        }
        summary.add_action(
            CleaningAction::new(
                ActionType::TypeEnforced,
                "Quantity",
                "Cast to integer by truncation",
            )
            .with_details(format!(
                "{} categorical cells written as '{}'",
                typed.placeholder_cells, self.config.missing_placeholder
            )),
        );

        let data = clean_records_to_frame(&typed.records).context("Building output frame")?;

        summary.dropped_incomplete = typed.dropped;
        summary.placeholder_cells = typed.placeholder_cells;
        summary.rows_after = typed.records.len();
        summary.rows_removed = summary.rows_before.saturating_sub(summary.rows_after);
        summary.remaining_missing = typed.records.iter().map(CleanRecord::missing_count).sum();

        if summary.rows_removed_percentage() > HIGH_LOSS_PERCENT {
            let message = format!(
                "High data loss: {:.1}% of rows were removed",
                summary.rows_removed_percentage()
            );
            warn!("{}", message);
            summary.add_warning(message);
        }
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        let mut result = PipelineResult {
            success: true,
            data,
            records: typed.records,
            summary,
            imputation,
            output_file: None,
            report_file: None,
        };

        // Step 7: Output files
        if self.config.save_to_disk {
            self.save_outputs(&mut result)?;
        }
        result.summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Pipeline finished: {} -> {} rows, {} missing cells remain",
            result.summary.rows_before, result.summary.rows_after, result.summary.remaining_missing
        );

        Ok(result)
    }

    fn save_outputs(&self, result: &mut PipelineResult) -> Result<()> {
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Saving,
            0.0,
            "Saving output files...",
        ));
        info!("Step 7: Saving output files...");

        let output_file = self
            .reporter
            .save_dataset(&mut result.data)
            .map_err(|e| CleaningError::stage("saving", e.to_string()))?;
        result.output_file = Some(output_file);

        if self.config.generate_reports {
            let report = ReportGenerator::build_report(&self.source, result);
            let report_file = self
                .reporter
                .write_report_to_file(&report, self.config.output_stem())
                .map_err(|e| CleaningError::stage("saving", e.to_string()))?;
            result.report_file = Some(report_file);
        }

        self.report_progress(ProgressUpdate::new(
            CleaningStage::Saving,
            1.0,
            "Output files saved",
        ));
        Ok(())
    }
}

/// Add one action per column for values converted or cleared.
fn record_column_actions(summary: &mut CleaningSummary, stats: &ColumnStats) {
    for (column, stats) in stats {
        if stats.numerals > 0 {
            summary.add_action(CleaningAction::new(
                ActionType::ValueCoerced,
                column.clone(),
                format!("Converted {} numbers written in words", stats.numerals),
            ));
        }
        if stats.cleared() > 0 {
            summary.add_action(
                CleaningAction::new(
                    ActionType::SentinelCleared,
                    column.clone(),
                    format!("Cleared {} unusable values", stats.cleared()),
                )
                .with_details(format!(
                    "{} sentinels, {} unparseable",
                    stats.sentinels, stats.unparseable
                )),
            );
        }
    }
}

fn record_date_action(summary: &mut CleaningSummary, stats: &CoercionStats) {
    summary.add_action(
        CleaningAction::new(
            ActionType::DateParsed,
            "Transaction Date",
            format!("Parsed {} dates", stats.parsed),
        )
        .with_details(format!(
            "{} sentinels, {} unparseable",
            stats.sentinels, stats.unparseable
        )),
    );
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
///
/// # Example
///
/// ```rust,ignore
/// use sales_processing::{Pipeline, PipelineConfig};
///
/// let pipeline = Pipeline::builder()
///     .config(PipelineConfig::default())
///     .source("data/dirty_cafe_sales.csv")
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?;
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    source: Option<String>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Ensure PipelineBuilder is Send (can be moved to another thread during construction)
static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Name of the input, recorded in generated reports.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use sales_processing::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct MyReporter;
    ///
    /// impl ProgressReporter for MyReporter {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         println!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(MyReporter))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        // Create report generator with config's output settings
        let reporter = ReportGenerator::new(config.output_dir.clone(), config.output_name.clone());

        Ok(Pipeline {
            imputer: IterativeImputer::from_config(&config),
            config,
            source: self.source.unwrap_or_else(|| "<dataframe>".to_string()),
            progress_reporter: self.progress_reporter,
            cleaner: DataCleaner,
            reporter,
            type_corrector: TypeCorrector,
        })
    }
}
