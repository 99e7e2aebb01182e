//! Progress reporting for the cleaning pipeline.
//!
//! The pipeline emits a [`ProgressUpdate`] at every stage boundary and once
//! per imputation pass.
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_processing::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .process(df);
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the cleaning pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    /// Pipeline is initializing and reading rows
    Initializing,
    /// Sanitizing identifiers and categorical sentinels
    StringNormalization,
    /// Converting numeric text to numbers
    NumericCoercion,
    /// Parsing transaction dates
    DateParsing,
    /// Dropping unrecoverable rows
    RowFiltering,
    /// Iterative cross-column imputation
    Imputation,
    /// Final drop and output typing
    FinalTyping,
    /// Writing the cleaned dataset and report
    Saving,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl CleaningStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::StringNormalization => "Normalizing Strings",
            Self::NumericCoercion => "Coercing Numbers",
            Self::DateParsing => "Parsing Dates",
            Self::RowFiltering => "Filtering Rows",
            Self::Imputation => "Imputing Values",
            Self::FinalTyping => "Enforcing Types",
            Self::Saving => "Saving Output",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Returns the typical weight of this stage in the overall pipeline (0.0 - 1.0).
    ///
    /// Weights of the working stages sum to 1.0; terminal states weigh nothing.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.02,
            Self::StringNormalization => 0.08,
            Self::NumericCoercion => 0.10,
            Self::DateParsing => 0.10,
            Self::RowFiltering => 0.05,
            Self::Imputation => 0.45,
            Self::FinalTyping => 0.10,
            Self::Saving => 0.10,
            Self::Complete => 0.0,
            Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Initializing => 0.0,
            Self::StringNormalization => 0.02,
            Self::NumericCoercion => 0.10,
            Self::DateParsing => 0.20,
            Self::RowFiltering => 0.30,
            Self::Imputation => 0.35,
            Self::FinalTyping => 0.80,
            Self::Saving => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress update with optional sub-stage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: CleaningStage,

    /// Optional sub-stage description (e.g., "Pass 3/11")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,

    /// Number of items processed in current stage (imputation passes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    /// Total items in current stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage without sub-stage info.
    pub fn new(stage: CleaningStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Creates a new progress update with item counts.
    pub fn with_items(
        stage: CleaningStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            sub_stage: Some(sub_stage.into()),
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::new(stage, stage_progress, message)
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            progress: 1.0,
            ..Self::new(CleaningStage::Complete, 1.0, message)
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(CleaningStage::Failed, 0.0, message)
    }
}

/// Trait for receiving progress updates during cleaning.
///
/// Implementations must be `Send + Sync` so a pipeline can be moved to a
/// worker thread while updates are consumed elsewhere.
pub trait ProgressReporter: Send + Sync {
    /// Called when progress is made. Called once per imputation pass, so
    /// implementations should be cheap and non-blocking.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
static_assertions::assert_impl_all!(CleaningStage: Send, Sync, Copy);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WORKING_STAGES: [CleaningStage; 8] = [
        CleaningStage::Initializing,
        CleaningStage::StringNormalization,
        CleaningStage::NumericCoercion,
        CleaningStage::DateParsing,
        CleaningStage::RowFiltering,
        CleaningStage::Imputation,
        CleaningStage::FinalTyping,
        CleaningStage::Saving,
    ];

    #[test]
    fn test_stage_weights_sum() {
        let total_weight: f32 = WORKING_STAGES.iter().map(|s| s.weight()).sum();
        assert!((total_weight - 1.0).abs() < 0.01, "Weights should sum to ~1.0");
    }

    #[test]
    fn test_base_progress_is_cumulative() {
        let mut expected = 0.0;
        for stage in WORKING_STAGES {
            assert!(
                (stage.base_progress() - expected).abs() < 0.001,
                "{:?} starts at {} instead of {}",
                stage,
                stage.base_progress(),
                expected
            );
            expected += stage.weight();
        }
    }

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(CleaningStage::DateParsing, 0.5, "Parsing...");
        assert_eq!(update.stage, CleaningStage::DateParsing);
        assert!(update.sub_stage.is_none());
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_progress_update_with_items() {
        let update = ProgressUpdate::with_items(
            CleaningStage::Imputation,
            "Pass 2/11",
            2,
            11,
            "Imputation pass 2",
        );
        assert_eq!(update.sub_stage.as_deref(), Some("Pass 2/11"));
        assert_eq!(update.items_processed, Some(2));
        assert_eq!(update.items_total, Some(11));
        assert!(update.progress > CleaningStage::Imputation.base_progress());
    }

    #[test]
    fn test_progress_update_complete_and_failed() {
        let done = ProgressUpdate::complete("Done!");
        assert_eq!(done.stage, CleaningStage::Complete);
        assert_eq!(done.progress, 1.0);

        let failed = ProgressUpdate::failed("boom");
        assert_eq!(failed.stage, CleaningStage::Failed);
        assert_eq!(failed.progress, 0.0);
    }

    #[test]
    fn test_closure_progress_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::new(CleaningStage::RowFiltering, 0.5, "Test"));
        reporter.report(ProgressUpdate::complete("Done"));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stage_json_values() {
        let stage_expectations = [
            (CleaningStage::StringNormalization, "\"string_normalization\""),
            (CleaningStage::NumericCoercion, "\"numeric_coercion\""),
            (CleaningStage::FinalTyping, "\"final_typing\""),
            (CleaningStage::Complete, "\"complete\""),
        ];

        for (stage, expected_json) in stage_expectations {
            let json = serde_json::to_string(&stage).expect("Should serialize");
            assert_eq!(json, expected_json);
        }
    }

    #[test]
    fn test_progress_reporter_across_threads() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = Arc::new(ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let reporter_clone = reporter.clone();
        let handle = std::thread::spawn(move || {
            reporter_clone.report(ProgressUpdate::new(
                CleaningStage::Imputation,
                0.5,
                "Test from background thread",
            ));
        });

        handle.join().expect("Thread should not panic");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }
}
