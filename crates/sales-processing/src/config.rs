//! Configuration types for the cleaning pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use crate::error::{CleaningError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default cap on imputation passes.
pub const DEFAULT_MAX_ITERATIONS: usize = 11;

/// Default text written for categorical values that stay missing.
pub const DEFAULT_MISSING_PLACEHOLDER: &str = "nan";

/// Default output file stem.
pub const DEFAULT_OUTPUT_NAME: &str = "clean_data";

/// Configuration for the cleaning pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use sales_processing::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .max_iterations(5)
///     .missing_placeholder("Unknown")
///     .save_to_disk(false)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of imputation passes.
    /// Default: 11
    pub max_iterations: usize,

    /// Whether to seed missing prices with the per-item mode before the loop.
    /// Default: true
    pub seed_price_by_item: bool,

    /// Text written for categorical cells that are still missing at the end.
    /// Default: "nan"
    pub missing_placeholder: String,

    /// Output directory for the cleaned dataset and report.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Custom output file name (without extension).
    /// If None, uses "clean_data".
    /// Default: None
    pub output_name: Option<String>,

    /// Whether to write the cleaned dataset to disk.
    /// When false, results are kept in memory only.
    /// Default: true
    pub save_to_disk: bool,

    /// Whether to write a JSON report next to the cleaned dataset.
    /// Only honoured when `save_to_disk` is true.
    /// Default: true
    pub generate_reports: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed_price_by_item: true,
            missing_placeholder: DEFAULT_MISSING_PLACEHOLDER.to_string(),
            output_dir: PathBuf::from("output"),
            output_name: None,
            save_to_disk: true,
            generate_reports: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.max_iterations == 0 {
            return Err(ConfigValidationError::InvalidMaxIterations(
                self.max_iterations,
            ));
        }

        if self.missing_placeholder.is_empty() {
            return Err(ConfigValidationError::EmptyPlaceholder);
        }

        if let Some(name) = &self.output_name
            && (name.is_empty() || name.contains(['/', '\\']))
        {
            return Err(ConfigValidationError::InvalidOutputName(name.clone()));
        }

        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Reading config file {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate().map_err(CleaningError::from)?;
        Ok(config)
    }

    /// File stem used for the cleaned dataset and the report.
    pub fn output_stem(&self) -> &str {
        self.output_name.as_deref().unwrap_or(DEFAULT_OUTPUT_NAME)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid max iterations: {0} (must be at least 1)")]
    InvalidMaxIterations(usize),

    #[error("Missing-value placeholder must not be empty")]
    EmptyPlaceholder,

    #[error("Invalid output name '{0}' (must be a non-empty file stem)")]
    InvalidOutputName(String),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    max_iterations: Option<usize>,
    seed_price_by_item: Option<bool>,
    missing_placeholder: Option<String>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    save_to_disk: Option<bool>,
    generate_reports: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Start from an existing configuration instead of the defaults.
    pub fn from_config(config: PipelineConfig) -> Self {
        Self {
            max_iterations: Some(config.max_iterations),
            seed_price_by_item: Some(config.seed_price_by_item),
            missing_placeholder: Some(config.missing_placeholder),
            output_dir: Some(config.output_dir),
            output_name: config.output_name,
            save_to_disk: Some(config.save_to_disk),
            generate_reports: Some(config.generate_reports),
        }
    }

    /// Set the maximum number of imputation passes.
    ///
    /// The loop also stops early as soon as a pass fills nothing.
    pub fn max_iterations(mut self, passes: usize) -> Self {
        self.max_iterations = Some(passes);
        self
    }

    /// Enable or disable seeding missing prices with the per-item mode.
    pub fn seed_price_by_item(mut self, seed: bool) -> Self {
        self.seed_price_by_item = Some(seed);
        self
    }

    /// Set the text written for categorical values that remain missing.
    pub fn missing_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.missing_placeholder = Some(placeholder.into());
        self
    }

    /// Set the output directory for the cleaned dataset and report.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set a custom output file name (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Enable or disable saving the cleaned dataset to disk.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Enable or disable the JSON report.
    pub fn generate_reports(mut self, generate: bool) -> Self {
        self.generate_reports = Some(generate);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            max_iterations: self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            seed_price_by_item: self.seed_price_by_item.unwrap_or(true),
            missing_placeholder: self
                .missing_placeholder
                .unwrap_or_else(|| DEFAULT_MISSING_PLACEHOLDER.to_string()),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("output")),
            output_name: self.output_name,
            save_to_disk: self.save_to_disk.unwrap_or(true),
            generate_reports: self.generate_reports.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}
