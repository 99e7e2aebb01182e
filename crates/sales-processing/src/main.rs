//! CLI entry point for the sales cleaning pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use polars::prelude::*;
use sales_processing::dataset::load_csv;
use sales_processing::{
    CleaningReport, Pipeline, PipelineConfig, PipelineConfigBuilder, PipelineResult,
    ReportGenerator,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Sales Transaction Cleaning Pipeline",
    long_about = "Cleans a dirty sales transaction CSV and imputes missing values from \
                  related columns.\n\n\
                  EXAMPLES:\n  \
                  # Basic usage\n  \
                  sales-processing -i dirty_cafe_sales.csv\n\n  \
                  # Custom output location and name\n  \
                  sales-processing -i dirty_cafe_sales.csv -o results/ --output-name cafe\n\n  \
                  # Dry run to preview missing values and dropped rows\n  \
                  sales-processing -i dirty_cafe_sales.csv --dry-run\n\n  \
                  # Machine-readable output\n  \
                  sales-processing -i dirty_cafe_sales.csv --json"
)]
struct Args {
    /// Path to the CSV file to process
    #[arg(short, long)]
    input: String,

    /// Output directory for results
    ///
    /// Defaults to the config file's value, or "output"
    #[arg(short, long)]
    output: Option<String>,

    /// Custom output file name (without extension)
    ///
    /// If not specified, uses "clean_data"
    #[arg(long)]
    output_name: Option<String>,

    /// Load pipeline settings from a JSON file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of imputation passes
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Skip seeding missing prices from the per-item mode
    #[arg(long)]
    no_price_seed: bool,

    /// Text written for payment methods and locations that stay missing
    #[arg(long)]
    placeholder: Option<String>,

    /// Preview missing values and dropped rows without processing
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    /// Useful for piping to other tools: `... --json | jq .processing_summary`
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables (RUST_LOG) before the filter reads them
    dotenv().ok();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = build_config(&args)?;

    info!("Loading dataset from: {}", args.input);
    let data = load_csv(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    if args.dry_run {
        return run_dry_run(&args, &config, &data);
    }

    let pipeline = build_pipeline(&args, config)?;

    run_pipeline(pipeline, &args, data)
}

/// Merge the optional config file with command-line overrides.
///
/// The JSON report is handled by the CLI (`--json`, `--emit-report`), so the
/// pipeline's own report is turned off.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let base = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            PipelineConfig::from_json_file(path)?
        }
        None => PipelineConfig::default(),
    };

    let mut builder = PipelineConfigBuilder::from_config(base).generate_reports(false);

    if let Some(ref output) = args.output {
        builder = builder.output_dir(output);
    }
    if let Some(ref name) = args.output_name {
        builder = builder.output_name(name);
    }
    if let Some(passes) = args.max_iterations {
        builder = builder.max_iterations(passes);
    }
    if args.no_price_seed {
        builder = builder.seed_price_by_item(false);
    }
    if let Some(ref placeholder) = args.placeholder {
        builder = builder.missing_placeholder(placeholder);
    }

    Ok(builder.build()?)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config).source(&args.input);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Run dry-run mode - show what would happen without processing
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
/// Unlike logging (`info!`, `debug!`), this output should always be visible
/// regardless of log level settings since it's the primary purpose of --dry-run.
fn run_dry_run(args: &Args, config: &PipelineConfig, data: &DataFrame) -> Result<()> {
    let pipeline = Pipeline::builder().config(config.clone()).build()?;
    let preview = pipeline.preview(data)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of cleaning actions");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input);
    println!("  Rows: {}", preview.rows);
    println!("  Columns: {}", data.width());
    println!();

    println!("MISSING AFTER NORMALIZATION");
    println!("{}", "-".repeat(40));
    println!("{:<20} {:<10} {:<10}", "Column", "Missing", "Missing %");
    println!("{}", "-".repeat(40));
    for (column, missing) in &preview.missing_by_column {
        let percent = if preview.rows == 0 {
            0.0
        } else {
            *missing as f64 / preview.rows as f64 * 100.0
        };
        println!("{:<20} {:<10} {:<10.1}", column, missing, percent);
    }
    println!("  Total missing cells: {}", preview.missing_total);
    println!();

    println!("UNRECOVERABLE ROWS");
    println!("{}", "-".repeat(40));
    if preview.would_drop.is_empty() {
        println!("  No rows would be removed");
    } else {
        println!("  Will remove {} rows", preview.would_drop.len());
        let shown: Vec<String> = preview
            .would_drop
            .iter()
            .take(10)
            .map(|row| row.to_string())
            .collect();
        println!("  Row numbers: {}", shown.join(", "));
        if preview.would_drop.len() > 10 {
            println!("  ... and {} more", preview.would_drop.len() - 10);
        }
    }
    println!();

    println!("PROPOSED ACTIONS");
    println!("{}", "-".repeat(40));
    println!("  1. Normalize identifiers, categories, numbers and dates");
    println!("  2. Remove unrecoverable rows");
    if config.seed_price_by_item {
        println!("  3. Seed missing prices from the per-item mode");
    }
    println!(
        "  4. Impute missing values (up to {} passes)",
        config.max_iterations
    );
    println!(
        "  5. Remove rows still missing total or item, write '{}' for missing categories",
        config.missing_placeholder
    );
    println!();

    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    println!(
        "  - {}/{}.csv",
        config.output_dir.display(),
        config.output_stem()
    );
    if args.emit_report {
        println!(
            "  - {}/{}_report.json",
            config.output_dir.display(),
            extract_file_stem(&args.input)
        );
    }
    println!();

    println!("{}", "=".repeat(80));
    println!("To execute this cleaning, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Run pipeline and print results
fn run_pipeline(pipeline: Pipeline, args: &Args, data: DataFrame) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting sales cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let original_shape = data.shape();

    match pipeline.process(data) {
        Ok(result) => handle_pipeline_output(&result, &pipeline, original_shape, args),
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Handle pipeline output based on CLI flags.
///
/// Output behavior:
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
/// - `--emit-report`: Write JSON report to file
fn handle_pipeline_output(
    result: &PipelineResult,
    pipeline: &Pipeline,
    original_shape: (usize, usize),
    args: &Args,
) -> Result<()> {
    let report = ReportGenerator::build_report(&args.input, result);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.emit_report {
        let generator = ReportGenerator::new(pipeline.config().output_dir.clone(), None);
        let report_path = generator.write_report_to_file(&report, &extract_file_stem(&args.input))?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(&report, original_shape, result.data.width());

    Ok(())
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Print a human-readable summary of the cleaning results.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(
    report: &CleaningReport,
    original_shape: (usize, usize),
    final_width: usize,
) {
    let summary = &report.processing_summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, original_shape.0, original_shape.1
    );
    match report.output_file {
        Some(ref output_file) => println!(
            "Output: {} ({} rows x {} columns)",
            output_file, summary.rows_after, final_width
        ),
        None => println!("Output: not written"),
    }
    println!();

    println!("Original rows: {}", summary.rows_before);
    println!("Final rows: {}", summary.rows_after);
    println!("Remaining missing cells: {}", summary.remaining_missing);
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows removed: {} ({:.1}%): {} unrecoverable, {} incomplete after imputation",
        summary.rows_removed,
        summary.rows_removed_percent,
        summary.dropped_critical,
        summary.dropped_incomplete
    );
    println!(
        "  Missing cells: {} after normalization, {} imputed",
        summary.missing_after_normalization, summary.cells_imputed
    );
    println!(
        "  Imputation: {} passes ({})",
        report.imputation.passes_run(),
        if report.imputation.converged {
            "converged"
        } else {
            "pass cap reached"
        }
    );
    println!("  Placeholder cells: {}", summary.placeholder_cells);
    println!();

    if !report.cleaning_actions.is_empty() {
        println!("Actions Taken:");
        for action in report.cleaning_actions.iter().take(10) {
            println!(
                "  - [{}] {}: {}",
                action.action_type.display_name(),
                action.target,
                action.description
            );
        }
        if report.cleaning_actions.len() > 10 {
            println!(
                "  ... and {} more actions",
                report.cleaning_actions.len() - 10
            );
        }
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save detailed JSON report");
    println!("{}", "=".repeat(80));
}
