//! CLI entry point for the survey cleaning engine.
//!
//! Stands in for the web routes: loads a CSV, runs the cleaning pipeline
//! with the requested strategies, prints the workflow log and summary
//! table, and optionally writes the cleaned dataset back out.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::PathBuf;
use survey_processing::{
    CleaningConfig, CleaningPipeline, ImputeMethod, OutlierAction, OutlierMethod, RuleSet,
};
use tracing::{info, warn};

/// CLI-compatible imputation strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliImputeMethod {
    /// Use the mean of non-null values
    Mean,
    /// Use the median of non-null values
    Median,
    /// Use K-Nearest Neighbors imputation
    Knn,
    /// Leave missing values in place
    None,
}

impl From<CliImputeMethod> for ImputeMethod {
    fn from(cli: CliImputeMethod) -> Self {
        match cli {
            CliImputeMethod::Mean => ImputeMethod::Mean,
            CliImputeMethod::Median => ImputeMethod::Median,
            CliImputeMethod::Knn => ImputeMethod::Knn,
            CliImputeMethod::None => ImputeMethod::None,
        }
    }
}

/// CLI-compatible outlier detection enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierMethod {
    /// IQR fences (Q1 - 1.5*IQR, Q3 + 1.5*IQR)
    Iqr,
    /// Absolute z-score above 3
    Zscore,
    /// Outside the 1st/99th percentiles
    Winsorize,
    /// No detection
    None,
}

impl From<CliOutlierMethod> for OutlierMethod {
    fn from(cli: CliOutlierMethod) -> Self {
        match cli {
            CliOutlierMethod::Iqr => OutlierMethod::Iqr,
            CliOutlierMethod::Zscore => OutlierMethod::ZScore,
            CliOutlierMethod::Winsorize => OutlierMethod::Winsorize,
            CliOutlierMethod::None => OutlierMethod::None,
        }
    }
}

/// CLI-compatible outlier action enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierAction {
    /// Delete flagged rows
    Remove,
    /// Clamp numeric columns to percentile bounds
    Winsorize,
}

impl From<CliOutlierAction> for OutlierAction {
    fn from(cli: CliOutlierAction) -> Self {
        match cli {
            CliOutlierAction::Remove => OutlierAction::Remove,
            CliOutlierAction::Winsorize => OutlierAction::Winsorize,
        }
    }
}

/// Clean tabular survey data and report weighted summaries.
#[derive(Parser, Debug)]
#[command(name = "survey-processing", version, about)]
struct Args {
    /// Input CSV file
    input: PathBuf,

    /// Imputation strategy for missing numeric values
    #[arg(long, value_enum, default_value = "none")]
    impute: CliImputeMethod,

    /// Outlier detection strategy
    #[arg(long, value_enum, default_value = "none")]
    outliers: CliOutlierMethod,

    /// Action taken on detected outliers
    #[arg(long, value_enum, default_value = "winsorize")]
    action: CliOutlierAction,

    /// Column holding the survey weights
    #[arg(long)]
    weight_col: Option<String>,

    /// JSON file with validation rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Write the cleaned dataset to this CSV file
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(args.input.clone()))
        .with_context(|| format!("Failed to open {}", args.input.display()))?
        .finish()
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    info!("Loaded {} rows from {}", df.height(), args.input.display());

    let mut builder = CleaningConfig::builder()
        .impute_method(args.impute.into())
        .outlier_method(args.outliers.into())
        .outlier_action(args.action.into());
    if let Some(weight_col) = &args.weight_col {
        builder = builder.weight_column(weight_col);
    }
    if let Some(rules_path) = &args.rules {
        let raw = std::fs::read_to_string(rules_path)
            .with_context(|| format!("Failed to read {}", rules_path.display()))?;
        // A bad rules file downgrades to a warning; the run still happens
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => match RuleSet::from_value(&value) {
                Ok(rules) => builder = builder.rules(rules),
                Err(e) => warn!("Ignoring rules from {}: {}", rules_path.display(), e),
            },
            Err(e) => warn!("Invalid JSON in rules configuration: {}", e),
        }
    }
    let config = builder.build()?;

    let outcome = CleaningPipeline::new(config).run(df)?;

    println!("Workflow log:");
    for line in &outcome.workflow_log {
        println!("  - {line}");
    }

    if !outcome.summaries.is_empty() {
        println!("\nSummary (95% CI):");
        for summary in &outcome.summaries {
            println!(
                "  {:<24} mean {:>12.4}   +/- {:>10.4}",
                summary.column, summary.weighted_mean, summary.margin_of_error
            );
        }
    }

    if let Some(output) = &args.output {
        let mut data = outcome.data;
        let mut file = std::fs::File::create(output)
            .with_context(|| format!("Failed to create {}", output.display()))?;
        CsvWriter::new(&mut file).finish(&mut data)?;
        println!("\nCleaned dataset written to {}", output.display());
    }

    Ok(())
}
