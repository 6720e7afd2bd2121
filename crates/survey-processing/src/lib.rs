//! Data-Cleaning and Weighted-Statistics Engine
//!
//! A deterministic cleaning engine for tabular survey data built on Polars.
//! The surrounding application (routing, persistence, report rendering)
//! loads a dataset, calls into this engine with a per-request
//! [`CleaningConfig`], and receives back a transformed dataset plus an
//! ordered workflow log describing every applied step.
//!
//! # Overview
//!
//! - **Imputation**: mean, median, or KNN fills for missing numeric values
//! - **Outlier detection**: IQR fences, z-scores, or percentile bounds,
//!   flagged at row level
//! - **Outlier resolution**: row removal or global winsorizing
//! - **Rule validation**: declarative range and conditional-skip rules with
//!   human-readable violation messages
//! - **Survey weights**: weight-column attachment and weighted mean /
//!   margin-of-error summaries with an unweighted fallback
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use survey_processing::{CleaningConfig, CleaningPipeline, ImputeMethod, OutlierMethod};
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("survey.csv".into()))?
//!     .finish()?;
//!
//! let config = CleaningConfig::builder()
//!     .impute_method(ImputeMethod::Median)
//!     .outlier_method(OutlierMethod::Iqr)
//!     .weight_column("design_weight")
//!     .build()?;
//!
//! let outcome = CleaningPipeline::new(config).run(df)?;
//! for line in &outcome.workflow_log {
//!     println!("{line}");
//! }
//! ```
//!
//! Every operation is a pure function from an input dataset to an output
//! dataset; the engine holds no process-wide state and imposes no locking
//! on concurrent callers, as long as each invocation gets its own copy.

pub mod config;
pub mod error;
pub mod imputers;
pub mod outliers;
pub mod pipeline;
pub mod rules;
mod stats;
pub mod types;
pub mod utils;
pub mod weights;

// Re-exports for convenient access
pub use config::{
    CleaningConfig, CleaningConfigBuilder, ConfigValidationError, ImputeMethod, OutlierAction,
    OutlierMethod,
};
pub use error::{EngineError, Result};
pub use imputers::{Imputer, KnnImputer, StatisticalImputer};
pub use outliers::{OutlierDetector, OutlierResolver, mask_true_count};
pub use pipeline::CleaningPipeline;
pub use rules::{RangeRule, RuleSet, RuleValidator, SkipRule};
pub use types::{ColumnSummary, PipelineOutcome};
pub use weights::{WEIGHT_COLUMN, WeightApplier, WeightedSummary, WeightedSummaryCalculator};
