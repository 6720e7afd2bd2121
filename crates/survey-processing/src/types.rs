//! Shared result types returned to the calling layer.

use crate::weights::WeightedSummary;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One row of the report's summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub weighted_mean: f64,
    pub margin_of_error: f64,
}

impl ColumnSummary {
    pub fn new(column: impl Into<String>, summary: WeightedSummary) -> Self {
        Self {
            column: column.into(),
            weighted_mean: summary.weighted_mean,
            margin_of_error: summary.margin_of_error,
        }
    }
}

/// Everything a cleaning run hands back to the caller.
///
/// The caller owns the workflow log; the engine only produces it. A
/// superseded input dataset must not be used once this value exists.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// The transformed dataset.
    pub data: DataFrame,
    /// Ordered, human-readable record of each applied step and its effect.
    pub workflow_log: Vec<String>,
    /// Rule violations, in rule declaration order.
    pub violations: Vec<String>,
    /// Per-column weighted summaries for reporting.
    pub summaries: Vec<ColumnSummary>,
    /// Row count before any transformation.
    pub rows_before: usize,
    /// Row count of the transformed dataset.
    pub rows_after: usize,
    /// Rows flagged by the outlier detector (before resolution).
    pub outliers_detected: usize,
    /// Local wall-clock timestamp of the run.
    pub generated_at: String,
}
