//! Survey weights and weighted summary statistics.
//!
//! Weighted estimates use the standard survey formulas: a weighted mean, a
//! weighted variance around it, and a 95% normal-approximation margin of
//! error. Degenerate inputs (no pairwise-complete rows, zero total weight)
//! surface as [`EngineError::DegenerateStatistic`] so the caller can fall
//! back to the unweighted estimate.

use crate::error::{EngineError, Result};
use crate::stats::{mean, sample_std};
use crate::utils::column_f64;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the column the applier writes.
pub const WEIGHT_COLUMN: &str = "weight";

/// Critical value for a 95% confidence interval.
const Z_95: f64 = 1.96;

/// Copies a source column into the canonical `weight` column.
pub struct WeightApplier;

impl WeightApplier {
    /// Attach survey weights and return the new dataset.
    ///
    /// Adds (or overwrites) a column named `weight` with the values of
    /// `weight_column`; all other columns and row order are unchanged.
    ///
    /// # Errors
    ///
    /// `ColumnNotFound` when `weight_column` is absent.
    pub fn apply(df: &DataFrame, weight_column: &str, steps: &mut Vec<String>) -> Result<DataFrame> {
        let mut result_df = df.clone();
        let source = result_df
            .column(weight_column)
            .map_err(|_| EngineError::ColumnNotFound(weight_column.to_string()))?;

        let mut weights = source.as_materialized_series().clone();
        weights.rename(WEIGHT_COLUMN.into());
        result_df.with_column(weights)?;

        steps.push(format!("Applied weights from column: {}", weight_column));
        Ok(result_df)
    }
}

/// Weighted mean and margin of error for one value column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedSummary {
    pub weighted_mean: f64,
    pub margin_of_error: f64,
}

/// Computes [`WeightedSummary`] values on demand; nothing is persisted.
pub struct WeightedSummaryCalculator;

impl WeightedSummaryCalculator {
    /// Weighted mean and 95% margin of error over pairwise-complete rows.
    ///
    /// # Errors
    ///
    /// `ColumnNotFound` when either column is absent; `DegenerateStatistic`
    /// when no pairwise-complete row remains or the total weight is zero.
    pub fn compute(df: &DataFrame, value_col: &str, weight_col: &str) -> Result<WeightedSummary> {
        for name in [value_col, weight_col] {
            if df.column(name).is_err() {
                return Err(EngineError::ColumnNotFound(name.to_string()));
            }
        }

        // Pairwise-complete: a row is excluded only when the value or the
        // weight is missing.
        let pairs: Vec<(f64, f64)> = column_f64(df, value_col)?
            .into_iter()
            .zip(column_f64(df, weight_col)?)
            .filter_map(|(v, w)| Some((v?, w?)))
            .collect();

        let total_weight: f64 = pairs.iter().map(|(_, w)| w).sum();
        if pairs.is_empty() || total_weight == 0.0 {
            return Err(EngineError::DegenerateStatistic {
                column: value_col.to_string(),
            });
        }

        let n = pairs.len() as f64;
        let weighted_mean = pairs.iter().map(|(v, w)| v * w).sum::<f64>() / total_weight;
        let weighted_variance = pairs
            .iter()
            .map(|(v, w)| w * (v - weighted_mean) * (v - weighted_mean))
            .sum::<f64>()
            / total_weight;
        let weighted_se = weighted_variance.sqrt() / n.sqrt();

        Ok(WeightedSummary {
            weighted_mean,
            margin_of_error: Z_95 * weighted_se,
        })
    }

    /// Unweighted estimate over the raw value column.
    ///
    /// This is the documented fallback for degenerate weighted input: the
    /// plain mean, with the margin computed from the sample standard
    /// deviation over the row count (floored at one).
    pub fn unweighted(df: &DataFrame, value_col: &str) -> Result<WeightedSummary> {
        if df.column(value_col).is_err() {
            return Err(EngineError::ColumnNotFound(value_col.to_string()));
        }

        let observed: Vec<f64> = column_f64(df, value_col)?.into_iter().flatten().collect();
        let Some(unweighted_mean) = mean(&observed) else {
            return Err(EngineError::DegenerateStatistic {
                column: value_col.to_string(),
            });
        };

        let n = df.height().max(1) as f64;
        Ok(WeightedSummary {
            weighted_mean: unweighted_mean,
            margin_of_error: sample_std(&observed) * Z_95 / n,
        })
    }

    /// Weighted estimate with the documented unweighted fallback.
    pub fn compute_or_unweighted(
        df: &DataFrame,
        value_col: &str,
        weight_col: &str,
    ) -> Result<WeightedSummary> {
        match Self::compute(df, value_col, weight_col) {
            Err(EngineError::DegenerateStatistic { column }) => {
                debug!("Degenerate weighted summary for '{}', falling back", column);
                Self::unweighted(df, value_col)
            }
            other => other,
        }
    }
}
