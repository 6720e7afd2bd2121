//! Outlier resolution.
//!
//! `remove` is row-selective against the mask the detector produced;
//! `winsorize` ignores the mask entirely and reclamps every numeric column
//! to bounds recomputed from the current dataset state.

use crate::stats::{quantile_sorted, sorted_copy};
use crate::utils::{column_f64, column_f64_non_null, numeric_column_names};
use anyhow::{Result, ensure};
use polars::prelude::*;
use tracing::debug;

/// Applies the selected treatment to a detected outlier mask.
pub struct OutlierResolver;

impl OutlierResolver {
    /// Delete every masked row and return the renumbered dataset.
    pub fn remove(df: &DataFrame, mask: &BooleanChunked) -> Result<DataFrame> {
        ensure!(
            mask.len() == df.height(),
            "outlier mask length {} does not match row count {}",
            mask.len(),
            df.height()
        );

        let keep: Vec<bool> = mask.into_iter().map(|v| !v.unwrap_or(false)).collect();
        let keep_mask = BooleanChunked::from_slice("keep".into(), &keep);
        let filtered = df.filter(&keep_mask)?;

        debug!("Removed {} outlier rows", df.height() - filtered.height());
        Ok(filtered)
    }

    /// Clamp every numeric column to its own quantile bounds.
    ///
    /// Bounds are computed fresh from the current dataset, not reused from
    /// detection. Row count is unchanged; nulls stay null.
    pub fn winsorize(
        df: &DataFrame,
        limits: (f64, f64),
        steps: &mut Vec<String>,
    ) -> Result<DataFrame> {
        let mut result_df = df.clone();

        for col_name in numeric_column_names(df) {
            let observed = column_f64_non_null(df, &col_name)?;
            if observed.is_empty() {
                continue;
            }

            let sorted = sorted_copy(&observed);
            let lower = quantile_sorted(&sorted, limits.0).unwrap_or(f64::NAN);
            let upper = quantile_sorted(&sorted, limits.1).unwrap_or(f64::NAN);

            let mut clamped_count = 0usize;
            let clamped: Vec<Option<f64>> = column_f64(df, &col_name)?
                .into_iter()
                .map(|v| {
                    v.map(|val| {
                        let c = val.clamp(lower, upper);
                        if c != val {
                            clamped_count += 1;
                        }
                        c
                    })
                })
                .collect();

            if clamped_count == 0 {
                continue;
            }

            let result = Series::new(col_name.as_str().into(), clamped);
            result_df.replace(&col_name, result)?;

            steps.push(format!(
                "Clamped {} values in '{}' to [{:.2}, {:.2}]",
                clamped_count, col_name, lower, upper
            ));
        }

        Ok(result_df)
    }
}
