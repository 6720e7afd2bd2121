//! Outlier detection strategies.

use crate::config::{CleaningConfig, OutlierMethod};
use crate::stats::{mean, quantile_sorted, sample_std, sorted_copy};
use crate::utils::{column_f64, column_f64_non_null, numeric_column_names};
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Count the `true` entries of a mask.
pub fn mask_true_count(mask: &BooleanChunked) -> usize {
    mask.into_iter().filter(|v| v.unwrap_or(false)).count()
}

/// Flags outlier rows per the configured strategy.
pub struct OutlierDetector {
    iqr_multiplier: f64,
    zscore_threshold: f64,
    winsor_limits: (f64, f64),
}

impl OutlierDetector {
    pub fn from_config(config: &CleaningConfig) -> Self {
        Self {
            iqr_multiplier: config.iqr_multiplier,
            zscore_threshold: config.zscore_threshold,
            winsor_limits: config.winsor_limits,
        }
    }

    /// Compute the row-level outlier mask.
    ///
    /// A row is flagged when any numeric column satisfies the condition;
    /// missing entries never flag. The mask length always equals the row
    /// count at computation time.
    pub fn detect(&self, df: &DataFrame, method: OutlierMethod) -> Result<BooleanChunked> {
        let mut flags = vec![false; df.height()];

        if method != OutlierMethod::None {
            for col_name in numeric_column_names(df) {
                self.flag_column(df, &col_name, method, &mut flags)?;
            }
        }

        debug!(
            "Outlier detection ({}) flagged {} of {} rows",
            method.tag(),
            flags.iter().filter(|f| **f).count(),
            df.height()
        );
        Ok(BooleanChunked::from_slice("outlier_mask".into(), &flags))
    }

    /// OR one column's outlier condition into the row flags.
    fn flag_column(
        &self,
        df: &DataFrame,
        col_name: &str,
        method: OutlierMethod,
        flags: &mut [bool],
    ) -> Result<()> {
        let observed = column_f64_non_null(df, col_name)?;
        if observed.is_empty() {
            return Ok(());
        }

        let condition: Box<dyn Fn(f64) -> bool> = match method {
            OutlierMethod::Iqr => {
                let sorted = sorted_copy(&observed);
                let q1 = quantile_sorted(&sorted, 0.25).unwrap_or(f64::NAN);
                let q3 = quantile_sorted(&sorted, 0.75).unwrap_or(f64::NAN);
                let iqr = q3 - q1;
                let lower = q1 - self.iqr_multiplier * iqr;
                let upper = q3 + self.iqr_multiplier * iqr;
                Box::new(move |v| v < lower || v > upper)
            }
            OutlierMethod::ZScore => {
                // Zero-variance columns never flag
                let m = mean(&observed).unwrap_or(f64::NAN);
                let std = sample_std(&observed);
                if std == 0.0 {
                    return Ok(());
                }
                let threshold = self.zscore_threshold;
                Box::new(move |v| ((v - m) / std).abs() > threshold)
            }
            OutlierMethod::Winsorize => {
                let sorted = sorted_copy(&observed);
                let lower = quantile_sorted(&sorted, self.winsor_limits.0).unwrap_or(f64::NAN);
                let upper = quantile_sorted(&sorted, self.winsor_limits.1).unwrap_or(f64::NAN);
                Box::new(move |v| v < lower || v > upper)
            }
            OutlierMethod::None => return Ok(()),
        };

        for (row_idx, value) in column_f64(df, col_name)?.into_iter().enumerate() {
            if let Some(v) = value
                && condition(v)
            {
                flags[row_idx] = true;
            }
        }

        Ok(())
    }
}
