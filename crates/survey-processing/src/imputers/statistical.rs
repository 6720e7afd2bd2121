//! Statistical imputation methods.
//!
//! Mean and median fills over numeric columns. A column whose values are
//! all missing has no defined statistic and is left untouched.

use crate::utils::{column_f64, numeric_column_names};
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill missing numeric values with the column mean.
    pub fn apply_mean(df: &DataFrame, steps: &mut Vec<String>) -> Result<DataFrame> {
        Self::fill_numeric_columns(df, steps, "mean", |series| series.mean())
    }

    /// Fill missing numeric values with the column median.
    ///
    /// Even counts use the average of the two middle order statistics.
    pub fn apply_median(df: &DataFrame, steps: &mut Vec<String>) -> Result<DataFrame> {
        Self::fill_numeric_columns(df, steps, "median", |series| series.median())
    }

    /// Fill every numeric column's nulls with a per-column statistic.
    fn fill_numeric_columns(
        df: &DataFrame,
        steps: &mut Vec<String>,
        method: &str,
        statistic: impl Fn(&Series) -> Option<f64>,
    ) -> Result<DataFrame> {
        let mut result_df = df.clone();

        for col_name in numeric_column_names(df) {
            let col = df.column(&col_name)?;
            if col.null_count() == 0 {
                continue;
            }

            let series = col.as_materialized_series();
            let Some(fill_value) = statistic(series) else {
                // Entirely-missing column: the statistic is undefined and
                // the nulls stay in place.
                debug!("No {} defined for '{}', leaving nulls", method, col_name);
                continue;
            };

            let filled_count = col.null_count();
            let filled: Vec<Option<f64>> = column_f64(df, &col_name)?
                .into_iter()
                .map(|v| v.or(Some(fill_value)))
                .collect();

            let result = Series::new(col_name.as_str().into(), filled);
            result_df.replace(&col_name, result)?;

            steps.push(format!(
                "Filled '{}' with {}: {:.2} ({} values)",
                col_name, method, fill_value, filled_count
            ));
        }

        Ok(result_df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_mean_basic() {
        let df = df![
            "x" => [Some(1.0), Some(2.0), None, Some(100.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = StatisticalImputer::apply_mean(&df, &mut steps).unwrap();

        let x = result.column("x").unwrap();
        assert_eq!(x.null_count(), 0);
        // Mean of [1, 2, 100] = 34.33...
        let filled = x.get(2).unwrap().try_extract::<f64>().unwrap();
        assert!((filled - 103.0 / 3.0).abs() < 1e-9);

        assert_eq!(steps.len(), 1);
        assert!(steps[0].contains("mean"));
        assert!(steps[0].contains("1 values"));
    }

    #[test]
    fn test_apply_mean_preserves_original_values() {
        let df = df![
            "x" => [Some(10.0), None, Some(20.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = StatisticalImputer::apply_mean(&df, &mut steps).unwrap();

        let x = result.column("x").unwrap();
        assert_eq!(x.get(0).unwrap().try_extract::<f64>().unwrap(), 10.0);
        assert_eq!(x.get(1).unwrap().try_extract::<f64>().unwrap(), 15.0);
        assert_eq!(x.get(2).unwrap().try_extract::<f64>().unwrap(), 20.0);
    }

    #[test]
    fn test_apply_median_even_count() {
        let df = df![
            "x" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), None],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = StatisticalImputer::apply_median(&df, &mut steps).unwrap();

        // Median of [1, 2, 3, 4] = 2.5
        let filled = result
            .column("x")
            .unwrap()
            .get(4)
            .unwrap()
            .try_extract::<f64>()
            .unwrap();
        assert_eq!(filled, 2.5);
        assert!(steps[0].contains("median"));
    }

    #[test]
    fn test_all_null_column_left_unchanged() {
        let df = df![
            "x" => [Option::<f64>::None, None, None],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = StatisticalImputer::apply_mean(&df, &mut steps).unwrap();

        assert_eq!(result.column("x").unwrap().null_count(), 3);
        assert!(steps.is_empty());
    }

    #[test]
    fn test_non_numeric_columns_pass_through() {
        let df = df![
            "name" => [Some("a"), None, Some("c")],
            "x" => [Some(1.0), None, Some(3.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = StatisticalImputer::apply_mean(&df, &mut steps).unwrap();

        // String column keeps its null
        assert_eq!(result.column("name").unwrap().null_count(), 1);
        assert_eq!(result.column("x").unwrap().null_count(), 0);
    }

    #[test]
    fn test_no_nulls_no_steps() {
        let df = df![
            "x" => [1.0, 2.0, 3.0],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = StatisticalImputer::apply_mean(&df, &mut steps).unwrap();

        assert!(result.equals(&df));
        assert!(steps.is_empty());
    }

    #[test]
    fn test_idempotent_after_first_pass() {
        let df = df![
            "x" => [Some(1.0), None, Some(5.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let once = StatisticalImputer::apply_mean(&df, &mut steps).unwrap();
        let twice = StatisticalImputer::apply_mean(&once, &mut steps).unwrap();

        assert!(once.equals(&twice));
    }

    #[test]
    fn test_integer_column_filled_as_float() {
        let df = df![
            "n" => [Some(1i64), None, Some(3)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = StatisticalImputer::apply_mean(&df, &mut steps).unwrap();

        let n = result.column("n").unwrap();
        assert!(matches!(n.dtype(), DataType::Float64));
        assert_eq!(n.get(1).unwrap().try_extract::<f64>().unwrap(), 2.0);
    }
}
