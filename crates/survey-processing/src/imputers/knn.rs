//! K-nearest-neighbor imputation.
//!
//! Distances are computed over all numeric columns with missing entries
//! excluded pairwise, the target feature itself excluded, and the squared
//! differences averaged over the observed pairs so rows with different
//! missingness patterns stay comparable. A value is only estimated when at
//! least one finite-distance neighbor has the target feature observed;
//! otherwise it stays missing.

use crate::utils::{column_f64, is_numeric_dtype, numeric_column_names};
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

pub struct KnnImputer {
    n_neighbors: usize,
}

impl KnnImputer {
    /// Create a new KNN imputer with the specified number of neighbors.
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
        }
    }

    /// Fill missing numeric values and return the new dataset.
    pub fn fit_transform(&self, df: &DataFrame, steps: &mut Vec<String>) -> Result<DataFrame> {
        let mut result_df = df.clone();

        let columns_to_impute: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|col| is_numeric_dtype(col.dtype()) && col.null_count() > 0)
            .map(|col| col.name().to_string())
            .collect();

        if columns_to_impute.is_empty() {
            return Ok(result_df);
        }

        debug!("KNN imputing {} columns", columns_to_impute.len());

        // All numeric columns participate in the distance computation
        let feature_cols = numeric_column_names(df);
        let matrix = self.create_data_matrix(df, &feature_cols)?;
        let n_rows = df.height();

        for col_name in &columns_to_impute {
            let col_idx = feature_cols
                .iter()
                .position(|c| c == col_name)
                .ok_or_else(|| anyhow::anyhow!("Column '{}' not in feature matrix", col_name))?;

            let mut imputed_count = 0usize;
            let mut left_missing = 0usize;
            let mut imputed_values = Vec::with_capacity(n_rows);

            for row_idx in 0..n_rows {
                match matrix[row_idx][col_idx] {
                    Some(observed) => imputed_values.push(Some(observed)),
                    None => match self.estimate_value(&matrix, row_idx, col_idx) {
                        Some(estimate) => {
                            imputed_values.push(Some(estimate));
                            imputed_count += 1;
                        }
                        None => {
                            imputed_values.push(None);
                            left_missing += 1;
                        }
                    },
                }
            }

            let imputed_series = Series::new(col_name.as_str().into(), imputed_values);
            result_df.replace(col_name, imputed_series)?;

            if imputed_count > 0 {
                steps.push(format!(
                    "Filled '{}' from {} nearest neighbors ({} values)",
                    col_name, self.n_neighbors, imputed_count
                ));
            }
            if left_missing > 0 {
                steps.push(format!(
                    "Left {} values in '{}' missing (no complete neighbor)",
                    left_missing, col_name
                ));
            }
        }

        Ok(result_df)
    }

    /// Materialize the numeric columns as an f64 matrix, preserving nulls.
    fn create_data_matrix(
        &self,
        df: &DataFrame,
        columns: &[String],
    ) -> Result<Vec<Vec<Option<f64>>>> {
        let n_rows = df.height();
        let mut matrix = vec![vec![None; columns.len()]; n_rows];

        for (col_idx, col_name) in columns.iter().enumerate() {
            let values = column_f64(df, col_name)?;
            for (row_idx, row) in matrix.iter_mut().enumerate().take(n_rows) {
                row[col_idx] = values[row_idx];
            }
        }

        Ok(matrix)
    }

    /// Estimate one missing value from the k nearest finite-distance rows
    /// with an observed target. `None` when no such neighbor exists.
    fn estimate_value(
        &self,
        matrix: &[Vec<Option<f64>>],
        target_row: usize,
        target_col: usize,
    ) -> Option<f64> {
        let mut distances: Vec<(usize, f64)> = (0..matrix.len())
            .filter(|&row| row != target_row && matrix[row][target_col].is_some())
            .filter_map(|row| {
                let distance =
                    Self::pairwise_distance(&matrix[target_row], &matrix[row], target_col);
                distance.is_finite().then_some((row, distance))
            })
            .collect();

        if distances.is_empty() {
            return None;
        }

        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let k = self.n_neighbors.min(distances.len());
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;

        for &(neighbor_row, distance) in distances.iter().take(k) {
            let value = matrix[neighbor_row][target_col]?;
            // Inverse distance as weight; a coincident neighbor dominates
            let weight = if distance < 1e-10 { 1e10 } else { 1.0 / distance };
            weighted_sum += value * weight;
            weight_sum += weight;
        }

        (weight_sum > 0.0).then(|| weighted_sum / weight_sum)
    }

    /// Normalized Euclidean distance between two rows, excluding the target
    /// feature and any pair with a missing side.
    fn pairwise_distance(row1: &[Option<f64>], row2: &[Option<f64>], skip_col: usize) -> f64 {
        let mut sum_squared_diff = 0.0;
        let mut count = 0usize;

        for col_idx in 0..row1.len() {
            if col_idx == skip_col {
                continue;
            }
            if let (Some(a), Some(b)) = (row1[col_idx], row2[col_idx]) {
                let diff = a - b;
                sum_squared_diff += diff * diff;
                count += 1;
            }
        }

        if count > 0 {
            (sum_squared_diff / count as f64).sqrt()
        } else {
            // No feature observed on both sides
            f64::INFINITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_neighbors_to_one() {
        assert_eq!(KnnImputer::new(0).n_neighbors, 1);
        assert_eq!(KnnImputer::new(3).n_neighbors, 3);
    }

    #[test]
    fn test_equidistant_neighbors_average() {
        // Rows 0 and 2 are equally far from row 1, so the estimate is the
        // plain average of their targets.
        let df = df![
            "feature1" => [1.0, 2.0, 3.0],
            "feature2" => [Some(10.0), None, Some(30.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = KnnImputer::new(3).fit_transform(&df, &mut steps).unwrap();

        let imputed = result
            .column("feature2")
            .unwrap()
            .get(1)
            .unwrap()
            .try_extract::<f64>()
            .unwrap();
        assert!((imputed - 20.0).abs() < 1e-9);
        assert!(steps[0].contains("feature2"));
    }

    #[test]
    fn test_closer_neighbor_has_more_weight() {
        let df = df![
            "feature1" => [1.0, 1.1, 10.0],
            "feature2" => [Some(10.0), None, Some(100.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = KnnImputer::new(2).fit_transform(&df, &mut steps).unwrap();

        let imputed = result
            .column("feature2")
            .unwrap()
            .get(1)
            .unwrap()
            .try_extract::<f64>()
            .unwrap();
        assert!(imputed < 30.0, "expected pull toward the near neighbor, got {imputed}");
    }

    #[test]
    fn test_coincident_neighbor_dominates() {
        let df = df![
            "feature1" => [5.0, 5.0, 100.0],
            "feature2" => [Some(10.0), None, Some(1000.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = KnnImputer::new(2).fit_transform(&df, &mut steps).unwrap();

        let imputed = result
            .column("feature2")
            .unwrap()
            .get(1)
            .unwrap()
            .try_extract::<f64>()
            .unwrap();
        assert!((imputed - 10.0).abs() < 1.0);
    }

    #[test]
    fn test_all_null_column_left_missing() {
        // No row ever observes the target, so there is no valid neighbor
        let df = df![
            "feature1" => [1.0, 2.0, 3.0],
            "feature2" => [Option::<f64>::None, None, None],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = KnnImputer::new(3).fit_transform(&df, &mut steps).unwrap();

        assert_eq!(result.column("feature2").unwrap().null_count(), 3);
        assert!(steps.iter().any(|s| s.contains("no complete neighbor")));
    }

    #[test]
    fn test_no_shared_features_left_missing() {
        // Row 1 observes nothing besides the target column, so every
        // candidate distance is infinite.
        let df = df![
            "feature1" => [Some(1.0), None, Some(3.0)],
            "feature2" => [Some(10.0), None, Some(30.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = KnnImputer::new(3).fit_transform(&df, &mut steps).unwrap();

        assert_eq!(result.column("feature1").unwrap().null_count(), 1);
        assert_eq!(result.column("feature2").unwrap().null_count(), 1);
    }

    #[test]
    fn test_neighbors_capped_by_available_rows() {
        let df = df![
            "feature1" => [1.0, 2.0, 3.0],
            "feature2" => [Some(10.0), None, Some(30.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = KnnImputer::new(10).fit_transform(&df, &mut steps).unwrap();

        assert_eq!(result.column("feature2").unwrap().null_count(), 0);
    }

    #[test]
    fn test_non_numeric_columns_ignored() {
        let df = df![
            "name" => ["Alice", "Bob", "Charlie"],
            "age" => [Some(25.0), None, Some(35.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = KnnImputer::new(3).fit_transform(&df, &mut steps).unwrap();

        assert_eq!(result.column("age").unwrap().null_count(), 0);
        assert_eq!(result.column("name").unwrap().get(0).unwrap().to_string(), "\"Alice\"");
    }

    #[test]
    fn test_pairwise_distance_excludes_target_and_nulls() {
        let row1 = vec![Some(100.0), Some(0.0), None];
        let row2 = vec![Some(0.0), Some(3.0), Some(4.0)];

        // Column 0 is the target and column 2 is missing on one side, so
        // only column 1 contributes: sqrt(9 / 1) = 3
        let d = KnnImputer::pairwise_distance(&row1, &row2, 0);
        assert!((d - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_pairwise_distance_no_common_features() {
        let row1 = vec![Some(1.0), None, None];
        let row2 = vec![Some(2.0), None, None];

        let d = KnnImputer::pairwise_distance(&row1, &row2, 0);
        assert_eq!(d, f64::INFINITY);
    }

    #[test]
    fn test_empty_dataframe() {
        let df = DataFrame::empty();
        let mut steps = Vec::new();

        let result = KnnImputer::new(3).fit_transform(&df, &mut steps).unwrap();
        assert_eq!(result.height(), 0);
    }
}
