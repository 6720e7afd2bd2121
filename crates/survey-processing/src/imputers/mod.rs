//! Imputation module for handling missing values.
//!
//! This module provides the imputation strategies:
//! - Statistical imputation (mean, median)
//! - KNN imputation
//!
//! All strategies operate on numeric columns only; non-numeric columns pass
//! through unchanged.

mod knn;
mod statistical;

pub use knn::KnnImputer;
pub use statistical::StatisticalImputer;

use crate::config::ImputeMethod;
use anyhow::Result;
use polars::prelude::*;

/// Entry point dispatching to the configured imputation strategy.
pub struct Imputer;

impl Imputer {
    /// Fill missing numeric values and return the new dataset.
    ///
    /// `ImputeMethod::None` is the identity. Per-column fill counts are
    /// appended to `steps`.
    pub fn impute(
        df: &DataFrame,
        method: ImputeMethod,
        knn_neighbors: usize,
        steps: &mut Vec<String>,
    ) -> Result<DataFrame> {
        match method {
            ImputeMethod::Mean => StatisticalImputer::apply_mean(df, steps),
            ImputeMethod::Median => StatisticalImputer::apply_median(df, steps),
            ImputeMethod::Knn => KnnImputer::new(knn_neighbors).fit_transform(df, steps),
            ImputeMethod::None => Ok(df.clone()),
        }
    }
}
