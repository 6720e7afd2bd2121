//! The cleaning pipeline.
//!
//! Orchestrates the canonical flow the web layer drives: imputation,
//! outlier detection and resolution, weight application, rule validation,
//! and per-column weighted summaries. Each step consumes the previous
//! dataset and produces a new one; the pipeline holds no state between
//! invocations.

use crate::config::{CleaningConfig, ImputeMethod, OutlierAction, OutlierMethod};
use crate::error::{EngineError, Result};
use crate::imputers::Imputer;
use crate::outliers::{OutlierDetector, OutlierResolver, mask_true_count};
use crate::rules::RuleValidator;
use crate::types::{ColumnSummary, PipelineOutcome};
use crate::utils::numeric_column_names;
use crate::weights::{WEIGHT_COLUMN, WeightApplier, WeightedSummaryCalculator};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// One cleaning run over one dataset copy.
///
/// # Example
///
/// ```rust,ignore
/// use survey_processing::{CleaningConfig, CleaningPipeline, ImputeMethod, OutlierMethod};
///
/// let config = CleaningConfig::builder()
///     .impute_method(ImputeMethod::Mean)
///     .outlier_method(OutlierMethod::Iqr)
///     .build()?;
///
/// let outcome = CleaningPipeline::new(config).run(df)?;
/// for line in &outcome.workflow_log {
///     println!("{line}");
/// }
/// ```
pub struct CleaningPipeline {
    config: CleaningConfig,
}

impl CleaningPipeline {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    /// Run the full cleaning flow, consuming the input dataset.
    pub fn run(&self, df: DataFrame) -> Result<PipelineOutcome> {
        let mut log: Vec<String> = Vec::new();
        let rows_before = df.height();

        info!("Starting cleaning run on {} rows", rows_before);
        log.push(format!(
            "Data loaded: {} rows, {} columns",
            rows_before,
            df.width()
        ));

        let df = self.impute(df, &mut log)?;
        let (df, outliers_detected) = self.handle_outliers(df, &mut log)?;
        let (df, weighted) = self.apply_weights(df, &mut log)?;
        let violations = self.validate_rules(&df, &mut log)?;
        let summaries = self.summarize(&df, weighted)?;

        let rows_after = df.height();
        log.push(format!("Final dataset: {} rows", rows_after));
        info!("Cleaning run finished: {} -> {} rows", rows_before, rows_after);

        Ok(PipelineOutcome {
            data: df,
            workflow_log: log,
            violations,
            summaries,
            rows_before,
            rows_after,
            outliers_detected,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        })
    }

    fn impute(&self, df: DataFrame, log: &mut Vec<String>) -> Result<DataFrame> {
        if self.config.impute_method == ImputeMethod::None {
            return Ok(df);
        }

        let imputed = Imputer::impute(
            &df,
            self.config.impute_method,
            self.config.knn_neighbors,
            log,
        )
        .map_err(|e| EngineError::CleaningFailed(e.to_string()))?;

        log.push(format!(
            "Applied {} imputation",
            self.config.impute_method.tag()
        ));
        Ok(imputed)
    }

    fn handle_outliers(
        &self,
        df: DataFrame,
        log: &mut Vec<String>,
    ) -> Result<(DataFrame, usize)> {
        if self.config.outlier_method == OutlierMethod::None {
            return Ok((df, 0));
        }

        // The mask is only valid against this dataset state; it is consumed
        // immediately below.
        let mask = OutlierDetector::from_config(&self.config)
            .detect(&df, self.config.outlier_method)
            .map_err(|e| EngineError::CleaningFailed(e.to_string()))?;
        let count = mask_true_count(&mask);

        if count == 0 {
            return Ok((df, 0));
        }

        let method_tag = self.config.outlier_method.tag();
        let resolved = match self.config.outlier_action {
            OutlierAction::Remove => {
                let filtered = OutlierResolver::remove(&df, &mask)
                    .map_err(|e| EngineError::CleaningFailed(e.to_string()))?;
                log.push(format!("Removed {} outliers using {}", count, method_tag));
                filtered
            }
            OutlierAction::Winsorize => {
                let clamped =
                    OutlierResolver::winsorize(&df, self.config.winsor_limits, log)
                        .map_err(|e| EngineError::CleaningFailed(e.to_string()))?;
                log.push(format!(
                    "Winsorized {} outliers using {}",
                    count, method_tag
                ));
                clamped
            }
        };

        Ok((resolved, count))
    }

    fn apply_weights(&self, df: DataFrame, log: &mut Vec<String>) -> Result<(DataFrame, bool)> {
        let Some(weight_col) = &self.config.weight_column else {
            return Ok((df, false));
        };

        match WeightApplier::apply(&df, weight_col, log) {
            Ok(weighted) => Ok((weighted, true)),
            Err(EngineError::ColumnNotFound(col)) => {
                // Recoverable: surface a warning and continue unweighted
                warn!("Weight column '{}' not found, continuing unweighted", col);
                log.push(format!("Warning: weight column '{}' not found", col));
                Ok((df, false))
            }
            Err(e) => Err(e),
        }
    }

    fn validate_rules(&self, df: &DataFrame, log: &mut Vec<String>) -> Result<Vec<String>> {
        let Some(rules) = &self.config.rules else {
            return Ok(Vec::new());
        };
        if rules.is_empty() {
            return Ok(Vec::new());
        }

        let violations = RuleValidator::validate(df, rules)?;
        log.extend(violations.iter().cloned());
        Ok(violations)
    }

    /// Weighted (or plain) summaries for every numeric column except the
    /// weight columns themselves.
    fn summarize(&self, df: &DataFrame, weighted: bool) -> Result<Vec<ColumnSummary>> {
        let mut summaries = Vec::new();

        for col_name in numeric_column_names(df) {
            if col_name == WEIGHT_COLUMN || Some(&col_name) == self.config.weight_column.as_ref() {
                continue;
            }

            let summary = if weighted {
                WeightedSummaryCalculator::compute_or_unweighted(df, &col_name, WEIGHT_COLUMN)
            } else {
                WeightedSummaryCalculator::unweighted(df, &col_name)
            };

            match summary {
                Ok(s) => summaries.push(ColumnSummary::new(&col_name, s)),
                Err(EngineError::DegenerateStatistic { column }) => {
                    debug!("No summary for '{}': degenerate input", column);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use serde_json::json;

    fn survey_df() -> DataFrame {
        df![
            "age" => [Some(10.0), Some(20.0), None, Some(30.0), Some(1000.0)],
            "income" => [100.0, 200.0, 300.0, 400.0, 500.0],
            "w" => [1.0, 1.0, 1.0, 1.0, 1.0],
            "region" => ["north", "south", "south", "east", "north"],
        ]
        .unwrap()
    }

    #[test]
    fn test_run_full_flow() {
        let config = CleaningConfig::builder()
            .impute_method(ImputeMethod::Mean)
            .outlier_method(OutlierMethod::Iqr)
            .outlier_action(OutlierAction::Remove)
            .weight_column("w")
            .rules(RuleSet::from_value(&json!({"age": {"min": 0, "max": 120}})).unwrap())
            .build()
            .unwrap();

        let outcome = CleaningPipeline::new(config).run(survey_df()).unwrap();

        assert_eq!(outcome.rows_before, 5);
        // Mean-imputed age is [10, 20, 265, 30, 1000]; IQR flags only 1000
        assert_eq!(outcome.outliers_detected, 1);
        assert_eq!(outcome.rows_after, 4);
        assert_eq!(outcome.data.height(), 4);

        assert!(outcome.workflow_log[0].starts_with("Data loaded: 5 rows"));
        assert!(
            outcome
                .workflow_log
                .iter()
                .any(|l| l == "Applied Mean imputation")
        );
        assert!(
            outcome
                .workflow_log
                .iter()
                .any(|l| l == "Removed 1 outliers using IQR")
        );
        assert!(
            outcome
                .workflow_log
                .iter()
                .any(|l| l == "Applied weights from column: w")
        );
        assert_eq!(
            outcome.workflow_log.last().unwrap(),
            "Final dataset: 4 rows"
        );

        // The imputed fill (265) is the one remaining out-of-range age
        assert_eq!(outcome.violations, vec!["age: 1 values above 120".to_string()]);
    }

    #[test]
    fn test_run_defaults_is_mostly_identity() {
        let outcome = CleaningPipeline::new(CleaningConfig::default())
            .run(survey_df())
            .unwrap();

        assert_eq!(outcome.rows_after, 5);
        assert_eq!(outcome.outliers_detected, 0);
        // Null age survives untouched
        assert_eq!(outcome.data.column("age").unwrap().null_count(), 1);
        assert_eq!(outcome.workflow_log.len(), 2);
    }

    #[test]
    fn test_missing_weight_column_logs_warning() {
        let config = CleaningConfig::builder()
            .weight_column("no_such_column")
            .build()
            .unwrap();

        let outcome = CleaningPipeline::new(config).run(survey_df()).unwrap();

        assert!(
            outcome
                .workflow_log
                .iter()
                .any(|l| l.contains("Warning: weight column 'no_such_column' not found"))
        );
        // Summaries fall back to unweighted rather than disappearing
        assert!(!outcome.summaries.is_empty());
    }

    #[test]
    fn test_violations_appended_to_log() {
        let config = CleaningConfig::builder()
            .rules(
                RuleSet::from_value(&json!({
                    "age": {"min": 0, "max": 120},
                    "skip_if": [{"if": {"region": "south"}, "then_blank": ["income"]}]
                }))
                .unwrap(),
            )
            .build()
            .unwrap();

        let outcome = CleaningPipeline::new(config).run(survey_df()).unwrap();

        assert_eq!(
            outcome.violations,
            vec![
                "age: 1 values above 120".to_string(),
                "income: 2 should be blank when region == south".to_string(),
            ]
        );
        for violation in &outcome.violations {
            assert!(outcome.workflow_log.contains(violation));
        }
    }

    #[test]
    fn test_summaries_skip_weight_columns() {
        let config = CleaningConfig::builder()
            .weight_column("w")
            .build()
            .unwrap();

        let outcome = CleaningPipeline::new(config).run(survey_df()).unwrap();

        let columns: Vec<&str> = outcome.summaries.iter().map(|s| s.column.as_str()).collect();
        assert!(columns.contains(&"age"));
        assert!(columns.contains(&"income"));
        assert!(!columns.contains(&"w"));
        assert!(!columns.contains(&"weight"));
    }

    #[test]
    fn test_unit_weights_match_unweighted_mean() {
        let config = CleaningConfig::builder()
            .weight_column("w")
            .build()
            .unwrap();

        let outcome = CleaningPipeline::new(config).run(survey_df()).unwrap();

        let income = outcome
            .summaries
            .iter()
            .find(|s| s.column == "income")
            .unwrap();
        assert_eq!(income.weighted_mean, 300.0);
    }

    #[test]
    fn test_winsorize_action_keeps_rows() {
        let config = CleaningConfig::builder()
            .outlier_method(OutlierMethod::Iqr)
            .outlier_action(OutlierAction::Winsorize)
            .build()
            .unwrap();

        let outcome = CleaningPipeline::new(config).run(survey_df()).unwrap();

        assert_eq!(outcome.rows_after, 5);
        assert!(
            outcome
                .workflow_log
                .iter()
                .any(|l| l.contains("Winsorized 1 outliers using IQR"))
        );
        // The extreme age got clamped below its original value
        let max_age = outcome
            .data
            .column("age")
            .unwrap()
            .f64()
            .unwrap()
            .max()
            .unwrap();
        assert!(max_age < 1000.0);
    }
}
