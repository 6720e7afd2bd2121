//! Declarative data-quality rules.
//!
//! Rules arrive from the web layer as a nested JSON mapping:
//!
//! ```json
//! {
//!   "age": {"min": 0, "max": 120},
//!   "income": {"min": 0},
//!   "skip_if": [{"if": {"has_tv": 0}, "then_blank": ["tv_brand"]}]
//! }
//! ```
//!
//! Range rules bound a numeric column; skip rules assert that target
//! columns are blank whenever a condition column equals a value. Columns
//! absent from the dataset are silently skipped, and a malformed rule entry
//! is dropped without aborting the validation pass.

use crate::error::{EngineError, Result};
use crate::utils::{column_f64, is_numeric_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Range constraint on a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeRule {
    pub column: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// "When `column` equals `equals`, the `then_blank` columns must be absent."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipRule {
    pub column: String,
    pub equals: Value,
    pub then_blank: Vec<String>,
}

/// An ordered set of validation rules.
///
/// Range rules are evaluated first in declaration order, then skip rules in
/// declaration order; violation messages follow the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub ranges: Vec<RangeRule>,
    pub skip_if: Vec<SkipRule>,
}

impl RuleSet {
    /// Parse the web layer's nested-mapping shape.
    ///
    /// Returns `InvalidRules` when the top level is not an object;
    /// individual malformed entries are skipped instead.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(EngineError::InvalidRules(
                "expected a JSON object of column constraints".to_string(),
            ));
        };

        let mut rules = RuleSet::default();

        for (key, spec) in object {
            if key.as_str() == "skip_if" {
                let Some(entries) = spec.as_array() else {
                    debug!("skip_if is not an array, ignoring");
                    continue;
                };
                for entry in entries {
                    match Self::parse_skip_entry(entry) {
                        Some(rule) => rules.skip_if.push(rule),
                        None => debug!("Ignoring malformed skip_if entry: {}", entry),
                    }
                }
                continue;
            }

            let Some(spec) = spec.as_object() else {
                debug!("Ignoring malformed rule for '{}'", key);
                continue;
            };
            rules.ranges.push(RangeRule {
                column: key.clone(),
                min: spec.get("min").and_then(Value::as_f64),
                max: spec.get("max").and_then(Value::as_f64),
            });
        }

        Ok(rules)
    }

    fn parse_skip_entry(entry: &Value) -> Option<SkipRule> {
        let object = entry.as_object()?;
        let condition = object.get("if")?.as_object()?;
        let (column, equals) = condition.iter().next()?;
        let then_blank: Vec<String> = object
            .get("then_blank")?
            .as_array()?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        if then_blank.is_empty() {
            return None;
        }
        Some(SkipRule {
            column: column.clone(),
            equals: equals.clone(),
            then_blank,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty() && self.skip_if.is_empty()
    }
}

/// Checks a [`RuleSet`] against a dataset, producing violation messages.
pub struct RuleValidator;

impl RuleValidator {
    /// Evaluate every rule independently and collect violation messages.
    pub fn validate(df: &DataFrame, rules: &RuleSet) -> Result<Vec<String>> {
        let mut violations = Vec::new();
        let col_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for rule in &rules.ranges {
            if !col_names.contains(&rule.column) {
                continue;
            }
            let Ok(values) = column_f64(df, &rule.column) else {
                debug!("Range rule on non-numeric column '{}' skipped", rule.column);
                continue;
            };
            let observed: Vec<f64> = values.into_iter().flatten().collect();

            if let Some(min) = rule.min {
                let count = observed.iter().filter(|v| **v < min).count();
                if count > 0 {
                    violations.push(format!("{}: {} values below {}", rule.column, count, min));
                }
            }
            if let Some(max) = rule.max {
                let count = observed.iter().filter(|v| **v > max).count();
                if count > 0 {
                    violations.push(format!("{}: {} values above {}", rule.column, count, max));
                }
            }
        }

        for rule in &rules.skip_if {
            if !col_names.contains(&rule.column) {
                continue;
            }
            let matches = Self::matching_rows(df, rule)?;
            if matches.is_empty() {
                continue;
            }

            for target in &rule.then_blank {
                if !col_names.contains(target) {
                    continue;
                }
                let null_mask = df.column(target)?.is_null();
                let count = matches
                    .iter()
                    .filter(|&&row| !null_mask.get(row).unwrap_or(false))
                    .count();
                if count > 0 {
                    violations.push(format!(
                        "{}: {} should be blank when {} == {}",
                        target,
                        count,
                        rule.column,
                        fmt_rule_value(&rule.equals)
                    ));
                }
            }
        }

        Ok(violations)
    }

    /// Indices of rows where the condition column equals the rule value.
    ///
    /// Numeric columns compare numerically, string columns by string;
    /// a type mismatch matches nothing, as in the source system.
    fn matching_rows(df: &DataFrame, rule: &SkipRule) -> Result<Vec<usize>> {
        let col = df.column(&rule.column)?;

        if is_numeric_dtype(col.dtype()) {
            let Some(wanted) = rule.equals.as_f64() else {
                return Ok(Vec::new());
            };
            let values = column_f64(df, &rule.column)?;
            return Ok(values
                .into_iter()
                .enumerate()
                .filter(|(_, v)| *v == Some(wanted))
                .map(|(row, _)| row)
                .collect());
        }

        let Some(wanted) = rule.equals.as_str() else {
            return Ok(Vec::new());
        };
        let series = col.as_materialized_series();
        let Ok(ca) = series.str() else {
            return Ok(Vec::new());
        };
        Ok(ca
            .into_iter()
            .enumerate()
            .filter(|(_, v)| *v == Some(wanted))
            .map(|(row, _)| row)
            .collect())
    }
}

/// Render a rule value the way the web layer displayed it.
fn fmt_rule_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
