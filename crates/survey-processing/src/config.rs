//! Configuration types for the cleaning pipeline.
//!
//! Strategy selection is modeled as closed enumerations rather than open
//! string dispatch; the web layer's string tags are converted at the
//! boundary with `from_tag`, which degrades unknown tags to the documented
//! defaults instead of failing.

use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};

/// Strategy for imputing missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImputeMethod {
    /// Use the mean of non-null values
    Mean,
    /// Use the median of non-null values
    Median,
    /// Use K-Nearest Neighbors imputation
    Knn,
    /// Leave the dataset unchanged
    #[default]
    None,
}

impl ImputeMethod {
    /// Parse a form tag. Unknown tags degrade to `None`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Mean" => Self::Mean,
            "Median" => Self::Median,
            "KNN" => Self::Knn,
            _ => Self::None,
        }
    }

    /// Tag used in workflow log lines, matching the form values.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Mean => "Mean",
            Self::Median => "Median",
            Self::Knn => "KNN",
            Self::None => "None",
        }
    }
}

/// Strategy for flagging outlier rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutlierMethod {
    /// Flag values outside Q1 - 1.5*IQR .. Q3 + 1.5*IQR
    Iqr,
    /// Flag values with |z| above the threshold
    ZScore,
    /// Flag values outside the 1st/99th percentiles
    Winsorize,
    /// Never flag anything
    #[default]
    None,
}

impl OutlierMethod {
    /// Parse a form tag. Unknown tags degrade to `None`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "IQR" => Self::Iqr,
            "Z-score" => Self::ZScore,
            "Winsorize" => Self::Winsorize,
            _ => Self::None,
        }
    }

    /// Tag used in workflow log lines, matching the form values.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Iqr => "IQR",
            Self::ZScore => "Z-score",
            Self::Winsorize => "Winsorize",
            Self::None => "None",
        }
    }
}

/// Action taken on rows flagged by the outlier detector.
///
/// `Remove` is row-selective against the precomputed mask; `Winsorize`
/// reclamps every numeric column globally to fresh percentile bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutlierAction {
    /// Delete the flagged rows
    Remove,
    /// Clamp all numeric columns to the 1st/99th percentiles
    #[default]
    Winsorize,
}

impl OutlierAction {
    /// Parse a form tag. Unknown tags degrade to `Winsorize`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "remove" => Self::Remove,
            _ => Self::Winsorize,
        }
    }
}

/// Per-invocation configuration for the cleaning pipeline.
///
/// Use [`CleaningConfig::builder()`] for fluent construction. The engine
/// holds no process-wide state; the calling layer passes one of these per
/// request.
///
/// # Example
///
/// ```rust,ignore
/// use survey_processing::{CleaningConfig, ImputeMethod, OutlierMethod};
///
/// let config = CleaningConfig::builder()
///     .impute_method(ImputeMethod::Median)
///     .outlier_method(OutlierMethod::Iqr)
///     .weight_column("design_weight")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Strategy for filling missing numeric values.
    /// Default: None
    pub impute_method: ImputeMethod,

    /// Strategy for flagging outlier rows.
    /// Default: None
    pub outlier_method: OutlierMethod,

    /// Action taken when the detector flags at least one row.
    /// Default: Winsorize
    pub outlier_action: OutlierAction,

    /// Source column whose values are copied into the `weight` column.
    /// Default: None
    pub weight_column: Option<String>,

    /// Declarative validation rules.
    /// Default: None
    pub rules: Option<RuleSet>,

    /// Number of neighbors for KNN imputation.
    /// Default: 3
    pub knn_neighbors: usize,

    /// Lower/upper quantiles used by winsorizing (detection and clamping).
    /// Default: (0.01, 0.99)
    pub winsor_limits: (f64, f64),

    /// Absolute z-score above which a value is flagged.
    /// Default: 3.0
    pub zscore_threshold: f64,

    /// Fence multiplier for the IQR method.
    /// Default: 1.5
    pub iqr_multiplier: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            impute_method: ImputeMethod::default(),
            outlier_method: OutlierMethod::default(),
            outlier_action: OutlierAction::default(),
            weight_column: None,
            rules: None,
            knn_neighbors: 3,
            winsor_limits: (0.01, 0.99),
            zscore_threshold: 3.0,
            iqr_multiplier: 1.5,
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let (lower, upper) = self.winsor_limits;
        if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower >= upper {
            return Err(ConfigValidationError::InvalidWinsorLimits { lower, upper });
        }

        if self.knn_neighbors == 0 {
            return Err(ConfigValidationError::InvalidKnnNeighbors(
                self.knn_neighbors,
            ));
        }

        if self.zscore_threshold <= 0.0 {
            return Err(ConfigValidationError::InvalidZScoreThreshold(
                self.zscore_threshold,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid winsor limits: ({lower}, {upper}) (must satisfy 0.0 <= lower < upper <= 1.0)")]
    InvalidWinsorLimits { lower: f64, upper: f64 },

    #[error("Invalid KNN neighbors: {0} (must be at least 1)")]
    InvalidKnnNeighbors(usize),

    #[error("Invalid z-score threshold: {0} (must be positive)")]
    InvalidZScoreThreshold(f64),
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    impute_method: Option<ImputeMethod>,
    outlier_method: Option<OutlierMethod>,
    outlier_action: Option<OutlierAction>,
    weight_column: Option<String>,
    rules: Option<RuleSet>,
    knn_neighbors: Option<usize>,
    winsor_limits: Option<(f64, f64)>,
    zscore_threshold: Option<f64>,
    iqr_multiplier: Option<f64>,
}

impl CleaningConfigBuilder {
    /// Set the imputation strategy.
    pub fn impute_method(mut self, method: ImputeMethod) -> Self {
        self.impute_method = Some(method);
        self
    }

    /// Set the outlier detection strategy.
    pub fn outlier_method(mut self, method: OutlierMethod) -> Self {
        self.outlier_method = Some(method);
        self
    }

    /// Set the action taken on detected outliers.
    pub fn outlier_action(mut self, action: OutlierAction) -> Self {
        self.outlier_action = Some(action);
        self
    }

    /// Set the source column for survey weights.
    pub fn weight_column(mut self, column: impl Into<String>) -> Self {
        self.weight_column = Some(column.into());
        self
    }

    /// Set the declarative validation rules.
    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Set the number of neighbors for KNN imputation.
    pub fn knn_neighbors(mut self, k: usize) -> Self {
        self.knn_neighbors = Some(k);
        self
    }

    /// Set the lower/upper quantiles used by winsorizing.
    pub fn winsor_limits(mut self, lower: f64, upper: f64) -> Self {
        self.winsor_limits = Some((lower, upper));
        self
    }

    /// Set the absolute z-score threshold.
    pub fn zscore_threshold(mut self, threshold: f64) -> Self {
        self.zscore_threshold = Some(threshold);
        self
    }

    /// Set the IQR fence multiplier.
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let config = CleaningConfig {
            impute_method: self.impute_method.unwrap_or_default(),
            outlier_method: self.outlier_method.unwrap_or_default(),
            outlier_action: self.outlier_action.unwrap_or_default(),
            weight_column: self.weight_column,
            rules: self.rules,
            knn_neighbors: self.knn_neighbors.unwrap_or(3),
            winsor_limits: self.winsor_limits.unwrap_or((0.01, 0.99)),
            zscore_threshold: self.zscore_threshold.unwrap_or(3.0),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(1.5),
        };

        config.validate()?;
        Ok(config)
    }
}
