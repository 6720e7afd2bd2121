//! Custom error types for the cleaning engine.
//!
//! The engine never reports user-facing messages itself; it returns typed
//! failures using `thiserror` and leaves messaging, retries, and fallback
//! behavior to the calling layer.
//!
//! Errors are serializable as `{code, message}` so the web layer can
//! translate them into user-facing output.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// The rules structure was not a well-formed mapping.
    #[error("Invalid rules configuration: {0}")]
    InvalidRules(String),

    /// Zero-weight or zero-row statistical computation. Callers are expected
    /// to fall back to the unweighted estimate.
    #[error("Degenerate statistic for column '{column}': no complete observations or zero total weight")]
    DegenerateStatistic { column: String },

    /// A cleaning step (imputation, outlier handling) failed.
    #[error("Failed to clean data: {0}")]
    CleaningFailed(String),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Get error code for the calling layer.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidRules(_) => "INVALID_RULES",
            Self::DegenerateStatistic { .. } => "DEGENERATE_STATISTIC",
            Self::CleaningFailed(_) => "CLEANING_FAILED",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Check if this error is recoverable by the caller (fallback or a
    /// surfaced warning rather than an aborted run).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ColumnNotFound(_) | Self::InvalidRules(_) | Self::DegenerateStatistic { .. }
        )
    }
}

/// Serialize implementation for the web layer.
///
/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EngineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
