//! Error types for the gridwatch-analysis library.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while analysing a series.
///
/// Every component validates its inputs up front and returns one of these
/// instead of a partial result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Series is shorter than the algorithm minimum.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Out-of-range or mutually inconsistent parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input makes a statistic undefined (e.g. zero spread).
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// Two inputs that must be aligned have different lengths.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}
