//! Error types for the seasonal-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while loading data, fitting models or forecasting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Malformed input table (wrong column count, non-numeric cell, ...).
    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// The input file could not be read.
    #[error("i/o error: {0}")]
    Io(String),

    /// An iterative optimizer stopped without meeting its tolerance.
    #[error("{routine} did not converge after {iterations} iterations")]
    ConvergenceFailure {
        routine: &'static str,
        iterations: usize,
    },

    /// The (differenced) series carries no information, e.g. zero variance.
    #[error("degenerate series: {0}")]
    DegenerateSeries(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}
