//! Error types for demand forecasting.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Error types for training, persistence and request validation.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Correction model rejected: MAPE {mape:.3} is not below {threshold:.2}")]
    CorrectionModelRejected { mape: f64, threshold: f64 },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Model directory not found: {}", .0.display())]
    PersistenceUnavailable(PathBuf),

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("Invalid parameter '{param}' = '{value}': {reason}")]
    InvalidParameter {
        param: String,
        value: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ForecastError {
    /// Convert to a stable error code (used as process exit code by the CLI).
    pub fn to_code(&self) -> i32 {
        match self {
            ForecastError::InvalidInput(_) => 2,
            ForecastError::ComputationError(_) => 3,
            ForecastError::InsufficientData { .. } => 6,
            ForecastError::CorrectionModelRejected { .. } => 7,
            ForecastError::UnknownCategory(_) => 8,
            ForecastError::PersistenceUnavailable(_) => 9,
            ForecastError::InvalidDateFormat(_) => 10,
            ForecastError::InvalidParameter { .. } => 11,
            ForecastError::Io(_) => 12,
            ForecastError::Serialization(_) => 13,
        }
    }
}
