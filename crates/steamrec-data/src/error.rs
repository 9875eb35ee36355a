//! Error types for the data-supply layer

use steamrec_core::InputError;
use thiserror::Error;

/// Result type for data operations
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or splitting rating tables
#[derive(Debug, Error)]
pub enum DataError {
    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON syntax or shape error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rows do not satisfy the rating table contract
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Test fraction outside (0, 1)
    #[error("test fraction must be between 0 and 1 (exclusive), got {0}")]
    InvalidFraction(f64),
}
