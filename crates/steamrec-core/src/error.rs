//! Error types for the recommendation core

use thiserror::Error;

/// Structural problems with the rating table handed to `fit`.
///
/// Always fatal to the `fit` call that raised it. Nothing in the core retries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// The table has no rows
    #[error("empty model: rating table has no rows")]
    EmptyTable,

    /// A required column is absent
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// A column exists but holds the wrong kind of values
    #[error("column '{column}' must be {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    /// Required columns have different lengths
    #[error("columns have different lengths: user_id={user_ids}, item_id={item_ids}, rating={ratings}")]
    RaggedColumns {
        user_ids: usize,
        item_ids: usize,
        ratings: usize,
    },

    /// The same (user, item) pair appears more than once
    #[error("duplicate rating for user '{user_id}' and item '{item_id}'")]
    DuplicatePair { user_id: String, item_id: String },

    /// Rating is NaN or infinite
    #[error("non-finite rating for user '{user_id}' and item '{item_id}'")]
    NonFiniteRating { user_id: String, item_id: String },

    /// Non-negative factorization was given a negative rating
    #[error("negative rating {rating} for user '{user_id}' and item '{item_id}'")]
    NegativeRating {
        user_id: String,
        item_id: String,
        rating: f64,
    },
}

/// Errors surfaced by the recommendation core
#[derive(Debug, Error)]
pub enum RecommendError {
    /// Invalid input table
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Invalid predictor configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Persisted blob belongs to a different predictor variant
    #[error("state mismatch: expected '{expected}' model, found '{found}'")]
    StateMismatch { expected: String, found: String },

    /// Persisted blob is not a steamrec model, or is from an unknown version
    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),

    /// Persisted state violates a model invariant
    #[error("corrupt model state: {0}")]
    CorruptState(String),

    /// Operation needs a fitted predictor
    #[error("predictor has not been fitted")]
    NotFitted,

    /// IO error (model files)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, RecommendError>;
