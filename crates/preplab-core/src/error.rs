//! Error types for preplab-core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage write skipped: {0}")]
    Storage(String),

    #[error("frequency must be a positive number")]
    InvalidFrequency,

    #[error("column not found: {0}")]
    UnknownColumn(String),

    #[error("feature value must be numeric")]
    InvalidFeatureValue,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PrepError>;
