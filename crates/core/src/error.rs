//! Core errors

use thiserror::Error;

/// Errors raised while building core domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Record payload is empty")]
    EmptyRecord,

    #[error("Record payload must be an object or a list of objects, got {0}")]
    InvalidRecordShape(String),

    #[error("Trigger payload must be an object, got {0}")]
    InvalidTrigger(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
