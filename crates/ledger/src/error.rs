//! Ledger errors

use thiserror::Error;

/// Errors from ledger backends
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt ledger at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
