//! Dispatch errors

use thiserror::Error;
use transmitter_ledger::LedgerError;

/// Errors from configuration, wiring and notification
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Notification failed: {0}")]
    Notify(String),
}

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    pub fn config(message: impl Into<String>) -> Self {
        DispatchError::Config(message.into())
    }
}
