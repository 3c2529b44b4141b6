//! Rule errors

use thiserror::Error;
use transmitter_ledger::LedgerError;

/// Errors from rule assessment
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Logic error: {0}")]
    Logic(String),
}

/// Result type for rule operations
pub type RuleResult<T> = Result<T, RuleError>;

impl RuleError {
    pub fn logic(message: impl Into<String>) -> Self {
        RuleError::Logic(message.into())
    }
}
