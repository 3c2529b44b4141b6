//! Workflow errors

use strum_macros::Display;
use thiserror::Error;
use transmitter_core::CoreError;
use transmitter_ledger::LedgerError;
use transmitter_rules::RuleError;

/// Errors that abort a pipeline run
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Dependency {source_name} failed: {message}")]
    Dependency {
        source_name: String,
        message: String,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Logic error: {0}")]
    Logic(String),
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Coarse classification used when translating an error into a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorKind {
    /// Bad input from the caller; nothing was locked or written
    Validation,
    /// Ledger or collaborator failure
    Dependency,
    /// Defect in the processing itself
    Logic,
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(message.into())
    }

    /// Failure reported by an external collaborator
    pub fn dependency(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        WorkflowError::Dependency {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn logic(message: impl Into<String>) -> Self {
        WorkflowError::Logic(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Validation(_) => ErrorKind::Validation,
            WorkflowError::Dependency { .. } | WorkflowError::Ledger(_) => ErrorKind::Dependency,
            WorkflowError::Logic(_) => ErrorKind::Logic,
        }
    }
}

impl From<RuleError> for WorkflowError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::Ledger(e) => WorkflowError::Ledger(e),
            RuleError::Logic(message) => WorkflowError::Logic(message),
        }
    }
}

impl From<CoreError> for WorkflowError {
    fn from(err: CoreError) -> Self {
        WorkflowError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(WorkflowError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(
            WorkflowError::dependency("registry", "timeout").kind(),
            ErrorKind::Dependency
        );
        assert_eq!(WorkflowError::logic("x").kind(), ErrorKind::Logic);

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(
            WorkflowError::from(LedgerError::from(io)).kind(),
            ErrorKind::Dependency
        );
    }

    #[test]
    fn test_rule_errors_keep_their_kind() {
        let err: WorkflowError = RuleError::logic("scope mismatch").into();
        assert_eq!(err.kind(), ErrorKind::Logic);
    }

    #[test]
    fn test_dependency_message() {
        let err = WorkflowError::dependency("affiliation-directory", "HTTP 503");
        assert_eq!(
            err.to_string(),
            "Dependency affiliation-directory failed: HTTP 503"
        );
        assert_eq!(err.kind().to_string(), "dependency");
    }
}
