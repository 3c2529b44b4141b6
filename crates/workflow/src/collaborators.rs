//! External collaborators the steps call out to
//!
//! Implementations report failures as [`crate::WorkflowError::Dependency`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use transmitter_core::{FlagState, ScopeKey};
use transmitter_rules::Demographics;

use crate::error::WorkflowResult;

/// Source of full records (the record system's export API)
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Raw record as exported: an object, or a list whose first entry is the record
    async fn fetch_record(&self, scope: &ScopeKey) -> WorkflowResult<Value>;
}

/// Directory that knows which site a participant is paired with
#[async_trait]
pub trait AffiliationDirectory: Send + Sync {
    /// `Yes` when paired with this site, `No` when paired elsewhere,
    /// `Unknown` when the directory cannot tell
    async fn lookup_pairing(&self, participant_id: &str) -> WorkflowResult<FlagState>;
}

/// Subject as known to the clinical trial registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySubject {
    /// Registry-assigned subject number
    pub subject_id: String,
    pub demographics: Demographics,
}

/// Clinical trial management system that participants are registered in
#[async_trait]
pub trait ClinicalRegistry: Send + Sync {
    /// Look a subject up by medical record number
    async fn find_subject(&self, study_tag: &str, mrn: &str)
        -> WorkflowResult<Option<RegistrySubject>>;

    /// Register the subject on the study's protocol
    async fn register_subject(&self, study_tag: &str, subject: &RegistrySubject)
        -> WorkflowResult<()>;
}
