//! Registry enrollment step
//!
//! Registers an enrolled participant in the clinical trial registry once the
//! registry's demographics agree closely enough with the record's. Records
//! that cannot be registered are flagged for manual reconciliation instead.

use std::sync::Arc;

use async_trait::async_trait;
use transmitter_core::FlagValue;
use transmitter_ledger::{FlagLedger, LedgerStore};
use transmitter_lock::RecordSection;
use transmitter_rules::{score, Demographics, RecordFields, HAS_ENROLLED};

use crate::collaborators::ClinicalRegistry;
use crate::context::WorkflowContext;
use crate::error::WorkflowResult;
use crate::step::{StepOutcome, WorkflowStep};

/// Set when enrollment went through the older ticket-based pathway
pub const ENROLLMENT_TICKET_CREATED: &str = "jira-enrollment-ticket-created";

/// Set once the participant is registered on the protocol
pub const REGISTERED_IN_REGISTRY: &str = "enrollment-registered-in-oncore";

/// Reconciliation flag: registry has no subject for the MRN
pub const DEMOGRAPHICS_NOT_FOUND: &str = "oncore-demographics-not-found";

/// Reconciliation flag: registry demographics scored below the threshold
pub const DEMOGRAPHICS_MISMATCH: &str = "demographics-mismatch";

pub struct RegistryEnrollStep {
    ledger: Arc<dyn LedgerStore>,
    registry: Arc<dyn ClinicalRegistry>,
    fields: RecordFields,
    min_confidence: u8,
}

impl RegistryEnrollStep {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        registry: Arc<dyn ClinicalRegistry>,
        fields: RecordFields,
        min_confidence: u8,
    ) -> Self {
        Self {
            ledger,
            registry,
            fields,
            min_confidence,
        }
    }

    fn already_handled(&self, section: &RecordSection) -> WorkflowResult<bool> {
        let scope = section.scope();
        Ok(self.ledger.flag_is_set(scope, ENROLLMENT_TICKET_CREATED)?
            || self.ledger.flag_is_set(scope, REGISTERED_IN_REGISTRY)?)
    }
}

#[async_trait]
impl WorkflowStep for RegistryEnrollStep {
    fn name(&self) -> &str {
        "registry-enroll"
    }

    async fn run(
        &self,
        section: &RecordSection,
        ctx: &mut WorkflowContext,
    ) -> WorkflowResult<StepOutcome> {
        let scope = section.scope();

        if ctx.assessment(HAS_ENROLLED) != Some(FlagValue::Yes) || self.already_handled(section)? {
            tracing::debug!(scope = %scope, "No registry action");
            return Ok(StepOutcome::Continue);
        }

        let (mrn, local) = {
            let snapshot = ctx.snapshot()?;
            (
                snapshot.field(&self.fields.mrn).to_string(),
                Demographics::from_snapshot(snapshot, &self.fields),
            )
        };

        let Some(subject) = self.registry.find_subject(&ctx.study_tag, &mrn).await? else {
            self.ledger.set_flag_if_unset(section, DEMOGRAPHICS_NOT_FOUND)?;
            tracing::info!(scope = %scope, "No demographics found in registry");
            return Ok(StepOutcome::Continue);
        };

        let confidence = score(&local, &subject.demographics);
        if confidence < self.min_confidence {
            self.ledger.set_flag_if_unset(section, DEMOGRAPHICS_MISMATCH)?;
            tracing::info!(
                scope = %scope,
                confidence,
                min_confidence = self.min_confidence,
                "Demographics confidence below threshold"
            );
            return Ok(StepOutcome::Continue);
        }

        self.ledger.unset_flag_if_set(section, DEMOGRAPHICS_NOT_FOUND)?;
        self.ledger.unset_flag_if_set(section, DEMOGRAPHICS_MISMATCH)?;

        tracing::info!(scope = %scope, subject = %subject.subject_id, "Registering subject");
        self.registry.register_subject(&ctx.study_tag, &subject).await?;
        self.ledger.put_flag(section, REGISTERED_IN_REGISTRY, FlagValue::Yes)?;
        ctx.annotate("registry-subject", subject.subject_id.clone());

        Ok(StepOutcome::Continue)
    }
}
