//! Affiliation confirmation step
//!
//! Only participants paired with this site are processed. The check goes
//! from cheapest to most expensive source and stops at the first answer:
//!
//! 1. the record itself (can only say "paired elsewhere")
//! 2. the ledger's cached answer
//! 3. the affiliation directory, whose answer is cached in the ledger
//!
//! Any run that cannot confirm the pairing halts with `200`.

use std::sync::Arc;

use async_trait::async_trait;
use transmitter_core::{FlagState, FlagValue};
use transmitter_ledger::{FlagLedger, LedgerStore};
use transmitter_lock::RecordSection;
use transmitter_rules::RecordFields;

use crate::collaborators::AffiliationDirectory;
use crate::context::WorkflowContext;
use crate::error::WorkflowResult;
use crate::step::{StepOutcome, WorkflowStep};

/// Ledger attribute caching whether the participant is paired with this site
pub const WCM_PAIRED: &str = "aou-wcm-paired";

pub struct ConfirmAffiliationStep {
    ledger: Arc<dyn LedgerStore>,
    directory: Arc<dyn AffiliationDirectory>,
    fields: RecordFields,
}

impl ConfirmAffiliationStep {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        directory: Arc<dyn AffiliationDirectory>,
        fields: RecordFields,
    ) -> Self {
        Self {
            ledger,
            directory,
            fields,
        }
    }
}

#[async_trait]
impl WorkflowStep for ConfirmAffiliationStep {
    fn name(&self) -> &str {
        "confirm-affiliation"
    }

    async fn run(
        &self,
        section: &RecordSection,
        ctx: &mut WorkflowContext,
    ) -> WorkflowResult<StepOutcome> {
        let scope = section.scope();
        let (participant_id, enrolled_elsewhere) = {
            let snapshot = ctx.snapshot()?;
            (
                snapshot.field(&self.fields.participant_id).to_string(),
                snapshot.field(&self.fields.other_enrollment) == "1",
            )
        };

        if participant_id.is_empty() {
            tracing::info!(scope = %scope, "No participant ID; nothing to do");
            return Ok(StepOutcome::done());
        }

        if enrolled_elsewhere {
            tracing::info!(scope = %scope, "Record shows enrollment at another site");
            return Ok(StepOutcome::done());
        }

        match self.ledger.flag_state(scope, WCM_PAIRED)? {
            FlagState::Yes => {
                tracing::debug!(scope = %scope, "Ledger confirms pairing");
                ctx.annotate("affiliation", "ledger");
                return Ok(StepOutcome::Continue);
            }
            FlagState::No => {
                tracing::info!(scope = %scope, "Ledger shows pairing with another site");
                return Ok(StepOutcome::done());
            }
            FlagState::Unknown => {}
        }

        let pairing = match self.directory.lookup_pairing(&participant_id).await {
            Ok(pairing) => pairing,
            Err(e) => {
                tracing::warn!(scope = %scope, error = %e, "Affiliation lookup failed");
                FlagState::Unknown
            }
        };

        match pairing {
            FlagState::Yes => {
                self.ledger.put_flag(section, WCM_PAIRED, FlagValue::Yes)?;
                ctx.annotate("affiliation", "directory");
                tracing::info!(scope = %scope, "Directory confirms pairing");
                Ok(StepOutcome::Continue)
            }
            FlagState::No => {
                self.ledger.put_flag(section, WCM_PAIRED, FlagValue::No)?;
                tracing::info!(scope = %scope, "Directory shows pairing with another site");
                Ok(StepOutcome::done())
            }
            FlagState::Unknown => {
                tracing::info!(
                    scope = %scope,
                    reconciliation = true,
                    "Could not determine affiliation"
                );
                Ok(StepOutcome::done())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkflowError;
    use crate::steps::testing::{context, enrolled_snapshot, scope};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use transmitter_ledger::MemoryLedger;
    use transmitter_lock::LockRegistry;

    struct FakeDirectory {
        answer: Option<FlagState>,
        calls: AtomicUsize,
    }

    impl FakeDirectory {
        fn answering(answer: FlagState) -> Arc<Self> {
            Arc::new(Self {
                answer: Some(answer),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                answer: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AffiliationDirectory for FakeDirectory {
        async fn lookup_pairing(&self, _participant_id: &str) -> WorkflowResult<FlagState> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .ok_or_else(|| WorkflowError::dependency("affiliation-directory", "HTTP 503"))
        }
    }

    async fn run_step(
        ledger: &Arc<MemoryLedger>,
        directory: &Arc<FakeDirectory>,
        ctx: &mut WorkflowContext,
    ) -> StepOutcome {
        let step = ConfirmAffiliationStep::new(
            ledger.clone(),
            directory.clone(),
            RecordFields::default(),
        );
        let locks = LockRegistry::new();
        let section = locks.acquire(&scope()).await;
        step.run(&section, ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_no_participant_id_halts() {
        let ledger = Arc::new(MemoryLedger::new());
        let directory = FakeDirectory::answering(FlagState::Yes);
        let mut snapshot = enrolled_snapshot();
        snapshot.set("pmi_id_test", "");
        let mut ctx = context().with_snapshot(snapshot);

        let outcome = run_step(&ledger, &directory, &mut ctx).await;

        assert_eq!(outcome, StepOutcome::done());
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_enrollment_halts() {
        let ledger = Arc::new(MemoryLedger::new());
        let directory = FakeDirectory::answering(FlagState::Yes);
        let mut snapshot = enrolled_snapshot();
        snapshot.set("other_enrollment", "1");
        let mut ctx = context().with_snapshot(snapshot);

        assert!(run_step(&ledger, &directory, &mut ctx).await.is_halt());
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_cached_pairing_skips_directory() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.put(&scope(), WCM_PAIRED, "yes").unwrap();
        let directory = FakeDirectory::answering(FlagState::No);
        let mut ctx = context().with_snapshot(enrolled_snapshot());

        let outcome = run_step(&ledger, &directory, &mut ctx).await;

        assert_eq!(outcome, StepOutcome::Continue);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.annotation("affiliation"), Some("ledger"));
    }

    #[tokio::test]
    async fn test_cached_non_pairing_halts() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.put(&scope(), WCM_PAIRED, "no").unwrap();
        let directory = FakeDirectory::answering(FlagState::Yes);
        let mut ctx = context().with_snapshot(enrolled_snapshot());

        assert!(run_step(&ledger, &directory, &mut ctx).await.is_halt());
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_directory_answer_is_cached() {
        let ledger = Arc::new(MemoryLedger::new());
        let directory = FakeDirectory::answering(FlagState::Yes);
        let mut ctx = context().with_snapshot(enrolled_snapshot());

        let outcome = run_step(&ledger, &directory, &mut ctx).await;

        assert_eq!(outcome, StepOutcome::Continue);
        assert!(ledger.flag_is_set(&scope(), WCM_PAIRED).unwrap());
    }

    #[tokio::test]
    async fn test_directory_non_pairing_is_cached_and_halts() {
        let ledger = Arc::new(MemoryLedger::new());
        let directory = FakeDirectory::answering(FlagState::No);
        let mut ctx = context().with_snapshot(enrolled_snapshot());

        assert!(run_step(&ledger, &directory, &mut ctx).await.is_halt());
        assert_eq!(
            ledger.flag_state(&scope(), WCM_PAIRED).unwrap(),
            FlagState::No
        );
    }

    #[tokio::test]
    async fn test_unknown_or_failed_lookup_halts_without_caching() {
        for directory in [FakeDirectory::answering(FlagState::Unknown), FakeDirectory::failing()] {
            let ledger = Arc::new(MemoryLedger::new());
            let mut ctx = context().with_snapshot(enrolled_snapshot());

            assert!(run_step(&ledger, &directory, &mut ctx).await.is_halt());
            assert_eq!(directory.calls.load(Ordering::SeqCst), 1);
            assert!(ledger.is_empty());
        }
    }
}
