//! Event assessment step

use std::sync::Arc;

use async_trait::async_trait;
use transmitter_ledger::LedgerStore;
use transmitter_lock::RecordSection;
use transmitter_rules::RuleEngine;

use crate::context::WorkflowContext;
use crate::error::WorkflowResult;
use crate::step::{StepOutcome, WorkflowStep};

/// Assesses enrollment then withdrawal and records both outcomes in the context
pub struct AssessEventsStep {
    ledger: Arc<dyn LedgerStore>,
    engine: RuleEngine,
}

impl AssessEventsStep {
    pub fn new(ledger: Arc<dyn LedgerStore>, engine: RuleEngine) -> Self {
        Self { ledger, engine }
    }
}

#[async_trait]
impl WorkflowStep for AssessEventsStep {
    fn name(&self) -> &str {
        "assess-events"
    }

    async fn run(
        &self,
        section: &RecordSection,
        ctx: &mut WorkflowContext,
    ) -> WorkflowResult<StepOutcome> {
        let result = self
            .engine
            .assess_all(&*self.ledger, section, ctx.snapshot()?)?;

        for assessment in result.iter() {
            ctx.record_assessment(assessment);
        }
        Ok(StepOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkflowError;
    use crate::steps::testing::{context, enrolled_snapshot, scope};
    use transmitter_core::FlagValue;
    use transmitter_ledger::MemoryLedger;
    use transmitter_lock::LockRegistry;
    use transmitter_rules::{HAS_ENROLLED, HAS_WITHDRAWN};

    #[tokio::test]
    async fn test_outcomes_recorded_in_context() {
        let ledger = Arc::new(MemoryLedger::new());
        let step = AssessEventsStep::new(ledger.clone(), RuleEngine::default());
        let locks = LockRegistry::new();
        let section = locks.acquire(&scope()).await;
        let mut ctx = context().with_snapshot(enrolled_snapshot());

        let outcome = step.run(&section, &mut ctx).await.unwrap();

        assert_eq!(outcome, StepOutcome::Continue);
        assert_eq!(ctx.assessment(HAS_ENROLLED), Some(FlagValue::Yes));
        assert_eq!(ctx.assessment(HAS_WITHDRAWN), Some(FlagValue::No));
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_requires_snapshot() {
        let ledger = Arc::new(MemoryLedger::new());
        let step = AssessEventsStep::new(ledger, RuleEngine::default());
        let locks = LockRegistry::new();
        let section = locks.acquire(&scope()).await;
        let mut ctx = context();

        let err = step.run(&section, &mut ctx).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Logic(_)));
    }
}
