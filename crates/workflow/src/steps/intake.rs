//! Intake step - fetch and normalize the full record

use std::sync::Arc;

use async_trait::async_trait;
use transmitter_core::RecordSnapshot;
use transmitter_lock::RecordSection;

use crate::collaborators::RecordSource;
use crate::context::WorkflowContext;
use crate::error::{WorkflowError, WorkflowResult};
use crate::step::{StepOutcome, WorkflowStep};

/// Loads the record named by the section into the context
pub struct IntakeStep {
    source: Arc<dyn RecordSource>,
}

impl IntakeStep {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl WorkflowStep for IntakeStep {
    fn name(&self) -> &str {
        "intake"
    }

    async fn run(
        &self,
        section: &RecordSection,
        ctx: &mut WorkflowContext,
    ) -> WorkflowResult<StepOutcome> {
        let raw = self.source.fetch_record(section.scope()).await?;
        let snapshot = RecordSnapshot::from_json(&raw)
            .map_err(|e| WorkflowError::dependency("record-source", e.to_string()))?;

        tracing::info!(
            scope = %section.scope(),
            fields = snapshot.len(),
            "Retrieved full record"
        );
        ctx.snapshot = Some(snapshot);
        Ok(StepOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::steps::testing::{context, scope};
    use serde_json::{json, Value};
    use transmitter_core::ScopeKey;
    use transmitter_lock::LockRegistry;

    struct FixedSource(Value);

    #[async_trait]
    impl RecordSource for FixedSource {
        async fn fetch_record(&self, _scope: &ScopeKey) -> WorkflowResult<Value> {
            Ok(self.0.clone())
        }
    }

    struct DownSource;

    #[async_trait]
    impl RecordSource for DownSource {
        async fn fetch_record(&self, _scope: &ScopeKey) -> WorkflowResult<Value> {
            Err(WorkflowError::dependency("record-source", "connection refused"))
        }
    }

    #[tokio::test]
    async fn test_list_record_uses_first_entry() {
        let step = IntakeStep::new(Arc::new(FixedSource(json!([
            {"record_id": "17", "mrn": "123"},
            {"record_id": "17", "mrn": "999"}
        ]))));
        let locks = LockRegistry::new();
        let section = locks.acquire(&scope()).await;
        let mut ctx = context();

        let outcome = step.run(&section, &mut ctx).await.unwrap();

        assert_eq!(outcome, StepOutcome::Continue);
        assert_eq!(ctx.snapshot().unwrap().field("mrn"), "123");
    }

    #[tokio::test]
    async fn test_empty_record_is_dependency_error() {
        let step = IntakeStep::new(Arc::new(FixedSource(json!([]))));
        let locks = LockRegistry::new();
        let section = locks.acquire(&scope()).await;
        let mut ctx = context();

        let err = step.run(&section, &mut ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dependency);
        assert!(ctx.snapshot.is_none());
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let step = IntakeStep::new(Arc::new(DownSource));
        let locks = LockRegistry::new();
        let section = locks.acquire(&scope()).await;
        let mut ctx = context();

        let err = step.run(&section, &mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
