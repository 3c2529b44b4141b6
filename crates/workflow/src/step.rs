//! Workflow step trait

use async_trait::async_trait;
use transmitter_core::Response;
use transmitter_lock::RecordSection;

use crate::context::WorkflowContext;
use crate::error::WorkflowResult;

/// What the pipeline does after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Run the next step
    Continue,
    /// Stop the run and answer with this response
    Halt(Response),
}

impl StepOutcome {
    /// Stop with `200`: nothing more to do for this record
    pub fn done() -> Self {
        StepOutcome::Halt(Response::OK)
    }

    pub fn is_halt(&self) -> bool {
        matches!(self, StepOutcome::Halt(_))
    }
}

/// One unit of processing inside a record's critical section
///
/// Return `Ok(StepOutcome::Continue)` to hand over to the next step,
/// `Ok(StepOutcome::Halt(_))` to end the run with a response, or `Err(_)` to
/// abort it.
#[async_trait]
pub trait WorkflowStep: Send + Sync {
    /// Step name for logging
    fn name(&self) -> &str;

    async fn run(
        &self,
        section: &RecordSection,
        ctx: &mut WorkflowContext,
    ) -> WorkflowResult<StepOutcome>;
}
