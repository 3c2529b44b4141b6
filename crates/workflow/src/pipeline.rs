//! Pipeline - runs steps in order, stopping at the first halt or error

use std::sync::Arc;

use transmitter_core::Response;
use transmitter_lock::RecordSection;

use crate::context::WorkflowContext;
use crate::error::{WorkflowError, WorkflowResult};
use crate::step::{StepOutcome, WorkflowStep};

/// Result of a run that did not fail
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Context as the last executed step left it
    pub context: WorkflowContext,

    /// Halting step's response, or `200` after a full run
    pub response: Response,

    /// Name of the step that halted the run
    pub halted_by: Option<String>,
}

impl PipelineOutcome {
    pub fn was_halted(&self) -> bool {
        self.halted_by.is_some()
    }
}

/// Ordered list of workflow steps
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn WorkflowStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step (builder style)
    pub fn with_step(mut self, step: impl WorkflowStep + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Append a shared step
    pub fn push(&mut self, step: Arc<dyn WorkflowStep>) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Run every step in order over `ctx`
    ///
    /// The caller holds `section` for the whole run. An error from any step
    /// is returned as-is and no later step runs.
    pub async fn run(
        &self,
        section: &RecordSection,
        mut ctx: WorkflowContext,
    ) -> WorkflowResult<PipelineOutcome> {
        if &ctx.scope != section.scope() {
            return Err(WorkflowError::logic(format!(
                "context for {} run under section for {}",
                ctx.scope,
                section.scope()
            )));
        }

        for step in &self.steps {
            tracing::debug!(scope = %ctx.scope, step = step.name(), "Running step");

            match step.run(section, &mut ctx).await {
                Ok(StepOutcome::Continue) => continue,
                Ok(StepOutcome::Halt(response)) => {
                    tracing::info!(
                        scope = %ctx.scope,
                        step = step.name(),
                        status = response.status,
                        "Step halted pipeline"
                    );
                    let halted_by = Some(step.name().to_string());
                    return Ok(PipelineOutcome {
                        context: ctx,
                        response,
                        halted_by,
                    });
                }
                Err(e) => {
                    tracing::error!(
                        scope = %ctx.scope,
                        step = step.name(),
                        kind = %e.kind(),
                        error = %e,
                        "Step failed"
                    );
                    return Err(e);
                }
            }
        }

        tracing::debug!(scope = %ctx.scope, steps = self.steps.len(), "Pipeline completed");
        Ok(PipelineOutcome {
            context: ctx,
            response: Response::OK,
            halted_by: None,
        })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}
