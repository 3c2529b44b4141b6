//! Workflow context - state shared by the steps of one run

use std::collections::BTreeMap;

use transmitter_core::{FlagValue, RecordSnapshot, ScopeKey, TriggerPayload};
use transmitter_rules::Assessment;

use crate::error::{WorkflowError, WorkflowResult};

/// Context owned by exactly one pipeline run
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    /// Record being processed
    pub scope: ScopeKey,

    /// Study whose configuration applies
    pub study_tag: String,

    /// Trigger notification that started the run
    pub trigger: TriggerPayload,

    /// Full record, set by the intake step
    pub snapshot: Option<RecordSnapshot>,

    /// Assessment outcomes by ledger attribute
    pub assessments: BTreeMap<String, FlagValue>,

    /// Free-form notes steps leave for later steps and for logging
    pub annotations: BTreeMap<String, String>,
}

impl WorkflowContext {
    pub fn new(scope: ScopeKey, study_tag: impl Into<String>, trigger: TriggerPayload) -> Self {
        Self {
            scope,
            study_tag: study_tag.into(),
            trigger,
            snapshot: None,
            assessments: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    /// Set the snapshot up front (tests, replay)
    pub fn with_snapshot(mut self, snapshot: RecordSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// The snapshot; a step that runs before intake is a wiring defect
    pub fn snapshot(&self) -> WorkflowResult<&RecordSnapshot> {
        self.snapshot.as_ref().ok_or_else(|| {
            WorkflowError::logic(format!("no record snapshot in context for {}", self.scope))
        })
    }

    pub fn record_assessment(&mut self, assessment: &Assessment) {
        self.assessments
            .insert(assessment.attribute.to_string(), assessment.value);
    }

    pub fn assessment(&self, attribute: &str) -> Option<FlagValue> {
        self.assessments.get(attribute).copied()
    }

    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.annotations.insert(key.into(), value.into());
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}
