//! Transmitter Workflow - ordered steps over one record
//!
//! ```text
//! RecordSection acquired
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ IntakeStep                  │ ← fetch + normalize the full record
//! └─────────────────────────────┘
//!     │ Continue
//!     ▼
//! ┌─────────────────────────────┐
//! │ ConfirmAffiliationStep      │ ← Halt(200) for records we must not process
//! └─────────────────────────────┘
//!     │ Continue
//!     ▼
//! ┌─────────────────────────────┐
//! │ AssessEventsStep            │ ← note enrollment / withdrawal once
//! └─────────────────────────────┘
//!     │ Continue
//!     ▼
//! ┌─────────────────────────────┐
//! │ RegistryEnrollStep          │ ← register enrolled participants
//! └─────────────────────────────┘
//!     │
//!     ▼
//! Response (200 unless a step halted)
//! ```
//!
//! A step either continues, halts with a response, or fails. A failure
//! aborts the run; facts already appended stay in the ledger.

pub mod collaborators;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod step;
pub mod steps;

pub use collaborators::{AffiliationDirectory, ClinicalRegistry, RecordSource, RegistrySubject};
pub use context::WorkflowContext;
pub use error::{ErrorKind, WorkflowError, WorkflowResult};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use step::{StepOutcome, WorkflowStep};
pub use steps::{AssessEventsStep, ConfirmAffiliationStep, IntakeStep, RegistryEnrollStep};
