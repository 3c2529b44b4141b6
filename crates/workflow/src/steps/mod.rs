//! Built-in workflow steps for study record events

pub mod affiliation;
pub mod events;
pub mod intake;
pub mod registry_enroll;

pub use affiliation::{ConfirmAffiliationStep, WCM_PAIRED};
pub use events::AssessEventsStep;
pub use intake::IntakeStep;
pub use registry_enroll::{
    RegistryEnrollStep, DEMOGRAPHICS_MISMATCH, DEMOGRAPHICS_NOT_FOUND, ENROLLMENT_TICKET_CREATED,
    REGISTERED_IN_REGISTRY,
};
