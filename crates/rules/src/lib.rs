//! Transmitter Rules - study policy over record snapshots
//!
//! ```text
//! RecordSnapshot ──► raw evidence ──┐
//!                                   ├──► yes / no ──► note once in ledger
//! Ledger history ──► already noted ─┘
//! ```
//!
//! Once an event has been noted as `yes` it stays `yes`, even if the record
//! is later amended and no longer carries the evidence.

pub mod engine;
pub mod error;
pub mod fields;
pub mod matching;

pub use engine::{Assessment, EventAssessment, RuleEngine, HAS_ENROLLED, HAS_WITHDRAWN};
pub use error::{RuleError, RuleResult};
pub use fields::RecordFields;
pub use matching::{score, Demographics, MAX_CONFIDENCE};
