//! Transmitter Core - Domain types
//!
//! This crate contains the fundamental types shared by every Transmitter crate:
//! - `ScopeKey`: (tenant, project, record) identity of a study record
//! - `RecordSnapshot`: normalized flat view of a record's fields
//! - `FlagValue` / `FlagState`: yes/no ledger flags and their derived state
//! - `InboundRequest` / `Response`: the boundary shapes of one notification

pub mod error;
pub mod flag;
pub mod record;
pub mod request;
pub mod scope;

pub use error::{CoreError, CoreResult};
pub use flag::{FlagState, FlagValue};
pub use record::RecordSnapshot;
pub use request::{InboundRequest, Response, TriggerPayload};
pub use scope::ScopeKey;
