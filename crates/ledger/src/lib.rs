//! Transmitter Ledger - append-only record facts
//!
//! A fact is `(scope, attribute, value, recorded_at)`. Facts are never updated
//! or deleted; the current value of an attribute is the value of its most
//! recent fact.
//!
//! ```text
//! prod2525.17  has-enrolled   yes   2024-05-01T10:00:00Z
//! prod2525.17  aou-wcm-paired yes   2024-05-01T10:00:01Z
//! prod2525.17  has-withdrawn  yes   2024-09-12T08:30:00Z
//! ```
//!
//! ## Key Components
//!
//! - [`store::LedgerStore`] - the four primitives every backend provides
//! - [`memory::MemoryLedger`] - in-process backend
//! - [`jsonl::JsonlLedger`] - durable append-only JSONL backend
//! - [`flags::FlagLedger`] - yes/no flag helpers; conditional writes require a
//!   [`transmitter_lock::RecordSection`]

pub mod error;
pub mod fact;
pub mod flags;
pub mod jsonl;
pub mod memory;
pub mod store;

pub use error::{LedgerError, LedgerResult};
pub use fact::LedgerFact;
pub use flags::FlagLedger;
pub use jsonl::JsonlLedger;
pub use memory::MemoryLedger;
pub use store::LedgerStore;
