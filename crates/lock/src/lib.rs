//! Transmitter Lock - per-record critical sections
//!
//! ```text
//! event(prod2525.17) ──┐                     ┌── section(prod2525.17) ── pipeline
//! event(prod2525.17) ──┼── LockRegistry ─────┤   (second event waits)
//! event(prod2525.18) ──┘   (guard: map only) └── section(prod2525.18) ── pipeline
//! ```
//!
//! Notifications about different records run concurrently; notifications
//! about the same record are serialized. A [`RecordSection`] is the proof that
//! the caller currently holds a record's lock.

pub mod registry;
pub mod section;

pub use registry::LockRegistry;
pub use section::RecordSection;
