//! Record section - scoped ownership of one record's lock

use std::time::{Duration, Instant};

use tokio::sync::OwnedMutexGuard;
use transmitter_core::ScopeKey;

/// Proof that the holder is inside the critical section of `scope`
///
/// Only [`crate::LockRegistry`] can create one. The lock is released when the
/// section is dropped, including during panic unwinding, so there is no
/// manual release call.
///
/// Operations that read-then-write the ledger take `&RecordSection` so they
/// cannot be called outside a critical section.
#[derive(Debug)]
pub struct RecordSection {
    scope: ScopeKey,
    entered_at: Instant,
    _guard: OwnedMutexGuard<()>,
}

impl RecordSection {
    pub(crate) fn new(scope: ScopeKey, guard: OwnedMutexGuard<()>) -> Self {
        Self {
            scope,
            entered_at: Instant::now(),
            _guard: guard,
        }
    }

    /// The record this section serializes
    pub fn scope(&self) -> &ScopeKey {
        &self.scope
    }

    /// How long the section has been held
    pub fn held_for(&self) -> Duration {
        self.entered_at.elapsed()
    }
}

impl Drop for RecordSection {
    fn drop(&mut self) {
        tracing::debug!(
            scope = %self.scope,
            held_ms = self.held_for().as_millis() as u64,
            "Leaving record section"
        );
    }
}
