//! Lock Registry - lazily created exclusive lock per record
//!
//! The map itself sits behind one short-held guard that is only taken to look
//! up or insert a record's lock. Waiting for the record lock happens outside
//! the guard, so long-running work on one record only contends with other
//! work on that same record.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Mutex as RecordMutex;
use transmitter_core::ScopeKey;

use crate::section::RecordSection;

type RecordLock = Arc<RecordMutex<()>>;

/// Registry of per-record locks
///
/// Constructed once by the owning service and shared by reference (`Arc`).
/// Entries are created on first use. They are never removed implicitly; call
/// [`LockRegistry::prune_idle`] to drop entries nobody holds or awaits.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<ScopeKey, RecordLock>>,
}

impl LockRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the critical section for `key`, waiting while another task holds it
    ///
    /// Waiters are not served in any guaranteed order.
    pub async fn acquire(&self, key: &ScopeKey) -> RecordSection {
        let lock = self.lock_for(key);

        tracing::debug!(scope = %key, "Waiting for record lock");
        let guard = lock.lock_owned().await;
        tracing::debug!(scope = %key, "Entered record section");

        RecordSection::new(key.clone(), guard)
    }

    /// Enter the critical section for `key` only if it is free right now
    pub fn try_acquire(&self, key: &ScopeKey) -> Option<RecordSection> {
        let lock = self.lock_for(key);
        lock.try_lock_owned()
            .ok()
            .map(|guard| RecordSection::new(key.clone(), guard))
    }

    /// Number of records with a lock entry
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    /// Whether a lock entry exists for `key`
    pub fn contains(&self, key: &ScopeKey) -> bool {
        self.map().contains_key(key)
    }

    /// Drop entries that no task currently holds or waits on
    ///
    /// Returns how many entries were removed. An acquirer clones the entry's
    /// `Arc` under the guard before waiting, so a referenced entry always has
    /// a strong count above one and is kept.
    pub fn prune_idle(&self) -> usize {
        let mut locks = self.map();
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let removed = before - locks.len();
        if removed > 0 {
            tracing::info!(removed, remaining = locks.len(), "Pruned idle record locks");
        }
        removed
    }

    /// Double-checked insertion under the guard
    fn lock_for(&self, key: &ScopeKey) -> RecordLock {
        let mut locks = self.map();
        if let Some(existing) = locks.get(key) {
            return Arc::clone(existing);
        }

        tracing::info!(scope = %key, "Creating new record lock");
        let lock = Arc::new(RecordMutex::new(()));
        locks.insert(key.clone(), Arc::clone(&lock));
        lock
    }

    // The map has no invariant a panicking holder could break mid-update,
    // so a poisoned guard is still usable.
    fn map(&self) -> MutexGuard<'_, HashMap<ScopeKey, RecordLock>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
