//! LedgerStore - the primitives every backend provides

use chrono::{DateTime, Utc};
use transmitter_core::ScopeKey;

use crate::error::LedgerResult;
use crate::fact::{latest_of, LedgerFact};

/// Append-only store of record facts
///
/// Each `append_at`/`put` is one independent atomic unit against the backend;
/// there are no transactions spanning several calls.
///
/// # Ties
///
/// When two facts for the same scope and attribute carry the same timestamp,
/// which one is "latest" is not part of this contract. The backends in this
/// crate resolve ties by append order (later wins), but callers must not rely
/// on that across backends.
pub trait LedgerStore: Send + Sync {
    /// Append a fact with an explicit timestamp (replay/import)
    fn append_at(
        &self,
        scope: &ScopeKey,
        attribute: &str,
        value: &str,
        recorded_at: DateTime<Utc>,
    ) -> LedgerResult<LedgerFact>;

    /// All facts for one attribute of a record, in append order
    fn history(&self, scope: &ScopeKey, attribute: &str) -> LedgerResult<Vec<LedgerFact>>;

    /// All facts for a record, in append order
    fn facts(&self, scope: &ScopeKey) -> LedgerResult<Vec<LedgerFact>>;

    /// Append a fact stamped with the current time
    fn put(&self, scope: &ScopeKey, attribute: &str, value: &str) -> LedgerResult<LedgerFact> {
        self.append_at(scope, attribute, value, Utc::now())
    }

    /// Whether at least one fact was recorded for the attribute
    fn exists(&self, scope: &ScopeKey, attribute: &str) -> LedgerResult<bool> {
        Ok(!self.history(scope, attribute)?.is_empty())
    }

    /// Value of the fact with the greatest timestamp, if any
    fn latest(&self, scope: &ScopeKey, attribute: &str) -> LedgerResult<Option<String>> {
        let history = self.history(scope, attribute)?;
        Ok(latest_of(&history).map(|fact| fact.value.clone()))
    }
}
