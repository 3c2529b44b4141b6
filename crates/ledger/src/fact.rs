//! Ledger fact - one immutable attribute observation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use transmitter_core::ScopeKey;

/// An immutable `attribute = value` observation about one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFact {
    /// Unique fact ID
    pub id: String,

    /// Append position within the store (monotonic, starts at 1)
    pub sequence: u64,

    /// Record the fact belongs to
    pub scope: ScopeKey,

    pub attribute: String,

    pub value: String,

    /// Write timestamp; the latest one is the current value
    pub recorded_at: DateTime<Utc>,
}

impl LedgerFact {
    pub fn new(
        sequence: u64,
        scope: ScopeKey,
        attribute: impl Into<String>,
        value: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sequence,
            scope,
            attribute: attribute.into(),
            value: value.into(),
            recorded_at,
        }
    }

    /// Ordering key for "latest": timestamp first, append order on ties
    pub fn recency(&self) -> (DateTime<Utc>, u64) {
        (self.recorded_at, self.sequence)
    }
}

/// Latest fact by timestamp, ties broken by later append
pub fn latest_of<'a>(facts: impl IntoIterator<Item = &'a LedgerFact>) -> Option<&'a LedgerFact> {
    facts.into_iter().max_by_key(|fact| fact.recency())
}
