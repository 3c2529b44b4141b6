//! In-memory ledger backend
//!
//! Used for tests and ephemeral runs, and as the read index behind
//! [`crate::JsonlLedger`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use transmitter_core::ScopeKey;

use crate::error::LedgerResult;
use crate::fact::LedgerFact;
use crate::store::LedgerStore;

/// Facts grouped by record, each group in append order
#[derive(Debug, Default)]
pub(crate) struct FactIndex {
    by_scope: HashMap<ScopeKey, Vec<LedgerFact>>,
    last_sequence: u64,
    len: usize,
}

impl FactIndex {
    pub(crate) fn next_sequence(&self) -> u64 {
        self.last_sequence + 1
    }

    pub(crate) fn insert(&mut self, fact: LedgerFact) {
        self.last_sequence = self.last_sequence.max(fact.sequence);
        self.len += 1;
        self.by_scope.entry(fact.scope.clone()).or_default().push(fact);
    }

    pub(crate) fn history(&self, scope: &ScopeKey, attribute: &str) -> Vec<LedgerFact> {
        self.by_scope
            .get(scope)
            .map(|facts| {
                facts
                    .iter()
                    .filter(|fact| fact.attribute == attribute)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn facts(&self, scope: &ScopeKey) -> Vec<LedgerFact> {
        self.by_scope.get(scope).cloned().unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

/// Ledger kept entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryLedger {
    index: RwLock<FactIndex>,
}

impl MemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of facts
    pub fn len(&self) -> usize {
        self.index.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LedgerStore for MemoryLedger {
    fn append_at(
        &self,
        scope: &ScopeKey,
        attribute: &str,
        value: &str,
        recorded_at: DateTime<Utc>,
    ) -> LedgerResult<LedgerFact> {
        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        let fact = LedgerFact::new(
            index.next_sequence(),
            scope.clone(),
            attribute,
            value,
            recorded_at,
        );
        index.insert(fact.clone());

        tracing::debug!(
            scope = %scope,
            attribute,
            value,
            sequence = fact.sequence,
            "Fact appended"
        );
        Ok(fact)
    }

    fn history(&self, scope: &ScopeKey, attribute: &str) -> LedgerResult<Vec<LedgerFact>> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        Ok(index.history(scope, attribute))
    }

    fn facts(&self, scope: &ScopeKey) -> LedgerResult<Vec<LedgerFact>> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        Ok(index.facts(scope))
    }
}
