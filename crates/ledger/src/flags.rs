//! Flag helpers over any [`LedgerStore`]
//!
//! A flag is an attribute whose value is `yes` or `no`; absence means unset.
//! Reads need only a scope. The conditional writers read and then append,
//! which is only race-free while the record's lock is held, so they take the
//! [`RecordSection`] and write to its scope.

use transmitter_core::{FlagState, FlagValue, ScopeKey};
use transmitter_lock::RecordSection;

use crate::error::LedgerResult;
use crate::fact::LedgerFact;
use crate::store::LedgerStore;

/// Flag operations available on every ledger store
pub trait FlagLedger: LedgerStore {
    /// Derived state of the flag (unknown when never written)
    fn flag_state(&self, scope: &ScopeKey, attribute: &str) -> LedgerResult<FlagState> {
        let latest = self.latest(scope, attribute)?;
        Ok(FlagState::from_latest(latest.as_deref()))
    }

    /// Latest value is `yes`
    fn flag_is_set(&self, scope: &ScopeKey, attribute: &str) -> LedgerResult<bool> {
        Ok(self.flag_state(scope, attribute)?.is_set())
    }

    /// Append a flag value for the section's record
    fn put_flag(
        &self,
        section: &RecordSection,
        attribute: &str,
        value: FlagValue,
    ) -> LedgerResult<LedgerFact> {
        self.put(section.scope(), attribute, value.as_str())
    }

    /// Append `yes` unless the flag is already set; returns whether it wrote
    fn set_flag_if_unset(&self, section: &RecordSection, attribute: &str) -> LedgerResult<bool> {
        if self.flag_is_set(section.scope(), attribute)? {
            return Ok(false);
        }
        self.put_flag(section, attribute, FlagValue::Yes)?;
        Ok(true)
    }

    /// Append `no` if the flag is currently set; returns whether it wrote
    fn unset_flag_if_set(&self, section: &RecordSection, attribute: &str) -> LedgerResult<bool> {
        if !self.flag_is_set(section.scope(), attribute)? {
            return Ok(false);
        }
        self.put_flag(section, attribute, FlagValue::No)?;
        Ok(true)
    }
}

impl<T: LedgerStore + ?Sized> FlagLedger for T {}
