//! Flags - yes/no ledger values and their derived state

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// A value written to the ledger for a flag attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FlagValue {
    Yes,
    No,
}

impl FlagValue {
    /// Raw ledger representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagValue::Yes => "yes",
            FlagValue::No => "no",
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, FlagValue::Yes)
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            FlagValue::Yes
        } else {
            FlagValue::No
        }
    }
}

/// Derived state of a flag: latest fact value, or `Unknown` when absent
///
/// Values other than `yes`/`no` found in the ledger also read as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FlagState {
    Yes,
    No,
    Unknown,
}

impl FlagState {
    /// Derive state from the latest raw ledger value
    pub fn from_latest(latest: Option<&str>) -> Self {
        match latest {
            Some("yes") => FlagState::Yes,
            Some("no") => FlagState::No,
            _ => FlagState::Unknown,
        }
    }

    /// Absence counts as unset
    pub fn is_set(&self) -> bool {
        matches!(self, FlagState::Yes)
    }
}

impl From<FlagValue> for FlagState {
    fn from(value: FlagValue) -> Self {
        match value {
            FlagValue::Yes => FlagState::Yes,
            FlagValue::No => FlagState::No,
        }
    }
}
