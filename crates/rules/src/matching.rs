//! Demographic match scorer
//!
//! Compares two (first name, last name, birthdate) triples and returns a
//! confidence from 0 to 3:
//!
//! | Score | Meaning                                                  |
//! |-------|----------------------------------------------------------|
//! | 3     | birthdate equal, first and last name equal (any case)    |
//! | 2     | birthdate equal, one side's names both contained in the other's |
//! | 1     | birthdate equal, names disagree                          |
//! | 0     | birthdate differs                                        |
//!
//! For a score of 2 the containment has to run the same way for both names:
//! `james a.` / `joyce` against `james` / `joyce` is close, while
//! `james a.` / `joyce` against `james` / `joycee` is not.

use serde::{Deserialize, Serialize};
use transmitter_core::RecordSnapshot;

use crate::fields::RecordFields;

/// Highest score [`score`] can return
pub const MAX_CONFIDENCE: u8 = 3;

/// Identity triple compared by [`score`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub first_name: String,
    pub last_name: String,
    /// `yyyy-mm-dd`
    pub birthdate: String,
}

impl Demographics {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birthdate: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            birthdate: birthdate.into(),
        }
    }

    /// Demographics as recorded in a snapshot
    pub fn from_snapshot(snapshot: &RecordSnapshot, fields: &RecordFields) -> Self {
        Self::new(
            snapshot.field(&fields.first_name),
            snapshot.field(&fields.last_name),
            snapshot.field(&fields.dob),
        )
    }
}

/// Match confidence between two demographic triples, `0..=3`
pub fn score(a: &Demographics, b: &Demographics) -> u8 {
    if a.birthdate != b.birthdate {
        return 0;
    }

    let (a_first, a_last) = (a.first_name.to_lowercase(), a.last_name.to_lowercase());
    let (b_first, b_last) = (b.first_name.to_lowercase(), b.last_name.to_lowercase());

    if a_first == b_first && a_last == b_last {
        return MAX_CONFIDENCE;
    }

    let a_within_b = b_first.contains(&a_first) && b_last.contains(&a_last);
    let b_within_a = a_first.contains(&b_first) && a_last.contains(&b_last);
    if a_within_b || b_within_a {
        return 2;
    }

    1
}
