//! Names of the snapshot fields the rules read
//!
//! Projects name their fields differently; every name is configurable and
//! falls back to the defaults below.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    #[serde(default = "default_record_id")]
    pub record_id: String,

    /// Medical record number
    #[serde(default = "default_mrn")]
    pub mrn: String,

    /// Participant ID issued by the external program
    #[serde(default = "default_participant_id")]
    pub participant_id: String,

    #[serde(default = "default_dob")]
    pub dob: String,

    /// Date of birth as reported by the external program
    #[serde(default = "default_external_dob")]
    pub external_dob: String,

    #[serde(default = "default_enroll_date")]
    pub enroll_date: String,

    #[serde(default = "default_withdrawal_date")]
    pub withdrawal_date: String,

    /// Set to "1" when the participant is enrolled with another site
    #[serde(default = "default_other_enrollment")]
    pub other_enrollment: String,

    #[serde(default = "default_first_name")]
    pub first_name: String,

    #[serde(default = "default_last_name")]
    pub last_name: String,
}

fn default_record_id() -> String {
    "record_id".to_string()
}

fn default_mrn() -> String {
    "mrn".to_string()
}

fn default_participant_id() -> String {
    "pmi_id_test".to_string()
}

fn default_dob() -> String {
    "dob".to_string()
}

fn default_external_dob() -> String {
    "pmi_dob".to_string()
}

fn default_enroll_date() -> String {
    "enroll_date".to_string()
}

fn default_withdrawal_date() -> String {
    "withdrawal_date".to_string()
}

fn default_other_enrollment() -> String {
    "other_enrollment".to_string()
}

fn default_first_name() -> String {
    "name_first".to_string()
}

fn default_last_name() -> String {
    "name_last".to_string()
}

impl Default for RecordFields {
    fn default() -> Self {
        Self {
            record_id: default_record_id(),
            mrn: default_mrn(),
            participant_id: default_participant_id(),
            dob: default_dob(),
            external_dob: default_external_dob(),
            enroll_date: default_enroll_date(),
            withdrawal_date: default_withdrawal_date(),
            other_enrollment: default_other_enrollment(),
            first_name: default_first_name(),
            last_name: default_last_name(),
        }
    }
}
