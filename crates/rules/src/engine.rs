//! Rule Engine - enrollment and withdrawal assessment
//!
//! Each assessment combines raw evidence from the snapshot with what the
//! ledger has already noted, and notes a `yes` the first time it is seen.

use transmitter_core::{FlagValue, RecordSnapshot};
use transmitter_ledger::{FlagLedger, LedgerStore};
use transmitter_lock::RecordSection;

use crate::error::{RuleError, RuleResult};
use crate::fields::RecordFields;

/// Ledger attribute noted when a record first indicates enrollment
pub const HAS_ENROLLED: &str = "has-enrolled";

/// Ledger attribute noted when an enrolled record first indicates withdrawal
pub const HAS_WITHDRAWN: &str = "has-withdrawn";

/// Outcome of one assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    /// Ledger attribute the assessment is about
    pub attribute: &'static str,

    pub value: FlagValue,

    /// Whether this call wrote the `yes` fact
    pub newly_noted: bool,
}

impl Assessment {
    fn new(attribute: &'static str, value: FlagValue, newly_noted: bool) -> Self {
        Self {
            attribute,
            value,
            newly_noted,
        }
    }
}

/// Enrollment and withdrawal, assessed in that order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventAssessment {
    pub enrollment: Assessment,
    pub withdrawal: Assessment,
}

impl EventAssessment {
    pub fn iter(&self) -> impl Iterator<Item = &Assessment> {
        [&self.enrollment, &self.withdrawal].into_iter()
    }
}

/// Study policy over a record snapshot plus ledger history
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    fields: RecordFields,
}

impl RuleEngine {
    pub fn new(fields: RecordFields) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &RecordFields {
        &self.fields
    }

    /// Snapshot alone shows enrollment
    ///
    /// MRN, participant ID, both birthdates and the enrollment date must all
    /// be present, and the two birthdates must agree.
    pub fn indicates_enrollment(&self, snapshot: &RecordSnapshot) -> bool {
        let f = &self.fields;
        let required = [&f.mrn, &f.participant_id, &f.dob, &f.external_dob, &f.enroll_date];

        if !required.iter().all(|name| snapshot.has(name)) {
            tracing::debug!("One or more enrollment fields blank");
            return false;
        }

        if snapshot.field(&f.dob) != snapshot.field(&f.external_dob) {
            tracing::warn!(
                dob_field = %f.dob,
                external_dob_field = %f.external_dob,
                "Birthdates disagree; not treating record as enrolled"
            );
            return false;
        }

        true
    }

    /// Snapshot alone shows withdrawal
    pub fn indicates_withdrawal(&self, snapshot: &RecordSnapshot) -> bool {
        snapshot.has(&self.fields.withdrawal_date)
    }

    /// Assess enrollment, noting it the first time it is observed
    pub fn assess_enrollment<L>(
        &self,
        ledger: &L,
        section: &RecordSection,
        snapshot: &RecordSnapshot,
    ) -> RuleResult<Assessment>
    where
        L: LedgerStore + ?Sized,
    {
        self.check_scope(section, snapshot)?;
        let evidence = self.indicates_enrollment(snapshot);
        self.note_once(ledger, section, HAS_ENROLLED, evidence)
    }

    /// Assess withdrawal; always `no` until enrollment has been noted
    pub fn assess_withdrawal<L>(
        &self,
        ledger: &L,
        section: &RecordSection,
        snapshot: &RecordSnapshot,
    ) -> RuleResult<Assessment>
    where
        L: LedgerStore + ?Sized,
    {
        self.check_scope(section, snapshot)?;

        if !ledger.flag_is_set(section.scope(), HAS_ENROLLED)? {
            tracing::info!(
                scope = %section.scope(),
                attribute = HAS_WITHDRAWN,
                value = "no",
                "Enrollment not noted; withdrawal not assessed"
            );
            return Ok(Assessment::new(HAS_WITHDRAWN, FlagValue::No, false));
        }

        let evidence = self.indicates_withdrawal(snapshot);
        self.note_once(ledger, section, HAS_WITHDRAWN, evidence)
    }

    /// Enrollment first, so a record that enrolls and withdraws within one
    /// amendment has both events noted
    pub fn assess_all<L>(
        &self,
        ledger: &L,
        section: &RecordSection,
        snapshot: &RecordSnapshot,
    ) -> RuleResult<EventAssessment>
    where
        L: LedgerStore + ?Sized,
    {
        let enrollment = self.assess_enrollment(ledger, section, snapshot)?;
        let withdrawal = self.assess_withdrawal(ledger, section, snapshot)?;
        Ok(EventAssessment {
            enrollment,
            withdrawal,
        })
    }

    fn check_scope(&self, section: &RecordSection, snapshot: &RecordSnapshot) -> RuleResult<()> {
        let recorded = snapshot.field(&self.fields.record_id);
        let locked = &section.scope().record_id;

        if !recorded.is_empty() && recorded != locked {
            return Err(RuleError::logic(format!(
                "snapshot is for record {} but section holds {}",
                recorded,
                section.scope()
            )));
        }
        Ok(())
    }

    fn note_once<L>(
        &self,
        ledger: &L,
        section: &RecordSection,
        attribute: &'static str,
        evidence: bool,
    ) -> RuleResult<Assessment>
    where
        L: LedgerStore + ?Sized,
    {
        let noted = ledger.flag_is_set(section.scope(), attribute)?;
        let value = FlagValue::from_bool(evidence || noted);
        let newly_noted = value.is_yes() && !noted;

        if newly_noted {
            ledger.put_flag(section, attribute, FlagValue::Yes)?;
            tracing::info!(scope = %section.scope(), attribute, "Event noted");
        }

        tracing::info!(
            scope = %section.scope(),
            attribute,
            value = %value,
            evidence,
            noted,
            "Assessment"
        );
        Ok(Assessment::new(attribute, value, newly_noted))
    }
}
