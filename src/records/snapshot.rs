//! Period snapshots and additive aggregates

use serde::{Deserialize, Serialize};

use crate::records::PolicyRecord;

/// Additive aggregate over any subset of records.
///
/// Counts are signed so that week-over-week differences stay representable
/// when a restatement shrinks a cumulative figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub signed_premium: f64,
    pub matured_premium: f64,
    pub reported_claims: f64,
    pub expense_amount: f64,
    pub policy_count: i64,
    pub claim_case_count: i64,
}

impl Totals {
    pub fn add_record(&mut self, record: &PolicyRecord) {
        self.signed_premium += record.signed_premium;
        self.matured_premium += record.matured_premium;
        self.reported_claims += record.reported_claims;
        self.expense_amount += record.expense_amount;
        self.policy_count += record.policy_count;
        self.claim_case_count += record.claim_case_count;
    }

    pub fn merge(&mut self, other: &Totals) {
        self.signed_premium += other.signed_premium;
        self.matured_premium += other.matured_premium;
        self.reported_claims += other.reported_claims;
        self.expense_amount += other.expense_amount;
        self.policy_count += other.policy_count;
        self.claim_case_count += other.claim_case_count;
    }

    /// Incremental totals: this cumulative snapshot minus an earlier one.
    /// Every additive field is differenced, counts included.
    pub fn minus(&self, earlier: &Totals) -> Totals {
        Totals {
            signed_premium: self.signed_premium - earlier.signed_premium,
            matured_premium: self.matured_premium - earlier.matured_premium,
            reported_claims: self.reported_claims - earlier.reported_claims,
            expense_amount: self.expense_amount - earlier.expense_amount,
            policy_count: self.policy_count - earlier.policy_count,
            claim_case_count: self.claim_case_count - earlier.claim_case_count,
        }
    }

    /// Aggregate an iterator of records.
    pub fn aggregate<'a, I>(records: I) -> Totals
    where
        I: IntoIterator<Item = &'a PolicyRecord>,
    {
        let mut totals = Totals::default();
        for record in records {
            totals.add_record(record);
        }
        totals
    }

    pub fn is_empty(&self) -> bool {
        *self == Totals::default()
    }
}

/// All records of one (year, week) extract. Amounts are cumulative since
/// policy-year start.
#[derive(Debug, Clone)]
pub struct PeriodSnapshot {
    pub year: u16,
    pub week: u32,
    pub records: Vec<PolicyRecord>,
}

impl PeriodSnapshot {
    pub fn new(year: u16, week: u32, records: Vec<PolicyRecord>) -> Self {
        Self { year, week, records }
    }

    pub fn totals(&self) -> Totals {
        Totals::aggregate(&self.records)
    }

    /// Totals over the subset matching a predicate.
    pub fn totals_where<F>(&self, predicate: F) -> Totals
    where
        F: Fn(&PolicyRecord) -> bool,
    {
        Totals::aggregate(self.records.iter().filter(|r| predicate(r)))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
