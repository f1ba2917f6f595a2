//! Derived KPI metrics over a record subset
//!
//! One uniform zero-denominator policy applies to every ratio and average:
//! when the denominator is not strictly positive the metric is 0, never an
//! error and never NaN.

use serde::{Deserialize, Serialize};

use crate::records::Totals;

/// Derived aggregate over any subset of records. Pure function of the
/// subset's `Totals`; no persisted identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiResult {
    /// Signed premium, yuan
    pub signed_premium: f64,
    /// Matured (earned) premium, yuan
    pub matured_premium: f64,
    /// Reported claim payments, yuan
    pub reported_claims: f64,
    /// Expense amount, yuan
    pub expense_amount: f64,
    pub policy_count: i64,
    pub claim_case_count: i64,

    /// reported_claims / matured_premium, percent
    pub loss_ratio: f64,
    /// expense_amount / signed_premium, percent
    pub expense_ratio: f64,
    /// loss_ratio + expense_ratio, percent
    pub variable_cost_ratio: f64,
    /// 100 - loss_ratio - expense_ratio, percent
    pub contribution_margin: f64,
    /// claim_case_count / policy_count, percent
    pub claim_frequency: f64,
    /// reported_claims / claim_case_count, yuan
    pub avg_claim: f64,
    /// signed_premium / policy_count, yuan
    pub avg_premium: f64,
}

/// Ratio with the uniform zero-denominator guard.
fn guarded_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

fn guarded_avg(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

impl KpiResult {
    pub fn from_totals(totals: &Totals) -> Self {
        let loss_ratio = guarded_pct(totals.reported_claims, totals.matured_premium);
        let expense_ratio = guarded_pct(totals.expense_amount, totals.signed_premium);

        Self {
            signed_premium: totals.signed_premium,
            matured_premium: totals.matured_premium,
            reported_claims: totals.reported_claims,
            expense_amount: totals.expense_amount,
            policy_count: totals.policy_count,
            claim_case_count: totals.claim_case_count,
            loss_ratio,
            expense_ratio,
            variable_cost_ratio: loss_ratio + expense_ratio,
            contribution_margin: 100.0 - loss_ratio - expense_ratio,
            claim_frequency: guarded_pct(
                totals.claim_case_count as f64,
                totals.policy_count as f64,
            ),
            avg_claim: guarded_avg(totals.reported_claims, totals.claim_case_count as f64),
            avg_premium: guarded_avg(totals.signed_premium, totals.policy_count as f64),
        }
    }

    /// This subset's matured-premium share of a parent subset, in percent.
    /// 0 when the parent has no matured premium.
    pub fn premium_share_of(&self, parent: &KpiResult) -> f64 {
        guarded_pct(self.matured_premium, parent.matured_premium)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn totals(signed: f64, matured: f64, claims: f64, expenses: f64, pols: i64, cases: i64) -> Totals {
        Totals {
            signed_premium: signed,
            matured_premium: matured,
            reported_claims: claims,
            expense_amount: expenses,
            policy_count: pols,
            claim_case_count: cases,
        }
    }

    #[test]
    fn test_core_ratios() {
        let kpis = KpiResult::from_totals(&totals(100_000.0, 80_000.0, 48_000.0, 12_000.0, 50, 10));

        assert_relative_eq!(kpis.loss_ratio, 60.0, epsilon = 1e-9);
        assert_relative_eq!(kpis.expense_ratio, 12.0, epsilon = 1e-9);
        assert_relative_eq!(kpis.variable_cost_ratio, 72.0, epsilon = 1e-9);
        assert_relative_eq!(kpis.contribution_margin, 28.0, epsilon = 1e-9);
        assert_relative_eq!(kpis.claim_frequency, 20.0, epsilon = 1e-9);
        assert_relative_eq!(kpis.avg_claim, 4800.0);
        assert_relative_eq!(kpis.avg_premium, 2000.0);
    }

    #[test]
    fn test_contribution_identity_holds_exactly() {
        let kpis = KpiResult::from_totals(&totals(77_777.0, 31_415.0, 9_265.0, 3_589.0, 79, 32));
        assert_eq!(
            kpis.contribution_margin,
            100.0 - kpis.loss_ratio - kpis.expense_ratio
        );
    }

    #[test]
    fn test_zero_matured_premium_is_zero_not_nan() {
        let kpis = KpiResult::from_totals(&totals(0.0, 0.0, 0.0, 0.0, 0, 0));

        assert_eq!(kpis.loss_ratio, 0.0);
        assert_eq!(kpis.expense_ratio, 0.0);
        assert_eq!(kpis.claim_frequency, 0.0);
        assert_eq!(kpis.avg_claim, 0.0);
        assert_eq!(kpis.avg_premium, 0.0);
        assert!(!kpis.contribution_margin.is_nan());
        assert_relative_eq!(kpis.contribution_margin, 100.0);
    }

    #[test]
    fn test_negative_matured_premium_guarded() {
        // Restated cumulative data can diff negative; the guard treats any
        // non-positive denominator the same as zero.
        let kpis = KpiResult::from_totals(&totals(1000.0, -500.0, 200.0, 50.0, 5, 1));
        assert_eq!(kpis.loss_ratio, 0.0);
    }

    #[test]
    fn test_loss_ratio_never_negative_for_real_subsets() {
        let kpis = KpiResult::from_totals(&totals(100.0, 100.0, 0.0, 0.0, 1, 0));
        assert!(kpis.loss_ratio >= 0.0);
    }

    #[test]
    fn test_premium_share() {
        let parent = KpiResult::from_totals(&totals(0.0, 200_000.0, 0.0, 0.0, 0, 0));
        let child = KpiResult::from_totals(&totals(0.0, 2_000.0, 0.0, 0.0, 0, 0));
        assert_relative_eq!(child.premium_share_of(&parent), 1.0, epsilon = 1e-9);
    }
}
