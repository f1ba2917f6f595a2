//! Weekly KPI series built from consecutive cumulative snapshots

use log::warn;
use serde::{Deserialize, Serialize};

use crate::kpi::KpiResult;
use crate::records::{PeriodSnapshot, Totals};

/// One week's incremental KPIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyPoint {
    pub week: u32,
    pub kpis: KpiResult,
}

/// Ordered-by-week incremental KPI sequence for one entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklySeries {
    pub points: Vec<WeeklyPoint>,
}

impl WeeklySeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn weeks(&self) -> Vec<u32> {
        self.points.iter().map(|p| p.week).collect()
    }

    /// Extract one metric as a value sequence, in week order.
    pub fn metric<F>(&self, f: F) -> Vec<f64>
    where
        F: Fn(&KpiResult) -> f64,
    {
        self.points.iter().map(|p| f(&p.kpis)).collect()
    }

    pub fn latest(&self) -> Option<&WeeklyPoint> {
        self.points.last()
    }
}

/// Build the incremental series for the analysis weeks.
///
/// The weekly value for week `w` is `cumulative(w) - cumulative(w-1)`,
/// aggregated over records matching the filter. A week whose predecessor
/// snapshot is absent is a non-fatal gap: it is logged and excluded.
pub fn build_weekly_series<F>(
    snapshots: &[PeriodSnapshot],
    analysis_weeks: &[u32],
    filter: F,
) -> WeeklySeries
where
    F: Fn(&crate::records::PolicyRecord) -> bool,
{
    let totals_for = |week: u32| -> Option<Totals> {
        snapshots
            .iter()
            .find(|s| s.week == week)
            .map(|s| s.totals_where(&filter))
    };

    let mut points = Vec::new();
    for &week in analysis_weeks {
        if week == 0 {
            continue;
        }
        let Some(current) = totals_for(week) else { continue };
        let Some(previous) = totals_for(week - 1) else {
            warn!("week {week}: no week {} snapshot, skipping incremental point", week - 1);
            continue;
        };
        points.push(WeeklyPoint {
            week,
            kpis: KpiResult::from_totals(&current.minus(&previous)),
        });
    }

    WeeklySeries { points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CoverageType, PolicyRecord, RenewalStatus};
    use approx::assert_relative_eq;

    fn snapshot(week: u32, matured: f64, claims: f64) -> PeriodSnapshot {
        PeriodSnapshot::new(
            2025,
            week,
            vec![PolicyRecord {
                organization: "east".to_string(),
                business_category: "truck_heavy".to_string(),
                coverage_type: CoverageType::FullPackage,
                renewal_status: RenewalStatus::New,
                new_energy: true,
                signed_premium: matured,
                matured_premium: matured,
                reported_claims: claims,
                expense_amount: 0.0,
                policy_count: 1,
                claim_case_count: 1,
                week,
                policy_year: 2025,
            }],
        )
    }

    #[test]
    fn test_incremental_points_are_diffs() {
        let snapshots = vec![
            snapshot(40, 100_000.0, 50_000.0),
            snapshot(41, 150_000.0, 80_000.0),
            snapshot(42, 200_000.0, 125_000.0),
        ];
        let series = build_weekly_series(&snapshots, &[41, 42], |_| true);

        assert_eq!(series.weeks(), vec![41, 42]);
        // week 41: (80k - 50k) / (150k - 100k) = 60%
        assert_relative_eq!(series.points[0].kpis.loss_ratio, 60.0, epsilon = 1e-9);
        // week 42: (125k - 80k) / (200k - 150k) = 90%
        assert_relative_eq!(series.points[1].kpis.loss_ratio, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_predecessor_is_a_gap() {
        let snapshots = vec![snapshot(40, 100.0, 10.0), snapshot(42, 300.0, 30.0)];
        // week 41 snapshot absent: week 41 has no current, week 42 has no
        // predecessor -> both skipped
        let series = build_weekly_series(&snapshots, &[41, 42], |_| true);
        assert!(series.is_empty());
    }
}
