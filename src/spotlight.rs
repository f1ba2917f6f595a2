//! Focused analysis of one business segment across the window
//!
//! Filters the book down to a configurable segment (energy flag plus a
//! business-category keyword), then tracks its weekly KPIs, ranks the
//! organizations writing it, and flags problem weeks.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::kpi::KpiResult;
use crate::records::{PeriodSnapshot, PolicyRecord, Totals};
use crate::trend::{detect_problem_weeks, trend_of, volatility_of, ProblemWeek, TrendSummary,
                   Volatility, WeeklyPoint, WeeklySeries};

/// Which records belong to the spotlighted segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentFilter {
    /// Restrict to new-energy vehicles
    #[serde(default = "default_true")]
    pub new_energy_only: bool,

    /// Keep records whose business category contains this substring
    #[serde(default)]
    pub business_keyword: Option<String>,
}

fn default_true() -> bool { true }

impl Default for SegmentFilter {
    fn default() -> Self {
        Self { new_energy_only: true, business_keyword: Some("truck".to_string()) }
    }
}

impl SegmentFilter {
    pub fn matches(&self, record: &PolicyRecord) -> bool {
        if self.new_energy_only && !record.new_energy {
            return false;
        }
        match &self.business_keyword {
            Some(keyword) => record.business_category.contains(keyword.as_str()),
            None => true,
        }
    }

    pub fn describe(&self) -> String {
        let energy = if self.new_energy_only { "new-energy" } else { "all-energy" };
        match &self.business_keyword {
            Some(keyword) => format!("{energy} / category containing \"{keyword}\""),
            None => format!("{energy} / all categories"),
        }
    }
}

/// Loss-ratio risk grade used in the spotlight organization ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Elevated,
    Watch,
    Normal,
}

impl RiskLevel {
    pub fn from_loss_ratio(loss_ratio: f64) -> Self {
        if loss_ratio >= 80.0 {
            RiskLevel::High
        } else if loss_ratio >= 70.0 {
            RiskLevel::Elevated
        } else if loss_ratio >= 60.0 {
            RiskLevel::Watch
        } else {
            RiskLevel::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::High => "high",
            RiskLevel::Elevated => "elevated",
            RiskLevel::Watch => "watch",
            RiskLevel::Normal => "normal",
        }
    }
}

/// One organization's standing within the spotlighted segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgStanding {
    pub organization: String,
    pub kpis: KpiResult,
    pub risk: RiskLevel,
}

/// One business category's weight within the spotlighted segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMix {
    pub category: String,
    pub kpis: KpiResult,
}

/// Full spotlight result for one policy year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotlightAnalysis {
    pub segment: String,
    /// Cumulative KPIs per week across the window
    pub weekly_kpis: Vec<WeeklyPoint>,
    /// Latest-week organization ranking, loss ratio descending
    pub org_rankings: Vec<OrgStanding>,
    /// Latest-week business mix, signed premium descending
    pub category_mix: Vec<CategoryMix>,
    pub loss_ratio_trend: TrendSummary,
    pub loss_ratio_volatility: Volatility,
    pub problem_weeks: Vec<ProblemWeek>,
}

/// Run the spotlight over cumulative snapshots (ordered or not).
///
/// Returns `None` when the latest snapshot holds no matching records.
pub fn analyze_segment(
    snapshots: &[PeriodSnapshot],
    filter: &SegmentFilter,
    config: &AnalysisConfig,
) -> Option<SpotlightAnalysis> {
    let latest = snapshots.iter().max_by_key(|s| s.week)?;
    let latest_records: Vec<&PolicyRecord> =
        latest.records.iter().filter(|r| filter.matches(r)).collect();
    if latest_records.is_empty() {
        return None;
    }

    // Weekly table tracks the cumulative position as it develops
    let mut weekly_kpis: Vec<WeeklyPoint> = snapshots
        .iter()
        .map(|snapshot| WeeklyPoint {
            week: snapshot.week,
            kpis: KpiResult::from_totals(&snapshot.totals_where(|r| filter.matches(r))),
        })
        .collect();
    weekly_kpis.sort_by_key(|p| p.week);

    let series = WeeklySeries { points: weekly_kpis.clone() };
    let loss_ratios = series.metric(|k| k.loss_ratio);

    Some(SpotlightAnalysis {
        segment: filter.describe(),
        org_rankings: rank_organizations(&latest_records, config),
        category_mix: rank_categories(&latest_records),
        loss_ratio_trend: trend_of(&loss_ratios, &config.trend),
        loss_ratio_volatility: volatility_of(&loss_ratios, &config.trend),
        problem_weeks: detect_problem_weeks(&series, &config.trend),
        weekly_kpis,
    })
}

fn rank_organizations(records: &[&PolicyRecord], config: &AnalysisConfig) -> Vec<OrgStanding> {
    let mut orgs: Vec<&str> = records.iter().map(|r| r.organization.as_str()).collect();
    orgs.sort_unstable();
    orgs.dedup();

    let mut standings: Vec<OrgStanding> = orgs
        .into_iter()
        .filter_map(|org| {
            let totals = Totals::aggregate(
                records.iter().copied().filter(|r| r.organization == org),
            );
            // Organizations without meaningful volume stay out of the ranking
            if totals.signed_premium < config.min_premium_floor {
                return None;
            }
            let kpis = KpiResult::from_totals(&totals);
            Some(OrgStanding {
                organization: org.to_string(),
                risk: RiskLevel::from_loss_ratio(kpis.loss_ratio),
                kpis,
            })
        })
        .collect();

    standings.sort_by(|a, b| {
        b.kpis
            .loss_ratio
            .partial_cmp(&a.kpis.loss_ratio)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.organization.cmp(&b.organization))
    });
    standings
}

fn rank_categories(records: &[&PolicyRecord]) -> Vec<CategoryMix> {
    let mut categories: Vec<&str> = records.iter().map(|r| r.business_category.as_str()).collect();
    categories.sort_unstable();
    categories.dedup();

    let mut mix: Vec<CategoryMix> = categories
        .into_iter()
        .map(|category| {
            let totals = Totals::aggregate(
                records.iter().copied().filter(|r| r.business_category == category),
            );
            CategoryMix { category: category.to_string(), kpis: KpiResult::from_totals(&totals) }
        })
        .collect();

    mix.sort_by(|a, b| {
        b.kpis
            .signed_premium
            .partial_cmp(&a.kpis.signed_premium)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    mix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CoverageType, RenewalStatus};

    fn record(org: &str, category: &str, new_energy: bool, premium: f64, claims: f64) -> PolicyRecord {
        PolicyRecord {
            organization: org.to_string(),
            business_category: category.to_string(),
            coverage_type: CoverageType::FullPackage,
            renewal_status: RenewalStatus::New,
            new_energy,
            signed_premium: premium,
            matured_premium: premium,
            reported_claims: claims,
            expense_amount: premium * 0.08,
            policy_count: 20,
            claim_case_count: 4,
            week: 0,
            policy_year: 2025,
        }
    }

    fn snapshots() -> Vec<PeriodSnapshot> {
        let week = |w: u32, scale: f64| {
            PeriodSnapshot::new(
                2025,
                w,
                vec![
                    record("east", "truck_heavy", true, 100_000.0 * scale, 85_000.0 * scale),
                    record("west", "truck_light", true, 50_000.0 * scale, 20_000.0 * scale),
                    // below the premium floor, excluded from rankings
                    record("north", "truck_light", true, 5_000.0, 1_000.0),
                    // not a truck, filtered out entirely
                    record("east", "private_car", true, 900_000.0, 100_000.0),
                    // conventional truck, filtered out by the energy flag
                    record("east", "truck_heavy", false, 80_000.0, 30_000.0),
                ],
            )
        };
        vec![week(42, 1.0), week(43, 1.2), week(44, 1.5)]
    }

    #[test]
    fn test_filter_and_rankings() {
        let config = AnalysisConfig::default();
        let analysis =
            analyze_segment(&snapshots(), &SegmentFilter::default(), &config).unwrap();

        assert_eq!(analysis.weekly_kpis.len(), 3);

        // north is under the floor; east ranks above west on loss ratio
        let names: Vec<&str> =
            analysis.org_rankings.iter().map(|o| o.organization.as_str()).collect();
        assert_eq!(names, vec!["east", "west"]);
        assert_eq!(analysis.org_rankings[0].risk, RiskLevel::High);
        assert_eq!(analysis.org_rankings[1].risk, RiskLevel::Normal);

        // mix sorted by premium
        assert_eq!(analysis.category_mix[0].category, "truck_heavy");
    }

    #[test]
    fn test_risk_level_boundaries() {
        assert_eq!(RiskLevel::from_loss_ratio(80.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_loss_ratio(79.9), RiskLevel::Elevated);
        assert_eq!(RiskLevel::from_loss_ratio(70.0), RiskLevel::Elevated);
        assert_eq!(RiskLevel::from_loss_ratio(60.0), RiskLevel::Watch);
        assert_eq!(RiskLevel::from_loss_ratio(59.9), RiskLevel::Normal);
    }

    #[test]
    fn test_empty_segment_returns_none() {
        let config = AnalysisConfig::default();
        let filter = SegmentFilter {
            new_energy_only: true,
            business_keyword: Some("bus".to_string()),
        };
        assert!(analyze_segment(&snapshots(), &filter, &config).is_none());
    }
}
