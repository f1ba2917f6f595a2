//! The drill-down algorithm
//!
//! organization -> energy segment -> business category -> coverage / renewal.
//! Partitions below the configured premium share of their parent are pruned
//! (the share boundary is inclusive), healthy energy segments stop the
//! descent, and business categories are ranked by severity with a
//! deterministic tie-break.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::drilldown::{BusinessProblem, EnergyNode, OrgDiagnosis, SegmentOutcome, SliceKpi};
use crate::kpi::{classify_contribution_margin, classify_loss_ratio, is_healthy, KpiResult};
use crate::records::{EnergySegment, PolicyRecord, Totals};

/// Severity of a problem segment: weighted deviation beyond the loss-ratio
/// and contribution pivots, scaled by the segment's premium share (percent).
pub fn severity_score(kpis: &KpiResult, share_pct: f64, config: &AnalysisConfig) -> f64 {
    let w = &config.severity;
    let loss_deviation = (kpis.loss_ratio - w.loss_pivot).max(0.0);
    let contribution_deviation = (w.contribution_pivot - kpis.contribution_margin).max(0.0);
    (loss_deviation * w.loss_weight + contribution_deviation * w.contribution_weight) * share_pct
}

/// Diagnose every organization in a snapshot's records.
///
/// Organizations are processed in parallel; the result is ordered by
/// organization name so reruns over identical input produce identical output.
pub fn diagnose_book(records: &[PolicyRecord], config: &AnalysisConfig) -> Vec<OrgDiagnosis> {
    let book_kpis = KpiResult::from_totals(&Totals::aggregate(records));

    let mut by_org: BTreeMap<&str, Vec<&PolicyRecord>> = BTreeMap::new();
    for record in records {
        by_org.entry(record.organization.as_str()).or_default().push(record);
    }

    let mut diagnoses: Vec<OrgDiagnosis> = by_org
        .par_iter()
        .map(|(org, org_records)| diagnose_organization(org, org_records, &book_kpis, config))
        .collect();

    diagnoses.sort_by(|a, b| a.organization.cmp(&b.organization));
    diagnoses
}

/// Diagnose a single organization's records.
pub fn diagnose_organization(
    organization: &str,
    records: &[&PolicyRecord],
    book_kpis: &KpiResult,
    config: &AnalysisConfig,
) -> OrgDiagnosis {
    let org_kpis = KpiResult::from_totals(&Totals::aggregate(records.iter().copied()));

    let mut energy_nodes = Vec::new();
    for segment in EnergySegment::ALL {
        let segment_records: Vec<&PolicyRecord> =
            records.iter().copied().filter(|r| segment.matches(r.new_energy)).collect();
        if segment_records.is_empty() {
            continue;
        }

        let segment_kpis =
            KpiResult::from_totals(&Totals::aggregate(segment_records.iter().copied()));
        let share_pct = segment_kpis.premium_share_of(&org_kpis);
        if share_pct < config.min_share_pct {
            continue;
        }

        let outcome = if is_healthy(&segment_kpis, &config.health) {
            SegmentOutcome::Healthy(segment_kpis)
        } else {
            SegmentOutcome::NeedsDrilldown {
                kpis: segment_kpis,
                problems: rank_problem_categories(&segment_records, &segment_kpis, config),
            }
        };

        energy_nodes.push(EnergyNode { segment, share_pct, outcome });
    }

    OrgDiagnosis {
        organization: organization.to_string(),
        share_pct: org_kpis.premium_share_of(book_kpis),
        loss_ratio_status: classify_loss_ratio(org_kpis.loss_ratio, &config.status),
        contribution_status: classify_contribution_margin(
            org_kpis.contribution_margin,
            &config.status,
        ),
        healthy: is_healthy(&org_kpis, &config.health),
        kpis: org_kpis,
        energy_nodes,
    }
}

/// Rank an unhealthy energy segment's business categories by severity and
/// keep the worst few, each with coverage and renewal breakdowns.
fn rank_problem_categories(
    segment_records: &[&PolicyRecord],
    segment_kpis: &KpiResult,
    config: &AnalysisConfig,
) -> Vec<BusinessProblem> {
    let mut by_category: BTreeMap<&str, Vec<&PolicyRecord>> = BTreeMap::new();
    for record in segment_records.iter().copied() {
        by_category.entry(record.business_category.as_str()).or_default().push(record);
    }

    let mut problems: Vec<BusinessProblem> = Vec::new();
    for (category, category_records) in &by_category {
        let kpis = KpiResult::from_totals(&Totals::aggregate(category_records.iter().copied()));
        let share_pct = kpis.premium_share_of(segment_kpis);
        if share_pct < config.min_share_pct {
            continue;
        }

        problems.push(BusinessProblem {
            category: category.to_string(),
            severity: severity_score(&kpis, share_pct, config),
            kpis,
            share_pct,
            coverage_breakdown: Vec::new(),
            renewal_breakdown: Vec::new(),
        });
    }

    // Severity descending; ties broken by category name for reproducibility
    problems.sort_by(|a, b| {
        b.severity
            .partial_cmp(&a.severity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    problems.truncate(config.top_problem_segments);

    for problem in &mut problems {
        let category_records: Vec<&PolicyRecord> = segment_records
            .iter()
            .copied()
            .filter(|r| r.business_category == problem.category)
            .collect();

        problem.coverage_breakdown = slice_by(
            &category_records,
            &problem.kpis,
            &crate::records::CoverageType::ALL,
            |r| r.coverage_type,
        );
        problem.renewal_breakdown = slice_by(
            &category_records,
            &problem.kpis,
            &crate::records::RenewalStatus::ALL,
            |r| r.renewal_status,
        );
    }

    problems
}

/// Slice a business category along one fixed enumerated dimension, skipping
/// empty slices, sorted by loss ratio descending. The sort is stable, so
/// equal loss ratios keep the dimension's declaration order. No share
/// pruning at this depth.
fn slice_by<D, F>(
    records: &[&PolicyRecord],
    parent_kpis: &KpiResult,
    dimensions: &[D],
    key: F,
) -> Vec<SliceKpi<D>>
where
    D: Copy + PartialEq,
    F: Fn(&PolicyRecord) -> D,
{
    let mut slices: Vec<SliceKpi<D>> = Vec::new();
    for &dimension in dimensions {
        let subset: Vec<&PolicyRecord> =
            records.iter().copied().filter(|r| key(r) == dimension).collect();
        if subset.is_empty() {
            continue;
        }
        let kpis = KpiResult::from_totals(&Totals::aggregate(subset));
        slices.push(SliceKpi { dimension, share_pct: kpis.premium_share_of(parent_kpis), kpis });
    }

    slices.sort_by(|a, b| {
        b.kpis.loss_ratio.partial_cmp(&a.kpis.loss_ratio).unwrap_or(Ordering::Equal)
    });
    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CoverageType, RenewalStatus};
    use approx::assert_relative_eq;

    fn record(
        org: &str,
        category: &str,
        coverage: CoverageType,
        renewal: RenewalStatus,
        new_energy: bool,
        matured: f64,
        claims: f64,
    ) -> PolicyRecord {
        PolicyRecord {
            organization: org.to_string(),
            business_category: category.to_string(),
            coverage_type: coverage,
            renewal_status: renewal,
            new_energy,
            signed_premium: matured,
            matured_premium: matured,
            reported_claims: claims,
            expense_amount: matured * 0.05,
            policy_count: 10,
            claim_case_count: 2,
            week: 44,
            policy_year: 2025,
        }
    }

    /// Unhealthy new-energy book with a clearly worst truck category,
    /// plus a healthy conventional book.
    fn fixture() -> Vec<PolicyRecord> {
        vec![
            // new-energy trucks: lr 90
            record("east", "truck_heavy", CoverageType::FullPackage, RenewalStatus::New,
                   true, 50_000.0, 45_000.0),
            record("east", "truck_heavy", CoverageType::CompulsoryOnly, RenewalStatus::Renewal,
                   true, 10_000.0, 9_000.0),
            // new-energy private cars: lr 75
            record("east", "private_car", CoverageType::FullPackage, RenewalStatus::New,
                   true, 40_000.0, 30_000.0),
            // tiny sliver below 1% of the segment, must be pruned
            record("east", "taxi", CoverageType::CompulsoryOnly, RenewalStatus::Transfer,
                   true, 900.0, 2_000.0),
            // conventional: lr 40, healthy
            record("east", "private_car", CoverageType::FullPackage, RenewalStatus::Renewal,
                   false, 100_000.0, 40_000.0),
        ]
    }

    #[test]
    fn test_healthy_segment_is_not_descended() {
        let config = AnalysisConfig::default();
        let records = fixture();
        let diagnoses = diagnose_book(&records, &config);
        assert_eq!(diagnoses.len(), 1);

        let conventional = diagnoses[0]
            .energy_nodes
            .iter()
            .find(|n| n.segment == EnergySegment::Conventional)
            .unwrap();
        assert!(conventional.outcome.is_healthy());
    }

    #[test]
    fn test_unhealthy_segment_ranks_problems_by_severity() {
        let config = AnalysisConfig::default();
        let records = fixture();
        let diagnoses = diagnose_book(&records, &config);

        let new_energy = diagnoses[0]
            .energy_nodes
            .iter()
            .find(|n| n.segment == EnergySegment::NewEnergy)
            .unwrap();
        let SegmentOutcome::NeedsDrilldown { problems, .. } = &new_energy.outcome else {
            panic!("new-energy segment should need drill-down");
        };

        // taxi pruned below the share floor; trucks outrank private cars
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].category, "truck_heavy");
        assert_eq!(problems[1].category, "private_car");
        assert!(problems[0].severity > problems[1].severity);

        // coverage slices sorted by loss ratio descending
        let coverage = &problems[0].coverage_breakdown;
        assert_eq!(coverage.len(), 2);
        assert!(coverage[0].kpis.loss_ratio >= coverage[1].kpis.loss_ratio);
    }

    #[test]
    fn test_share_boundary_is_inclusive() {
        let config = AnalysisConfig::default();
        // Segment matured premium 100_000; children at exactly 1% and just below
        let records = vec![
            record("west", "bulk", CoverageType::FullPackage, RenewalStatus::New,
                   true, 98_010.0, 96_000.0),
            record("west", "edge", CoverageType::FullPackage, RenewalStatus::New,
                   true, 1_000.0, 3_000.0),
            record("west", "sliver", CoverageType::FullPackage, RenewalStatus::New,
                   true, 990.0, 3_000.0),
        ];
        let total: f64 = records.iter().map(|r| r.matured_premium).sum();
        assert_relative_eq!(total, 100_000.0);

        let diagnoses = diagnose_book(&records, &config);
        let node = &diagnoses[0].energy_nodes[0];
        let SegmentOutcome::NeedsDrilldown { problems, .. } = &node.outcome else {
            panic!("expected drill-down");
        };

        let names: Vec<&str> = problems.iter().map(|p| p.category.as_str()).collect();
        // 1.0% retained, 0.99% dropped
        assert!(names.contains(&"edge"));
        assert!(!names.contains(&"sliver"));
    }

    #[test]
    fn test_severity_formula() {
        let config = AnalysisConfig::default();
        let kpis = KpiResult::from_totals(&Totals {
            signed_premium: 100_000.0,
            matured_premium: 100_000.0,
            reported_claims: 85_000.0, // lr 85
            expense_amount: 10_000.0,  // er 10 -> cm 5
            policy_count: 10,
            claim_case_count: 5,
        });
        // (15 * 3 + 1 * 2.5) * 20 = 950
        assert_relative_eq!(severity_score(&kpis, 20.0, &config), 950.0, epsilon = 1e-6);
    }

    #[test]
    fn test_severity_ties_break_by_category_name() {
        let config = AnalysisConfig::default();
        // Two identical categories except for the name
        let records = vec![
            record("north", "beta", CoverageType::FullPackage, RenewalStatus::New,
                   true, 50_000.0, 45_000.0),
            record("north", "alpha", CoverageType::FullPackage, RenewalStatus::New,
                   true, 50_000.0, 45_000.0),
        ];
        let diagnoses = diagnose_book(&records, &config);
        let SegmentOutcome::NeedsDrilldown { problems, .. } =
            &diagnoses[0].energy_nodes[0].outcome
        else {
            panic!("expected drill-down");
        };
        assert_eq!(problems[0].category, "alpha");
        assert_eq!(problems[1].category, "beta");
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let config = AnalysisConfig::default();
        let records = fixture();
        let first = diagnose_book(&records, &config);
        let second = diagnose_book(&records, &config);

        let summarize = |ds: &[OrgDiagnosis]| -> Vec<(String, Vec<String>)> {
            ds.iter()
                .map(|d| {
                    let problems = d
                        .energy_nodes
                        .iter()
                        .flat_map(|n| match &n.outcome {
                            SegmentOutcome::NeedsDrilldown { problems, .. } => {
                                problems.iter().map(|p| p.category.clone()).collect()
                            }
                            SegmentOutcome::Healthy(_) => Vec::new(),
                        })
                        .collect();
                    (d.organization.clone(), problems)
                })
                .collect()
        };
        assert_eq!(summarize(&first), summarize(&second));
    }

    #[test]
    fn test_partition_premiums_sum_to_parent() {
        let config = AnalysisConfig::default();
        let records = fixture();
        let diagnoses = diagnose_book(&records, &config);
        let org = &diagnoses[0];

        // Energy partitions are exhaustive (every record is new-energy or
        // not), so without pruning their premiums sum to the org total.
        let refs: Vec<&PolicyRecord> = records.iter().collect();
        let partition_sum: f64 = EnergySegment::ALL
            .iter()
            .map(|s| {
                Totals::aggregate(refs.iter().copied().filter(|r| s.matches(r.new_energy)))
                    .matured_premium
            })
            .sum();
        assert_relative_eq!(partition_sum, org.kpis.matured_premium);
    }
}
