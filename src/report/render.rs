//! Markdown rendering for weekly and spotlight reports
//!
//! Amount columns are reported in units of 10,000 yuan to keep the tables
//! readable at portfolio scale.

use crate::config::AnalysisConfig;
use crate::kpi::{classify_contribution_margin, classify_expense_ratio, classify_loss_ratio};
use crate::report::DiagnosticReport;
use crate::spotlight::SpotlightAnalysis;
use crate::trend::Anomaly;

fn wan(amount: f64) -> f64 {
    amount / 10_000.0
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Render the full weekly diagnostic report as Markdown.
pub fn render_weekly_report(report: &DiagnosticReport, config: &AnalysisConfig) -> String {
    let mut out = String::new();

    push_line(&mut out, &format!(
        "# Motor portfolio weekly report — policy year {}, week {}\n",
        report.year, report.end_week
    ));
    push_line(&mut out, &format!("**Generated**: {}\n", report.generated_at));
    push_line(&mut out, &format!(
        "**Window**: weeks {}-{}{}\n",
        report.start_week,
        report.end_week,
        if report.missing_weeks.is_empty() {
            String::new()
        } else {
            format!(" (gaps: {:?})", report.missing_weeks)
        }
    ));
    push_line(&mut out, "---\n");

    render_executive_summary(&mut out, report);
    render_global_dashboard(&mut out, report, config);
    render_org_index(&mut out, report);
    render_org_deep_dives(&mut out, report, config);
    render_trend_section(&mut out, report);

    out
}

fn render_executive_summary(out: &mut String, report: &DiagnosticReport) {
    push_line(out, "## Executive summary\n");
    push_line(out, &format!("**Conclusion**: {}\n", report.summary.core_conclusion));
    for support in &report.summary.key_supports {
        push_line(out, &format!("- {support}"));
    }
    push_line(out, "");
    push_line(out, &format!("**Immediate action**: {}\n", report.summary.immediate_action));
}

fn render_global_dashboard(out: &mut String, report: &DiagnosticReport, config: &AnalysisConfig) {
    let g = &report.global;
    push_line(out, "## Global KPI dashboard\n");
    push_line(out, "| Metric | Value | Status |");
    push_line(out, "|--------|-------|--------|");
    push_line(out, &format!("| Matured premium | {:.2} (10k yuan) | - |", wan(g.matured_premium)));
    push_line(out, &format!("| Signed premium | {:.2} (10k yuan) | - |", wan(g.signed_premium)));
    push_line(out, &format!("| Policies | {} | - |", g.policy_count));
    push_line(out, &format!("| Claim cases | {} | - |", g.claim_case_count));
    push_line(out, &format!(
        "| Loss ratio | {:.2}% | {} |",
        g.loss_ratio,
        classify_loss_ratio(g.loss_ratio, &config.status).label()
    ));
    push_line(out, &format!(
        "| Expense ratio | {:.2}% | {} |",
        g.expense_ratio,
        classify_expense_ratio(g.expense_ratio, &config.status).label()
    ));
    push_line(out, &format!(
        "| Contribution margin | {:.2}% | {} |",
        g.contribution_margin,
        classify_contribution_margin(g.contribution_margin, &config.status).label()
    ));
    push_line(out, &format!("| Claim frequency | {:.2}% | - |", g.claim_frequency));
    push_line(out, &format!("| Average claim | {:.0} yuan | - |", g.avg_claim));
    push_line(out, &format!("| Average premium | {:.0} yuan | - |", g.avg_premium));
    push_line(out, "");
}

fn render_org_index(out: &mut String, report: &DiagnosticReport) {
    push_line(out, "## Organization index\n");
    push_line(out, "| Organization | Matured premium (10k) | Share | Loss ratio | Contribution | Status |");
    push_line(out, "|--------------|----------------------|-------|------------|--------------|--------|");
    for org in &report.organizations {
        push_line(out, &format!(
            "| {} | {:.2} | {:.1}% | {:.2}% | {:.2}% | {} |",
            org.organization,
            wan(org.kpis.matured_premium),
            org.share_pct,
            org.kpis.loss_ratio,
            org.kpis.contribution_margin,
            if org.healthy { "healthy" } else { "attention" }
        ));
    }
    push_line(out, "");
}

fn render_org_deep_dives(out: &mut String, report: &DiagnosticReport, config: &AnalysisConfig) {
    push_line(out, "## Organization deep dives\n");

    for (idx, org) in report.organizations.iter().enumerate() {
        push_line(out, &format!("### {}. {}\n", idx + 1, org.organization));
        push_line(out, &format!(
            "Loss ratio {:.2}% ({}), expense ratio {:.2}%, contribution margin {:.2}% ({}), {} policies.\n",
            org.kpis.loss_ratio,
            org.loss_ratio_status.label(),
            org.kpis.expense_ratio,
            org.kpis.contribution_margin,
            org.contribution_status.label(),
            org.kpis.policy_count
        ));

        for node in &org.energy_nodes {
            let kpis = node.outcome.kpis();
            let health = if node.outcome.is_healthy() { "healthy" } else { "needs attention" };
            push_line(out, &format!(
                "**{}** ({:.1}% share) — {}",
                node.segment.label(),
                node.share_pct,
                health
            ));
            push_line(out, &format!(
                "- matured premium {:.2} (10k yuan), loss ratio {:.2}%, contribution margin {:.2}%\n",
                wan(kpis.matured_premium),
                kpis.loss_ratio,
                kpis.contribution_margin
            ));

            if let crate::drilldown::SegmentOutcome::NeedsDrilldown { problems, .. } = &node.outcome {
                if !problems.is_empty() {
                    push_line(out, &format!(
                        "Problem business types (top {}):\n",
                        config.top_problem_segments
                    ));
                    for (rank, problem) in problems.iter().enumerate() {
                        push_line(out, &format!(
                            "{}. **{}** — severity {:.0}",
                            rank + 1,
                            problem.category,
                            problem.severity
                        ));
                        push_line(out, &format!(
                            "   - matured premium {:.2} (10k, {:.1}% of segment), loss ratio {:.2}%, contribution margin {:.2}%",
                            wan(problem.kpis.matured_premium),
                            problem.share_pct,
                            problem.kpis.loss_ratio,
                            problem.kpis.contribution_margin
                        ));
                        if !problem.coverage_breakdown.is_empty() {
                            let slices: Vec<String> = problem
                                .coverage_breakdown
                                .iter()
                                .map(|s| format!("{} ({:.1}%)", s.dimension.label(), s.kpis.loss_ratio))
                                .collect();
                            push_line(out, &format!("   - by coverage: {}", slices.join(" | ")));
                        }
                        if !problem.renewal_breakdown.is_empty() {
                            let slices: Vec<String> = problem
                                .renewal_breakdown
                                .iter()
                                .map(|s| format!("{} ({:.1}%)", s.dimension.label(), s.kpis.loss_ratio))
                                .collect();
                            push_line(out, &format!("   - by renewal: {}", slices.join(" | ")));
                        }
                        push_line(out, "");
                    }
                }
            }
        }
        push_line(out, "---\n");
    }
}

fn render_trend_section(out: &mut String, report: &DiagnosticReport) {
    push_line(out, "## Weekly trend\n");

    if report.weekly.is_empty() {
        push_line(out, "No incremental weekly data available in the window.\n");
        return;
    }

    push_line(out, "| Week | Matured premium (10k) | Loss ratio | Expense ratio | Contribution | Frequency | Avg claim |");
    push_line(out, "|------|----------------------|------------|---------------|--------------|-----------|-----------|");
    for point in &report.weekly.points {
        let k = &point.kpis;
        push_line(out, &format!(
            "| {} | {:.2} | {:.2}% | {:.2}% | {:.2}% | {:.2}% | {:.0} |",
            point.week,
            wan(k.matured_premium),
            k.loss_ratio,
            k.expense_ratio,
            k.contribution_margin,
            k.claim_frequency,
            k.avg_claim
        ));
    }
    push_line(out, "");

    let trend = &report.loss_ratio_trend;
    push_line(out, &format!(
        "Loss-ratio trend: **{}** (slope {:+.2}/week, net change {:+.1}pp). Volatility: **{}** (cv {:.3}).\n",
        trend.direction.label(),
        trend.slope,
        trend.net_change,
        report.loss_ratio_volatility.level.label(),
        report.loss_ratio_volatility.coefficient_of_variation
    ));

    if !report.anomalies.is_empty() {
        push_line(out, "### Anomalies\n");
        for anomaly in &report.anomalies {
            push_line(out, &format!("- {}", describe_anomaly(anomaly)));
        }
        push_line(out, "");
    }

    if !report.problem_weeks.is_empty() {
        push_line(out, "### Problem weeks\n");
        for problem in &report.problem_weeks {
            push_line(out, &format!("- week {}: {}", problem.week, problem.issues.join("; ")));
        }
        push_line(out, "");
    }
}

fn describe_anomaly(anomaly: &Anomaly) -> String {
    match anomaly {
        Anomaly::AmountSpike { metric, week, value, previous, change_ratio, .. } => format!(
            "week {week}: {metric} spiked to {value:.0} from {previous:.0} ({:+.0}%)",
            change_ratio * 100.0
        ),
        Anomaly::RatioJump { metric, week, value, previous, change_points } => format!(
            "week {week}: {metric} jumped to {value:.1}% from {previous:.1}% ({change_points:+.1}pp)"
        ),
        Anomaly::ConsecutiveDeterioration { metric, weeks, change_magnitude } => format!(
            "{metric} rose for {} consecutive weeks ({weeks:?}, {change_magnitude:+.1}pp)",
            weeks.len()
        ),
    }
}

/// Render the spotlight segment report as Markdown.
pub fn render_spotlight_report(
    year: u16,
    analysis: &SpotlightAnalysis,
    generated_at: &str,
) -> String {
    let mut out = String::new();

    push_line(&mut out, &format!("# Segment spotlight — policy year {year}\n"));
    push_line(&mut out, &format!("**Segment**: {}\n", analysis.segment));
    push_line(&mut out, &format!("**Generated**: {generated_at}\n"));
    push_line(&mut out, "---\n");

    push_line(&mut out, "## Weekly cumulative KPIs\n");
    push_line(&mut out, "| Week | Signed premium (10k) | Policies | Loss ratio | Contribution | Frequency | Avg claim |");
    push_line(&mut out, "|------|---------------------|----------|------------|--------------|-----------|-----------|");
    for point in &analysis.weekly_kpis {
        let k = &point.kpis;
        push_line(&mut out, &format!(
            "| {} | {:.2} | {} | {:.2}% | {:.2}% | {:.2}% | {:.0} |",
            point.week,
            wan(k.signed_premium),
            k.policy_count,
            k.loss_ratio,
            k.contribution_margin,
            k.claim_frequency,
            k.avg_claim
        ));
    }
    push_line(&mut out, "");

    push_line(&mut out, "## Organization ranking (latest week)\n");
    push_line(&mut out, "| Organization | Signed premium (10k) | Loss ratio | Frequency | Avg claim | Risk |");
    push_line(&mut out, "|--------------|---------------------|------------|-----------|-----------|------|");
    for standing in &analysis.org_rankings {
        let k = &standing.kpis;
        push_line(&mut out, &format!(
            "| {} | {:.2} | {:.2}% | {:.2}% | {:.0} | {} |",
            standing.organization,
            wan(k.signed_premium),
            k.loss_ratio,
            k.claim_frequency,
            k.avg_claim,
            standing.risk.label()
        ));
    }
    push_line(&mut out, "");

    push_line(&mut out, "## Business mix (latest week)\n");
    push_line(&mut out, "| Category | Signed premium (10k) | Policies | Loss ratio |");
    push_line(&mut out, "|----------|---------------------|----------|------------|");
    for mix in &analysis.category_mix {
        push_line(&mut out, &format!(
            "| {} | {:.2} | {} | {:.2}% |",
            mix.category,
            wan(mix.kpis.signed_premium),
            mix.kpis.policy_count,
            mix.kpis.loss_ratio
        ));
    }
    push_line(&mut out, "");

    let trend = &analysis.loss_ratio_trend;
    push_line(&mut out, "## Trend\n");
    push_line(&mut out, &format!(
        "Loss-ratio trend **{}** (slope {:+.2}/week, net change {:+.1}pp); volatility **{}**.\n",
        trend.direction.label(),
        trend.slope,
        trend.net_change,
        analysis.loss_ratio_volatility.level.label()
    ));

    if !analysis.problem_weeks.is_empty() {
        push_line(&mut out, "### Problem weeks\n");
        for problem in &analysis.problem_weeks {
            push_line(&mut out, &format!("- week {}: {}", problem.week, problem.issues.join("; ")));
        }
        push_line(&mut out, "");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drilldown::diagnose_book;
    use crate::kpi::KpiResult;
    use crate::records::{CoverageType, PolicyRecord, RenewalStatus, Totals};
    use crate::report::executive_summary;
    use crate::trend::{detect_anomalies, detect_problem_weeks, trend_of, volatility_of,
                       WeeklyPoint, WeeklySeries};

    fn sample_report() -> (DiagnosticReport, AnalysisConfig) {
        let config = AnalysisConfig::default();
        let records = vec![PolicyRecord {
            organization: "east_branch".to_string(),
            business_category: "truck_heavy".to_string(),
            coverage_type: CoverageType::FullPackage,
            renewal_status: RenewalStatus::New,
            new_energy: true,
            signed_premium: 100_000.0,
            matured_premium: 80_000.0,
            reported_claims: 68_000.0,
            expense_amount: 9_000.0,
            policy_count: 40,
            claim_case_count: 12,
            week: 44,
            policy_year: 2025,
        }];

        let global = KpiResult::from_totals(&Totals::aggregate(&records));
        let organizations = diagnose_book(&records, &config);
        let weekly = WeeklySeries {
            points: vec![WeeklyPoint { week: 44, kpis: global }],
        };
        let loss_ratios = weekly.metric(|k| k.loss_ratio);
        let trend = trend_of(&loss_ratios, &config.trend);
        let summary = executive_summary(&global, &trend, &config);

        let report = DiagnosticReport {
            year: 2025,
            end_week: 44,
            start_week: 40,
            missing_weeks: vec![],
            generated_at: "2025-11-05 09:00:00".to_string(),
            global,
            organizations,
            loss_ratio_volatility: volatility_of(&loss_ratios, &config.trend),
            anomalies: detect_anomalies(&weekly, &config.trend),
            problem_weeks: detect_problem_weeks(&weekly, &config.trend),
            loss_ratio_trend: trend,
            weekly,
            summary,
        };
        (report, config)
    }

    #[test]
    fn test_weekly_report_contains_all_sections() {
        let (report, config) = sample_report();
        let markdown = render_weekly_report(&report, &config);

        assert!(markdown.contains("# Motor portfolio weekly report"));
        assert!(markdown.contains("## Executive summary"));
        assert!(markdown.contains("## Global KPI dashboard"));
        assert!(markdown.contains("## Organization index"));
        assert!(markdown.contains("## Organization deep dives"));
        assert!(markdown.contains("## Weekly trend"));
        assert!(markdown.contains("east_branch"));
        // lr 85 -> danger in the dashboard
        assert!(markdown.contains("danger"));
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let (report, _) = sample_report();
        let json = serde_json::to_string_pretty(&report).unwrap();
        let back: DiagnosticReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.year, report.year);
        assert_eq!(back.organizations.len(), report.organizations.len());
        assert_eq!(back.global, report.global);
    }
}
