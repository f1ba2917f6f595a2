//! Report assembly: Markdown rendering and the JSON diagnostic object

mod insights;
mod render;

pub use insights::{executive_summary, ExecutiveSummary};
pub use render::{render_spotlight_report, render_weekly_report};

use serde::{Deserialize, Serialize};

use crate::drilldown::OrgDiagnosis;
use crate::kpi::KpiResult;
use crate::trend::{Anomaly, ProblemWeek, TrendSummary, Volatility, WeeklySeries};

/// The fully-populated result object for one (year, end-week) run: the core's
/// contract with downstream rendering collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub year: u16,
    pub end_week: u32,
    pub start_week: u32,
    /// Requested weeks with no data file (non-fatal gaps)
    pub missing_weeks: Vec<u32>,
    pub generated_at: String,

    /// Whole-book KPIs at the latest cumulative snapshot
    pub global: KpiResult,
    /// Per-organization drill-down trees, ordered by organization name
    pub organizations: Vec<OrgDiagnosis>,

    /// Book-level incremental weekly KPI series
    pub weekly: WeeklySeries,
    pub loss_ratio_trend: TrendSummary,
    pub loss_ratio_volatility: Volatility,
    pub anomalies: Vec<Anomaly>,
    pub problem_weeks: Vec<ProblemWeek>,

    pub summary: ExecutiveSummary,
}
