//! Node types of the diagnostic tree

use serde::{Deserialize, Serialize};

use crate::kpi::{KpiResult, StatusBand};
use crate::records::{CoverageType, EnergySegment, RenewalStatus};

/// KPIs for one coverage-type or renewal-status slice of a problem segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceKpi<D> {
    pub dimension: D,
    pub kpis: KpiResult,
    /// Matured-premium share of the parent business category, percent
    pub share_pct: f64,
}

/// One business category ranked as a problem within an energy segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessProblem {
    pub category: String,
    pub kpis: KpiResult,
    /// Matured-premium share of the energy segment, percent
    pub share_pct: f64,
    pub severity: f64,
    /// Coverage slices, loss ratio descending
    pub coverage_breakdown: Vec<SliceKpi<CoverageType>>,
    /// Renewal slices, loss ratio descending
    pub renewal_breakdown: Vec<SliceKpi<RenewalStatus>>,
}

/// Outcome for an energy segment: healthy segments stop the descent, the
/// rest carry their ranked problem categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SegmentOutcome {
    Healthy(KpiResult),
    NeedsDrilldown {
        kpis: KpiResult,
        problems: Vec<BusinessProblem>,
    },
}

impl SegmentOutcome {
    pub fn kpis(&self) -> &KpiResult {
        match self {
            SegmentOutcome::Healthy(kpis) => kpis,
            SegmentOutcome::NeedsDrilldown { kpis, .. } => kpis,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, SegmentOutcome::Healthy(_))
    }
}

/// First drill-down layer: one energy segment of an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyNode {
    pub segment: EnergySegment,
    /// Matured-premium share of the organization, percent
    pub share_pct: f64,
    pub outcome: SegmentOutcome,
}

/// Root of one organization's diagnostic tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgDiagnosis {
    pub organization: String,
    pub kpis: KpiResult,
    /// Matured-premium share of the whole book, percent
    pub share_pct: f64,
    pub loss_ratio_status: StatusBand,
    pub contribution_status: StatusBand,
    pub healthy: bool,
    pub energy_nodes: Vec<EnergyNode>,
}
