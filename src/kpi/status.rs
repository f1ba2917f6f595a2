//! Five-band status classification and the compound health check

use serde::{Deserialize, Serialize};

use crate::config::{HealthThresholds, StatusThresholds};
use crate::kpi::KpiResult;

/// Ordered risk bucket for a single metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusBand {
    Excellent,
    Good,
    Medium,
    Warning,
    Danger,
}

impl StatusBand {
    pub fn label(&self) -> &'static str {
        match self {
            StatusBand::Excellent => "excellent",
            StatusBand::Good => "good",
            StatusBand::Medium => "medium",
            StatusBand::Warning => "warning",
            StatusBand::Danger => "danger",
        }
    }
}

/// Loss ratio: lower is better, bands ascend through the cut points.
pub fn classify_loss_ratio(value: f64, thresholds: &StatusThresholds) -> StatusBand {
    let [excellent, good, medium, warning] = thresholds.loss_ratio;
    if value < excellent {
        StatusBand::Excellent
    } else if value < good {
        StatusBand::Good
    } else if value < medium {
        StatusBand::Medium
    } else if value < warning {
        StatusBand::Warning
    } else {
        StatusBand::Danger
    }
}

/// Contribution margin: higher is better. A value exactly on the lowest cut
/// point (4) is Danger; 8 and 6 belong to the better band.
pub fn classify_contribution_margin(value: f64, thresholds: &StatusThresholds) -> StatusBand {
    let [excellent, good, medium, warning] = thresholds.contribution_margin;
    if value > excellent {
        StatusBand::Excellent
    } else if value >= good {
        StatusBand::Good
    } else if value >= medium {
        StatusBand::Medium
    } else if value > warning {
        StatusBand::Warning
    } else {
        StatusBand::Danger
    }
}

/// Expense ratio: lower is better.
pub fn classify_expense_ratio(value: f64, thresholds: &StatusThresholds) -> StatusBand {
    let [excellent, good, medium, warning] = thresholds.expense_ratio;
    if value < excellent {
        StatusBand::Excellent
    } else if value < good {
        StatusBand::Good
    } else if value < medium {
        StatusBand::Medium
    } else if value < warning {
        StatusBand::Warning
    } else {
        StatusBand::Danger
    }
}

/// Compound health check used by the drill-down engine to stop descending.
pub fn is_healthy(kpis: &KpiResult, thresholds: &HealthThresholds) -> bool {
    kpis.loss_ratio < thresholds.max_loss_ratio
        && kpis.contribution_margin > thresholds.min_contribution_margin
}
