//! Executive summary: one conclusion, its supports, one action
//!
//! Pyramid style: the conclusion leads, the latest week's numbers support it,
//! and the action follows from the status band and trend direction.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::kpi::{classify_loss_ratio, KpiResult, StatusBand};
use crate::trend::{TrendDirection, TrendSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub core_conclusion: String,
    pub key_supports: Vec<String>,
    pub immediate_action: String,
}

/// Build the executive summary from the latest weekly KPIs and the
/// loss-ratio trend.
pub fn executive_summary(
    latest: &KpiResult,
    trend: &TrendSummary,
    config: &AnalysisConfig,
) -> ExecutiveSummary {
    let status = classify_loss_ratio(latest.loss_ratio, &config.status);

    let core_conclusion = match status {
        StatusBand::Danger | StatusBand::Warning => {
            if trend.direction == TrendDirection::Rising {
                format!(
                    "Portfolio is in a high-risk state: loss ratio {:.1}% and still deteriorating; immediate intervention required",
                    latest.loss_ratio
                )
            } else {
                format!(
                    "Portfolio is in a high-risk state: loss ratio {:.1}%, trend currently {}",
                    latest.loss_ratio,
                    trend.direction.label()
                )
            }
        }
        _ => format!(
            "Portfolio status {}: loss ratio {:.1}%, within the controllable range",
            status.label(),
            latest.loss_ratio
        ),
    };

    let key_supports = vec![
        format!("loss ratio {:.1}% ({})", latest.loss_ratio, status.label()),
        format!("loss-ratio trend {} (slope {:+.2}/week)", trend.direction.label(), trend.slope),
        format!("average claim {:.0} yuan", latest.avg_claim),
    ];

    let immediate_action = match status {
        StatusBand::Danger => {
            "Suspend automatic underwriting for high-risk new business and start emergency risk controls"
        }
        StatusBand::Warning => {
            "Tighten review of high-risk business and monitor the trend weekly"
        }
        _ => "Maintain the current strategy and keep monitoring core indicators",
    }
    .to_string();

    ExecutiveSummary { core_conclusion, key_supports, immediate_action }
}
