//! Analysis configuration
//!
//! All tunable thresholds live here and are passed into each component
//! explicitly. The whole struct deserializes from JSON with per-field
//! defaults, so a config file only needs to override what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Band boundaries for the five-level status classifier.
///
/// Loss and expense ratios classify low-is-good with ascending cut points;
/// contribution margin classifies high-is-good with descending cut points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusThresholds {
    /// Loss ratio cut points: excellent < 50, good < 60, medium < 70,
    /// warning < 80, danger >= 80
    #[serde(default = "default_loss_ratio_bands")]
    pub loss_ratio: [f64; 4],

    /// Contribution margin cut points: excellent > 12, good >= 8,
    /// medium >= 6, warning > 4, danger <= 4
    #[serde(default = "default_contribution_bands")]
    pub contribution_margin: [f64; 4],

    /// Expense ratio cut points: excellent < 7.5, good < 12.5,
    /// medium < 17.5, warning < 22.5, danger >= 22.5
    #[serde(default = "default_expense_bands")]
    pub expense_ratio: [f64; 4],
}

fn default_loss_ratio_bands() -> [f64; 4] { [50.0, 60.0, 70.0, 80.0] }
fn default_contribution_bands() -> [f64; 4] { [12.0, 8.0, 6.0, 4.0] }
fn default_expense_bands() -> [f64; 4] { [7.5, 12.5, 17.5, 22.5] }

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            loss_ratio: default_loss_ratio_bands(),
            contribution_margin: default_contribution_bands(),
            expense_ratio: default_expense_bands(),
        }
    }
}

/// Compound threshold deciding whether a segment needs further drill-down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthThresholds {
    /// Segment is healthy only while loss ratio stays below this
    #[serde(default = "default_health_loss_ratio")]
    pub max_loss_ratio: f64,

    /// Segment is healthy only while contribution margin stays above this
    #[serde(default = "default_health_contribution")]
    pub min_contribution_margin: f64,
}

fn default_health_loss_ratio() -> f64 { 70.0 }
fn default_health_contribution() -> f64 { 8.0 }

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            max_loss_ratio: default_health_loss_ratio(),
            min_contribution_margin: default_health_contribution(),
        }
    }
}

/// Weights and pivots for the problem-segment severity score.
///
/// severity = (max(0, loss_ratio - loss_pivot) * loss_weight
///           + max(0, contribution_pivot - contribution_margin)
///             * contribution_weight) * premium_share_pct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityWeights {
    #[serde(default = "default_loss_pivot")]
    pub loss_pivot: f64,
    #[serde(default = "default_loss_weight")]
    pub loss_weight: f64,
    #[serde(default = "default_contribution_pivot")]
    pub contribution_pivot: f64,
    #[serde(default = "default_contribution_weight")]
    pub contribution_weight: f64,
}

fn default_loss_pivot() -> f64 { 70.0 }
fn default_loss_weight() -> f64 { 3.0 }
fn default_contribution_pivot() -> f64 { 6.0 }
fn default_contribution_weight() -> f64 { 2.5 }

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            loss_pivot: default_loss_pivot(),
            loss_weight: default_loss_weight(),
            contribution_pivot: default_contribution_pivot(),
            contribution_weight: default_contribution_weight(),
        }
    }
}

/// Thresholds for trend direction, spikes and volatility labels.
///
/// Slope thresholds are in the metric's own unit per week, so callers pick
/// values appropriate to what they feed in rather than the detector
/// hard-coding per-metric rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Slope above which a series is "rising" (below the negative: "falling")
    #[serde(default = "default_slope_threshold")]
    pub slope_threshold: f64,

    /// Amount-like metric spike: current > previous * multiplier
    #[serde(default = "default_spike_multiplier")]
    pub spike_multiplier: f64,

    /// Spike severity escalates to high above this multiplier
    #[serde(default = "default_severe_spike_multiplier")]
    pub severe_spike_multiplier: f64,

    /// Ratio-like metric jump: current > previous + this many points
    #[serde(default = "default_ratio_jump_points")]
    pub ratio_jump_points: f64,

    /// Number of trailing periods that must strictly increase to flag
    /// consecutive deterioration
    #[serde(default = "default_deterioration_periods")]
    pub deterioration_periods: usize,

    /// Coefficient-of-variation boundary for the "high" volatility label
    #[serde(default = "default_volatility_high")]
    pub volatility_high: f64,

    /// Coefficient-of-variation boundary for the "medium" volatility label
    #[serde(default = "default_volatility_medium")]
    pub volatility_medium: f64,
}

fn default_slope_threshold() -> f64 { 0.5 }
fn default_spike_multiplier() -> f64 { 1.5 }
fn default_severe_spike_multiplier() -> f64 { 2.0 }
fn default_ratio_jump_points() -> f64 { 15.0 }
fn default_deterioration_periods() -> usize { 3 }
fn default_volatility_high() -> f64 { 0.1 }
fn default_volatility_medium() -> f64 { 0.05 }

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            slope_threshold: default_slope_threshold(),
            spike_multiplier: default_spike_multiplier(),
            severe_spike_multiplier: default_severe_spike_multiplier(),
            ratio_jump_points: default_ratio_jump_points(),
            deterioration_periods: default_deterioration_periods(),
            volatility_high: default_volatility_high(),
            volatility_medium: default_volatility_medium(),
        }
    }
}

/// Top-level configuration passed into every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Organization label for head-office rows, excluded at load time
    #[serde(default = "default_head_office_label")]
    pub head_office_label: String,

    /// Trailing window length when the week range is auto-inferred
    #[serde(default = "default_lookback_weeks")]
    pub lookback_weeks: u32,

    /// Abort the year when more than this fraction of requested weeks is
    /// missing (0.2 = 20%)
    #[serde(default = "default_missing_tolerance")]
    pub missing_tolerance: f64,

    /// Drill-down prunes partitions below this premium share of the parent,
    /// in percent. The boundary is inclusive: exactly 1.0% is retained.
    #[serde(default = "default_min_share_pct")]
    pub min_share_pct: f64,

    /// How many problem business categories to keep per energy segment
    #[serde(default = "default_top_problem_segments")]
    pub top_problem_segments: usize,

    /// Spotlight drops organizations below this signed premium (yuan)
    #[serde(default = "default_min_premium_floor")]
    pub min_premium_floor: f64,

    #[serde(default)]
    pub status: StatusThresholds,

    #[serde(default)]
    pub health: HealthThresholds,

    #[serde(default)]
    pub severity: SeverityWeights,

    #[serde(default)]
    pub trend: TrendConfig,
}

fn default_head_office_label() -> String { "head_office".to_string() }
fn default_lookback_weeks() -> u32 { 5 }
fn default_missing_tolerance() -> f64 { 0.2 }
fn default_min_share_pct() -> f64 { 1.0 }
fn default_top_problem_segments() -> usize { 3 }
fn default_min_premium_floor() -> f64 { 10_000.0 }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            head_office_label: default_head_office_label(),
            lookback_weeks: default_lookback_weeks(),
            missing_tolerance: default_missing_tolerance(),
            min_share_pct: default_min_share_pct(),
            top_problem_segments: default_top_problem_segments(),
            min_premium_floor: default_min_premium_floor(),
            status: StatusThresholds::default(),
            health: HealthThresholds::default(),
            severity: SeverityWeights::default(),
            trend: TrendConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file, filling omitted fields with
    /// defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }
}
