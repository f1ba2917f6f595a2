//! Stateless trend and anomaly detectors
//!
//! All detectors are pure functions over the supplied sequence; nothing is
//! persisted between runs. Thresholds come from `TrendConfig` so callers can
//! match them to the unit of whatever metric they feed in.

use serde::{Deserialize, Serialize};

use crate::config::TrendConfig;
use crate::trend::WeeklySeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

impl TrendDirection {
    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Rising => "rising",
            TrendDirection::Falling => "falling",
            TrendDirection::Stable => "stable",
        }
    }
}

/// First-degree least-squares fit over one metric sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSummary {
    pub direction: TrendDirection,
    pub slope: f64,
    /// last - first
    pub net_change: f64,
    /// net change averaged over the number of periods
    pub avg_weekly_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityLevel {
    High,
    Medium,
    Low,
}

impl VolatilityLevel {
    pub fn label(&self) -> &'static str {
        match self {
            VolatilityLevel::High => "high",
            VolatilityLevel::Medium => "medium",
            VolatilityLevel::Low => "low",
        }
    }
}

/// Population standard deviation / mean over the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volatility {
    pub mean: f64,
    pub std_dev: f64,
    pub coefficient_of_variation: f64,
    pub level: VolatilityLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpikeSeverity {
    Medium,
    High,
}

/// A flagged deviation in the weekly sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Anomaly {
    /// Amount-like metric jumped past the spike multiplier
    AmountSpike {
        metric: String,
        week: u32,
        value: f64,
        previous: f64,
        change_ratio: f64,
        severity: SpikeSeverity,
    },
    /// Ratio-like metric jumped by more than the configured points
    RatioJump {
        metric: String,
        week: u32,
        value: f64,
        previous: f64,
        change_points: f64,
    },
    /// Trailing periods strictly increasing
    ConsecutiveDeterioration {
        metric: String,
        weeks: Vec<u32>,
        change_magnitude: f64,
    },
}

/// Least-squares slope of (index, value). 0 for fewer than two points.
pub fn fit_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        numerator += dx * (y - mean_y);
        denominator += dx * dx;
    }
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Classify a metric sequence's direction against the configured slope
/// threshold.
pub fn trend_of(values: &[f64], config: &TrendConfig) -> TrendSummary {
    let slope = fit_slope(values);
    let direction = if slope > config.slope_threshold {
        TrendDirection::Rising
    } else if slope < -config.slope_threshold {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    };

    let net_change = match (values.first(), values.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    };
    let avg_weekly_change = if values.is_empty() { 0.0 } else { net_change / values.len() as f64 };

    TrendSummary { direction, slope, net_change, avg_weekly_change }
}

/// Volatility over the window: population std-dev over mean, 0 when the mean
/// is 0.
pub fn volatility_of(values: &[f64], config: &TrendConfig) -> Volatility {
    let n = values.len() as f64;
    let mean = if n > 0.0 { values.iter().sum::<f64>() / n } else { 0.0 };
    let variance = if n > 0.0 {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
    } else {
        0.0
    };
    let std_dev = variance.sqrt();
    let cv = if mean != 0.0 { std_dev / mean } else { 0.0 };

    let level = if cv > config.volatility_high {
        VolatilityLevel::High
    } else if cv > config.volatility_medium {
        VolatilityLevel::Medium
    } else {
        VolatilityLevel::Low
    };

    Volatility { mean, std_dev, coefficient_of_variation: cv, level }
}

/// Detect single-period spikes and consecutive deterioration across the
/// standard weekly metrics: average claim (amount spike), loss ratio (point
/// jump and deterioration).
pub fn detect_anomalies(series: &WeeklySeries, config: &TrendConfig) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    let weeks = series.weeks();

    // Amount-like: average claim week over week
    let avg_claims = series.metric(|k| k.avg_claim);
    for i in 1..avg_claims.len() {
        let previous = avg_claims[i - 1];
        let value = avg_claims[i];
        if previous > 0.0 && value > previous * config.spike_multiplier {
            let severity = if value > previous * config.severe_spike_multiplier {
                SpikeSeverity::High
            } else {
                SpikeSeverity::Medium
            };
            anomalies.push(Anomaly::AmountSpike {
                metric: "avg_claim".to_string(),
                week: weeks[i],
                value,
                previous,
                change_ratio: (value - previous) / previous,
                severity,
            });
        }
    }

    // Ratio-like: loss ratio point jump
    let loss_ratios = series.metric(|k| k.loss_ratio);
    for i in 1..loss_ratios.len() {
        let previous = loss_ratios[i - 1];
        let value = loss_ratios[i];
        if value > previous + config.ratio_jump_points {
            anomalies.push(Anomaly::RatioJump {
                metric: "loss_ratio".to_string(),
                week: weeks[i],
                value,
                previous,
                change_points: value - previous,
            });
        }
    }

    // Trailing strictly-increasing loss ratio
    let window = config.deterioration_periods;
    if window >= 2 && loss_ratios.len() >= window {
        let tail = &loss_ratios[loss_ratios.len() - window..];
        if tail.windows(2).all(|pair| pair[0] < pair[1]) {
            anomalies.push(Anomaly::ConsecutiveDeterioration {
                metric: "loss_ratio".to_string(),
                weeks: weeks[weeks.len() - window..].to_vec(),
                change_magnitude: tail[window - 1] - tail[0],
            });
        }
    }

    anomalies
}

/// A week flagged against the window's own averages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemWeek {
    pub week: u32,
    pub issues: Vec<String>,
}

// Absolute boundaries for problem-week flagging

/// Loss ratio above which a week is flagged outright
const PROBLEM_LOSS_RATIO_DANGER: f64 = 80.0;

/// Flag a week whose loss ratio exceeds the window mean by this factor
const PROBLEM_LOSS_VS_MEAN: f64 = 1.3;

/// Claim frequency above which a week is flagged
const PROBLEM_CLAIM_FREQUENCY: f64 = 30.0;

/// Flag weeks whose KPIs stand out against the window: loss ratio in the
/// danger zone or well above the window mean, outsized average claims,
/// excessive claim frequency.
pub fn detect_problem_weeks(series: &WeeklySeries, config: &TrendConfig) -> Vec<ProblemWeek> {
    if series.is_empty() {
        return Vec::new();
    }

    let loss_ratios = series.metric(|k| k.loss_ratio);
    let avg_claims = series.metric(|k| k.avg_claim);
    let n = loss_ratios.len() as f64;
    let mean_loss = loss_ratios.iter().sum::<f64>() / n;
    let mean_claim = avg_claims.iter().sum::<f64>() / n;

    let mut flagged = Vec::new();
    for point in &series.points {
        let mut issues = Vec::new();
        let kpis = &point.kpis;

        if kpis.loss_ratio > PROBLEM_LOSS_RATIO_DANGER {
            issues.push(format!("loss ratio in danger zone ({:.1}%)", kpis.loss_ratio));
        } else if mean_loss > 0.0 && kpis.loss_ratio > mean_loss * PROBLEM_LOSS_VS_MEAN {
            issues.push(format!(
                "loss ratio well above window mean ({:.1}% vs {:.1}%)",
                kpis.loss_ratio, mean_loss
            ));
        }
        if mean_claim > 0.0 && kpis.avg_claim > mean_claim * config.spike_multiplier {
            issues.push(format!(
                "average claim outsized ({:.0} vs window mean {:.0})",
                kpis.avg_claim, mean_claim
            ));
        }
        if kpis.claim_frequency > PROBLEM_CLAIM_FREQUENCY {
            issues.push(format!("claim frequency excessive ({:.1}%)", kpis.claim_frequency));
        }

        if !issues.is_empty() {
            flagged.push(ProblemWeek { week: point.week, issues });
        }
    }
    flagged
}
