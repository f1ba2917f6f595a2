//! Week-over-week trend tracking and anomaly detection

mod detector;
mod series;

pub use detector::{detect_anomalies, detect_problem_weeks, fit_slope, trend_of, volatility_of,
                   Anomaly, ProblemWeek, SpikeSeverity, TrendDirection, TrendSummary, Volatility,
                   VolatilityLevel};
pub use series::{build_weekly_series, WeeklyPoint, WeeklySeries};
