//! Analysis-window planning
//!
//! Decides which weeks to analyze and which to load, given the weeks that are
//! actually present on disk. Missing weeks inside the window are tolerated as
//! gaps up to a configurable ratio; beyond that the year is aborted rather
//! than producing a misleading partial report.

use log::warn;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};

/// Resolved analysis window for one policy year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodPlan {
    pub start_week: u32,
    pub end_week: u32,
    /// Weeks the report covers, start..=end
    pub analysis_weeks: Vec<u32>,
    /// Weeks to actually load: available weeks in the window, plus the week
    /// before the window when present (needed for the first weekly diff)
    pub weeks_to_load: Vec<u32>,
    /// Requested weeks with no data file
    pub missing_weeks: Vec<u32>,
}

impl PeriodPlan {
    /// Fraction of requested weeks that are missing.
    pub fn missing_ratio(&self) -> f64 {
        if self.analysis_weeks.is_empty() {
            return 0.0;
        }
        self.missing_weeks.len() as f64 / self.analysis_weeks.len() as f64
    }
}

/// Determine the analysis window.
///
/// With neither bound given, the window is the trailing `lookback_weeks`
/// ending at the latest available week. A single bound extends by the
/// lookback in the other direction.
pub fn plan_period(
    available: &[u32],
    start_week: Option<u32>,
    end_week: Option<u32>,
    config: &AnalysisConfig,
) -> Result<PeriodPlan> {
    let latest = available.iter().copied().max().ok_or(AnalysisError::NoAvailableWeeks)?;
    let lookback = config.lookback_weeks.max(1);

    let (start, end) = match (start_week, end_week) {
        (Some(s), Some(e)) => (s, e),
        (Some(s), None) => (s, s + lookback - 1),
        (None, Some(e)) => (e.saturating_sub(lookback - 1).max(1), e),
        (None, None) => (latest.saturating_sub(lookback - 1).max(1), latest),
    };

    if start > end {
        return Err(AnalysisError::EmptyWeekRange { start, end });
    }

    let analysis_weeks: Vec<u32> = (start..=end).collect();
    let missing_weeks: Vec<u32> = analysis_weeks
        .iter()
        .copied()
        .filter(|w| !available.contains(w))
        .collect();

    let ratio = missing_weeks.len() as f64 / analysis_weeks.len() as f64;
    if ratio > config.missing_tolerance {
        return Err(AnalysisError::TooManyMissingWeeks {
            missing: missing_weeks.len(),
            requested: analysis_weeks.len(),
            ratio: ratio * 100.0,
            tolerance: config.missing_tolerance * 100.0,
        });
    }
    if !missing_weeks.is_empty() {
        warn!("weeks {missing_weeks:?} have no data file; treated as gaps");
    }

    // Include the pre-window week when available so the first analysis week
    // still gets an incremental value.
    let mut weeks_to_load: Vec<u32> = Vec::new();
    if start > 1 && available.contains(&(start - 1)) {
        weeks_to_load.push(start - 1);
    }
    weeks_to_load.extend(analysis_weeks.iter().copied().filter(|w| available.contains(w)));

    Ok(PeriodPlan { start_week: start, end_week: end, analysis_weeks, weeks_to_load, missing_weeks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_inference_trailing_window() {
        let config = AnalysisConfig::default();
        let plan = plan_period(&[39, 40, 41, 42, 43, 44], None, None, &config).unwrap();

        assert_eq!(plan.start_week, 40);
        assert_eq!(plan.end_week, 44);
        assert_eq!(plan.analysis_weeks, vec![40, 41, 42, 43, 44]);
        // Week 39 loaded for the first diff
        assert_eq!(plan.weeks_to_load, vec![39, 40, 41, 42, 43, 44]);
        assert!(plan.missing_weeks.is_empty());
    }

    #[test]
    fn test_gap_within_tolerance() {
        let config = AnalysisConfig::default();
        let plan = plan_period(&[40, 41, 43, 44], Some(40), Some(44), &config).unwrap();

        assert_eq!(plan.missing_weeks, vec![42]);
        assert!(plan.missing_ratio() <= config.missing_tolerance);
        assert_eq!(plan.weeks_to_load, vec![40, 41, 43, 44]);
    }

    #[test]
    fn test_too_many_missing_weeks_is_fatal() {
        let config = AnalysisConfig::default();
        let err = plan_period(&[40, 44], Some(40), Some(44), &config).unwrap_err();
        assert!(matches!(err, AnalysisError::TooManyMissingWeeks { missing: 3, .. }));
    }

    #[test]
    fn test_end_only_extends_backwards() {
        let config = AnalysisConfig::default();
        let plan = plan_period(&[1, 2, 3, 4, 5, 6], None, Some(5), &config).unwrap();
        assert_eq!(plan.start_week, 1);
        assert_eq!(plan.end_week, 5);
        // start == 1 has no pre-window week
        assert_eq!(plan.weeks_to_load, vec![1, 2, 3, 4, 5]);
    }
}
