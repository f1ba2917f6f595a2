//! Error types for the analysis pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by loading, period planning and report generation.
///
/// Zero-denominator metrics and empty partitions are never errors — they are
/// resolved numerically (ratio defaults to 0) or skipped during drill-down.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("unrecognized data file name: {0}")]
    BadFileName(PathBuf),

    #[error("no weekly data files found for policy year {year} in {dir}")]
    NoDataFiles { year: u16, dir: PathBuf },

    #[error(
        "missing {missing} of {requested} requested weeks ({ratio:.1}% > tolerance {tolerance:.1}%)"
    )]
    TooManyMissingWeeks {
        missing: usize,
        requested: usize,
        ratio: f64,
        tolerance: f64,
    },

    #[error("no usable periods for policy year {year}: {reason}")]
    NoUsablePeriods { year: u16, reason: String },

    #[error("no available weeks to plan an analysis window from")]
    NoAvailableWeeks,

    #[error("week range is empty: start {start} > end {end}")]
    EmptyWeekRange { start: u32, end: u32 },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
