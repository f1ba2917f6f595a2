//! Weekly KPI and diagnostic reporting for motor insurance portfolios
//!
//! The pipeline is batch-oriented and deterministic: weekly cost-detail
//! extracts are loaded into period snapshots, reduced to KPI aggregates,
//! drilled down per organization to rank problem segments, scanned for
//! week-over-week anomalies, and assembled into Markdown/JSON reports.

pub mod config;
pub mod drilldown;
pub mod error;
pub mod kpi;
pub mod records;
pub mod report;
pub mod spotlight;
pub mod trend;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
