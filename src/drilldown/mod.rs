//! Ranked diagnostic drill-down per organization

mod engine;
mod node;

pub use engine::{diagnose_book, diagnose_organization, severity_score};
pub use node::{BusinessProblem, EnergyNode, OrgDiagnosis, SegmentOutcome, SliceKpi};
