//! KPI calculation and status classification

mod calculator;
mod status;

pub use calculator::KpiResult;
pub use status::{classify_contribution_margin, classify_expense_ratio, classify_loss_ratio,
                 is_healthy, StatusBand};
