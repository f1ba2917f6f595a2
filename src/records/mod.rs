//! Policy cost-detail records and weekly snapshot loading

mod data;
pub mod loader;
pub mod period;
pub mod snapshot;

pub use data::{CoverageType, EnergySegment, PolicyRecord, RenewalStatus};
pub use loader::{load_records_from_reader, load_week_file, scan_available_weeks};
pub use period::{plan_period, PeriodPlan};
pub use snapshot::{PeriodSnapshot, Totals};
