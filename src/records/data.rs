//! Core record types for weekly cost-detail extracts

use serde::{Deserialize, Serialize};

/// Coverage composition written on the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageType {
    /// Compulsory plus the full commercial package
    #[serde(rename = "full_package")]
    FullPackage,
    /// Compulsory plus third-party liability only
    #[serde(rename = "compulsory_liability")]
    CompulsoryPlusLiability,
    /// Compulsory cover alone
    #[serde(rename = "compulsory_only")]
    CompulsoryOnly,
}

impl CoverageType {
    /// All coverage types, in reporting order.
    pub const ALL: [CoverageType; 3] = [
        CoverageType::FullPackage,
        CoverageType::CompulsoryPlusLiability,
        CoverageType::CompulsoryOnly,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CoverageType::FullPackage => "full package",
            CoverageType::CompulsoryPlusLiability => "compulsory + liability",
            CoverageType::CompulsoryOnly => "compulsory only",
        }
    }
}

/// New / renewal / transferred-in business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenewalStatus {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "renewal")]
    Renewal,
    #[serde(rename = "transfer")]
    Transfer,
}

impl RenewalStatus {
    /// All renewal states, in reporting order.
    pub const ALL: [RenewalStatus; 3] =
        [RenewalStatus::New, RenewalStatus::Renewal, RenewalStatus::Transfer];

    pub fn label(&self) -> &'static str {
        match self {
            RenewalStatus::New => "new business",
            RenewalStatus::Renewal => "renewal",
            RenewalStatus::Transfer => "transfer-in",
        }
    }
}

/// Energy-type partition used by the first drill-down layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnergySegment {
    NewEnergy,
    Conventional,
}

impl EnergySegment {
    pub const ALL: [EnergySegment; 2] = [EnergySegment::NewEnergy, EnergySegment::Conventional];

    pub fn matches(&self, new_energy: bool) -> bool {
        match self {
            EnergySegment::NewEnergy => new_energy,
            EnergySegment::Conventional => !new_energy,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EnergySegment::NewEnergy => "new-energy vehicles",
            EnergySegment::Conventional => "conventional vehicles",
        }
    }
}

/// One row of a weekly cost-detail extract.
///
/// Amounts are cumulative since policy-year start, in yuan. `week` and
/// `policy_year` are stamped by the loader from the file name rather than
/// trusted from the file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRecord {
    /// Third-level organization identifier
    pub organization: String,

    /// Business-type category, e.g. "truck_heavy" or "private_car"
    pub business_category: String,

    pub coverage_type: CoverageType,

    pub renewal_status: RenewalStatus,

    /// New-energy vehicle flag
    pub new_energy: bool,

    /// Signed premium, yuan
    #[serde(deserialize_with = "de_f64_or_zero")]
    pub signed_premium: f64,

    /// Matured (earned) premium, yuan
    #[serde(deserialize_with = "de_f64_or_zero")]
    pub matured_premium: f64,

    /// Reported claim payments, yuan
    #[serde(deserialize_with = "de_f64_or_zero")]
    pub reported_claims: f64,

    /// Acquisition and handling expenses, yuan
    #[serde(deserialize_with = "de_f64_or_zero")]
    pub expense_amount: f64,

    #[serde(deserialize_with = "de_i64_or_zero")]
    pub policy_count: i64,

    #[serde(deserialize_with = "de_i64_or_zero")]
    pub claim_case_count: i64,

    /// Reporting week, stamped by the loader
    #[serde(default)]
    pub week: u32,

    /// Policy year, stamped by the loader
    #[serde(default)]
    pub policy_year: u16,
}

/// Blank or unparseable numeric cells coerce to 0 rather than failing the row.
fn de_f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0.0))
}

fn de_i64_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_segment_matches() {
        assert!(EnergySegment::NewEnergy.matches(true));
        assert!(!EnergySegment::NewEnergy.matches(false));
        assert!(EnergySegment::Conventional.matches(false));
    }

    #[test]
    fn test_coverage_reporting_order() {
        assert_eq!(CoverageType::ALL[0], CoverageType::FullPackage);
        assert_eq!(CoverageType::ALL.len(), 3);
    }
}
