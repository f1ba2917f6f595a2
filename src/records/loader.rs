//! CSV loading for weekly cost-detail extracts
//!
//! Data files are named `cost_detail_{year}_w{week}.csv`. Week and year come
//! from the file name and are stamped onto every record; head-office rows are
//! filtered out at load time.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::records::PolicyRecord;

/// Parse `cost_detail_{year}_w{week}.csv` into (year, week).
fn parse_file_name(path: &Path) -> Option<(u16, u32)> {
    let stem = path.file_stem()?.to_str()?;
    let rest = stem.strip_prefix("cost_detail_")?;
    let (year_part, week_part) = rest.split_once("_w")?;
    let year = year_part.parse().ok()?;
    let week = week_part.parse().ok()?;
    Some((year, week))
}

/// Scan a directory for the given policy year's weekly extracts.
///
/// Returns week -> path, ordered by week. Files that do not match the naming
/// scheme are ignored.
pub fn scan_available_weeks(dir: &Path, year: u16) -> Result<BTreeMap<u32, PathBuf>> {
    let mut weeks = BTreeMap::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        match parse_file_name(&path) {
            Some((file_year, week)) if file_year == year => {
                weeks.insert(week, path);
            }
            _ => debug!("skipping unrecognized file {}", path.display()),
        }
    }

    if weeks.is_empty() {
        return Err(AnalysisError::NoDataFiles { year, dir: dir.to_path_buf() });
    }
    Ok(weeks)
}

/// Load one weekly extract, stamping week/year and filtering head-office rows.
pub fn load_week_file(
    path: &Path,
    year: u16,
    week: u32,
    config: &AnalysisConfig,
) -> Result<Vec<PolicyRecord>> {
    let file = File::open(path)?;
    let records = load_records_from_reader(file, year, week, config)?;
    debug!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Load records from any reader. Rows that fail to deserialize are logged and
/// skipped rather than failing the whole extract.
pub fn load_records_from_reader<R: Read>(
    reader: R,
    year: u16,
    week: u32,
    config: &AnalysisConfig,
) -> Result<Vec<PolicyRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut records = Vec::new();
    for (row, result) in csv_reader.deserialize::<PolicyRecord>().enumerate() {
        match result {
            Ok(mut record) => {
                if record.organization == config.head_office_label {
                    continue;
                }
                record.week = week;
                record.policy_year = year;
                records.push(record);
            }
            Err(e) => warn!("week {week} row {}: skipping malformed row: {e}", row + 2),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
organization,business_category,coverage_type,renewal_status,new_energy,signed_premium,matured_premium,reported_claims,expense_amount,policy_count,claim_case_count
east_branch,truck_heavy,full_package,new,true,120000,80000,64000,15000,40,12
east_branch,private_car,compulsory_only,renewal,false,50000,45000,,6000,25,3
head_office,private_car,full_package,new,false,9999,9999,9999,9999,1,1
";

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse_file_name(Path::new("data/cost_detail_2025_w44.csv")),
            Some((2025, 44))
        );
        assert_eq!(parse_file_name(Path::new("cost_detail_2025.csv")), None);
        assert_eq!(parse_file_name(Path::new("notes.csv")), None);
    }

    #[test]
    fn test_load_from_reader_stamps_and_filters() {
        let config = AnalysisConfig::default();
        let records =
            load_records_from_reader(SAMPLE.as_bytes(), 2025, 44, &config).unwrap();

        // head_office row dropped
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.week == 44 && r.policy_year == 2025));
        // blank claims cell coerced to 0
        assert_eq!(records[1].reported_claims, 0.0);
        assert_eq!(records[0].policy_count, 40);
    }
}
