//! Generate the weekly portfolio report for each requested policy year
//!
//! Reads `cost_detail_{year}_w{week}.csv` extracts from the data directory,
//! runs the full diagnostic pipeline, and writes Markdown (and optionally
//! JSON) per year. A year that cannot be analyzed is logged and skipped; the
//! run only fails when every year fails.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;
use log::{error, info};

use portfolio_analytics::config::AnalysisConfig;
use portfolio_analytics::drilldown::diagnose_book;
use portfolio_analytics::kpi::KpiResult;
use portfolio_analytics::records::{load_week_file, plan_period, scan_available_weeks,
                                   PeriodSnapshot, Totals};
use portfolio_analytics::report::{executive_summary, render_weekly_report, DiagnosticReport};
use portfolio_analytics::trend::{build_weekly_series, detect_anomalies, detect_problem_weeks,
                                 trend_of, volatility_of};

#[derive(Parser, Debug)]
#[command(name = "portfolio_analytics", about = "Weekly motor portfolio KPI report generator")]
struct Args {
    /// Directory holding the weekly cost-detail extracts
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Policy years to report on
    #[arg(long, value_delimiter = ',', default_values_t = vec![2024u16, 2025])]
    years: Vec<u16>,

    /// First analysis week (inferred from the data when omitted)
    #[arg(long)]
    start_week: Option<u32>,

    /// Last analysis week (inferred from the data when omitted)
    #[arg(long)]
    end_week: Option<u32>,

    /// Directory for rendered reports
    #[arg(long, default_value = "reports")]
    output_dir: PathBuf,

    /// Optional JSON config overriding default thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the diagnostic result as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let mut generated = 0usize;
    for &year in &args.years {
        println!("Processing policy year {year}...");
        match run_year(year, &args, &config) {
            Ok(paths) => {
                generated += 1;
                for path in paths {
                    println!("  report written to {}", path.display());
                }
            }
            Err(e) => error!("policy year {year} skipped: {e:#}"),
        }
    }

    if generated == 0 {
        bail!("no reports generated for any requested year");
    }
    println!("Done in {:?}", start.elapsed());
    Ok(())
}

fn run_year(year: u16, args: &Args, config: &AnalysisConfig) -> anyhow::Result<Vec<PathBuf>> {
    let available = scan_available_weeks(&args.data_dir, year)?;
    let weeks: Vec<u32> = available.keys().copied().collect();
    info!("year {year}: weeks available {weeks:?}");

    let plan = plan_period(&weeks, args.start_week, args.end_week, config)?;
    info!(
        "year {year}: analyzing weeks {}-{} (loading {:?})",
        plan.start_week, plan.end_week, plan.weeks_to_load
    );

    let mut snapshots = Vec::new();
    for &week in &plan.weeks_to_load {
        let path = &available[&week];
        let records = load_week_file(path, year, week, config)?;
        snapshots.push(PeriodSnapshot::new(year, week, records));
    }

    let latest = snapshots
        .iter()
        .filter(|s| s.week >= plan.start_week)
        .max_by_key(|s| s.week)
        .filter(|s| !s.is_empty())
        .ok_or(portfolio_analytics::AnalysisError::NoUsablePeriods {
            year,
            reason: "every loaded snapshot in the window is empty".to_string(),
        })?;

    let global = KpiResult::from_totals(&Totals::aggregate(&latest.records));
    println!(
        "  week {}: {} records, matured premium {:.2} (10k), loss ratio {:.2}%",
        latest.week,
        latest.records.len(),
        global.matured_premium / 10_000.0,
        global.loss_ratio
    );

    let organizations = diagnose_book(&latest.records, config);
    let weekly = build_weekly_series(&snapshots, &plan.analysis_weeks, |_| true);
    let loss_ratios = weekly.metric(|k| k.loss_ratio);
    let trend = trend_of(&loss_ratios, &config.trend);
    let latest_weekly = weekly.latest().map(|p| p.kpis).unwrap_or(global);

    let report = DiagnosticReport {
        year,
        end_week: plan.end_week,
        start_week: plan.start_week,
        missing_weeks: plan.missing_weeks.clone(),
        generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        global,
        organizations,
        loss_ratio_volatility: volatility_of(&loss_ratios, &config.trend),
        anomalies: detect_anomalies(&weekly, &config.trend),
        problem_weeks: detect_problem_weeks(&weekly, &config.trend),
        summary: executive_summary(&latest_weekly, &trend, config),
        loss_ratio_trend: trend,
        weekly,
    };

    let mut written = Vec::new();

    let markdown = render_weekly_report(&report, config);
    let md_path = args.output_dir.join(format!("{year}_week{}_report.md", plan.end_week));
    std::fs::write(&md_path, markdown).with_context(|| format!("writing {}", md_path.display()))?;
    written.push(md_path);

    if args.json {
        let json_path = args.output_dir.join(format!("{year}_week{}_report.json", plan.end_week));
        let file = std::fs::File::create(&json_path)
            .with_context(|| format!("creating {}", json_path.display()))?;
        serde_json::to_writer_pretty(file, &report)?;
        written.push(json_path);
    }

    Ok(written)
}
