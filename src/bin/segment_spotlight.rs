//! Focused spotlight report for one business segment
//!
//! Runs the spotlight analysis (default: new-energy trucks) over the same
//! weekly extracts as the main report and writes a standalone Markdown file
//! per policy year.

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;
use log::error;

use portfolio_analytics::config::AnalysisConfig;
use portfolio_analytics::records::{load_week_file, plan_period, scan_available_weeks,
                                   PeriodSnapshot};
use portfolio_analytics::report::render_spotlight_report;
use portfolio_analytics::spotlight::{analyze_segment, SegmentFilter};

#[derive(Parser, Debug)]
#[command(name = "segment_spotlight", about = "Spotlight report for one portfolio segment")]
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

    /// Business-category keyword the segment must contain
    #[arg(long, default_value = "truck")]
    keyword: String,

    /// Include conventional vehicles as well as new-energy
    #[arg(long)]
    all_energy: bool,

    /// Directory for rendered reports
    #[arg(long, default_value = "reports")]
    output_dir: PathBuf,

    /// Optional JSON config overriding default thresholds
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    let filter = SegmentFilter {
        new_energy_only: !args.all_energy,
        business_keyword: Some(args.keyword.clone()),
    };

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let mut generated = 0usize;
    for &year in &args.years {
        println!("Spotlight for policy year {year} ({})...", filter.describe());
        match run_year(year, &args, &filter, &config) {
            Ok(path) => {
                generated += 1;
                println!("  report written to {}", path.display());
            }
            Err(e) => error!("policy year {year} skipped: {e:#}"),
        }
    }

    if generated == 0 {
        bail!("no spotlight reports generated for any requested year");
    }
    Ok(())
}

fn run_year(
    year: u16,
    args: &Args,
    filter: &SegmentFilter,
    config: &AnalysisConfig,
) -> anyhow::Result<PathBuf> {
    let available = scan_available_weeks(&args.data_dir, year)?;
    let weeks: Vec<u32> = available.keys().copied().collect();
    let plan = plan_period(&weeks, args.start_week, args.end_week, config)?;

    let mut snapshots = Vec::new();
    for &week in &plan.weeks_to_load {
        if week < plan.start_week {
            // The spotlight tracks cumulative positions; the pre-window week
            // is only needed for incremental series elsewhere.
            continue;
        }
        let records = load_week_file(&available[&week], year, week, config)?;
        snapshots.push(PeriodSnapshot::new(year, week, records));
    }

    let analysis = analyze_segment(&snapshots, filter, config)
        .ok_or_else(|| anyhow::anyhow!("segment has no records in the latest week"))?;

    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let markdown = render_spotlight_report(year, &analysis, &generated_at);
    let path = args
        .output_dir
        .join(format!("{year}_week{}_spotlight.md", plan.end_week));
    std::fs::write(&path, markdown).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
