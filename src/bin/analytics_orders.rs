//! Order Analytics - where and when do people order?
//! District, okrug and weekday/time-of-day breakdowns of the enriched dataset
//!
//! Run: ./target/release/analytics_orders [section] [--orders ...]
//! Sections: all, districts, okruga, weekday

use anyhow::{bail, Result};
use chrono::Weekday;
use clap::Parser;
use moscow_delivery::cli::{init_tracing, SourceArgs};
use moscow_delivery::models::weekday_name;
use moscow_delivery::okrug_names::{okrug_abbreviation, truncate_name};
use moscow_delivery::summary::{by_district, by_okrug, by_weekday_time, quantile_breaks, GroupStats};
use moscow_delivery::{EnrichmentService, PipelineConfig, TimeOfDay};

const DISTRICT_BREAKS: &[f64] = &[0.5, 0.6, 0.7, 0.8];
const OKRUG_BREAKS: &[f64] = &[0.3, 0.5, 0.6, 0.7, 0.8];

#[derive(Parser, Debug)]
#[command(name = "analytics_orders")]
#[command(about = "Print order breakdowns by district, okrug and time")]
struct Args {
    /// all, districts, okruga, weekday
    #[arg(default_value = "all")]
    section: String,

    /// Rows shown in the district table
    #[arg(long, default_value = "20")]
    top: usize,

    #[command(flatten)]
    sources: SourceArgs,
}

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(80));
    println!("  {}", title);
    println!("{}\n", "═".repeat(80));
}

fn print_subsection(title: &str) {
    println!("\n{}", title);
    println!("{}", "─".repeat(70));
}

fn print_breaks(label: &str, stats: &[GroupStats], quantiles: &[f64]) {
    let counts: Vec<f64> = stats.iter().map(|s| s.orders as f64).collect();
    let means: Vec<f64> = stats.iter().map(|s| s.mean_amount).collect();
    let fmt = |values: Vec<f64>| {
        values
            .iter()
            .map(|v| format!("{:.1}", v))
            .collect::<Vec<_>>()
            .join(" / ")
    };
    println!("  {} breaks, order count: {}", label, fmt(quantile_breaks(&counts, quantiles)));
    println!("  {} breaks, mean check:  {}", label, fmt(quantile_breaks(&means, quantiles)));
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = args.sources.to_config()?;
    let service = EnrichmentService::new();

    println!("\n{}", "█".repeat(80));
    println!("{}  ORDER ANALYTICS - Where and When?  {}", "█".repeat(21), "█".repeat(22));
    println!("{}\n", "█".repeat(80));

    match args.section.as_str() {
        "all" => {
            run_overview(&service, &config).await?;
            run_district_section(&service, &config, args.top).await?;
            run_okrug_section(&service, &config).await?;
            run_weekday_section(&service, &config).await?;
        }
        "districts" => run_district_section(&service, &config, args.top).await?,
        "okruga" => run_okrug_section(&service, &config).await?,
        "weekday" => run_weekday_section(&service, &config).await?,
        other => bail!("Unknown section: {} (available: all, districts, okruga, weekday)", other),
    }

    println!("\n{}", "█".repeat(80));
    Ok(())
}

async fn run_overview(service: &EnrichmentService, config: &PipelineConfig) -> Result<()> {
    print_section_header("1. DATASET OVERVIEW");
    let outcome = service.get(config).await?;
    let report = outcome.report;

    let amounts: Vec<f64> = outcome.dataset.iter().map(|r| r.order.amount_charged).collect();
    let distances: Vec<f64> = outcome.dataset.iter().map(|r| r.distance_from_center_km).collect();
    let median = |values: &[f64]| quantile_breaks(values, &[0.5]).first().copied().unwrap_or(0.0);

    println!("  Orders loaded:         {:>12}", report.loaded);
    println!("  Orders in Moscow:      {:>12}", outcome.dataset.len());
    println!("  Dropped (outside):     {:>11.1}%", report.unmatched_rate() * 100.0);
    println!("  Districts cataloged:   {:>12}", report.catalog_size);
    println!("  Median check:          {:>12.1}", median(&amounts));
    println!("  Median distance (km):  {:>12.2}", median(&distances));
    Ok(())
}

async fn run_district_section(service: &EnrichmentService, config: &PipelineConfig, top: usize) -> Result<()> {
    print_section_header("2. ORDERS BY DISTRICT");
    let outcome = service.get(config).await?;
    let mut stats = by_district(&outcome.dataset);

    print_subsection(&format!("Top {} Districts by Volume", top));
    stats.sort_by(|a, b| b.orders.cmp(&a.orders).then_with(|| a.key.cmp(&b.key)));

    println!("  {:28} {:>8} {:>12} {:>8}", "District", "Orders", "Mean check", "Okrug");
    println!("  {}", "─".repeat(60));
    for row in stats.iter().take(top) {
        let okrug = outcome
            .catalog
            .district(&row.key)
            .map(|record| okrug_abbreviation(&record.okrug))
            .unwrap_or_default();
        println!(
            "  {:28} {:>8} {:>12.1} {:>8}",
            truncate_name(&row.key, 28),
            row.orders,
            row.mean_amount,
            okrug
        );
    }

    print_subsection("Choropleth Breaks");
    print_breaks("District", &stats, DISTRICT_BREAKS);
    Ok(())
}

async fn run_okrug_section(service: &EnrichmentService, config: &PipelineConfig) -> Result<()> {
    print_section_header("3. ORDERS BY OKRUG");
    let outcome = service.get(config).await?;
    let stats = by_okrug(&outcome.dataset);
    let total = outcome.dataset.len().max(1) as f64;

    println!("  {:8} {:>8} {:>10} {:>12}", "Okrug", "Orders", "Share", "Mean check");
    println!("  {}", "─".repeat(42));
    for row in &stats {
        println!(
            "  {:8} {:>8} {:>9.1}% {:>12.1}",
            okrug_abbreviation(&row.key),
            row.orders,
            row.orders as f64 / total * 100.0,
            row.mean_amount
        );
    }

    print_subsection("Choropleth Breaks");
    print_breaks("Okrug", &stats, OKRUG_BREAKS);
    Ok(())
}

async fn run_weekday_section(service: &EnrichmentService, config: &PipelineConfig) -> Result<()> {
    print_section_header("4. ORDERS BY WEEKDAY AND TIME OF DAY");
    let outcome = service.get(config).await?;
    let stats = by_weekday_time(&outcome.dataset);

    print!("  {:10}", "Day");
    for bucket in TimeOfDay::ALL {
        print!(" {:>18}", bucket.as_str());
    }
    println!();
    println!("  {}", "─".repeat(86));

    let mut days: Vec<Weekday> = stats.iter().map(|s| s.day_of_week).collect();
    days.dedup();

    for day in days {
        print!("  {:10}", weekday_name(day));
        for bucket in TimeOfDay::ALL {
            let cell = stats
                .iter()
                .find(|s| s.day_of_week == day && s.time_of_day == bucket)
                .map(|s| format!("{} / {:.0}", s.orders, s.mean_amount))
                .unwrap_or_else(|| "-".to_string());
            print!(" {:>18}", cell);
        }
        println!();
    }
    println!("\n  Cells: order count / mean check");
    Ok(())
}
