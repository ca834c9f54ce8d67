//! Synthetic order batch generator
//!
//! Writes a CSV shaped like the leaked order dump: the six pipeline columns
//! plus the personal columns the loader is expected to ignore. Points are
//! drawn around weighted demand hotspots, some of them outside the city.
//!
//! Usage:
//!   cargo run --release --bin generate_synthetic -- [OPTIONS]
//!
//! Options:
//!   --orders <N>      Number of orders (default: 30000)
//!   --start <DATE>    First order day, YYYY-MM-DD (default: 2021-12-01)
//!   --days <N>        Span of order days (default: 28)
//!   --seed <N>        Random seed for reproducibility (optional)
//!   --output <PATH>   Output CSV path (default: data/synthetic_orders.csv)

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use clap::Parser;
use csv::WriterBuilder;
use moscow_delivery::order_hotspots::HotspotSampler;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Synthetic data generator for delivery orders
#[derive(Parser, Debug)]
#[command(name = "generate_synthetic")]
#[command(about = "Generate a synthetic food-delivery order batch")]
struct Args {
    /// Number of orders to generate
    #[arg(long, default_value = "30000")]
    orders: usize,

    /// First day of the order window
    #[arg(long, default_value = "2021-12-01")]
    start: NaiveDate,

    /// Number of days the orders are spread over
    #[arg(long, default_value = "28")]
    days: i64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV path
    #[arg(long, default_value = "data/synthetic_orders.csv")]
    output: PathBuf,
}

#[derive(Debug, Serialize)]
struct OutputRecord {
    id: u64,
    created_at: String,
    address_full: String,
    location_latitude: f64,
    location_longitude: f64,
    amount_charged: f64,
    user_agent: &'static str,
    name: String,
    phone_number: String,
}

/// Relative order volume per UTC hour: lunch and dinner peaks
const HOURLY_WEIGHTS: [u32; 24] = [
    3, 2, 1, 1, 1, 1, 2, 4, 6, 8, 12, 18, 22, 18, 14, 12, 16, 24, 28, 22, 14, 8, 6, 4,
];

const USER_AGENTS: &[(&str, u32)] = &[
    ("Mozilla/5.0 (iPhone; CPU iPhone OS 15_1 like Mac OS X) AppleWebKit/605.1.15", 38),
    ("Mozilla/5.0 (Linux; Android 11; SM-A515F) AppleWebKit/537.36 Chrome/96.0", 34),
    ("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/96.0", 16),
    ("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Safari/605.1.15", 8),
    ("", 4),
];

const STREETS: &[&str] = &[
    "ул. Тверская",
    "ул. Арбат",
    "Ленинский пр-т",
    "ул. Профсоюзная",
    "Кутузовский пр-т",
    "ул. Маросейка",
];

/// Check amount: lognormal-ish around ~900 with a long tail
fn sample_amount(rng: &mut impl Rng) -> f64 {
    let base: f64 = rng.gen_range(250.0..1400.0);
    let tail = if rng.gen_bool(0.1) { rng.gen_range(1.0..4.0) } else { 1.0 };
    (base * tail).round()
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Synthetic Order Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Orders:     {}", args.orders);
    println!("Window:     {} + {} days", args.start, args.days);
    println!("Output:     {}", args.output.display());
    if let Some(seed) = args.seed {
        println!("Seed:       {}", seed);
    }
    println!();

    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let sampler = HotspotSampler::new().context("hotspot weights")?;
    let hours = WeightedIndex::new(HOURLY_WEIGHTS).context("hourly weights")?;
    let agents = WeightedIndex::new(USER_AGENTS.iter().map(|(_, w)| *w)).context("user agent weights")?;

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = WriterBuilder::new().has_headers(true).from_path(&args.output)?;

    let window_start = Utc.from_utc_datetime(&args.start.and_hms_opt(0, 0, 0).context("start of day")?);
    let mut per_hotspot: HashMap<&str, usize> = HashMap::new();

    for i in 0..args.orders {
        let (hotspot, latitude, longitude) = sampler.sample(&mut rng);
        *per_hotspot.entry(hotspot.name).or_insert(0) += 1;

        let created_at = window_start
            + Duration::days(rng.gen_range(0..args.days.max(1)))
            + Duration::hours(hours.sample(&mut rng) as i64)
            + Duration::seconds(rng.gen_range(0..3600));

        let record = OutputRecord {
            id: 1_000_000 + i as u64,
            created_at: created_at.format("%Y-%m-%d %H:%M:%S%.3f%:z").to_string(),
            address_full: format!(
                "г. Москва, {}, д. {}",
                STREETS[rng.gen_range(0..STREETS.len())],
                rng.gen_range(1..120)
            ),
            location_latitude: (latitude * 1e6).round() / 1e6,
            location_longitude: (longitude * 1e6).round() / 1e6,
            amount_charged: sample_amount(&mut rng),
            user_agent: USER_AGENTS[agents.sample(&mut rng)].0,
            name: format!("Customer {}", rng.gen_range(1000..9999)),
            phone_number: format!("+7916{:07}", rng.gen_range(0..10_000_000)),
        };
        writer.serialize(&record)?;

        if (i + 1) % 10000 == 0 {
            println!("   Generated {}/{} orders...", i + 1, args.orders);
        }
    }
    writer.flush()?;

    println!("\nGeneration complete!");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let mut counts: Vec<(&str, usize)> = per_hotspot.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, count) in counts {
        println!("   {:24} {:>8}", name, count);
    }
    println!("Output file:       {}", args.output.display());

    Ok(())
}
