//! Run the enrichment pipeline and write its outputs.
//!
//! Usage:
//!   cargo run --release -- [--config pipeline.json] [--orders orders.csv.zip] ...

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use moscow_delivery::cli::{init_tracing, SourceArgs};
use moscow_delivery::{output, pipeline};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "moscow_delivery")]
#[command(about = "Tag delivery orders with Moscow district, okrug, time of day and distance to center")]
struct Args {
    #[command(flatten)]
    sources: SourceArgs,

    /// Enriched dataset CSV
    #[arg(long, default_value = "data/enriched_orders.csv")]
    output: PathBuf,

    /// District/okrug catalog GeoJSON for map layers
    #[arg(long, default_value = "data/moscow_geometry.geojson")]
    catalog_output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = args.sources.to_config().context("invalid pipeline configuration")?;
    info!("Orders:       {:?} (row cap {})", config.orders_path, config.row_cap);
    info!("Districts:    {:?}", config.districts_path);
    info!("City outline: {:?}", config.city_outline_path);
    info!("Okruga:       {:?}", config.okruga_path);

    let outcome = pipeline::run(&config)
        .await
        .context("enrichment pipeline failed")?;

    let report = outcome.report;
    if report.catalog_size == 0 {
        warn!("Boundary catalog is empty; every order was dropped");
    }

    output::write_enriched_csv(&args.output, &outcome.dataset)
        .with_context(|| format!("writing {:?}", args.output))?;
    outcome
        .catalog
        .write_geojson(&args.catalog_output)
        .with_context(|| format!("writing {:?}", args.catalog_output))?;

    info!("Enrichment complete:");
    info!("  Orders loaded:       {:>8}", report.loaded);
    info!("  Orders kept:         {:>8}", outcome.dataset.len());
    info!(
        "  Outside districts:   {:>8} ({:.1}%)",
        report.dropped_unmatched,
        report.unmatched_rate() * 100.0
    );
    info!("  Catalog districts:   {:>8}", report.catalog_size);
    info!("  Outside city limits: {:>8}", report.districts_outside_city);
    info!("  Without okrug:       {:>8}", report.districts_without_okrug);

    Ok(())
}
