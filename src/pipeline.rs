//! Enrichment pipeline orchestration.
//!
//! Load → temporal + distance enrichment run alongside the catalog build; the
//! two join before classification, and unmatched orders are filtered out.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::boundaries::BoundaryCatalog;
use crate::classifier::GeoClassifier;
use crate::config::PipelineConfig;
use crate::distance::DistanceFromCenter;
use crate::error::{PipelineError, Result, Stage};
use crate::loader;
use crate::models::{EnrichedOrder, Order};
use crate::source::SourceSnapshot;
use crate::temporal::TemporalEnricher;

/// Orders that all carry a district and an okrug.
///
/// Only constructible by filtering classified orders, so no row without a
/// district can get in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedDataset {
    rows: Vec<EnrichedOrder>,
}

impl EnrichedDataset {
    /// Keep classified orders; returns the dataset and how many were dropped.
    pub fn from_classified(orders: Vec<EnrichedOrder>) -> (Self, usize) {
        let before = orders.len();
        let rows: Vec<EnrichedOrder> = orders.into_iter().filter(EnrichedOrder::is_classified).collect();
        let dropped = before - rows.len();
        (Self { rows }, dropped)
    }

    pub fn rows(&self) -> &[EnrichedOrder] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnrichedOrder> {
        self.rows.iter()
    }
}

/// Row and catalog counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub loaded: usize,
    pub classified: usize,
    pub dropped_unmatched: usize,
    pub catalog_size: usize,
    pub districts_outside_city: usize,
    pub districts_without_okrug: usize,
}

impl EnrichmentReport {
    /// Share of loaded orders that fell outside every cataloged district
    pub fn unmatched_rate(&self) -> f64 {
        if self.loaded == 0 {
            0.0
        } else {
            self.dropped_unmatched as f64 / self.loaded as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub dataset: Arc<EnrichedDataset>,
    pub catalog: Arc<BoundaryCatalog>,
    pub report: EnrichmentReport,
}

/// Attach weekday, time-of-day bucket and distance to every order.
pub fn enrich_orders(
    orders: Vec<Order>,
    temporal: &TemporalEnricher,
    distance: &DistanceFromCenter,
) -> Vec<EnrichedOrder> {
    orders
        .into_par_iter()
        .map(|order| {
            let (day_of_week, time_of_day) = temporal.derive(&order.created_at);
            let distance_from_center_km = distance.km(order.location_latitude, order.location_longitude);
            EnrichedOrder {
                order,
                day_of_week,
                time_of_day,
                distance_from_center_km,
                district: None,
                okrug: None,
            }
        })
        .collect()
}

/// Classify every order in place; returns how many matched a district.
pub fn classify_orders(orders: &mut [EnrichedOrder], classifier: &GeoClassifier) -> usize {
    orders
        .par_iter_mut()
        .map(|order| usize::from(classifier.classify(order)))
        .sum()
}

/// Run classification and filtering over orders that are already enriched.
pub fn finish(mut orders: Vec<EnrichedOrder>, catalog: Arc<BoundaryCatalog>) -> EnrichmentOutcome {
    let start = Instant::now();
    let loaded = orders.len();
    let classifier = GeoClassifier::new(Arc::clone(&catalog));
    let classified = classify_orders(&mut orders, &classifier);
    let (dataset, dropped_unmatched) = EnrichedDataset::from_classified(orders);

    let stats = catalog.stats();
    let report = EnrichmentReport {
        loaded,
        classified,
        dropped_unmatched,
        catalog_size: catalog.len(),
        districts_outside_city: stats.outside_city,
        districts_without_okrug: stats.without_okrug,
    };

    info!(
        "Classified {}/{} orders in {:.1}ms, dropped {} outside the city ({:.1}%)",
        classified,
        loaded,
        start.elapsed().as_secs_f64() * 1000.0,
        dropped_unmatched,
        report.unmatched_rate() * 100.0
    );

    EnrichmentOutcome {
        dataset: Arc::new(dataset),
        catalog,
        report,
    }
}

/// Synchronous pipeline over in-memory orders and a prebuilt catalog
pub fn run_with(
    orders: Vec<Order>,
    catalog: Arc<BoundaryCatalog>,
    config: &PipelineConfig,
) -> Result<EnrichmentOutcome> {
    let temporal = TemporalEnricher::new(config.utc_offset_hours)?;
    let distance = DistanceFromCenter::new(config.reference_point);
    let enriched = enrich_orders(orders, &temporal, &distance);
    Ok(finish(enriched, catalog))
}

fn join_error(stage: Stage) -> impl Fn(tokio::task::JoinError) -> PipelineError {
    move |err| PipelineError::task(stage, err)
}

/// Full pipeline from the sources named in `config`.
pub async fn run(config: &PipelineConfig) -> Result<EnrichmentOutcome> {
    config.validate()?;
    let read_config = config.clone();
    let sources = tokio::task::spawn_blocking(move || SourceSnapshot::read(&read_config))
        .await
        .map_err(join_error(Stage::Load))??;
    run_snapshot(Arc::new(sources), config).await
}

/// Full pipeline over sources that were already read.
///
/// The catalog build and the order load/enrichment run as separate blocking
/// tasks; any failure aborts the run.
pub async fn run_snapshot(sources: Arc<SourceSnapshot>, config: &PipelineConfig) -> Result<EnrichmentOutcome> {
    config.validate()?;
    let start = Instant::now();

    let temporal = TemporalEnricher::new(config.utc_offset_hours)?;
    let distance = DistanceFromCenter::new(config.reference_point);

    let catalog_sources = Arc::clone(&sources);
    let name_property = config.name_property.clone();
    let catalog_task = tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let catalog = BoundaryCatalog::from_sources(&catalog_sources, &name_property)?;
        info!("Boundary catalog built in {:.1}ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok::<_, PipelineError>(catalog)
    });

    let row_cap = config.row_cap;
    let orders_task = tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let orders = loader::load_orders(&sources.orders, row_cap)?;
        let enriched = enrich_orders(orders, &temporal, &distance);
        info!(
            "Loaded and enriched {} orders in {:.1}ms",
            enriched.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok::<_, PipelineError>(enriched)
    });

    let (catalog, enriched) = tokio::try_join!(
        async { catalog_task.await.map_err(join_error(Stage::Catalog))? },
        async { orders_task.await.map_err(join_error(Stage::Load))? },
    )?;

    let catalog = Arc::new(catalog);
    let outcome = tokio::task::spawn_blocking(move || finish(enriched, catalog))
        .await
        .map_err(join_error(Stage::Classify))?;

    info!(
        "Pipeline finished in {:.1}ms: {} orders in the enriched dataset",
        start.elapsed().as_secs_f64() * 1000.0,
        outcome.dataset.len()
    );
    Ok(outcome)
}
