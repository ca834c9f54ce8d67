//! Geo-enrichment for food-delivery order batches.
//!
//! Orders get a weekday, a time-of-day bucket, a geodesic distance to the
//! city center, and the Moscow district/okrug their coordinate falls in.
//! Orders outside every district are dropped from the resulting dataset.

pub mod boundaries;
pub mod cache;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod distance;
pub mod error;
pub mod loader;
pub mod models;
pub mod okrug_names;
pub mod order_hotspots;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod summary;
pub mod temporal;

pub use boundaries::{BoundaryCatalog, BoundaryRecord};
pub use cache::EnrichmentService;
pub use classifier::GeoClassifier;
pub use config::{GeoCoordinate, PipelineConfig};
pub use error::{PipelineError, Stage};
pub use models::{EnrichedOrder, Order, TimeOfDay};
pub use pipeline::{EnrichedDataset, EnrichmentOutcome, EnrichmentReport};
