//! Session cache for the enrichment outcome.
//!
//! A dashboard re-renders many times against the same inputs. The outcome is
//! kept behind a lock and keyed by a fingerprint of the source bytes plus the
//! settings that change the output; any difference triggers a full rerun.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result, Stage};
use crate::pipeline::{self, EnrichmentOutcome};
use crate::source::SourceSnapshot;

/// SHA-256 over every input the pipeline reads
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFingerprint(String);

impl SourceFingerprint {
    /// Read the sources named in `config` and fingerprint them.
    pub fn compute(config: &PipelineConfig) -> Result<Self> {
        Ok(Self::of(&SourceSnapshot::read(config)?, config))
    }

    /// Fingerprint bytes that were already read, together with `config`.
    pub fn of(sources: &SourceSnapshot, config: &PipelineConfig) -> Self {
        let mut hasher = Sha256::new();
        for source in sources.sources() {
            hasher.update((source.bytes.len() as u64).to_le_bytes());
            hasher.update(&source.bytes);
        }
        hasher.update((config.row_cap as u64).to_le_bytes());
        hasher.update(config.reference_point.latitude.to_le_bytes());
        hasher.update(config.reference_point.longitude.to_le_bytes());
        hasher.update(config.utc_offset_hours.to_le_bytes());
        hasher.update(config.name_property.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
struct CachedOutcome {
    fingerprint: SourceFingerprint,
    outcome: EnrichmentOutcome,
}

/// Runs the pipeline on demand and reuses the last outcome for identical inputs
#[derive(Debug, Clone, Default)]
pub struct EnrichmentService {
    cached: Arc<RwLock<Option<CachedOutcome>>>,
}

impl EnrichmentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outcome for `config`. The sources are read once; the fingerprint
    /// and a recompute both use those same bytes.
    pub async fn get(&self, config: &PipelineConfig) -> Result<EnrichmentOutcome> {
        config.validate()?;
        let read_config = config.clone();
        let (sources, fingerprint) = tokio::task::spawn_blocking(move || {
            let sources = SourceSnapshot::read(&read_config)?;
            let fingerprint = SourceFingerprint::of(&sources, &read_config);
            Ok::<_, PipelineError>((sources, fingerprint))
        })
        .await
        .map_err(|e| PipelineError::task(Stage::Load, e))??;

        // Check cache first
        {
            let cache = self.cached.read().await;
            if let Some(entry) = cache.as_ref() {
                if entry.fingerprint == fingerprint {
                    debug!("Cache hit for sources {}", fingerprint.as_str());
                    return Ok(entry.outcome.clone());
                }
            }
        }

        info!("Sources changed ({}), recomputing", fingerprint.as_str());
        let outcome = pipeline::run_snapshot(Arc::new(sources), config).await?;

        // Update cache
        {
            let mut cache = self.cached.write().await;
            *cache = Some(CachedOutcome {
                fingerprint,
                outcome: outcome.clone(),
            });
        }

        Ok(outcome)
    }

    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    pub async fn cached_fingerprint(&self) -> Option<SourceFingerprint> {
        self.cached.read().await.as_ref().map(|entry| entry.fingerprint.clone())
    }
}
