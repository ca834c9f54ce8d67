//! Pipeline configuration and fixed reference values.
//!
//! Defaults match the dashboard setup: a 30k row sample measured from
//! Moscow's designated center point, with hours bucketed in UTC.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Designated city-center latitude (Red Square area)
pub const CITY_CENTER_LAT: f64 = 55.753544;

/// Designated city-center longitude
pub const CITY_CENTER_LON: f64 = 37.621211;

/// Default number of order rows kept from the batch
pub const DEFAULT_ROW_CAP: usize = 30_000;

/// Feature property holding the area name in the boundary sources
pub const DEFAULT_NAME_PROPERTY: &str = "local_name";

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub const fn city_center() -> Self {
        Self::new(CITY_CENTER_LAT, CITY_CENTER_LON)
    }
}

/// Everything the enrichment pipeline needs to run once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Order batch, `.csv` or `.csv.zip`
    pub orders_path: PathBuf,
    /// Fine-grained district polygons
    pub districts_path: PathBuf,
    /// Single city outline polygon
    pub city_outline_path: PathBuf,
    /// Administrative okrug polygons
    pub okruga_path: PathBuf,
    /// Keep only the first N rows; 0 keeps everything
    pub row_cap: usize,
    pub reference_point: GeoCoordinate,
    /// Offset applied before extracting weekday and hour
    pub utc_offset_hours: i32,
    pub name_property: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            orders_path: PathBuf::from("raw-data/orders.csv.zip"),
            districts_path: PathBuf::from("raw-data/districts.geojson.zip"),
            city_outline_path: PathBuf::from("raw-data/moscow.geojson"),
            okruga_path: PathBuf::from("raw-data/okruga.geojson"),
            row_cap: DEFAULT_ROW_CAP,
            reference_point: GeoCoordinate::city_center(),
            utc_offset_hours: 0,
            name_property: DEFAULT_NAME_PROPERTY.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file; missing keys fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| PipelineError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(PipelineError::InvalidConfig(format!(
                "utc_offset_hours must be within -12..=14, got {}",
                self.utc_offset_hours
            )));
        }
        let GeoCoordinate { latitude, longitude } = self.reference_point;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(PipelineError::InvalidConfig(format!(
                "reference point ({}, {}) is not a valid coordinate",
                latitude, longitude
            )));
        }
        if self.name_property.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "name_property must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
