//! Command-line arguments shared by the binaries

use std::path::PathBuf;

use clap::Args;
use tracing_subscriber::EnvFilter;

use crate::config::PipelineConfig;
use crate::error::Result;

/// Pipeline inputs; any flag given overrides the `--config` file
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// JSON pipeline config
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Order batch (.csv or .csv.zip)
    #[arg(long)]
    pub orders: Option<PathBuf>,

    /// District polygons (.geojson or .geojson.zip)
    #[arg(long)]
    pub districts: Option<PathBuf>,

    /// City outline polygon
    #[arg(long)]
    pub city_outline: Option<PathBuf>,

    /// Okrug polygons
    #[arg(long)]
    pub okruga: Option<PathBuf>,

    /// Keep only the first N orders (0 = all)
    #[arg(long)]
    pub row_cap: Option<usize>,

    /// Hours east of UTC used for weekday and time-of-day
    #[arg(long, allow_hyphen_values = true)]
    pub utc_offset: Option<i32>,
}

impl SourceArgs {
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(path) = &self.orders {
            config.orders_path = path.clone();
        }
        if let Some(path) = &self.districts {
            config.districts_path = path.clone();
        }
        if let Some(path) = &self.city_outline {
            config.city_outline_path = path.clone();
        }
        if let Some(path) = &self.okruga {
            config.okruga_path = path.clone();
        }
        if let Some(cap) = self.row_cap {
            config.row_cap = cap;
        }
        if let Some(offset) = self.utc_offset {
            config.utc_offset_hours = offset;
        }

        config.validate()?;
        Ok(config)
    }
}

/// `RUST_LOG` wins; otherwise log at info.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        sources: SourceArgs,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::parse_from([
            "test",
            "--orders",
            "batch.csv",
            "--row-cap",
            "0",
            "--utc-offset",
            "-3",
        ]);
        let config = cli.sources.to_config().unwrap();
        assert_eq!(config.orders_path, PathBuf::from("batch.csv"));
        assert_eq!(config.row_cap, 0);
        assert_eq!(config.utc_offset_hours, -3);
        assert_eq!(config.okruga_path, PipelineConfig::default().okruga_path);
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"row_cap": 100, "utc_offset_hours": 3}"#).unwrap();

        let args = SourceArgs {
            config: Some(path),
            row_cap: Some(5),
            ..SourceArgs::default()
        };
        let config = args.to_config().unwrap();
        assert_eq!(config.row_cap, 5);
        assert_eq!(config.utc_offset_hours, 3);
    }
}
