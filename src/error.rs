//! Error taxonomy for the enrichment pipeline.
//!
//! Every error is fatal to the run. Orders that match no district are not
//! errors; they are counted in the enrichment report and dropped.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Load,
    Temporal,
    Catalog,
    Classify,
    Output,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Load => "load",
            Stage::Temporal => "temporal",
            Stage::Catalog => "catalog",
            Stage::Classify => "classify",
            Stage::Output => "output",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("load stage: cannot read {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("load stage: malformed order row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("load stage: malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("load stage: archive {path:?}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("temporal stage: order {id} has unparseable timestamp {value:?}")]
    Timestamp { id: String, value: String },

    #[error("catalog stage: geometry source {source_name}: {reason}")]
    Geometry { source_name: String, reason: String },

    #[error("output stage: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{stage} stage: worker task failed: {reason}")]
    Task { stage: Stage, reason: String },
}

impl PipelineError {
    pub fn geometry(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::Geometry {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// A blocking worker for `stage` panicked or was cancelled.
    pub fn task(stage: Stage, reason: impl std::fmt::Display) -> Self {
        PipelineError::Task {
            stage,
            reason: reason.to_string(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::InvalidConfig(_) | PipelineError::Json(_) => Stage::Config,
            PipelineError::Load { .. }
            | PipelineError::MalformedRow { .. }
            | PipelineError::Csv(_)
            | PipelineError::Archive { .. } => Stage::Load,
            PipelineError::Timestamp { .. } => Stage::Temporal,
            PipelineError::Geometry { .. } => Stage::Catalog,
            PipelineError::Task { stage, .. } => *stage,
            PipelineError::Io(_) => Stage::Output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_mapping() {
        let err = PipelineError::geometry("okruga", "missing geometry");
        assert_eq!(err.stage(), Stage::Catalog);
        assert!(err.to_string().contains("okruga"));

        let err = PipelineError::MalformedRow {
            row: 3,
            reason: "bad latitude".into(),
        };
        assert_eq!(err.stage(), Stage::Load);
        assert_eq!(err.stage().to_string(), "load");
    }

    #[test]
    fn test_task_error_names_its_stage() {
        let err = PipelineError::task(Stage::Catalog, "task panicked");
        assert_eq!(err.stage(), Stage::Catalog);
        assert_eq!(err.to_string(), "catalog stage: worker task failed: task panicked");
    }
}
