//! Error types shared by every pipeline stage.
//!
//! Each stage returns [`Result`]. Failures inside a stage keep their cause
//! attached as `source`, and the orchestrator adds one [`PipelineError::Stage`]
//! layer naming the stage that failed.

use std::fmt;
use std::path::PathBuf;

use polars::prelude::PolarsError;
use serde::Serialize;
use thiserror::Error;

use super::resample::ResampleError;
use super::schema::SchemaError;
use super::transform::TransformError;

/// Result alias used across the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The three stages sequenced by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Ingestion,
    Validation,
    Transformation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingestion => "data ingestion",
            Stage::Validation => "data validation",
            Stage::Transformation => "data transformation",
        };
        f.write_str(name)
    }
}

/// Application-level error for the data-preparation pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The document store could not be reached.
    #[error("document store unreachable at {location}: {reason}")]
    Connectivity { location: String, reason: String },

    /// The collection is missing, malformed or empty.
    #[error("failed to read collection '{collection}': {reason}")]
    DataAccess { collection: String, reason: String },

    /// Reading, writing or creating a directory failed.
    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV file could not be read or written.
    #[error("table error on {}", .path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    /// An in-memory frame operation failed.
    #[error("frame operation failed")]
    Frame(#[from] PolarsError),

    #[error("invalid schema")]
    Schema(#[from] SchemaError),

    /// A setting is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The transformation gate rejected a failed validation artifact.
    #[error("data validation failed: {message}")]
    ValidationFailed { message: String },

    /// An object or array could not be persisted or loaded.
    #[error("serialization error on {}: {reason}", .path.display())]
    Serialization { path: PathBuf, reason: String },

    #[error("preprocessing failed")]
    Transform(#[from] TransformError),

    #[error("resampling failed")]
    Resample(#[from] ResampleError),

    /// Stage boundary wrapper added by the orchestrator.
    #[error("{stage} stage failed")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn table(path: impl Into<PathBuf>, source: PolarsError) -> Self {
        PipelineError::Table {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        PipelineError::Serialization {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Wrap this error at a stage boundary.
    pub fn in_stage(self, stage: Stage) -> Self {
        PipelineError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through stage wrappers.
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// The stage that failed, if this error crossed a stage boundary.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
