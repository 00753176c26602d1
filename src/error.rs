//! Crate-level error types
//!
//! Dataset and search-space errors abort a run immediately. A failed trial
//! is recoverable at the search-engine level (the configuration is skipped);
//! artifact-generation failures are caught at the recording call site and
//! never escalate.

use std::path::PathBuf;

use crate::tracking::TrackingError;

/// Pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Dataset not found: {0}")]
    DatasetNotFound(PathBuf),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Invalid search space: {0}")]
    InvalidSearchSpace(String),

    #[error("Empty search space")]
    EmptySearchSpace,

    #[error("Trial failed for {config} on fold {fold}: {cause}")]
    TrialFailed {
        config: String,
        fold: usize,
        cause: String,
    },

    #[error("Search exhausted: every configuration failed")]
    SearchExhausted,

    #[error("Stratification error: {0}")]
    Stratification(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Artifact generation failed: {0}")]
    ArtifactGeneration(String),

    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),
}

/// Result alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
