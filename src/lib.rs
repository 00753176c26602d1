//! Afinar: reproducible hyperparameter search and evaluation.
//!
//! Exhaustive grid search over classifier hyperparameters with stratified
//! k-fold cross-validation, deterministic model selection, held-out test
//! evaluation, and file-based experiment tracking.
//!
//! The flow: a [`config::TuneSpec`] names the data and the grid, the
//! [`pipeline`] enumerates every configuration under one shared fold
//! assignment, refits the winner on the full training set, scores it on the
//! test partition, and records parameters, metrics, and artifacts with an
//! explicit [`tracking::ExperimentTracker`].
//!
//! Determinism contract: for a fixed specification, seed, and dataset, the
//! selected configuration and every recorded metric are identical across
//! runs, with or without the `parallel` feature.
//!
//! # Example
//!
//! ```no_run
//! use afinar::config::TuneSpec;
//! use afinar::tracking::{ExperimentTracker, JsonFileBackend};
//!
//! fn main() -> afinar::Result<()> {
//!     let spec = TuneSpec::load(std::path::Path::new("tune.yaml"))?;
//!     let backend = JsonFileBackend::new(&spec.tracking.dir);
//!     let mut tracker = ExperimentTracker::new(spec.experiment.clone(), backend);
//!     let summary = afinar::pipeline::run(&spec, &mut tracker)?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod cv;
pub mod data;
pub mod error;
pub mod eval;
pub mod model;
pub mod pipeline;
pub mod search;
pub mod tracking;
pub mod viz;

pub use error::{Error, Result};
