//! Pluggable estimators
//!
//! The search engine and cross-validator only see the [`Estimator`] and
//! [`EstimatorBuilder`] traits; any classifier with fit/predict semantics
//! can be swapped in without touching the selection logic.

mod svc;

pub use svc::{ClassWeight, LinearSvc, SvcBuilder};

use ndarray::Array2;

use crate::error::Result;
use crate::search::Configuration;

/// A trainable classifier over encoded labels.
pub trait Estimator {
    /// Fit on a feature matrix and aligned labels.
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()>;

    /// Predict one encoded label per row. Fails if called before `fit`.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>>;
}

/// Builds a fresh estimator instance from a hyperparameter configuration.
///
/// Every trial gets its own instance, so trials share no mutable state.
pub trait EstimatorBuilder {
    type Model: Estimator;

    /// Instantiate an unfitted estimator configured by `config`.
    ///
    /// Fails with `InvalidParameter` on unknown names or mistyped values.
    fn build(&self, config: &Configuration) -> Result<Self::Model>;

    /// Model family name, recorded with the run parameters.
    fn family(&self) -> &str;
}
