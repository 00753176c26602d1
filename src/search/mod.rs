//! Hyperparameter search: declarative grid and exhaustive engine
//!
//! [`SearchSpace`] describes the hyperparameter axes; [`GridSearch`] walks
//! the Cartesian product, scores every configuration under a shared fold
//! assignment, and refits the winner on the full training set.

mod grid;
mod space;

pub use grid::{GridSearch, SearchOutcome, SelectedModel, TrialFailure};
pub use space::{Configuration, ConfigurationIter, ParamValue, SearchSpace};
