//! Stratified cross-validation
//!
//! [`StratifiedKFold`] partitions row indices into folds that approximately
//! preserve class proportions, deterministically for a fixed seed. The
//! [`CrossValidator`] computes that fold assignment once per run and reuses
//! it for every configuration, so all candidates are compared on identical
//! folds.

use ndarray::{Array2, Axis};

use crate::error::{Error, Result};
use crate::eval::Scoring;
use crate::model::{Estimator, EstimatorBuilder};
use crate::search::Configuration;

/// Stratified K-Fold splitter.
///
/// Indices are grouped by class (ascending encoded label), each group is
/// shuffled with a seeded LCG, then dealt into k contiguous chunks with the
/// remainder spread across the first folds. Every fold receives at least
/// one example of every class, which is why the split fails fast when k
/// exceeds the smallest class's row count.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits, seed: 42 }
    }

    /// Set the shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate stratified (train_indices, test_indices) per fold.
    pub fn split(&self, y: &[usize]) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.n_splits < 2 {
            return Err(Error::Stratification(format!(
                "need at least 2 folds, got {}",
                self.n_splits
            )));
        }
        if y.is_empty() {
            return Err(Error::Stratification("no training rows".to_string()));
        }

        let n_classes = y.iter().max().map_or(0, |&m| m + 1);
        let mut class_indices: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
        for (i, &label) in y.iter().enumerate() {
            class_indices[label].push(i);
        }
        class_indices.retain(|indices| !indices.is_empty());

        if let Some(smallest) = class_indices.iter().map(Vec::len).min() {
            if smallest < self.n_splits {
                return Err(Error::Stratification(format!(
                    "smallest class has {smallest} rows, fewer than {} folds",
                    self.n_splits
                )));
            }
        }

        // Seeded LCG shuffle, one stream across all classes.
        let mut rng_state = self.seed;
        let mut fold_indices: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        for indices in &mut class_indices {
            for i in (1..indices.len()).rev() {
                rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1);
                let j = (rng_state >> 33) as usize % (i + 1);
                indices.swap(i, j);
            }

            let chunk = indices.len() / self.n_splits;
            let remainder = indices.len() % self.n_splits;
            let mut start = 0;
            for (f, fold) in fold_indices.iter_mut().enumerate() {
                let end = start + chunk + usize::from(f < remainder);
                fold.extend_from_slice(&indices[start..end]);
                start = end;
            }
        }

        let n_samples = y.len();
        let mut splits = Vec::with_capacity(self.n_splits);
        for i in 0..self.n_splits {
            let test_indices = fold_indices[i].clone();
            let mut train_indices = Vec::with_capacity(n_samples - test_indices.len());
            for (j, fold) in fold_indices.iter().enumerate() {
                if j != i {
                    train_indices.extend_from_slice(fold);
                }
            }
            splits.push((train_indices, test_indices));
        }
        Ok(splits)
    }
}

/// Per-configuration cross-validation outcome: the k fold scores.
#[derive(Debug, Clone)]
pub struct TrialResult {
    pub config: Configuration,
    pub fold_scores: Vec<f64>,
}

impl TrialResult {
    /// Arithmetic mean across folds: the model-selection criterion.
    pub fn mean(&self) -> f64 {
        if self.fold_scores.is_empty() {
            return 0.0;
        }
        self.fold_scores.iter().sum::<f64>() / self.fold_scores.len() as f64
    }

    /// Population standard deviation of the fold scores.
    pub fn std(&self) -> f64 {
        if self.fold_scores.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .fold_scores
            .iter()
            .map(|&s| (s - mean).powi(2))
            .sum::<f64>()
            / self.fold_scores.len() as f64;
        variance.sqrt()
    }
}

/// Runs one configuration over the shared fold assignment.
#[derive(Debug, Clone)]
pub struct CrossValidator {
    folds: Vec<(Vec<usize>, Vec<usize>)>,
    n_classes: usize,
}

impl CrossValidator {
    /// Compute the fold assignment once. Fails fast on stratification
    /// problems (see [`StratifiedKFold::split`]).
    pub fn new(kfold: &StratifiedKFold, y: &[usize]) -> Result<Self> {
        let folds = kfold.split(y)?;
        let n_classes = y.iter().max().map_or(0, |&m| m + 1);
        Ok(Self { folds, n_classes })
    }

    pub fn n_splits(&self) -> usize {
        self.folds.len()
    }

    /// The shared fold assignment, identical for every configuration.
    pub fn folds(&self) -> &[(Vec<usize>, Vec<usize>)] {
        &self.folds
    }

    /// Fit and score `config` on every fold.
    ///
    /// Each fold fits a fresh estimator on the k-1 training folds and scores
    /// it on the held-out fold. Build or fit failures propagate as
    /// `TrialFailed` naming the configuration and fold.
    pub fn evaluate<B: EstimatorBuilder>(
        &self,
        builder: &B,
        config: &Configuration,
        x: &Array2<f64>,
        y: &[usize],
        scoring: Scoring,
    ) -> Result<TrialResult> {
        let mut fold_scores = Vec::with_capacity(self.folds.len());

        for (fold, (train_idx, test_idx)) in self.folds.iter().enumerate() {
            let trial_failed = |cause: &Error| Error::TrialFailed {
                config: config.to_string(),
                fold,
                cause: cause.to_string(),
            };

            let x_train = x.select(Axis(0), train_idx);
            let y_train: Vec<usize> = train_idx.iter().map(|&i| y[i]).collect();
            let x_test = x.select(Axis(0), test_idx);
            let y_test: Vec<usize> = test_idx.iter().map(|&i| y[i]).collect();

            let mut model = builder.build(config).map_err(|e| trial_failed(&e))?;
            model.fit(&x_train, &y_train).map_err(|e| trial_failed(&e))?;
            let predictions = model.predict(&x_test).map_err(|e| trial_failed(&e))?;

            fold_scores.push(scoring.score(&predictions, &y_test, self.n_classes)?);
        }

        Ok(TrialResult {
            config: config.clone(),
            fold_scores,
        })
    }
}
