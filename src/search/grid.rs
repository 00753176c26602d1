//! Exhaustive grid search with deterministic selection
//!
//! Every configuration is scored under the fold assignment owned by the
//! [`CrossValidator`]; the running maximum uses strictly-greater comparison
//! so equal means resolve to the earlier-enumerated configuration. The
//! winner is refit on the entire training set — CV folds are for selection
//! only, never for the artifact that leaves the pipeline.

use ndarray::Array2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::space::{Configuration, SearchSpace};
use crate::cv::{CrossValidator, TrialResult};
use crate::error::{Error, Result};
use crate::eval::Scoring;
use crate::model::{Estimator, EstimatorBuilder};

/// A configuration excluded from selection because one of its folds failed.
#[derive(Debug, Clone)]
pub struct TrialFailure {
    pub config: Configuration,
    pub fold: usize,
    pub cause: String,
}

/// The winning configuration refit on the full training set.
#[derive(Debug)]
pub struct SelectedModel<M> {
    pub config: Configuration,
    pub estimator: M,
    /// Mean CV score of the winning configuration.
    pub cv_score: f64,
}

/// Everything the search produced: the selected model plus all trial
/// results and failures, retained for inspection.
#[derive(Debug)]
pub struct SearchOutcome<M> {
    pub selected: SelectedModel<M>,
    pub trials: Vec<TrialResult>,
    pub failures: Vec<TrialFailure>,
}

/// Exhaustive search over a [`SearchSpace`].
#[derive(Debug, Clone)]
pub struct GridSearch {
    space: SearchSpace,
}

impl GridSearch {
    pub fn new(space: SearchSpace) -> Self {
        Self { space }
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    /// Run the full search and refit the winner.
    ///
    /// Fails with `EmptySearchSpace`/`InvalidSearchSpace` before any trial
    /// runs, and with `SearchExhausted` if every configuration failed.
    /// A single failed configuration is skipped and recorded.
    pub fn search<B>(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        cv: &CrossValidator,
        scoring: Scoring,
        builder: &B,
    ) -> Result<SearchOutcome<B::Model>>
    where
        B: EstimatorBuilder + Sync,
    {
        let outcomes = self.run_trials(x, y, cv, scoring, builder)?;

        let mut trials = Vec::new();
        let mut failures = Vec::new();
        let mut best: Option<(usize, f64)> = None;

        // Reduce in enumeration order regardless of how trials executed;
        // strictly-greater keeps the first of any tie.
        for outcome in outcomes {
            match outcome {
                Ok(trial) => {
                    let mean = trial.mean();
                    if best.map_or(true, |(_, best_mean)| mean > best_mean) {
                        best = Some((trials.len(), mean));
                    }
                    trials.push(trial);
                }
                Err(failure) => failures.push(failure),
            }
        }

        let (best_idx, cv_score) = best.ok_or(Error::SearchExhausted)?;
        let config = trials[best_idx].config.clone();

        // Refit on the entire training set.
        let mut estimator = builder.build(&config)?;
        estimator.fit(x, y)?;

        Ok(SearchOutcome {
            selected: SelectedModel {
                config,
                estimator,
                cv_score,
            },
            trials,
            failures,
        })
    }

    #[cfg(not(feature = "parallel"))]
    fn run_trials<B>(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        cv: &CrossValidator,
        scoring: Scoring,
        builder: &B,
    ) -> Result<Vec<std::result::Result<TrialResult, TrialFailure>>>
    where
        B: EstimatorBuilder + Sync,
    {
        self.space
            .configurations()?
            .map(|config| trial_outcome(cv.evaluate(builder, &config, x, y, scoring), config))
            .collect()
    }

    /// Trials are independent, so they fan out across the rayon pool;
    /// collect preserves enumeration order, so selection is identical to
    /// the sequential path (collect-then-reduce, never first-to-finish).
    #[cfg(feature = "parallel")]
    fn run_trials<B>(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        cv: &CrossValidator,
        scoring: Scoring,
        builder: &B,
    ) -> Result<Vec<std::result::Result<TrialResult, TrialFailure>>>
    where
        B: EstimatorBuilder + Sync,
    {
        let configs: Vec<Configuration> = self.space.configurations()?.collect();
        configs
            .into_par_iter()
            .map(|config| trial_outcome(cv.evaluate(builder, &config, x, y, scoring), config))
            .collect()
    }
}

/// A `TrialFailed` error excludes the configuration; anything else is fatal.
fn trial_outcome(
    result: Result<TrialResult>,
    config: Configuration,
) -> Result<std::result::Result<TrialResult, TrialFailure>> {
    match result {
        Ok(trial) => Ok(Ok(trial)),
        Err(Error::TrialFailed { fold, cause, .. }) => Ok(Err(TrialFailure {
            config,
            fold,
            cause,
        })),
        Err(fatal) => Err(fatal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::StratifiedKFold;
    use crate::search::ParamValue;
    use ndarray::Array2;
    use std::sync::{Arc, Mutex};

    /// Test estimator: predicts the class encoded in feature 0 when
    /// `perfect`, otherwise always class 0. Records every fit size.
    #[derive(Debug)]
    struct StubModel {
        perfect: bool,
        fail_fit: bool,
        fit_sizes: Arc<Mutex<Vec<usize>>>,
    }

    impl Estimator for StubModel {
        fn fit(&mut self, x: &Array2<f64>, _y: &[usize]) -> crate::error::Result<()> {
            if self.fail_fit {
                return Err(Error::InvalidParameter("stub fit failure".to_string()));
            }
            self.fit_sizes
                .lock()
                .expect("fit_sizes lock")
                .push(x.nrows());
            Ok(())
        }

        fn predict(&self, x: &Array2<f64>) -> crate::error::Result<Vec<usize>> {
            Ok(x.rows()
                .into_iter()
                .map(|row| if self.perfect { row[0] as usize } else { 0 })
                .collect())
        }
    }

    /// Builds stubs from an `id` axis: ids in `perfect_ids` predict
    /// perfectly, ids in `failing_ids` fail to fit.
    struct StubBuilder {
        perfect_ids: Vec<i64>,
        failing_ids: Vec<i64>,
        fit_sizes: Arc<Mutex<Vec<usize>>>,
    }

    impl StubBuilder {
        fn new(perfect_ids: &[i64], failing_ids: &[i64]) -> Self {
            Self {
                perfect_ids: perfect_ids.to_vec(),
                failing_ids: failing_ids.to_vec(),
                fit_sizes: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl EstimatorBuilder for StubBuilder {
        type Model = StubModel;

        fn build(&self, config: &Configuration) -> crate::error::Result<StubModel> {
            let id = config
                .get("id")
                .and_then(ParamValue::as_int)
                .ok_or_else(|| Error::InvalidParameter("missing id".to_string()))?;
            Ok(StubModel {
                perfect: self.perfect_ids.contains(&id),
                fail_fit: self.failing_ids.contains(&id),
                fit_sizes: Arc::clone(&self.fit_sizes),
            })
        }

        fn family(&self) -> &str {
            "Stub"
        }
    }

    /// 30 rows, 2 balanced classes, feature 0 encodes the label.
    fn dataset() -> (Array2<f64>, Vec<usize>) {
        let y: Vec<usize> = (0..30).map(|i| i % 2).collect();
        let x = Array2::from_shape_fn((30, 2), |(i, j)| {
            if j == 0 {
                (i % 2) as f64
            } else {
                i as f64
            }
        });
        (x, y)
    }

    fn id_space(ids: &[i64]) -> SearchSpace {
        let mut space = SearchSpace::new();
        space.add("id", ids.iter().map(|&i| ParamValue::Int(i)).collect());
        space
    }

    fn validator(y: &[usize]) -> CrossValidator {
        CrossValidator::new(&StratifiedKFold::new(3).with_seed(42), y).expect("folds")
    }

    #[test]
    fn test_best_configuration_selected() {
        let (x, y) = dataset();
        let builder = StubBuilder::new(&[2], &[]);
        let search = GridSearch::new(id_space(&[1, 2, 3]));

        let outcome = search
            .search(&x, &y, &validator(&y), Scoring::Accuracy, &builder)
            .expect("search");

        assert_eq!(
            outcome.selected.config.get("id"),
            Some(&ParamValue::Int(2))
        );
        assert!((outcome.selected.cv_score - 1.0).abs() < 1e-12);
        assert_eq!(outcome.trials.len(), 3);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_tie_break_prefers_earlier_enumeration() {
        let (x, y) = dataset();
        // Both configurations predict perfectly: identical means.
        let builder = StubBuilder::new(&[1, 2], &[]);
        let search = GridSearch::new(id_space(&[1, 2]));

        let outcome = search
            .search(&x, &y, &validator(&y), Scoring::Accuracy, &builder)
            .expect("search");

        assert_eq!(
            outcome.selected.config.get("id"),
            Some(&ParamValue::Int(1))
        );
    }

    #[test]
    fn test_winner_refit_on_full_training_set() {
        let (x, y) = dataset();
        let builder = StubBuilder::new(&[1], &[]);
        let search = GridSearch::new(id_space(&[1, 2]));

        let outcome = search
            .search(&x, &y, &validator(&y), Scoring::Accuracy, &builder)
            .expect("search");

        // Each trial averages 3 fold scores.
        for trial in &outcome.trials {
            assert_eq!(trial.fold_scores.len(), 3);
        }

        let sizes = builder.fit_sizes.lock().expect("fit_sizes lock");
        // 2 configurations x 3 folds of 20 training rows, then the refit.
        assert_eq!(sizes.len(), 7);
        assert!(sizes[..6].iter().all(|&n| n == 20));
        assert_eq!(*sizes.last().expect("refit"), 30);
    }

    #[test]
    fn test_failed_configuration_skipped() {
        let (x, y) = dataset();
        let builder = StubBuilder::new(&[], &[1]);
        let search = GridSearch::new(id_space(&[1, 2]));

        let outcome = search
            .search(&x, &y, &validator(&y), Scoring::Accuracy, &builder)
            .expect("search");

        assert_eq!(
            outcome.selected.config.get("id"),
            Some(&ParamValue::Int(2))
        );
        assert_eq!(outcome.trials.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].fold, 0);
        assert!(outcome.failures[0].cause.contains("stub fit failure"));
    }

    #[test]
    fn test_all_configurations_failing_exhausts_search() {
        let (x, y) = dataset();
        let builder = StubBuilder::new(&[], &[1, 2]);
        let search = GridSearch::new(id_space(&[1, 2]));

        let err = search
            .search(&x, &y, &validator(&y), Scoring::Accuracy, &builder)
            .unwrap_err();
        assert!(matches!(err, Error::SearchExhausted));
    }

    #[test]
    fn test_empty_space_aborts_before_trials() {
        let (x, y) = dataset();
        let builder = StubBuilder::new(&[], &[]);
        let search = GridSearch::new(SearchSpace::new());

        let err = search
            .search(&x, &y, &validator(&y), Scoring::Accuracy, &builder)
            .unwrap_err();
        assert!(matches!(err, Error::EmptySearchSpace));
        assert!(builder.fit_sizes.lock().expect("lock").is_empty());
    }

    #[test]
    fn test_single_configuration_wins_trivially() {
        let (x, y) = dataset();
        let builder = StubBuilder::new(&[7], &[]);
        let search = GridSearch::new(id_space(&[7]));

        let outcome = search
            .search(&x, &y, &validator(&y), Scoring::Accuracy, &builder)
            .expect("search");
        assert_eq!(outcome.trials.len(), 1);
        assert_eq!(
            outcome.selected.config.get("id"),
            Some(&ParamValue::Int(7))
        );
    }

    #[test]
    fn test_mean_matches_fold_scores() {
        let (x, y) = dataset();
        let builder = StubBuilder::new(&[1], &[]);
        let search = GridSearch::new(id_space(&[1]));

        let outcome = search
            .search(&x, &y, &validator(&y), Scoring::Accuracy, &builder)
            .expect("search");
        let trial = &outcome.trials[0];
        let expected = trial.fold_scores.iter().sum::<f64>() / trial.fold_scores.len() as f64;
        assert!((trial.mean() - expected).abs() < 1e-12);
        assert!((outcome.selected.cv_score - expected).abs() < 1e-12);
    }
}
