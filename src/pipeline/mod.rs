//! Search pipeline orchestration
//!
//! Wires the whole flow together: load the train/test pair, enumerate the
//! grid under shared stratified folds, select and refit the winner, score
//! it on the held-out test set, and record everything with the tracker.
//!
//! Artifact policy: the serialized model is essential and its failure
//! aborts the run; the confusion matrix rendering is best-effort and a
//! failure there only prints a warning.

use std::fmt;

use crate::config::TuneSpec;
use crate::cv::{CrossValidator, StratifiedKFold};
use crate::data::{load_dataset, DatasetPair};
use crate::error::Result;
use crate::eval::{evaluate, ConfusionMatrix, EvaluationReport};
use crate::model::{EstimatorBuilder, SvcBuilder};
use crate::search::{Configuration, GridSearch};
use crate::tracking::{ExperimentTracker, RunStatus, TrackingBackend};
use crate::viz::confusion_matrix_svg;

/// What one pipeline execution produced.
#[derive(Debug)]
pub struct PipelineSummary {
    pub run_id: String,
    pub experiment: String,
    pub best_config: Configuration,
    /// Metric name the search optimized.
    pub cv_metric: &'static str,
    /// Mean CV score of the winning configuration.
    pub cv_score: f64,
    pub n_trials: usize,
    pub n_failures: usize,
    pub report: EvaluationReport,
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Experiment: {} ({})", self.experiment, self.run_id)?;
        writeln!(f, "Best configuration: {}", self.best_config)?;
        writeln!(
            f,
            "CV {}: {:.4} ({} trials, {} excluded)",
            self.cv_metric, self.cv_score, self.n_trials, self.n_failures
        )?;
        writeln!(f, "Test accuracy:        {:.4}", self.report.accuracy)?;
        writeln!(
            f,
            "Test precision_macro: {:.4}",
            self.report.precision_macro
        )?;
        writeln!(f, "Test recall_macro:    {:.4}", self.report.recall_macro)?;
        write!(f, "Test f1_macro:        {:.4}", self.report.f1_macro)
    }
}

/// Execute one full search described by `spec`, recording with `tracker`.
///
/// Configuration and data errors surface before any run is opened; once a
/// run has started, a failure marks it `Failed` before propagating.
pub fn run<B: TrackingBackend>(
    spec: &TuneSpec,
    tracker: &mut ExperimentTracker<B>,
) -> Result<PipelineSummary> {
    spec.validate()?;
    let data = load_dataset(&spec.data.dir, &spec.data.label_column)?;

    let run_id = tracker.start_run(None)?;
    match execute(spec, &data, &run_id, tracker) {
        Ok(summary) => {
            tracker.end_run(&run_id, RunStatus::Completed)?;
            Ok(summary)
        }
        Err(e) => {
            // Preserve the original error even if closing the run fails too.
            if let Err(end_err) = tracker.end_run(&run_id, RunStatus::Failed) {
                eprintln!("Warning: could not mark {run_id} failed: {end_err}");
            }
            Err(e)
        }
    }
}

fn execute<B: TrackingBackend>(
    spec: &TuneSpec,
    data: &DatasetPair,
    run_id: &str,
    tracker: &mut ExperimentTracker<B>,
) -> Result<PipelineSummary> {
    let space = spec.to_search_space()?;
    let kfold = StratifiedKFold::new(spec.search.folds).with_seed(spec.search.seed);
    let cv = CrossValidator::new(&kfold, data.train.labels())?;
    let builder = SvcBuilder::new(spec.search.seed);

    let outcome = GridSearch::new(space).search(
        data.train.features(),
        data.train.labels(),
        &cv,
        spec.search.scoring,
        &builder,
    )?;
    for failure in &outcome.failures {
        eprintln!(
            "Warning: configuration [{}] excluded, fold {} failed: {}",
            failure.config, failure.fold, failure.cause
        );
    }

    let report = evaluate(&outcome.selected.estimator, &data.test)?;

    // Winning hyperparameters and run context first.
    let best_params: Vec<(String, String)> = outcome
        .selected
        .config
        .iter()
        .map(|(name, value)| (format!("best_{name}"), value.to_string()))
        .collect();
    tracker.log_params(
        run_id,
        best_params
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .chain([
                ("n_features", data.train.n_features().to_string()),
                ("model_type", builder.family().to_string()),
                ("cv_splits", spec.search.folds.to_string()),
            ]),
    )?;

    // Selection score, then held-out metrics.
    let cv_metric = spec.search.scoring.name();
    tracker.log_metric(
        run_id,
        &format!("cv_best_{cv_metric}"),
        outcome.selected.cv_score,
    )?;
    tracker.log_metric(run_id, "test_accuracy", report.accuracy)?;
    tracker.log_metric(run_id, "test_f1_macro", report.f1_macro)?;
    tracker.log_metric(run_id, "test_precision_macro", report.precision_macro)?;
    tracker.log_metric(run_id, "test_recall_macro", report.recall_macro)?;

    let model_json = serde_json::to_vec_pretty(&outcome.selected.estimator)
        .map_err(|e| crate::error::Error::ArtifactGeneration(e.to_string()))?;
    tracker.log_artifact(run_id, "model.json", &model_json)?;

    log_nonessential(tracker, run_id, "confusion_matrix.svg", || {
        let cm = ConfusionMatrix::from_predictions(
            &report.predictions,
            data.test.labels(),
            data.test.n_classes(),
        )?;
        confusion_matrix_svg(&cm, data.test.classes())
    });

    Ok(PipelineSummary {
        run_id: run_id.to_string(),
        experiment: tracker.experiment_name().to_string(),
        best_config: outcome.selected.config,
        cv_metric,
        cv_score: outcome.selected.cv_score,
        n_trials: outcome.trials.len(),
        n_failures: outcome.failures.len(),
        report,
    })
}

/// Log a best-effort artifact. Generation or storage failures are reported
/// on stderr and swallowed; the run's metrics are already recorded.
fn log_nonessential<B, F>(
    tracker: &mut ExperimentTracker<B>,
    run_id: &str,
    name: &str,
    render: F,
) where
    B: TrackingBackend,
    F: FnOnce() -> Result<String>,
{
    let payload = match render() {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("Warning: skipping artifact {name}: {e}");
            return;
        }
    };
    if let Err(e) = tracker.log_artifact(run_id, name, payload.as_bytes()) {
        eprintln!("Warning: could not store artifact {name}: {e}");
    }
}
