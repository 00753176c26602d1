//! Experiment tracking
//!
//! Records hyperparameter search runs: parameters, metrics, and artifact
//! payloads. The [`ExperimentTracker`] is an explicit instance handed to the
//! pipeline; there is no global registry. Persistence is delegated to a
//! [`TrackingBackend`] so tests can swap in [`InMemoryBackend`].
//!
//! # Example
//!
//! ```
//! use afinar::tracking::{ExperimentTracker, InMemoryBackend, RunStatus};
//!
//! let mut tracker = ExperimentTracker::new("sentiment-svc", InMemoryBackend::new());
//! let run_id = tracker.start_run(None).unwrap();
//! tracker.log_param(&run_id, "C", "0.5").unwrap();
//! tracker.log_metric(&run_id, "test_accuracy", 0.93).unwrap();
//! tracker.end_run(&run_id, RunStatus::Completed).unwrap();
//! ```

mod storage;

pub use storage::{
    InMemoryBackend, JsonFileBackend, RunRecord, TrackingBackend, TrackingStorageError,
};

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Errors from tracking operations
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Run is not active: {0}")]
    RunNotActive(String),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::TrackingStorageError),
}

/// Result alias for tracking operations
pub type Result<T> = std::result::Result<T, TrackingError>;

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// A single tracked run: one execution of the search pipeline.
#[derive(Debug, Clone)]
pub struct Run {
    pub run_id: String,
    pub run_name: Option<String>,
    pub experiment_name: String,
    pub status: RunStatus,
    /// Parameters are write-once string key/values, sorted for stable output.
    pub params: BTreeMap<String, String>,
    /// Metrics are single-valued; re-logging a name overwrites it.
    pub metrics: BTreeMap<String, f64>,
    /// Backend-reported artifact locations, in logging order.
    pub artifacts: Vec<String>,
    pub start_time_ms: Option<u64>,
    pub end_time_ms: Option<u64>,
}

impl Run {
    fn new(run_id: String, run_name: Option<String>, experiment_name: String) -> Self {
        Self {
            run_id,
            run_name,
            experiment_name,
            status: RunStatus::Running,
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
            artifacts: Vec::new(),
            start_time_ms: Some(now_ms()),
            end_time_ms: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test(run_id: &str, experiment_name: &str) -> Self {
        Self::new(run_id.to_string(), None, experiment_name.to_string())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// Tracks runs for one experiment against a storage backend.
///
/// Every mutation is persisted immediately, so a crash mid-run still leaves
/// the partial record on disk with status `Running`.
pub struct ExperimentTracker<B: TrackingBackend> {
    experiment_name: String,
    backend: B,
    next_run: usize,
}

impl<B: TrackingBackend> ExperimentTracker<B> {
    pub fn new(experiment_name: impl Into<String>, backend: B) -> Self {
        Self {
            experiment_name: experiment_name.into(),
            backend,
            next_run: 1,
        }
    }

    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// Consume the tracker, returning its backend (test inspection).
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Begin a new run and persist it with status `Running`.
    pub fn start_run(&mut self, run_name: Option<&str>) -> Result<String> {
        let run_id = format!("run-{:04}", self.next_run);
        self.next_run += 1;
        let run = Run::new(
            run_id.clone(),
            run_name.map(String::from),
            self.experiment_name.clone(),
        );
        self.backend.save_run(&run)?;
        Ok(run_id)
    }

    /// Mark a run finished with the given terminal status.
    pub fn end_run(&mut self, run_id: &str, status: RunStatus) -> Result<()> {
        let mut run = self.active_run(run_id)?;
        run.status = status;
        run.end_time_ms = Some(now_ms());
        self.backend.save_run(&run)?;
        Ok(())
    }

    /// Record one parameter on an active run.
    pub fn log_param(&mut self, run_id: &str, key: &str, value: &str) -> Result<()> {
        let mut run = self.active_run(run_id)?;
        run.params.insert(key.to_string(), value.to_string());
        self.backend.save_run(&run)?;
        Ok(())
    }

    /// Record several parameters at once.
    pub fn log_params<'a, I>(&mut self, run_id: &str, params: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut run = self.active_run(run_id)?;
        for (key, value) in params {
            run.params.insert(key.to_string(), value);
        }
        self.backend.save_run(&run)?;
        Ok(())
    }

    /// Record a single-valued metric on an active run.
    pub fn log_metric(&mut self, run_id: &str, name: &str, value: f64) -> Result<()> {
        let mut run = self.active_run(run_id)?;
        run.metrics.insert(name.to_string(), value);
        self.backend.save_run(&run)?;
        Ok(())
    }

    /// Store an artifact payload under the run and record its location.
    pub fn log_artifact(&mut self, run_id: &str, name: &str, payload: &[u8]) -> Result<()> {
        let mut run = self.active_run(run_id)?;
        let location = self.backend.write_artifact(run_id, name, payload)?;
        run.artifacts.push(location);
        self.backend.save_run(&run)?;
        Ok(())
    }

    /// Fetch a run by ID, active or finished.
    pub fn get_run(&self, run_id: &str) -> Result<Run> {
        match self.backend.load_run(run_id) {
            Ok(run) => Ok(run),
            Err(storage::TrackingStorageError::RunNotFound(id)) => {
                Err(TrackingError::RunNotFound(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List all runs recorded by the backend, sorted by run ID.
    pub fn list_runs(&self) -> Result<Vec<Run>> {
        Ok(self.backend.list_runs()?)
    }

    fn active_run(&self, run_id: &str) -> Result<Run> {
        let run = self.get_run(run_id)?;
        if run.status != RunStatus::Running {
            return Err(TrackingError::RunNotActive(run_id.to_string()));
        }
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ExperimentTracker<InMemoryBackend> {
        ExperimentTracker::new("test-experiment", InMemoryBackend::new())
    }

    #[test]
    fn test_start_run_assigns_sequential_ids() {
        let mut t = tracker();
        assert_eq!(t.start_run(None).expect("first"), "run-0001");
        assert_eq!(t.start_run(None).expect("second"), "run-0002");
    }

    #[test]
    fn test_run_lifecycle() {
        let mut t = tracker();
        let run_id = t.start_run(Some("baseline")).expect("start");

        let run = t.get_run(&run_id).expect("get");
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.run_name.as_deref(), Some("baseline"));
        assert!(run.start_time_ms.is_some());
        assert!(run.end_time_ms.is_none());

        t.end_run(&run_id, RunStatus::Completed).expect("end");
        let run = t.get_run(&run_id).expect("get");
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.end_time_ms.is_some());
    }

    #[test]
    fn test_log_params_and_metrics() {
        let mut t = tracker();
        let run_id = t.start_run(None).expect("start");

        t.log_params(
            &run_id,
            [
                ("best_C", "0.5".to_string()),
                ("best_class_weight", "balanced".to_string()),
            ],
        )
        .expect("params");
        t.log_metric(&run_id, "test_f1_macro", 0.88).expect("metric");
        t.log_metric(&run_id, "test_f1_macro", 0.90).expect("overwrite");

        let run = t.get_run(&run_id).expect("get");
        assert_eq!(run.params.len(), 2);
        assert_eq!(run.metrics.get("test_f1_macro"), Some(&0.90));
    }

    #[test]
    fn test_log_after_end_rejected() {
        let mut t = tracker();
        let run_id = t.start_run(None).expect("start");
        t.end_run(&run_id, RunStatus::Completed).expect("end");

        let err = t.log_metric(&run_id, "late", 1.0).unwrap_err();
        assert!(matches!(err, TrackingError::RunNotActive(_)));
    }

    #[test]
    fn test_unknown_run_rejected() {
        let mut t = tracker();
        let err = t.log_param("run-9999", "k", "v").unwrap_err();
        assert!(matches!(err, TrackingError::RunNotFound(_)));
    }

    #[test]
    fn test_artifact_locations_recorded_in_order() {
        let mut t = tracker();
        let run_id = t.start_run(None).expect("start");
        t.log_artifact(&run_id, "model.json", b"{}").expect("first");
        t.log_artifact(&run_id, "confusion_matrix.svg", b"<svg/>")
            .expect("second");

        let run = t.get_run(&run_id).expect("get");
        assert_eq!(
            run.artifacts,
            vec![
                "mem://run-0001/model.json".to_string(),
                "mem://run-0001/confusion_matrix.svg".to_string(),
            ]
        );
    }
}
