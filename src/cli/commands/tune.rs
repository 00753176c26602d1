//! Tune command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, TuneArgs, TuneSpec};
use crate::pipeline;
use crate::tracking::{ExperimentTracker, JsonFileBackend};

pub fn run_tune(args: TuneArgs, level: LogLevel) -> Result<(), String> {
    let mut spec = TuneSpec::load_or_default(args.spec.as_deref())
        .map_err(|e| format!("Specification error: {e}"))?;
    apply_overrides(&mut spec, &args);

    log(
        level,
        LogLevel::Normal,
        &format!("Experiment: {}", spec.experiment),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Data: {} (label column {:?})",
            spec.data.dir.display(),
            spec.data.label_column
        ),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Search: {} folds, seed {}, scoring {}",
            spec.search.folds, spec.search.seed, spec.search.scoring
        ),
    );

    let backend = JsonFileBackend::new(&spec.tracking.dir);
    let mut tracker = ExperimentTracker::new(spec.experiment.clone(), backend);

    let summary = pipeline::run(&spec, &mut tracker).map_err(|e| format!("Search failed: {e}"))?;

    log(level, LogLevel::Normal, &summary.to_string());
    log(
        level,
        LogLevel::Normal,
        &format!("Run recorded under {}", spec.tracking.dir.display()),
    );

    Ok(())
}
