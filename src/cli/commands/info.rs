//! Info command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{InfoArgs, OutputFormat, TuneSpec};

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let spec = TuneSpec::load_or_default(args.spec.as_deref())
        .map_err(|e| format!("Specification error: {e}"))?;

    let rendered = match args.format {
        OutputFormat::Text => render_text(&spec),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&spec).map_err(|e| format!("JSON error: {e}"))?
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(&spec).map_err(|e| format!("YAML error: {e}"))?
        }
    };

    log(level, LogLevel::Normal, &rendered);
    Ok(())
}

fn render_text(spec: &TuneSpec) -> String {
    let n_configs: usize = spec
        .search
        .grid
        .0
        .iter()
        .map(|(_, values)| values.len())
        .product();
    format!(
        "Experiment: {}\nData: {} (label {:?})\nFolds: {} | Seed: {} | Scoring: {}\nConfigurations: {}\nTracking: {}",
        spec.experiment,
        spec.data.dir.display(),
        spec.data.label_column,
        spec.search.folds,
        spec.search.seed,
        spec.search.scoring,
        n_configs,
        spec.tracking.dir.display(),
    )
}
