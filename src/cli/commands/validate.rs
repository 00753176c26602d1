//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{TuneSpec, ValidateArgs};

/// Format the data section as a string
pub fn format_data_info(spec: &TuneSpec) -> String {
    format!(
        "  Data directory: {}\n  Label column: {}",
        spec.data.dir.display(),
        spec.data.label_column
    )
}

/// Format the search section as a string
pub fn format_search_info(spec: &TuneSpec) -> String {
    let mut lines = vec![
        format!("  Folds: {}", spec.search.folds),
        format!("  Seed: {}", spec.search.seed),
        format!("  Scoring: {}", spec.search.scoring),
    ];
    let n_configs: usize = spec
        .search
        .grid
        .0
        .iter()
        .map(|(_, values)| values.len())
        .product();
    lines.push(format!("  Grid ({n_configs} configurations):"));
    for (name, values) in &spec.search.grid.0 {
        let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
        lines.push(format!("    {name}: [{}]", rendered.join(", ")));
    }
    lines.join("\n")
}

/// Format the tracking section as a string
pub fn format_tracking_info(spec: &TuneSpec) -> String {
    format!("  Tracking directory: {}", spec.tracking.dir.display())
}

/// Print detailed specification summary
pub fn print_detailed_summary(spec: &TuneSpec) {
    println!();
    println!("Specification Summary:");
    println!("{}", format_data_info(spec));
    println!();
    println!("{}", format_search_info(spec));
    println!();
    println!("{}", format_tracking_info(spec));
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating specification: {}", args.spec.display()),
    );

    let spec = TuneSpec::load(&args.spec).map_err(|e| format!("Specification error: {e}"))?;

    spec.validate()
        .map_err(|e| format!("Validation failed: {e}"))?;

    if !spec.data.dir.is_dir() {
        return Err(format!(
            "Validation failed: data directory not found: {}",
            spec.data.dir.display()
        ));
    }

    log(level, LogLevel::Normal, "Specification is valid");

    if args.detailed {
        print_detailed_summary(&spec);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_spec() -> TuneSpec {
        serde_yaml::from_str(
            "experiment: sentiment-svc\ndata:\n  dir: /data\nsearch:\n  folds: 3\n",
        )
        .expect("parse")
    }

    #[test]
    fn test_format_data_info() {
        let info = format_data_info(&make_test_spec());
        assert!(info.contains("/data"));
        assert!(info.contains("sentiment"));
    }

    #[test]
    fn test_format_search_info() {
        let info = format_search_info(&make_test_spec());
        assert!(info.contains("Folds: 3"));
        assert!(info.contains("Seed: 42"));
        // The stock grid: 6 C values, 2 class weights, 1 iteration cap.
        assert!(info.contains("12 configurations"));
        assert!(info.contains("class_weight: [none, balanced]"));
    }

    #[test]
    fn test_format_tracking_info() {
        let info = format_tracking_info(&make_test_spec());
        assert!(info.contains("runs"));
    }
}
