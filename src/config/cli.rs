//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! afinar tune tune.yaml
//! afinar tune tune.yaml --folds 5 --seed 7
//! afinar validate tune.yaml
//! afinar info tune.yaml --format json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use super::TuneSpec;

/// Afinar: hyperparameter search and evaluation
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "afinar")]
#[command(author = "PAIML")]
#[command(version)]
#[command(about = "Reproducible grid search with stratified cross-validation and run tracking")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a grid search from a YAML specification
    Tune(TuneArgs),

    /// Validate a specification file without searching
    Validate(ValidateArgs),

    /// Display information about a specification
    Info(InfoArgs),
}

/// Arguments for the tune command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TuneArgs {
    /// Path to YAML specification file (defaults apply when omitted)
    #[arg(value_name = "SPEC")]
    pub spec: Option<PathBuf>,

    /// Override the experiment name
    #[arg(short, long)]
    pub experiment: Option<String>,

    /// Override the data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Override the number of cross-validation folds
    #[arg(short, long)]
    pub folds: Option<usize>,

    /// Override the shuffle and training seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override where run records are written
    #[arg(short, long)]
    pub tracking_dir: Option<PathBuf>,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML specification file
    #[arg(value_name = "SPEC")]
    pub spec: PathBuf,

    /// Show detailed specification summary
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to YAML specification file (defaults apply when omitted)
    #[arg(value_name = "SPEC")]
    pub spec: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for the info command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a TuneSpec
pub fn apply_overrides(spec: &mut TuneSpec, args: &TuneArgs) {
    if let Some(experiment) = &args.experiment {
        spec.experiment = experiment.clone();
    }
    if let Some(data_dir) = &args.data_dir {
        spec.data.dir = data_dir.clone();
    }
    if let Some(folds) = args.folds {
        spec.search.folds = folds;
    }
    if let Some(seed) = args.seed {
        spec.search.seed = seed;
    }
    if let Some(tracking_dir) = &args.tracking_dir {
        spec.tracking.dir = tracking_dir.clone();
    }
}
