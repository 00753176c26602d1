//! Afinar CLI
//!
//! Hyperparameter search entry point.
//!
//! # Usage
//!
//! ```bash
//! # Run a grid search from a specification
//! afinar tune tune.yaml
//!
//! # Run with overrides
//! afinar tune tune.yaml --folds 5 --seed 7
//!
//! # Validate a specification
//! afinar validate tune.yaml
//!
//! # Show specification info
//! afinar info tune.yaml --format json
//! ```

use afinar::cli::{run_command, Cli};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
