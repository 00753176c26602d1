//! Tuning specification
//!
//! YAML schema describing one search pipeline execution: where the data
//! lives, the hyperparameter grid, the cross-validation setup, and where
//! runs are recorded.
//!
//! # Example
//!
//! ```yaml
//! experiment: sentiment-svc
//! data:
//!   dir: data/
//!   label_column: sentiment
//! search:
//!   folds: 3
//!   seed: 42
//!   scoring: f1_macro
//!   grid:
//!     C: [0.001, 0.01, 0.1, 0.5, 1.0, 5.0]
//!     class_weight: [none, balanced]
//!     max_iter: [5000]
//! tracking:
//!   dir: runs
//! ```

mod cli;

pub use cli::{
    apply_overrides, parse_args, Cli, Command, InfoArgs, OutputFormat, TuneArgs, ValidateArgs,
};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::eval::Scoring;
use crate::search::{ParamValue, SearchSpace};

/// Top-level tuning specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuneSpec {
    /// Experiment name recorded with every run.
    #[serde(default = "default_experiment")]
    pub experiment: String,
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub tracking: TrackingSection,
}

impl Default for TuneSpec {
    fn default() -> Self {
        Self {
            experiment: default_experiment(),
            data: DataSection::default(),
            search: SearchSection::default(),
            tracking: TrackingSection::default(),
        }
    }
}

fn default_experiment() -> String {
    "default".to_string()
}

/// Dataset location and label schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSection {
    /// Directory containing `train_data.csv` and `test_data.csv`.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_label_column")]
    pub label_column: String,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            label_column: default_label_column(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_label_column() -> String {
    "sentiment".to_string()
}

/// Grid search and cross-validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    #[serde(default = "default_folds")]
    pub folds: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub scoring: Scoring,
    #[serde(default = "GridSpec::baseline")]
    pub grid: GridSpec,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            folds: default_folds(),
            seed: default_seed(),
            scoring: Scoring::default(),
            grid: GridSpec::baseline(),
        }
    }
}

fn default_folds() -> usize {
    3
}

fn default_seed() -> u64 {
    42
}

/// Where run records and artifacts are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSection {
    #[serde(default = "default_tracking_dir")]
    pub dir: PathBuf,
}

impl Default for TrackingSection {
    fn default() -> Self {
        Self {
            dir: default_tracking_dir(),
        }
    }
}

fn default_tracking_dir() -> PathBuf {
    PathBuf::from("runs")
}

/// The hyperparameter grid, preserving declaration order.
///
/// Axis order matters: it fixes the enumeration order of configurations
/// and therefore which candidate wins a tie. A plain map would lose it,
/// so the grid keeps its axes as an ordered list.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec(pub Vec<(String, Vec<ParamValue>)>);

impl GridSpec {
    /// The stock sentiment grid: 12 configurations.
    pub fn baseline() -> Self {
        Self(vec![
            (
                "C".to_string(),
                [0.001, 0.01, 0.1, 0.5, 1.0, 5.0]
                    .iter()
                    .map(|&c| ParamValue::Float(c))
                    .collect(),
            ),
            (
                "class_weight".to_string(),
                vec![
                    ParamValue::Categorical("none".to_string()),
                    ParamValue::Categorical("balanced".to_string()),
                ],
            ),
            ("max_iter".to_string(), vec![ParamValue::Int(5000)]),
        ])
    }
}

impl Serialize for GridSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, values) in &self.0 {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for GridSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct GridVisitor;

        impl<'de> Visitor<'de> for GridVisitor {
            type Value = GridSpec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter names to value lists")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut axes = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, values)) =
                    access.next_entry::<String, Vec<ParamValue>>()?
                {
                    axes.push((name, values));
                }
                Ok(GridSpec(axes))
            }
        }

        deserializer.deserialize_map(GridVisitor)
    }
}

impl TuneSpec {
    /// Load and validate a specification from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::DatasetNotFound(path.to_path_buf()));
        }
        let yaml = fs::read_to_string(path)?;
        let spec: Self = serde_yaml::from_str(&yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load a specification, or fall back to the defaults when no file was
    /// given. The spec file is optional: every field has a default.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Check structural constraints before any data is touched.
    pub fn validate(&self) -> Result<()> {
        if self.experiment.trim().is_empty() {
            return Err(Error::InvalidSearchSpace(
                "experiment name must not be empty".to_string(),
            ));
        }
        if self.search.folds < 2 {
            return Err(Error::Stratification(format!(
                "need at least 2 folds, got {}",
                self.search.folds
            )));
        }
        self.to_search_space()?.validate()?;
        Ok(())
    }

    /// Build the search space in declared axis order.
    pub fn to_search_space(&self) -> Result<SearchSpace> {
        let mut space = SearchSpace::new();
        for (name, values) in &self.search.grid.0 {
            space.add(name, values.clone());
        }
        space.validate()?;
        Ok(space)
    }
}
