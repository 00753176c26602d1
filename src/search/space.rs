//! Search space and configuration enumeration

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A concrete hyperparameter value.
///
/// Untagged so YAML/JSON scalars map directly: integers become `Int`, other
/// numbers `Float`, everything else `Categorical`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Categorical(String),
}

impl ParamValue {
    /// Get as float (converts int to float if needed)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Categorical(_) => None,
        }
    }

    /// Get as int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(_) | ParamValue::Categorical(_) => None,
        }
    }

    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Categorical(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Categorical(s) => write!(f, "{s}"),
        }
    }
}

/// One point of the grid: an immutable name → value mapping, one entry per
/// axis, in axis declaration order. Compared by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    values: Vec<(String, ParamValue)>,
}

impl Configuration {
    pub(crate) fn new(values: Vec<(String, ParamValue)>) -> Self {
        Self { values }
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate parameters in axis order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.values {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Ordered hyperparameter axes; enumeration order is declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    axes: Vec<(String, Vec<ParamValue>)>,
}

impl SearchSpace {
    /// Create an empty search space
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an axis. Later axes vary fastest during enumeration.
    pub fn add(&mut self, name: impl Into<String>, candidates: Vec<ParamValue>) {
        self.axes.push((name.into(), candidates));
    }

    /// Number of axes.
    pub fn n_axes(&self) -> usize {
        self.axes.len()
    }

    /// Total configuration count: the product of axis cardinalities.
    pub fn len(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes.iter().map(|(_, c)| c.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate axes in declaration order.
    pub fn axes(&self) -> impl Iterator<Item = (&str, &[ParamValue])> {
        self.axes.iter().map(|(n, c)| (n.as_str(), c.as_slice()))
    }

    /// Check the space is enumerable: at least one axis, no empty axis.
    pub fn validate(&self) -> Result<()> {
        if self.axes.is_empty() {
            return Err(Error::EmptySearchSpace);
        }
        for (name, candidates) in &self.axes {
            if candidates.is_empty() {
                return Err(Error::InvalidSearchSpace(format!(
                    "axis {name:?} has no candidates"
                )));
            }
        }
        Ok(())
    }

    /// Lazily enumerate the Cartesian product of all axes.
    ///
    /// Deterministic: axes in declaration order, candidates in declared
    /// positional order, with the last axis varying fastest. Restartable —
    /// each call yields a fresh iterator over the same sequence.
    pub fn configurations(&self) -> Result<ConfigurationIter<'_>> {
        self.validate()?;
        Ok(ConfigurationIter {
            space: self,
            cursor: vec![0; self.axes.len()],
            done: false,
        })
    }
}

/// Lazy odometer over the grid; see [`SearchSpace::configurations`].
#[derive(Debug, Clone)]
pub struct ConfigurationIter<'a> {
    space: &'a SearchSpace,
    cursor: Vec<usize>,
    done: bool,
}

impl Iterator for ConfigurationIter<'_> {
    type Item = Configuration;

    fn next(&mut self) -> Option<Configuration> {
        if self.done {
            return None;
        }

        let values = self
            .space
            .axes
            .iter()
            .zip(self.cursor.iter())
            .map(|((name, candidates), &i)| (name.clone(), candidates[i].clone()))
            .collect();

        // Advance the odometer, last axis fastest.
        self.done = true;
        for (pos, (_, candidates)) in self.cursor.iter_mut().zip(self.space.axes.iter()).rev() {
            *pos += 1;
            if *pos < candidates.len() {
                self.done = false;
                break;
            }
            *pos = 0;
        }

        Some(Configuration::new(values))
    }
}
