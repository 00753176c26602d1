//! Classification metrics and test-set evaluation
//!
//! Provides the confusion matrix, macro-averaged precision/recall/F1, the
//! injectable [`Scoring`] criterion used during cross-validation, and the
//! held-out [`evaluate`] step producing an [`EvaluationReport`].
//!
//! Zero-division convention: a class with no predicted instances has
//! precision 0.0, a class with no true instances has recall 0.0, and a
//! class with both zero has F1 0.0. Macro averages are unweighted means
//! over all classes in the class table, so absent classes drag the average
//! down rather than being skipped.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::LabeledDataset;
use crate::error::{Error, Result};
use crate::model::Estimator;

/// Confusion matrix over encoded labels.
///
/// Element `[i][j]` counts samples with true label `i` predicted as `j`.
/// The class count is fixed up front so folds that happen to miss a class
/// still produce metrics over the full class table.
#[derive(Clone, Debug)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    n_classes: usize,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self {
            matrix: vec![vec![0; n_classes]; n_classes],
            n_classes,
        }
    }

    /// Tally predictions against ground truth.
    ///
    /// Fails with `SchemaMismatch` if lengths differ or a label is out of
    /// range for the declared class count.
    pub fn from_predictions(y_pred: &[usize], y_true: &[usize], n_classes: usize) -> Result<Self> {
        if y_pred.len() != y_true.len() {
            return Err(Error::SchemaMismatch(format!(
                "{} predictions but {} labels",
                y_pred.len(),
                y_true.len()
            )));
        }
        let mut cm = Self::new(n_classes);
        for (&pred, &truth) in y_pred.iter().zip(y_true.iter()) {
            if pred >= n_classes || truth >= n_classes {
                return Err(Error::SchemaMismatch(format!(
                    "label ({truth}, {pred}) out of range for {n_classes} classes"
                )));
            }
            cm.matrix[truth][pred] += 1;
        }
        Ok(cm)
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Count at `[true_label][predicted_label]`.
    pub fn get(&self, true_label: usize, predicted_label: usize) -> usize {
        self.matrix[true_label][predicted_label]
    }

    pub fn true_positives(&self, class: usize) -> usize {
        self.matrix[class][class]
    }

    /// Predicted as `class` but true label differs.
    pub fn false_positives(&self, class: usize) -> usize {
        (0..self.n_classes)
            .filter(|&i| i != class)
            .map(|i| self.matrix[i][class])
            .sum()
    }

    /// True label is `class` but predicted differently.
    pub fn false_negatives(&self, class: usize) -> usize {
        (0..self.n_classes)
            .filter(|&j| j != class)
            .map(|j| self.matrix[class][j])
            .sum()
    }

    /// Total true instances of a class.
    pub fn support(&self, class: usize) -> usize {
        self.matrix[class].iter().sum()
    }

    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Exact-match rate.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.n_classes).map(|i| self.matrix[i][i]).sum();
        correct as f64 / total as f64
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Confusion Matrix:")?;
        write!(f, "      ")?;
        for j in 0..self.n_classes {
            write!(f, "Pred {j} ")?;
        }
        writeln!(f)?;
        for i in 0..self.n_classes {
            write!(f, "True {i}")?;
            for j in 0..self.n_classes {
                write!(f, "{:>6} ", self.matrix[i][j])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Per-class precision/recall/F1 with macro averaging.
#[derive(Clone, Debug)]
pub struct MultiClassMetrics {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub f1: Vec<f64>,
    pub support: Vec<usize>,
}

impl MultiClassMetrics {
    pub fn from_confusion_matrix(cm: &ConfusionMatrix) -> Self {
        let n_classes = cm.n_classes();
        let mut precision = Vec::with_capacity(n_classes);
        let mut recall = Vec::with_capacity(n_classes);
        let mut f1 = Vec::with_capacity(n_classes);
        let mut support = Vec::with_capacity(n_classes);

        for class in 0..n_classes {
            let tp = cm.true_positives(class) as f64;
            let fp = cm.false_positives(class) as f64;
            let fn_ = cm.false_negatives(class) as f64;

            // Zero-division convention: undefined per-class metrics are 0.0.
            let p = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
            let r = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
            let f = if p + r > 0.0 {
                2.0 * p * r / (p + r)
            } else {
                0.0
            };

            precision.push(p);
            recall.push(r);
            f1.push(f);
            support.push(cm.support(class));
        }

        Self {
            precision,
            recall,
            f1,
            support,
        }
    }

    /// Unweighted mean across classes.
    pub fn precision_macro(&self) -> f64 {
        macro_mean(&self.precision)
    }

    pub fn recall_macro(&self) -> f64 {
        macro_mean(&self.recall)
    }

    pub fn f1_macro(&self) -> f64 {
        macro_mean(&self.f1)
    }
}

fn macro_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Scalar scoring criterion injected into cross-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    Accuracy,
    #[default]
    F1Macro,
    PrecisionMacro,
    RecallMacro,
}

impl Scoring {
    /// Metric name as recorded with the run.
    pub fn name(&self) -> &'static str {
        match self {
            Scoring::Accuracy => "accuracy",
            Scoring::F1Macro => "f1_macro",
            Scoring::PrecisionMacro => "precision_macro",
            Scoring::RecallMacro => "recall_macro",
        }
    }

    /// Score predictions against ground truth over a fixed class table.
    pub fn score(&self, y_pred: &[usize], y_true: &[usize], n_classes: usize) -> Result<f64> {
        let cm = ConfusionMatrix::from_predictions(y_pred, y_true, n_classes)?;
        let value = match self {
            Scoring::Accuracy => cm.accuracy(),
            Scoring::F1Macro => MultiClassMetrics::from_confusion_matrix(&cm).f1_macro(),
            Scoring::PrecisionMacro => {
                MultiClassMetrics::from_confusion_matrix(&cm).precision_macro()
            }
            Scoring::RecallMacro => MultiClassMetrics::from_confusion_matrix(&cm).recall_macro(),
        };
        Ok(value)
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four headline test metrics plus the predictions that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub precision_macro: f64,
    pub recall_macro: f64,
    pub f1_macro: f64,
    #[serde(skip)]
    pub predictions: Vec<usize>,
}

/// Score a fitted model against held-out data.
///
/// Predictions are computed once; all four metrics derive from them.
pub fn evaluate<M: Estimator>(model: &M, test: &LabeledDataset) -> Result<EvaluationReport> {
    let predictions = model.predict(test.features())?;
    let cm = ConfusionMatrix::from_predictions(&predictions, test.labels(), test.n_classes())?;
    let metrics = MultiClassMetrics::from_confusion_matrix(&cm);

    Ok(EvaluationReport {
        accuracy: cm.accuracy(),
        precision_macro: metrics.precision_macro(),
        recall_macro: metrics.recall_macro(),
        f1_macro: metrics.f1_macro(),
        predictions,
    })
}
