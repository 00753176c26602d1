//! Linear support vector classifier
//!
//! One-vs-rest linear SVM trained by seeded subgradient descent on the
//! hinge objective (Pegasos-style schedule). Deterministic for a fixed
//! seed, so cross-validation trials are reproducible.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{Estimator, EstimatorBuilder};
use crate::error::{Error, Result};
use crate::search::Configuration;

/// Class weighting scheme for the hinge loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeight {
    /// Every sample weighs 1.0
    #[default]
    None,
    /// Inversely proportional to class frequency in the training data
    Balanced,
}

/// Fitted weights, one hyperplane per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SvcState {
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
    n_features: usize,
}

/// One-vs-rest linear SVM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvc {
    c: f64,
    max_iter: usize,
    class_weight: ClassWeight,
    seed: u64,
    state: Option<SvcState>,
}

impl LinearSvc {
    pub fn new(c: f64, max_iter: usize, class_weight: ClassWeight, seed: u64) -> Self {
        Self {
            c,
            max_iter,
            class_weight,
            seed,
            state: None,
        }
    }

    /// Regularization strength (inverse, as in the usual C parameterization).
    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn class_weight(&self) -> ClassWeight {
        self.class_weight
    }

    /// Train one binary hyperplane: class `k` vs rest.
    fn fit_binary(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        k: usize,
        sample_weights: &[f64],
        rng: &mut StdRng,
    ) -> (Array1<f64>, f64) {
        let n = x.nrows();
        let lambda = 1.0 / (self.c * n as f64);

        let mut w = Array1::<f64>::zeros(x.ncols());
        let mut b = 0.0;
        let mut order: Vec<usize> = (0..n).collect();
        let mut t: u64 = 1;

        for _ in 0..self.max_iter {
            order.shuffle(rng);
            for &i in &order {
                let eta = 1.0 / (lambda * t as f64);
                let target = if y[i] == k { 1.0 } else { -1.0 };
                let margin = target * (w.dot(&x.row(i)) + b);

                w *= 1.0 - eta * lambda;
                if margin < 1.0 {
                    let step = eta * sample_weights[i] * target;
                    w.scaled_add(step, &x.row(i));
                    b += step;
                }
                t += 1;
            }
        }

        (w, b)
    }
}

impl Estimator for LinearSvc {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(Error::InvalidParameter(format!(
                "cannot fit on {} rows with {} labels",
                x.nrows(),
                y.len()
            )));
        }

        let n_classes = y.iter().max().map_or(0, |&m| m + 1);
        let mut counts = vec![0usize; n_classes];
        for &label in y {
            counts[label] += 1;
        }
        if counts.iter().filter(|&&c| c > 0).count() < 2 {
            return Err(Error::InvalidParameter(
                "training data contains a single class".to_string(),
            ));
        }

        let n = x.nrows() as f64;
        let mut weights = Vec::with_capacity(n_classes);
        let mut biases = Vec::with_capacity(n_classes);

        for k in 0..n_classes {
            if counts[k] == 0 {
                // Class id never observed in this slice: sink the bias so
                // argmax never selects it over a trained class. f64::MIN
                // rather than -inf keeps the state JSON-serializable.
                weights.push(vec![0.0; x.ncols()]);
                biases.push(f64::MIN);
                continue;
            }

            let n_pos = counts[k] as f64;
            let n_neg = n - n_pos;
            let sample_weights: Vec<f64> = match self.class_weight {
                ClassWeight::None => vec![1.0; x.nrows()],
                ClassWeight::Balanced => y
                    .iter()
                    .map(|&label| {
                        if label == k {
                            n / (2.0 * n_pos)
                        } else {
                            n / (2.0 * n_neg)
                        }
                    })
                    .collect(),
            };

            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(k as u64));
            let (w, b) = self.fit_binary(x, y, k, &sample_weights, &mut rng);
            weights.push(w.to_vec());
            biases.push(b);
        }

        self.state = Some(SvcState {
            weights,
            biases,
            n_features: x.ncols(),
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("predict called before fit".to_string()))?;
        if x.ncols() != state.n_features {
            return Err(Error::SchemaMismatch(format!(
                "model fitted on {} features, got {}",
                state.n_features,
                x.ncols()
            )));
        }

        let predictions = x
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                let mut best_score = f64::NEG_INFINITY;
                for (k, (w, &b)) in state.weights.iter().zip(state.biases.iter()).enumerate() {
                    let score: f64 =
                        w.iter().zip(row.iter()).map(|(wi, xi)| wi * xi).sum::<f64>() + b;
                    // Strictly greater: ties resolve to the lowest class id.
                    if score > best_score {
                        best_score = score;
                        best = k;
                    }
                }
                best
            })
            .collect();
        Ok(predictions)
    }
}

/// Maps a [`Configuration`] onto a fresh [`LinearSvc`].
///
/// Recognized parameters: `C` (float), `max_iter` (int > 0), `class_weight`
/// (`none` | `balanced`). Anything else is an `InvalidParameter`.
#[derive(Debug, Clone)]
pub struct SvcBuilder {
    seed: u64,
}

impl SvcBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for SvcBuilder {
    fn default() -> Self {
        Self::new(42)
    }
}

impl EstimatorBuilder for SvcBuilder {
    type Model = LinearSvc;

    fn build(&self, config: &Configuration) -> Result<LinearSvc> {
        let mut c = 1.0;
        let mut max_iter = 1000usize;
        let mut class_weight = ClassWeight::None;

        for (name, value) in config.iter() {
            match name {
                "C" => {
                    c = value.as_float().ok_or_else(|| {
                        Error::InvalidParameter(format!("C must be numeric, got {value}"))
                    })?;
                    if c <= 0.0 {
                        return Err(Error::InvalidParameter(format!(
                            "C must be positive, got {c}"
                        )));
                    }
                }
                "max_iter" => {
                    let iters = value.as_int().ok_or_else(|| {
                        Error::InvalidParameter(format!("max_iter must be an integer, got {value}"))
                    })?;
                    if iters <= 0 {
                        return Err(Error::InvalidParameter(format!(
                            "max_iter must be positive, got {iters}"
                        )));
                    }
                    max_iter = iters as usize;
                }
                "class_weight" => {
                    class_weight = match value.as_str() {
                        Some("none") => ClassWeight::None,
                        Some("balanced") => ClassWeight::Balanced,
                        _ => {
                            return Err(Error::InvalidParameter(format!(
                                "class_weight must be 'none' or 'balanced', got {value}"
                            )))
                        }
                    };
                }
                other => {
                    return Err(Error::InvalidParameter(format!(
                        "unknown LinearSvc parameter {other:?}"
                    )));
                }
            }
        }

        Ok(LinearSvc::new(c, max_iter, class_weight, self.seed))
    }

    fn family(&self) -> &str {
        "LinearSvc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{ParamValue, SearchSpace};
    use ndarray::array;

    fn separable() -> (Array2<f64>, Vec<usize>) {
        // Class 0 clusters around (-2, -2), class 1 around (+2, +2).
        let x = array![
            [-2.0, -2.1],
            [-1.8, -2.3],
            [-2.2, -1.9],
            [-2.5, -2.0],
            [2.0, 2.1],
            [1.8, 2.3],
            [2.2, 1.9],
            [2.5, 2.0],
        ];
        let y = vec![0, 0, 0, 0, 1, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn test_fit_predict_separable() {
        let (x, y) = separable();
        let mut model = LinearSvc::new(1.0, 100, ClassWeight::None, 42);
        model.fit(&x, &y).expect("fit");

        let preds = model.predict(&x).expect("predict");
        assert_eq!(preds, y);
    }

    #[test]
    fn test_fit_deterministic() {
        let (x, y) = separable();
        let mut a = LinearSvc::new(0.5, 50, ClassWeight::Balanced, 7);
        let mut b = LinearSvc::new(0.5, 50, ClassWeight::Balanced, 7);
        a.fit(&x, &y).expect("fit a");
        b.fit(&x, &y).expect("fit b");

        assert_eq!(a.predict(&x).expect("a"), b.predict(&x).expect("b"));
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let mut model = LinearSvc::new(1.0, 10, ClassWeight::None, 42);
        let err = model.fit(&x, &[0, 0]).unwrap_err();
        match err {
            Error::InvalidParameter(msg) => assert!(msg.contains("single class")),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_predict_before_fit_rejected() {
        let model = LinearSvc::new(1.0, 10, ClassWeight::None, 42);
        let err = model.predict(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_predict_feature_width_checked() {
        let (x, y) = separable();
        let mut model = LinearSvc::new(1.0, 20, ClassWeight::None, 42);
        model.fit(&x, &y).expect("fit");

        let err = model.predict(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn test_fitted_model_serializes() {
        let (x, y) = separable();
        let mut model = LinearSvc::new(1.0, 20, ClassWeight::None, 42);
        model.fit(&x, &y).expect("fit");

        let json = serde_json::to_string(&model).expect("serialize");
        let restored: LinearSvc = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(
            model.predict(&x).expect("original"),
            restored.predict(&x).expect("restored")
        );
    }

    fn config_of(entries: &[(&str, ParamValue)]) -> Configuration {
        let mut space = SearchSpace::new();
        for (name, value) in entries {
            space.add(*name, vec![value.clone()]);
        }
        space
            .configurations()
            .expect("valid space")
            .next()
            .expect("one config")
    }

    #[test]
    fn test_builder_maps_parameters() {
        let config = config_of(&[
            ("C", ParamValue::Float(0.5)),
            ("max_iter", ParamValue::Int(250)),
            ("class_weight", ParamValue::Categorical("balanced".into())),
        ]);

        let model = SvcBuilder::default().build(&config).expect("build");
        assert_eq!(model.c(), 0.5);
        assert_eq!(model.max_iter(), 250);
        assert_eq!(model.class_weight(), ClassWeight::Balanced);
    }

    #[test]
    fn test_builder_rejects_unknown_parameter() {
        let config = config_of(&[("gamma", ParamValue::Float(0.1))]);
        let err = SvcBuilder::default().build(&config).unwrap_err();
        match err {
            Error::InvalidParameter(msg) => assert!(msg.contains("gamma")),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_builder_rejects_mistyped_values() {
        let config = config_of(&[("C", ParamValue::Categorical("high".into()))]);
        assert!(SvcBuilder::default().build(&config).is_err());

        let config = config_of(&[("max_iter", ParamValue::Float(1.5))]);
        assert!(SvcBuilder::default().build(&config).is_err());

        let config = config_of(&[("C", ParamValue::Float(-1.0))]);
        assert!(SvcBuilder::default().build(&config).is_err());
    }
}
