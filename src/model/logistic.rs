//! Multinomial logistic regression

use super::{FittedModel, ModelSnapshot, Trainer};
use crate::dataset::Dataset;
use crate::{Error, Result};
use linfa::prelude::*;
use linfa::DatasetBase;
use linfa_logistic::{MultiFittedLogisticRegression, MultiLogisticRegression};
use ndarray::{Array1, ArrayView2};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Solver iteration cap used when none is configured.
pub const DEFAULT_MAX_ITERATIONS: u64 = 200;

/// L2-regularized multinomial logistic regression trainer.
///
/// `c` is the inverse regularization strength: smaller values regularize
/// more. It is passed to the solver as the penalty `alpha = 1 / c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticClassifier {
    c: f64,
    max_iterations: u64,
}

impl LogisticClassifier {
    /// Create a trainer with the given inverse regularization strength.
    #[must_use]
    pub const fn new(c: f64) -> Self {
        Self {
            c,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set the solver iteration cap.
    #[must_use]
    pub const fn max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Inverse regularization strength.
    #[must_use]
    pub const fn c(&self) -> f64 {
        self.c
    }
}

impl Trainer for LogisticClassifier {
    type Target = usize;

    fn fit(&self, data: &Dataset<usize>) -> Result<FittedModel> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(Error::Training(format!(
                "regularization strength C must be positive and finite, got {}",
                self.c
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::Training("max_iterations must be at least 1".to_string()));
        }
        if data.is_empty() {
            return Err(Error::Training("cannot fit on an empty dataset".to_string()));
        }

        let classes: Vec<usize> = data
            .labels()
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if classes.len() < 2 {
            return Err(Error::Training(format!(
                "classification needs at least two classes, got {}",
                classes.len()
            )));
        }

        let train = DatasetBase::new(data.features().to_owned(), data.labels().clone());
        let inner = MultiLogisticRegression::default()
            .alpha(1.0 / self.c)
            .max_iterations(self.max_iterations)
            .fit(&train)
            .map_err(|e| Error::Training(format!("logistic regression failed to fit: {e}")))?;

        debug!(
            c = self.c,
            max_iterations = self.max_iterations,
            classes = classes.len(),
            rows = data.n_rows(),
            "fitted logistic regression"
        );

        Ok(FittedModel::Classifier(FittedClassifier {
            inner,
            classes,
            c: self.c,
            max_iterations: self.max_iterations,
        }))
    }
}

/// Fitted multinomial logistic regression.
pub struct FittedClassifier {
    inner: MultiFittedLogisticRegression<f64, usize>,
    classes: Vec<usize>,
    c: f64,
    max_iterations: u64,
}

impl FittedClassifier {
    /// Number of input features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.inner.params().nrows()
    }

    /// Class labels seen during training, ascending.
    #[must_use]
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    pub(super) fn predict(&self, features: ArrayView2<'_, f64>) -> Array1<usize> {
        self.inner.predict(&features)
    }

    pub(super) fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot::Classifier {
            c: self.c,
            max_iterations: self.max_iterations,
            classes: self.classes.clone(),
            coefficients: self
                .inner
                .params()
                .outer_iter()
                .map(|row| row.to_vec())
                .collect(),
            intercepts: self.inner.intercept().to_vec(),
        }
    }
}

impl fmt::Debug for FittedClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FittedClassifier")
            .field("c", &self.c)
            .field("max_iterations", &self.max_iterations)
            .field("classes", &self.classes)
            .field("n_features", &self.n_features())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Predictions;
    use ndarray::array;

    fn separable() -> Dataset<usize> {
        Dataset::new(
            array![
                [0.0, 0.1],
                [0.2, 0.0],
                [0.1, 0.3],
                [5.0, 5.1],
                [5.2, 4.9],
                [4.8, 5.0],
                [0.0, 9.0],
                [0.3, 9.2],
                [0.1, 8.8]
            ],
            array![0, 0, 0, 1, 1, 1, 2, 2, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_fit_and_predict_separable() {
        let data = separable();
        let model = LogisticClassifier::new(10.0).fit(&data).unwrap();
        let Predictions::Labels(labels) = model.predict(data.features()).unwrap() else {
            panic!("classifier must predict labels");
        };
        assert_eq!(&labels, data.labels());
    }

    #[test]
    fn test_rejects_non_positive_c() {
        for c in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let result = LogisticClassifier::new(c).fit(&separable());
            assert!(matches!(result, Err(Error::Training(_))), "C = {c}");
        }
    }

    #[test]
    fn test_rejects_single_class() {
        let data = Dataset::new(array![[0.0], [1.0]], array![4, 4]).unwrap();
        let result = LogisticClassifier::new(1.0).fit(&data);
        assert!(matches!(result, Err(Error::Training(msg)) if msg.contains("two classes")));
    }

    #[test]
    fn test_snapshot_shape() {
        let model = LogisticClassifier::new(0.5)
            .max_iterations(50)
            .fit(&separable())
            .unwrap();
        match model.snapshot() {
            ModelSnapshot::Classifier {
                c,
                max_iterations,
                classes,
                coefficients,
                intercepts,
            } => {
                assert!((c - 0.5).abs() < f64::EPSILON);
                assert_eq!(max_iterations, 50);
                assert_eq!(classes, vec![0, 1, 2]);
                assert_eq!(coefficients.len(), 2);
                assert!(coefficients.iter().all(|row| row.len() == 3));
                assert_eq!(intercepts.len(), 3);
            }
            ModelSnapshot::Regressor { .. } => panic!("expected classifier snapshot"),
        }
    }
}
