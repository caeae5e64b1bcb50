//! Trainable model families
//!
//! The model space is a closed set of two variants, each with the same
//! capabilities: a trainer that fits a [`FittedModel`] from a [`Dataset`], and
//! prediction over a feature matrix. Fitting itself is delegated to linfa.
//!
//! ```text
//! LogisticClassifier ──fit──> FittedModel::Classifier ──predict──> Labels
//! LinearRegressor    ──fit──> FittedModel::Regressor  ──predict──> Values
//! ```

mod linear;
mod logistic;

pub use linear::{FittedRegressor, LinearRegressor};
pub use logistic::{FittedClassifier, LogisticClassifier, DEFAULT_MAX_ITERATIONS};

use crate::dataset::Dataset;
use crate::{Error, Result};
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Multiclass classifier producing integer class labels.
    Classifier,
    /// Regressor producing one real value per row.
    Regressor,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classifier => f.write_str("classifier"),
            Self::Regressor => f.write_str("regressor"),
        }
    }
}

/// A configured, not yet fitted, model.
pub trait Trainer {
    /// Label type of the training data.
    type Target;

    /// Fit a model on the given dataset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Training`] if the trainer rejects the data or its own
    /// hyperparameters.
    fn fit(&self, data: &Dataset<Self::Target>) -> Result<FittedModel>;
}

/// Output of [`FittedModel::predict`].
#[derive(Debug, Clone, PartialEq)]
pub enum Predictions {
    /// Class labels, one per row.
    Labels(Array1<usize>),
    /// Regression values, one per row.
    Values(Array1<f64>),
}

impl Predictions {
    /// Number of predicted rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Labels(labels) => labels.len(),
            Self::Values(values) => values.len(),
        }
    }

    /// Check if no rows were predicted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fitted model of either family.
#[derive(Debug)]
pub enum FittedModel {
    /// Fitted multiclass classifier.
    Classifier(FittedClassifier),
    /// Fitted linear regressor.
    Regressor(FittedRegressor),
}

impl FittedModel {
    /// Model family.
    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        match self {
            Self::Classifier(_) => ModelKind::Classifier,
            Self::Regressor(_) => ModelKind::Regressor,
        }
    }

    /// Number of input features the model was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        match self {
            Self::Classifier(model) => model.n_features(),
            Self::Regressor(model) => model.n_features(),
        }
    }

    /// Predict one output per row of `features`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Training`] if the number of columns differs from the
    /// number of features the model was trained on.
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Predictions> {
        check_features(self.n_features(), features)?;
        Ok(match self {
            Self::Classifier(model) => Predictions::Labels(model.predict(features)),
            Self::Regressor(model) => Predictions::Values(model.predict(features)),
        })
    }

    /// Serializable description of the fitted parameters.
    #[must_use]
    pub fn snapshot(&self) -> ModelSnapshot {
        match self {
            Self::Classifier(model) => model.snapshot(),
            Self::Regressor(model) => model.snapshot(),
        }
    }

    /// Borrow the regressor, if this is one.
    #[must_use]
    pub const fn as_regressor(&self) -> Option<&FittedRegressor> {
        match self {
            Self::Regressor(model) => Some(model),
            Self::Classifier(_) => None,
        }
    }
}

/// Fitted parameters in a library-independent form.
///
/// Classifier coefficients are feature-major: `coefficients[feature][class]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSnapshot {
    /// Multinomial logistic regression.
    Classifier {
        /// Inverse regularization strength used for training.
        c: f64,
        /// Solver iteration cap used for training.
        max_iterations: u64,
        /// Class labels in column order.
        classes: Vec<usize>,
        /// Weight matrix, one row per feature.
        coefficients: Vec<Vec<f64>>,
        /// One intercept per class.
        intercepts: Vec<f64>,
    },
    /// Ordinary least squares.
    Regressor {
        /// One weight per feature.
        coefficients: Vec<f64>,
        /// Intercept term.
        intercept: f64,
    },
}

impl ModelSnapshot {
    /// Model family this snapshot describes.
    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        match self {
            Self::Classifier { .. } => ModelKind::Classifier,
            Self::Regressor { .. } => ModelKind::Regressor,
        }
    }
}

fn check_features(expected: usize, features: ArrayView2<'_, f64>) -> Result<()> {
    if features.ncols() == expected {
        Ok(())
    } else {
        Err(Error::Training(format!(
            "expected {expected} features, got {}",
            features.ncols()
        )))
    }
}
