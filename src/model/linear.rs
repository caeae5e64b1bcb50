//! Ordinary least squares regression

use super::{FittedModel, ModelSnapshot, Trainer};
use crate::dataset::Dataset;
use crate::{Error, Result};
use linfa::prelude::*;
use linfa::DatasetBase;
use linfa_linear::{FittedLinearRegression, LinearRegression};
use ndarray::{Array1, ArrayView1, ArrayView2};
use std::fmt;
use tracing::debug;

/// Least squares linear regression trainer with an intercept term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearRegressor;

impl LinearRegressor {
    /// Create a trainer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Trainer for LinearRegressor {
    type Target = f64;

    fn fit(&self, data: &Dataset<f64>) -> Result<FittedModel> {
        if data.is_empty() {
            return Err(Error::Training("cannot fit on an empty dataset".to_string()));
        }
        if data.labels().iter().any(|y| !y.is_finite()) {
            return Err(Error::Training("regression targets must be finite".to_string()));
        }

        let train = DatasetBase::new(data.features().to_owned(), data.labels().clone());
        let inner = LinearRegression::new()
            .fit(&train)
            .map_err(|e| Error::Training(format!("linear regression failed to fit: {e}")))?;

        debug!(
            rows = data.n_rows(),
            features = data.n_features(),
            intercept = inner.intercept(),
            "fitted linear regression"
        );
        Ok(FittedModel::Regressor(FittedRegressor { inner }))
    }
}

/// Fitted least squares model.
pub struct FittedRegressor {
    inner: FittedLinearRegression<f64>,
}

impl FittedRegressor {
    /// Number of input features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.inner.params().len()
    }

    /// One weight per feature.
    #[must_use]
    pub fn coefficients(&self) -> ArrayView1<'_, f64> {
        self.inner.params().view()
    }

    /// Intercept term.
    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.inner.intercept()
    }

    /// Predict without checking the input width.
    ///
    /// Callers that accept untrusted input go through
    /// [`FittedModel::predict`] instead.
    #[must_use]
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Array1<f64> {
        self.inner.predict(&features)
    }

    pub(super) fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot::Regressor {
            coefficients: self.inner.params().to_vec(),
            intercept: self.inner.intercept(),
        }
    }
}

impl fmt::Debug for FittedRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FittedRegressor")
            .field("coefficients", &self.inner.params())
            .field("intercept", &self.inner.intercept())
            .finish()
    }
}
