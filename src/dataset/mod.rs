//! Labeled tabular datasets and the providers that load them
//!
//! A [`Dataset`] pairs an `n × d` feature matrix with `n` labels and is never
//! mutated after construction: splitting and sub-selection produce new
//! datasets.
//!
//! ## Providers
//!
//! - [`IrisProvider`]: the built-in Iris dataset (150 rows, 4 features, 3 classes)
//! - [`ParquetProvider`]: a labeled table stored as Parquet
//!
//! ## Example
//!
//! ```rust
//! use sweepbench::dataset::{DataProvider, IrisProvider};
//!
//! let iris = IrisProvider.load()?;
//! assert_eq!(iris.n_rows(), 150);
//! assert_eq!(iris.n_features(), 4);
//! # Ok::<(), sweepbench::Error>(())
//! ```

mod columnar;
pub mod split;
pub mod synthetic;

pub use columnar::ParquetProvider;
pub use split::{train_test_split, Split};

use crate::{Error, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use tracing::debug;

/// Feature matrix paired 1:1 with labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<T> {
    features: Array2<f64>,
    labels: Array1<T>,
}

impl<T: Clone> Dataset<T> {
    /// Create a dataset from a feature matrix and its labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataLoad`] if the number of feature rows differs from
    /// the number of labels.
    pub fn new(features: Array2<f64>, labels: Array1<T>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(Error::DataLoad(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        Ok(Self { features, labels })
    }

    /// Feature matrix (one row per example).
    #[must_use]
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// Labels, aligned with the feature rows.
    #[must_use]
    pub const fn labels(&self) -> &Array1<T> {
        &self.labels
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Number of features per row.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Check if the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Build a new dataset from the given rows, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
        }
    }

    /// Split into owned features and labels.
    #[must_use]
    pub fn into_parts(self) -> (Array2<f64>, Array1<T>) {
        (self.features, self.labels)
    }
}

/// Source of a labeled classification dataset.
pub trait DataProvider {
    /// Load the full dataset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataLoad`] if the source is unavailable or malformed.
    fn load(&self) -> Result<Dataset<usize>>;
}

/// The Iris flower dataset, bundled with the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct IrisProvider;

impl DataProvider for IrisProvider {
    fn load(&self) -> Result<Dataset<usize>> {
        let iris = linfa_datasets::iris();
        let dataset = Dataset::new(iris.records().clone(), iris.targets().clone())?;
        debug!(
            rows = dataset.n_rows(),
            features = dataset.n_features(),
            "loaded iris dataset"
        );
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dataset_rejects_misaligned_labels() {
        let result = Dataset::new(array![[1.0, 2.0], [3.0, 4.0]], array![0_usize]);
        assert!(matches!(result, Err(Error::DataLoad(_))));
    }

    #[test]
    fn test_select_rows_keeps_alignment() {
        let dataset = Dataset::new(array![[0.0], [1.0], [2.0]], array![10_usize, 11, 12]).unwrap();
        let subset = dataset.select_rows(&[2, 0]);
        assert_eq!(subset.features(), array![[2.0], [0.0]]);
        assert_eq!(subset.labels(), &array![12, 10]);
    }

    #[test]
    fn test_iris_shape_and_classes() {
        let iris = IrisProvider.load().unwrap();
        assert_eq!(iris.n_rows(), 150);
        assert_eq!(iris.n_features(), 4);
        assert!(iris.labels().iter().all(|&label| label < 3));
        for class in 0..3 {
            assert_eq!(iris.labels().iter().filter(|&&l| l == class).count(), 50);
        }
    }
}
