//! Randomized train/test partitioning

use super::Dataset;
use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Two disjoint partitions of a dataset whose union is the full dataset.
///
/// Partition membership is fixed when the split is made; the original row
/// indices of each partition are kept for auditing.
#[derive(Debug, Clone)]
pub struct Split<T> {
    train: Dataset<T>,
    test: Dataset<T>,
    train_indices: Vec<usize>,
    test_indices: Vec<usize>,
}

impl<T> Split<T> {
    /// Training partition.
    #[must_use]
    pub const fn train(&self) -> &Dataset<T> {
        &self.train
    }

    /// Held-out partition.
    #[must_use]
    pub const fn test(&self) -> &Dataset<T> {
        &self.test
    }

    /// Original row indices of the training partition.
    #[must_use]
    pub fn train_indices(&self) -> &[usize] {
        &self.train_indices
    }

    /// Original row indices of the held-out partition.
    #[must_use]
    pub fn test_indices(&self) -> &[usize] {
        &self.test_indices
    }
}

/// Shuffle the rows of `dataset` and hold out `test_fraction` of them.
///
/// The held-out size is `ceil(n * test_fraction)`, so a 0.2 split of 150
/// rows holds out 30.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `test_fraction` is not strictly between
/// 0 and 1, or if either partition would be empty.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn train_test_split<T, R>(
    dataset: &Dataset<T>,
    test_fraction: f64,
    rng: &mut R,
) -> Result<Split<T>>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::InvalidConfig(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let n_rows = dataset.n_rows();
    let n_test = (n_rows as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n_rows {
        return Err(Error::InvalidConfig(format!(
            "a {test_fraction} split of {n_rows} rows leaves an empty partition"
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    indices.shuffle(rng);
    let train_indices = indices.split_off(n_test);
    let test_indices = indices;

    debug!(
        train = train_indices.len(),
        test = test_indices.len(),
        "split dataset"
    );

    Ok(Split {
        train: dataset.select_rows(&train_indices),
        test: dataset.select_rows(&test_indices),
        train_indices,
        test_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[allow(clippy::cast_precision_loss)]
    fn numbered(n: usize) -> Dataset<usize> {
        let features = Array2::from_shape_fn((n, 1), |(row, _)| row as f64);
        Dataset::new(features, Array1::from_iter(0..n)).unwrap()
    }

    #[test]
    fn test_split_sizes_follow_ceiling() {
        let mut rng = StdRng::seed_from_u64(7);
        let split = train_test_split(&numbered(150), 0.2, &mut rng).unwrap();
        assert_eq!(split.test().n_rows(), 30);
        assert_eq!(split.train().n_rows(), 120);

        let split = train_test_split(&numbered(11), 0.2, &mut rng).unwrap();
        assert_eq!(split.test().n_rows(), 3);
    }

    #[test]
    fn test_split_rows_follow_indices() {
        let mut rng = StdRng::seed_from_u64(1);
        let split = train_test_split(&numbered(20), 0.25, &mut rng).unwrap();
        for (position, &index) in split.test_indices().iter().enumerate() {
            assert_eq!(split.test().labels()[position], index);
        }
        let all: HashSet<usize> = split
            .train_indices()
            .iter()
            .chain(split.test_indices())
            .copied()
            .collect();
        assert_eq!(all.len(), 20);
    }

    #[test]
    fn test_split_is_deterministic_for_seed() {
        let a = train_test_split(&numbered(50), 0.2, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = train_test_split(&numbered(50), 0.2, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a.test_indices(), b.test_indices());
    }

    #[test]
    fn test_invalid_fraction() {
        let mut rng = StdRng::seed_from_u64(0);
        for fraction in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                train_test_split(&numbered(10), fraction, &mut rng),
                Err(Error::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_too_few_rows() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            train_test_split(&numbered(1), 0.2, &mut rng),
            Err(Error::InvalidConfig(_))
        ));
    }
}
