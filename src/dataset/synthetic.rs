//! Synthetic regression data

use super::Dataset;
use crate::{Error, Result};
use ndarray::Array2;
use rand::Rng;

/// Generate `n_samples` single-feature rows with `x` uniform in `[0, 1)` and the
/// noiseless target `slope * x + intercept`.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `n_samples` is zero or the line
/// parameters are not finite.
pub fn linear<R: Rng + ?Sized>(
    n_samples: usize,
    slope: f64,
    intercept: f64,
    rng: &mut R,
) -> Result<Dataset<f64>> {
    if n_samples == 0 {
        return Err(Error::InvalidConfig(
            "synthetic dataset needs at least one sample".to_string(),
        ));
    }
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(Error::InvalidConfig(format!(
            "line parameters must be finite, got slope {slope} intercept {intercept}"
        )));
    }

    let features = Array2::from_shape_fn((n_samples, 1), |_| rng.gen::<f64>());
    let targets = features.column(0).mapv(|x| slope * x + intercept);
    Dataset::new(features, targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_targets_lie_on_line() {
        let data = linear(1000, 3.0, 5.0, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(data.n_rows(), 1000);
        assert_eq!(data.n_features(), 1);
        for (x, y) in data.features().column(0).iter().zip(data.labels()) {
            assert!((0.0..1.0).contains(x));
            assert!((y - (3.0 * x + 5.0)).abs() < f64::EPSILON * 8.0);
        }
    }

    #[test]
    fn test_zero_samples_rejected() {
        let result = linear(0, 3.0, 5.0, &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
