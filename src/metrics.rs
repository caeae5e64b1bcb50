//! Evaluation metrics
//!
//! All metrics compare two equally long sequences and reject misaligned or
//! empty inputs with [`Error::MetricComputation`].

use crate::{Error, Result};

/// Fraction of predictions that exactly match their label, in `[0, 1]`.
///
/// # Errors
///
/// Returns [`Error::MetricComputation`] if the inputs differ in length or are
/// empty.
///
/// # Example
///
/// ```rust
/// use sweepbench::metrics::accuracy;
///
/// let score = accuracy(&[0, 1, 2, 2], &[0, 1, 1, 2])?;
/// assert!((score - 0.75).abs() < f64::EPSILON);
/// # Ok::<(), sweepbench::Error>(())
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn accuracy<T: PartialEq>(predictions: &[T], labels: &[T]) -> Result<f64> {
    check_aligned(predictions.len(), labels.len())?;
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(prediction, label)| prediction == label)
        .count();
    Ok(correct as f64 / labels.len() as f64)
}

/// Mean of squared differences.
///
/// # Errors
///
/// Returns [`Error::MetricComputation`] if the inputs differ in length or are
/// empty.
#[allow(clippy::cast_precision_loss)]
pub fn mean_squared_error(predictions: &[f64], targets: &[f64]) -> Result<f64> {
    check_aligned(predictions.len(), targets.len())?;
    let sum: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).powi(2))
        .sum();
    Ok(sum / targets.len() as f64)
}

/// Largest absolute difference between paired values.
///
/// # Errors
///
/// Returns [`Error::MetricComputation`] if the inputs differ in length or are
/// empty.
pub fn max_abs_error(predictions: &[f64], targets: &[f64]) -> Result<f64> {
    check_aligned(predictions.len(), targets.len())?;
    Ok(predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).abs())
        .fold(0.0, f64::max))
}

const fn check_aligned(predictions: usize, labels: usize) -> Result<()> {
    if predictions != labels || labels == 0 {
        return Err(Error::MetricComputation {
            predictions,
            labels,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_bounds() {
        assert!((accuracy(&[1, 2, 3], &[1, 2, 3]).unwrap() - 1.0).abs() < f64::EPSILON);
        assert!(accuracy(&[1, 2, 3], &[0, 0, 0]).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_accuracy_misaligned() {
        let err = accuracy(&[1, 2], &[1]).unwrap_err();
        assert!(matches!(
            err,
            Error::MetricComputation {
                predictions: 2,
                labels: 1
            }
        ));
    }

    #[test]
    fn test_accuracy_empty() {
        let empty: [usize; 0] = [];
        assert!(accuracy(&empty, &empty).is_err());
    }

    #[test]
    fn test_mean_squared_error() {
        let mse = mean_squared_error(&[1.0, 2.0], &[1.0, 4.0]).unwrap();
        assert!((mse - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_max_abs_error() {
        let err = max_abs_error(&[1.0, -2.0, 3.0], &[1.5, -2.0, 2.0]).unwrap();
        assert!((err - 1.0).abs() < f64::EPSILON);
    }
}
