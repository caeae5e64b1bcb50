//! Wall-clock comparison of native and exported inference
//!
//! Each side is timed once over `n` back-to-back batch predictions. No
//! warm-up or percentiles; use the criterion bench for statistics.

mod pipeline;

pub use pipeline::{run_pipeline, BenchmarkConfig, PipelineReport};

use crate::model::{FittedModel, Predictions};
use crate::runtime::InferenceSession;
use crate::{Error, Result};
use ndarray::{Array2, ArrayView2, Axis, Ix2};
use std::hint::black_box;
use std::time::{Duration, Instant};
use tracing::info;

/// Anything that maps a feature batch to one prediction column per output.
pub trait Predictor {
    /// Predict a batch; rows of the result line up with rows of `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is rejected.
    fn predict_batch(&self, input: ArrayView2<'_, f64>) -> Result<Array2<f64>>;
}

impl Predictor for FittedModel {
    #[allow(clippy::cast_precision_loss)]
    fn predict_batch(&self, input: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let column = match self.predict(input)? {
            Predictions::Values(values) => values,
            Predictions::Labels(labels) => labels.mapv(|l| l as f64),
        };
        Ok(column.insert_axis(Axis(1)))
    }
}

impl Predictor for InferenceSession {
    fn predict_batch(&self, input: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let name = self
            .input_names()
            .first()
            .copied()
            .ok_or_else(|| Error::Inference("session has no inputs".to_string()))?;
        let first = self
            .run(&[(name, input)])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Inference("session produced no outputs".to_string()))?;
        first
            .into_dimensionality::<Ix2>()
            .map_err(|e| Error::Inference(format!("expected a 2-D output: {e}")))
    }
}

/// Total wall-clock time of `repetitions` sequential predictions.
///
/// # Errors
///
/// Propagates the first prediction error.
pub fn time_repeated<P>(
    predictor: &P,
    input: ArrayView2<'_, f64>,
    repetitions: usize,
) -> Result<Duration>
where
    P: Predictor + ?Sized,
{
    let start = Instant::now();
    for _ in 0..repetitions {
        black_box(predictor.predict_batch(black_box(input))?);
    }
    Ok(start.elapsed())
}

/// Timings of one native-vs-exported comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkResult {
    native: Duration,
    exported: Duration,
    repetitions: usize,
}

impl BenchmarkResult {
    /// Total time spent in the native model.
    #[must_use]
    pub const fn native(&self) -> Duration {
        self.native
    }

    /// Total time spent in the inference session.
    #[must_use]
    pub const fn exported(&self) -> Duration {
        self.exported
    }

    /// Predictions timed per side.
    #[must_use]
    pub const fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Native time divided by exported time; above 1 means the session is faster.
    #[must_use]
    pub fn speedup(&self) -> f64 {
        let exported = self.exported.as_secs_f64();
        if exported == 0.0 {
            f64::INFINITY
        } else {
            self.native.as_secs_f64() / exported
        }
    }
}

/// Time `native` then `exported` on the same input.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `repetitions` is zero, otherwise the
/// first prediction error from either side.
pub fn compare<N, E>(
    native: &N,
    exported: &E,
    input: ArrayView2<'_, f64>,
    repetitions: usize,
) -> Result<BenchmarkResult>
where
    N: Predictor + ?Sized,
    E: Predictor + ?Sized,
{
    if repetitions == 0 {
        return Err(Error::InvalidConfig("repetitions must be at least 1".to_string()));
    }
    let native = time_repeated(native, input, repetitions)?;
    let exported = time_repeated(exported, input, repetitions)?;
    info!(
        repetitions,
        native_secs = native.as_secs_f64(),
        exported_secs = exported.as_secs_f64(),
        "benchmark finished"
    );
    Ok(BenchmarkResult {
        native,
        exported,
        repetitions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::cell::Cell;

    struct Counting {
        calls: Cell<usize>,
    }

    impl Predictor for Counting {
        fn predict_batch(&self, input: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
            self.calls.set(self.calls.get() + 1);
            Ok(input.to_owned())
        }
    }

    struct Failing;

    impl Predictor for Failing {
        fn predict_batch(&self, _input: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
            Err(Error::Inference("nope".to_string()))
        }
    }

    #[test]
    fn test_time_repeated_calls_n_times() {
        let p = Counting { calls: Cell::new(0) };
        let x = array![[1.0]];
        time_repeated(&p, x.view(), 25).unwrap();
        assert_eq!(p.calls.get(), 25);
    }

    #[test]
    fn test_compare_records_repetitions() {
        let (a, b) = (Counting { calls: Cell::new(0) }, Counting { calls: Cell::new(0) });
        let x = array![[1.0, 2.0]];
        let result = compare(&a, &b, x.view(), 3).unwrap();
        assert_eq!(result.repetitions(), 3);
        assert_eq!((a.calls.get(), b.calls.get()), (3, 3));
    }

    #[test]
    fn test_compare_rejects_zero() {
        let p = Counting { calls: Cell::new(0) };
        let x = array![[1.0]];
        assert!(matches!(compare(&p, &p, x.view(), 0), Err(Error::InvalidConfig(_))));
        assert_eq!(p.calls.get(), 0);
    }

    #[test]
    fn test_compare_propagates_errors() {
        let p = Counting { calls: Cell::new(0) };
        let x = array![[1.0]];
        assert!(matches!(compare(&p, &Failing, x.view(), 2), Err(Error::Inference(_))));
    }
}
