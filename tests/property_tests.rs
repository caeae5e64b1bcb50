//! Property-based tests for sweepbench
//!
//! - Test mathematical invariants
//! - Test data integrity properties
//! - Run with ProptestConfig::with_cases(100) unless a property trains models

use ndarray::{Array1, Array2};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;
use sweepbench::dataset::{synthetic, train_test_split, Dataset};
use sweepbench::export::Exporter;
use sweepbench::metrics::{accuracy, max_abs_error, mean_squared_error};
use sweepbench::model::{LinearRegressor, Trainer};
use sweepbench::runtime::InferenceSession;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Dataset of `rows` rows with the row index as the only feature
#[allow(clippy::cast_precision_loss)]
fn indexed_dataset(rows: usize) -> Dataset<usize> {
    let features = Array2::from_shape_fn((rows, 1), |(i, _)| i as f64);
    let labels = Array1::from_iter((0..rows).map(|i| i % 3));
    Dataset::new(features, labels).unwrap()
}

/// Paired label sequences of equal, non-zero length
fn arb_label_pairs() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    (1usize..200).prop_flat_map(|n| {
        (
            proptest::collection::vec(0u8..4, n),
            proptest::collection::vec(0u8..4, n),
        )
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Train/Test Split Properties
    // ========================================================================

    /// Property: train and test indices partition the dataset
    #[test]
    fn prop_split_partitions_rows(
        rows in 2usize..300,
        fraction in 0.01f64..0.99,
        seed in any::<u64>()
    ) {
        let data = indexed_dataset(rows);
        let n_test = (rows as f64 * fraction).ceil() as usize;
        prop_assume!(n_test > 0 && n_test < rows);

        let split = train_test_split(&data, fraction, &mut StdRng::seed_from_u64(seed)).unwrap();

        prop_assert_eq!(split.test().n_rows(), n_test);
        prop_assert_eq!(split.train().n_rows() + split.test().n_rows(), rows);

        let train: BTreeSet<_> = split.train_indices().iter().copied().collect();
        let test: BTreeSet<_> = split.test_indices().iter().copied().collect();
        prop_assert!(train.is_disjoint(&test));
        prop_assert_eq!(train.len() + test.len(), rows);
        prop_assert!(train.union(&test).copied().eq(0..rows));
    }

    /// Property: split rows carry their original features and labels
    #[test]
    fn prop_split_preserves_rows(rows in 2usize..100, seed in any::<u64>()) {
        let data = indexed_dataset(rows);
        let Ok(split) = train_test_split(&data, 0.3, &mut StdRng::seed_from_u64(seed)) else {
            return Ok(());
        };
        for (row, &index) in split.test_indices().iter().enumerate() {
            prop_assert_eq!(split.test().features()[[row, 0]], index as f64);
            prop_assert_eq!(split.test().labels()[row], index % 3);
        }
    }

    /// Property: same seed, same split
    #[test]
    fn prop_split_is_seed_deterministic(rows in 2usize..100, seed in any::<u64>()) {
        let data = indexed_dataset(rows);
        let a = train_test_split(&data, 0.5, &mut StdRng::seed_from_u64(seed)).unwrap();
        let b = train_test_split(&data, 0.5, &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert_eq!(a.test_indices(), b.test_indices());
    }

    // ========================================================================
    // Metric Properties
    // ========================================================================

    /// Property: accuracy lies in [0, 1]
    #[test]
    fn prop_accuracy_bounded((predictions, labels) in arb_label_pairs()) {
        let score = accuracy(&predictions, &labels).unwrap();
        prop_assert!((0.0..=1.0).contains(&score));
    }

    /// Property: accuracy of labels against themselves is 1
    #[test]
    fn prop_accuracy_identity((labels, _) in arb_label_pairs()) {
        prop_assert_eq!(accuracy(&labels, &labels).unwrap(), 1.0);
    }

    /// Property: misaligned inputs are rejected
    #[test]
    fn prop_accuracy_rejects_misaligned(a in 0usize..50, b in 0usize..50) {
        prop_assume!(a != b);
        let predictions = vec![0u8; a];
        let labels = vec![0u8; b];
        prop_assert!(accuracy(&predictions, &labels).is_err());
    }

    /// Property: max absolute error bounds the root mean squared error
    #[test]
    fn prop_max_abs_bounds_rmse(
        values in proptest::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 1..100)
    ) {
        let (p, t): (Vec<f64>, Vec<f64>) = values.into_iter().unzip();
        let mse = mean_squared_error(&p, &t).unwrap();
        let max = max_abs_error(&p, &t).unwrap();
        prop_assert!(mse.sqrt() <= max + 1e-9);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // ========================================================================
    // Export Round-Trip Properties
    // ========================================================================

    /// Property: session predictions match native predictions within 1e-4
    #[test]
    fn prop_export_round_trip_matches_native(
        slope in -100.0f64..100.0,
        intercept in -100.0f64..100.0,
        seed in any::<u64>()
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = synthetic::linear(64, slope, intercept, &mut rng).unwrap();
        let model = LinearRegressor::new().fit(&data).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        Exporter::new().export(&model, data.features(), &path).unwrap();
        let session = InferenceSession::load(&path).unwrap();

        let probe = synthetic::linear(32, 1.0, 0.0, &mut rng).unwrap();
        let native = model.predict(probe.features()).unwrap();
        let outputs = session.run(&[("X", probe.features())]).unwrap();

        let sweepbench::model::Predictions::Values(native) = native else {
            return Err(TestCaseError::fail("regressor returned labels"));
        };
        prop_assert_eq!(outputs[0].shape(), &[32, 1]);
        for (n, s) in native.iter().zip(outputs[0].iter()) {
            prop_assert!((n - s).abs() < 1e-4, "native {} vs session {}", n, s);
        }
    }
}
