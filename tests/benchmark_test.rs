//! Benchmark harness tests

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use sweepbench::bench::{compare, run_pipeline, time_repeated, BenchmarkConfig, Predictor};
use sweepbench::dataset::synthetic;
use sweepbench::export::Exporter;
use sweepbench::model::{LinearRegressor, Trainer};
use sweepbench::runtime::InferenceSession;
use sweepbench::Error;

#[test]
fn test_compare_native_and_session() {
    let data = synthetic::linear(100, 3.0, 5.0, &mut StdRng::seed_from_u64(1)).unwrap();
    let model = LinearRegressor::new().fit(&data).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.onnx");
    Exporter::new().export(&model, data.features(), &path).unwrap();
    let session = InferenceSession::load(&path).unwrap();

    let result = compare(&model, &session, data.features(), 50).unwrap();
    assert_eq!(result.repetitions(), 50);
    assert!(result.native() >= Duration::ZERO);
    assert!(result.exported() >= Duration::ZERO);
    assert!(result.speedup() >= 0.0);

    let native = model.predict_batch(data.features()).unwrap();
    let exported = session.predict_batch(data.features()).unwrap();
    assert_eq!(native.dim(), (100, 1));
    assert_eq!(exported.dim(), (100, 1));
}

#[test]
fn test_more_repetitions_take_longer() {
    let data = synthetic::linear(200, 3.0, 5.0, &mut StdRng::seed_from_u64(2)).unwrap();
    let model = LinearRegressor::new().fit(&data).unwrap();

    let once = time_repeated(&model, data.features(), 1).unwrap();
    let many = time_repeated(&model, data.features(), 2_000).unwrap();
    assert!(once <= many);
}

#[test]
fn test_zero_repetitions_rejected() {
    let data = synthetic::linear(10, 1.0, 0.0, &mut StdRng::seed_from_u64(3)).unwrap();
    let model = LinearRegressor::new().fit(&data).unwrap();
    assert!(matches!(
        compare(&model, &model, data.features(), 0),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_pipeline_defaults() {
    let config = BenchmarkConfig::default();
    assert_eq!(config.get_model_path().to_str(), Some("model.onnx"));
}

#[test]
fn test_pipeline_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = BenchmarkConfig::default()
        .repetitions(20)
        .seed(9)
        .model_path(dir.path().join("model.onnx"));
    let report = run_pipeline(&config).unwrap();

    assert_eq!(report.benchmark.repetitions(), 20);
    assert!(report.max_abs_difference < 1e-4);
    assert!((report.coefficients[0] - 3.0).abs() < 1e-6);
    assert!((report.intercept - 5.0).abs() < 1e-6);
    assert!(report.exported.size_bytes() > 0);
    assert!(InferenceSession::load(report.exported.path()).is_ok());
}

#[test]
fn test_pipeline_rejects_empty_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.onnx");
    let config = BenchmarkConfig::default().n_samples(0).model_path(&path);
    assert!(matches!(run_pipeline(&config), Err(Error::InvalidConfig(_))));
    assert!(!path.exists());
}
