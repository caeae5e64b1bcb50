//! Inference benchmarks
//!
//! Native linear regression vs. the exported ONNX graph in an inference
//! session, across batch sizes. Complements the single-sample wall-clock
//! comparison in `sweepbench::bench` with criterion statistics.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sweepbench::bench::Predictor;
use sweepbench::dataset::synthetic;
use sweepbench::export::Exporter;
use sweepbench::model::{FittedModel, LinearRegressor, Trainer};
use sweepbench::runtime::InferenceSession;
use tempfile::TempDir;

/// Fit `y = 3x + 5` and load its export into a session
fn fitted_pair(dir: &TempDir) -> (FittedModel, InferenceSession) {
    let data = synthetic::linear(1_000, 3.0, 5.0, &mut StdRng::seed_from_u64(42)).unwrap();
    let model = LinearRegressor::new().fit(&data).unwrap();
    let path = dir.path().join("model.onnx");
    Exporter::new().export(&model, data.features(), &path).unwrap();
    let session = InferenceSession::load(&path).unwrap();
    (model, session)
}

/// Benchmark batch prediction on both sides
fn bench_predict_batch(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let (model, session) = fitted_pair(&dir);
    let mut group = c.benchmark_group("predict_batch");

    for size in [1, 100, 1_000, 10_000].iter() {
        let input = synthetic::linear(*size, 1.0, 0.0, &mut StdRng::seed_from_u64(7))
            .unwrap()
            .into_parts()
            .0;

        group.bench_with_input(BenchmarkId::new("native", size), size, |b, _| {
            b.iter(|| black_box(model.predict_batch(black_box(input.view())).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("session", size), size, |b, _| {
            b.iter(|| black_box(session.predict_batch(black_box(input.view())).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark session load (decode + validation)
fn bench_session_load(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let _ = fitted_pair(&dir);
    let path = dir.path().join("model.onnx");

    c.bench_function("session_load", |b| {
        b.iter(|| black_box(InferenceSession::load(&path).unwrap()));
    });
}

criterion_group!(benches, bench_predict_batch, bench_session_load);
criterion_main!(benches);
