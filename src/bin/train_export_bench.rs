//! Train, Export & Benchmark
//!
//! Fits `y = 3x + 5` on 1000 random points, exports the model to
//! `model.onnx`, reloads it and times 10 000 predictions on each side.
//!
//! Run with: cargo run --release --bin train_export_bench

use anyhow::Context;
use sweepbench::bench::{run_pipeline, BenchmarkConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BenchmarkConfig::default();
    let report = run_pipeline(&config)
        .with_context(|| format!("pipeline failed for {}", config.get_model_path().display()))?;

    println!("native time: {:.6}", report.benchmark.native().as_secs_f64());
    println!("exported-runtime time: {:.6}", report.benchmark.exported().as_secs_f64());
    Ok(())
}
