//! Sweep & Track
//!
//! Trains one iris classifier per regularization strength and records each
//! attempt as a run under `./tracking`.
//!
//! Run with: cargo run --bin sweep_and_track
//! Set `RUST_LOG=debug` for per-call tracker logging.

use anyhow::Context;
use sweepbench::dataset::IrisProvider;
use sweepbench::experiment::Tracker;
use sweepbench::sweep::{run_sweep, SweepConfig};
use tracing_subscriber::EnvFilter;

const TRACKING_DIR: &str = "tracking";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut tracker = Tracker::persistent(TRACKING_DIR)
        .with_context(|| format!("opening tracker at ./{TRACKING_DIR}"))?;
    let config = SweepConfig::default();
    let report = run_sweep(&IrisProvider, &mut tracker, &config).context("sweep failed")?;

    println!("experiment {}", report.experiment_id());
    for outcome in report.outcomes() {
        match (outcome.accuracy(), outcome.error()) {
            (Some(accuracy), _) => println!(
                "  {} {}={} {}={accuracy:.4}",
                outcome.run_id(),
                config.param_key(),
                outcome.value(),
                config.metric_key()
            ),
            (None, error) => println!(
                "  {} {}={} failed: {}",
                outcome.run_id(),
                config.param_key(),
                outcome.value(),
                error.unwrap_or("unknown error")
            ),
        }
    }
    if let Some(best) = report.best() {
        println!("best {}={}", config.param_key(), best.value());
    }
    Ok(())
}
