//! # sweepbench: tracked model sweeps and export benchmarks
//!
//! **Version**: 0.1.0
//!
//! Two small machine-learning workflows built on a shared core:
//!
//! - **Sweep & Track**: train a multiclass logistic regression on iris once
//!   per regularization strength and record each attempt (parameters, held-out
//!   accuracy, serialized model) as an isolated run in an experiment tracker.
//! - **Train, Export & Benchmark**: fit a linear regression on synthetic data,
//!   export it to ONNX, reload it in an inference session and compare the
//!   wall-clock cost of repeated predictions.
//!
//! ## Design Principles
//!
//! - **Explicit run scope**: every log call goes through an [`experiment::ActiveRun`]
//!   handle; runs cannot leak into each other
//! - **All-or-nothing writes**: tracker files and exported models appear
//!   atomically or not at all
//! - **Closed model set**: [`model::FittedModel`] is an enum, so export support
//!   is checked exhaustively
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sweepbench::dataset::IrisProvider;
//! use sweepbench::experiment::Tracker;
//! use sweepbench::sweep::{run_sweep, SweepConfig};
//!
//! let mut tracker = Tracker::persistent("tracking")?;
//! let report = run_sweep(&IrisProvider, &mut tracker, &SweepConfig::default())?;
//! if let Some(best) = report.best() {
//!     println!("best C = {} ({:?})", best.value(), best.accuracy());
//! }
//! # Ok::<(), sweepbench::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod atomic;
pub mod bench;
pub mod dataset;
pub mod error;
pub mod experiment;
pub mod export;
pub mod metrics;
pub mod model;
pub mod runtime;
pub mod sweep;

pub use error::{Error, Result};
