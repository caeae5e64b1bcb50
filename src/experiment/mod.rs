//! Experiment tracking
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentRecord (1) ──< RunRecord (N)
//!                              │
//!                              ├──< ParamRecord (N)
//!                              ├──< MetricRecord (N) [time-series]
//!                              └──< ArtifactRecord (N) [CAS]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use sweepbench::experiment::{RunStatus, Tracker};
//!
//! let mut tracker = Tracker::in_memory();
//! let experiment_id = tracker.create_experiment("my-sweep")?;
//!
//! let mut run = tracker.begin_run(&experiment_id)?;
//! run.log_param("C", 0.1)?;
//! run.log_metric("accuracy", 0.93)?;
//! let record = run.end()?;
//!
//! assert_eq!(record.status(), RunStatus::Success);
//! # Ok::<(), sweepbench::Error>(())
//! ```

mod records;
mod store;
mod tracker;

pub use records::{
    content_hash, ArtifactRecord, ExperimentRecord, MetricRecord, ParamRecord, RunRecord,
    RunStatus,
};
pub use store::ExperimentStore;
pub use tracker::{ActiveRun, Tracker};
