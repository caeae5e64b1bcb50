//! Experiment Store - storage for experiment tracking data
//!
//! Records live in memory; a store can also be written to and reloaded from a
//! directory so that sealed runs survive the process.
//!
//! ## On-disk layout
//!
//! ```text
//! <root>/experiments/<experiment_id>.json
//! <root>/runs/<run_id>.json          run + params + metrics + artifact records
//! <root>/artifacts/<sha256 hex>      artifact bytes, content-addressed
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ArtifactRecord, ExperimentRecord, MetricRecord, ParamRecord, RunRecord, RunStatus};
use crate::atomic::write_atomic;
use crate::{Error, Result};

pub(crate) const EXPERIMENTS_DIR: &str = "experiments";
pub(crate) const RUNS_DIR: &str = "runs";
pub(crate) const ARTIFACTS_DIR: &str = "artifacts";

/// Everything a single run logged, as persisted in `runs/<run_id>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RunFile {
    pub(crate) run: RunRecord,
    pub(crate) params: Vec<ParamRecord>,
    pub(crate) metrics: Vec<MetricRecord>,
    pub(crate) artifacts: Vec<ArtifactRecord>,
}

/// Store for experiment tracking data.
///
/// ## Design
///
/// Experiments and runs are keyed by ID for O(1) lookups. Params, metrics
/// and artifacts are append-only vectors filtered by `run_id` at query time.
#[derive(Debug, Default)]
pub struct ExperimentStore {
    experiments: HashMap<String, ExperimentRecord>,
    runs: HashMap<String, RunRecord>,
    params: Vec<ParamRecord>,
    metrics: Vec<MetricRecord>,
    artifacts: Vec<ArtifactRecord>,
}

impl ExperimentStore {
    /// Create a new empty experiment store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
            && self.runs.is_empty()
            && self.params.is_empty()
            && self.metrics.is_empty()
            && self.artifacts.is_empty()
    }

    /// Get the number of experiments in the store.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Get the number of runs in the store.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Get the number of metric points in the store.
    #[must_use]
    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }

    /// Add an experiment to the store.
    pub fn add_experiment(&mut self, experiment: ExperimentRecord) {
        self.experiments
            .insert(experiment.experiment_id().to_string(), experiment);
    }

    /// Get an experiment by ID.
    #[must_use]
    pub fn get_experiment(&self, experiment_id: &str) -> Option<&ExperimentRecord> {
        self.experiments.get(experiment_id)
    }

    /// Find an experiment by its name.
    #[must_use]
    pub fn find_experiment(&self, name: &str) -> Option<&ExperimentRecord> {
        self.experiments.values().find(|e| e.name() == name)
    }

    /// Add a run to the store.
    pub fn add_run(&mut self, run: RunRecord) {
        self.runs.insert(run.run_id().to_string(), run);
    }

    /// Get a run by ID.
    #[must_use]
    pub fn get_run(&self, run_id: &str) -> Option<&RunRecord> {
        self.runs.get(run_id)
    }

    pub(crate) fn get_run_mut(&mut self, run_id: &str) -> Option<&mut RunRecord> {
        self.runs.get_mut(run_id)
    }

    /// Get all runs for an experiment, oldest first.
    #[must_use]
    pub fn get_runs_for_experiment(&self, experiment_id: &str) -> Vec<&RunRecord> {
        let mut runs: Vec<&RunRecord> = self
            .runs
            .values()
            .filter(|run| run.experiment_id() == experiment_id)
            .collect();
        runs.sort_by(|a, b| {
            a.started_at()
                .cmp(&b.started_at())
                .then_with(|| a.run_id().cmp(b.run_id()))
        });
        runs
    }

    /// Add a parameter to the store.
    pub fn add_param(&mut self, param: ParamRecord) {
        self.params.push(param);
    }

    /// Get the parameters logged by a run, in logging order.
    #[must_use]
    pub fn get_params_for_run(&self, run_id: &str) -> Vec<&ParamRecord> {
        self.params.iter().filter(|p| p.run_id() == run_id).collect()
    }

    /// Add a metric to the store.
    pub fn add_metric(&mut self, metric: MetricRecord) {
        self.metrics.push(metric);
    }

    /// Get metrics for a specific run and key, ordered by step.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use sweepbench::experiment::{ExperimentStore, MetricRecord};
    ///
    /// let mut store = ExperimentStore::new();
    /// store.add_metric(MetricRecord::new("run-0001", "accuracy", 1, 0.9));
    /// store.add_metric(MetricRecord::new("run-0001", "accuracy", 0, 0.8));
    ///
    /// let series = store.get_metrics_for_run("run-0001", "accuracy");
    /// assert_eq!(series[0].step(), 0);
    /// assert_eq!(series.len(), 2);
    /// ```
    #[must_use]
    pub fn get_metrics_for_run(&self, run_id: &str, key: &str) -> Vec<MetricRecord> {
        let mut metrics: Vec<MetricRecord> = self
            .metrics
            .iter()
            .filter(|m| m.run_id() == run_id && m.key() == key)
            .cloned()
            .collect();

        metrics.sort_by_key(MetricRecord::step);

        metrics
    }

    /// Latest value of a metric for a run.
    #[must_use]
    pub fn latest_metric(&self, run_id: &str, key: &str) -> Option<f64> {
        self.get_metrics_for_run(run_id, key)
            .last()
            .map(MetricRecord::value)
    }

    /// Add an artifact record to the store.
    pub fn add_artifact(&mut self, artifact: ArtifactRecord) {
        self.artifacts.push(artifact);
    }

    /// Get the artifacts stored by a run.
    #[must_use]
    pub fn get_artifacts_for_run(&self, run_id: &str) -> Vec<&ArtifactRecord> {
        self.artifacts
            .iter()
            .filter(|a| a.run_id() == run_id)
            .collect()
    }

    pub(crate) fn run_file(&self, run_id: &str) -> Option<RunFile> {
        let run = self.runs.get(run_id)?.clone();
        Some(RunFile {
            run,
            params: self.get_params_for_run(run_id).into_iter().cloned().collect(),
            metrics: self
                .metrics
                .iter()
                .filter(|m| m.run_id() == run_id)
                .cloned()
                .collect(),
            artifacts: self
                .get_artifacts_for_run(run_id)
                .into_iter()
                .cloned()
                .collect(),
        })
    }

    /// Write an experiment record under `root`.
    pub(crate) fn persist_experiment(&self, root: &Path, experiment_id: &str) -> Result<()> {
        let experiment = self.get_experiment(experiment_id).ok_or_else(|| {
            Error::Tracking(format!("unknown experiment '{experiment_id}'"))
        })?;
        let path = root
            .join(EXPERIMENTS_DIR)
            .join(format!("{experiment_id}.json"));
        write_atomic(&path, &serde_json::to_vec_pretty(experiment)?)
    }

    /// Write a run and everything it logged under `root`.
    pub(crate) fn persist_run(&self, root: &Path, run_id: &str) -> Result<()> {
        let file = self
            .run_file(run_id)
            .ok_or_else(|| Error::Tracking(format!("unknown run '{run_id}'")))?;
        let path = root.join(RUNS_DIR).join(format!("{run_id}.json"));
        write_atomic(&path, &serde_json::to_vec_pretty(&file)?)?;
        debug!(run_id, path = %path.display(), "persisted run");
        Ok(())
    }

    /// Load every experiment and run persisted under `root`.
    ///
    /// Runs still marked [`RunStatus::Running`] were left open by a process
    /// that died mid-run; they are loaded as failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tracking`] if a record file cannot be read or parsed.
    pub fn load_dir(root: &Path) -> Result<Self> {
        let mut store = Self::new();

        for path in json_files(&root.join(EXPERIMENTS_DIR))? {
            let experiment: ExperimentRecord = read_json(&path)?;
            store.add_experiment(experiment);
        }

        for path in json_files(&root.join(RUNS_DIR))? {
            let RunFile {
                mut run,
                params,
                metrics,
                artifacts,
            } = read_json(&path)?;
            if run.status() == RunStatus::Running {
                warn!(run_id = run.run_id(), "run was never sealed, loading as failed");
                run.seal(
                    RunStatus::Failed,
                    Some("run was interrupted before it was sealed".to_string()),
                );
            }
            store.add_run(run);
            store.params.extend(params);
            store.metrics.extend(metrics);
            store.artifacts.extend(artifacts);
        }

        debug!(
            root = %root.display(),
            experiments = store.experiment_count(),
            runs = store.run_count(),
            "loaded experiment store"
        );
        Ok(store)
    }
}

fn json_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir)
        .map_err(|e| Error::Tracking(format!("Failed to read {}: {e}", dir.display())))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| Error::Tracking(format!("Failed to read {}: {e}", dir.display())))?
            .path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)
        .map_err(|e| Error::Tracking(format!("Failed to read {}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Tracking(format!("Failed to parse {}: {e}", path.display())))
}
