//! Run-scoped experiment tracking
//!
//! There is no ambient "current run": every log call goes through the
//! [`ActiveRun`] handle returned by [`Tracker::begin_run`]. A handle seals its
//! run exactly once, either explicitly via [`ActiveRun::end`] /
//! [`ActiveRun::fail`] or, if it is dropped while still open (early `?`
//! return, panic), as [`RunStatus::Failed`]. The next run therefore never
//! starts while a previous one is left open.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::store::{ARTIFACTS_DIR, EXPERIMENTS_DIR, RUNS_DIR};
use super::{
    ArtifactRecord, ExperimentRecord, ExperimentStore, MetricRecord, ParamRecord, RunRecord,
    RunStatus,
};
use crate::atomic::write_atomic;
use crate::model::FittedModel;
use crate::{Error, Result};

/// Experiment tracker backed by an [`ExperimentStore`], optionally persisted
/// to a directory.
#[derive(Debug)]
pub struct Tracker {
    store: ExperimentStore,
    root: Option<PathBuf>,
    blobs: HashMap<String, Vec<u8>>,
}

impl Tracker {
    /// Create a tracker that keeps everything in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: ExperimentStore::new(),
            root: None,
            blobs: HashMap::new(),
        }
    }

    /// Open a tracker persisted under `root`, loading any runs recorded there
    /// by earlier processes.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or existing
    /// records cannot be parsed.
    pub fn persistent(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [EXPERIMENTS_DIR, RUNS_DIR, ARTIFACTS_DIR] {
            fs::create_dir_all(root.join(dir)).map_err(|e| {
                Error::Tracking(format!("Failed to prepare {}: {e}", root.display()))
            })?;
        }
        let store = ExperimentStore::load_dir(&root)?;
        info!(
            root = %root.display(),
            runs = store.run_count(),
            "opened tracking store"
        );
        Ok(Self {
            store,
            root: Some(root),
            blobs: HashMap::new(),
        })
    }

    /// Read-only view of the tracked records.
    #[must_use]
    pub const fn store(&self) -> &ExperimentStore {
        &self.store
    }

    /// Directory the tracker persists to, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Get or create the experiment called `name`, returning its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if a new experiment cannot be persisted.
    pub fn create_experiment(&mut self, name: &str) -> Result<String> {
        if let Some(existing) = self.store.find_experiment(name) {
            return Ok(existing.experiment_id().to_string());
        }

        let experiment_id = next_id("exp", self.store.experiment_count(), |id| {
            self.store.get_experiment(id).is_some()
        });
        self.store
            .add_experiment(ExperimentRecord::new(&experiment_id, name));
        if let Some(root) = &self.root {
            self.store.persist_experiment(root, &experiment_id)?;
        }
        info!(experiment_id = %experiment_id, name, "created experiment");
        Ok(experiment_id)
    }

    /// Open a new run under `experiment_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tracking`] if the experiment does not exist, or an
    /// error if the new run cannot be persisted.
    pub fn begin_run(&mut self, experiment_id: &str) -> Result<ActiveRun<'_>> {
        if self.store.get_experiment(experiment_id).is_none() {
            return Err(Error::Tracking(format!(
                "unknown experiment '{experiment_id}'"
            )));
        }

        let run_id = next_id("run", self.store.run_count(), |id| {
            self.store.get_run(id).is_some()
        });
        self.store.add_run(RunRecord::start(&run_id, experiment_id));
        if let Some(root) = &self.root {
            self.store.persist_run(root, &run_id)?;
        }
        debug!(run_id = %run_id, experiment_id, "began run");

        Ok(ActiveRun {
            tracker: self,
            run_id,
            steps: HashMap::new(),
            sealed: false,
        })
    }

    /// Run `body` inside a fresh run and seal it according to the outcome.
    ///
    /// The run is sealed [`RunStatus::Success`] when `body` returns `Ok` and
    /// [`RunStatus::Failed`] (with the error message) when it returns `Err`
    /// or panics. The body's result is passed through unchanged.
    ///
    /// # Errors
    ///
    /// Returns the body's error, or a tracking error if the run cannot be
    /// opened or sealed.
    pub fn run_scoped<T, E, F>(&mut self, experiment_id: &str, body: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut ActiveRun<'_>) -> std::result::Result<T, E>,
        E: From<Error> + Display,
    {
        let mut run = self.begin_run(experiment_id)?;
        match body(&mut run) {
            Ok(value) => {
                run.end()?;
                Ok(value)
            }
            Err(err) => {
                let run_id = run.run_id().to_string();
                if let Err(seal_err) = run.fail(err.to_string()) {
                    warn!(run_id = %run_id, error = %seal_err, "failed to seal failed run");
                }
                Err(err)
            }
        }
    }

    /// Read back the bytes of a stored artifact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tracking`] if the artifact is not available.
    pub fn read_artifact(&self, artifact: &ArtifactRecord) -> Result<Vec<u8>> {
        if let Some(bytes) = self.blobs.get(artifact.cas_hash()) {
            return Ok(bytes.clone());
        }
        let root = self.root.as_ref().ok_or_else(|| {
            Error::Tracking(format!("artifact {} not found", artifact.cas_hash()))
        })?;
        let path = root.join(ARTIFACTS_DIR).join(artifact.digest());
        fs::read(&path).map_err(|e| {
            Error::Tracking(format!("Failed to read artifact {}: {e}", path.display()))
        })
    }

    fn store_blob(&mut self, artifact: &ArtifactRecord, bytes: Vec<u8>) -> Result<()> {
        match &self.root {
            Some(root) => {
                let path = root.join(ARTIFACTS_DIR).join(artifact.digest());
                if !path.exists() {
                    write_atomic(&path, &bytes)?;
                }
            }
            None => {
                self.blobs.insert(artifact.cas_hash().to_string(), bytes);
            }
        }
        Ok(())
    }

    fn seal(
        &mut self,
        run_id: &str,
        status: RunStatus,
        error: Option<String>,
    ) -> Result<RunRecord> {
        let run = self
            .store
            .get_run_mut(run_id)
            .ok_or_else(|| Error::Tracking(format!("unknown run '{run_id}'")))?;
        run.seal(status, error);
        let sealed = run.clone();
        if let Some(root) = &self.root {
            self.store.persist_run(root, run_id)?;
        }
        info!(run_id, status = ?sealed.status(), "sealed run");
        Ok(sealed)
    }
}

/// Handle to an open run. All logging for the run goes through it.
#[derive(Debug)]
pub struct ActiveRun<'t> {
    tracker: &'t mut Tracker,
    run_id: String,
    steps: HashMap<String, u64>,
    sealed: bool,
}

impl ActiveRun<'_> {
    /// ID of the run this handle logs to.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Log a hyperparameter value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tracking`] if a parameter with this key was already
    /// logged by the run, or if a persistent run file cannot be rewritten.
    pub fn log_param(&mut self, key: &str, value: impl Into<serde_json::Value>) -> Result<()> {
        let store = &mut self.tracker.store;
        if store
            .get_params_for_run(&self.run_id)
            .iter()
            .any(|p| p.key() == key)
        {
            return Err(Error::Tracking(format!(
                "param '{key}' already logged for run {}",
                self.run_id
            )));
        }
        let param = ParamRecord::new(&self.run_id, key, value);
        debug!(run_id = %self.run_id, key, value = %param.value(), "logged param");
        store.add_param(param);
        self.persist()
    }

    /// Log a metric value; repeated keys form a series with increasing steps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tracking`] if the value is not finite, or an error if
    /// a persistent run file cannot be rewritten.
    pub fn log_metric(&mut self, key: &str, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::Tracking(format!(
                "metric '{key}' must be finite, got {value}"
            )));
        }
        let step = self.steps.entry(key.to_string()).or_insert(0);
        self.tracker
            .store
            .add_metric(MetricRecord::new(&self.run_id, key, *step, value));
        debug!(run_id = %self.run_id, key, step = *step, value, "logged metric");
        *step += 1;
        self.persist()
    }

    /// Store a serialized copy of a fitted model under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be serialized or stored.
    pub fn log_model(&mut self, name: &str, model: &FittedModel) -> Result<ArtifactRecord> {
        let bytes = serde_json::to_vec_pretty(&model.snapshot())?;
        let artifact = ArtifactRecord::for_bytes(&self.run_id, name, &bytes);
        self.tracker.store_blob(&artifact, bytes)?;
        self.tracker.store.add_artifact(artifact.clone());
        debug!(
            run_id = %self.run_id,
            name,
            kind = %model.kind(),
            hash = artifact.cas_hash(),
            "logged model"
        );
        self.persist()?;
        Ok(artifact)
    }

    fn persist(&self) -> Result<()> {
        match &self.tracker.root {
            Some(root) => self.tracker.store.persist_run(root, &self.run_id),
            None => Ok(()),
        }
    }

    /// Seal the run as successful.
    ///
    /// # Errors
    ///
    /// Returns an error if the sealed run cannot be persisted.
    pub fn end(mut self) -> Result<RunRecord> {
        self.sealed = true;
        self.tracker.seal(&self.run_id, RunStatus::Success, None)
    }

    /// Seal the run as failed with the given reason.
    ///
    /// # Errors
    ///
    /// Returns an error if the sealed run cannot be persisted.
    pub fn fail(mut self, reason: impl Into<String>) -> Result<RunRecord> {
        self.sealed = true;
        self.tracker
            .seal(&self.run_id, RunStatus::Failed, Some(reason.into()))
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if self.sealed {
            return;
        }
        let reason = if std::thread::panicking() {
            "run panicked before it was sealed"
        } else {
            "run handle dropped before it was sealed"
        };
        warn!(run_id = %self.run_id, reason, "sealing abandoned run as failed");
        if let Err(err) = self
            .tracker
            .seal(&self.run_id, RunStatus::Failed, Some(reason.to_string()))
        {
            warn!(run_id = %self.run_id, error = %err, "failed to seal abandoned run");
        }
    }
}

fn next_id(prefix: &str, count: usize, taken: impl Fn(&str) -> bool) -> String {
    let mut n = count + 1;
    loop {
        let id = format!("{prefix}-{n:04}");
        if !taken(&id) {
            return id;
        }
        n += 1;
    }
}
