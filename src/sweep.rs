//! Hyperparameter sweep with one tracked run per value
//!
//! The dataset is loaded and split once; every sweep value then gets its own
//! run in which a classifier is trained on the training partition, scored on
//! the held-out partition, and the parameter, score and model are logged.
//!
//! ```rust,no_run
//! use sweepbench::dataset::IrisProvider;
//! use sweepbench::experiment::Tracker;
//! use sweepbench::sweep::{run_sweep, SweepConfig};
//!
//! let mut tracker = Tracker::in_memory();
//! let report = run_sweep(&IrisProvider, &mut tracker, &SweepConfig::default())?;
//! for outcome in report.outcomes() {
//!     println!("C={} -> {:?}", outcome.value(), outcome.accuracy());
//! }
//! # Ok::<(), sweepbench::Error>(())
//! ```

use crate::dataset::{train_test_split, DataProvider, Split};
use crate::experiment::{ActiveRun, Tracker};
use crate::metrics::accuracy;
use crate::model::{LogisticClassifier, Predictions, Trainer, DEFAULT_MAX_ITERATIONS};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

/// What to do when one sweep value fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Seal the failing run as failed and stop the sweep with its error.
    #[default]
    Abort,
    /// Seal the failing run as failed, record the error and move on.
    Continue,
}

/// Sweep configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    experiment_name: String,
    param_key: String,
    metric_key: String,
    model_name: String,
    values: Vec<f64>,
    max_iterations: u64,
    test_fraction: f64,
    seed: Option<u64>,
    failure_policy: FailurePolicy,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            experiment_name: "iris-logistic-regression".to_string(),
            param_key: "C".to_string(),
            metric_key: "accuracy".to_string(),
            model_name: "model".to_string(),
            values: vec![0.1, 1.0],
            max_iterations: DEFAULT_MAX_ITERATIONS,
            test_fraction: 0.2,
            seed: None,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl SweepConfig {
    /// Set the experiment the runs are grouped under.
    #[must_use]
    pub fn experiment_name(mut self, name: impl Into<String>) -> Self {
        self.experiment_name = name.into();
        self
    }

    /// Set the regularization strengths to sweep, in order.
    #[must_use]
    pub fn values(mut self, values: impl Into<Vec<f64>>) -> Self {
        self.values = values.into();
        self
    }

    /// Set the solver iteration cap.
    #[must_use]
    pub const fn max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the held-out fraction.
    #[must_use]
    pub const fn test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    /// Seed the train/test shuffle. Unseeded sweeps draw from OS entropy.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the per-value failure policy.
    #[must_use]
    pub const fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Name of the logged hyperparameter.
    #[must_use]
    pub fn param_key(&self) -> &str {
        &self.param_key
    }

    /// Name of the logged score.
    #[must_use]
    pub fn metric_key(&self) -> &str {
        &self.metric_key
    }

    /// Name of the logged model artifact.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Values swept, in order.
    #[must_use]
    pub fn sweep_values(&self) -> &[f64] {
        &self.values
    }

    fn validate(&self) -> Result<()> {
        if self.values.is_empty() {
            return Err(Error::InvalidConfig("sweep has no values".to_string()));
        }
        if self.experiment_name.is_empty() {
            return Err(Error::InvalidConfig("experiment name is empty".to_string()));
        }
        Ok(())
    }
}

/// Result of one sweep value.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    run_id: String,
    value: f64,
    result: std::result::Result<f64, String>,
}

impl RunOutcome {
    /// ID of the run that tracked this value.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Swept hyperparameter value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Held-out accuracy, if the run succeeded.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        self.result.as_ref().ok().copied()
    }

    /// Failure message, if the run failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.result.as_ref().err().map(String::as_str)
    }
}

/// Outcome of a full sweep, one entry per swept value in sweep order.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport {
    experiment_id: String,
    outcomes: Vec<RunOutcome>,
}

impl SweepReport {
    /// Experiment the runs were grouped under.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Per-value outcomes.
    #[must_use]
    pub fn outcomes(&self) -> &[RunOutcome] {
        &self.outcomes
    }

    /// Successful outcome with the highest accuracy; ties go to the earlier value.
    #[must_use]
    pub fn best(&self) -> Option<&RunOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.accuracy().is_some())
            .fold(None, |best: Option<&RunOutcome>, o| match best {
                Some(b) if b.accuracy() >= o.accuracy() => Some(b),
                _ => Some(o),
            })
    }
}

/// Run the sweep described by `config` over the data from `provider`.
///
/// # Errors
///
/// Returns [`Error::DataLoad`] if the provider fails (before any run is
/// opened), [`Error::InvalidConfig`] for an invalid configuration, and under
/// [`FailurePolicy::Abort`] the first error raised inside a run.
pub fn run_sweep<P>(
    provider: &P,
    tracker: &mut Tracker,
    config: &SweepConfig,
) -> Result<SweepReport>
where
    P: DataProvider + ?Sized,
{
    config.validate()?;

    let dataset = provider.load()?;
    let mut rng = config
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let split = train_test_split(&dataset, config.test_fraction, &mut rng)?;
    info!(
        rows = dataset.n_rows(),
        train = split.train().n_rows(),
        test = split.test().n_rows(),
        "prepared sweep data"
    );

    let experiment_id = tracker.create_experiment(&config.experiment_name)?;
    let mut outcomes = Vec::with_capacity(config.values.len());

    for &value in &config.values {
        let mut run_id = String::new();
        let result = tracker.run_scoped(&experiment_id, |run| {
            run_id = run.run_id().to_string();
            train_and_log(run, &split, value, config)
        });

        match result {
            Ok(score) => {
                info!(
                    run_id = %run_id,
                    param = config.param_key.as_str(),
                    value,
                    score,
                    "run finished"
                );
                outcomes.push(RunOutcome {
                    run_id,
                    value,
                    result: Ok(score),
                });
            }
            Err(err) if config.failure_policy == FailurePolicy::Continue => {
                warn!(run_id = %run_id, value, error = %err, "run failed, continuing sweep");
                outcomes.push(RunOutcome {
                    run_id,
                    value,
                    result: Err(err.to_string()),
                });
            }
            Err(err) => return Err(err),
        }
    }

    Ok(SweepReport {
        experiment_id,
        outcomes,
    })
}

fn train_and_log(
    run: &mut ActiveRun<'_>,
    split: &Split<usize>,
    value: f64,
    config: &SweepConfig,
) -> Result<f64> {
    run.log_param(&config.param_key, value)?;

    let model = LogisticClassifier::new(value)
        .max_iterations(config.max_iterations)
        .fit(split.train())?;

    let Predictions::Labels(predicted) = model.predict(split.test().features())? else {
        return Err(Error::Training("classifier produced regression values".to_string()));
    };
    let score = accuracy(&predicted.to_vec(), &split.test().labels().to_vec())?;

    run.log_metric(&config.metric_key, score)?;
    run.log_model(&config.model_name, &model)?;
    Ok(score)
}
