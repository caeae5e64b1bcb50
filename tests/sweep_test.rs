//! Sweep & Track end-to-end tests against a persistent tracker

use sweepbench::dataset::{DataProvider, Dataset, IrisProvider};
use sweepbench::experiment::{ExperimentStore, RunStatus, Tracker};
use sweepbench::sweep::{run_sweep, FailurePolicy, SweepConfig};
use sweepbench::{Error, Result};

struct Offline;

impl DataProvider for Offline {
    fn load(&self) -> Result<Dataset<usize>> {
        Err(Error::DataLoad("dataset mirror unreachable".to_string()))
    }
}

#[test]
fn test_default_sweep_records_one_run_per_value() {
    let dir = tempfile::tempdir().unwrap();
    let mut tracker = Tracker::persistent(dir.path()).unwrap();
    let config = SweepConfig::default().seed(2024);
    let report = run_sweep(&IrisProvider, &mut tracker, &config).unwrap();

    assert_eq!(config.sweep_values(), &[0.1, 1.0]);
    assert_eq!(report.outcomes().len(), config.sweep_values().len());

    let store = ExperimentStore::load_dir(dir.path()).unwrap();
    let runs = store.get_runs_for_experiment(report.experiment_id());
    assert_eq!(runs.len(), 2);

    for (outcome, value) in report.outcomes().iter().zip(config.sweep_values()) {
        let run = store.get_run(outcome.run_id()).unwrap();
        assert_eq!(run.status(), RunStatus::Success);

        let params = store.get_params_for_run(outcome.run_id());
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].key(), "C");
        assert_eq!(params[0].value().as_f64(), Some(*value));

        let metric = store.latest_metric(outcome.run_id(), "accuracy").unwrap();
        assert!((0.0..=1.0).contains(&metric));
        assert_eq!(Some(metric), outcome.accuracy());

        let artifacts = store.get_artifacts_for_run(outcome.run_id());
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name(), "model");
        assert!(artifacts[0].cas_hash().starts_with("sha256:"));
    }
}

#[test]
fn test_iris_accuracy_is_reasonable() {
    let mut tracker = Tracker::in_memory();
    let config = SweepConfig::default().values([1.0]).seed(7);
    let report = run_sweep(&IrisProvider, &mut tracker, &config).unwrap();
    assert!(report.best().unwrap().accuracy().unwrap() > 0.7);
}

#[test]
fn test_repeated_sweeps_share_experiment() {
    let mut tracker = Tracker::in_memory();
    let config = SweepConfig::default().seed(1);
    let first = run_sweep(&IrisProvider, &mut tracker, &config).unwrap();
    let second = run_sweep(&IrisProvider, &mut tracker, &config).unwrap();

    assert_eq!(first.experiment_id(), second.experiment_id());
    assert_eq!(tracker.store().get_runs_for_experiment(first.experiment_id()).len(), 4);
    assert_ne!(first.outcomes()[0].run_id(), second.outcomes()[0].run_id());
}

#[test]
fn test_seeded_sweeps_are_reproducible() {
    let config = SweepConfig::default().seed(99);
    let a = run_sweep(&IrisProvider, &mut Tracker::in_memory(), &config).unwrap();
    let b = run_sweep(&IrisProvider, &mut Tracker::in_memory(), &config).unwrap();
    let scores = |r: &sweepbench::sweep::SweepReport| {
        r.outcomes().iter().map(|o| o.accuracy()).collect::<Vec<_>>()
    };
    assert_eq!(scores(&a), scores(&b));
}

#[test]
fn test_provider_failure_opens_no_runs() {
    let dir = tempfile::tempdir().unwrap();
    let mut tracker = Tracker::persistent(dir.path()).unwrap();
    let result = run_sweep(&Offline, &mut tracker, &SweepConfig::default());

    assert!(matches!(result, Err(Error::DataLoad(_))));
    assert!(tracker.store().is_empty());
    let store = ExperimentStore::load_dir(dir.path()).unwrap();
    assert_eq!(store.run_count(), 0);
}

#[test]
fn test_continue_policy_records_failed_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut tracker = Tracker::persistent(dir.path()).unwrap();
    let config = SweepConfig::default()
        .values([0.0, 0.1])
        .seed(5)
        .failure_policy(FailurePolicy::Continue);
    let report = run_sweep(&IrisProvider, &mut tracker, &config).unwrap();

    let failed = &report.outcomes()[0];
    assert!(failed.accuracy().is_none());
    assert!(failed.error().is_some());
    assert_eq!(report.best().unwrap().value(), 0.1);

    let store = ExperimentStore::load_dir(dir.path()).unwrap();
    let run = store.get_run(failed.run_id()).unwrap();
    assert_eq!(run.status(), RunStatus::Failed);
    assert!(run.error().unwrap().contains("Training error"));
    assert!(store.get_metrics_for_run(failed.run_id(), "accuracy").is_empty());
}

#[test]
fn test_invalid_test_fraction() {
    let mut tracker = Tracker::in_memory();
    let config = SweepConfig::default().test_fraction(1.5);
    assert!(matches!(
        run_sweep(&IrisProvider, &mut tracker, &config),
        Err(Error::InvalidConfig(_))
    ));
    assert_eq!(tracker.store().run_count(), 0);
}
