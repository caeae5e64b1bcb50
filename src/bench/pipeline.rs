//! Train, export, reload and time a linear regressor end to end

use super::{compare, BenchmarkResult, Predictor};
use crate::dataset::synthetic;
use crate::export::{ExportConfig, ExportedModel, Exporter};
use crate::metrics::max_abs_error;
use crate::model::{LinearRegressor, Trainer};
use crate::runtime::InferenceSession;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::info;

/// Settings for [`run_pipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkConfig {
    n_samples: usize,
    slope: f64,
    intercept: f64,
    repetitions: usize,
    model_path: PathBuf,
    seed: Option<u64>,
    export: ExportConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            slope: 3.0,
            intercept: 5.0,
            repetitions: 10_000,
            model_path: PathBuf::from("model.onnx"),
            seed: None,
            export: ExportConfig::default(),
        }
    }
}

impl BenchmarkConfig {
    /// Set the number of generated rows.
    #[must_use]
    pub const fn n_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    /// Set the generating line `y = slope * x + intercept`.
    #[must_use]
    pub const fn line(mut self, slope: f64, intercept: f64) -> Self {
        self.slope = slope;
        self.intercept = intercept;
        self
    }

    /// Set how many predictions are timed per side.
    #[must_use]
    pub const fn repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// Set where the exported model is written.
    #[must_use]
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    /// Seed data generation. Unseeded runs draw from OS entropy.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set export options.
    #[must_use]
    pub fn export(mut self, export: ExportConfig) -> Self {
        self.export = export;
        self
    }

    /// Where the exported model is written.
    #[must_use]
    pub fn get_model_path(&self) -> &Path {
        &self.model_path
    }
}

/// Everything [`run_pipeline`] measured.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Written model file
    pub exported: ExportedModel,
    /// Timings
    pub benchmark: BenchmarkResult,
    /// Largest native-vs-session prediction gap over the training inputs
    pub max_abs_difference: f64,
    /// Fitted slope per feature
    pub coefficients: Vec<f64>,
    /// Fitted intercept
    pub intercept: f64,
}

/// Generate data, fit, export, load the export and time both predictors.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for a zero sample or repetition count and
/// otherwise the first error of any stage.
pub fn run_pipeline(config: &BenchmarkConfig) -> Result<PipelineReport> {
    if config.repetitions == 0 {
        return Err(Error::InvalidConfig("repetitions must be at least 1".to_string()));
    }

    let mut rng = config
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let data = synthetic::linear(config.n_samples, config.slope, config.intercept, &mut rng)?;
    info!(rows = data.n_rows(), "generated regression data");

    let model = LinearRegressor::new().fit(&data)?;
    let Some(regressor) = model.as_regressor() else {
        return Err(Error::Training("linear trainer returned a non-regressor".to_string()));
    };
    let coefficients = regressor.coefficients().to_vec();
    let intercept = regressor.intercept();
    info!(?coefficients, intercept, "fitted linear model");

    let exported = Exporter::with_config(config.export.clone()).export(
        &model,
        data.features(),
        &config.model_path,
    )?;
    let session = InferenceSession::load(exported.path())?;

    let native = model.predict_batch(data.features())?;
    let reloaded = session.predict_batch(data.features())?;
    let max_abs_difference = max_abs_error(
        &native.iter().copied().collect::<Vec<_>>(),
        &reloaded.iter().copied().collect::<Vec<_>>(),
    )?;
    info!(max_abs_difference, "compared native and session predictions");

    let benchmark = compare(&model, &session, data.features(), config.repetitions)?;

    Ok(PipelineReport {
        exported,
        benchmark,
        max_abs_difference,
        coefficients,
        intercept,
    })
}
