//! Export of fitted models to ONNX
//!
//! Only linear regressors have a portable representation. A regressor with
//! coefficients `w` and intercept `b` becomes
//!
//! ```text
//! X [N, n_features]
//!   --MatMul(coefficients [n_features, 1])--> weighted [N, 1]
//!   --Add(intercept [1])--> variable [N, 1]
//! ```
//!
//! with all tensors in double precision, so an inference session reproduces
//! the native predictions up to float rounding.

pub mod onnx;

use crate::atomic::write_atomic;
use crate::experiment::content_hash;
use crate::model::{FittedModel, FittedRegressor};
use crate::{Error, Result};
use ndarray::ArrayView2;
use onnx::tensor_shape_proto::Dimension;
use onnx::{
    data_type, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto, ValueInfoProto,
};
use prost::Message;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Symbolic name of the batch dimension.
const BATCH_DIM: &str = "N";

/// Names and shape of the graph boundary, derived from a sample input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    /// Graph input name
    pub input_name: String,
    /// Graph output name
    pub output_name: String,
    /// Columns per row
    pub n_features: usize,
}

/// A model family that can be written as an ONNX graph.
pub trait OnnxExportable {
    /// Build the graph computing this model's predictions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `input` does not match the model.
    fn to_graph(&self, input: &InputSpec) -> Result<GraphProto>;
}

impl OnnxExportable for FittedRegressor {
    fn to_graph(&self, input: &InputSpec) -> Result<GraphProto> {
        if input.n_features != self.n_features() {
            return Err(Error::InvalidConfig(format!(
                "sample has {} columns, model expects {}",
                input.n_features,
                self.n_features()
            )));
        }
        let width = to_dim(input.n_features)?;

        Ok(GraphProto {
            node: vec![
                NodeProto::new(
                    "MatMul",
                    "linear_matmul",
                    &[input.input_name.as_str(), "coefficients"],
                    &["weighted"],
                ),
                NodeProto::new(
                    "Add",
                    "linear_add",
                    &["weighted", "intercept"],
                    &[input.output_name.as_str()],
                ),
            ],
            name: "linear_regression".to_string(),
            initializer: vec![
                TensorProto::doubles("coefficients", &[width, 1], self.coefficients().to_vec()),
                TensorProto::doubles("intercept", &[1], vec![self.intercept()]),
            ],
            input: vec![ValueInfoProto::tensor(
                &input.input_name,
                data_type::DOUBLE,
                vec![Dimension::symbolic(BATCH_DIM), Dimension::fixed(width)],
            )],
            output: vec![ValueInfoProto::tensor(
                &input.output_name,
                data_type::DOUBLE,
                vec![Dimension::symbolic(BATCH_DIM), Dimension::fixed(1)],
            )],
            ..GraphProto::default()
        })
    }
}

fn to_dim(n: usize) -> Result<i64> {
    i64::try_from(n)
        .map_err(|_| Error::InvalidConfig(format!("dimension {n} does not fit in i64")))
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    input_name: String,
    output_name: String,
    opset_version: i64,
    ir_version: i64,
    producer_name: String,
    producer_version: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            input_name: "X".to_string(),
            output_name: "variable".to_string(),
            opset_version: 15,
            ir_version: 8,
            producer_name: env!("CARGO_PKG_NAME").to_string(),
            producer_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ExportConfig {
    /// Set the graph input name.
    #[must_use]
    pub fn input_name(mut self, name: impl Into<String>) -> Self {
        self.input_name = name.into();
        self
    }

    /// Set the graph output name.
    #[must_use]
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    /// Set the default-domain operator set version.
    #[must_use]
    pub const fn opset_version(mut self, version: i64) -> Self {
        self.opset_version = version;
        self
    }

    /// Set the file format IR version.
    #[must_use]
    pub const fn ir_version(mut self, version: i64) -> Self {
        self.ir_version = version;
        self
    }

    /// Set the producer recorded in the file.
    #[must_use]
    pub fn producer(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.producer_name = name.into();
        self.producer_version = version.into();
        self
    }

    /// Graph input name.
    #[must_use]
    pub fn get_input_name(&self) -> &str {
        &self.input_name
    }

    /// Graph output name.
    #[must_use]
    pub fn get_output_name(&self) -> &str {
        &self.output_name
    }

    fn validate(&self) -> Result<()> {
        if self.input_name.is_empty() || self.output_name.is_empty() {
            return Err(Error::InvalidConfig(
                "graph input and output names must be non-empty".to_string(),
            ));
        }
        if self.input_name == self.output_name {
            return Err(Error::InvalidConfig(format!(
                "graph input and output share the name '{}'",
                self.input_name
            )));
        }
        if self.opset_version < 1 || self.ir_version < 1 {
            return Err(Error::InvalidConfig(
                "opset and IR versions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A model file written by [`Exporter::export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedModel {
    path: PathBuf,
    size_bytes: u64,
    content_hash: String,
    input_name: String,
    output_name: String,
}

impl ExportedModel {
    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// `sha256:<hex>` hash of the file contents.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Graph input name.
    #[must_use]
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Graph output name.
    #[must_use]
    pub fn output_name(&self) -> &str {
        &self.output_name
    }
}

/// Converts fitted models to ONNX files.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    /// Exporter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exporter with custom settings.
    #[must_use]
    pub const fn with_config(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Current settings.
    #[must_use]
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Build the in-memory ONNX model.
    ///
    /// `sample` fixes the input width and must have at least one row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExportUnsupported`] for model families without an
    /// ONNX form and [`Error::InvalidConfig`] for a mismatched sample or
    /// invalid settings.
    pub fn to_model_proto(
        &self,
        model: &FittedModel,
        sample: ArrayView2<'_, f64>,
    ) -> Result<ModelProto> {
        let exportable = exportable(model)?;
        self.config.validate()?;
        if sample.nrows() == 0 {
            return Err(Error::InvalidConfig("export sample has no rows".to_string()));
        }

        let spec = InputSpec {
            input_name: self.config.input_name.clone(),
            output_name: self.config.output_name.clone(),
            n_features: sample.ncols(),
        };
        let graph = exportable.to_graph(&spec)?;

        Ok(ModelProto {
            ir_version: self.config.ir_version,
            producer_name: self.config.producer_name.clone(),
            producer_version: self.config.producer_version.clone(),
            graph: Some(graph),
            opset_import: vec![OperatorSetIdProto {
                domain: String::new(),
                version: self.config.opset_version,
            }],
            ..ModelProto::default()
        })
    }

    /// Serialize the model to ONNX bytes.
    ///
    /// The result depends only on the fitted parameters, the sample width
    /// and the settings.
    ///
    /// # Errors
    ///
    /// See [`Exporter::to_model_proto`].
    pub fn to_bytes(&self, model: &FittedModel, sample: ArrayView2<'_, f64>) -> Result<Vec<u8>> {
        let bytes = self.to_model_proto(model, sample)?.encode_to_vec();
        debug!(bytes = bytes.len(), kind = %model.kind(), "encoded ONNX model");
        Ok(bytes)
    }

    /// Write the model to `path`.
    ///
    /// The file appears atomically; on any failure nothing exists at `path`
    /// that was not there before.
    ///
    /// # Errors
    ///
    /// See [`Exporter::to_model_proto`]; also [`Error::Io`] if the file
    /// cannot be written.
    pub fn export(
        &self,
        model: &FittedModel,
        sample: ArrayView2<'_, f64>,
        path: impl AsRef<Path>,
    ) -> Result<ExportedModel> {
        let path = path.as_ref();
        let bytes = self.to_bytes(model, sample)?;
        write_atomic(path, &bytes)?;

        info!(path = %path.display(), bytes = bytes.len(), "exported model");
        Ok(ExportedModel {
            path: path.to_path_buf(),
            size_bytes: bytes.len() as u64,
            content_hash: content_hash(&bytes),
            input_name: self.config.input_name.clone(),
            output_name: self.config.output_name.clone(),
        })
    }
}

fn exportable(model: &FittedModel) -> Result<&dyn OnnxExportable> {
    match model {
        FittedModel::Regressor(regressor) => Ok(regressor),
        FittedModel::Classifier(_) => Err(Error::ExportUnsupported(format!(
            "no ONNX conversion is registered for {} models",
            model.kind()
        ))),
    }
}
