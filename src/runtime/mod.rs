//! Inference sessions over exported ONNX models
//!
//! A session decodes a model file once, checks every node against the
//! supported operator set and resolves initializers into `f64` tensors.
//! [`InferenceSession::run`] then evaluates the nodes in file order.
//!
//! Sessions own everything they need; the native model that produced the
//! file can be dropped before or after loading.

mod ops;

use crate::export::onnx::{data_type, ModelProto, TensorProto, ValueInfoProto};
use crate::{Error, Result};
use ndarray::{ArrayD, ArrayView2, IxDyn};
use ops::Op;
use prost::Message;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
struct Node {
    op: Op,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

#[derive(Debug, Clone)]
struct GraphInput {
    name: String,
    /// Trailing dimension, when the file fixes it.
    width: Option<usize>,
}

/// A loaded model ready for repeated evaluation.
#[derive(Debug, Clone)]
pub struct InferenceSession {
    path: PathBuf,
    inputs: Vec<GraphInput>,
    outputs: Vec<String>,
    initializers: HashMap<String, ArrayD<f64>>,
    nodes: Vec<Node>,
}

impl InferenceSession {
    /// Load and validate a model file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionLoad`] if the file is missing, cannot be
    /// decoded, has no graph or default-domain opset, uses an unsupported
    /// operator or element type, or references a value nothing produces.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| Error::SessionLoad(format!("Failed to read {}: {e}", path.display())))?;
        let session = Self::from_bytes(&bytes, path)?;
        info!(
            path = %path.display(),
            nodes = session.nodes.len(),
            inputs = session.inputs.len(),
            "loaded inference session"
        );
        Ok(session)
    }

    fn from_bytes(bytes: &[u8], path: &Path) -> Result<Self> {
        let model = ModelProto::decode(bytes)
            .map_err(|e| Error::SessionLoad(format!("Failed to decode {}: {e}", path.display())))?;

        if !model.opset_import.iter().any(|o| o.domain.is_empty() || o.domain == "ai.onnx") {
            return Err(Error::SessionLoad("model imports no default-domain opset".to_string()));
        }
        let graph = model
            .graph
            .ok_or_else(|| Error::SessionLoad("model has no graph".to_string()))?;

        let mut initializers = HashMap::with_capacity(graph.initializer.len());
        for tensor in &graph.initializer {
            initializers.insert(tensor.name.clone(), decode_tensor(tensor)?);
        }

        let inputs = graph
            .input
            .iter()
            .filter(|info| !initializers.contains_key(&info.name))
            .map(graph_input)
            .collect::<Result<Vec<_>>>()?;
        if inputs.is_empty() {
            return Err(Error::SessionLoad("graph declares no inputs".to_string()));
        }

        let mut available: HashSet<&str> = initializers.keys().map(String::as_str).collect();
        available.extend(inputs.iter().map(|i| i.name.as_str()));

        let mut nodes = Vec::with_capacity(graph.node.len());
        for proto in &graph.node {
            let op = Op::from_node(proto).ok_or_else(|| {
                Error::SessionLoad(format!(
                    "unsupported operator '{}' in node '{}'",
                    proto.op_type, proto.name
                ))
            })?;
            let (min, max) = op.arity();
            if !(min..=max).contains(&proto.input.len()) || proto.output.len() != 1 {
                return Err(Error::SessionLoad(format!(
                    "node '{}' has {} inputs and {} outputs",
                    proto.name,
                    proto.input.len(),
                    proto.output.len()
                )));
            }
            if let Some(missing) = proto.input.iter().find(|i| !available.contains(i.as_str())) {
                return Err(Error::SessionLoad(format!(
                    "node '{}' reads '{missing}', not produced earlier in the graph",
                    proto.name
                )));
            }
            available.extend(proto.output.iter().map(String::as_str));
            nodes.push(Node {
                op,
                inputs: proto.input.clone(),
                outputs: proto.output.clone(),
            });
        }

        let outputs: Vec<String> = graph.output.iter().map(|o| o.name.clone()).collect();
        if outputs.is_empty() {
            return Err(Error::SessionLoad("graph declares no outputs".to_string()));
        }
        if let Some(missing) = outputs.iter().find(|o| !available.contains(o.as_str())) {
            return Err(Error::SessionLoad(format!("graph output '{missing}' is never produced")));
        }

        Ok(Self {
            path: path.to_path_buf(),
            inputs,
            outputs,
            initializers,
            nodes,
        })
    }

    /// File the session was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the values a caller must feed, in graph order.
    #[must_use]
    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|i| i.name.as_str()).collect()
    }

    /// Names of the values [`InferenceSession::run`] returns, in order.
    #[must_use]
    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(String::as_str).collect()
    }

    /// Evaluate the graph on named inputs.
    ///
    /// Returns one tensor per graph output, in [`InferenceSession::output_names`]
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inference`] for an unknown, duplicate or missing input
    /// name, an input whose width differs from the declared one, or a shape
    /// mismatch inside an operator.
    pub fn run(&self, feeds: &[(&str, ArrayView2<'_, f64>)]) -> Result<Vec<ArrayD<f64>>> {
        let mut values: HashMap<&str, ArrayD<f64>> =
            HashMap::with_capacity(self.nodes.len() + feeds.len());

        for (name, array) in feeds {
            let input = self
                .inputs
                .iter()
                .find(|i| i.name == *name)
                .ok_or_else(|| Error::Inference(format!("unknown input '{name}'")))?;
            if let Some(width) = input.width {
                if array.ncols() != width {
                    return Err(Error::Inference(format!(
                        "input '{name}' expects {width} features, got {}",
                        array.ncols()
                    )));
                }
            }
            if values.insert(input.name.as_str(), array.to_owned().into_dyn()).is_some() {
                return Err(Error::Inference(format!("input '{name}' fed twice")));
            }
        }
        if let Some(missing) = self.inputs.iter().find(|i| !values.contains_key(i.name.as_str())) {
            return Err(Error::Inference(format!("missing input '{}'", missing.name)));
        }

        for node in &self.nodes {
            let args = node
                .inputs
                .iter()
                .map(|name| {
                    values
                        .get(name.as_str())
                        .or_else(|| self.initializers.get(name))
                        .ok_or_else(|| Error::Inference(format!("value '{name}' is not available")))
                })
                .collect::<Result<Vec<_>>>()?;
            let result = node.op.eval(&args)?;
            values.insert(node.outputs[0].as_str(), result);
        }

        self.outputs
            .iter()
            .map(|name| {
                values
                    .remove(name.as_str())
                    .or_else(|| self.initializers.get(name).cloned())
                    .ok_or_else(|| Error::Inference(format!("output '{name}' was not computed")))
            })
            .collect()
    }
}

fn graph_input(info: &ValueInfoProto) -> Result<GraphInput> {
    let tensor = info
        .tensor_type()
        .ok_or_else(|| Error::SessionLoad(format!("input '{}' is not a tensor", info.name)))?;
    if !matches!(tensor.elem_type, data_type::DOUBLE | data_type::FLOAT) {
        return Err(Error::SessionLoad(format!(
            "input '{}' has unsupported element type {}",
            info.name, tensor.elem_type
        )));
    }
    let width = tensor
        .shape
        .as_ref()
        .and_then(|s| s.dim.last())
        .and_then(|d| d.size())
        .and_then(|n| usize::try_from(n).ok());
    Ok(GraphInput {
        name: info.name.clone(),
        width,
    })
}

fn decode_tensor(tensor: &TensorProto) -> Result<ArrayD<f64>> {
    let shape = tensor
        .dims
        .iter()
        .map(|&d| usize::try_from(d))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| {
            Error::SessionLoad(format!(
                "initializer '{}' has a negative dimension",
                tensor.name
            ))
        })?;

    let data: Vec<f64> = match tensor.data_type {
        data_type::DOUBLE if tensor.raw_data.is_empty() => tensor.double_data.clone(),
        data_type::DOUBLE => tensor
            .raw_data
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect(),
        data_type::FLOAT if tensor.raw_data.is_empty() => {
            tensor.float_data.iter().copied().map(f64::from).collect()
        }
        data_type::FLOAT => tensor
            .raw_data
            .chunks_exact(4)
            .map(|c| f64::from(f32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect(),
        other => {
            return Err(Error::SessionLoad(format!(
                "initializer '{}' has unsupported data type {other}",
                tensor.name
            )))
        }
    };

    ArrayD::from_shape_vec(IxDyn(&shape), data).map_err(|e| {
        Error::SessionLoad(format!(
            "initializer '{}' does not match its shape {shape:?}: {e}",
            tensor.name
        ))
    })
}
