//! Operator kernels over `f64` tensors

use crate::export::onnx::NodeProto;
use crate::{Error, Result};
use ndarray::{ArrayD, ArrayView2, IxDyn, Zip};

/// Operators the session can evaluate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    /// 2-D matrix product
    MatMul,
    /// Broadcasting elementwise sum
    Add,
    /// Broadcasting elementwise difference
    Sub,
    /// Broadcasting elementwise product
    Mul,
    /// `alpha * op(A) @ op(B) + beta * C`
    Gemm {
        /// Product scale
        alpha: f64,
        /// Bias scale
        beta: f64,
        /// Transpose `A` first
        trans_a: bool,
        /// Transpose `B` first
        trans_b: bool,
    },
    /// Pass-through
    Identity,
}

impl Op {
    /// Resolve a node's operator and attributes.
    ///
    /// Returns `None` for operators outside the supported set.
    pub fn from_node(node: &NodeProto) -> Option<Self> {
        if !node.domain.is_empty() && node.domain != "ai.onnx" {
            return None;
        }
        Some(match node.op_type.as_str() {
            "MatMul" => Self::MatMul,
            "Add" => Self::Add,
            "Sub" => Self::Sub,
            "Mul" => Self::Mul,
            "Identity" => Self::Identity,
            "Gemm" => Self::Gemm {
                alpha: node.attribute("alpha").map_or(1.0, |a| f64::from(a.f)),
                beta: node.attribute("beta").map_or(1.0, |a| f64::from(a.f)),
                trans_a: node.attribute("transA").is_some_and(|a| a.i != 0),
                trans_b: node.attribute("transB").is_some_and(|a| a.i != 0),
            },
            _ => return None,
        })
    }

    /// Number of inputs the operator accepts, as `(min, max)`.
    pub const fn arity(self) -> (usize, usize) {
        match self {
            Self::Identity => (1, 1),
            Self::Gemm { .. } => (2, 3),
            Self::MatMul | Self::Add | Self::Sub | Self::Mul => (2, 2),
        }
    }

    /// Evaluate on already resolved inputs.
    pub fn eval(self, inputs: &[&ArrayD<f64>]) -> Result<ArrayD<f64>> {
        match (self, inputs) {
            (Self::Identity, [x]) => Ok((*x).clone()),
            (Self::Add, [a, b]) => broadcast_with(a, b, |x, y| x + y),
            (Self::Sub, [a, b]) => broadcast_with(a, b, |x, y| x - y),
            (Self::Mul, [a, b]) => broadcast_with(a, b, |x, y| x * y),
            (Self::MatMul, [a, b]) => {
                let (a, b) = (as_matrix(a, "MatMul")?, as_matrix(b, "MatMul")?);
                check_inner(a, b, "MatMul")?;
                Ok(a.dot(&b).into_dyn())
            }
            (
                Self::Gemm {
                    alpha,
                    beta,
                    trans_a,
                    trans_b,
                },
                [a, b, rest @ ..],
            ) => {
                let a = as_matrix(a, "Gemm")?;
                let b = as_matrix(b, "Gemm")?;
                let a = if trans_a { a.t() } else { a };
                let b = if trans_b { b.t() } else { b };
                check_inner(a, b, "Gemm")?;
                let product = (a.dot(&b) * alpha).into_dyn();
                match rest {
                    [] => Ok(product),
                    [c] => broadcast_with(&product, c, |p, c| p + beta * c),
                    _ => Err(arity_error(self, inputs.len())),
                }
            }
            _ => Err(arity_error(self, inputs.len())),
        }
    }
}

fn arity_error(op: Op, got: usize) -> Error {
    Error::Inference(format!("{op:?} received {got} inputs"))
}

fn as_matrix<'a>(x: &'a ArrayD<f64>, op: &str) -> Result<ArrayView2<'a, f64>> {
    x.view()
        .into_dimensionality()
        .map_err(|_| {
            Error::Inference(format!("{op} expects 2-D operands, got shape {:?}", x.shape()))
        })
}

fn check_inner(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>, op: &str) -> Result<()> {
    if a.ncols() == b.nrows() {
        Ok(())
    } else {
        Err(Error::Inference(format!(
            "{op} inner dimensions differ: {:?} x {:?}",
            a.shape(),
            b.shape()
        )))
    }
}

/// Numpy-style broadcast shape of two shapes.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let rank = a.len().max(b.len());
    let dim = |shape: &[usize], i: usize| {
        let offset = rank - shape.len();
        if i < offset {
            1
        } else {
            shape[i - offset]
        }
    };
    (0..rank)
        .map(|i| match (dim(a, i), dim(b, i)) {
            (x, y) if x == y => Some(x),
            (1, y) => Some(y),
            (x, 1) => Some(x),
            _ => None,
        })
        .collect()
}

fn broadcast_with<F>(a: &ArrayD<f64>, b: &ArrayD<f64>, f: F) -> Result<ArrayD<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    let shape = broadcast_shape(a.shape(), b.shape()).ok_or_else(|| {
        Error::Inference(format!(
            "shapes {:?} and {:?} do not broadcast",
            a.shape(),
            b.shape()
        ))
    })?;
    let dims = IxDyn(&shape);
    // Both broadcasts succeed once the common shape exists.
    let (Some(av), Some(bv)) = (a.broadcast(dims.clone()), b.broadcast(dims)) else {
        return Err(Error::Inference("broadcast failed".to_string()));
    };
    Ok(Zip::from(&av).and(&bv).map_collect(|&x, &y| f(x, y)))
}
