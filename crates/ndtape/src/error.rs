//! Error types for ndtape.

use crate::autodiff::TensorId;
use thiserror::Error;

/// Errors raised by tensor construction and the numeric kernels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TensorError {
    /// Shape mismatch between data length and expected size.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Elementwise operands with different shapes.
    #[error("dimension mismatch: {lhs:?} vs {rhs:?}")]
    DimMismatch { lhs: Vec<usize>, rhs: Vec<usize> },
}

/// Errors raised while recording onto a tape or running a backward pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TapeError {
    /// The differentiation target was never recorded as a node output.
    #[error("cannot compute gradient: tensor {id} is not part of this tape")]
    NotOnTape { id: TensorId },

    /// A node on the path from the sources to the target is not differentiable.
    #[error("cannot compute gradient: gradient function not found for `{op}`")]
    MissingGradientFunction { op: String },

    /// A tensor may have exactly one producing node.
    #[error("tensor {id} already has a producing node on this tape")]
    DuplicateProducer { id: TensorId },

    /// A local gradient returned a role the node does not have.
    #[error("operation `{op}` has no input role `{role}`")]
    UnknownRole { op: String, role: String },

    /// A relevant node was reached without any gradient for its output.
    #[error("no gradient reached output {id} of `{op}`")]
    MissingOutputGradient { op: String, id: TensorId },

    /// A local gradient or an accumulation step failed.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
