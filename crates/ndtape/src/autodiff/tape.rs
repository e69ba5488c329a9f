//! Operation tape for reverse-mode automatic differentiation.

use super::tensor::{TensorId, TrackedTensor};
use crate::error::{TapeError, TensorError};
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;
use log::trace;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{self, Debug};

/// Name of the input slot an operand fills (`"a"`, `"b"`, `"x"`, ...).
pub type Role = &'static str;

/// Per-input gradient contributions returned by a [`GradFn`].
pub type InputGrads<T> = Vec<(Role, DenseTensor<T>)>;

/// Local gradient of one recorded operation.
///
/// Given the gradient flowing into the operation's output and the output
/// value itself, returns the chain-rule contribution for each input role.
/// Each returned tensor must have the shape of the input filling that role.
pub trait GradFn<T: Scalar> {
    fn backward(
        &self,
        grad_output: &DenseTensor<T>,
        output: &DenseTensor<T>,
    ) -> Result<InputGrads<T>, TensorError>;
}

impl<T, F> GradFn<T> for F
where
    T: Scalar,
    F: Fn(&DenseTensor<T>, &DenseTensor<T>) -> Result<InputGrads<T>, TensorError>,
{
    fn backward(
        &self,
        grad_output: &DenseTensor<T>,
        output: &DenseTensor<T>,
    ) -> Result<InputGrads<T>, TensorError> {
        self(grad_output, output)
    }
}

/// Box a closure as a local gradient.
///
/// # Example
///
/// ```
/// use ndtape::DenseTensor;
/// use ndtape::autodiff::{Tape, TrackedTensor, local_gradient};
///
/// let mut tape = Tape::new();
/// let x = TrackedTensor::new(DenseTensor::from_vec(vec![1.0, 2.0], &[2]).unwrap());
/// let y = tape
///     .record(
///         "identity",
///         [("x", x.id())],
///         x.tensor().clone(),
///         Some(local_gradient(|dy: &DenseTensor<f64>, _y: &DenseTensor<f64>| {
///             Ok(vec![("x", dy.clone())])
///         })),
///     )
///     .unwrap();
/// assert!(tape.contains(y.id()));
/// ```
pub fn local_gradient<T, F>(f: F) -> Box<dyn GradFn<T>>
where
    T: Scalar,
    F: Fn(&DenseTensor<T>, &DenseTensor<T>) -> Result<InputGrads<T>, TensorError> + 'static,
{
    Box::new(f)
}

/// One executed operation as recorded on a tape.
pub struct TapeNode<T: Scalar> {
    name: String,
    inputs: SmallVec<[(Role, TensorId); 2]>,
    output: TrackedTensor<T>,
    /// `None` marks a non-differentiable operation.
    grad_fn: Option<Box<dyn GradFn<T>>>,
}

impl<T: Scalar> TapeNode<T> {
    pub fn new(
        name: impl Into<String>,
        inputs: impl IntoIterator<Item = (Role, TensorId)>,
        output: TrackedTensor<T>,
        grad_fn: Option<Box<dyn GradFn<T>>>,
    ) -> Self {
        Self {
            name: name.into(),
            inputs: inputs.into_iter().collect(),
            output,
            grad_fn,
        }
    }

    /// Operation name, for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inputs in recording order.
    pub fn inputs(&self) -> &[(Role, TensorId)] {
        &self.inputs
    }

    /// Tensor filling `role`, if the node has that role.
    pub fn input(&self, role: &str) -> Option<TensorId> {
        self.inputs
            .iter()
            .find(|(r, _)| *r == role)
            .map(|&(_, id)| id)
    }

    pub fn output(&self) -> &TrackedTensor<T> {
        &self.output
    }

    pub fn output_id(&self) -> TensorId {
        self.output.id()
    }

    pub fn grad_fn(&self) -> Option<&dyn GradFn<T>> {
        self.grad_fn.as_deref()
    }
}

impl<T: Scalar> Debug for TapeNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapeNode")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("output", &self.output.id())
            .field("differentiable", &self.grad_fn.is_some())
            .finish()
    }
}

/// Append-only log of executed operations.
///
/// Nodes are kept in execution order and indexed by the id of the tensor
/// they produced. Every tensor has at most one producer. Nodes are never
/// removed or reordered; drop the tape to discard its history.
pub struct Tape<T: Scalar> {
    nodes: Vec<TapeNode<T>>,
    output_index: HashMap<TensorId, usize>,
}

impl<T: Scalar> Tape<T> {
    /// Create a new empty tape.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            output_index: HashMap::new(),
        }
    }

    /// Create an empty tape with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            output_index: HashMap::with_capacity(capacity),
        }
    }

    /// Append a node.
    ///
    /// # Errors
    ///
    /// `TapeError::DuplicateProducer` if the node's output already has a
    /// producer on this tape. The tape is left unchanged.
    pub fn append(&mut self, node: TapeNode<T>) -> Result<(), TapeError> {
        let id = node.output_id();
        if self.output_index.contains_key(&id) {
            return Err(TapeError::DuplicateProducer { id });
        }
        trace!("tape: recording `{}` -> {}", node.name(), id);
        self.output_index.insert(id, self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Record an executed operation whose result is `value`.
    ///
    /// The result gets a fresh identity; the returned handle is the
    /// tracked output.
    pub fn record(
        &mut self,
        name: impl Into<String>,
        inputs: impl IntoIterator<Item = (Role, TensorId)>,
        value: DenseTensor<T>,
        grad_fn: Option<Box<dyn GradFn<T>>>,
    ) -> Result<TrackedTensor<T>, TapeError> {
        let output = TrackedTensor::new(value);
        self.append(TapeNode::new(name, inputs, output.clone(), grad_fn))?;
        Ok(output)
    }

    /// Node that produced `id`, if any.
    pub fn lookup_producer(&self, id: TensorId) -> Option<&TapeNode<T>> {
        self.producer_index(id).map(|i| &self.nodes[i])
    }

    pub(crate) fn producer_index(&self, id: TensorId) -> Option<usize> {
        self.output_index.get(&id).copied()
    }

    /// Whether `id` was produced by a node on this tape.
    pub fn contains(&self, id: TensorId) -> bool {
        self.output_index.contains_key(&id)
    }

    /// All nodes in execution order.
    pub fn nodes(&self) -> &[TapeNode<T>] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<T: Scalar> Default for Tape<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> Debug for Tape<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tape")
            .field("num_nodes", &self.nodes.len())
            .finish()
    }
}

#[cfg(feature = "thread-tape")]
thread_local! {
    static TAPE_F64: std::cell::RefCell<Tape<f64>> = std::cell::RefCell::new(Tape::new());
}

/// Access the thread-local default tape for f64.
///
/// # Example
///
/// ```
/// use ndtape::DenseTensor;
/// use ndtape::autodiff::{TrackedTensor, clear_tape_f64, tracked_add, with_tape_f64};
///
/// clear_tape_f64();
/// let a = TrackedTensor::new(DenseTensor::<f64>::ones(&[2]));
/// let b = with_tape_f64(|tape| tracked_add(tape, &a, &a)).unwrap();
/// assert_eq!(b.data(), &[2.0, 2.0]);
/// ```
#[cfg(feature = "thread-tape")]
pub fn with_tape_f64<R>(f: impl FnOnce(&mut Tape<f64>) -> R) -> R {
    TAPE_F64.with(|t| f(&mut t.borrow_mut()))
}

/// Discard the thread-local f64 tape and start a fresh one.
#[cfg(feature = "thread-tape")]
pub fn clear_tape_f64() {
    with_tape_f64(|t| *t = Tape::new());
}
