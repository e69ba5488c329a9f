//! Backward pass execution for reverse-mode automatic differentiation.

use super::gradients::Gradients;
use super::subgraph::{FilteredSubgraph, filter_nodes};
use super::tape::{Tape, TapeNode};
use super::tensor::TensorId;
use crate::backend::{Backend, GenericBackend};
use crate::error::TapeError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;
use log::{debug, trace};

impl<T: Scalar> Tape<T> {
    /// Gradient of `target` with respect to each of `sources`.
    ///
    /// Walks the operations connecting the sources to the target in reverse,
    /// seeding the target with ones of its shape and summing contributions
    /// for tensors with several consumers. Entry `i` of the result belongs
    /// to `sources[i]`; it is `None` when no recorded path leads from that
    /// source to the target, which is distinct from a zero gradient.
    ///
    /// # Errors
    ///
    /// - `TapeError::NotOnTape` if no node on this tape produced `target`
    /// - `TapeError::MissingGradientFunction` if an operation on a path
    ///   from a source to the target has no local gradient
    /// - `TapeError::Tensor` if a local gradient or a sum fails
    ///
    /// # Example
    ///
    /// ```
    /// use ndtape::DenseTensor;
    /// use ndtape::autodiff::{Tape, TrackedTensor, tracked_add, tracked_mul};
    /// use ndtape::backend::GenericBackend;
    ///
    /// let mut tape = Tape::new();
    /// let a = TrackedTensor::new(DenseTensor::from_vec(vec![2.0, 3.0], &[2]).unwrap());
    /// let b = TrackedTensor::new(DenseTensor::from_vec(vec![5.0, 7.0], &[2]).unwrap());
    ///
    /// // z = a * b + a
    /// let y = tracked_mul(&mut tape, &a, &b).unwrap();
    /// let z = tracked_add(&mut tape, &y, &a).unwrap();
    ///
    /// let grads = tape.gradient_wrt(&GenericBackend, z.id(), &[a.id(), b.id()]).unwrap();
    /// assert_eq!(grads[0].as_ref().unwrap().data(), &[6.0, 8.0]);
    /// assert_eq!(grads[1].as_ref().unwrap().data(), &[2.0, 3.0]);
    /// ```
    pub fn gradient_wrt<B: Backend<T>>(
        &self,
        backend: &B,
        target: TensorId,
        sources: &[TensorId],
    ) -> Result<Vec<Option<DenseTensor<T>>>, TapeError> {
        let producer = self
            .producer_index(target)
            .ok_or(TapeError::NotOnTape { id: target })?;

        // Nothing recorded after the target's producer can feed it.
        let nodes = &self.nodes()[..=producer];
        let subgraph = filter_nodes(nodes, sources, target);
        debug!(
            "backward: target {}, {} sources, {} of {} nodes on path",
            target,
            sources.len(),
            subgraph.len(),
            self.len()
        );

        let mut gradients = Gradients::new();
        let seed = backend.fill(nodes[producer].output().shape(), T::one());
        gradients.insert(target, seed);

        for &index in subgraph.node_indices().iter().rev() {
            backprop_node(&nodes[index], backend, &subgraph, sources, &mut gradients)?;
        }

        trace!("backward: {} gradients live after walk", gradients.len());
        Ok(collect_results(gradients, sources))
    }

    /// [`gradient_wrt`](Self::gradient_wrt) using [`GenericBackend`].
    pub fn gradient_wrt_generic(
        &self,
        target: TensorId,
        sources: &[TensorId],
    ) -> Result<Vec<Option<DenseTensor<T>>>, TapeError> {
        self.gradient_wrt(&GenericBackend, target, sources)
    }
}

/// Push the gradient of one node's output through its local gradient.
fn backprop_node<T: Scalar, B: Backend<T>>(
    node: &TapeNode<T>,
    backend: &B,
    subgraph: &FilteredSubgraph,
    sources: &[TensorId],
    gradients: &mut Gradients<T>,
) -> Result<(), TapeError> {
    let output = node.output_id();
    let grad_output = gradients
        .remove(output)
        .ok_or_else(|| TapeError::MissingOutputGradient {
            op: node.name().to_string(),
            id: output,
        })?;

    let grad_fn = node
        .grad_fn()
        .ok_or_else(|| TapeError::MissingGradientFunction {
            op: node.name().to_string(),
        })?;

    trace!("backward: visiting `{}` -> {}", node.name(), output);
    let input_grads = grad_fn.backward(&grad_output, node.output().tensor())?;

    for (role, grad) in input_grads {
        let input = node.input(role).ok_or_else(|| TapeError::UnknownRole {
            op: node.name().to_string(),
            role: role.to_string(),
        })?;
        if !subgraph.is_on_path(input) {
            // Constant operand or unrelated leaf: nobody asked for it.
            continue;
        }
        gradients.accumulate(backend, input, grad)?;
    }

    // Requested intermediates keep their gradient; everything else is
    // released here.
    if sources.contains(&output) {
        gradients.insert(output, grad_output);
    }
    Ok(())
}

/// Hand the requested gradients to the caller in request order.
fn collect_results<T: Scalar>(
    mut gradients: Gradients<T>,
    sources: &[TensorId],
) -> Vec<Option<DenseTensor<T>>> {
    sources
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            if sources[i + 1..].contains(&id) {
                gradients.get(id).cloned()
            } else {
                gradients.remove(id)
            }
        })
        .collect()
}

/// [`Tape::gradient_wrt`] on the thread-local f64 tape with [`GenericBackend`].
#[cfg(feature = "thread-tape")]
pub fn gradient_wrt_f64(
    target: TensorId,
    sources: &[TensorId],
) -> Result<Vec<Option<DenseTensor<f64>>>, TapeError> {
    super::tape::with_tape_f64(|tape| tape.gradient_wrt(&GenericBackend, target, sources))
}
