//! Gradient accumulation map for a single backward pass.

use super::tensor::TensorId;
use crate::backend::Backend;
use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;
use log::trace;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Accumulated gradients keyed by tensor id.
///
/// Owned by one backward pass. Fan-out contributions are summed through
/// the backend, off-tape, and the superseded buffer is released at once.
#[derive(Debug)]
pub(crate) struct Gradients<T: Scalar> {
    grads: HashMap<TensorId, DenseTensor<T>>,
}

impl<T: Scalar> Gradients<T> {
    pub(crate) fn new() -> Self {
        Self {
            grads: HashMap::new(),
        }
    }

    /// Store `grad` for `id`, replacing anything already there.
    pub(crate) fn insert(&mut self, id: TensorId, grad: DenseTensor<T>) {
        self.grads.insert(id, grad);
    }

    /// Add `grad` into the slot for `id`.
    ///
    /// The first contribution is stored as is.
    pub(crate) fn accumulate<B: Backend<T>>(
        &mut self,
        backend: &B,
        id: TensorId,
        grad: DenseTensor<T>,
    ) -> Result<(), TensorError> {
        match self.grads.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(grad);
            }
            Entry::Occupied(mut slot) => {
                trace!("backward: summing fan-out contribution into {}", id);
                let summed = backend.add(slot.get(), &grad)?;
                let previous = slot.insert(summed);
                drop(previous);
            }
        }
        Ok(())
    }

    pub(crate) fn get(&self, id: TensorId) -> Option<&DenseTensor<T>> {
        self.grads.get(&id)
    }

    /// Remove and return gradient (for passing to backward functions).
    pub(crate) fn remove(&mut self, id: TensorId) -> Option<DenseTensor<T>> {
        self.grads.remove(&id)
    }

    /// Number of stored gradients.
    pub(crate) fn len(&self) -> usize {
        self.grads.len()
    }
}
