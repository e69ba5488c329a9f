//! Saved tensor shared between tracked handles and tape nodes.

use crate::scalar::Scalar;
use crate::tensor::DenseTensor;
use std::rc::Rc;

/// Immutable tensor value kept alive for the backward pass.
///
/// Uses `Rc` for cheap cloning: the value a tracked handle exposes, the
/// output a tape node remembers and the operands a local gradient saves
/// are all the same buffer. Tapes are single-threaded, so `Arc` is not
/// needed. The buffer is released when the last holder drops.
#[derive(Debug)]
pub struct SavedTensor<T: Scalar> {
    data: Rc<DenseTensor<T>>,
}

impl<T: Scalar> SavedTensor<T> {
    pub fn new(tensor: DenseTensor<T>) -> Self {
        Self {
            data: Rc::new(tensor),
        }
    }

    /// Get reference to saved data.
    pub fn get(&self) -> &DenseTensor<T> {
        &self.data
    }

    /// Copy the saved value out as an owned tensor.
    ///
    /// Avoids the copy when this is the last holder.
    pub fn materialize(self) -> DenseTensor<T> {
        Rc::try_unwrap(self.data).unwrap_or_else(|shared| (*shared).clone())
    }

    /// Whether two saved tensors share one buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl<T: Scalar> Clone for SavedTensor<T> {
    fn clone(&self) -> Self {
        Self {
            data: Rc::clone(&self.data),
        }
    }
}
