//! TrackedTensor - identity-bearing tensor handle.

use super::saved_tensor::SavedTensor;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TENSOR_ID: AtomicU64 = AtomicU64::new(0);

/// Stable identity of a tracked tensor.
///
/// Every id comes from a process-wide counter, so ids are never reused
/// and stay unique across tapes and threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(u64);

impl TensorId {
    /// Allocate a fresh id.
    pub fn fresh() -> Self {
        Self(NEXT_TENSOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    pub fn index(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A tensor value together with the identity a tape knows it by.
///
/// Creating a handle never touches a tape: a handle that no node produced
/// is a leaf. Cloning keeps the identity; [`detach`](Self::detach) makes a
/// new one.
///
/// # Example
///
/// ```
/// use ndtape::DenseTensor;
/// use ndtape::autodiff::TrackedTensor;
///
/// let a = TrackedTensor::new(DenseTensor::<f64>::ones(&[2, 3]));
/// let b = a.clone();
/// assert_eq!(a.id(), b.id());
/// assert_ne!(a.id(), a.detach().id());
/// ```
#[derive(Debug, Clone)]
pub struct TrackedTensor<T: Scalar> {
    id: TensorId,
    value: SavedTensor<T>,
}

impl<T: Scalar> TrackedTensor<T> {
    /// Wrap a tensor under a fresh identity.
    pub fn new(tensor: DenseTensor<T>) -> Self {
        Self {
            id: TensorId::fresh(),
            value: SavedTensor::new(tensor),
        }
    }

    #[inline]
    pub fn id(&self) -> TensorId {
        self.id
    }

    /// Get the underlying tensor.
    #[inline]
    pub fn tensor(&self) -> &DenseTensor<T> {
        self.value.get()
    }

    /// Shared handle to the value, for saving in a local gradient.
    pub fn saved(&self) -> SavedTensor<T> {
        self.value.clone()
    }

    /// Consume the handle and return the value.
    pub fn into_tensor(self) -> DenseTensor<T> {
        self.value.materialize()
    }

    pub fn shape(&self) -> &[usize] {
        self.tensor().shape()
    }

    pub fn ndim(&self) -> usize {
        self.tensor().ndim()
    }

    pub fn len(&self) -> usize {
        self.tensor().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensor().is_empty()
    }

    pub fn data(&self) -> &[T] {
        self.tensor().data()
    }

    /// Same value under a new identity, unknown to any tape.
    pub fn detach(&self) -> Self {
        Self {
            id: TensorId::fresh(),
            value: self.value.clone(),
        }
    }
}
