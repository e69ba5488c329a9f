//! Dense n-dimensional tensor.
//!
//! `DenseTensor` is the value type flowing through the tape: forward
//! results, saved operands and gradients are all dense buffers. A tensor
//! with an empty shape is a scalar holding exactly one element.

use crate::error::TensorError;
use crate::scalar::Scalar;

/// A shaped, contiguous element buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseTensor<T: Scalar> {
    data: Vec<T>,
    shape: Vec<usize>,
}

/// Number of elements implied by a shape (at least 1 for scalars).
#[inline]
pub(crate) fn shape_len(shape: &[usize]) -> usize {
    shape.iter().product::<usize>().max(1)
}

impl<T: Scalar> DenseTensor<T> {
    /// Create a zero-initialized tensor.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndtape::DenseTensor;
    ///
    /// let t: DenseTensor<f64> = DenseTensor::zeros(&[2, 3, 4]);
    /// assert_eq!(t.shape(), &[2, 3, 4]);
    /// assert_eq!(t.len(), 24);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, T::zero())
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, T::one())
    }

    /// Create a tensor with every element set to `value`.
    pub fn full(shape: &[usize], value: T) -> Self {
        Self {
            data: vec![value; shape_len(shape)],
            shape: shape.to_vec(),
        }
    }

    /// Create a rank-0 tensor.
    pub fn scalar(value: T) -> Self {
        Self {
            data: vec![value],
            shape: Vec::new(),
        }
    }

    /// Create tensor from data and shape.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if data length doesn't match shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndtape::DenseTensor;
    ///
    /// let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// assert_eq!(t.get_linear(3), Some(&4.0));
    /// assert!(DenseTensor::from_vec(vec![1.0, 2.0], &[3]).is_err());
    /// ```
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self, TensorError> {
        let expected = shape_len(shape);
        if data.len() != expected {
            return Err(TensorError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
        })
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Rank (number of dimensions).
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Get element by linear index.
    #[inline]
    pub fn get_linear(&self, i: usize) -> Option<&T> {
        self.data.get(i)
    }

    /// New tensor with this tensor's shape and the given elements.
    ///
    /// `data` must have exactly `self.len()` elements.
    pub(crate) fn same_shape_with(&self, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), self.data.len());
        Self {
            data,
            shape: self.shape.clone(),
        }
    }

    /// Check that `other` has exactly this tensor's shape.
    pub(crate) fn check_same_shape(&self, other: &Self) -> Result<(), TensorError> {
        if self.shape != other.shape {
            return Err(TensorError::DimMismatch {
                lhs: self.shape.clone(),
                rhs: other.shape.clone(),
            });
        }
        Ok(())
    }
}
