//! Element-wise tensor kernels.
//!
//! These run directly against dense buffers and never touch a tape.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;
use faer_traits::math_utils::conj as conj_scalar;

/// Apply a function to each element, returning a new tensor.
///
/// # Example
///
/// ```
/// use ndtape::DenseTensor;
/// use ndtape::operations::apply;
///
/// let t = DenseTensor::from_vec(vec![1.0, 4.0, 9.0], &[3]).unwrap();
/// let ts = apply(&t, |x| x * 2.0);
/// assert_eq!(ts.data(), &[2.0, 8.0, 18.0]);
/// ```
pub fn apply<ElT: Scalar, F>(tensor: &DenseTensor<ElT>, f: F) -> DenseTensor<ElT>
where
    F: Fn(ElT) -> ElT,
{
    let data: Vec<ElT> = tensor.data().iter().map(|&x| f(x)).collect();
    tensor.same_shape_with(data)
}

/// Combine two tensors of identical shape element by element.
///
/// # Errors
///
/// Returns `TensorError::DimMismatch` if the shapes differ.
pub fn apply_binary<ElT: Scalar, F>(
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
    f: F,
) -> Result<DenseTensor<ElT>, TensorError>
where
    F: Fn(ElT, ElT) -> ElT,
{
    a.check_same_shape(b)?;
    let data: Vec<ElT> = a
        .data()
        .iter()
        .zip(b.data().iter())
        .map(|(&x, &y)| f(x, y))
        .collect();
    Ok(a.same_shape_with(data))
}

/// Element-wise `a + b`.
///
/// ```
/// use ndtape::DenseTensor;
/// use ndtape::operations::add;
///
/// let a = DenseTensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// let b = DenseTensor::from_vec(vec![4.0, 5.0, 6.0], &[3]).unwrap();
/// assert_eq!(add(&a, &b).unwrap().data(), &[5.0, 7.0, 9.0]);
/// ```
pub fn add<ElT: Scalar>(
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
) -> Result<DenseTensor<ElT>, TensorError> {
    apply_binary(a, b, |x, y| x + y)
}

/// Element-wise `a - b`.
pub fn sub<ElT: Scalar>(
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
) -> Result<DenseTensor<ElT>, TensorError> {
    apply_binary(a, b, |x, y| x - y)
}

/// Element-wise (Hadamard) product `a * b`.
pub fn mul<ElT: Scalar>(
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
) -> Result<DenseTensor<ElT>, TensorError> {
    apply_binary(a, b, |x, y| x * y)
}

/// Element-wise negation.
pub fn neg<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> DenseTensor<ElT> {
    apply(tensor, |x| -x)
}

/// Multiply all elements by a scalar, returning a new tensor.
///
/// ```
/// use ndtape::DenseTensor;
/// use ndtape::operations::scale;
///
/// let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// assert_eq!(scale(&t, 2.0).data(), &[2.0, 4.0, 6.0]);
/// ```
pub fn scale<ElT: Scalar>(tensor: &DenseTensor<ElT>, alpha: ElT) -> DenseTensor<ElT> {
    apply(tensor, |x| x * alpha)
}

/// Element-wise complex conjugation (identity for real tensors).
pub fn conj<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> DenseTensor<ElT> {
    let data: Vec<ElT> = tensor.data().iter().map(|x| conj_scalar(x)).collect();
    tensor.same_shape_with(data)
}

/// Sum of all elements as a rank-0 tensor.
pub fn sum<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> DenseTensor<ElT> {
    let total = tensor
        .data()
        .iter()
        .fold(ElT::zero(), |acc, &x| acc + x);
    DenseTensor::scalar(total)
}
