//! ndtape - operation tape and reverse-mode gradient engine for tensors.
//!
//! Records every differentiable operation executed against tracked
//! tensors and computes the gradient of an output with respect to any set
//! of inputs by walking the recorded history backwards.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Tracked operations (autodiff module)
//!     → tracked_add, tracked_mul, ..., Tape::gradient_wrt
//!
//! Level 2: Plain kernels (operations module)
//!     → add, mul, scale, sum (never recorded)
//!
//! Level 3: Backend implementation (backend module)
//!     → GenericBackend (naive loops)
//! ```
//!
//! # Example
//!
//! ```
//! use ndtape::DenseTensor;
//! use ndtape::autodiff::{Tape, TrackedTensor, tracked_add, tracked_mul};
//!
//! let mut tape = Tape::new();
//! let a = TrackedTensor::new(DenseTensor::from_vec(vec![2.0], &[1]).unwrap());
//! let b = TrackedTensor::new(DenseTensor::from_vec(vec![3.0], &[1]).unwrap());
//!
//! // z = a * b + a
//! let y = tracked_mul(&mut tape, &a, &b).unwrap();
//! let z = tracked_add(&mut tape, &y, &a).unwrap();
//!
//! let grads = tape.gradient_wrt_generic(z.id(), &[a.id(), b.id()]).unwrap();
//! assert_eq!(grads[0].as_ref().unwrap().data(), &[4.0]); // b + 1
//! assert_eq!(grads[1].as_ref().unwrap().data(), &[2.0]); // a
//! ```

pub mod autodiff;
pub mod backend;
pub mod error;
pub mod operations;
pub mod scalar;
pub mod tensor;

pub use error::{TapeError, TensorError};
pub use scalar::{Scalar, c64};
pub use tensor::DenseTensor;
