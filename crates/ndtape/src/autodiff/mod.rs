//! Tape-based reverse-mode automatic differentiation.
//!
//! Every tracked operation appends a node to a [`Tape`]; a gradient request
//! filters the tape down to the operations connecting the requested
//! sources to the target and walks them in reverse, summing contributions
//! for tensors with several consumers.
//!
//! # Architecture
//!
//! ```text
//! forward ops ──append──►  Tape  (Vec<TapeNode> + output index)
//!                            │
//!                gradient_wrt(target, sources)
//!                            │
//!                            ▼
//!                 filter_nodes  (sources → target)
//!                            │
//!                            ▼
//!          reverse walk: GradFn per node, Gradients map,
//!          fan-out summed via Backend::add (off-tape)
//!                            │
//!                            ▼
//!               Vec<Option<DenseTensor>> in source order
//! ```
//!
//! # Example
//!
//! ```
//! use ndtape::DenseTensor;
//! use ndtape::autodiff::{Tape, TrackedTensor, tracked_mul, tracked_sum};
//! use ndtape::backend::GenericBackend;
//!
//! let mut tape = Tape::new();
//! let a = TrackedTensor::new(DenseTensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap());
//! let b = TrackedTensor::new(DenseTensor::from_vec(vec![4.0, 5.0, 6.0], &[3]).unwrap());
//! let unrelated = TrackedTensor::new(DenseTensor::<f64>::ones(&[3]));
//!
//! // loss = sum(a * b)
//! let c = tracked_mul(&mut tape, &a, &b).unwrap();
//! let loss = tracked_sum(&mut tape, &c).unwrap();
//!
//! let grads = tape
//!     .gradient_wrt(&GenericBackend, loss.id(), &[a.id(), unrelated.id()])
//!     .unwrap();
//! assert_eq!(grads[0].as_ref().unwrap().data(), &[4.0, 5.0, 6.0]);
//! assert!(grads[1].is_none()); // no path: absent, not zero
//! ```
//!
//! # Design Notes
//!
//! - Tensors are identified by [`TensorId`]; every map is keyed by id
//! - The accumulation map lives only inside one `gradient_wrt` call
//! - Single-threaded: values are shared through `Rc`, tapes are not `Sync`

mod backward;
mod gradients;
mod ops;
mod saved_tensor;
mod subgraph;
mod tape;
mod tensor;

#[cfg(feature = "thread-tape")]
pub use backward::gradient_wrt_f64;
pub use ops::{tracked_add, tracked_mul, tracked_neg, tracked_scale, tracked_sub, tracked_sum};
pub use saved_tensor::SavedTensor;
pub use subgraph::{FilteredSubgraph, filter_nodes};
pub use tape::{GradFn, InputGrads, Role, Tape, TapeNode, local_gradient};
#[cfg(feature = "thread-tape")]
pub use tape::{clear_tape_f64, with_tape_f64};
pub use tensor::{TensorId, TrackedTensor};
