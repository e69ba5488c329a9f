//! Integration tests for the tape and backward pass.
//!
//! Covers the gradient properties end to end and checks analytical
//! gradients against central differences.

use approx::assert_relative_eq;
use ndtape::autodiff::{
    Tape, TrackedTensor, local_gradient, tracked_add, tracked_mul, tracked_neg, tracked_scale,
    tracked_sub, tracked_sum,
};
use ndtape::backend::GenericBackend;
use ndtape::{DenseTensor, TapeError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn tracked(values: &[f64]) -> TrackedTensor<f64> {
    TrackedTensor::new(DenseTensor::from_vec(values.to_vec(), &[values.len()]).unwrap())
}

/// Compute numerical gradient using central difference.
///
/// grad_i ≈ (f(x + eps*e_i) - f(x - eps*e_i)) / (2*eps)
fn numerical_gradient<F>(f: F, x: &[f64], eps: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut grad = vec![0.0; x.len()];
    let mut x_plus = x.to_vec();
    let mut x_minus = x.to_vec();

    for i in 0..x.len() {
        x_plus[i] = x[i] + eps;
        x_minus[i] = x[i] - eps;

        grad[i] = (f(&x_plus) - f(&x_minus)) / (2.0 * eps);

        x_plus[i] = x[i];
        x_minus[i] = x[i];
    }
    grad
}

#[test]
fn test_identity_gradient() {
    let mut tape = Tape::new();
    let x = TrackedTensor::new(DenseTensor::<f64>::zeros(&[2, 3]));
    let y = tracked_scale(&mut tape, &x, 4.0).unwrap();

    let grads = tape.gradient_wrt(&GenericBackend, y.id(), &[y.id()]).unwrap();
    let dy = grads[0].as_ref().unwrap();
    assert_eq!(dy.shape(), &[2, 3]);
    assert!(dy.data().iter().all(|&g| g == 1.0));
}

#[test]
fn test_fan_out_contributions_are_summed() {
    // target = f(x) + g(x) with f(x) = 3x, g(x) = x * x
    let mut tape = Tape::new();
    let x = tracked(&[1.0, -2.0, 0.5]);
    let f = tracked_scale(&mut tape, &x, 3.0).unwrap();
    let g = tracked_mul(&mut tape, &x, &x).unwrap();
    let target = tracked_add(&mut tape, &f, &g).unwrap();

    let grads = tape.gradient_wrt_generic(target.id(), &[x.id()]).unwrap();
    let dx = grads[0].as_ref().unwrap();
    for (g, &v) in dx.data().iter().zip(x.data()) {
        assert_relative_eq!(*g, 3.0 + 2.0 * v, epsilon = 1e-12);
    }
}

#[test]
fn test_irrelevant_branches_are_pruned() {
    let x = tracked(&[1.0, 2.0]);
    let c = tracked(&[5.0, 5.0]);

    let mut plain = Tape::new();
    let y = tracked_mul(&mut plain, &x, &x).unwrap();
    let expected = plain.gradient_wrt_generic(y.id(), &[x.id()]).unwrap();

    let mut noisy = Tape::new();
    // Dead end from the source, not differentiable.
    noisy
        .record("opaque_dead_end", [("x", x.id())], x.tensor().clone(), None)
        .unwrap();
    let y2 = tracked_mul(&mut noisy, &x, &x).unwrap();
    // Side branch that feeds the target without descending from x.
    let constant = noisy
        .record("opaque_constant", [("x", c.id())], c.tensor().clone(), None)
        .unwrap();
    let zero = tracked_sub(&mut noisy, &constant, &constant).unwrap();
    let target = tracked_add(&mut noisy, &y2, &zero).unwrap();
    // Recorded after the target.
    noisy
        .record("opaque_after", [("x", target.id())], target.tensor().clone(), None)
        .unwrap();

    let grads = noisy.gradient_wrt_generic(target.id(), &[x.id()]).unwrap();
    assert_eq!(grads[0], expected[0]);
}

#[test]
fn test_disconnected_source_is_absent() {
    let mut tape = Tape::new();
    let a = tracked(&[1.0, 2.0]);
    let b = tracked(&[3.0, 4.0]);
    let lonely = tracked(&[9.0, 9.0]);
    let other = tracked_neg(&mut tape, &lonely).unwrap();
    let z = tracked_mul(&mut tape, &a, &b).unwrap();

    let grads = tape
        .gradient_wrt_generic(z.id(), &[a.id(), lonely.id(), other.id(), b.id()])
        .unwrap();
    assert_eq!(grads.len(), 4);
    assert_eq!(grads[0].as_ref().unwrap().data(), &[3.0, 4.0]);
    assert!(grads[1].is_none());
    assert!(grads[2].is_none());
    assert_eq!(grads[3].as_ref().unwrap().data(), &[1.0, 2.0]);
}

#[test]
fn test_zero_gradient_is_not_absent() {
    // y = x - x has a path to x, so the gradient is present and zero.
    let mut tape = Tape::new();
    let x = tracked(&[1.0, 2.0]);
    let y = tracked_sub(&mut tape, &x, &x).unwrap();

    let grads = tape.gradient_wrt_generic(y.id(), &[x.id()]).unwrap();
    assert_eq!(grads[0].as_ref().unwrap().data(), &[0.0, 0.0]);
}

#[test]
fn test_not_on_tape() {
    let mut tape = Tape::new();
    let x = tracked(&[1.0]);
    let _y = tracked_neg(&mut tape, &x).unwrap();

    // A leaf.
    let err = tape.gradient_wrt_generic(x.id(), &[x.id()]).unwrap_err();
    assert_eq!(err, TapeError::NotOnTape { id: x.id() });

    // Recorded on another tape.
    let mut other = Tape::new();
    let w = tracked_neg(&mut other, &x).unwrap();
    let err = tape.gradient_wrt_generic(w.id(), &[x.id()]).unwrap_err();
    assert!(matches!(err, TapeError::NotOnTape { .. }));
}

#[test]
fn test_missing_gradient_fails_fast() {
    let mut tape = Tape::new();
    let x = tracked(&[1.0, 2.0]);
    let y = tape
        .record("opaque", [("x", x.id())], x.tensor().clone(), None)
        .unwrap();
    let z = tracked_scale(&mut tape, &y, 2.0).unwrap();

    let err = tape.gradient_wrt_generic(z.id(), &[x.id()]).unwrap_err();
    assert_eq!(
        err,
        TapeError::MissingGradientFunction {
            op: "opaque".to_string()
        }
    );
    assert_eq!(
        err.to_string(),
        "cannot compute gradient: gradient function not found for `opaque`"
    );

    // Asking only for the gradient of `y` never reaches the opaque node.
    let grads = tape.gradient_wrt_generic(z.id(), &[y.id()]).unwrap();
    assert_eq!(grads[0].as_ref().unwrap().data(), &[2.0, 2.0]);
}

#[test]
fn test_product_then_sum_scenario() {
    // y = mul(a, b), z = add(y, a)  =>  dz/da = b + 1, dz/db = a
    let mut tape = Tape::new();
    let a = tracked(&[1.0, -2.0, 3.5]);
    let b = tracked(&[4.0, 0.5, -1.0]);
    let y = tracked_mul(&mut tape, &a, &b).unwrap();
    let z = tracked_add(&mut tape, &y, &a).unwrap();

    let grads = tape
        .gradient_wrt(&GenericBackend, z.id(), &[a.id(), b.id()])
        .unwrap();
    let da = grads[0].as_ref().unwrap();
    let db = grads[1].as_ref().unwrap();
    for i in 0..3 {
        assert_relative_eq!(da.data()[i], b.data()[i] + 1.0, epsilon = 1e-12);
        assert_relative_eq!(db.data()[i], a.data()[i], epsilon = 1e-12);
    }
}

#[test]
fn test_backward_does_not_grow_tape() {
    let mut tape = Tape::new();
    let x = tracked(&[1.0, 2.0]);
    let y = tracked_mul(&mut tape, &x, &x).unwrap();
    let z = tracked_add(&mut tape, &y, &x).unwrap();
    let before = tape.len();

    let first = tape.gradient_wrt_generic(z.id(), &[x.id()]).unwrap();
    let second = tape.gradient_wrt_generic(z.id(), &[x.id()]).unwrap();

    assert_eq!(tape.len(), before);
    assert_eq!(first, second);
}

#[test]
fn test_custom_operation_with_closure() {
    // y = x^3 recorded by hand.
    let mut tape = Tape::new();
    let x = tracked(&[1.0, 2.0, -1.5]);
    let saved = x.saved();
    let cube = ndtape::operations::apply(x.tensor(), |v| v * v * v);
    let y = tape
        .record(
            "cube",
            [("x", x.id())],
            cube,
            Some(local_gradient(
                move |dy: &DenseTensor<f64>, _y: &DenseTensor<f64>| {
                    let slope = ndtape::operations::apply(saved.get(), |v| 3.0 * v * v);
                    Ok(vec![("x", ndtape::operations::mul(dy, &slope)?)])
                },
            )),
        )
        .unwrap();
    let loss = tracked_sum(&mut tape, &y).unwrap();

    let grads = tape.gradient_wrt_generic(loss.id(), &[x.id()]).unwrap();
    assert_eq!(grads[0].as_ref().unwrap().data(), &[3.0, 12.0, 6.75]);
}

#[test]
fn test_numerical_gradient_composite() {
    let eps = 1e-6;
    let a_data = vec![0.3, -1.2, 2.0, 0.7];
    let b_data = vec![1.5, 0.4, -0.6, 2.2];

    // loss = sum((a * b - a) * 0.5 - b * b)
    let loss_fn = |a: &[f64], b: &[f64]| -> f64 {
        a.iter()
            .zip(b)
            .map(|(&x, &y)| (x * y - x) * 0.5 - y * y)
            .sum()
    };
    let numerical_a = numerical_gradient(|a| loss_fn(a, &b_data), &a_data, eps);
    let numerical_b = numerical_gradient(|b| loss_fn(&a_data, b), &b_data, eps);

    let mut tape = Tape::new();
    let a = tracked(&a_data);
    let b = tracked(&b_data);
    let ab = tracked_mul(&mut tape, &a, &b).unwrap();
    let diff = tracked_sub(&mut tape, &ab, &a).unwrap();
    let half = tracked_scale(&mut tape, &diff, 0.5).unwrap();
    let bb = tracked_mul(&mut tape, &b, &b).unwrap();
    let out = tracked_sub(&mut tape, &half, &bb).unwrap();
    let loss = tracked_sum(&mut tape, &out).unwrap();

    let grads = tape
        .gradient_wrt_generic(loss.id(), &[a.id(), b.id()])
        .unwrap();
    let analytical_a = grads[0].as_ref().unwrap();
    let analytical_b = grads[1].as_ref().unwrap();

    for (analytical, numerical) in analytical_a.data().iter().zip(numerical_a.iter()) {
        assert_relative_eq!(analytical, numerical, epsilon = 1e-6);
    }
    for (analytical, numerical) in analytical_b.data().iter().zip(numerical_b.iter()) {
        assert_relative_eq!(analytical, numerical, epsilon = 1e-6);
    }
}

#[test]
fn test_random_fan_out_counts_every_consumer_once() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let values: Vec<f64> = (0..6).map(|_| rng.random_range(-2.0..2.0)).collect();
    let scales: Vec<f64> = (0..8).map(|_| rng.random_range(-3.0..3.0)).collect();

    // target = sum_k scales[k] * x, built as a left fold of adds.
    let mut tape = Tape::new();
    let x = tracked(&values);
    let mut acc = tracked_scale(&mut tape, &x, scales[0]).unwrap();
    for &s in &scales[1..] {
        let term = tracked_scale(&mut tape, &x, s).unwrap();
        acc = tracked_add(&mut tape, &acc, &term).unwrap();
    }

    let grads = tape.gradient_wrt_generic(acc.id(), &[x.id()]).unwrap();
    let expected: f64 = scales.iter().sum();
    for &g in grads[0].as_ref().unwrap().data() {
        assert_relative_eq!(g, expected, epsilon = 1e-10);
    }
}

#[cfg(feature = "thread-tape")]
#[test]
fn test_thread_local_tape_round_trip() {
    use ndtape::autodiff::{clear_tape_f64, gradient_wrt_f64, with_tape_f64};

    clear_tape_f64();
    let a = tracked(&[2.0]);
    let b = tracked(&[3.0]);
    let z = with_tape_f64(|tape| {
        let y = tracked_mul(tape, &a, &b)?;
        tracked_add(tape, &y, &a)
    })
    .unwrap();

    let grads = gradient_wrt_f64(z.id(), &[a.id(), b.id()]).unwrap();
    assert_eq!(grads[0].as_ref().unwrap().data(), &[4.0]);
    assert_eq!(grads[1].as_ref().unwrap().data(), &[2.0]);
    clear_tape_f64();
}
