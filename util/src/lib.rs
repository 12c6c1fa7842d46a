//! Test helpers shared by the crates in the workspace.

use nalgebra::DVector;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Poor man's approx assertion for slices of floating point numbers.
///
/// The tolerance is relative to the largest absolute entry in either slice (with a floor of one),
/// which is the scale that matters for accumulated sums in element kernels.
#[macro_export]
macro_rules! assert_slices_approx_eq {
    ($x:expr, $y:expr, tol = $tol:expr) => {{
        let x: &[f64] = &$x;
        let y: &[f64] = &$y;
        assert_eq!(x.len(), y.len(), "slices have different lengths");
        let scale = x.iter().chain(y.iter()).fold(1.0f64, |m, v| m.max(v.abs()));
        let (idx, max_absdiff) = x
            .iter()
            .zip(y.iter())
            .map(|(a, b)| (a - b).abs())
            .enumerate()
            .fold((0, 0.0f64), |(i_max, d_max), (i, d)| if d > d_max { (i, d) } else { (i_max, d_max) });

        if max_absdiff > $tol * scale {
            println!("tol: {:e} (scale {:e})", $tol, scale);
            println!("largest difference {:e} at index {}", max_absdiff, idx);
            println!("left: {:?}", x[idx]);
            println!("right: {:?}", y[idx]);
            panic!("assert_slices_approx_eq!({}, {}) failed", stringify!($x), stringify!($y));
        }
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Deterministic pseudo-random values in `[-1, 1)`, seeded so that failures are reproducible.
pub fn pseudo_random_values(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// Inner product of two slices.
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len());
    DVector::from_column_slice(x).dot(&DVector::from_column_slice(y))
}

/// Unit vector of length `len` with a one at `index`.
pub fn unit_vector(len: usize, index: usize) -> Vec<f64> {
    let mut e = vec![0.0; len];
    e[index] = 1.0;
    e
}
