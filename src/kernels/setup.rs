//! Setup kernels: geometric factors and coefficient samples to per-point operator data.
//!
//! The output `D` has layout `(NQ, symm_dims(DIM), NE)` and stores the upper triangle of the
//! symmetric matrix `w * c * det(J) * J^-1 * J^-T` (or its manifold analogue).
use super::{check_len, symm_dims};
use crate::config::ExecutionConfig;
use crate::forall::forall_elements;
use crate::reshape::{view, view_mut};
use crate::Real;
use log::trace;

/// Coefficient samples stored either as a single value or with layout `(NQ, NE)`.
#[derive(Clone, Copy)]
struct Samples<'a, T> {
    values: &'a [T],
    nq: usize,
}

impl<'a, T: Real> Samples<'a, T> {
    fn new(values: &'a [T], nq: usize, ne: usize) -> Self {
        assert!(
            values.len() == 1 || values.len() == nq * ne,
            "coefficient must have length 1 or NQ * NE = {}, got {}",
            nq * ne,
            values.len()
        );
        Self { values, nq }
    }

    #[inline(always)]
    fn get(&self, q: usize, e: usize) -> T {
        if self.values.len() == 1 {
            self.values[0]
        } else {
            self.values[q + self.nq * e]
        }
    }
}

fn check_inputs<T>(dim: usize, sdim: usize, q1d: usize, ne: usize, w: &[T], j: &[T], op: &[T]) -> usize {
    assert!(q1d > 0, "Q1D must be positive");
    let nq = q1d.pow(dim as u32);
    check_len("quadrature weights", w.len(), nq);
    check_len("Jacobians", j.len(), nq * sdim * dim * ne);
    check_len("operator data", op.len(), nq * symm_dims(dim) * ne);
    nq
}

/// Setup for planar 2D elements (`DIM = SDIM = 2`).
pub fn setup_2d<T: Real>(config: &ExecutionConfig, q1d: usize, ne: usize, w: &[T], j: &[T], c: &[T], op: &mut [T]) {
    let nq = check_inputs(2, 2, q1d, ne, w, j, op);
    let j = view(j, [nq, 2, 2, ne]);
    let c = Samples::new(c, nq, ne);

    forall_elements(
        config,
        op,
        nq * 3,
        || (),
        |_, e, op_e| {
            let mut y = view_mut(op_e, [nq, 3]);
            for q in 0..nq {
                let j11 = j[[q, 0, 0, e]];
                let j21 = j[[q, 1, 0, e]];
                let j12 = j[[q, 0, 1, e]];
                let j22 = j[[q, 1, 1, e]];
                let c_det_j = w[q] * c.get(q, e) / (j11 * j22 - j21 * j12);
                y[[q, 0]] = c_det_j * (j12 * j12 + j22 * j22);
                y[[q, 1]] = -c_det_j * (j12 * j11 + j22 * j21);
                y[[q, 2]] = c_det_j * (j11 * j11 + j21 * j21);
            }
        },
    );
}

/// Setup for 2D elements embedded in 3D (`DIM = 2`, `SDIM = 3`).
///
/// Uses the first fundamental form `E = |J_1|^2`, `F = J_1 . J_2`, `G = |J_2|^2` of the
/// Jacobian columns in place of `J^T J`.
pub fn setup_2d_manifold<T: Real>(
    config: &ExecutionConfig,
    q1d: usize,
    ne: usize,
    w: &[T],
    j: &[T],
    c: &[T],
    op: &mut [T],
) {
    let nq = check_inputs(2, 3, q1d, ne, w, j, op);
    let j = view(j, [nq, 3, 2, ne]);
    let c = Samples::new(c, nq, ne);

    forall_elements(
        config,
        op,
        nq * 3,
        || (),
        |_, e, op_e| {
            let mut d = view_mut(op_e, [nq, 3]);
            for q in 0..nq {
                let j11 = j[[q, 0, 0, e]];
                let j21 = j[[q, 1, 0, e]];
                let j31 = j[[q, 2, 0, e]];
                let j12 = j[[q, 0, 1, e]];
                let j22 = j[[q, 1, 1, e]];
                let j32 = j[[q, 2, 1, e]];
                let e_ = j11 * j11 + j21 * j21 + j31 * j31;
                let g_ = j12 * j12 + j22 * j22 + j32 * j32;
                let f_ = j11 * j12 + j21 * j22 + j31 * j32;
                let iw = T::one() / (e_ * g_ - f_ * f_).sqrt();
                let alpha = w[q] * c.get(q, e) * iw;
                d[[q, 0]] = alpha * g_;
                d[[q, 1]] = -alpha * f_;
                d[[q, 2]] = alpha * e_;
            }
        },
    );
}

/// Setup for 3D elements (`DIM = SDIM = 3`).
///
/// The entries are computed from the adjugate `A` of `J` as `w c / det(J) * A A^T`, which
/// avoids forming the inverse. They are stored in the order 11, 21, 31, 22, 32, 33.
pub fn setup_3d<T: Real>(config: &ExecutionConfig, q1d: usize, ne: usize, w: &[T], j: &[T], c: &[T], op: &mut [T]) {
    let nq = check_inputs(3, 3, q1d, ne, w, j, op);
    let j = view(j, [nq, 3, 3, ne]);
    let c = Samples::new(c, nq, ne);

    forall_elements(
        config,
        op,
        nq * 6,
        || (),
        |_, e, op_e| {
            let mut y = view_mut(op_e, [nq, 6]);
            for q in 0..nq {
                let j11 = j[[q, 0, 0, e]];
                let j21 = j[[q, 1, 0, e]];
                let j31 = j[[q, 2, 0, e]];
                let j12 = j[[q, 0, 1, e]];
                let j22 = j[[q, 1, 1, e]];
                let j32 = j[[q, 2, 1, e]];
                let j13 = j[[q, 0, 2, e]];
                let j23 = j[[q, 1, 2, e]];
                let j33 = j[[q, 2, 2, e]];
                let det_j = j11 * (j22 * j33 - j32 * j23) - j21 * (j12 * j33 - j32 * j13)
                    + j31 * (j12 * j23 - j22 * j13);
                let c_det_j = w[q] * c.get(q, e) / det_j;

                let a11 = (j22 * j33) - (j23 * j32);
                let a12 = (j32 * j13) - (j12 * j33);
                let a13 = (j12 * j23) - (j22 * j13);
                let a21 = (j31 * j23) - (j21 * j33);
                let a22 = (j11 * j33) - (j13 * j31);
                let a23 = (j21 * j13) - (j11 * j23);
                let a31 = (j21 * j32) - (j31 * j22);
                let a32 = (j31 * j12) - (j11 * j32);
                let a33 = (j11 * j22) - (j12 * j21);

                y[[q, 0]] = c_det_j * (a11 * a11 + a12 * a12 + a13 * a13);
                y[[q, 1]] = c_det_j * (a11 * a21 + a12 * a22 + a13 * a23);
                y[[q, 2]] = c_det_j * (a11 * a31 + a12 * a32 + a13 * a33);
                y[[q, 3]] = c_det_j * (a21 * a21 + a22 * a22 + a23 * a23);
                y[[q, 4]] = c_det_j * (a21 * a31 + a22 * a32 + a23 * a33);
                y[[q, 5]] = c_det_j * (a31 * a31 + a32 * a32 + a33 * a33);
            }
        },
    );
}

/// Runs the setup kernel matching the reference and space dimensions.
///
/// # Panics
///
/// Panics if `(dim, sdim)` is not one of `(2, 2)`, `(2, 3)` or `(3, 3)`.
pub fn setup<T: Real>(
    config: &ExecutionConfig,
    dim: usize,
    sdim: usize,
    q1d: usize,
    ne: usize,
    w: &[T],
    j: &[T],
    c: &[T],
    op: &mut [T],
) {
    trace!("setup kernel: dim = {}, sdim = {}, Q1D = {}, NE = {}", dim, sdim, q1d, ne);
    match (dim, sdim) {
        (2, 2) => setup_2d(config, q1d, ne, w, j, c, op),
        (2, 3) => setup_2d_manifold(config, q1d, ne, w, j, c, op),
        (3, 3) => setup_3d(config, q1d, ne, w, j, c, op),
        (1, _) => panic!("dim = 1 is not supported by the vector diffusion setup"),
        _ => panic!("unsupported dimensions for vector diffusion setup: dim = {}, sdim = {}", dim, sdim),
    }
}
