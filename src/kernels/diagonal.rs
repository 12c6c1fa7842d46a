//! Diagonal kernels.
//!
//! The diagonal entry of dof `i` is `sum_q grad(phi_i)^T D_q grad(phi_i)`. The kernels contract
//! the squared basis tables with `D` one axis at a time instead of applying the operator to
//! unit vectors. Since every vector component carries the same scalar block, the result is
//! added to every component.
use super::{check_fixed_size, check_len, fixed_or_runtime, symm_dims};
use crate::basis::DofToQuad;
use crate::config::ExecutionConfig;
use crate::forall::forall_elements;
use crate::reshape::{view, view_mut};
use crate::Real;

/// Adds the operator diagonal to `diag` for 2D elements.
///
/// `op` has layout `(Q1D^2, 3, NE)` and `diag` has layout `(D1D, D1D, VDIM, NE)`.
pub fn diagonal_2d<T: Real, const T_D1D: usize, const T_Q1D: usize>(
    config: &ExecutionConfig,
    ne: usize,
    maps: &DofToQuad<T>,
    op: &[T],
    diag: &mut [T],
    vdim: usize,
) {
    let (d1d, q1d) = (maps.ndof(), maps.nqpt());
    check_fixed_size("D1D", T_D1D, d1d);
    check_fixed_size("Q1D", T_Q1D, q1d);
    config.limits.check(d1d, q1d);
    assert!(d1d > 0 && q1d > 0 && vdim > 0, "sizes must be positive");
    let nd = d1d * d1d;
    check_len("operator data", op.len(), q1d * q1d * symm_dims(2) * ne);
    check_len("diagonal", diag.len(), nd * vdim * ne);

    let b = view(maps.b(), [q1d, d1d]);
    let g = view(maps.g(), [q1d, d1d]);
    let d = view(op, [q1d * q1d, 3, ne]);

    forall_elements(
        config,
        diag,
        nd * vdim,
        || vec![T::zero(); 3 * q1d * d1d],
        |scratch, e, y_e| {
            let d1d = fixed_or_runtime(T_D1D, d1d);
            let q1d = fixed_or_runtime(T_Q1D, q1d);
            let mut y = view_mut(y_e, [d1d, d1d, vdim]);
            // qd(k, qx, dy): the three terms of grad(phi)^T D grad(phi) contracted along y
            let mut qd = view_mut(&mut scratch[..], [3, q1d, d1d]);

            for qx in 0..q1d {
                for dy in 0..d1d {
                    let mut qd0 = T::zero();
                    let mut qd1 = T::zero();
                    let mut qd2 = T::zero();
                    for qy in 0..q1d {
                        let q = qx + qy * q1d;
                        let (by, gy) = (b[[qy, dy]], g[[qy, dy]]);
                        qd0 += by * by * d[[q, 0, e]];
                        qd1 += by * gy * d[[q, 1, e]];
                        qd2 += gy * gy * d[[q, 2, e]];
                    }
                    qd[[0, qx, dy]] = qd0;
                    qd[[1, qx, dy]] = qd1;
                    qd[[2, qx, dy]] = qd2;
                }
            }
            for dy in 0..d1d {
                for dx in 0..d1d {
                    let mut temp = T::zero();
                    for qx in 0..q1d {
                        let (bx, gx) = (b[[qx, dx]], g[[qx, dx]]);
                        temp += gx * gx * qd[[0, qx, dy]];
                        temp += gx * bx * qd[[1, qx, dy]];
                        temp += bx * gx * qd[[1, qx, dy]];
                        temp += bx * bx * qd[[2, qx, dy]];
                    }
                    for c in 0..vdim {
                        y[[dx, dy, c]] += temp;
                    }
                }
            }
        },
    );
}

/// Index of entry `(i, j)` of a symmetric 3x3 matrix stored as 11, 21, 31, 22, 32, 33.
#[inline(always)]
fn symmetric_index_3d(i: usize, j: usize) -> usize {
    let (lo, hi) = if j >= i { (i, j) } else { (j, i) };
    3 - (3 - lo) * (2 - lo) / 2 + hi
}

/// Adds the operator diagonal to `diag` for 3D elements.
///
/// `op` has layout `(Q1D^3, 6, NE)` and `diag` has layout `(D1D, D1D, D1D, 3, NE)`.
pub fn diagonal_3d<T: Real, const T_D1D: usize, const T_Q1D: usize>(
    config: &ExecutionConfig,
    ne: usize,
    maps: &DofToQuad<T>,
    op: &[T],
    diag: &mut [T],
) {
    const DIM: usize = 3;
    const VDIM: usize = 3;
    let (d1d, q1d) = (maps.ndof(), maps.nqpt());
    check_fixed_size("D1D", T_D1D, d1d);
    check_fixed_size("Q1D", T_Q1D, q1d);
    config.limits.check(d1d, q1d);
    assert!(d1d > 0 && q1d > 0, "sizes must be positive");
    let nd = d1d * d1d * d1d;
    check_len("operator data", op.len(), q1d * q1d * q1d * symm_dims(3) * ne);
    check_len("diagonal", diag.len(), nd * VDIM * ne);

    let b = view(maps.b(), [q1d, d1d]);
    let g = view(maps.g(), [q1d, d1d]);
    let op = view(op, [q1d * q1d * q1d, 6, ne]);

    forall_elements(
        config,
        diag,
        nd * VDIM,
        || vec![T::zero(); q1d * q1d * d1d + q1d * d1d * d1d],
        |scratch, e, y_e| {
            let d1d = fixed_or_runtime(T_D1D, d1d);
            let q1d = fixed_or_runtime(T_Q1D, q1d);
            let mut y = view_mut(y_e, [d1d, d1d, d1d, VDIM]);
            let (qqd, qdd) = scratch.split_at_mut(q1d * q1d * d1d);
            let mut qqd = view_mut(qqd, [q1d, q1d, d1d]);
            let mut qdd = view_mut(&mut qdd[..q1d * d1d * d1d], [q1d, d1d, d1d]);

            for i in 0..DIM {
                for j in 0..DIM {
                    let k = symmetric_index_3d(i, j);
                    // Contract along z
                    for qx in 0..q1d {
                        for qy in 0..q1d {
                            for dz in 0..d1d {
                                let mut sum = T::zero();
                                for qz in 0..q1d {
                                    let q = qx + (qy + qz * q1d) * q1d;
                                    let (bz, gz) = (b[[qz, dz]], g[[qz, dz]]);
                                    let l = if i == 2 { gz } else { bz };
                                    let r = if j == 2 { gz } else { bz };
                                    sum += l * op[[q, k, e]] * r;
                                }
                                qqd[[qx, qy, dz]] = sum;
                            }
                        }
                    }
                    // Contract along y
                    for qx in 0..q1d {
                        for dz in 0..d1d {
                            for dy in 0..d1d {
                                let mut sum = T::zero();
                                for qy in 0..q1d {
                                    let (by, gy) = (b[[qy, dy]], g[[qy, dy]]);
                                    let l = if i == 1 { gy } else { by };
                                    let r = if j == 1 { gy } else { by };
                                    sum += l * qqd[[qx, qy, dz]] * r;
                                }
                                qdd[[qx, dy, dz]] = sum;
                            }
                        }
                    }
                    // Contract along x
                    for dz in 0..d1d {
                        for dy in 0..d1d {
                            for dx in 0..d1d {
                                let mut temp = T::zero();
                                for qx in 0..q1d {
                                    let (bx, gx) = (b[[qx, dx]], g[[qx, dx]]);
                                    let l = if i == 0 { gx } else { bx };
                                    let r = if j == 0 { gx } else { bx };
                                    temp += l * qdd[[qx, dy, dz]] * r;
                                }
                                for c in 0..VDIM {
                                    y[[dx, dy, dz, c]] += temp;
                                }
                            }
                        }
                    }
                }
            }
        },
    );
}
