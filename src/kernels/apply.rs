//! Apply kernels: `y += A x` by sum factorization.
//!
//! Each vector component is treated independently with the same scalar diffusion block. For
//! every component the kernel interpolates reference gradients at the quadrature points one
//! axis at a time, multiplies them pointwise by the symmetric matrix stored in `D` and
//! integrates against the basis gradients with the transposed tables.
use super::{check_fixed_size, check_len, fixed_or_runtime, symm_dims};
use crate::basis::DofToQuad;
use crate::config::ExecutionConfig;
use crate::forall::forall_elements;
use crate::reshape::{view, view_mut};
use crate::Real;

/// Adds the action of the operator on `x` to `y` for 2D elements.
///
/// `op` has layout `(Q1D^2, 3, NE)`, `x` and `y` have layout `(D1D, D1D, VDIM, NE)`. Use
/// zero for any const parameter to take the size from `maps` (or `vdim`) at runtime.
///
/// # Panics
///
/// Panics if the sizes exceed the limits in `config`, disagree with the const parameters or
/// if a buffer has the wrong length.
pub fn apply_2d<T: Real, const T_D1D: usize, const T_Q1D: usize, const T_VDIM: usize>(
    config: &ExecutionConfig,
    ne: usize,
    maps: &DofToQuad<T>,
    op: &[T],
    x: &[T],
    y: &mut [T],
    vdim: usize,
) {
    let (d1d, q1d) = (maps.ndof(), maps.nqpt());
    check_fixed_size("D1D", T_D1D, d1d);
    check_fixed_size("Q1D", T_Q1D, q1d);
    check_fixed_size("VDIM", T_VDIM, vdim);
    config.limits.check(d1d, q1d);
    assert!(d1d > 0 && q1d > 0 && vdim > 0, "sizes must be positive");
    let nd = d1d * d1d;
    let nq = q1d * q1d;
    check_len("operator data", op.len(), nq * symm_dims(2) * ne);
    check_len("x", x.len(), nd * vdim * ne);
    check_len("y", y.len(), nd * vdim * ne);

    let b = view(maps.b(), [q1d, d1d]);
    let g = view(maps.g(), [q1d, d1d]);
    let bt = view(maps.bt(), [d1d, q1d]);
    let gt = view(maps.gt(), [d1d, q1d]);
    let d = view(op, [nq, 3, ne]);
    let x = view(x, [d1d, d1d, vdim, ne]);

    let max_1d = d1d.max(q1d);
    let scratch_len = 2 * q1d * q1d + 2 * max_1d;

    forall_elements(
        config,
        y,
        nd * vdim,
        || vec![T::zero(); scratch_len],
        |scratch, e, y_e| {
            let d1d = fixed_or_runtime(T_D1D, d1d);
            let q1d = fixed_or_runtime(T_Q1D, q1d);
            let vdim = fixed_or_runtime(T_VDIM, vdim);
            let mut y = view_mut(y_e, [d1d, d1d, vdim]);
            let (grad, grad_x) = scratch.split_at_mut(2 * q1d * q1d);
            // grad(k, qx, qy) holds the reference gradient component k
            let mut grad = view_mut(grad, [2, q1d, q1d]);

            for c in 0..vdim {
                grad.fill(T::zero());
                for dy in 0..d1d {
                    let mut grad_x = view_mut(&mut grad_x[..2 * q1d], [2, q1d]);
                    grad_x.fill(T::zero());
                    for dx in 0..d1d {
                        let s = x[[dx, dy, c, e]];
                        for qx in 0..q1d {
                            grad_x[[0, qx]] += s * b[[qx, dx]];
                            grad_x[[1, qx]] += s * g[[qx, dx]];
                        }
                    }
                    for qy in 0..q1d {
                        let wy = b[[qy, dy]];
                        let w_dy = g[[qy, dy]];
                        for qx in 0..q1d {
                            grad[[0, qx, qy]] += grad_x[[1, qx]] * wy;
                            grad[[1, qx, qy]] += grad_x[[0, qx]] * w_dy;
                        }
                    }
                }

                for qy in 0..q1d {
                    for qx in 0..q1d {
                        let q = qx + qy * q1d;
                        let o11 = d[[q, 0, e]];
                        let o12 = d[[q, 1, e]];
                        let o22 = d[[q, 2, e]];
                        let grad_x = grad[[0, qx, qy]];
                        let grad_y = grad[[1, qx, qy]];
                        grad[[0, qx, qy]] = (o11 * grad_x) + (o12 * grad_y);
                        grad[[1, qx, qy]] = (o12 * grad_x) + (o22 * grad_y);
                    }
                }

                for qy in 0..q1d {
                    let mut grad_x = view_mut(&mut grad_x[..2 * d1d], [2, d1d]);
                    grad_x.fill(T::zero());
                    for qx in 0..q1d {
                        let g_x = grad[[0, qx, qy]];
                        let g_y = grad[[1, qx, qy]];
                        for dx in 0..d1d {
                            let wx = bt[[dx, qx]];
                            let w_dx = gt[[dx, qx]];
                            grad_x[[0, dx]] += g_x * w_dx;
                            grad_x[[1, dx]] += g_y * wx;
                        }
                    }
                    for dy in 0..d1d {
                        let wy = bt[[dy, qy]];
                        let w_dy = gt[[dy, qy]];
                        for dx in 0..d1d {
                            y[[dx, dy, c]] += (grad_x[[0, dx]] * wy) + (grad_x[[1, dx]] * w_dy);
                        }
                    }
                }
            }
        },
    );
}

/// Adds the action of the operator on `x` to `y` for 3D elements (`VDIM = 3`).
///
/// `op` has layout `(Q1D^3, 6, NE)`, `x` and `y` have layout `(D1D, D1D, D1D, 3, NE)`.
///
/// # Panics
///
/// Same conditions as [`apply_2d`].
pub fn apply_3d<T: Real, const T_D1D: usize, const T_Q1D: usize>(
    config: &ExecutionConfig,
    ne: usize,
    maps: &DofToQuad<T>,
    op: &[T],
    x: &[T],
    y: &mut [T],
) {
    const VDIM: usize = 3;
    let (d1d, q1d) = (maps.ndof(), maps.nqpt());
    check_fixed_size("D1D", T_D1D, d1d);
    check_fixed_size("Q1D", T_Q1D, q1d);
    config.limits.check(d1d, q1d);
    assert!(d1d > 0 && q1d > 0, "sizes must be positive");
    let nd = d1d * d1d * d1d;
    let nq = q1d * q1d * q1d;
    check_len("operator data", op.len(), nq * symm_dims(3) * ne);
    check_len("x", x.len(), nd * VDIM * ne);
    check_len("y", y.len(), nd * VDIM * ne);

    let b = view(maps.b(), [q1d, d1d]);
    let g = view(maps.g(), [q1d, d1d]);
    let bt = view(maps.bt(), [d1d, q1d]);
    let gt = view(maps.gt(), [d1d, q1d]);
    let op = view(op, [nq, 6, ne]);
    let x = view(x, [d1d, d1d, d1d, VDIM, ne]);

    let max_1d = d1d.max(q1d);
    let scratch_len = 3 * nq + 3 * max_1d * max_1d + 3 * max_1d;

    forall_elements(
        config,
        y,
        nd * VDIM,
        || vec![T::zero(); scratch_len],
        |scratch, e, y_e| {
            let d1d = fixed_or_runtime(T_D1D, d1d);
            let q1d = fixed_or_runtime(T_Q1D, q1d);
            let mut y = view_mut(y_e, [d1d, d1d, d1d, VDIM]);
            let (grad, rest) = scratch.split_at_mut(3 * q1d * q1d * q1d);
            let (grad_xy, rest) = rest.split_at_mut(3 * max_1d * max_1d);
            let grad_x = &mut rest[..3 * max_1d];
            let mut grad = view_mut(grad, [3, q1d, q1d, q1d]);

            for c in 0..VDIM {
                grad.fill(T::zero());
                for dz in 0..d1d {
                    let mut grad_xy = view_mut(&mut grad_xy[..3 * q1d * q1d], [3, q1d, q1d]);
                    grad_xy.fill(T::zero());
                    for dy in 0..d1d {
                        let mut grad_x = view_mut(&mut grad_x[..2 * q1d], [2, q1d]);
                        grad_x.fill(T::zero());
                        for dx in 0..d1d {
                            let s = x[[dx, dy, dz, c, e]];
                            for qx in 0..q1d {
                                grad_x[[0, qx]] += s * b[[qx, dx]];
                                grad_x[[1, qx]] += s * g[[qx, dx]];
                            }
                        }
                        for qy in 0..q1d {
                            let wy = b[[qy, dy]];
                            let w_dy = g[[qy, dy]];
                            for qx in 0..q1d {
                                let wx = grad_x[[0, qx]];
                                let w_dx = grad_x[[1, qx]];
                                grad_xy[[0, qx, qy]] += w_dx * wy;
                                grad_xy[[1, qx, qy]] += wx * w_dy;
                                grad_xy[[2, qx, qy]] += wx * wy;
                            }
                        }
                    }
                    for qz in 0..q1d {
                        let wz = b[[qz, dz]];
                        let w_dz = g[[qz, dz]];
                        for qy in 0..q1d {
                            for qx in 0..q1d {
                                grad[[0, qx, qy, qz]] += grad_xy[[0, qx, qy]] * wz;
                                grad[[1, qx, qy, qz]] += grad_xy[[1, qx, qy]] * wz;
                                grad[[2, qx, qy, qz]] += grad_xy[[2, qx, qy]] * w_dz;
                            }
                        }
                    }
                }

                for qz in 0..q1d {
                    for qy in 0..q1d {
                        for qx in 0..q1d {
                            let q = qx + (qy + qz * q1d) * q1d;
                            let o11 = op[[q, 0, e]];
                            let o12 = op[[q, 1, e]];
                            let o13 = op[[q, 2, e]];
                            let o22 = op[[q, 3, e]];
                            let o23 = op[[q, 4, e]];
                            let o33 = op[[q, 5, e]];
                            let grad_x = grad[[0, qx, qy, qz]];
                            let grad_y = grad[[1, qx, qy, qz]];
                            let grad_z = grad[[2, qx, qy, qz]];
                            grad[[0, qx, qy, qz]] = (o11 * grad_x) + (o12 * grad_y) + (o13 * grad_z);
                            grad[[1, qx, qy, qz]] = (o12 * grad_x) + (o22 * grad_y) + (o23 * grad_z);
                            grad[[2, qx, qy, qz]] = (o13 * grad_x) + (o23 * grad_y) + (o33 * grad_z);
                        }
                    }
                }

                for qz in 0..q1d {
                    let mut grad_xy = view_mut(&mut grad_xy[..3 * d1d * d1d], [3, d1d, d1d]);
                    grad_xy.fill(T::zero());
                    for qy in 0..q1d {
                        let mut grad_x = view_mut(&mut grad_x[..3 * d1d], [3, d1d]);
                        grad_x.fill(T::zero());
                        for qx in 0..q1d {
                            let g_x = grad[[0, qx, qy, qz]];
                            let g_y = grad[[1, qx, qy, qz]];
                            let g_z = grad[[2, qx, qy, qz]];
                            for dx in 0..d1d {
                                let wx = bt[[dx, qx]];
                                let w_dx = gt[[dx, qx]];
                                grad_x[[0, dx]] += g_x * w_dx;
                                grad_x[[1, dx]] += g_y * wx;
                                grad_x[[2, dx]] += g_z * wx;
                            }
                        }
                        for dy in 0..d1d {
                            let wy = bt[[dy, qy]];
                            let w_dy = gt[[dy, qy]];
                            for dx in 0..d1d {
                                grad_xy[[0, dx, dy]] += grad_x[[0, dx]] * wy;
                                grad_xy[[1, dx, dy]] += grad_x[[1, dx]] * w_dy;
                                grad_xy[[2, dx, dy]] += grad_x[[2, dx]] * wy;
                            }
                        }
                    }
                    for dz in 0..d1d {
                        let wz = bt[[dz, qz]];
                        let w_dz = gt[[dz, qz]];
                        for dy in 0..d1d {
                            for dx in 0..d1d {
                                y[[dx, dy, dz, c]] += (grad_xy[[0, dx, dy]] * wz)
                                    + (grad_xy[[1, dx, dy]] * wz)
                                    + (grad_xy[[2, dx, dy]] * w_dz);
                            }
                        }
                    }
                }
            }
        },
    );
}
