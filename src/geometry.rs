//! Geometric factors of the reference-to-physical element maps at quadrature points.
use crate::basis::DofToQuad;
use crate::config::ExecutionConfig;
use crate::forall::forall_elements;
use crate::reshape::{view, view_mut};
use crate::Real;
use nalgebra::DMatrix;
use std::ops::BitOr;

/// Selects which geometric quantities to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometricFactorFlags(u8);

impl GeometricFactorFlags {
    /// Physical coordinates of the quadrature points.
    pub const COORDINATES: Self = Self(1);
    /// Jacobians of the element maps at the quadrature points.
    pub const JACOBIANS: Self = Self(2);

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for GeometricFactorFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Geometric data at every quadrature point of every element.
///
/// The Jacobians are stored with shape `(NQ, SDIM, DIM, NE)`, i.e. `J(q, i, k, e)` is the
/// derivative of physical coordinate `i` with respect to reference coordinate `k`. Coordinates,
/// if present, have shape `(NQ, SDIM, NE)`.
///
/// The factors describe one particular mesh state; they must be rebuilt when the nodes move.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometricFactors<T> {
    dim: usize,
    sdim: usize,
    nq: usize,
    ne: usize,
    jacobians: Option<Vec<T>>,
    coordinates: Option<Vec<T>>,
}

impl<T: Real> GeometricFactors<T> {
    /// Computes the requested factors from element nodal coordinates.
    ///
    /// `nodes` has shape `(D1D^dim, SDIM, NE)` and is interpolated with the (isoparametric)
    /// tables in `maps`, one tensor axis at a time.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is not 2 or 3, if `sdim < dim`, or if `nodes` has the wrong length.
    pub fn from_nodes(
        dim: usize,
        sdim: usize,
        maps: &DofToQuad<T>,
        nodes: &[T],
        flags: GeometricFactorFlags,
        config: &ExecutionConfig,
    ) -> Self {
        assert!(dim == 2 || dim == 3, "geometric factors are only available for dim 2 and 3");
        assert!(sdim >= dim && sdim <= 3, "space dimension must be in dim ..= 3");
        let d1d = maps.ndof();
        let q1d = maps.nqpt();
        let nd = d1d.pow(dim as u32);
        let nq = q1d.pow(dim as u32);
        assert_eq!(nodes.len() % (nd * sdim), 0, "nodes must have shape (D1D^dim, SDIM, NE)");
        let ne = nodes.len() / (nd * sdim);

        // One pass fills both quantities: each element chunk holds its Jacobians followed by its
        // coordinates, and the two are split apart afterwards.
        let with_jacobians = flags.contains(GeometricFactorFlags::JACOBIANS);
        let with_coordinates = flags.contains(GeometricFactorFlags::COORDINATES);
        let jacobians_len = if with_jacobians { nq * sdim * dim } else { 0 };
        let coordinates_len = if with_coordinates { nq * sdim } else { 0 };
        let chunk_len = jacobians_len + coordinates_len;
        let mut output = vec![T::zero(); chunk_len * ne];
        if chunk_len > 0 && ne > 0 {
            let scratch_len = 2 * q1d * d1d * d1d + 3 * q1d * q1d * d1d;
            forall_elements(
                config,
                &mut output,
                chunk_len,
                || vec![T::zero(); scratch_len],
                |scratch, e, output_e| {
                    let nodes_e = &nodes[e * nd * sdim..(e + 1) * nd * sdim];
                    let (jacobians, coordinates) = output_e.split_at_mut(jacobians_len);
                    let jacobians = with_jacobians.then_some(jacobians);
                    let coordinates = with_coordinates.then_some(coordinates);
                    match dim {
                        2 => interpolate_element_2d(maps, sdim, nodes_e, scratch, coordinates, jacobians),
                        _ => interpolate_element_3d(maps, sdim, nodes_e, scratch, coordinates, jacobians),
                    }
                },
            );
        }
        let extract = |offset: usize, len: usize| -> Vec<T> {
            output
                .chunks_exact(chunk_len)
                .flat_map(|chunk| chunk[offset..offset + len].iter().copied())
                .collect()
        };

        Self {
            dim,
            sdim,
            nq,
            ne,
            jacobians: with_jacobians.then(|| extract(0, jacobians_len)),
            coordinates: with_coordinates.then(|| extract(jacobians_len, coordinates_len)),
        }
    }

    /// Adopts Jacobians computed elsewhere, with shape `(NQ, SDIM, DIM, NE)`.
    pub fn from_jacobians(dim: usize, sdim: usize, nq: usize, ne: usize, jacobians: Vec<T>) -> Self {
        assert_eq!(
            jacobians.len(),
            nq * sdim * dim * ne,
            "Jacobians must have shape (NQ, SDIM, DIM, NE)"
        );
        Self {
            dim,
            sdim,
            nq,
            ne,
            jacobians: Some(jacobians),
            coordinates: None,
        }
    }

    /// Builds Jacobians by evaluating `jacobian(q, e)`, which must return a `SDIM x DIM` matrix.
    pub fn from_fn(
        dim: usize,
        sdim: usize,
        nq: usize,
        ne: usize,
        jacobian: impl Fn(usize, usize) -> DMatrix<T>,
    ) -> Self {
        let mut data = vec![T::zero(); nq * sdim * dim * ne];
        let mut j = view_mut(&mut data, [nq, sdim, dim, ne]);
        for e in 0..ne {
            for q in 0..nq {
                let j_qe = jacobian(q, e);
                assert_eq!(j_qe.shape(), (sdim, dim), "Jacobian must be a SDIM x DIM matrix");
                for k in 0..dim {
                    for i in 0..sdim {
                        j[[q, i, k, e]] = j_qe[(i, k)];
                    }
                }
            }
        }
        Self::from_jacobians(dim, sdim, nq, ne, data)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn sdim(&self) -> usize {
        self.sdim
    }

    pub fn num_quadrature_points(&self) -> usize {
        self.nq
    }

    pub fn num_elements(&self) -> usize {
        self.ne
    }

    pub fn jacobians(&self) -> Option<&[T]> {
        self.jacobians.as_deref()
    }

    pub fn coordinates(&self) -> Option<&[T]> {
        self.coordinates.as_deref()
    }

    /// The Jacobian at quadrature point `q` of element `e` as a `SDIM x DIM` matrix.
    pub fn jacobian_matrix(&self, q: usize, e: usize) -> Option<DMatrix<T>> {
        let j = view(self.jacobians()?, [self.nq, self.sdim, self.dim, self.ne]);
        Some(DMatrix::from_fn(self.sdim, self.dim, |i, k| j[[q, i, k, e]]))
    }
}

fn interpolate_element_2d<T: Real>(
    maps: &DofToQuad<T>,
    sdim: usize,
    nodes_e: &[T],
    scratch: &mut [T],
    coordinates: Option<&mut [T]>,
    jacobians: Option<&mut [T]>,
) {
    let d1d = maps.ndof();
    let q1d = maps.nqpt();
    let b = view(maps.b(), [q1d, d1d]);
    let g = view(maps.g(), [q1d, d1d]);
    let x = view(nodes_e, [d1d, d1d, sdim]);
    let mut coordinates = coordinates.map(|c| view_mut(c, [q1d * q1d, sdim]));
    let mut jacobians = jacobians.map(|j| view_mut(j, [q1d * q1d, sdim, 2]));

    let (bx, rest) = scratch.split_at_mut(q1d * d1d);
    let gx = &mut rest[..q1d * d1d];
    for s in 0..sdim {
        // Contract along x: (dx, dy) -> (qx, dy)
        for dy in 0..d1d {
            for qx in 0..q1d {
                let mut u = T::zero();
                let mut du = T::zero();
                for dx in 0..d1d {
                    let x_d = x[[dx, dy, s]];
                    u += b[[qx, dx]] * x_d;
                    du += g[[qx, dx]] * x_d;
                }
                bx[qx + q1d * dy] = u;
                gx[qx + q1d * dy] = du;
            }
        }
        // Contract along y: (qx, dy) -> (qx, qy)
        for qy in 0..q1d {
            for qx in 0..q1d {
                let q = qx + q1d * qy;
                let mut u = T::zero();
                let mut du_dx = T::zero();
                let mut du_dy = T::zero();
                for dy in 0..d1d {
                    u += b[[qy, dy]] * bx[qx + q1d * dy];
                    du_dx += b[[qy, dy]] * gx[qx + q1d * dy];
                    du_dy += g[[qy, dy]] * bx[qx + q1d * dy];
                }
                if let Some(c) = coordinates.as_mut() {
                    c[[q, s]] = u;
                }
                if let Some(j) = jacobians.as_mut() {
                    j[[q, s, 0]] = du_dx;
                    j[[q, s, 1]] = du_dy;
                }
            }
        }
    }
}

fn interpolate_element_3d<T: Real>(
    maps: &DofToQuad<T>,
    sdim: usize,
    nodes_e: &[T],
    scratch: &mut [T],
    coordinates: Option<&mut [T]>,
    jacobians: Option<&mut [T]>,
) {
    let d1d = maps.ndof();
    let q1d = maps.nqpt();
    let nq = q1d * q1d * q1d;
    let b = view(maps.b(), [q1d, d1d]);
    let g = view(maps.g(), [q1d, d1d]);
    let x = view(nodes_e, [d1d, d1d, d1d, sdim]);
    let mut coordinates = coordinates.map(|c| view_mut(c, [nq, sdim]));
    let mut jacobians = jacobians.map(|j| view_mut(j, [nq, sdim, 3]));

    // Stage 1 buffers have shape (Q1D, D1D, D1D), stage 2 buffers (Q1D, Q1D, D1D)
    let stage1_len = q1d * d1d * d1d;
    let stage2_len = q1d * q1d * d1d;
    let (stage1, stage2) = scratch.split_at_mut(2 * stage1_len);
    let (bx, gx) = stage1.split_at_mut(stage1_len);
    let (bxby, rest) = stage2.split_at_mut(stage2_len);
    let (gxby, rest) = rest.split_at_mut(stage2_len);
    let bxgy = &mut rest[..stage2_len];

    for s in 0..sdim {
        for dz in 0..d1d {
            for dy in 0..d1d {
                for qx in 0..q1d {
                    let mut u = T::zero();
                    let mut du = T::zero();
                    for dx in 0..d1d {
                        let x_d = x[[dx, dy, dz, s]];
                        u += b[[qx, dx]] * x_d;
                        du += g[[qx, dx]] * x_d;
                    }
                    bx[qx + q1d * (dy + d1d * dz)] = u;
                    gx[qx + q1d * (dy + d1d * dz)] = du;
                }
            }
        }
        for dz in 0..d1d {
            for qy in 0..q1d {
                for qx in 0..q1d {
                    let mut u = T::zero();
                    let mut du_dx = T::zero();
                    let mut du_dy = T::zero();
                    for dy in 0..d1d {
                        let i = qx + q1d * (dy + d1d * dz);
                        u += b[[qy, dy]] * bx[i];
                        du_dx += b[[qy, dy]] * gx[i];
                        du_dy += g[[qy, dy]] * bx[i];
                    }
                    let o = qx + q1d * (qy + q1d * dz);
                    bxby[o] = u;
                    gxby[o] = du_dx;
                    bxgy[o] = du_dy;
                }
            }
        }
        for qz in 0..q1d {
            for qy in 0..q1d {
                for qx in 0..q1d {
                    let q = qx + q1d * (qy + q1d * qz);
                    let mut u = T::zero();
                    let mut du_dx = T::zero();
                    let mut du_dy = T::zero();
                    let mut du_dz = T::zero();
                    for dz in 0..d1d {
                        let i = qx + q1d * (qy + q1d * dz);
                        u += b[[qz, dz]] * bxby[i];
                        du_dx += b[[qz, dz]] * gxby[i];
                        du_dy += b[[qz, dz]] * bxgy[i];
                        du_dz += g[[qz, dz]] * bxby[i];
                    }
                    if let Some(c) = coordinates.as_mut() {
                        c[[q, s]] = u;
                    }
                    if let Some(j) = jacobians.as_mut() {
                        j[[q, s, 0]] = du_dx;
                        j[[q, s, 1]] = du_dy;
                        j[[q, s, 2]] = du_dz;
                    }
                }
            }
        }
    }
}
