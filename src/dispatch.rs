//! Selection of kernel instantiations by element shape.
//!
//! Common `(D1D, Q1D)` pairs are routed to kernels instantiated with compile-time sizes, every
//! other pair to the runtime-sized kernels. Both compute the same result.
use crate::basis::DofToQuad;
use crate::config::ExecutionConfig;
use crate::kernels::{apply_2d, apply_3d, diagonal_2d, diagonal_3d, symm_dims};
use crate::Real;
use eyre::{bail, ensure};
use log::trace;

/// Which instantiation of a kernel handles a given shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelVariant {
    /// A kernel compiled for exactly these sizes.
    Fixed { d1d: usize, q1d: usize },
    /// The kernel with runtime sizes.
    Generic,
}

/// Dimensions and per-axis sizes of the elements an operator acts on.
///
/// Only the combinations that have kernels can be constructed: `(dim, sdim)` is one of
/// `(2, 2)`, `(2, 3)` or `(3, 3)`, and the vector dimension equals `sdim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelShape {
    dim: usize,
    sdim: usize,
    d1d: usize,
    q1d: usize,
}

impl KernelShape {
    pub fn new(dim: usize, sdim: usize, d1d: usize, q1d: usize) -> eyre::Result<Self> {
        ensure!(dim != 1, "dim = 1 is not supported by the vector diffusion kernels");
        match (dim, sdim) {
            (2, 2) | (2, 3) | (3, 3) => {}
            _ => bail!(
                "no vector diffusion kernel for dim = {} and sdim = {}",
                dim,
                sdim
            ),
        }
        ensure!(d1d > 0, "D1D must be positive");
        ensure!(q1d > 0, "Q1D must be positive");
        Ok(Self { dim, sdim, d1d, q1d })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn sdim(&self) -> usize {
        self.sdim
    }

    /// Number of vector components per dof, which equals the space dimension.
    pub fn vdim(&self) -> usize {
        self.sdim
    }

    pub fn d1d(&self) -> usize {
        self.d1d
    }

    pub fn q1d(&self) -> usize {
        self.q1d
    }

    /// Scalar dofs per element (`D1D^dim`).
    pub fn num_nodes(&self) -> usize {
        self.d1d.pow(self.dim as u32)
    }

    /// Quadrature points per element (`Q1D^dim`).
    pub fn num_quadrature_points(&self) -> usize {
        self.q1d.pow(self.dim as u32)
    }

    /// Entries of `D` stored per quadrature point.
    pub fn symm_dims(&self) -> usize {
        symm_dims(self.dim)
    }

    /// Length of the element-local vector layout `(D1D^dim, VDIM, NE)`.
    pub fn vector_len(&self, ne: usize) -> usize {
        self.num_nodes() * self.vdim() * ne
    }

    /// Length of the operator data `(NQ, symm_dims, NE)`.
    pub fn op_len(&self, ne: usize) -> usize {
        self.num_quadrature_points() * self.symm_dims() * ne
    }

    pub fn variant(&self) -> KernelVariant {
        match (self.dim, self.d1d, self.q1d) {
            (2, 2, 2) | (2, 3, 3) | (2, 4, 4) | (2, 5, 5) => KernelVariant::Fixed {
                d1d: self.d1d,
                q1d: self.q1d,
            },
            (3, 2, 2) | (3, 3, 3) | (3, 4, 4) => KernelVariant::Fixed {
                d1d: self.d1d,
                q1d: self.q1d,
            },
            _ => KernelVariant::Generic,
        }
    }
}

/// Adds the action of the operator to `y`, using a fixed-size kernel when one exists.
pub fn add_mult<T: Real>(
    config: &ExecutionConfig,
    shape: &KernelShape,
    ne: usize,
    maps: &DofToQuad<T>,
    op: &[T],
    x: &[T],
    y: &mut [T],
) {
    let variant = shape.variant();
    trace!("vector diffusion apply for {:?}: {:?}", shape, variant);
    let (d1d, q1d) = match variant {
        KernelVariant::Fixed { d1d, q1d } => (d1d, q1d),
        KernelVariant::Generic => return add_mult_generic(config, shape, ne, maps, op, x, y),
    };
    match (shape.dim, shape.sdim, d1d, q1d) {
        (2, 3, 2, 2) => apply_2d::<T, 2, 2, 3>(config, ne, maps, op, x, y, 3),
        (2, 3, 3, 3) => apply_2d::<T, 3, 3, 3>(config, ne, maps, op, x, y, 3),
        (2, 3, 4, 4) => apply_2d::<T, 4, 4, 3>(config, ne, maps, op, x, y, 3),
        (2, 3, 5, 5) => apply_2d::<T, 5, 5, 3>(config, ne, maps, op, x, y, 3),
        (2, 2, 2, 2) => apply_2d::<T, 2, 2, 2>(config, ne, maps, op, x, y, 2),
        (2, 2, 3, 3) => apply_2d::<T, 3, 3, 2>(config, ne, maps, op, x, y, 2),
        (2, 2, 4, 4) => apply_2d::<T, 4, 4, 2>(config, ne, maps, op, x, y, 2),
        (2, 2, 5, 5) => apply_2d::<T, 5, 5, 2>(config, ne, maps, op, x, y, 2),
        (3, 3, 2, 2) => apply_3d::<T, 2, 2>(config, ne, maps, op, x, y),
        (3, 3, 3, 3) => apply_3d::<T, 3, 3>(config, ne, maps, op, x, y),
        (3, 3, 4, 4) => apply_3d::<T, 4, 4>(config, ne, maps, op, x, y),
        _ => unreachable!("{:?} has no fixed-size apply kernel", shape),
    }
}

/// Adds the action of the operator to `y` with the runtime-sized kernels only.
pub fn add_mult_generic<T: Real>(
    config: &ExecutionConfig,
    shape: &KernelShape,
    ne: usize,
    maps: &DofToQuad<T>,
    op: &[T],
    x: &[T],
    y: &mut [T],
) {
    match shape.dim {
        2 => apply_2d::<T, 0, 0, 0>(config, ne, maps, op, x, y, shape.vdim()),
        _ => apply_3d::<T, 0, 0>(config, ne, maps, op, x, y),
    }
}

/// Adds the operator diagonal to `diag`, using a fixed-size kernel when one exists.
pub fn assemble_diagonal<T: Real>(
    config: &ExecutionConfig,
    shape: &KernelShape,
    ne: usize,
    maps: &DofToQuad<T>,
    op: &[T],
    diag: &mut [T],
) {
    let variant = shape.variant();
    trace!("vector diffusion diagonal for {:?}: {:?}", shape, variant);
    let (d1d, q1d) = match variant {
        KernelVariant::Fixed { d1d, q1d } => (d1d, q1d),
        KernelVariant::Generic => return assemble_diagonal_generic(config, shape, ne, maps, op, diag),
    };
    let vdim = shape.vdim();
    match (shape.dim, d1d, q1d) {
        (2, 2, 2) => diagonal_2d::<T, 2, 2>(config, ne, maps, op, diag, vdim),
        (2, 3, 3) => diagonal_2d::<T, 3, 3>(config, ne, maps, op, diag, vdim),
        (2, 4, 4) => diagonal_2d::<T, 4, 4>(config, ne, maps, op, diag, vdim),
        (2, 5, 5) => diagonal_2d::<T, 5, 5>(config, ne, maps, op, diag, vdim),
        (3, 2, 2) => diagonal_3d::<T, 2, 2>(config, ne, maps, op, diag),
        (3, 3, 3) => diagonal_3d::<T, 3, 3>(config, ne, maps, op, diag),
        (3, 4, 4) => diagonal_3d::<T, 4, 4>(config, ne, maps, op, diag),
        _ => unreachable!("{:?} has no fixed-size diagonal kernel", shape),
    }
}

/// Adds the operator diagonal to `diag` with the runtime-sized kernels only.
pub fn assemble_diagonal_generic<T: Real>(
    config: &ExecutionConfig,
    shape: &KernelShape,
    ne: usize,
    maps: &DofToQuad<T>,
    op: &[T],
    diag: &mut [T],
) {
    match shape.dim {
        2 => diagonal_2d::<T, 0, 0>(config, ne, maps, op, diag, shape.vdim()),
        _ => diagonal_3d::<T, 0, 0>(config, ne, maps, op, diag),
    }
}
