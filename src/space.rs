//! Tensor-product element spaces as seen by the partial assembly operators.
use crate::basis::LagrangeBasis1d;
use crate::Real;
use eyre::ensure;

pub mod procedural;

/// A collection of tensor-product Lagrange elements of uniform order.
///
/// This is the narrow interface through which operators see a mesh: the dimensions, the
/// polynomial order and the nodal coordinates of every element in the layout
/// `(D1D^dim, SDIM, NE)`. Element nodes are ordered lexicographically with the x index
/// fastest. Connectivity between elements is not represented, the operators only ever work
/// with element-local vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorElementSpace<T> {
    dim: usize,
    sdim: usize,
    order: usize,
    num_elements: usize,
    nodes: Vec<T>,
}

impl<T: Real> TensorElementSpace<T> {
    pub fn new(dim: usize, sdim: usize, order: usize, nodes: Vec<T>) -> eyre::Result<Self> {
        ensure!((1..=3).contains(&dim), "reference dimension must be 1, 2 or 3, got {}", dim);
        ensure!(
            sdim >= dim && sdim <= 3,
            "space dimension must be between {} and 3, got {}",
            dim,
            sdim
        );
        ensure!(order >= 1, "polynomial order must be at least 1");
        let per_element = (order + 1).pow(dim as u32) * sdim;
        ensure!(
            nodes.len() % per_element == 0,
            "nodal coordinates of length {} do not match (D1D^dim, SDIM, NE) with {} entries per element",
            nodes.len(),
            per_element
        );
        Ok(Self {
            dim,
            sdim,
            order,
            num_elements: nodes.len() / per_element,
            nodes,
        })
    }

    /// Reference dimension of the elements.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Dimension of the embedding space.
    pub fn sdim(&self) -> usize {
        self.sdim
    }

    /// Number of components of the vector field, equal to the space dimension.
    pub fn vdim(&self) -> usize {
        self.sdim
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// Nodes per axis (`D1D`).
    pub fn nodes_per_axis(&self) -> usize {
        self.order + 1
    }

    pub fn nodes_per_element(&self) -> usize {
        self.nodes_per_axis().pow(self.dim as u32)
    }

    /// Length of an element-local vector with layout `(D1D^dim, VDIM, NE)`.
    pub fn vector_len(&self) -> usize {
        self.nodes_per_element() * self.vdim() * self.num_elements
    }

    /// The basis every axis of every element uses.
    pub fn basis(&self) -> LagrangeBasis1d<T> {
        LagrangeBasis1d::gauss_lobatto(self.order)
    }

    /// Nodal coordinates with layout `(D1D^dim, SDIM, NE)`.
    pub fn nodes(&self) -> &[T] {
        &self.nodes
    }

    /// Moves every node with `f`, which receives the `SDIM` coordinates of one node.
    ///
    /// Any geometric data computed for the previous node positions is stale afterwards.
    pub fn transform_nodes(&mut self, mut f: impl FnMut(&mut [T])) {
        let nd = self.nodes_per_element();
        let sdim = self.sdim;
        let mut x = vec![T::zero(); sdim];
        for nodes_e in self.nodes.chunks_mut(nd * sdim) {
            for n in 0..nd {
                for i in 0..sdim {
                    x[i] = nodes_e[n + nd * i];
                }
                f(&mut x);
                for i in 0..sdim {
                    nodes_e[n + nd * i] = x[i];
                }
            }
        }
    }
}
