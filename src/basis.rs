//! One-dimensional nodal bases and the dof-to-quadrature tables built from them.
use crate::quadrature::TensorRule;
use crate::reshape::view;
use crate::Real;
use matfree_quadrature::univariate::gauss_lobatto;
use nalgebra::convert;
use serde::{Deserialize, Serialize};

/// Nodal Lagrange basis of order `p` on `p + 1` distinct nodes in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LagrangeBasis1d<T> {
    nodes: Vec<T>,
    // w_j = 1 / prod_{m != j} (x_j - x_m)
    barycentric_weights: Vec<T>,
}

impl<T: Real> LagrangeBasis1d<T> {
    /// Constructs the basis with the given nodes.
    ///
    /// # Panics
    ///
    /// Panics if no nodes are given or if two nodes coincide.
    pub fn from_nodes(nodes: Vec<T>) -> Self {
        assert!(!nodes.is_empty(), "a Lagrange basis needs at least one node");
        let barycentric_weights = nodes
            .iter()
            .enumerate()
            .map(|(j, &x_j)| {
                let mut denominator = T::one();
                for (m, &x_m) in nodes.iter().enumerate() {
                    if m != j {
                        assert!(x_j != x_m, "Lagrange nodes must be distinct");
                        denominator *= x_j - x_m;
                    }
                }
                T::one() / denominator
            })
            .collect();
        Self {
            nodes,
            barycentric_weights,
        }
    }

    /// The basis of the given order on Gauss-Lobatto nodes.
    ///
    /// # Panics
    ///
    /// Panics if `order` is zero.
    pub fn gauss_lobatto(order: usize) -> Self {
        assert!(order >= 1, "Gauss-Lobatto bases must have order at least 1");
        let (_, points) = gauss_lobatto(order + 1);
        Self::from_nodes(points.into_iter().map(|[x]| convert(x)).collect())
    }

    pub fn order(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Number of basis functions (`D1D`).
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[T] {
        &self.nodes
    }

    /// Evaluates all basis functions and their derivatives at `x`.
    ///
    /// # Panics
    ///
    /// Panics if the output buffers do not have one entry per node.
    pub fn evaluate(&self, x: T, values: &mut [T], derivatives: &mut [T]) {
        let n = self.nodes.len();
        assert_eq!(values.len(), n);
        assert_eq!(derivatives.len(), n);

        for j in 0..n {
            // Running product p = prod_{m != j} (x - x_m) together with its derivative,
            // which is exact also when x coincides with a node
            let mut p = T::one();
            let mut dp = T::zero();
            for (m, &x_m) in self.nodes.iter().enumerate() {
                if m != j {
                    dp = dp * (x - x_m) + p;
                    p *= x - x_m;
                }
            }
            values[j] = self.barycentric_weights[j] * p;
            derivatives[j] = self.barycentric_weights[j] * dp;
        }
    }
}

/// Values and derivatives of a 1D basis at the points of a 1D quadrature rule.
///
/// For tensor-product elements these tables determine the basis at every quadrature point of
/// the element, which is what makes sum factorization possible. `B` and `G` have shape
/// `(Q1D, D1D)`, their transposes `Bt` and `Gt` have shape `(D1D, Q1D)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DofToQuad<T> {
    ndof: usize,
    nqpt: usize,
    b: Vec<T>,
    g: Vec<T>,
    bt: Vec<T>,
    gt: Vec<T>,
}

impl<T: Real> DofToQuad<T> {
    pub fn tensor(basis: &LagrangeBasis1d<T>, rule: &TensorRule<T>) -> Self {
        let ndof = basis.num_nodes();
        let nqpt = rule.num_points_1d();
        let mut b = vec![T::zero(); nqpt * ndof];
        let mut g = vec![T::zero(); nqpt * ndof];
        let mut values = vec![T::zero(); ndof];
        let mut derivatives = vec![T::zero(); ndof];

        for (q, &x_q) in rule.points_1d().iter().enumerate() {
            basis.evaluate(x_q, &mut values, &mut derivatives);
            for d in 0..ndof {
                b[q + nqpt * d] = values[d];
                g[q + nqpt * d] = derivatives[d];
            }
        }

        Self::from_tables(ndof, nqpt, b, g)
    }

    /// Adopts precomputed tables `B`, `G` of shape `(nqpt, ndof)`.
    ///
    /// # Panics
    ///
    /// Panics if the tables do not have `nqpt * ndof` entries.
    pub fn from_tables(ndof: usize, nqpt: usize, b: Vec<T>, g: Vec<T>) -> Self {
        assert_eq!(b.len(), nqpt * ndof, "B must have shape (Q1D, D1D)");
        assert_eq!(g.len(), nqpt * ndof, "G must have shape (Q1D, D1D)");
        // Logical iteration order is row-major, which is the column-major order of the transpose
        let transpose = |table: &[T]| view(table, [nqpt, ndof]).iter().copied().collect::<Vec<_>>();
        let bt = transpose(&b);
        let gt = transpose(&g);
        Self {
            ndof,
            nqpt,
            b,
            g,
            bt,
            gt,
        }
    }

    /// Number of dofs per axis (`D1D`).
    pub fn ndof(&self) -> usize {
        self.ndof
    }

    /// Number of quadrature points per axis (`Q1D`).
    pub fn nqpt(&self) -> usize {
        self.nqpt
    }

    pub fn b(&self) -> &[T] {
        &self.b
    }

    pub fn g(&self) -> &[T] {
        &self.g
    }

    pub fn bt(&self) -> &[T] {
        &self.bt
    }

    pub fn gt(&self) -> &[T] {
        &self.gt
    }
}
