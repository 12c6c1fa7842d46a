//! Tensor-product quadrature rules in the scalar type of the kernels.
use crate::Real;
use matfree_quadrature::{tensor, univariate, Rule};
use nalgebra::convert;

/// Errors returned by quadrature methods.
pub use matfree_quadrature::Error as QuadratureError;

/// A quadrature rule on `[-1, 1]^dim` formed as the tensor product of a single 1D rule.
///
/// The flattened weights are laid out with the x index fastest, i.e. the weight of the point
/// with 1D indices `(qx, qy, qz)` is `weights()[qx + Q1D * (qy + Q1D * qz)]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorRule<T> {
    dim: usize,
    points_1d: Vec<T>,
    weights_1d: Vec<T>,
    weights: Vec<T>,
}

fn convert_rule<T: Real>(rule: &Rule<1>) -> (Vec<T>, Vec<T>) {
    let (weights, points) = rule;
    (
        points.iter().map(|&[x]| convert(x)).collect(),
        weights.iter().map(|&w| convert(w)).collect(),
    )
}

impl<T: Real> TensorRule<T> {
    /// Tensor-product Gauss-Legendre rule with `num_points_1d` points per axis.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is not in `1 ..= 3` or no points are requested.
    pub fn gauss(dim: usize, num_points_1d: usize) -> Self {
        assert!(num_points_1d > 0, "number of points must be positive");
        let rule = univariate::gauss(num_points_1d);
        let (points_1d, weights_1d) = convert_rule(&rule);
        // The flattened weights are computed in double precision before conversion
        let weights: Vec<f64> = match dim {
            1 => rule.0,
            2 => tensor::quadrilateral_from_1d(&rule).0,
            3 => tensor::hexahedron_from_1d(&rule).0,
            _ => panic!("tensor rules are only available for dimensions 1, 2 and 3, got {}", dim),
        };
        Self {
            dim,
            points_1d,
            weights_1d,
            weights: weights.into_iter().map(convert).collect(),
        }
    }

    /// Tensor-product Gauss-Lobatto rule with `num_points_1d` points per axis.
    pub fn try_gauss_lobatto(dim: usize, num_points_1d: usize) -> Result<Self, QuadratureError> {
        let (points_1d, weights_1d) = convert_rule(&univariate::try_gauss_lobatto(num_points_1d)?);
        Ok(Self::from_1d(dim, points_1d, weights_1d))
    }

    /// Builds the tensor product of an arbitrary 1D rule on `[-1, 1]`.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is not in `1 ..= 3`, or if the number of points and weights differ.
    pub fn from_1d(dim: usize, points_1d: Vec<T>, weights_1d: Vec<T>) -> Self {
        assert!((1..=3).contains(&dim), "tensor rules are only available for dimensions 1, 2 and 3");
        assert_eq!(points_1d.len(), weights_1d.len(), "rule must have one weight per point");
        let n = weights_1d.len();
        let mut weights = Vec::with_capacity(n.pow(dim as u32));
        let nz = if dim == 3 { n } else { 1 };
        let ny = if dim >= 2 { n } else { 1 };
        for qz in 0..nz {
            for qy in 0..ny {
                for qx in 0..n {
                    let mut w = weights_1d[qx];
                    if dim >= 2 {
                        w *= weights_1d[qy];
                    }
                    if dim == 3 {
                        w *= weights_1d[qz];
                    }
                    weights.push(w);
                }
            }
        }
        Self {
            dim,
            points_1d,
            weights_1d,
            weights,
        }
    }

    /// The default rule for the diffusion bilinear form on tensor-product elements of the given
    /// order.
    ///
    /// The integration order is `2 p + dim - 1`, which accounts for the non-constant Jacobian
    /// of general (non-affine) elements.
    pub fn for_diffusion(dim: usize, order: usize) -> Self {
        Self::gauss(dim, Self::diffusion_points_1d(dim, order))
    }

    /// Number of 1D Gauss points used by [`TensorRule::for_diffusion`].
    pub fn diffusion_points_1d(dim: usize, order: usize) -> usize {
        let integration_order = 2 * order + dim - 1;
        integration_order / 2 + 1
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of points per axis (`Q1D`).
    pub fn num_points_1d(&self) -> usize {
        self.points_1d.len()
    }

    /// Total number of points (`NQ = Q1D^dim`).
    pub fn num_points(&self) -> usize {
        self.weights.len()
    }

    pub fn points_1d(&self) -> &[T] {
        &self.points_1d
    }

    pub fn weights_1d(&self) -> &[T] {
        &self.weights_1d
    }

    /// Flattened tensor-product weights.
    pub fn weights(&self) -> &[T] {
        &self.weights
    }
}
