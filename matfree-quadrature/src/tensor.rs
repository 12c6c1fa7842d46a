//! 2D and 3D quadrature rules formed by tensor product formulations.
//!
//! For quadrilaterals and hexahedra, quadrature rules can be constructed as tensor products
//! of 1D rules. The first coordinate varies fastest.

use crate::univariate::gauss;
use crate::{Rule, Rule2d, Rule3d};

/// Tensor product of a 1D rule with itself, for the reference quadrilateral `[-1, 1]^2`.
pub fn quadrilateral_from_1d(rule: &Rule<1>) -> Rule2d {
    let (weights1d, points1d) = rule;
    let n = weights1d.len();
    let mut weights2d = Vec::with_capacity(n * n);
    let mut points2d = Vec::with_capacity(n * n);

    for (&wy, &[y]) in weights1d.iter().zip(points1d) {
        for (&wx, &[x]) in weights1d.iter().zip(points1d) {
            weights2d.push(wx * wy);
            points2d.push([x, y]);
        }
    }

    (weights2d, points2d)
}

/// Tensor product of a 1D rule with itself, for the reference hexahedron `[-1, 1]^3`.
pub fn hexahedron_from_1d(rule: &Rule<1>) -> Rule3d {
    let (weights1d, points1d) = rule;
    let n = weights1d.len();
    let mut weights3d = Vec::with_capacity(n * n * n);
    let mut points3d = Vec::with_capacity(n * n * n);

    for (&wz, &[z]) in weights1d.iter().zip(points1d) {
        for (&wy, &[y]) in weights1d.iter().zip(points1d) {
            for (&wx, &[x]) in weights1d.iter().zip(points1d) {
                weights3d.push(wx * wy * wz);
                points3d.push([x, y, z]);
            }
        }
    }

    (weights3d, points3d)
}

/// A Gauss quadrature rule for the reference quadrilateral.
///
/// The rule is constructed as a tensor product from 1D rules, with the provided number of
/// points per dimension.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Rule2d {
    quadrilateral_from_1d(&gauss(num_points_per_dim))
}

/// A Gauss quadrature rule for the reference hexahedron.
///
/// The rule is constructed as a tensor product from 1D rules, with the provided number of
/// points per dimension.
pub fn hexahedron_gauss(num_points_per_dim: usize) -> Rule3d {
    hexahedron_from_1d(&gauss(num_points_per_dim))
}
