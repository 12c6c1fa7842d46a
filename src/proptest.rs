//! Strategies for property-based testing of operators.
use crate::space::procedural::{cylinder_patch, uniform_box, uniform_rectangle};
use crate::space::TensorElementSpace;
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use nalgebra::DMatrix;

/// A `sdim x dim` matrix close to the (extended) identity.
///
/// Every entry deviates by at most 0.3 from the identity, so square matrices are strictly
/// diagonally dominant and full-rank matrices are guaranteed in the embedded case.
pub fn jacobian(dim: usize, sdim: usize) -> impl Strategy<Value = DMatrix<f64>> {
    vec(-0.3..0.3, sdim * dim).prop_map(move |perturbation| {
        DMatrix::from_fn(sdim, dim, |i, k| {
            let identity = if i == k { 1.0 } else { 0.0 };
            identity + perturbation[i + sdim * k]
        })
    })
}

/// Nodal values in `[-1, 1]`.
pub fn nodal_values(len: usize) -> impl Strategy<Value = Vec<f64>> {
    vec(-1.0..1.0, len)
}

/// Moves every node by `x -> A x + eps (x_1^2, ..., x_n^2, x_0^2)`.
///
/// The quadratic term makes the elements non-affine.
fn distort(mut space: TensorElementSpace<f64>, a: &DMatrix<f64>, eps: f64) -> TensorElementSpace<f64> {
    let sdim = space.sdim();
    space.transform_nodes(|x| {
        let y: Vec<f64> = (0..sdim)
            .map(|i| {
                let linear: f64 = (0..sdim).map(|k| a[(i, k)] * x[k]).sum();
                let next = x[(i + 1) % sdim];
                linear + eps * next * next
            })
            .collect();
        x.copy_from_slice(&y);
    });
    space
}

/// Non-affine quadrilateral elements of the given order covering a distorted unit square.
pub fn distorted_rectangle(order: usize, cells: [usize; 2]) -> impl Strategy<Value = TensorElementSpace<f64>> {
    (jacobian(2, 2), -0.04..0.04).prop_map(move |(a, eps)| {
        distort(uniform_rectangle(order, [0.0, 0.0], [1.0, 1.0], cells), &a, eps)
    })
}

/// Non-affine hexahedral elements of the given order covering a distorted unit cube.
pub fn distorted_box(order: usize, cells: [usize; 3]) -> impl Strategy<Value = TensorElementSpace<f64>> {
    (jacobian(3, 3), -0.04..0.04).prop_map(move |(a, eps)| {
        distort(uniform_box(order, [0.0; 3], [1.0; 3], cells), &a, eps)
    })
}

/// Quadrilaterals on a cylinder patch with random radius and opening angle.
pub fn cylinder_surface(order: usize, cells: [usize; 2]) -> impl Strategy<Value = TensorElementSpace<f64>> {
    (0.5..2.0, 0.2..1.5, 0.5..2.0)
        .prop_map(move |(radius, angle, height)| cylinder_patch(order, radius, angle, height, cells))
}
