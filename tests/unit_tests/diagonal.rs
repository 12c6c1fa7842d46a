use super::{apply, assembled, diagonal};
use matfree::backend::DenseElementProvider;
use matfree::basis::{DofToQuad, LagrangeBasis1d};
use matfree::coefficient::Coefficient;
use matfree::config::{ExecutionConfig, KernelLimits};
use matfree::dispatch::{assemble_diagonal, assemble_diagonal_generic, KernelShape};
use matfree::integrator::VectorDiffusionIntegrator;
use matfree::kernels::{diagonal_2d, diagonal_3d};
use matfree::proptest::{cylinder_surface, distorted_box, distorted_rectangle};
use matfree::quadrature::TensorRule;
use matfree::space::procedural::{cylinder_patch, uniform_box, uniform_rectangle};
use matfree::space::TensorElementSpace;
use proptest::prelude::*;
use std::sync::Arc;
use util::{assert_panics, assert_slices_approx_eq, pseudo_random_values, unit_vector};

/// The diagonal obtained by applying the operator to every unit vector.
fn diagonal_from_unit_vectors(integrator: &VectorDiffusionIntegrator<f64>, len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| apply(integrator, &unit_vector(len, i))[i])
        .collect()
}

fn check_diagonal_consistency(space: &TensorElementSpace<f64>, coefficient: Coefficient<f64>) {
    let integrator = assembled(space, coefficient);
    let len = space.vector_len();
    assert_slices_approx_eq!(diagonal(&integrator, len), diagonal_from_unit_vectors(&integrator, len), tol = 1e-12);
}

#[test]
fn diagonal_matches_unit_vector_applications() {
    let varying = Coefficient::function(|x: &[f64]| 1.0 + 0.5 * x[0]);
    check_diagonal_consistency(&uniform_rectangle(1, [-1.0, -1.0], [1.0, 1.0], [1, 1]), Coefficient::Constant(1.0));
    check_diagonal_consistency(&uniform_rectangle(3, [0.0, 0.0], [2.0, 1.0], [2, 1]), varying.clone());
    check_diagonal_consistency(&uniform_rectangle(6, [0.0, 0.0], [1.0, 1.0], [1, 1]), varying.clone());
    check_diagonal_consistency(&uniform_box(2, [0.0; 3], [1.0, 1.0, 2.0], [1, 1, 1]), varying.clone());
    check_diagonal_consistency(&uniform_box(4, [0.0; 3], [1.0; 3], [1, 1, 1]), Coefficient::Constant(2.0));
    check_diagonal_consistency(&cylinder_patch(2, 1.0, 1.0, 1.0, [2, 1]), varying);
}

#[test]
fn diagonal_is_repeated_for_every_component() {
    let space = cylinder_patch(3, 2.0, 0.5, 1.0, [1, 2]);
    let integrator = assembled(&space, Coefficient::Constant(1.0));
    let diag = diagonal(&integrator, space.vector_len());
    let nd = space.nodes_per_element();
    for e in 0..space.num_elements() {
        let component = |c: usize| &diag[nd * (c + 3 * e)..nd * (c + 1 + 3 * e)];
        assert_eq!(component(0), component(1));
        assert_eq!(component(0), component(2));
        assert!(component(2).iter().all(|&d| d > 0.0));
    }
}

#[test]
fn diagonal_of_reference_square() {
    // Bilinear element on [-1, 1]^2: every diagonal entry of the Laplacian stiffness is 2/3
    let space = uniform_rectangle(1, [-1.0, -1.0], [1.0, 1.0], [1, 1]);
    let integrator = assembled(&space, Coefficient::Constant(1.0));
    let diag = diagonal(&integrator, space.vector_len());
    assert_slices_approx_eq!(diag, vec![2.0 / 3.0; 8], tol = 1e-14);
}

#[test]
fn diagonal_accumulates_into_output() {
    let space = uniform_box(1, [0.0; 3], [1.0; 3], [2, 1, 1]);
    let integrator = assembled(&space, Coefficient::Constant(1.0));
    let len = space.vector_len();
    let d = diagonal(&integrator, len);
    let mut twice = vec![0.0; len];
    integrator.assemble_diagonal_pa(&mut twice).unwrap();
    integrator.assemble_diagonal_pa(&mut twice).unwrap();
    let expected: Vec<f64> = d.iter().map(|v| 2.0 * v).collect();
    assert_slices_approx_eq!(twice, expected, tol = 1e-15);
}

#[test]
fn native_and_dense_diagonals_agree() {
    let coefficient = Coefficient::function(|x: &[f64]| 2.0 + x[1]);
    let spaces = [
        uniform_rectangle(2, [0.0, 0.0], [1.0, 3.0], [1, 2]),
        uniform_box(3, [0.0; 3], [1.0; 3], [1, 1, 1]),
        cylinder_patch(2, 1.0, 1.2, 0.5, [2, 2]),
    ];
    for space in &spaces {
        let native = assembled(space, coefficient.clone());
        let mut dense = VectorDiffusionIntegrator::new(coefficient.clone())
            .with_backend_provider(Arc::new(DenseElementProvider::default()));
        dense.assemble_pa(space).unwrap();
        let len = space.vector_len();
        assert_slices_approx_eq!(diagonal(&native, len), diagonal(&dense, len), tol = 1e-12);
    }
}

#[test]
fn fixed_size_and_generic_diagonals_agree() {
    let config = ExecutionConfig::serial();
    for (dim, sdim) in [(2, 2), (2, 3), (3, 3)] {
        for n in 2..=6 {
            let shape = KernelShape::new(dim, sdim, n, n).unwrap();
            let ne = 2;
            let maps = DofToQuad::tensor(&LagrangeBasis1d::gauss_lobatto(n - 1), &TensorRule::gauss(dim, n));
            let op = pseudo_random_values(shape.op_len(ne), n as u64);
            let mut d_dispatch = vec![0.0; shape.vector_len(ne)];
            let mut d_generic = vec![0.0; shape.vector_len(ne)];
            assemble_diagonal(&config, &shape, ne, &maps, &op, &mut d_dispatch);
            assemble_diagonal_generic(&config, &shape, ne, &maps, &op, &mut d_generic);
            assert_slices_approx_eq!(d_dispatch, d_generic, tol = 1e-14);
        }
    }
}

#[test]
fn diagonal_kernels_reject_sizes_beyond_limits() {
    let config = ExecutionConfig::serial().with_limits(KernelLimits {
        max_d1d: 2,
        max_q1d: 14,
    });
    let maps_2d = DofToQuad::tensor(&LagrangeBasis1d::<f64>::gauss_lobatto(2), &TensorRule::gauss(2, 3));
    assert_panics!({
        let mut diag = vec![0.0; 9 * 2];
        diagonal_2d::<f64, 0, 0>(&config, 1, &maps_2d, &[0.0; 9 * 3], &mut diag, 2)
    });
    let maps_3d = DofToQuad::tensor(&LagrangeBasis1d::<f64>::gauss_lobatto(2), &TensorRule::gauss(3, 3));
    assert_panics!({
        let mut diag = vec![0.0; 27 * 3];
        diagonal_3d::<f64, 0, 0>(&config, 1, &maps_3d, &vec![0.0; 27 * 6], &mut diag)
    });
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn diagonal_matches_unit_vectors_on_distorted_quadrilaterals(space in distorted_rectangle(2, [1, 2])) {
        check_diagonal_consistency(&space, Coefficient::Constant(1.0));
    }

    #[test]
    fn diagonal_matches_unit_vectors_on_distorted_hexahedra(space in distorted_box(2, [1, 1, 1])) {
        check_diagonal_consistency(&space, Coefficient::Constant(1.0));
    }

    #[test]
    fn diagonal_matches_unit_vectors_on_surfaces(space in cylinder_surface(3, [1, 1])) {
        check_diagonal_consistency(&space, Coefficient::Constant(1.0));
    }
}
