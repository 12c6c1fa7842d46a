use matfree::basis::DofToQuad;
use matfree::config::ExecutionConfig;
use matfree::geometry::{GeometricFactorFlags, GeometricFactors};
use matfree::quadrature::TensorRule;
use matfree::space::procedural::{cylinder_patch, uniform_box, uniform_rectangle};
use matfree::space::TensorElementSpace;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, Matrix2, Vector2};

fn factors(space: &TensorElementSpace<f64>, q1d: usize, flags: GeometricFactorFlags) -> GeometricFactors<f64> {
    let rule = TensorRule::gauss(space.dim(), q1d);
    let maps = DofToQuad::tensor(&space.basis(), &rule);
    GeometricFactors::from_nodes(
        space.dim(),
        space.sdim(),
        &maps,
        space.nodes(),
        flags,
        &ExecutionConfig::default(),
    )
}

#[test]
fn affine_quadrilaterals_have_constant_jacobians() {
    let a = Matrix2::new(2.0, 0.5, -0.3, 1.5);
    let t = Vector2::new(0.25, -1.0);
    let mut space = uniform_rectangle(2, [-1.0, -1.0], [1.0, 1.0], [1, 1]);
    space.transform_nodes(|x| {
        let y = a * Vector2::new(x[0], x[1]) + t;
        x.copy_from_slice(y.as_slice());
    });
    let geometry = factors(&space, 3, GeometricFactorFlags::JACOBIANS | GeometricFactorFlags::COORDINATES);
    assert_eq!(geometry.num_quadrature_points(), 9);
    assert_eq!(geometry.num_elements(), 1);

    let rule = TensorRule::<f64>::gauss(2, 3);
    let coordinates = geometry.coordinates().unwrap();
    for q in 0..9 {
        let j = geometry.jacobian_matrix(q, 0).unwrap();
        assert_matrix_eq!(j, DMatrix::from_column_slice(2, 2, a.as_slice()), comp = abs, tol = 1e-13);

        let xi = Vector2::new(rule.points_1d()[q % 3], rule.points_1d()[q / 3]);
        let x = a * xi + t;
        assert_scalar_eq!(coordinates[q], x[0], comp = abs, tol = 1e-13);
        assert_scalar_eq!(coordinates[q + 9], x[1], comp = abs, tol = 1e-13);
    }
}

#[test]
fn box_cells_have_diagonal_jacobians() {
    let space = uniform_box(3, [0.0; 3], [1.0, 2.0, 3.0], [2, 2, 2]);
    let geometry = factors(&space, 4, GeometricFactorFlags::JACOBIANS);
    assert!(geometry.coordinates().is_none());
    let expected = DMatrix::from_diagonal(&nalgebra::DVector::from_column_slice(&[0.25, 0.5, 0.75]));
    for e in 0..8 {
        for q in 0..64 {
            let j = geometry.jacobian_matrix(q, e).unwrap();
            assert_matrix_eq!(j, expected, comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn cylinder_quadrature_points_lie_near_the_surface() {
    let radius = 2.0;
    let space = cylinder_patch(4, radius, 1.0, 1.0, [2, 1]);
    let geometry = factors(&space, 5, GeometricFactorFlags::JACOBIANS | GeometricFactorFlags::COORDINATES);
    let nq = 25;
    let coordinates = geometry.coordinates().unwrap();
    for e in 0..2 {
        for q in 0..nq {
            let x = coordinates[q + nq * (3 * e)];
            let y = coordinates[q + nq * (1 + 3 * e)];
            assert_scalar_eq!((x * x + y * y).sqrt(), radius, comp = abs, tol = 1e-4);

            // The first column is tangent to the circle, the second is the axis direction
            let j = geometry.jacobian_matrix(q, e).unwrap();
            let radial = [x / radius, y / radius, 0.0];
            let tangential_dot_radial: f64 = (0..3).map(|i| j[(i, 0)] * radial[i]).sum();
            assert_scalar_eq!(tangential_dot_radial, 0.0, comp = abs, tol = 1e-3);
            assert_scalar_eq!(j[(0, 1)], 0.0, comp = abs, tol = 1e-12);
            assert_scalar_eq!(j[(1, 1)], 0.0, comp = abs, tol = 1e-12);
            assert_scalar_eq!(j[(2, 1)], 0.5, comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn serial_and_parallel_factors_agree() {
    let mut space = uniform_box(2, [0.0; 3], [1.0; 3], [3, 3, 2]);
    space.transform_nodes(|x| x[2] += 0.1 * x[0] * x[1]);
    let rule = TensorRule::gauss(3, 3);
    let maps = DofToQuad::tensor(&space.basis(), &rule);
    let flags = GeometricFactorFlags::JACOBIANS | GeometricFactorFlags::COORDINATES;
    let compute = |config: ExecutionConfig| GeometricFactors::from_nodes(3, 3, &maps, space.nodes(), flags, &config);
    let serial = compute(ExecutionConfig::serial());
    let parallel = compute(ExecutionConfig::parallel().with_min_elements_per_task(1));
    assert_eq!(serial, parallel);
}

#[test]
fn from_fn_uses_documented_layout() {
    let (nq, ne) = (4, 2);
    let geometry = GeometricFactors::from_fn(2, 3, nq, ne, |q, e| {
        DMatrix::from_fn(3, 2, |i, k| (q + 10 * i + 100 * k + 1000 * e) as f64)
    });
    let j = geometry.jacobians().unwrap();
    assert_eq!(j.len(), nq * 3 * 2 * ne);
    for e in 0..ne {
        for k in 0..2 {
            for i in 0..3 {
                for q in 0..nq {
                    let expected = (q + 10 * i + 100 * k + 1000 * e) as f64;
                    assert_eq!(j[q + nq * (i + 3 * (k + 2 * e))], expected);
                }
            }
        }
    }
    assert_eq!(geometry.jacobian_matrix(3, 1).unwrap()[(2, 1)], 3.0 + 20.0 + 100.0 + 1000.0);
}

#[test]
fn flags_combine() {
    let both = GeometricFactorFlags::JACOBIANS | GeometricFactorFlags::COORDINATES;
    assert!(both.contains(GeometricFactorFlags::JACOBIANS));
    assert!(both.contains(GeometricFactorFlags::COORDINATES));
    assert!(!GeometricFactorFlags::JACOBIANS.contains(GeometricFactorFlags::COORDINATES));
}

#[test]
fn combined_pass_matches_separate_passes() {
    let mut cube = uniform_box(3, [0.0; 3], [1.0; 3], [2, 2, 2]);
    cube.transform_nodes(|x| x[0] += 0.2 * x[1] * x[2]);
    let surface = cylinder_patch(2, 1.0, 2.0, 1.0, [3, 2]);
    for space in [&cube, &surface] {
        let both = factors(space, 4, GeometricFactorFlags::JACOBIANS | GeometricFactorFlags::COORDINATES);
        let jacobians = factors(space, 4, GeometricFactorFlags::JACOBIANS);
        let coordinates = factors(space, 4, GeometricFactorFlags::COORDINATES);
        assert_eq!(both.jacobians(), jacobians.jacobians());
        assert_eq!(both.coordinates(), coordinates.coordinates());
        assert!(jacobians.coordinates().is_none());
        assert!(coordinates.jacobians().is_none());
        assert_eq!(coordinates.coordinates().unwrap().len(), 3 * both.num_quadrature_points() * both.num_elements());
    }
}
