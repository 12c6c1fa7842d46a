use matfree::basis::DofToQuad;
use matfree::coefficient::{Coefficient, CoefficientStorage, CoefficientVector};
use matfree::config::ExecutionConfig;
use matfree::geometry::{GeometricFactorFlags, GeometricFactors};
use matfree::quadrature::TensorRule;
use matfree::space::procedural::uniform_rectangle;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

fn identity_geometry(nq: usize, ne: usize) -> GeometricFactors<f64> {
    GeometricFactors::from_fn(2, 2, nq, ne, |_, _| DMatrix::identity(2, 2))
}

fn sample_serial(
    coefficient: &Coefficient<f64>,
    geometry: &GeometricFactors<f64>,
    storage: CoefficientStorage,
) -> eyre::Result<CoefficientVector<f64>> {
    CoefficientVector::sample(coefficient, geometry, storage, &ExecutionConfig::serial())
}

#[test]
fn constants_are_compressed_by_default() {
    let geometry = identity_geometry(4, 3);
    let coefficient = Coefficient::Constant(2.5);

    let compressed = sample_serial(&coefficient, &geometry, CoefficientStorage::default()).unwrap();
    assert_eq!(compressed.len(), 1);
    assert!(compressed.is_constant());
    assert_eq!(compressed.num_quadrature_points(), 4);
    assert_eq!(compressed.num_elements(), 3);

    let full = sample_serial(&coefficient, &geometry, CoefficientStorage::Full).unwrap();
    assert_eq!(full.len(), 12);
    assert!(!full.is_constant());
    assert!(full.as_slice().iter().all(|&c| c == 2.5));

    for e in 0..3 {
        for q in 0..4 {
            assert_eq!(compressed.get(q, e), full.get(q, e));
        }
    }
}

#[test]
fn quadrature_values_are_indexed_by_point_then_element() {
    let values: Vec<f64> = (0..6).map(|i| i as f64).collect();
    let coefficient = CoefficientVector::from_values(2, 3, values).unwrap();
    assert_eq!(coefficient.get(0, 0), 0.0);
    assert_eq!(coefficient.get(1, 0), 1.0);
    assert_eq!(coefficient.get(0, 2), 4.0);
    assert_eq!(coefficient.get(1, 2), 5.0);
}

#[test]
fn quadrature_values_of_wrong_length_are_rejected() {
    assert!(CoefficientVector::from_values(2, 3, vec![1.0; 5]).is_err());

    let geometry = identity_geometry(4, 2);
    let coefficient = Coefficient::QuadratureValues(vec![1.0; 7]);
    assert!(sample_serial(&coefficient, &geometry, CoefficientStorage::Compressed).is_err());
}

#[test]
fn functions_are_evaluated_at_quadrature_point_coordinates() {
    let space = uniform_rectangle(2, [0.0, 0.0], [2.0, 1.0], [2, 1]);
    let rule = TensorRule::gauss(2, 3);
    let maps = DofToQuad::tensor(&space.basis(), &rule);
    let flags = GeometricFactorFlags::JACOBIANS | GeometricFactorFlags::COORDINATES;
    let geometry = GeometricFactors::from_nodes(2, 2, &maps, space.nodes(), flags, &ExecutionConfig::serial());

    let coefficient = Coefficient::function(|x: &[f64]| x[0] + 10.0 * x[1]);
    let sampled = sample_serial(&coefficient, &geometry, CoefficientStorage::Compressed).unwrap();
    assert_eq!(sampled.len(), 18);

    let coordinates = geometry.coordinates().unwrap();
    for e in 0..2 {
        for q in 0..9 {
            let x = coordinates[q + 9 * (2 * e)];
            let y = coordinates[q + 9 * (1 + 2 * e)];
            assert_eq!(sampled.get(q, e), x + 10.0 * y);
        }
    }
}

#[test]
fn functions_require_coordinates() {
    let geometry = identity_geometry(4, 1);
    let coefficient = Coefficient::function(|_: &[f64]| 1.0);
    assert!(sample_serial(&coefficient, &geometry, CoefficientStorage::Compressed).is_err());
}

#[test]
fn vector_and_matrix_coefficients_are_rejected() {
    let geometry = identity_geometry(4, 1);
    let vector = Coefficient::Vector(Arc::new(|_: &[f64]| DVector::from_element(2, 1.0)));
    let matrix = Coefficient::Matrix(Arc::new(|_: &[f64]| DMatrix::identity(2, 2)));
    assert!(!vector.is_scalar());
    assert!(!matrix.is_scalar());
    assert_eq!(vector.kind(), "vector");
    assert_eq!(matrix.kind(), "matrix");

    let error = sample_serial(&vector, &geometry, CoefficientStorage::Compressed).unwrap_err();
    assert!(error.to_string().contains("vector"));
    assert!(sample_serial(&matrix, &geometry, CoefficientStorage::Full).is_err());
}

#[test]
fn debug_output_elides_closures() {
    let coefficient = Coefficient::function(|x: &[f64]| x[0]);
    assert_eq!(format!("{:?}", coefficient), "Function(..)");
    assert_eq!(format!("{:?}", Coefficient::Constant(1.5)), "Constant(1.5)");
    assert_eq!(
        format!("{:?}", Coefficient::QuadratureValues(vec![0.0; 3])),
        "QuadratureValues(len = 3)"
    );
}

#[test]
fn function_sampling_is_independent_of_execution_policy() {
    let mut space = uniform_rectangle(3, [0.0, 0.0], [1.0, 1.0], [5, 4]);
    space.transform_nodes(|x| x[1] += 0.1 * x[0] * x[0]);
    let rule = TensorRule::gauss(2, 4);
    let maps = DofToQuad::tensor(&space.basis(), &rule);
    let flags = GeometricFactorFlags::JACOBIANS | GeometricFactorFlags::COORDINATES;
    let geometry = GeometricFactors::from_nodes(2, 2, &maps, space.nodes(), flags, &ExecutionConfig::serial());
    let coefficient = Coefficient::function(|x: &[f64]| 1.0 + x[0] * x[1]);

    let sample = |execution: ExecutionConfig| {
        CoefficientVector::sample(&coefficient, &geometry, CoefficientStorage::Compressed, &execution).unwrap()
    };
    let serial = sample(ExecutionConfig::serial());
    let parallel = sample(ExecutionConfig::parallel().with_min_elements_per_task(1));
    assert_eq!(serial.len(), 16 * 20);
    assert_eq!(serial, parallel);
}

#[test]
fn function_sampling_handles_empty_meshes() {
    let geometry = GeometricFactors::from_nodes(
        2,
        2,
        &DofToQuad::from_tables(2, 2, vec![0.5; 4], vec![0.5; 4]),
        &[],
        GeometricFactorFlags::COORDINATES,
        &ExecutionConfig::serial(),
    );
    let coefficient = Coefficient::function(|_: &[f64]| 1.0);
    let sampled =
        CoefficientVector::sample(&coefficient, &geometry, CoefficientStorage::Compressed, &ExecutionConfig::default())
            .unwrap();
    assert_eq!(sampled.len(), 0);
}
