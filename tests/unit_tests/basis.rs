use matfree::basis::{DofToQuad, LagrangeBasis1d};
use matfree::quadrature::TensorRule;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::DMatrix;
use proptest::prelude::*;
use util::assert_panics;

#[test]
fn gauss_lobatto_basis_includes_endpoints() {
    for order in 1..=8 {
        let basis = LagrangeBasis1d::<f64>::gauss_lobatto(order);
        assert_eq!(basis.order(), order);
        assert_eq!(basis.num_nodes(), order + 1);
        let nodes = basis.nodes();
        assert_scalar_eq!(nodes[0], -1.0, comp = abs, tol = 1e-14);
        assert_scalar_eq!(nodes[order], 1.0, comp = abs, tol = 1e-14);
        assert!(nodes.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn basis_is_nodal() {
    let basis = LagrangeBasis1d::<f64>::gauss_lobatto(5);
    let n = basis.num_nodes();
    let mut values = vec![0.0; n];
    let mut derivatives = vec![0.0; n];
    for (i, &x) in basis.nodes().iter().enumerate() {
        basis.evaluate(x, &mut values, &mut derivatives);
        for (j, &v) in values.iter().enumerate() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_scalar_eq!(v, expected, comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn linear_basis_on_arbitrary_nodes() {
    let basis = LagrangeBasis1d::from_nodes(vec![0.0, 2.0]);
    let mut values = [0.0; 2];
    let mut derivatives = [0.0; 2];
    basis.evaluate(0.5, &mut values, &mut derivatives);
    assert_scalar_eq!(values[0], 0.75, comp = abs, tol = 1e-15);
    assert_scalar_eq!(values[1], 0.25, comp = abs, tol = 1e-15);
    assert_scalar_eq!(derivatives[0], -0.5, comp = abs, tol = 1e-15);
    assert_scalar_eq!(derivatives[1], 0.5, comp = abs, tol = 1e-15);
}

#[test]
fn coinciding_nodes_are_rejected() {
    assert_panics!(LagrangeBasis1d::from_nodes(vec![0.0, 1.0, 0.0]));
    assert_panics!(LagrangeBasis1d::<f64>::from_nodes(vec![]));
}

#[test]
fn tables_have_tensor_layout() {
    let basis = LagrangeBasis1d::<f64>::gauss_lobatto(2);
    let rule = TensorRule::gauss(2, 4);
    let maps = DofToQuad::tensor(&basis, &rule);
    assert_eq!(maps.ndof(), 3);
    assert_eq!(maps.nqpt(), 4);

    let mut values = vec![0.0; 3];
    let mut derivatives = vec![0.0; 3];
    for (q, &x) in rule.points_1d().iter().enumerate() {
        basis.evaluate(x, &mut values, &mut derivatives);
        for d in 0..3 {
            assert_eq!(maps.b()[q + 4 * d], values[d]);
            assert_eq!(maps.g()[q + 4 * d], derivatives[d]);
            assert_eq!(maps.bt()[d + 3 * q], values[d]);
            assert_eq!(maps.gt()[d + 3 * q], derivatives[d]);
        }
    }

    let b = DMatrix::from_column_slice(4, 3, maps.b());
    let bt = DMatrix::from_column_slice(3, 4, maps.bt());
    assert_matrix_eq!(b.transpose(), bt);
}

#[test]
fn from_tables_rejects_wrong_shapes() {
    assert_panics!(DofToQuad::from_tables(2, 3, vec![0.0; 6], vec![0.0; 5]));
}

proptest! {
    #[test]
    fn tables_form_partition_of_unity(order in 1usize..=8, q1d in 1usize..=10) {
        let maps = DofToQuad::tensor(&LagrangeBasis1d::<f64>::gauss_lobatto(order), &TensorRule::gauss(2, q1d));
        for q in 0..q1d {
            let sum_b: f64 = (0..=order).map(|d| maps.b()[q + q1d * d]).sum();
            let sum_g: f64 = (0..=order).map(|d| maps.g()[q + q1d * d]).sum();
            prop_assert!((sum_b - 1.0).abs() < 1e-12);
            prop_assert!(sum_g.abs() < 1e-10);
        }
    }

    #[test]
    fn derivatives_of_interpolated_monomials_are_exact(order in 1usize..=7, x in -1.0..1.0) {
        // x^p is in the span of the basis of order p
        let basis = LagrangeBasis1d::<f64>::gauss_lobatto(order);
        let n = basis.num_nodes();
        let (mut values, mut derivatives) = (vec![0.0; n], vec![0.0; n]);
        basis.evaluate(x, &mut values, &mut derivatives);
        let p = order as i32;
        let u: f64 = basis.nodes().iter().zip(&values).map(|(xi, v)| xi.powi(p) * v).sum();
        let du: f64 = basis.nodes().iter().zip(&derivatives).map(|(xi, d)| xi.powi(p) * d).sum();
        prop_assert!((u - x.powi(p)).abs() < 1e-11);
        prop_assert!((du - (p as f64) * x.powi(p - 1)).abs() < 1e-9);
    }
}
