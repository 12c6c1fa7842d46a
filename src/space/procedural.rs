//! Procedural generation of simple tensor element spaces.
use crate::basis::LagrangeBasis1d;
use crate::space::TensorElementSpace;
use crate::Real;
use itertools::iproduct;
use numeric_literals::replace_float_literals;

fn usize_to_real<T: Real>(i: usize) -> T {
    T::from_usize(i).expect("Must be able to fit usize in T")
}

/// Maps reference nodes in `[-1, 1]` onto the cell `[a + i h, a + (i + 1) h]`.
#[replace_float_literals(T::from_f64(literal).unwrap())]
fn cell_nodes<T: Real>(reference_nodes: &[T], a: T, h: T, i: usize) -> Vec<T> {
    let x0 = a + usize_to_real::<T>(i) * h;
    reference_nodes
        .iter()
        .map(|&xi| x0 + 0.5 * (xi + 1.0) * h)
        .collect()
}

/// A uniform grid of `cells[0] x cells[1]` quadrilaterals of the given order on the rectangle
/// `[min[0], max[0]] x [min[1], max[1]]`.
///
/// Elements are ordered with the x index fastest.
pub fn uniform_rectangle<T: Real>(order: usize, min: [T; 2], max: [T; 2], cells: [usize; 2]) -> TensorElementSpace<T> {
    let basis = LagrangeBasis1d::<T>::gauss_lobatto(order);
    let xi = basis.nodes();
    let d1d = xi.len();
    let h = [0, 1].map(|k| (max[k] - min[k]) / usize_to_real(cells[k].max(1)));

    let mut nodes = Vec::with_capacity(d1d * d1d * 2 * cells[0] * cells[1]);
    for j in 0..cells[1] {
        for i in 0..cells[0] {
            let x = cell_nodes(xi, min[0], h[0], i);
            let y = cell_nodes(xi, min[1], h[1], j);
            for _ in 0..d1d {
                for dx in 0..d1d {
                    nodes.push(x[dx]);
                }
            }
            for dy in 0..d1d {
                for _ in 0..d1d {
                    nodes.push(y[dy]);
                }
            }
        }
    }
    TensorElementSpace::new(2, 2, order, nodes).expect("Procedural rectangle must be a valid space")
}

/// A uniform grid of hexahedra of the given order on the box `[min, max]`.
///
/// Elements are ordered with the x index fastest, then y, then z.
pub fn uniform_box<T: Real>(order: usize, min: [T; 3], max: [T; 3], cells: [usize; 3]) -> TensorElementSpace<T> {
    let basis = LagrangeBasis1d::<T>::gauss_lobatto(order);
    let xi = basis.nodes();
    let d1d = xi.len();
    let h = [0, 1, 2].map(|k| (max[k] - min[k]) / usize_to_real(cells[k].max(1)));

    let mut nodes = Vec::with_capacity(d1d * d1d * d1d * 3 * cells.iter().product::<usize>());
    for (k, j, i) in iproduct!(0..cells[2], 0..cells[1], 0..cells[0]) {
        let axes = [
            cell_nodes(xi, min[0], h[0], i),
            cell_nodes(xi, min[1], h[1], j),
            cell_nodes(xi, min[2], h[2], k),
        ];
        for (s, axis) in axes.iter().enumerate() {
            for (dz, dy, dx) in iproduct!(0..d1d, 0..d1d, 0..d1d) {
                nodes.push(axis[[dx, dy, dz][s]]);
            }
        }
    }
    TensorElementSpace::new(3, 3, order, nodes).expect("Procedural box must be a valid space")
}

/// A patch of the cylinder of the given radius around the z axis, as quadrilaterals embedded
/// in 3D.
///
/// The patch covers the angles `[0, angle]` and the heights `[0, height]`. Nodes lie exactly
/// on the cylinder, so the elements are curved for any order above one.
pub fn cylinder_patch<T: Real>(
    order: usize,
    radius: T,
    angle: T,
    height: T,
    cells: [usize; 2],
) -> TensorElementSpace<T> {
    let basis = LagrangeBasis1d::<T>::gauss_lobatto(order);
    let xi = basis.nodes();
    let d1d = xi.len();
    let h_theta = angle / usize_to_real(cells[0].max(1));
    let h_z = height / usize_to_real(cells[1].max(1));

    let mut nodes = Vec::with_capacity(d1d * d1d * 3 * cells[0] * cells[1]);
    for j in 0..cells[1] {
        for i in 0..cells[0] {
            let theta = cell_nodes(xi, T::zero(), h_theta, i);
            let z = cell_nodes(xi, T::zero(), h_z, j);
            for _ in 0..d1d {
                for dx in 0..d1d {
                    nodes.push(radius * theta[dx].cos());
                }
            }
            for _ in 0..d1d {
                for dx in 0..d1d {
                    nodes.push(radius * theta[dx].sin());
                }
            }
            for dy in 0..d1d {
                for _ in 0..d1d {
                    nodes.push(z[dy]);
                }
            }
        }
    }
    TensorElementSpace::new(2, 3, order, nodes).expect("Procedural cylinder patch must be a valid space")
}
