//! Interchangeable strategies that carry out setup, apply and diagonal assembly.
//!
//! An integrator selects one backend per assembly and keeps it until the next assembly. The
//! native backend runs the sum-factorized kernels of this crate. Other backends are created
//! by a [`BackendProvider`] when its capability query accepts the problem.
use crate::basis::DofToQuad;
use crate::coefficient::{Coefficient, CoefficientStorage, CoefficientVector};
use crate::config::ExecutionConfig;
use crate::dispatch::{self, KernelShape};
use crate::forall::forall_elements;
use crate::geometry::{GeometricFactorFlags, GeometricFactors};
use crate::kernels;
use crate::quadrature::TensorRule;
use crate::reshape::view;
use crate::space::TensorElementSpace;
use crate::Real;
use eyre::{ensure, eyre};
use log::debug;
use nalgebra::{DMatrix, DMatrixView, DMatrixViewMut};

/// Everything a backend needs to assemble the vector diffusion operator.
#[derive(Debug, Clone, Copy)]
pub struct BackendContext<'a, T> {
    pub space: &'a TensorElementSpace<T>,
    pub rule: &'a TensorRule<T>,
    pub coefficient: &'a Coefficient<T>,
    pub execution: &'a ExecutionConfig,
}

/// An assembled vector diffusion operator in some execution strategy.
pub trait PartialAssemblyBackend<T>: Send + Sync {
    fn name(&self) -> &str;

    /// Adds the action of the operator on the element-local vector `x` to `y`.
    fn add_mult(&self, x: &[T], y: &mut [T]) -> eyre::Result<()>;

    /// Adds the operator diagonal to `diag`.
    fn assemble_diagonal(&self, diag: &mut [T]) -> eyre::Result<()>;

    /// The per-quadrature-point operator data, if the backend exposes it.
    fn operator_data(&self) -> Option<&[T]> {
        None
    }
}

/// Decides whether an alternate backend handles a problem, and creates it.
pub trait BackendProvider<T>: Send + Sync {
    fn can_use(&self, context: &BackendContext<T>) -> bool;

    fn create(&self, context: &BackendContext<T>) -> eyre::Result<Box<dyn PartialAssemblyBackend<T>>>;
}

/// Tables, geometry and coefficient samples at the quadrature points of a space.
struct QuadratureData<T> {
    shape: KernelShape,
    ne: usize,
    maps: DofToQuad<T>,
    geometry: GeometricFactors<T>,
    coefficient: CoefficientVector<T>,
}

impl<T: Real> QuadratureData<T> {
    fn compute(context: &BackendContext<T>) -> eyre::Result<Self> {
        let space = context.space;
        let rule = context.rule;
        // Reject configurations without kernels before doing any work
        let shape = KernelShape::new(
            space.dim(),
            space.sdim(),
            space.nodes_per_axis(),
            rule.num_points_1d(),
        )?;
        let limits = &context.execution.limits;
        ensure!(
            limits.admits(shape.d1d(), shape.q1d()),
            "D1D = {} and Q1D = {} exceed the kernel limits (D1D <= {}, Q1D <= {})",
            shape.d1d(),
            shape.q1d(),
            limits.max_d1d,
            limits.max_q1d
        );
        ensure!(
            context.coefficient.is_scalar(),
            "only scalar coefficients are supported by the vector diffusion operator, got a {} coefficient",
            context.coefficient.kind()
        );
        ensure!(
            rule.dim() == space.dim(),
            "quadrature rule of dimension {} does not match elements of dimension {}",
            rule.dim(),
            space.dim()
        );

        let maps = DofToQuad::tensor(&space.basis(), rule);
        let flags = match context.coefficient {
            Coefficient::Function(_) => GeometricFactorFlags::JACOBIANS | GeometricFactorFlags::COORDINATES,
            _ => GeometricFactorFlags::JACOBIANS,
        };
        let geometry = GeometricFactors::from_nodes(
            space.dim(),
            space.sdim(),
            &maps,
            space.nodes(),
            flags,
            context.execution,
        );
        let coefficient = CoefficientVector::sample(
            context.coefficient,
            &geometry,
            CoefficientStorage::Compressed,
            context.execution,
        )?;
        Ok(Self {
            shape,
            ne: space.num_elements(),
            maps,
            geometry,
            coefficient,
        })
    }

    fn jacobians(&self) -> eyre::Result<&[T]> {
        self.geometry
            .jacobians()
            .ok_or_else(|| eyre!("geometric factors were computed without Jacobians"))
    }
}

fn check_vector_len(name: &str, len: usize, expected: usize) -> eyre::Result<()> {
    ensure!(
        len == expected,
        "{} has length {}, but the operator was assembled for element vectors of length {}",
        name,
        len,
        expected
    );
    Ok(())
}

/// The sum-factorized partial assembly kernels of this crate.
#[derive(Debug, Clone)]
pub struct NativeBackend<T> {
    shape: KernelShape,
    ne: usize,
    maps: DofToQuad<T>,
    op: Vec<T>,
    execution: ExecutionConfig,
}

impl<T: Real> NativeBackend<T> {
    /// Runs the setup kernel for the given context.
    pub fn assemble(context: &BackendContext<T>) -> eyre::Result<Self> {
        let data = QuadratureData::compute(context)?;
        let shape = data.shape;
        debug!(
            "vector diffusion setup: dim = {}, sdim = {}, D1D = {}, Q1D = {}, NE = {}, constant coefficient: {}",
            shape.dim(),
            shape.sdim(),
            shape.d1d(),
            shape.q1d(),
            data.ne,
            data.coefficient.is_constant()
        );
        let mut op = vec![T::zero(); shape.op_len(data.ne)];
        kernels::setup(
            context.execution,
            shape.dim(),
            shape.sdim(),
            shape.q1d(),
            data.ne,
            context.rule.weights(),
            data.jacobians()?,
            data.coefficient.as_slice(),
            &mut op,
        );
        Ok(Self {
            shape,
            ne: data.ne,
            maps: data.maps,
            op,
            execution: context.execution.clone(),
        })
    }

    pub fn shape(&self) -> &KernelShape {
        &self.shape
    }

    pub fn maps(&self) -> &DofToQuad<T> {
        &self.maps
    }

    pub fn num_elements(&self) -> usize {
        self.ne
    }
}

impl<T: Real> PartialAssemblyBackend<T> for NativeBackend<T> {
    fn name(&self) -> &str {
        "native"
    }

    fn add_mult(&self, x: &[T], y: &mut [T]) -> eyre::Result<()> {
        let len = self.shape.vector_len(self.ne);
        check_vector_len("x", x.len(), len)?;
        check_vector_len("y", y.len(), len)?;
        dispatch::add_mult(&self.execution, &self.shape, self.ne, &self.maps, &self.op, x, y);
        Ok(())
    }

    fn assemble_diagonal(&self, diag: &mut [T]) -> eyre::Result<()> {
        check_vector_len("diagonal", diag.len(), self.shape.vector_len(self.ne))?;
        dispatch::assemble_diagonal(&self.execution, &self.shape, self.ne, &self.maps, &self.op, diag);
        Ok(())
    }

    fn operator_data(&self) -> Option<&[T]> {
        Some(&self.op)
    }
}

/// Dense element matrices, assembled once from the Jacobians without sum factorization.
///
/// Every element stores the `D1D^dim x D1D^dim` stiffness matrix of the scalar diffusion
/// block, which is applied to each vector component. Memory grows with the square of the
/// number of element nodes, so this is only sensible for low orders.
#[derive(Debug, Clone)]
pub struct DenseElementBackend<T> {
    shape: KernelShape,
    ne: usize,
    // Column-major element matrices with layout (ND, ND, NE)
    element_matrices: Vec<T>,
    execution: ExecutionConfig,
}

/// Reference gradients of all element basis functions at quadrature point `(qx, qy, qz)`, as a
/// `DIM x ND` matrix.
fn reference_gradients<T: Real>(shape: &KernelShape, maps: &DofToQuad<T>, q: [usize; 3]) -> DMatrix<T> {
    let (d1d, q1d) = (shape.d1d(), shape.q1d());
    let b = view(maps.b(), [q1d, d1d]);
    let g = view(maps.g(), [q1d, d1d]);
    let dim = shape.dim();
    DMatrix::from_fn(dim, shape.num_nodes(), |k, i| {
        let idx = [i % d1d, (i / d1d) % d1d, i / (d1d * d1d)];
        (0..dim)
            .map(|axis| {
                if axis == k {
                    g[[q[axis], idx[axis]]]
                } else {
                    b[[q[axis], idx[axis]]]
                }
            })
            .fold(T::one(), |acc, v| acc * v)
    })
}

impl<T: Real> DenseElementBackend<T> {
    pub fn assemble(context: &BackendContext<T>) -> eyre::Result<Self> {
        let data = QuadratureData::compute(context)?;
        let shape = data.shape;
        let (dim, sdim, q1d) = (shape.dim(), shape.sdim(), shape.q1d());
        let nq = shape.num_quadrature_points();
        let nd = shape.num_nodes();
        let ne = data.ne;
        let weights = context.rule.weights();
        let j = view(data.jacobians()?, [nq, sdim, dim, ne]);

        // Physical diffusion matrices w c vol(J) (J^T J)^-1, with vol(J) = det(J) for square J
        let mut operators = Vec::with_capacity(nq * ne);
        for e in 0..ne {
            for q in 0..nq {
                let j_qe = DMatrix::from_fn(sdim, dim, |i, k| j[[q, i, k, e]]);
                let jtj = j_qe.transpose() * &j_qe;
                let vol = if sdim == dim {
                    j_qe.determinant()
                } else {
                    jtj.determinant().sqrt()
                };
                let jtj_inv = jtj
                    .try_inverse()
                    .ok_or_else(|| eyre!("singular Jacobian at quadrature point {} of element {}", q, e))?;
                operators.push(jtj_inv * (weights[q] * data.coefficient.get(q, e) * vol));
            }
        }

        let gradients: Vec<DMatrix<T>> = (0..nq)
            .map(|q| reference_gradients(&shape, &data.maps, [q % q1d, (q / q1d) % q1d, q / (q1d * q1d)]))
            .collect();

        let mut element_matrices = vec![T::zero(); nd * nd * ne];
        forall_elements(
            context.execution,
            &mut element_matrices,
            nd * nd,
            || (),
            |_, e, k_e| {
                let mut k_e = DMatrixViewMut::from_slice(k_e, nd, nd);
                for (q, grad_q) in gradients.iter().enumerate() {
                    let o_grad = &operators[q + nq * e] * grad_q;
                    k_e.gemm_tr(T::one(), grad_q, &o_grad, T::one());
                }
            },
        );

        debug!(
            "assembled {} dense element matrices of size {} x {}",
            ne, nd, nd
        );
        Ok(Self {
            shape,
            ne,
            element_matrices,
            execution: context.execution.clone(),
        })
    }

    /// The stiffness matrix of the scalar block of element `e`.
    pub fn element_matrix(&self, e: usize) -> DMatrixView<'_, T> {
        let nd = self.shape.num_nodes();
        DMatrixView::from_slice(&self.element_matrices[e * nd * nd..(e + 1) * nd * nd], nd, nd)
    }
}

impl<T: Real> PartialAssemblyBackend<T> for DenseElementBackend<T> {
    fn name(&self) -> &str {
        "dense element"
    }

    fn add_mult(&self, x: &[T], y: &mut [T]) -> eyre::Result<()> {
        let len = self.shape.vector_len(self.ne);
        check_vector_len("x", x.len(), len)?;
        check_vector_len("y", y.len(), len)?;
        let nd = self.shape.num_nodes();
        let vdim = self.shape.vdim();
        forall_elements(
            &self.execution,
            y,
            nd * vdim,
            || (),
            |_, e, y_e| {
                let x_e = DMatrixView::from_slice(&x[e * nd * vdim..(e + 1) * nd * vdim], nd, vdim);
                let mut y_e = DMatrixViewMut::from_slice(y_e, nd, vdim);
                y_e.gemm(T::one(), &self.element_matrix(e), &x_e, T::one());
            },
        );
        Ok(())
    }

    fn assemble_diagonal(&self, diag: &mut [T]) -> eyre::Result<()> {
        check_vector_len("diagonal", diag.len(), self.shape.vector_len(self.ne))?;
        let nd = self.shape.num_nodes();
        let vdim = self.shape.vdim();
        forall_elements(
            &self.execution,
            diag,
            nd * vdim,
            || (),
            |_, e, diag_e| {
                let k_e = self.element_matrix(e);
                for c in 0..vdim {
                    for i in 0..nd {
                        diag_e[i + nd * c] += k_e[(i, i)];
                    }
                }
            },
        );
        Ok(())
    }
}

/// Provides [`DenseElementBackend`] for elements with few enough nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenseElementProvider {
    pub max_nodes_per_element: usize,
}

impl Default for DenseElementProvider {
    fn default() -> Self {
        Self {
            max_nodes_per_element: 64,
        }
    }
}

impl<T: Real> BackendProvider<T> for DenseElementProvider {
    fn can_use(&self, context: &BackendContext<T>) -> bool {
        context.space.nodes_per_element() <= self.max_nodes_per_element
    }

    fn create(&self, context: &BackendContext<T>) -> eyre::Result<Box<dyn PartialAssemblyBackend<T>>> {
        Ok(Box::new(DenseElementBackend::assemble(context)?))
    }
}
