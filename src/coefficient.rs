//! Coefficients and their samples at quadrature points.
use crate::config::ExecutionConfig;
use crate::forall::forall_elements;
use crate::geometry::GeometricFactors;
use crate::reshape::view;
use crate::Real;
use eyre::{bail, ensure, eyre};
use nalgebra::{DMatrix, DVector};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A function of the physical coordinates of a point.
pub type PointFunction<T, R> = Arc<dyn Fn(&[T]) -> R + Send + Sync>;

/// A coefficient as handed to an integrator.
///
/// Only scalar coefficients are meaningful for vector diffusion. The vector and matrix kinds
/// exist so that callers can pass them and receive a configuration error instead of a silently
/// wrong operator.
#[derive(Clone)]
pub enum Coefficient<T> {
    Constant(T),
    /// A scalar field evaluated at the physical coordinates of each quadrature point.
    Function(PointFunction<T, T>),
    /// Values sampled by the caller with layout `(NQ, NE)`.
    QuadratureValues(Vec<T>),
    Vector(PointFunction<T, DVector<T>>),
    Matrix(PointFunction<T, DMatrix<T>>),
}

impl<T: Debug> Debug for Coefficient<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Function(_) => write!(f, "Function(..)"),
            Self::QuadratureValues(values) => write!(f, "QuadratureValues(len = {})", values.len()),
            Self::Vector(_) => write!(f, "Vector(..)"),
            Self::Matrix(_) => write!(f, "Matrix(..)"),
        }
    }
}

impl<T> Coefficient<T> {
    pub fn function(f: impl Fn(&[T]) -> T + Send + Sync + 'static) -> Self {
        Self::Function(Arc::new(f))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Constant(_) | Self::Function(_) | Self::QuadratureValues(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Constant(_) => "constant",
            Self::Function(_) => "function",
            Self::QuadratureValues(_) => "quadrature values",
            Self::Vector(_) => "vector",
            Self::Matrix(_) => "matrix",
        }
    }
}

/// How constant coefficients are stored after sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoefficientStorage {
    /// Always store one value per quadrature point.
    Full,
    /// Store constant coefficients as a single value.
    #[default]
    Compressed,
}

/// Scalar coefficient samples, either a single value or one value per quadrature point.
///
/// The single-value case is a storage optimization and not a separate type: consumers branch
/// on `len() == 1`, which is what [`CoefficientVector::get`] does.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientVector<T> {
    nq: usize,
    ne: usize,
    values: Vec<T>,
}

impl<T: Real> CoefficientVector<T> {
    /// A compressed constant.
    pub fn constant(nq: usize, ne: usize, value: T) -> Self {
        Self {
            nq,
            ne,
            values: vec![value],
        }
    }

    /// Adopts values with layout `(NQ, NE)`.
    pub fn from_values(nq: usize, ne: usize, values: Vec<T>) -> eyre::Result<Self> {
        ensure!(
            values.len() == nq * ne,
            "coefficient has {} values, but NQ * NE = {} * {} are required",
            values.len(),
            nq,
            ne
        );
        Ok(Self { nq, ne, values })
    }

    /// Samples `coefficient` at the quadrature points described by `geometry`.
    ///
    /// Function coefficients are evaluated element by element under the `execution` policy.
    ///
    /// # Errors
    ///
    /// Returns an error for vector and matrix coefficients, for pre-sampled values of the wrong
    /// length, and for function coefficients when `geometry` carries no coordinates.
    pub fn sample(
        coefficient: &Coefficient<T>,
        geometry: &GeometricFactors<T>,
        storage: CoefficientStorage,
        execution: &ExecutionConfig,
    ) -> eyre::Result<Self> {
        let nq = geometry.num_quadrature_points();
        let ne = geometry.num_elements();
        match coefficient {
            Coefficient::Constant(value) => Ok(match storage {
                CoefficientStorage::Compressed => Self::constant(nq, ne, *value),
                CoefficientStorage::Full => Self {
                    nq,
                    ne,
                    values: vec![*value; nq * ne],
                },
            }),
            Coefficient::QuadratureValues(values) => Self::from_values(nq, ne, values.clone()),
            Coefficient::Function(f) => {
                let sdim = geometry.sdim();
                let coordinates = geometry
                    .coordinates()
                    .ok_or_else(|| eyre!("function coefficients require quadrature point coordinates"))?;
                let coordinates = view(coordinates, [nq, sdim, ne]);
                let mut values = vec![T::zero(); nq * ne];
                if nq > 0 && ne > 0 {
                    forall_elements(
                        execution,
                        &mut values,
                        nq,
                        || vec![T::zero(); sdim],
                        |x, e, values_e| {
                            for (q, value) in values_e.iter_mut().enumerate() {
                                for (i, x_i) in x.iter_mut().enumerate() {
                                    *x_i = coordinates[[q, i, e]];
                                }
                                *value = f(&x[..]);
                            }
                        },
                    );
                }
                Ok(Self { nq, ne, values })
            }
            Coefficient::Vector(_) | Coefficient::Matrix(_) => bail!(
                "{} coefficients are not supported by the vector diffusion integrator",
                coefficient.kind()
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_constant(&self) -> bool {
        self.values.len() == 1
    }

    pub fn num_quadrature_points(&self) -> usize {
        self.nq
    }

    pub fn num_elements(&self) -> usize {
        self.ne
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// The coefficient at quadrature point `q` of element `e`.
    #[inline(always)]
    pub fn get(&self, q: usize, e: usize) -> T {
        if self.values.len() == 1 {
            self.values[0]
        } else {
            self.values[q + self.nq * e]
        }
    }
}
