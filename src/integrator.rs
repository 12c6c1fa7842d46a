//! The vector diffusion bilinear form in partial assembly form.
use crate::backend::{BackendContext, BackendProvider, NativeBackend, PartialAssemblyBackend};
use crate::coefficient::Coefficient;
use crate::config::ExecutionConfig;
use crate::quadrature::TensorRule;
use crate::space::TensorElementSpace;
use crate::Real;
use eyre::eyre;
use log::{debug, warn};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Partial assembly of `a(u, v) = sum_c (Q grad u_c, grad v_c)` for a vector field `u` with
/// one component per space dimension and a scalar coefficient `Q`.
///
/// [`assemble_pa`](Self::assemble_pa) samples the geometry and the coefficient and stores the
/// resulting operator data. It must be called again whenever the nodes, the coefficient or the
/// quadrature rule change. Applications of the operator and diagonal assembly reuse the stored
/// data.
///
/// Vectors are element-local with layout `(D1D^dim, VDIM, NE)`. Both
/// [`add_mult_pa`](Self::add_mult_pa) and [`assemble_diagonal_pa`](Self::assemble_diagonal_pa)
/// accumulate into their output.
pub struct VectorDiffusionIntegrator<T> {
    coefficient: Coefficient<T>,
    rule: Option<TensorRule<T>>,
    provider: Option<Arc<dyn BackendProvider<T>>>,
    execution: ExecutionConfig,
    backend: Option<Box<dyn PartialAssemblyBackend<T>>>,
}

impl<T: Debug> Debug for VectorDiffusionIntegrator<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorDiffusionIntegrator")
            .field("coefficient", &self.coefficient)
            .field("rule", &self.rule)
            .field("has_provider", &self.provider.is_some())
            .field("execution", &self.execution)
            .field("backend", &self.backend.as_ref().map(|backend| backend.name()))
            .finish()
    }
}

impl<T: Real> VectorDiffusionIntegrator<T> {
    pub fn new(coefficient: Coefficient<T>) -> Self {
        Self {
            coefficient,
            rule: None,
            provider: None,
            execution: ExecutionConfig::default(),
            backend: None,
        }
    }

    /// Uses `rule` instead of the default rule for the order of the space.
    pub fn with_integration_rule(self, rule: TensorRule<T>) -> Self {
        Self {
            rule: Some(rule),
            ..self
        }
    }

    /// Consults `provider` during assembly and delegates to its backend if it accepts.
    pub fn with_backend_provider(self, provider: Arc<dyn BackendProvider<T>>) -> Self {
        Self {
            provider: Some(provider),
            ..self
        }
    }

    pub fn with_execution(self, execution: ExecutionConfig) -> Self {
        Self { execution, ..self }
    }

    pub fn coefficient(&self) -> &Coefficient<T> {
        &self.coefficient
    }

    pub fn execution(&self) -> &ExecutionConfig {
        &self.execution
    }

    /// The quadrature rule used for `space`.
    pub fn integration_rule(&self, space: &TensorElementSpace<T>) -> TensorRule<T> {
        match &self.rule {
            Some(rule) => rule.clone(),
            None => TensorRule::for_diffusion(space.dim(), space.order()),
        }
    }

    /// Assembles the operator for `space`, replacing any previous assembly.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported dimensions, non-scalar coefficients, mismatched
    /// quadrature rules and sizes beyond the configured kernel limits. On error the integrator is
    /// left unassembled.
    pub fn assemble_pa(&mut self, space: &TensorElementSpace<T>) -> eyre::Result<()> {
        self.backend = None;
        let rule = self.integration_rule(space);
        if self.rule.is_some() && space.dim() > 1 {
            let default_points = TensorRule::<T>::diffusion_points_1d(space.dim(), space.order());
            if rule.num_points_1d() < default_points {
                warn!(
                    "custom rule with {} points per axis under-integrates order {} elements (default: {})",
                    rule.num_points_1d(),
                    space.order(),
                    default_points
                );
            }
        }

        let context = BackendContext {
            space,
            rule: &rule,
            coefficient: &self.coefficient,
            execution: &self.execution,
        };
        let backend: Box<dyn PartialAssemblyBackend<T>> = match &self.provider {
            Some(provider) if provider.can_use(&context) => provider.create(&context)?,
            _ => Box::new(NativeBackend::assemble(&context)?),
        };
        debug!(
            "vector diffusion assembled with the {} backend for {} elements",
            backend.name(),
            space.num_elements()
        );
        self.backend = Some(backend);
        Ok(())
    }

    pub fn is_assembled(&self) -> bool {
        self.backend.is_some()
    }

    /// Name of the backend chosen by the last assembly.
    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_ref().map(|backend| backend.name())
    }

    fn assembled_backend(&self) -> eyre::Result<&dyn PartialAssemblyBackend<T>> {
        self.backend
            .as_deref()
            .ok_or_else(|| eyre!("vector diffusion integrator used before assemble_pa"))
    }

    /// Adds the action of the operator on `x` to `y`.
    pub fn add_mult_pa(&self, x: &[T], y: &mut [T]) -> eyre::Result<()> {
        self.assembled_backend()?.add_mult(x, y)
    }

    /// Adds the diagonal of the operator to `diag`.
    pub fn assemble_diagonal_pa(&self, diag: &mut [T]) -> eyre::Result<()> {
        self.assembled_backend()?.assemble_diagonal(diag)
    }

    /// The operator data `D` with layout `(NQ, symm_dims, NE)` if the native backend is in use.
    pub fn pa_data(&self) -> Option<&[T]> {
        self.backend.as_ref()?.operator_data()
    }
}
