//! Execution configuration for the partial assembly kernels.
use serde::{Deserialize, Serialize};

/// Default maximum number of dofs per axis accepted by the kernels.
pub const MAX_D1D: usize = 14;
/// Default maximum number of quadrature points per axis accepted by the kernels.
pub const MAX_Q1D: usize = 14;

/// Hard per-axis size limits of an execution backend.
///
/// These are properties of the backend, not of a particular operator. Exceeding them is a
/// precondition violation and the kernels panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelLimits {
    pub max_d1d: usize,
    pub max_q1d: usize,
}

impl Default for KernelLimits {
    fn default() -> Self {
        Self {
            max_d1d: MAX_D1D,
            max_q1d: MAX_Q1D,
        }
    }
}

impl KernelLimits {
    pub fn admits(&self, d1d: usize, q1d: usize) -> bool {
        d1d <= self.max_d1d && q1d <= self.max_q1d
    }

    /// Checks the given sizes against the limits.
    ///
    /// # Panics
    ///
    /// Panics if either size exceeds its limit.
    pub fn check(&self, d1d: usize, q1d: usize) {
        assert!(
            d1d <= self.max_d1d,
            "D1D = {} exceeds the maximum of {} supported by the backend",
            d1d,
            self.max_d1d
        );
        assert!(
            q1d <= self.max_q1d,
            "Q1D = {} exceeds the maximum of {} supported by the backend",
            q1d,
            self.max_q1d
        );
    }
}

/// How the per-element loop is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPolicy {
    /// Elements are processed in order on the calling thread.
    Serial,
    /// Elements are distributed over the `rayon` thread pool.
    #[default]
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub policy: ExecutionPolicy,
    pub limits: KernelLimits,
    /// Lower bound on the number of elements handed to a single `rayon` task.
    pub min_elements_per_task: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            policy: ExecutionPolicy::default(),
            limits: KernelLimits::default(),
            min_elements_per_task: 16,
        }
    }
}

impl ExecutionConfig {
    pub fn serial() -> Self {
        Self {
            policy: ExecutionPolicy::Serial,
            ..Self::default()
        }
    }

    pub fn parallel() -> Self {
        Self {
            policy: ExecutionPolicy::Parallel,
            ..Self::default()
        }
    }

    pub fn with_limits(self, limits: KernelLimits) -> Self {
        Self { limits, ..self }
    }

    pub fn with_min_elements_per_task(self, min_elements_per_task: usize) -> Self {
        Self {
            min_elements_per_task,
            ..self
        }
    }
}
