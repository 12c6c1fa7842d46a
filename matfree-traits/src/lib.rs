use nalgebra::RealField;

pub use nalgebra;

/// Scalar type used by all `matfree` kernels.
///
/// Since kernels index heavily into flat buffers, values are required to be `Copy`.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
