//! Partial assembly kernels of the vector diffusion operator.
//!
//! All kernels are maps over elements. They read the shared tables and operator data and
//! accumulate into (apply, diagonal) or overwrite (setup) their own element's output chunk.
//! Sizes are validated once before the element loop; violations panic.
//!
//! The apply and diagonal kernels are generic over `const` sizes. A const parameter of zero
//! means that the corresponding size is only known at runtime, which gives the generic
//! fallback used for every size without a fixed-size instantiation.
pub mod apply;
pub mod diagonal;
pub mod setup;

pub use apply::{apply_2d, apply_3d};
pub use diagonal::{diagonal_2d, diagonal_3d};
pub use setup::{setup, setup_2d, setup_2d_manifold, setup_3d};

/// Number of independent entries of a symmetric `dim x dim` matrix.
pub const fn symm_dims(dim: usize) -> usize {
    (dim * (dim + 1)) / 2
}

/// Picks the compile-time size if there is one, otherwise the runtime size.
#[inline(always)]
fn fixed_or_runtime(fixed: usize, runtime: usize) -> usize {
    if fixed > 0 {
        fixed
    } else {
        runtime
    }
}

fn check_fixed_size(name: &str, fixed: usize, runtime: usize) {
    assert!(
        fixed == 0 || fixed == runtime,
        "kernel instantiated for {} = {} called with {} = {}",
        name,
        fixed,
        name,
        runtime
    );
}

fn check_len(name: &str, len: usize, expected: usize) {
    assert_eq!(len, expected, "{} has length {}, expected {}", name, len, expected);
}
