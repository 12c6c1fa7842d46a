//! Column-major `ndarray` views over flat buffers.
//!
//! Every buffer in this crate stores a multi-dimensional array with the *first* index varying
//! fastest. These helpers view such a slice through `ndarray` with Fortran strides, so kernels
//! can index with `a[[i, j, k]]` in the natural order of the layout.
use ndarray::{ArrayView, ArrayViewMut, Dimension, ShapeBuilder};

/// Views `data` as a column-major array of the given shape.
///
/// # Panics
///
/// Panics if the length of `data` is not the product of the extents.
pub fn view<T, Sh>(data: &[T], shape: Sh) -> ArrayView<'_, T, Sh::Dim>
where
    Sh: ShapeBuilder,
    Sh::Dim: Dimension,
{
    let shape = shape.f();
    let len = data.len();
    ArrayView::from_shape(shape, data)
        .unwrap_or_else(|err| panic!("buffer of length {} cannot be viewed with the requested shape: {}", len, err))
}

/// Views `data` as a mutable column-major array of the given shape.
///
/// # Panics
///
/// Panics if the length of `data` is not the product of the extents.
pub fn view_mut<T, Sh>(data: &mut [T], shape: Sh) -> ArrayViewMut<'_, T, Sh::Dim>
where
    Sh: ShapeBuilder,
    Sh::Dim: Dimension,
{
    let shape = shape.f();
    let len = data.len();
    ArrayViewMut::from_shape(shape, data)
        .unwrap_or_else(|err| panic!("buffer of length {} cannot be viewed with the requested shape: {}", len, err))
}
