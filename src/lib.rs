//! Matrix-free finite element operators on tensor-product elements.
//!
//! The central object is the vector diffusion operator evaluated with *partial assembly*:
//! instead of assembling a sparse matrix, we precompute a small symmetric matrix per quadrature
//! point (see [`kernels::setup`]) and evaluate the action of the operator with sum factorization
//! (see [`kernels::apply`]). The diagonal can also be extracted without forming the matrix
//! (see [`kernels::diagonal`]), which is what Jacobi-type preconditioners need.
//!
//! Array layouts follow a single convention throughout the crate: multi-dimensional arrays are
//! stored in flat buffers with the *first* index varying fastest. The layouts are
//!
//! | Quantity             | Shape                      |
//! |----------------------|----------------------------|
//! | Jacobians `J`        | `(NQ, SDIM, DIM, NE)`      |
//! | Coefficient `C`      | `(1)` or `(NQ, NE)`        |
//! | Operator data `D`    | `(NQ, DIM (DIM + 1) / 2, NE)` |
//! | Basis `B`, `G`       | `(Q1D, D1D)`               |
//! | Nodal vectors `x, y` | `(D1D^DIM, VDIM, NE)`      |

pub mod backend;
pub mod basis;
pub mod coefficient;
pub mod config;
pub mod dispatch;
pub mod forall;
pub mod geometry;
pub mod integrator;
pub mod kernels;
#[cfg(feature = "proptest-support")]
pub mod proptest;
pub mod quadrature;
pub mod reshape;
pub mod space;

pub extern crate nalgebra;

pub use matfree_traits::Real;
