//! Pure math: the SVD solver and the polynomial bases.

pub mod basis;
pub mod svd;

pub use basis::Basis;
pub use svd::{mat_mul, mat_vec_mul, svdcmp, DimMismatch};
