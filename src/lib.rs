//! # ptm-rs: Polynomial Texture Map fitter
//!
//! This crate fits a Polynomial Texture Map (PTM) from a set of photographs
//! of a surface taken under different known light directions. Each output
//! pixel stores an average color plus the coefficients of a quadratic
//! polynomial in the light direction, so the surface can be relit
//! interactively afterwards.
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - `core`: Pure math (SVD solver, polynomial bases)
//! - `io`: File formats (light-position files, input photographs, PTM output)
//! - `fit`: The fitting pipeline (design matrix, per-pixel coefficients,
//!   quantization, entry point)
//!
//! ## Pipeline
//!
//! Light directions are read from a `.lp` file, the least-squares design
//! matrix is pseudo-inverted via SVD, every pixel's luminance series is
//! projected through the pseudo-inverse to get polynomial coefficients, and
//! the coefficient field is quantized to bytes and written as a PTM 1.2 file.

// Pure math (SVD, bases)
pub mod core;

// File formats (lp files, photographs, PTM output)
pub mod io;

// Fitting pipeline
pub mod fit;

// Re-export commonly used types at crate root for convenience
pub use crate::core::Basis;
pub use crate::fit::{FitConfig, FitError, FittedPtm, Fitter};
pub use crate::io::LightSample;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
