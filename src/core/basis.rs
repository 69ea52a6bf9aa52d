//! Polynomial bases for the per-pixel light-response fit.
//!
//! A PTM models each pixel's luminance as a low-degree polynomial in the
//! projected light direction (lu, lv). Two bases are supported:
//!
//! - biquadratic in two variables: `1, lv, lu, lu·lv, lv², lu²` (6 terms)
//! - quadratic in one variable: `1, lu, lu²` (3 terms)

use crate::fit::FitError;

/// Which monomial set the fit uses per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    /// Quadratic in both light-direction components (6 coefficients).
    QuadraticBivariate,
    /// Quadratic in the x component only (3 coefficients).
    QuadraticUnivariate,
}

impl Basis {
    /// Number of coefficients per pixel; also the minimum number of input
    /// photographs a fit needs.
    pub fn dimension(self) -> usize {
        match self {
            Basis::QuadraticBivariate => 6,
            Basis::QuadraticUnivariate => 3,
        }
    }

    /// One row of the design matrix: the basis monomials evaluated at a
    /// light direction's (x, y).
    pub fn design_row(self, x: f64, y: f64) -> Vec<f64> {
        match self {
            Basis::QuadraticBivariate => vec![1.0, y, x, x * y, y * y, x * x],
            Basis::QuadraticUnivariate => vec![1.0, x, x * x],
        }
    }

    /// Map the CLI/basis selector (`0` bivariate, `1` univariate) to a
    /// basis. Any other code is an unimplemented basis.
    pub fn from_code(code: i32) -> Result<Basis, FitError> {
        match code {
            0 => Ok(Basis::QuadraticBivariate),
            1 => Ok(Basis::QuadraticUnivariate),
            other => Err(FitError::UnimplementedBasis(other)),
        }
    }
}
