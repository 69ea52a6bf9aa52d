//! Least-squares design matrix and its Moore-Penrose pseudo-inverse.
//!
//! For N light samples and a K-term basis the design matrix M is N×K, each
//! row the basis monomials at one sample's light direction. The fit itself
//! is then just `coefficients = P · luminances` with `P = V · diag(1/w) · Uᵗ`
//! from the SVD of M.

use crate::core::{mat_mul, svdcmp, Basis};
use crate::fit::FitError;
use crate::io::LightSample;
use nalgebra::DMatrix;

/// Singular values at or below this are treated as zero: the sample
/// directions do not span the basis and the system has no usable inverse.
pub const SINGULAR_VALUE_THRESHOLD: f64 = 1.0e-10;

/// Build the N×K design matrix for the given samples and basis.
///
/// Fails with [`FitError::InsufficientSamples`] when there are fewer samples
/// than basis terms; the least-squares problem is underdetermined then.
pub fn build_design_matrix(
    samples: &[LightSample],
    basis: Basis,
) -> Result<DMatrix<f64>, FitError> {
    let k = basis.dimension();

    if samples.len() < k {
        return Err(FitError::InsufficientSamples {
            required: k,
            got: samples.len(),
        });
    }

    let mut m = DMatrix::<f64>::zeros(samples.len(), k);
    for (row, sample) in samples.iter().enumerate() {
        let terms = basis.design_row(sample.direction.x, sample.direction.y);
        for (col, value) in terms.into_iter().enumerate() {
            m[(row, col)] = value;
        }
    }

    Ok(m)
}

/// Compute the K×N pseudo-inverse of the design matrix via SVD.
///
/// Fails with [`FitError::RankDeficient`] when any singular value is at or
/// below [`SINGULAR_VALUE_THRESHOLD`] — in practice this means the light
/// positions are redundant (for example, all on one line).
pub fn pseudo_inverse(mut m: DMatrix<f64>) -> Result<DMatrix<f64>, FitError> {
    let k = m.ncols();

    // m is overwritten with U.
    let (w, v) = svdcmp(&mut m);

    for i in 0..k {
        if w[i].abs() <= SINGULAR_VALUE_THRESHOLD {
            return Err(FitError::RankDeficient);
        }
    }

    // P = V · diag(1/w) · Uᵗ, with the diagonal folded into Uᵗ's rows.
    let mut ut = m.transpose();
    for i in 0..k {
        let inv_w = 1.0 / w[i];
        for j in 0..ut.ncols() {
            ut[(i, j)] *= inv_w;
        }
    }

    Ok(mat_mul(&v, &ut)?)
}
