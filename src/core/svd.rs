//! Singular value decomposition via Golub-Kahan bidiagonalization with
//! implicit-shift QR.
//!
//! The decomposition is computed in place: the input matrix is overwritten
//! with `U`, and `w` / `v` are returned separately. This is the classical
//! routine with a hard 30-iteration cap per singular value; blowing the cap
//! means the input was malformed or the algorithm is broken, so it aborts
//! rather than returning an error the caller could sensibly handle.
//!
//! The checked matrix helpers at the bottom exist so callers get a real
//! error on a dimension mismatch instead of a panic deep inside nalgebra.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Dimension mismatch in one of the checked matrix helpers.
#[derive(Debug, Error)]
#[error("illegal matrix multiply: {lhs_rows}x{lhs_cols} by {rhs_rows}x{rhs_cols}")]
pub struct DimMismatch {
    pub lhs_rows: usize,
    pub lhs_cols: usize,
    pub rhs_rows: usize,
    pub rhs_cols: usize,
}

/// `|a|` carrying the sign of `b` (non-positive `b` gives `-|a|`).
fn sign(a: f64, b: f64) -> f64 {
    if b > 0.0 {
        a.abs()
    } else {
        -a.abs()
    }
}

/// `sqrt(a² + b²)` without destructive underflow or overflow.
fn pythag(a: f64, b: f64) -> f64 {
    let absa = a.abs();
    let absb = b.abs();

    if absa > absb {
        let r = absb / absa;
        absa * (1.0 + r * r).sqrt()
    } else if absb == 0.0 {
        0.0
    } else {
        let r = absa / absb;
        absb * (1.0 + r * r).sqrt()
    }
}

/// Singular value decomposition `A = U · diag(w) · Vᵗ`.
///
/// `a` must be m×n with m ≥ n. On return `a` holds `U` (m×n,
/// column-orthonormal); the returned pair is `(w, v)` where `w` holds the n
/// non-negative singular values (not sorted) and `v` is the n×n orthogonal
/// matrix `V` (not its transpose).
///
/// Panics if the implicit-shift QR fails to converge within 30 iterations
/// for some singular value.
pub fn svdcmp(a: &mut DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
    let m = a.nrows();
    let n = a.ncols();
    assert!(m >= n, "svdcmp requires at least as many rows as columns");

    let mut w = DVector::<f64>::zeros(n);
    let mut v = DMatrix::<f64>::zeros(n, n);
    let mut rv1 = vec![0.0f64; n];

    let mut g = 0.0;
    let mut scale = 0.0;
    let mut anorm = 0.0f64;
    let mut l = 0usize;

    // Householder reduction to bidiagonal form.
    for i in 0..n {
        l = i + 1;
        rv1[i] = scale * g;
        g = 0.0;
        let mut s = 0.0;
        scale = 0.0;

        if i < m {
            for k in i..m {
                scale += a[(k, i)].abs();
            }

            if scale != 0.0 {
                for k in i..m {
                    a[(k, i)] /= scale;
                    s += a[(k, i)] * a[(k, i)];
                }

                let f = a[(i, i)];
                g = -sign(s.sqrt(), f);
                let h = f * g - s;
                a[(i, i)] = f - g;

                for j in l..n {
                    let mut s = 0.0;
                    for k in i..m {
                        s += a[(k, i)] * a[(k, j)];
                    }
                    let f = s / h;
                    for k in i..m {
                        a[(k, j)] += f * a[(k, i)];
                    }
                }

                for k in i..m {
                    a[(k, i)] *= scale;
                }
            }
        }

        w[i] = scale * g;
        g = 0.0;
        s = 0.0;
        scale = 0.0;

        if i < m && i != n - 1 {
            for k in l..n {
                scale += a[(i, k)].abs();
            }

            if scale != 0.0 {
                for k in l..n {
                    a[(i, k)] /= scale;
                    s += a[(i, k)] * a[(i, k)];
                }

                let f = a[(i, l)];
                g = -sign(s.sqrt(), f);
                let h = f * g - s;
                a[(i, l)] = f - g;

                for k in l..n {
                    rv1[k] = a[(i, k)] / h;
                }

                for j in l..m {
                    let mut s = 0.0;
                    for k in l..n {
                        s += a[(j, k)] * a[(i, k)];
                    }
                    for k in l..n {
                        a[(j, k)] += s * rv1[k];
                    }
                }

                for k in l..n {
                    a[(i, k)] *= scale;
                }
            }
        }

        anorm = anorm.max(w[i].abs() + rv1[i].abs());
    }

    // Accumulation of right-hand transformations.
    for i in (0..n).rev() {
        if i < n - 1 {
            if g != 0.0 {
                // Double division avoids possible underflow.
                for j in l..n {
                    v[(j, i)] = (a[(i, j)] / a[(i, l)]) / g;
                }
                for j in l..n {
                    let mut s = 0.0;
                    for k in l..n {
                        s += a[(i, k)] * v[(k, j)];
                    }
                    for k in l..n {
                        v[(k, j)] += s * v[(k, i)];
                    }
                }
            }
            for j in l..n {
                v[(i, j)] = 0.0;
                v[(j, i)] = 0.0;
            }
        }
        v[(i, i)] = 1.0;
        g = rv1[i];
        l = i;
    }

    // Accumulation of left-hand transformations.
    for i in (0..m.min(n)).rev() {
        let l = i + 1;
        let mut g = w[i];

        for j in l..n {
            a[(i, j)] = 0.0;
        }

        if g != 0.0 {
            g = 1.0 / g;

            for j in l..n {
                let mut s = 0.0;
                for k in l..m {
                    s += a[(k, i)] * a[(k, j)];
                }
                let f = (s / a[(i, i)]) * g;
                for k in i..m {
                    a[(k, j)] += f * a[(k, i)];
                }
            }

            for j in i..m {
                a[(j, i)] *= g;
            }
        } else {
            for j in i..m {
                a[(j, i)] = 0.0;
            }
        }

        a[(i, i)] += 1.0;
    }

    // Diagonalization of the bidiagonal form.
    for k in (0..n).rev() {
        for its in 1..=30 {
            // Test for splitting. rv1[0] is always zero, so the scan cannot
            // fall off the bottom.
            let mut flag = true;
            let mut l = k;
            let mut nm = 0usize;
            loop {
                if rv1[l].abs() + anorm == anorm {
                    flag = false;
                    break;
                }
                nm = l - 1;
                if w[nm].abs() + anorm == anorm {
                    break;
                }
                l -= 1;
            }

            if flag {
                // Cancellation of rv1[l], l > 0.
                let mut c = 0.0;
                let mut s = 1.0;

                for i in l..=k {
                    let f = s * rv1[i];
                    rv1[i] *= c;

                    if f.abs() + anorm == anorm {
                        break;
                    }

                    let g = w[i];
                    let mut h = pythag(f, g);
                    w[i] = h;
                    h = 1.0 / h;
                    c = g * h;
                    s = -f * h;

                    for j in 0..m {
                        let y = a[(j, nm)];
                        let z = a[(j, i)];
                        a[(j, nm)] = y * c + z * s;
                        a[(j, i)] = z * c - y * s;
                    }
                }
            }

            let z = w[k];

            if l == k {
                // Convergence; make the singular value non-negative.
                if z < 0.0 {
                    w[k] = -z;
                    for j in 0..n {
                        v[(j, k)] = -v[(j, k)];
                    }
                }
                break;
            }

            if its == 30 {
                panic!("no convergence in 30 svdcmp iterations");
            }

            // Shift from the bottom 2x2 minor.
            let x = w[l];
            let nm = k - 1;
            let y = w[nm];
            let mut g = rv1[nm];
            let mut h = rv1[k];
            let mut f = ((y - z) * (y + z) + (g - h) * (g + h)) / (2.0 * h * y);
            g = pythag(f, 1.0);
            f = ((x - z) * (x + z) + h * ((y / (f + sign(g, f))) - h)) / x;

            // Next QR transformation.
            let mut c = 1.0;
            let mut s = 1.0;
            let mut x = x;

            for j in l..=nm {
                let i = j + 1;
                g = rv1[i];
                let mut y = w[i];
                h = s * g;
                g *= c;
                let mut z = pythag(f, h);
                rv1[j] = z;
                c = f / z;
                s = h / z;
                f = x * c + g * s;
                g = g * c - x * s;
                h = y * s;
                y *= c;

                for jj in 0..n {
                    let x = v[(jj, j)];
                    let z = v[(jj, i)];
                    v[(jj, j)] = x * c + z * s;
                    v[(jj, i)] = z * c - x * s;
                }

                z = pythag(f, h);
                w[j] = z;

                // Rotation can be arbitrary if z is zero.
                if z != 0.0 {
                    z = 1.0 / z;
                    c = f * z;
                    s = h * z;
                }

                f = c * g + s * y;
                x = c * y - s * g;

                for jj in 0..m {
                    let y = a[(jj, j)];
                    let z = a[(jj, i)];
                    a[(jj, j)] = y * c + z * s;
                    a[(jj, i)] = z * c - y * s;
                }
            }

            rv1[l] = 0.0;
            rv1[k] = f;
            w[k] = x;
        }
    }

    (w, v)
}

/// Matrix product `A · B` with an explicit shape check.
pub fn mat_mul(a: &DMatrix<f64>, b: &DMatrix<f64>) -> Result<DMatrix<f64>, DimMismatch> {
    if a.ncols() != b.nrows() {
        return Err(DimMismatch {
            lhs_rows: a.nrows(),
            lhs_cols: a.ncols(),
            rhs_rows: b.nrows(),
            rhs_cols: b.ncols(),
        });
    }
    Ok(a * b)
}

/// Matrix-vector product `A · v` with an explicit shape check.
pub fn mat_vec_mul(a: &DMatrix<f64>, v: &DVector<f64>) -> Result<DVector<f64>, DimMismatch> {
    if a.ncols() != v.nrows() {
        return Err(DimMismatch {
            lhs_rows: a.nrows(),
            lhs_cols: a.ncols(),
            rhs_rows: v.nrows(),
            rhs_cols: 1,
        });
    }
    Ok(a * v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reconstruct(u: &DMatrix<f64>, w: &DVector<f64>, v: &DMatrix<f64>) -> DMatrix<f64> {
        u * DMatrix::from_diagonal(w) * v.transpose()
    }

    #[test]
    fn test_svd_reconstructs_input() {
        let a = DMatrix::from_row_slice(
            4,
            3,
            &[
                1.0, 2.0, 3.0, //
                4.0, 5.0, 6.0, //
                7.0, 8.0, 10.0, //
                2.0, -1.0, 0.5,
            ],
        );

        let mut u = a.clone();
        let (w, v) = svdcmp(&mut u);
        let back = reconstruct(&u, &w, &v);

        for i in 0..4 {
            for j in 0..3 {
                assert_relative_eq!(back[(i, j)], a[(i, j)], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_svd_u_columns_orthonormal() {
        let a = DMatrix::from_row_slice(
            5,
            3,
            &[
                0.3, -1.0, 2.0, //
                1.5, 0.7, -0.2, //
                -0.8, 2.2, 1.1, //
                0.0, 1.0, 0.0, //
                3.0, -0.5, 0.4,
            ],
        );

        let mut u = a;
        let (_, v) = svdcmp(&mut u);

        let utu = u.transpose() * &u;
        let vtv = v.transpose() * &v;
        for i in 0..3 {
            for j in 0..3 {
                let expect = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(utu[(i, j)], expect, epsilon = 1e-9);
                assert_relative_eq!(vtv[(i, j)], expect, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_svd_identity_has_unit_singular_values() {
        let mut a = DMatrix::<f64>::identity(4, 4);
        let (w, _) = svdcmp(&mut a);

        for i in 0..4 {
            assert_relative_eq!(w[i], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_svd_singular_values_nonnegative() {
        let a = DMatrix::from_row_slice(3, 3, &[-2.0, 0.0, 0.0, 0.0, -3.0, 0.0, 0.0, 0.0, -5.0]);

        let mut u = a;
        let (w, _) = svdcmp(&mut u);
        for i in 0..3 {
            assert!(w[i] >= 0.0);
        }
    }

    #[test]
    fn test_mat_mul_rejects_bad_shapes() {
        let a = DMatrix::<f64>::zeros(2, 3);
        let b = DMatrix::<f64>::zeros(2, 3);
        assert!(mat_mul(&a, &b).is_err());

        let v = DVector::<f64>::zeros(2);
        assert!(mat_vec_mul(&a, &v).is_err());
    }

    #[test]
    fn test_mat_mul_small_example() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let b = DMatrix::from_row_slice(2, 2, &[5.0, 6.0, 7.0, 8.0]);
        let c = mat_mul(&a, &b).unwrap();
        assert_relative_eq!(c[(0, 0)], 19.0);
        assert_relative_eq!(c[(0, 1)], 22.0);
        assert_relative_eq!(c[(1, 0)], 43.0);
        assert_relative_eq!(c[(1, 1)], 50.0);
    }

    #[test]
    fn test_pythag_matches_hypot() {
        assert_relative_eq!(pythag(3.0, 4.0), 5.0, epsilon = 1e-12);
        assert_relative_eq!(pythag(0.0, 0.0), 0.0);
        assert_relative_eq!(pythag(-3.0, 4.0), 5.0, epsilon = 1e-12);
        // No overflow for large components.
        let big = 1e200;
        assert_relative_eq!(pythag(big, big), big * std::f64::consts::SQRT_2, epsilon = 1e190);
    }
}
