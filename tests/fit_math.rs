//! Fit-math invariants: feasibility checks, pseudo-inverse quality, and
//! rank-deficiency detection on realistic light configurations.

use approx::assert_relative_eq;
use nalgebra::Vector3;
use ptm_rs::fit::{build_design_matrix, pseudo_inverse, FitError};
use ptm_rs::io::LightSample;
use ptm_rs::Basis;
use std::path::PathBuf;

fn sample(x: f64, y: f64, z: f64) -> LightSample {
    LightSample {
        path: PathBuf::from("photo.png"),
        direction: Vector3::new(x, y, z).normalize(),
    }
}

/// A plausible dome of light positions, as a capture rig would produce.
fn dome_samples(count: usize) -> Vec<LightSample> {
    (0..count)
        .map(|i| {
            let azimuth = i as f64 * 2.4; // golden-angle-ish spread
            let elevation = 0.3 + 0.5 * (i as f64 / count as f64);
            sample(
                elevation.cos() * azimuth.cos(),
                elevation.cos() * azimuth.sin(),
                elevation.sin(),
            )
        })
        .collect()
}

#[test]
fn bivariate_needs_six_samples() {
    let five = dome_samples(5);
    assert!(matches!(
        build_design_matrix(&five, Basis::QuadraticBivariate),
        Err(FitError::InsufficientSamples {
            required: 6,
            got: 5
        })
    ));

    let six = dome_samples(6);
    assert!(build_design_matrix(&six, Basis::QuadraticBivariate).is_ok());
}

#[test]
fn univariate_needs_three_samples() {
    let two = dome_samples(2);
    assert!(matches!(
        build_design_matrix(&two, Basis::QuadraticUnivariate),
        Err(FitError::InsufficientSamples {
            required: 3,
            got: 2
        })
    ));
}

#[test]
fn pseudo_inverse_roundtrip_on_dome() {
    for &count in &[6usize, 12, 50] {
        let samples = dome_samples(count);
        let m = build_design_matrix(&samples, Basis::QuadraticBivariate).unwrap();
        let p = pseudo_inverse(m.clone()).unwrap();

        let back = &m * &p * &m;
        let scale = m.amax();
        for i in 0..m.nrows() {
            for j in 0..m.ncols() {
                assert_relative_eq!(
                    back[(i, j)] / scale,
                    m[(i, j)] / scale,
                    epsilon = 1e-6
                );
            }
        }
    }
}

#[test]
fn collinear_lights_fail_rank_deficient() {
    // Every light position on the x axis: the bivariate basis cannot be
    // resolved from a one-dimensional sweep.
    let samples: Vec<LightSample> = (0..10)
        .map(|i| {
            let x = -0.9 + 0.2 * i as f64;
            sample(x, 0.0, (1.0 - x * x).max(0.05).sqrt())
        })
        .collect();

    let m = build_design_matrix(&samples, Basis::QuadraticBivariate).unwrap();
    assert!(matches!(pseudo_inverse(m), Err(FitError::RankDeficient)));
}

#[test]
fn univariate_fit_recovers_known_polynomial() {
    // Luminance follows an exact quadratic in x; the fitted coefficients
    // must reproduce it at the sample points.
    let samples = vec![
        sample(-0.8, 0.0, 0.6),
        sample(-0.4, 0.0, 0.9165151389911680),
        sample(0.0, 0.0, 1.0),
        sample(0.4, 0.0, 0.9165151389911680),
        sample(0.8, 0.0, 0.6),
    ];
    let m = build_design_matrix(&samples, Basis::QuadraticUnivariate).unwrap();
    let p = pseudo_inverse(m.clone()).unwrap();

    // l(x) = 0.5 + 0.25·x - 0.125·x²
    let truth = [0.5, 0.25, -0.125];
    let lum = nalgebra::DVector::from_iterator(
        5,
        samples
            .iter()
            .map(|s| truth[0] + truth[1] * s.direction.x + truth[2] * s.direction.x.powi(2)),
    );

    let coeffs = &p * &lum;
    for i in 0..3 {
        assert_relative_eq!(coeffs[i], truth[i], epsilon = 1e-9);
    }
}
