//! Per-pixel polynomial coefficient generation.
//!
//! For every output pixel we take that pixel from all N input photographs,
//! turn the N colors into a normalized luminance series, and project the
//! series through the pseudo-inverse to get the K polynomial coefficients.
//! The first three bands of the output hold the average color, the
//! remaining K bands the coefficients.
//!
//! Every pixel is independent of every other pixel, so rows can be computed
//! in any order and on any thread as long as the inputs and the
//! pseudo-inverse stay read-only. That is what makes the streaming
//! double-pass possible: a row recomputed later is bit-identical to the row
//! computed the first time.

use image::RgbImage;
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Rec. 709-style luminance weights used by the original fitter.
const LUM_R: f64 = 0.2125;
const LUM_G: f64 = 0.7154;
const LUM_B: f64 = 0.0721;

/// A virtual (3 + K)-band float image of average colors and polynomial
/// coefficients, backed by the input photographs and the pseudo-inverse.
///
/// Rows are served either from an in-memory cache (see [`materialize`]) or
/// recomputed on demand from the immutable inputs.
///
/// [`materialize`]: PolyField::materialize
#[derive(Debug)]
pub struct PolyField {
    images: Vec<RgbImage>,
    /// K×N pseudo-inverse of the design matrix. Never mutated.
    pinv: DMatrix<f64>,
    width: u32,
    height: u32,
    cached: Option<Vec<f32>>,
}

impl PolyField {
    /// Wrap N aligned photographs and the K×N pseudo-inverse.
    ///
    /// Panics if the image count does not match the pseudo-inverse width or
    /// the images do not all share one size; callers validate both earlier
    /// with proper errors.
    pub fn new(images: Vec<RgbImage>, pinv: DMatrix<f64>) -> Self {
        assert!(!images.is_empty(), "PolyField needs at least one image");
        assert_eq!(
            pinv.ncols(),
            images.len(),
            "pseudo-inverse width must equal the image count"
        );

        let width = images[0].width();
        let height = images[0].height();
        for im in &images {
            assert_eq!((im.width(), im.height()), (width, height));
        }

        Self {
            images,
            pinv,
            width,
            height,
            cached: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of polynomial coefficients per pixel (K).
    pub fn coeff_count(&self) -> usize {
        self.pinv.nrows()
    }

    /// Floats per pixel: 3 average-color bands plus K coefficient bands.
    pub fn bands(&self) -> usize {
        3 + self.coeff_count()
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// Compute one row of the field into `out` (`width · bands` floats).
    ///
    /// Pure function of the inputs: calling it twice for the same row gives
    /// bit-identical results.
    pub fn compute_row(&self, y: u32, out: &mut [f32]) {
        let n = self.images.len();
        let k = self.coeff_count();
        let bands = self.bands();
        assert_eq!(out.len(), self.width as usize * bands);

        // Normalized luminance per input sample, reused across the row.
        let mut lum = vec![0.0f64; n];

        for x in 0..self.width {
            let pixel = &mut out[x as usize * bands..(x as usize + 1) * bands];

            // Normalized luminance for the input images.
            let mut maxy = 0.0f64;
            for (i, im) in self.images.iter().enumerate() {
                let p = im.get_pixel(x, y).0;
                let l =
                    (LUM_R * p[0] as f64 + LUM_G * p[1] as f64 + LUM_B * p[2] as f64) / 255.0;
                lum[i] = l;
                if l > maxy {
                    maxy = l;
                }
            }

            // A pixel black under every light keeps an all-zero series.
            if maxy != 0.0 {
                for l in lum.iter_mut() {
                    *l /= maxy;
                }
            }

            // Average color component of the inputs, weighted by the
            // luminance series.
            let mut adoty = [0.0f64; 3];
            let mut ydoty = 0.0f64;
            for (i, im) in self.images.iter().enumerate() {
                let p = im.get_pixel(x, y).0;
                for j in 0..3 {
                    adoty[j] += p[j] as f64 / 255.0 * lum[i];
                }
                ydoty += lum[i] * lum[i];
            }

            for j in 0..3 {
                let av = if ydoty != 0.0 {
                    (adoty[j] / ydoty).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                pixel[j] = (av * 255.0) as f32;
            }

            // Put the luminance series through the pseudo-inverse to get
            // the polynomial coefficients.
            for j in 0..k {
                let mut sum = 0.0f64;
                for i in 0..n {
                    sum += lum[i] * self.pinv[(j, i)];
                }
                pixel[3 + j] = (255.0 * sum) as f32;
            }
        }
    }

    /// Materialize the whole field in memory, rows computed in parallel.
    /// After this, [`row`](PolyField::row) serves cache slices instead of
    /// recomputing.
    pub fn materialize(&mut self) {
        if self.cached.is_some() {
            return;
        }

        let row_len = self.width as usize * self.bands();
        let mut data = vec![0.0f32; row_len * self.height as usize];

        let this = &*self;
        data.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| this.compute_row(y as u32, row));

        self.cached = Some(data);
    }

    /// One row of the field, from the cache when materialized, otherwise
    /// recomputed into `scratch`.
    pub fn row<'a>(&'a self, y: u32, scratch: &'a mut Vec<f32>) -> &'a [f32] {
        let row_len = self.width as usize * self.bands();

        match &self.cached {
            Some(data) => {
                let start = y as usize * row_len;
                &data[start..start + row_len]
            }
            None => {
                scratch.resize(row_len, 0.0);
                self.compute_row(y, scratch);
                &scratch[..]
            }
        }
    }
}
