//! The fitting pipeline: configuration, error type, and the entry point
//! that takes a light-position file to a writable coefficient field.

pub mod design;
pub mod poly;
pub mod quantize;

pub use design::{build_design_matrix, pseudo_inverse};
pub use poly::PolyField;
pub use quantize::ScaleBias;

use crate::core::{Basis, DimMismatch};
use crate::io::images::{load_samples, Crop};
use crate::io::lightpos::read_lp_file;
use crate::io::ptm::write_ptm;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can end a fit. None of these are retried; a fit either runs
/// to completion or stops at the first of them.
#[derive(Debug, Error)]
pub enum FitError {
    /// The light-position file is missing or structurally broken, or the
    /// pipeline was handed inconsistent pieces.
    #[error("configuration error: {0}")]
    Config(String),

    /// Input photographs must all share the same dimensions after cropping.
    #[error(
        "images differ in size: {path} is {got_width}x{got_height}, \
         expected {want_width}x{want_height}"
    )]
    ImageMismatch {
        path: String,
        got_width: u32,
        got_height: u32,
        want_width: u32,
        want_height: u32,
    },

    /// Fewer photographs than the basis has coefficients.
    #[error(
        "not enough samples for fitting a PTM: \
         this basis requires {required} or more images, got {got}"
    )]
    InsufficientSamples { required: usize, got: usize },

    /// A singular value fell below the rank threshold.
    #[error(
        "system can not be solved, not enough info to compute coefficients; \
         most likely cause: sample locations are redundant, e.g. are colinear"
    )]
    RankDeficient,

    /// Basis selector outside the implemented set.
    #[error("basis not implemented: {0}")]
    UnimplementedBasis(i32),

    /// File open/read/write failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Photograph decode failure.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Shape mismatch inside the linear algebra helpers.
    #[error("internal linear algebra error: {0}")]
    LinAlg(#[from] DimMismatch),
}

/// Immutable fit configuration, threaded through the whole pipeline.
#[derive(Debug, Clone, Copy)]
pub struct FitConfig {
    /// Polynomial basis to fit.
    pub basis: Basis,

    /// Materialize the full coefficient field in memory. When off
    /// (the default), pixel records are recomputed on the fly for both the
    /// scale/bias scan and the file write, trading compute for memory.
    pub cache: bool,

    /// Region of the input frames to process, in per-mille of the frame.
    pub crop: Crop,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            basis: Basis::QuadraticBivariate,
            cache: false,
            crop: Crop::default(),
        }
    }
}

/// A completed fit: the coefficient field plus its quantization constants,
/// ready to be written to a PTM file.
#[derive(Debug)]
pub struct FittedPtm {
    field: PolyField,
    scale_bias: ScaleBias,
}

impl FittedPtm {
    /// The fitted coefficient field.
    pub fn field(&self) -> &PolyField {
        &self.field
    }

    /// Per-coefficient quantization constants.
    pub fn scale_bias(&self) -> &ScaleBias {
        &self.scale_bias
    }

    /// Serialize as a PTM 1.2 file. In streaming mode this recomputes every
    /// pixel record a second time; in cached mode it reads the in-memory
    /// field.
    pub fn write(&self, path: &Path) -> Result<(), FitError> {
        write_ptm(&self.field, path, &self.scale_bias)
    }
}

/// Fit entry point.
pub struct Fitter {
    config: FitConfig,
}

impl Fitter {
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    /// Run the whole fit for the given light-position file: parse light
    /// directions, load photographs, pseudo-invert the design matrix,
    /// set up the per-pixel coefficient field, and derive scale/bias.
    pub fn fit(&self, lp_path: &Path) -> Result<FittedPtm, FitError> {
        let samples = read_lp_file(lp_path)?;

        // Refuse infeasible fits before decoding any image or touching the
        // solver.
        let required = self.config.basis.dimension();
        if samples.len() < required {
            return Err(FitError::InsufficientSamples {
                required,
                got: samples.len(),
            });
        }

        let images = load_samples(&samples, self.config.crop)?;

        let m = build_design_matrix(&samples, self.config.basis)?;
        let pinv = pseudo_inverse(m)?;

        let mut field = PolyField::new(images, pinv);
        if self.config.cache {
            field.materialize();
        }

        let scale_bias = ScaleBias::from_field(&field);

        Ok(FittedPtm { field, scale_bias })
    }
}

/// Resolve a photo path from an lp-file line relative to the lp file itself.
pub(crate) fn resolve_photo_path(lp_path: &Path, name: &str) -> PathBuf {
    match lp_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
        _ => PathBuf::from(name),
    }
}
