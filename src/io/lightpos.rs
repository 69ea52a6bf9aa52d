//! Light-position (`.lp`) file parser.
//!
//! Format:
//!
//! ```text
//! <N>
//! <photo-path> <x> <y> <z>     (N lines)
//! ```
//!
//! Each (x, y, z) is a light direction and is normalized to unit length
//! here. A structurally broken file (missing, unreadable, bad first line,
//! too few sample lines) is fatal; a merely malformed sample line is a
//! warning and parsing continues with best-effort values.

use crate::fit::{resolve_photo_path, FitError};
use nalgebra::Vector3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Lines longer than this were truncated by the original fitter's fixed
/// read buffer; warn so users learn why their photo path got mangled there.
const MAX_LINE_LEN: usize = 256;

/// One input photograph and the unit light direction it was taken under.
///
/// A zero-length direction in the file stays the zero vector: the sample
/// still participates in the fit, it just contributes nothing.
#[derive(Debug, Clone)]
pub struct LightSample {
    /// Photo path, resolved relative to the lp file.
    pub path: PathBuf,
    /// Unit light direction (or zero).
    pub direction: Vector3<f64>,
}

/// Parse an lp file into light samples.
pub fn read_lp_file(lp_path: &Path) -> Result<Vec<LightSample>, FitError> {
    let file = File::open(lp_path).map_err(|e| {
        FitError::Config(format!(
            "light position file {} not found ({})",
            lp_path.display(),
            e
        ))
    })?;
    let mut lines = BufReader::new(file).lines();

    let first = lines
        .next()
        .transpose()?
        .ok_or_else(|| FitError::Config("light position file: first line wrong (empty file)".into()))?;
    let count: usize = first
        .trim()
        .parse()
        .map_err(|_| FitError::Config(format!("light position file: first line wrong: {:?}", first)))?;

    let mut samples = Vec::with_capacity(count);

    for index in 0..count {
        let line = lines.next().transpose()?.ok_or_else(|| {
            FitError::Config(format!(
                "expected {} sample lines, file ends after {}",
                count, index
            ))
        })?;

        if line.len() >= MAX_LINE_LEN {
            eprintln!(
                "caution, lp file line {} is over {} bytes; \
                 please use a shorter path",
                index + 2,
                MAX_LINE_LEN
            );
        }

        let mut tokens = line.split_whitespace();
        let name = tokens.next().unwrap_or_default().to_string();
        let mut coords = [0.0f64; 3];
        let mut parsed = usize::from(!name.is_empty());
        for c in coords.iter_mut() {
            if let Some(value) = tokens.next().and_then(|t| t.parse().ok()) {
                *c = value;
                parsed += 1;
            }
        }

        if parsed != 4 {
            eprintln!(
                "caution, couldn't find required values \
                 `filename x y z` in lp file, for line: {:?}",
                line
            );
        }

        let mut direction = Vector3::new(coords[0], coords[1], coords[2]);
        let magnitude = direction.norm();
        if magnitude > 0.0 {
            direction /= magnitude;
        } else {
            eprintln!(
                "caution, length zero vector found in lp file: {} {} {}",
                coords[0], coords[1], coords[2]
            );
        }

        samples.push(LightSample {
            path: resolve_photo_path(lp_path, &name),
            direction,
        });
    }

    Ok(samples)
}
