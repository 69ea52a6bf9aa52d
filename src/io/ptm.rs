//! PTM 1.2 file writer.
//!
//! Layout:
//!
//! ```text
//! PTM_1.2\n
//! PTM_FORMAT_LRGB\n
//! <width>\n
//! <height>\n
//! <scale[K-1]> ... <scale[0]> \n
//! <bias[K-1]> ... <bias[0]> \n
//! coefficient block: width·height·K bytes, K quantized coefficients per
//!     pixel in reverse channel order
//! color block: width·height·3 bytes, average RGB per pixel
//! ```
//!
//! PTM files keep the origin at byte 0 of the pixel data while the field is
//! stored top-to-bottom in memory, so each row is seeked to its mirrored
//! position `height - 1 - y` inside both blocks. A writer proceeds strictly
//! Open → HeaderWritten → Writing → Closed; any I/O failure aborts the
//! whole write and leaves a partial file behind for the caller to discard.

use crate::fit::{FitError, PolyField, ScaleBias};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

const FORMAT_TAG: &str = "PTM_1.2";
const FORMAT_NAME: &str = "PTM_FORMAT_LRGB";

/// Write the fitted field as a PTM 1.2 file.
///
/// The field must carry exactly `3 + K` bands for the K channels of
/// `scale_bias`. Rows come from the field's cache when materialized and are
/// recomputed on the fly otherwise.
pub fn write_ptm(field: &PolyField, path: &Path, scale_bias: &ScaleBias) -> Result<(), FitError> {
    let k = scale_bias.len();
    if field.coeff_count() != k || field.bands() != 3 + k {
        return Err(FitError::Config(format!(
            "coefficient field has {} bands, expected {}",
            field.bands(),
            3 + k
        )));
    }

    let width = field.width() as u64;
    let height = field.height() as u64;

    let mut fp = File::create(path)?;

    // Text header.
    writeln!(fp, "{}", FORMAT_TAG)?;
    writeln!(fp, "{}", FORMAT_NAME)?;
    writeln!(fp, "{}", width)?;
    writeln!(fp, "{}", height)?;
    for i in (0..k).rev() {
        write!(fp, "{:.6} ", scale_bias.scale[i])?;
    }
    writeln!(fp)?;
    for i in (0..k).rev() {
        write!(fp, "{} ", scale_bias.bias[i])?;
    }
    writeln!(fp)?;

    // The coefficient block comes first, the color block right after it.
    let coeff_start = fp.stream_position()?;
    let rgb_start = coeff_start + width * height * k as u64;

    let bands = field.bands();
    let mut scratch = Vec::new();
    let mut coeff_line = vec![0u8; field.width() as usize * k];
    let mut rgb_line = vec![0u8; field.width() as usize * 3];

    for y in 0..field.height() {
        let row = field.row(y, &mut scratch);

        for (x, pixel) in row.chunks_exact(bands).enumerate() {
            // Coefficients go out highest channel first.
            for i in (0..k).rev() {
                coeff_line[x * k + (k - 1 - i)] = scale_bias.quantize(i, pixel[3 + i]);
            }
            // Average color is already byte-range; round only.
            for j in 0..3 {
                rgb_line[x * 3 + j] = (pixel[j] + 0.5) as u8;
            }
        }

        let file_row = height - 1 - y as u64;

        fp.seek(SeekFrom::Start(coeff_start + file_row * width * k as u64))?;
        fp.write_all(&coeff_line)?;

        fp.seek(SeekFrom::Start(rgb_start + file_row * width * 3))?;
        fp.write_all(&rgb_line)?;
    }

    Ok(())
}
