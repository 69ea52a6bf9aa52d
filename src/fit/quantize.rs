//! Scale/bias quantization of the coefficient field.
//!
//! Coefficients are stored in the file as unsigned bytes. For each of the K
//! coefficient channels we scan the full field for its min/max, pick a
//! power-of-two scale that squeezes the range into 256 levels, and an
//! integer bias that shifts negative ranges up. A byte `b` then decodes as
//! `(b - bias) · scale`.

use crate::fit::PolyField;

/// Per-coefficient-channel quantization constants, derived once per fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBias {
    /// Positive power-of-two scale per channel.
    pub scale: Vec<f64>,
    /// Byte offset per channel, in [0, 255].
    pub bias: Vec<i32>,
}

impl ScaleBias {
    /// Scan the whole field once and derive scale and bias per coefficient
    /// channel. Works row by row, so a streaming field is scanned without
    /// ever materializing it.
    pub fn from_field(field: &PolyField) -> Self {
        let k = field.coeff_count();
        let bands = field.bands();

        let mut min = vec![f64::INFINITY; k];
        let mut max = vec![f64::NEG_INFINITY; k];

        let mut scratch = Vec::new();
        for y in 0..field.height() {
            let row = field.row(y, &mut scratch);
            for pixel in row.chunks_exact(bands) {
                for i in 0..k {
                    let v = pixel[3 + i] as f64;
                    if v < min[i] {
                        min[i] = v;
                    }
                    if v > max[i] {
                        max[i] = v;
                    }
                }
            }
        }

        Self::from_extrema(&min, &max)
    }

    /// Derive the constants from known per-channel extrema.
    pub fn from_extrema(min: &[f64], max: &[f64]) -> Self {
        assert_eq!(min.len(), max.len());
        let k = min.len();

        let mut scale = vec![0.0f64; k];
        let mut bias = vec![0i32; k];

        for i in 0..k {
            let range = max[i] - min[i];

            // Power of two just above the range, shifted down by the 8 bits
            // a byte can hold. A constant channel gets the exponent-0 scale.
            let exponent = if range > 0.0 {
                range.log2().ceil() as i32
            } else {
                0
            };
            scale[i] = f64::from(exponent - 8).exp2();

            // bias stays 0 for a channel whose minimum is exactly zero.
            if min[i] < 0.0 {
                bias[i] = (-min[i] / scale[i]).round() as i32 + 1;
                while bias[i] > 255 {
                    scale[i] *= 2.0;
                    bias[i] = (-min[i] / scale[i]).round() as i32 + 1;
                }
            }
            if min[i] > 0.0 {
                while max[i] / scale[i] > 255.0 {
                    scale[i] *= 2.0;
                }
                bias[i] = 0;
            }
        }

        Self { scale, bias }
    }

    /// Number of coefficient channels.
    pub fn len(&self) -> usize {
        self.scale.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scale.is_empty()
    }

    /// Quantize a coefficient of channel `i` to its byte, rounding to
    /// nearest and saturating at the range ends.
    pub fn quantize(&self, i: usize, value: f32) -> u8 {
        (value as f64 / self.scale[i] + self.bias[i] as f64 + 0.5) as u8
    }

    /// Decode a byte of channel `i` back to a coefficient value.
    pub fn dequantize(&self, i: usize, byte: u8) -> f64 {
        (byte as f64 - self.bias[i] as f64) * self.scale[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_range_has_zero_bias() {
        let sb = ScaleBias::from_extrema(&[10.0], &[200.0]);
        assert_eq!(sb.bias[0], 0);
        // Every in-range value must land in a byte.
        assert!(200.0 / sb.scale[0] <= 255.0 + 0.5);
    }

    #[test]
    fn test_negative_minimum_gets_bias() {
        let sb = ScaleBias::from_extrema(&[-100.0], &[155.0]);
        assert!(sb.bias[0] > 0);
        assert!(sb.bias[0] <= 255);

        // The minimum itself must quantize without wrapping below zero.
        let b = sb.quantize(0, -100.0);
        let back = sb.dequantize(0, b);
        assert!((back - (-100.0)).abs() <= sb.scale[0]);
    }

    #[test]
    fn test_zero_minimum_keeps_default_bias() {
        let sb = ScaleBias::from_extrema(&[0.0], &[100.0]);
        assert_eq!(sb.bias[0], 0);
    }

    #[test]
    fn test_constant_channel() {
        // Empty range: exponent falls back to 0, scale to 2^-8.
        let sb = ScaleBias::from_extrema(&[42.0, 0.0], &[42.0, 0.0]);
        assert_eq!(sb.scale[0], (-8.0f64).exp2());
        assert_eq!(sb.scale[1], (-8.0f64).exp2());
        assert_eq!(sb.bias[1], 0);
    }

    #[test]
    fn test_roundtrip_within_one_step() {
        let min = -321.5;
        let max = 489.25;
        let sb = ScaleBias::from_extrema(&[min], &[max]);

        let mut v = min;
        while v <= max {
            let b = sb.quantize(0, v as f32);
            let back = sb.dequantize(0, b);
            assert!(
                (back - v).abs() <= sb.scale[0] + 1e-9,
                "v = {v}, byte = {b}, back = {back}, scale = {}",
                sb.scale[0]
            );
            v += 7.3;
        }
    }

    #[test]
    fn test_bias_overflow_doubles_scale() {
        // range = 1022 gives scale 4 and an initial bias of 256; the
        // doubling loop must bring the bias back into byte range.
        let sb = ScaleBias::from_extrema(&[-1020.0], &[2.0]);
        assert_eq!(sb.scale[0], 8.0);
        assert_eq!(sb.bias[0], 129);

        let b = sb.quantize(0, -1020.0);
        assert!((sb.dequantize(0, b) - (-1020.0)).abs() <= sb.scale[0]);
    }
}
