//! Input photograph loading and cropping.
//!
//! All N photographs must agree on width and height after cropping; the
//! per-pixel generator reads the same coordinate from every one of them.

use crate::fit::FitError;
use crate::io::LightSample;
use image::RgbImage;

/// Region of the input frames to process, in per-mille of the frame
/// (`left = 250` starts a quarter of the way in). The default is the whole
/// frame.
#[derive(Debug, Clone, Copy)]
pub struct Crop {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for Crop {
    fn default() -> Self {
        Self {
            left: 0,
            top: 0,
            width: 1000,
            height: 1000,
        }
    }
}

impl Crop {
    /// Pixel rectangle for a frame of the given size.
    fn to_pixels(self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let scale = |permille: u32, extent: u32| -> u32 {
            (permille as f64 / 1000.0 * extent as f64) as u32
        };
        (
            scale(self.left, width),
            scale(self.top, height),
            scale(self.width, width),
            scale(self.height, height),
        )
    }
}

/// Decode every sample's photograph, apply the crop, and check that the
/// results all share one size.
pub fn load_samples(samples: &[LightSample], crop: Crop) -> Result<Vec<RgbImage>, FitError> {
    let mut images: Vec<RgbImage> = Vec::with_capacity(samples.len());

    println!("reading {} images:", samples.len());

    for (index, sample) in samples.iter().enumerate() {
        let decoded = image::open(&sample.path)?.to_rgb8();

        let (left, top, width, height) = crop.to_pixels(decoded.width(), decoded.height());
        let cropped = image::imageops::crop_imm(&decoded, left, top, width, height).to_image();

        println!(
            "  [{}/{}] {}",
            index + 1,
            samples.len(),
            sample.path.display()
        );

        if let Some(first) = images.first() {
            if cropped.width() != first.width() || cropped.height() != first.height() {
                return Err(FitError::ImageMismatch {
                    path: sample.path.display().to_string(),
                    got_width: cropped.width(),
                    got_height: cropped.height(),
                    want_width: first.width(),
                    want_height: first.height(),
                });
            }
        }

        images.push(cropped);
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use std::path::PathBuf;

    #[test]
    fn test_crop_to_pixels() {
        let crop = Crop {
            left: 250,
            top: 0,
            width: 500,
            height: 1000,
        };
        assert_eq!(crop.to_pixels(400, 100), (100, 0, 200, 100));
    }

    #[test]
    fn test_default_crop_is_full_frame() {
        assert_eq!(Crop::default().to_pixels(640, 480), (0, 0, 640, 480));
    }

    #[test]
    fn test_size_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.png");
        let large = dir.path().join("large.png");
        RgbImage::new(4, 4).save(&small).unwrap();
        RgbImage::new(5, 4).save(&large).unwrap();

        let samples: Vec<LightSample> = [&small, &large]
            .iter()
            .map(|p| LightSample {
                path: PathBuf::from(p),
                direction: Vector3::new(0.0, 0.0, 1.0),
            })
            .collect();

        assert!(matches!(
            load_samples(&samples, Crop::default()),
            Err(FitError::ImageMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_photo_is_fatal() {
        let samples = vec![LightSample {
            path: PathBuf::from("/no/such/photo.png"),
            direction: Vector3::new(0.0, 0.0, 1.0),
        }];
        assert!(load_samples(&samples, Crop::default()).is_err());
    }
}
