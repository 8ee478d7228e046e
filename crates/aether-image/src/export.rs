//! Quantisation of float images to 8-bit RGBA and PNG output.

use std::path::Path;

use glam::Vec4;
use image::RgbaImage;

use crate::{CpuImage, ImageError};

/// Exponent applied when gamma correction is requested on export.
const EXPORT_GAMMA: f32 = 0.455;

impl CpuImage {
    /// Convert to 8-bit RGBA, clamping each channel to `[0, 1]`.
    ///
    /// With `gamma_correct` the color channels (not alpha) are raised to
    /// `0.455` before quantisation.
    pub fn to_rgba8(&self, gamma_correct: bool) -> RgbaImage {
        let mut out = RgbaImage::new(self.width(), self.height());
        for (pixel, texel) in out.pixels_mut().zip(self.texels()) {
            let mut color = texel.clamp(Vec4::ZERO, Vec4::ONE);
            if gamma_correct {
                color = color.truncate().powf(EXPORT_GAMMA).extend(color.w);
            }
            let quantised = color * 255.0;
            pixel.0 = [
                quantised.x as u8,
                quantised.y as u8,
                quantised.z as u8,
                quantised.w as u8,
            ];
        }
        out
    }

    /// Write the image as a PNG file.
    pub fn write_png(&self, path: &Path, gamma_correct: bool) -> Result<(), ImageError> {
        self.to_rgba8(gamma_correct)
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| ImageError::Export {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(
            "Wrote {}x{} image to {}",
            self.width(),
            self.height(),
            path.display()
        );
        Ok(())
    }
}
