//! Row-major RGBA32F image with texel access and bilinear sampling.

use glam::{UVec2, Vec2, Vec4};

/// Fractional texel offsets within this many ULPs of the texel coordinate
/// snap onto the texel center.
///
/// UVs produced as `(x + 0.5) / width` do not always map back to an exact
/// texel center in `f32`; without the snap a lookup at a texel center would
/// pick up a one-ULP share of its neighbour.
const SUBTEXEL_SNAP_ULPS: f32 = 4.0;

/// Boundary policy applied to UVs before bilinear filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    /// UV components are clamped to `[0, 1]`.
    #[default]
    Clamp,
    /// UV components are reduced with `fract(|uv|) * sign(uv)`.
    ///
    /// This mirrors negative UVs about the origin instead of wrapping them
    /// periodically, so `-0.25` stays `-0.25` and ends up on the first
    /// column. LUT consumers rely on this exact behavior.
    Wrap,
}

/// A 2D buffer of 4-channel float texels.
///
/// Texel `(x, y)` lives at index `y * width + x`. Images never change size;
/// a different resolution means allocating a new image.
#[derive(Clone, Debug, PartialEq)]
pub struct CpuImage {
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
}

impl CpuImage {
    /// Allocate a zero-filled image.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(
            width > 0 && height > 0,
            "image dimensions must be non-zero, got {width}x{height}"
        );
        Self {
            width,
            height,
            texels: vec![Vec4::ZERO; width as usize * height as usize],
        }
    }

    /// Wrap an existing texel buffer.
    ///
    /// # Panics
    ///
    /// Panics if the buffer length does not equal `width * height` or a
    /// dimension is zero.
    pub fn from_texels(width: u32, height: u32, texels: Vec<Vec4>) -> Self {
        assert!(width > 0 && height > 0, "image dimensions must be non-zero");
        assert_eq!(
            texels.len(),
            width as usize * height as usize,
            "texel buffer does not match {width}x{height}"
        );
        Self {
            width,
            height,
            texels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` as a vector.
    pub fn dimensions(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    /// All texels in row-major order.
    pub fn texels(&self) -> &[Vec4] {
        &self.texels
    }

    pub(crate) fn texels_mut(&mut self) -> &mut [Vec4] {
        &mut self.texels
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(
            x < self.width && y < self.height,
            "texel ({x}, {y}) outside {}x{}",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }

    /// Overwrite a single texel. Requires `x < width` and `y < height`.
    pub fn store_texel(&mut self, x: u32, y: u32, color: Vec4) {
        let index = self.index(x, y);
        self.texels[index] = color;
    }

    /// Read a single texel. Requires `x < width` and `y < height`.
    pub fn load_texel(&self, x: u32, y: u32) -> Vec4 {
        self.texels[self.index(x, y)]
    }

    /// Set every texel to `color`.
    pub fn fill(&mut self, color: Vec4) {
        self.texels.fill(color);
    }

    /// Bilinearly filtered lookup at `uv`, texel centers at `(i + 0.5) / size`.
    ///
    /// Neighbour indices are clamped to the image in both wrap modes, so the
    /// outermost row and column never read past the buffer.
    pub fn sample_bilinear(&self, uv: Vec2, wrap: WrapMode) -> Vec4 {
        let uv = match wrap {
            WrapMode::Clamp => uv.clamp(Vec2::ZERO, Vec2::ONE),
            WrapMode::Wrap => uv.abs().fract() * uv.signum(),
        };

        let coords = uv * self.dimensions().as_vec2() - Vec2::splat(0.5);
        let mut base = coords.floor();
        let mut frac = coords - base;
        let snap = (coords.abs() + Vec2::ONE) * (SUBTEXEL_SNAP_ULPS * f32::EPSILON);
        if frac.x < snap.x {
            frac.x = 0.0;
        } else if frac.x > 1.0 - snap.x {
            base.x += 1.0;
            frac.x = 0.0;
        }
        if frac.y < snap.y {
            frac.y = 0.0;
        } else if frac.y > 1.0 - snap.y {
            base.y += 1.0;
            frac.y = 0.0;
        }

        let max_x = self.width as i64 - 1;
        let max_y = self.height as i64 - 1;
        let x0 = base.x as i64;
        let y0 = base.y as i64;
        let x0c = x0.clamp(0, max_x) as u32;
        let x1c = (x0 + 1).clamp(0, max_x) as u32;
        let y0c = y0.clamp(0, max_y) as u32;
        let y1c = (y0 + 1).clamp(0, max_y) as u32;

        let top = self
            .load_texel(x0c, y0c)
            .lerp(self.load_texel(x1c, y0c), frac.x);
        let bottom = self
            .load_texel(x0c, y1c)
            .lerp(self.load_texel(x1c, y1c), frac.x);
        top.lerp(bottom, frac.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> CpuImage {
        let mut image = CpuImage::new(4, 3);
        for y in 0..3 {
            for x in 0..4 {
                image.store_texel(x, y, Vec4::new(x as f32, y as f32, (x * y) as f32, 1.0));
            }
        }
        image
    }

    fn center_uv(image: &CpuImage, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) / image.width() as f32,
            (y as f32 + 0.5) / image.height() as f32,
        )
    }

    #[test]
    fn test_store_and_load() {
        let mut image = CpuImage::new(2, 2);
        image.store_texel(1, 0, Vec4::new(0.1, 0.2, 0.3, 0.4));
        assert_eq!(image.load_texel(1, 0), Vec4::new(0.1, 0.2, 0.3, 0.4));
        assert_eq!(image.load_texel(0, 1), Vec4::ZERO);
        assert_eq!(image.texels()[1], Vec4::new(0.1, 0.2, 0.3, 0.4));
    }

    #[test]
    fn test_bilinear_exact_at_texel_centers() {
        let image = checker();
        for y in 0..image.height() {
            for x in 0..image.width() {
                let uv = center_uv(&image, x, y);
                assert_eq!(
                    image.sample_bilinear(uv, WrapMode::Clamp),
                    image.load_texel(x, y)
                );
                assert_eq!(
                    image.sample_bilinear(uv, WrapMode::Wrap),
                    image.load_texel(x, y)
                );
            }
        }
    }

    #[test]
    fn test_bilinear_exact_for_odd_sizes() {
        let mut image = CpuImage::new(7, 5);
        for y in 0..5 {
            for x in 0..7 {
                image.store_texel(x, y, Vec4::splat((x * 10 + y) as f32 * 0.37));
            }
        }
        for y in 0..5 {
            for x in 0..7 {
                let uv = center_uv(&image, x, y);
                assert_eq!(
                    image.sample_bilinear(uv, WrapMode::Clamp),
                    image.load_texel(x, y)
                );
            }
        }
    }

    #[test]
    fn test_bilinear_midpoint_blends_neighbours() {
        let image = checker();
        // Halfway between texel (1, 0) and (2, 0).
        let uv = Vec2::new(2.0 / 4.0, 0.5 / 3.0);
        let sampled = image.sample_bilinear(uv, WrapMode::Clamp);
        assert!((sampled.x - 1.5).abs() < 1e-6);
        assert!(sampled.y.abs() < 1e-6);
    }

    #[test]
    fn test_bilinear_blends_small_offsets_from_center() {
        let mut image = CpuImage::new(2, 1);
        image.store_texel(1, 0, Vec4::ONE);
        // 5e-5 of a texel to the right of the first center.
        let uv = Vec2::new((0.5 + 5e-5) / 2.0, 0.5);
        let sampled = image.sample_bilinear(uv, WrapMode::Clamp);
        assert!(sampled.x > 0.0);
        assert!((sampled.x - 5e-5).abs() < 1e-6, "{sampled}");
    }

    #[test]
    fn test_bilinear_exact_for_lut_sized_images() {
        let mut image = CpuImage::new(192, 108);
        for y in 0..108 {
            for x in 0..192 {
                image.store_texel(x, y, Vec4::new(x as f32, y as f32, 0.0, 1.0));
            }
        }
        for (x, y) in [(0, 0), (77, 13), (131, 99), (191, 107)] {
            let uv = center_uv(&image, x, y);
            assert_eq!(image.sample_bilinear(uv, WrapMode::Clamp), image.load_texel(x, y));
        }
    }

    #[test]
    fn test_clamp_mode_saturates_outside_range() {
        let image = checker();
        let far = image.sample_bilinear(Vec2::new(5.0, -3.0), WrapMode::Clamp);
        assert_eq!(far, image.load_texel(3, 0));
    }

    #[test]
    fn test_wrap_mode_reduces_positive_uv() {
        let image = checker();
        let wrapped = image.sample_bilinear(Vec2::new(1.0 + 0.625, 0.5), WrapMode::Wrap);
        let direct = image.sample_bilinear(Vec2::new(0.625, 0.5), WrapMode::Wrap);
        assert_eq!(wrapped, direct);
    }

    #[test]
    fn test_wrap_mode_mirrors_negative_uv() {
        let image = checker();
        // -1.25 reduces to -0.25 rather than 0.75, which lands left of the
        // first texel center and clamps onto column 0.
        let mirrored = image.sample_bilinear(Vec2::new(-1.25, 0.5), WrapMode::Wrap);
        let periodic = image.sample_bilinear(Vec2::new(0.75, 0.5), WrapMode::Wrap);
        assert_eq!(mirrored.x, 0.0);
        assert_ne!(mirrored, periodic);
    }

    #[test]
    #[should_panic]
    fn test_zero_sized_image_rejected() {
        let _ = CpuImage::new(0, 4);
    }
}
