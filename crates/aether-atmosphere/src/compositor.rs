//! Final image assembly: sky-view lookups, the sun disk, and tonemapping.

use std::f32::consts::{PI, TAU};

use aether_config::SkyViewMapping;
use aether_image::{CpuImage, ShaderSim, WrapMode};
use glam::{Vec2, Vec3, Vec4};

use crate::RenderingParams;
use crate::geometry::ray_sphere_intersect_nearest;
use crate::sky_view::sky_view_params_to_uv;
use crate::transmittance::sample_transmittance_lut;

/// Reference white the tonemap normalizes against.
pub const WHITE_POINT: Vec3 = Vec3::new(1.08241, 0.96756, 0.95003);

const DISPLAY_GAMMA: f32 = 2.2;

/// Equirectangular UV to view direction.
///
/// `u` sweeps azimuth clockwise (seen from above) starting at `-X` for
/// `u = 0`, through `+X` at `u = 0.5`. `v = 0` is the zenith and `v = 1`
/// the nadir.
pub fn uv_to_view_dir_longlat(uv: Vec2) -> Vec3 {
    let theta = (uv.x - 0.5) * TAU;
    let phi = (uv.y - 0.5) * PI;
    let (azimuth, elevation) = (-theta, -phi);
    Vec3::new(
        elevation.cos() * azimuth.cos(),
        elevation.cos() * azimuth.sin(),
        elevation.sin(),
    )
}

/// Inverse of [`uv_to_view_dir_longlat`].
pub fn view_dir_to_uv_longlat(dir: Vec3) -> Vec2 {
    let phi = dir.y.atan2(dir.x);
    let theta = dir.z.clamp(-1.0, 1.0).asin();
    Vec2::new(-phi / TAU + 0.5, -theta / PI + 0.5)
}

/// Filmic exposure curve followed by gamma encoding.
///
/// `pow(1 - exp(-raw / WHITE_POINT * exposure), 1 / 2.2)`
pub fn tonemap(raw: Vec3, exposure: f32) -> Vec3 {
    let base = Vec3::ONE - (-raw / WHITE_POINT * exposure).exp();
    base.max(Vec3::ZERO).powf(1.0 / DISPLAY_GAMMA)
}

/// How output pixels map to view directions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SkyProjection {
    /// Whole sky, equirectangular.
    #[default]
    LongLat,
    /// Pinhole camera. `vertical_fov` in radians, `aspect` is width over height.
    Perspective {
        forward: Vec3,
        up: Vec3,
        vertical_fov: f32,
        aspect: f32,
    },
}

impl SkyProjection {
    /// Unit view direction through the output pixel at `uv` (`v` grows downward).
    pub fn view_dir(&self, uv: Vec2) -> Vec3 {
        match *self {
            SkyProjection::LongLat => uv_to_view_dir_longlat(uv),
            SkyProjection::Perspective {
                forward,
                up,
                vertical_fov,
                aspect,
            } => {
                let forward = forward.try_normalize().unwrap_or(Vec3::X);
                let right = forward
                    .cross(up)
                    .try_normalize()
                    .unwrap_or_else(|| forward.any_orthonormal_vector());
                let up = right.cross(forward);
                let half_height = (vertical_fov * 0.5).tan();
                let ndc = uv * 2.0 - Vec2::ONE;
                (forward + right * (ndc.x * half_height * aspect) - up * (ndc.y * half_height))
                    .normalize()
            }
        }
    }
}

/// Radiance of the sky (and sun disk) per view direction, read from finished LUTs.
#[derive(Clone, Copy, Debug)]
pub struct SkyCompositor<'a> {
    pub params: &'a RenderingParams,
    pub transmittance_lut: &'a CpuImage,
    pub sky_view_lut: &'a CpuImage,
    pub mapping: SkyViewMapping,
    pub projection: SkyProjection,
}

impl SkyCompositor<'_> {
    /// Untonemapped radiance seen along `view_dir`.
    ///
    /// Within [`RenderingParams::sun_angular_radius`] of the sun the sun's
    /// luminance, attenuated by the atmosphere, is added unless the ground
    /// is in the way.
    pub fn radiance(&self, view_dir: Vec3) -> Vec3 {
        let params = self.params;
        let profile = &params.atmosphere;
        let camera = params.camera_pos_es();

        let intersect_ground =
            ray_sphere_intersect_nearest(camera, view_dir, Vec3::ZERO, profile.bottom_radius)
                .is_some();
        let uv = sky_view_params_to_uv(
            camera,
            params.dir2sun,
            view_dir,
            profile.bottom_radius,
            intersect_ground,
            self.mapping,
        );
        let mut radiance = self
            .sky_view_lut
            .sample_bilinear(uv, WrapMode::Clamp)
            .truncate();

        if !intersect_ground && view_dir.dot(params.dir2sun) > params.sun_angular_radius.cos() {
            let zenith = camera.normalize();
            let to_top = sample_transmittance_lut(
                self.transmittance_lut,
                profile,
                camera.length(),
                view_dir.dot(zenith),
            );
            radiance += to_top * params.sun_luminance;
        }
        radiance
    }
}

impl ShaderSim for SkyCompositor<'_> {
    fn label(&self) -> &'static str {
        "sky-compositor"
    }

    fn shade(&self, uv: Vec2) -> Vec4 {
        self.radiance(self.projection.view_dir(uv)).extend(1.0)
    }
}

/// Exposure and tonemap over a raw radiance image.
#[derive(Clone, Copy, Debug)]
pub struct ToneMapPass<'a> {
    pub raw: &'a CpuImage,
    pub exposure: f32,
}

impl ShaderSim for ToneMapPass<'_> {
    fn label(&self) -> &'static str {
        "tonemap"
    }

    fn shade(&self, uv: Vec2) -> Vec4 {
        let raw = self.raw.sample_bilinear(uv, WrapMode::Clamp).truncate();
        tonemap(raw, self.exposure).extend(1.0)
    }
}
