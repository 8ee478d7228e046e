//! Sky-view LUT: in-scattered radiance indexed by view direction relative to the sun.
//!
//! A texel only depends on the view zenith angle and on the azimuth between
//! the view and the sun, both measured in the viewer's horizontal plane. The
//! LUT is filled from canonical proxies: the viewer on the `+Z` axis and the
//! sun at azimuth zero in the `XZ` plane. One table then serves every camera
//! heading.

use std::f32::consts::PI;

use aether_config::SkyViewMapping;
use aether_image::{CpuImage, ShaderSim};
use glam::{Vec2, Vec3, Vec4};

use crate::geometry::{compute_raymarch_interval, project_to_plane, ray_sphere_intersect_nearest};
use crate::phase::{mie_phase, rayleigh_phase};
use crate::transmittance::sample_transmittance_lut;
use crate::{AtmosphereProfile, RenderingParams, SAMPLE_SEGMENT_OFFSET};

/// Horizontal projections shorter than this are treated as degenerate.
const MIN_HORIZONTAL_LENGTH: f32 = 1e-6;
/// Below this extinction a segment integrates as `S * dt`.
const MIN_EXTINCTION: f32 = 1e-9;

/// Canonical viewer, view direction and sun direction reconstructed from a sky-view UV.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyViewProxy {
    /// `(0, 0, view height)`.
    pub camera_pos: Vec3,
    pub view_dir: Vec3,
    /// Sun at azimuth zero, same zenith angle as the real sun.
    pub dir2sun: Vec3,
}

/// Unit zenith at `camera_pos_es`, `+Z` at the planet center.
fn zenith_at(camera_pos_es: Vec3) -> Vec3 {
    camera_pos_es.try_normalize().unwrap_or(Vec3::Z)
}

/// Normalized projection of `v` onto the plane perpendicular to `zenith`.
///
/// Vectors parallel to the zenith have no horizontal bearing; they all map
/// to the same fixed axis so the sun overhead and a view straight up still
/// produce a finite, deterministic azimuth.
fn horizontal_bearing(v: Vec3, zenith: Vec3) -> Vec3 {
    let horizontal = project_to_plane(v, zenith);
    if horizontal.length() < MIN_HORIZONTAL_LENGTH {
        zenith.any_orthonormal_vector()
    } else {
        horizontal.normalize()
    }
}

/// Angles describing the visible horizon from `view_height`.
struct Horizon {
    /// Angle between the horizon and the nadir.
    beta: f32,
    /// Angle between the zenith and the horizon, `PI - beta`.
    zenith_horizon_angle: f32,
}

impl Horizon {
    fn new(view_height: f32, bottom_radius: f32) -> Self {
        let to_horizon = (view_height * view_height - bottom_radius * bottom_radius)
            .max(0.0)
            .sqrt();
        let beta = (to_horizon / view_height).clamp(-1.0, 1.0).acos();
        Self {
            beta,
            zenith_horizon_angle: PI - beta,
        }
    }
}

/// Map a view direction to sky-view LUT UV.
///
/// `intersect_ground` selects the lower half of the table under
/// [`SkyViewMapping::HorizonAware`] and is ignored by the linear mapping.
pub fn sky_view_params_to_uv(
    camera_pos_es: Vec3,
    dir2sun: Vec3,
    view_dir: Vec3,
    bottom_radius: f32,
    intersect_ground: bool,
    mapping: SkyViewMapping,
) -> Vec2 {
    let zenith = zenith_at(camera_pos_es);
    let view_sun_cos = horizontal_bearing(view_dir, zenith)
        .dot(horizontal_bearing(dir2sun, zenith))
        .clamp(-1.0, 1.0);
    let view_zenith_cos = view_dir.dot(zenith).clamp(-1.0, 1.0);

    match mapping {
        SkyViewMapping::Linear => Vec2::new(
            -view_sun_cos * 0.5 + 0.5,
            -view_zenith_cos * 0.5 + 0.5,
        ),
        SkyViewMapping::HorizonAware => {
            let horizon = Horizon::new(camera_pos_es.length(), bottom_radius);
            let view_zenith_angle = view_zenith_cos.acos();
            let v = if intersect_ground {
                let coord = (view_zenith_angle - horizon.zenith_horizon_angle) / horizon.beta;
                coord.clamp(0.0, 1.0).sqrt() * 0.5 + 0.5
            } else {
                let coord = (view_zenith_angle / horizon.zenith_horizon_angle).clamp(0.0, 1.0);
                (1.0 - (1.0 - coord).sqrt()) * 0.5
            };
            let u = (-view_sun_cos * 0.5 + 0.5).sqrt();
            Vec2::new(u, v)
        }
    }
}

/// Reconstruct the canonical proxies for a sky-view LUT UV.
pub fn uv_to_sky_view_params(
    uv: Vec2,
    bottom_radius: f32,
    camera_pos_es: Vec3,
    dir2sun: Vec3,
    mapping: SkyViewMapping,
) -> SkyViewProxy {
    let view_height = camera_pos_es.length();

    let (view_sun_cos, view_zenith_cos) = match mapping {
        SkyViewMapping::Linear => (1.0 - uv.x * 2.0, 1.0 - uv.y * 2.0),
        SkyViewMapping::HorizonAware => {
            let horizon = Horizon::new(view_height, bottom_radius);
            let view_zenith_cos = if uv.y < 0.5 {
                let coord = 1.0 - 2.0 * uv.y;
                let coord = 1.0 - coord * coord;
                (horizon.zenith_horizon_angle * coord).cos()
            } else {
                let coord = uv.y * 2.0 - 1.0;
                (horizon.zenith_horizon_angle + horizon.beta * coord * coord).cos()
            };
            (1.0 - 2.0 * uv.x * uv.x, view_zenith_cos)
        }
    };

    let sun_zenith_cos = dir2sun.dot(zenith_at(camera_pos_es)).clamp(-1.0, 1.0);
    let view_zenith_sin = (1.0 - view_zenith_cos * view_zenith_cos).max(0.0).sqrt();
    let view_sun_sin = (1.0 - view_sun_cos * view_sun_cos).max(0.0).sqrt();

    SkyViewProxy {
        camera_pos: Vec3::new(0.0, 0.0, view_height),
        view_dir: Vec3::new(
            view_zenith_sin * view_sun_cos,
            view_zenith_sin * view_sun_sin,
            view_zenith_cos,
        )
        .normalize(),
        dir2sun: Vec3::new(
            (1.0 - sun_zenith_cos * sun_zenith_cos).max(0.0).sqrt(),
            0.0,
            sun_zenith_cos,
        ),
    }
}

/// `S * (1 - exp(-σt dt)) / σt` per channel, the exact integral of a
/// constant source through a constant medium over one segment.
fn integrate_segment(source: Vec3, extinction: Vec3, segment_transmittance: Vec3, dt: f32) -> Vec3 {
    let analytic = (source - source * segment_transmittance) / extinction;
    Vec3::select(
        extinction.cmpgt(Vec3::splat(MIN_EXTINCTION)),
        analytic,
        source * dt,
    )
}

/// Single-scattered radiance arriving at `camera_pos_es` from `view_dir`.
///
/// Raymarches the atmosphere segment returned by
/// [`compute_raymarch_interval`] with a sample count between
/// `num_samples_min_max.x` (looking straight up) and `.y` (at and below the
/// horizon). Samples are spread quadratically, denser near the viewer.
/// Returns zero if the ray never enters the atmosphere.
pub fn compute_sky_radiance(
    profile: &AtmosphereProfile,
    transmittance_lut: &CpuImage,
    camera_pos_es: Vec3,
    view_dir: Vec3,
    dir2sun: Vec3,
    sun_luminance: Vec3,
    num_samples_min_max: Vec2,
) -> Vec3 {
    let Some(interval) = compute_raymarch_interval(
        camera_pos_es,
        view_dir,
        Vec3::ZERO,
        profile.bottom_radius,
        profile.top_radius,
    ) else {
        return Vec3::ZERO;
    };

    let start = camera_pos_es + interval.t_min * view_dir;
    let t_max = interval.length();

    let view_sun_cos = view_dir.dot(dir2sun);
    let rayleigh = rayleigh_phase(view_sun_cos);
    let mie = mie_phase(profile.mie_phase_g, -view_sun_cos);

    let upness = 1.0 - zenith_at(camera_pos_es).dot(view_dir).clamp(0.0, 1.0);
    let (min_samples, max_samples) = (num_samples_min_max.x, num_samples_min_max.y);
    let num_samples = (min_samples + (max_samples - min_samples) * upness)
        .floor()
        .max(1.0);

    let mut radiance = Vec3::ZERO;
    let mut throughput = Vec3::ONE;
    for i in 0..num_samples as u32 {
        let t0 = (i as f32 / num_samples).powi(2) * t_max;
        let t1 = (((i + 1) as f32 / num_samples).powi(2) * t_max).min(t_max);
        let t = t0 + (t1 - t0) * SAMPLE_SEGMENT_OFFSET;
        let dt = t1 - t0;

        let pos = start + t * view_dir;
        let height = pos.length();
        let medium = profile.sample(height - profile.bottom_radius);

        let to_sun = sample_transmittance_lut(
            transmittance_lut,
            profile,
            height,
            pos.dot(dir2sun) / height,
        );
        let in_earth_shadow =
            ray_sphere_intersect_nearest(pos, dir2sun, Vec3::ZERO, profile.bottom_radius).is_some();
        let sun_visibility = if in_earth_shadow { 0.0 } else { 1.0 };

        let phase_scattering = medium.mie_scattering * mie + medium.rayleigh_scattering * rayleigh;
        let source = sun_luminance * sun_visibility * to_sun * phase_scattering;

        let extinction = medium.extinction();
        let segment_transmittance = (-extinction * dt).exp();
        radiance += throughput * integrate_segment(source, extinction, segment_transmittance, dt);
        throughput *= segment_transmittance;
    }

    radiance
}

/// Pass that fills a sky-view LUT from a finished transmittance LUT.
#[derive(Clone, Copy, Debug)]
pub struct SkyViewLutSim<'a> {
    pub params: &'a RenderingParams,
    pub transmittance_lut: &'a CpuImage,
    pub mapping: SkyViewMapping,
}

impl ShaderSim for SkyViewLutSim<'_> {
    fn label(&self) -> &'static str {
        "sky-view-lut"
    }

    fn shade(&self, uv: Vec2) -> Vec4 {
        let params = self.params;
        let proxy = uv_to_sky_view_params(
            uv,
            params.atmosphere.bottom_radius,
            params.camera_pos_es(),
            params.dir2sun,
            self.mapping,
        );
        compute_sky_radiance(
            &params.atmosphere,
            self.transmittance_lut,
            proxy.camera_pos,
            proxy.view_dir,
            proxy.dir2sun,
            params.sun_luminance,
            params.sky_view_num_samples_min_max,
        )
        .extend(1.0)
    }
}
