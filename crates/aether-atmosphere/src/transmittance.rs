//! Transmittance LUT: `(view height, view zenith cosine) -> transmittance to the atmosphere top`.
//!
//! The table is not indexed by angle directly. `v` encodes the distance from
//! the viewer to the horizon and `u` the distance to the atmosphere top,
//! normalized between the shortest (straight up) and longest (along the
//! horizon) such distance. This spends texels where transmittance changes
//! fastest, close to the horizon.
//!
//! The parameterization is evaluated in `f64` internally. Heights are ~6400
//! km, so squaring them in `f32` would lose the sub-meter precision the
//! round trip needs.

use aether_image::{CpuImage, ShaderSim, WrapMode};
use glam::{Vec2, Vec3, Vec4};

use crate::{AtmosphereProfile, SAMPLE_SEGMENT_OFFSET};

/// Raymarch steps per transmittance texel.
pub const TRANSMITTANCE_SAMPLE_COUNT: u32 = 40;

/// Distance from height `view_height` along zenith cosine `mu` to the sphere of `top_radius`.
fn distance_to_top(top_radius: f64, view_height: f64, mu: f64) -> f64 {
    let discriminant = view_height * view_height * (mu * mu - 1.0) + top_radius * top_radius;
    (-view_height * mu + discriminant.max(0.0).sqrt()).max(0.0)
}

/// Map a LUT UV back to `(view_height, view_zenith_cos)`.
pub fn uv_to_transmittance_lut_params(bottom_radius: f32, top_radius: f32, uv: Vec2) -> (f32, f32) {
    let (bottom, top) = (bottom_radius as f64, top_radius as f64);
    let (x_mu, x_r) = (uv.x as f64, uv.y as f64);

    let horizon = (top * top - bottom * bottom).sqrt();
    let rho = horizon * x_r;
    let view_height = (rho * rho + bottom * bottom).sqrt();

    let d_min = top - view_height;
    let d_max = rho + horizon;
    let d = d_min + x_mu * (d_max - d_min);

    let mu = if d == 0.0 {
        1.0
    } else {
        (top * top - view_height * view_height - d * d) / (2.0 * view_height * d)
    };
    (view_height as f32, mu.clamp(-1.0, 1.0) as f32)
}

/// Map `(view_height, view_zenith_cos)` to a LUT UV.
pub fn transmittance_lut_params_to_uv(
    bottom_radius: f32,
    top_radius: f32,
    view_height: f32,
    view_zenith_cos: f32,
) -> Vec2 {
    let (bottom, top) = (bottom_radius as f64, top_radius as f64);
    let view_height = view_height as f64;
    let d = distance_to_top(top, view_height, view_zenith_cos as f64);

    let horizon = (top * top - bottom * bottom).max(0.0).sqrt();
    let rho = (view_height * view_height - bottom * bottom).max(0.0).sqrt();

    let d_min = top - view_height;
    let d_max = rho + horizon;
    let x_mu = (d - d_min) / (d_max - d_min);
    let x_r = rho / horizon;
    Vec2::new(x_mu as f32, x_r as f32)
}

/// Raymarch the optical depth from `(0, 0, view_height)` toward the
/// atmosphere top along zenith cosine `view_zenith_cos` and return
/// `exp(-depth)` per channel.
///
/// The viewer is assumed to be inside the atmosphere. Rays through the
/// planet are marched as if it were transparent; callers handle ground
/// occlusion.
pub fn compute_transmittance_to_sun(
    profile: &AtmosphereProfile,
    view_height: f32,
    view_zenith_cos: f32,
) -> Vec3 {
    let dist = distance_to_top(
        profile.top_radius as f64,
        view_height as f64,
        view_zenith_cos as f64,
    ) as f32;

    let start = Vec3::new(0.0, 0.0, view_height);
    let dir = Vec3::new(
        (1.0 - view_zenith_cos * view_zenith_cos).max(0.0).sqrt(),
        0.0,
        view_zenith_cos,
    );

    let count = TRANSMITTANCE_SAMPLE_COUNT as f32;
    let mut optical_depth = Vec3::ZERO;
    let mut t = 0.0;
    for i in 0..TRANSMITTANCE_SAMPLE_COUNT {
        let new_t = dist * ((i as f32 + SAMPLE_SEGMENT_OFFSET) / count);
        let dt = new_t - t;
        t = new_t;
        let pos = start + t * dir;
        let sample = profile.sample(pos.length() - profile.bottom_radius);
        optical_depth += dt * sample.extinction();
    }

    (-optical_depth).exp()
}

/// Bilinear (clamped) lookup of the transmittance LUT.
pub fn sample_transmittance_lut(
    lut: &CpuImage,
    profile: &AtmosphereProfile,
    view_height: f32,
    view_zenith_cos: f32,
) -> Vec3 {
    let uv = transmittance_lut_params_to_uv(
        profile.bottom_radius,
        profile.top_radius,
        view_height,
        view_zenith_cos,
    );
    lut.sample_bilinear(uv, WrapMode::Clamp).truncate()
}

/// Pass that fills a transmittance LUT.
#[derive(Clone, Copy, Debug)]
pub struct TransmittanceLutSim {
    pub profile: AtmosphereProfile,
}

impl TransmittanceLutSim {
    pub fn new(profile: AtmosphereProfile) -> Self {
        Self { profile }
    }
}

impl ShaderSim for TransmittanceLutSim {
    fn label(&self) -> &'static str {
        "transmittance-lut"
    }

    fn shade(&self, uv: Vec2) -> Vec4 {
        let (view_height, mu) =
            uv_to_transmittance_lut_params(self.profile.bottom_radius, self.profile.top_radius, uv);
        compute_transmittance_to_sun(&self.profile, view_height, mu).extend(1.0)
    }
}

#[cfg(test)]
mod tests {
    use aether_image::KernelDispatcher;

    use super::*;

    const BOTTOM: f32 = 6360.0;
    const TOP: f32 = 6460.0;

    #[test]
    fn test_params_round_trip() {
        let heights = [BOTTOM, BOTTOM + 0.5, BOTTOM + 10.0, BOTTOM + 55.0, TOP - 1.0];
        for h in heights {
            for step in 0..=20 {
                let mu = -1.0 + step as f32 * 0.1;
                let uv = transmittance_lut_params_to_uv(BOTTOM, TOP, h, mu);
                let (h_rt, mu_rt) = uv_to_transmittance_lut_params(BOTTOM, TOP, uv);
                let h_err = (h_rt - h).abs() / (TOP - BOTTOM);
                assert!(h_err < 1e-4, "h {h} -> {h_rt}");
                assert!((mu_rt - mu).abs() < 1e-4, "mu {mu} -> {mu_rt} at h {h}");
            }
        }
    }

    #[test]
    fn test_uv_corners() {
        // Ground looking straight up: shortest path, first row and column.
        let uv = transmittance_lut_params_to_uv(BOTTOM, TOP, BOTTOM, 1.0);
        assert!(uv.x.abs() < 1e-6 && uv.y.abs() < 1e-6);
        // Top of the atmosphere looking along the horizon: last row and column.
        let horizon_mu = -((TOP * TOP - BOTTOM * BOTTOM).sqrt() / TOP);
        let uv = transmittance_lut_params_to_uv(BOTTOM, TOP, TOP, horizon_mu);
        assert!((uv - Vec2::ONE).abs().max_element() < 1e-4);
    }

    #[test]
    fn test_zenith_at_top_is_fully_transparent() {
        let profile = AtmosphereProfile::default();
        assert_eq!(compute_transmittance_to_sun(&profile, TOP, 1.0), Vec3::ONE);
    }

    #[test]
    fn test_transmittance_in_unit_range() {
        let profile = AtmosphereProfile::default();
        for h in [BOTTOM, BOTTOM + 1.0, BOTTOM + 30.0, TOP] {
            for step in 0..=10 {
                let mu = -1.0 + step as f32 * 0.2;
                let t = compute_transmittance_to_sun(&profile, h, mu);
                assert!(t.min_element() >= 0.0 && t.max_element() <= 1.0, "{t} at h {h} mu {mu}");
            }
        }
    }

    #[test]
    fn test_transmittance_decreases_with_path_length() {
        let profile = AtmosphereProfile::default();
        let h = BOTTOM + 1.0;
        let mut previous = Vec3::ONE;
        for mu in [1.0, 0.7, 0.4, 0.2, 0.05, 0.0] {
            let t = compute_transmittance_to_sun(&profile, h, mu);
            assert!(t.cmple(previous).all(), "mu {mu}: {t} > {previous}");
            previous = t;
        }

        // Fixed direction, viewer sliding down the ray: the path only grows.
        let mut previous = Vec3::ONE;
        for h in [TOP - 1.0, BOTTOM + 40.0, BOTTOM + 10.0, BOTTOM + 2.0, BOTTOM] {
            let t = compute_transmittance_to_sun(&profile, h, 1.0);
            assert!(t.cmple(previous).all(), "h {h}: {t} > {previous}");
            previous = t;
        }
    }

    #[test]
    fn test_rayleigh_attenuates_blue_most() {
        let profile = AtmosphereProfile::default();
        let t = compute_transmittance_to_sun(&profile, BOTTOM, 0.1);
        assert!(t.z < t.y && t.y < t.x);
    }

    #[test]
    fn test_lut_matches_direct_evaluation() {
        let profile = AtmosphereProfile::default();
        // Texel centers sit half a texel inside the UV range, so near
        // `mu = 1` the lookup clamps onto a slightly longer path. The
        // configured size keeps that bias under the tolerance.
        let [width, height] = aether_config::LutConfig::default().transmittance_size;
        let mut lut = CpuImage::new(width, height);
        TransmittanceLutSim::new(profile).run_sim(&KernelDispatcher::new(4), &mut lut);

        assert!(lut
            .texels()
            .iter()
            .all(|t| t.truncate().min_element() >= 0.0 && t.max_element() <= 1.0));

        for h in [BOTTOM + 0.3, BOTTOM + 20.0, BOTTOM + 70.0] {
            for mu in [1.0, 0.5, 0.1] {
                let direct = compute_transmittance_to_sun(&profile, h, mu);
                let looked_up = sample_transmittance_lut(&lut, &profile, h, mu);
                assert!(
                    (direct - looked_up).abs().max_element() < 0.02,
                    "h {h} mu {mu}: {direct} vs {looked_up}"
                );
            }
        }
    }
}
