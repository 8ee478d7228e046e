//! Scattering phase functions.

use std::f32::consts::PI;

/// Rayleigh phase function, `3 (1 + cos²θ) / 16π`.
pub fn rayleigh_phase(cos_theta: f32) -> f32 {
    3.0 * (1.0 + cos_theta * cos_theta) / (16.0 * PI)
}

/// Normalized Cornette-Shanks variant of the Henyey-Greenstein phase function.
///
/// `k (1 + cos²θ) / (1 + g² + 2g cosθ)^1.5` with `k = 3 (1 - g²) / (8π (2 + g²))`.
/// The sign convention expects `cos_theta` to be the cosine between the
/// *negated* view direction and the light direction, so callers pass
/// `-dot(view, dir2sun)` to get the forward peak toward the sun for `g > 0`.
pub fn mie_phase(g: f32, cos_theta: f32) -> f32 {
    let g2 = g * g;
    let k = 3.0 / (8.0 * PI) * (1.0 - g2) / (2.0 + g2);
    k * (1.0 + cos_theta * cos_theta) / (1.0 + g2 + 2.0 * g * cos_theta).powf(1.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Integrate a phase function over the sphere with a midpoint rule in cosθ.
    fn integrate_sphere(phase: impl Fn(f32) -> f32) -> f32 {
        let steps = 20_000;
        let d_mu = 2.0 / steps as f32;
        (0..steps)
            .map(|i| {
                let mu = -1.0 + (i as f32 + 0.5) * d_mu;
                phase(mu) * 2.0 * PI * d_mu
            })
            .sum()
    }

    #[test]
    fn test_rayleigh_normalized() {
        let total = integrate_sphere(rayleigh_phase);
        assert!((total - 1.0).abs() < 1e-3, "rayleigh integrates to {total}");
    }

    #[test]
    fn test_rayleigh_symmetric() {
        assert_eq!(rayleigh_phase(0.7), rayleigh_phase(-0.7));
        assert!(rayleigh_phase(1.0) > rayleigh_phase(0.0));
    }

    #[test]
    fn test_mie_normalized() {
        for g in [0.0, 0.3, 0.76] {
            let total = integrate_sphere(|mu| mie_phase(g, mu));
            assert!((total - 1.0).abs() < 2e-2, "g={g} integrates to {total}");
        }
    }

    #[test]
    fn test_mie_isotropic_g_matches_rayleigh_shape() {
        // With g = 0 the phase reduces to 3(1 + cos²θ) / 16π.
        assert!((mie_phase(0.0, 0.4) - rayleigh_phase(0.4)).abs() < 1e-7);
    }

    #[test]
    fn test_mie_forward_peak() {
        let g = 0.8;
        // View toward the sun: dot(view, sun) = 1, caller passes -1.
        let toward_sun = mie_phase(g, -1.0);
        let away_from_sun = mie_phase(g, 1.0);
        assert!(toward_sun > 100.0 * away_from_sun);
    }
}
