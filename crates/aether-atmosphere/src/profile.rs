//! Atmosphere profile and per-altitude medium sampling.

use aether_config::AtmosphereConfig;
use glam::Vec3;

use crate::AtmosphereError;

/// Rayleigh density falls off as `exp(-h / 8 km)`.
const RAYLEIGH_SCALE_HEIGHT_KM: f32 = 8.0;
/// Mie density falls off as `exp(-h / 1.2 km)`.
const MIE_SCALE_HEIGHT_KM: f32 = 1.2;

/// Physical description of a planet's atmosphere.
///
/// Radii in kilometers, coefficients per kilometer at peak density.
/// Immutable for the duration of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtmosphereProfile {
    /// Planet surface radius.
    pub bottom_radius: f32,
    /// Top of the atmosphere.
    pub top_radius: f32,
    /// Rayleigh scattering at sea level. Rayleigh does not absorb.
    pub rayleigh_scattering: Vec3,
    pub mie_scattering: Vec3,
    pub mie_absorption: Vec3,
    /// Henyey-Greenstein asymmetry in `(-1, 1)`.
    pub mie_phase_g: f32,
    /// Ozone absorbs but does not scatter.
    pub ozone_absorption: Vec3,
    pub ozone_mean_height: f32,
    pub ozone_layer_width: f32,
    /// Not used by the single-scattering integrator.
    pub ground_albedo: Vec3,
}

/// Scattering and absorption of the medium at one altitude.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AtmosphereSample {
    pub rayleigh_scattering: Vec3,
    pub mie_scattering: Vec3,
    /// Rayleigh plus Mie scattering.
    pub scattering: Vec3,
    /// Mie plus ozone absorption.
    pub absorption: Vec3,
}

impl AtmosphereSample {
    /// Scattering plus absorption.
    pub fn extinction(&self) -> Vec3 {
        self.scattering + self.absorption
    }
}

impl Default for AtmosphereProfile {
    fn default() -> Self {
        Self::from(&AtmosphereConfig::default())
    }
}

impl From<&AtmosphereConfig> for AtmosphereProfile {
    fn from(config: &AtmosphereConfig) -> Self {
        Self {
            bottom_radius: config.bottom_radius,
            top_radius: config.top_radius,
            rayleigh_scattering: Vec3::from(config.rayleigh_scattering),
            mie_scattering: Vec3::splat(config.mie_scattering),
            mie_absorption: Vec3::splat(config.mie_absorption),
            mie_phase_g: config.mie_phase_g,
            ozone_absorption: Vec3::from(config.ozone_absorption),
            ozone_mean_height: config.ozone_mean_height,
            ozone_layer_width: config.ozone_layer_width,
            ground_albedo: Vec3::from(config.ground_albedo),
        }
    }
}

impl AtmosphereProfile {
    /// Check `0 < bottom_radius < top_radius`, non-negative coefficients,
    /// and `g` in `(-1, 1)`.
    pub fn validate(&self) -> Result<(), AtmosphereError> {
        if !(self.bottom_radius > 0.0 && self.bottom_radius < self.top_radius)
            || !self.top_radius.is_finite()
        {
            return Err(AtmosphereError::InvalidRadii {
                bottom: self.bottom_radius,
                top: self.top_radius,
            });
        }

        let vectors = [
            ("rayleigh_scattering", self.rayleigh_scattering),
            ("mie_scattering", self.mie_scattering),
            ("mie_absorption", self.mie_absorption),
            ("ozone_absorption", self.ozone_absorption),
        ];
        for (name, value) in vectors {
            if !value.is_finite() || value.min_element() < 0.0 {
                return Err(AtmosphereError::InvalidCoefficient { name });
            }
        }
        if !(self.ozone_layer_width >= 0.0 && self.ozone_layer_width.is_finite()) {
            return Err(AtmosphereError::InvalidCoefficient {
                name: "ozone_layer_width",
            });
        }

        if !(self.mie_phase_g > -1.0 && self.mie_phase_g < 1.0) {
            return Err(AtmosphereError::InvalidMiePhaseG(self.mie_phase_g));
        }
        Ok(())
    }

    /// Medium properties at `height_km` above the ground.
    ///
    /// Heights below the ground are treated as ground level.
    pub fn sample(&self, height_km: f32) -> AtmosphereSample {
        let height_km = height_km.max(0.0);

        let rayleigh_density = (-height_km / RAYLEIGH_SCALE_HEIGHT_KM).exp();
        let mie_density = (-height_km / MIE_SCALE_HEIGHT_KM).exp();
        let ozone_density = self.ozone_density(height_km);

        let rayleigh_scattering = rayleigh_density * self.rayleigh_scattering;
        let mie_scattering = mie_density * self.mie_scattering;
        AtmosphereSample {
            rayleigh_scattering,
            mie_scattering,
            scattering: rayleigh_scattering + mie_scattering,
            absorption: mie_density * self.mie_absorption + ozone_density * self.ozone_absorption,
        }
    }

    /// Triangular profile: 1 at the mean height, 0 at half the layer width away.
    fn ozone_density(&self, height_km: f32) -> f32 {
        let half_width = self.ozone_layer_width * 0.5;
        if half_width <= 0.0 {
            return 0.0;
        }
        let dist = (height_km - self.ozone_mean_height).abs();
        (half_width - dist).max(0.0) / half_width
    }
}
