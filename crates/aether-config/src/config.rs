//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "sky.ron";

/// Top-level simulator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkyConfig {
    /// Atmosphere profile coefficients.
    pub atmosphere: AtmosphereConfig,
    /// Lookup table sizes and update policy.
    pub luts: LutConfig,
    /// Sun, camera, and exposure settings.
    pub render: RenderConfig,
    /// CPU dispatch settings.
    pub dispatch: DispatchConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Planet and atmosphere description. Distances in kilometers, coefficients per kilometer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtmosphereConfig {
    /// Planet surface radius.
    pub bottom_radius: f32,
    /// Radius of the top of the atmosphere.
    pub top_radius: f32,
    /// Rayleigh scattering at sea level (RGB).
    pub rayleigh_scattering: [f32; 3],
    /// Mie scattering at sea level, applied to all channels.
    pub mie_scattering: f32,
    /// Mie absorption at sea level, applied to all channels.
    pub mie_absorption: f32,
    /// Henyey-Greenstein asymmetry, in `(-1, 1)`.
    pub mie_phase_g: f32,
    /// Ozone absorption at peak density (RGB).
    pub ozone_absorption: [f32; 3],
    /// Altitude of the ozone density peak.
    pub ozone_mean_height: f32,
    /// Full width of the triangular ozone layer.
    pub ozone_layer_width: f32,
    /// Ground reflectance (RGB). Stored with the profile, not yet integrated.
    pub ground_albedo: [f32; 3],
}

/// Parameterization used for the sky-view LUT.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SkyViewMapping {
    /// Cosines of the relative sun azimuth and the view zenith angle, mapped linearly.
    #[default]
    Linear,
    /// Keeps the horizon at `v = 0.5` and packs rows near it.
    HorizonAware,
}

/// When the controller recomputes its LUTs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum LutCachePolicy {
    /// Recompute on every update request.
    #[default]
    Always,
    /// Recompute only when the gathered rendering parameters differ from the cached ones.
    OnChange,
}

/// Lookup table configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LutConfig {
    /// Transmittance LUT size `[width, height]`.
    pub transmittance_size: [u32; 2],
    /// Sky-view LUT size `[width, height]`.
    pub sky_view_size: [u32; 2],
    /// Sky-view LUT parameterization.
    pub sky_view_mapping: SkyViewMapping,
    /// LUT recomputation policy.
    pub cache_policy: LutCachePolicy,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Exposure multiplier applied before tonemapping.
    pub exposure: f32,
    /// Sun luminance (RGB).
    pub sun_luminance: [f32; 3],
    /// Angular radius of the sun disk in radians.
    pub sun_angular_radius: f32,
    /// Raymarch sample count bounds `[min, max]` for the sky-view LUT.
    pub sky_view_num_samples_min_max: [f32; 2],
    /// Added to the camera's world-space height, in meters.
    pub view_height_offset_m: f32,
}

/// CPU dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Number of row bands (and worker threads) per dispatch. `0` selects
    /// one per logical CPU.
    pub worker_count: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for AtmosphereConfig {
    fn default() -> Self {
        // Mie extinction 4.40e-3 of which 3.996e-3 scatters.
        Self {
            bottom_radius: 6360.0,
            top_radius: 6460.0,
            rayleigh_scattering: [5.802e-3, 13.558e-3, 33.1e-3],
            mie_scattering: 3.996e-3,
            mie_absorption: 4.40e-3 - 3.996e-3,
            mie_phase_g: 0.8,
            ozone_absorption: [0.650e-3, 1.881e-3, 0.085e-3],
            ozone_mean_height: 25.0,
            ozone_layer_width: 30.0,
            ground_albedo: [0.3, 0.3, 0.3],
        }
    }
}

impl Default for LutConfig {
    fn default() -> Self {
        Self {
            transmittance_size: [256, 64],
            sky_view_size: [192, 108],
            sky_view_mapping: SkyViewMapping::default(),
            cache_policy: LutCachePolicy::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            exposure: 10.0,
            sun_luminance: [1.0, 1.0, 1.0],
            sun_angular_radius: 0.004_675,
            sky_view_num_samples_min_max: [4.0, 32.0],
            view_height_offset_m: 0.0,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { worker_count: 8 }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for the simulator, e.g. `~/.config/aether`.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("aether"))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save ---

impl SkyConfig {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: SkyConfig = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = SkyConfig::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `sky.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = SkyConfig::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("bottom_radius: 6360.0"));
        assert!(ron_str.contains("worker_count: 8"));
        assert!(ron_str.contains("sky_view_mapping: Linear"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = SkyConfig::default();
        config.luts.sky_view_mapping = SkyViewMapping::HorizonAware;
        config.luts.cache_policy = LutCachePolicy::OnChange;
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: SkyConfig = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(atmosphere: (top_radius: 6500.0), render: ())";
        let config: SkyConfig = ron::from_str(ron_str).unwrap();
        assert_eq!(config.atmosphere.top_radius, 6500.0);
        assert_eq!(config.atmosphere.bottom_radius, 6360.0);
        assert_eq!(config.luts, LutConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<SkyConfig, _> = ron::from_str("(multi_scattering_size: (32, 32))");
        assert!(result.is_ok());
    }

    #[test]
    fn test_default_mie_absorption_is_extinction_minus_scattering() {
        let atmosphere = AtmosphereConfig::default();
        let extinction = atmosphere.mie_scattering + atmosphere.mie_absorption;
        assert!((extinction - 4.40e-3).abs() < 1e-7);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SkyConfig::default();
        config.render.exposure = 4.0;
        config.luts.sky_view_size = [96, 54];

        config.save(dir.path()).unwrap();
        let loaded = SkyConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = SkyConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(config, SkyConfig::default());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{{not valid}}").unwrap();
        let result = SkyConfig::load_or_create(dir.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
