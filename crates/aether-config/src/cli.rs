//! Command-line argument parsing for the offline sky tool.

use std::path::PathBuf;

use clap::Parser;

use crate::{ConfigError, SkyConfig};

/// Aether sky renderer command-line arguments.
///
/// `--width`, `--height`, and `--output` are required to render; the rest
/// override settings loaded from `sky.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "aether-sky", about = "Render a physically based sky to a PNG file")]
pub struct CliArgs {
    /// Output image width.
    #[arg(short, long)]
    pub width: Option<u32>,

    /// Output image height.
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Output PNG path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exposure multiplier.
    #[arg(long)]
    pub exposure: Option<f32>,

    /// Camera height above the ground in meters.
    #[arg(long)]
    pub camera_height: Option<f32>,

    /// Sun elevation above the horizon in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub sun_elevation: Option<f32>,

    /// Sun azimuth in degrees, counter-clockwise from +X.
    #[arg(long, allow_negative_numbers = true)]
    pub sun_azimuth: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Validated output target of a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRequest {
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
}

impl CliArgs {
    /// Check that every argument needed to produce an image is present.
    pub fn output_request(&self) -> Result<OutputRequest, ConfigError> {
        let path = self
            .output
            .clone()
            .ok_or(ConfigError::MissingArgument("output"))?;
        let width = self
            .width
            .filter(|w| *w > 0)
            .ok_or(ConfigError::MissingArgument("width"))?;
        let height = self
            .height
            .filter(|h| *h > 0)
            .ok_or(ConfigError::MissingArgument("height"))?;
        Ok(OutputRequest {
            width,
            height,
            path,
        })
    }
}

impl SkyConfig {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(exposure) = args.exposure {
            self.render.exposure = exposure;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let args = CliArgs::try_parse_from([
            "aether-sky",
            "-w",
            "512",
            "-H",
            "256",
            "-o",
            "sky.png",
            "--sun-elevation",
            "-2.5",
        ])
        .unwrap();
        let request = args.output_request().unwrap();
        assert_eq!(request.width, 512);
        assert_eq!(request.height, 256);
        assert_eq!(request.path, PathBuf::from("sky.png"));
        assert_eq!(args.sun_elevation, Some(-2.5));
    }

    #[test]
    fn test_missing_output_is_rejected() {
        let args = CliArgs::try_parse_from(["aether-sky", "--width", "64", "--height", "32"]).unwrap();
        assert!(matches!(
            args.output_request(),
            Err(ConfigError::MissingArgument("output"))
        ));
    }

    #[test]
    fn test_missing_or_zero_dimensions_are_rejected() {
        let args = CliArgs {
            output: Some(PathBuf::from("out.png")),
            height: Some(32),
            ..Default::default()
        };
        assert!(matches!(
            args.output_request(),
            Err(ConfigError::MissingArgument("width"))
        ));

        let args = CliArgs {
            output: Some(PathBuf::from("out.png")),
            width: Some(64),
            height: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            args.output_request(),
            Err(ConfigError::MissingArgument("height"))
        ));
    }

    #[test]
    fn test_cli_override() {
        let mut config = SkyConfig::default();
        let args = CliArgs {
            exposure: Some(2.0),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.render.exposure, 2.0);
        assert_eq!(config.debug.log_level, "debug");
        // Non-overridden fields retain defaults
        assert_eq!(config.luts.transmittance_size, [256, 64]);
    }

    #[test]
    fn test_cli_no_override() {
        let defaults = SkyConfig::default();
        let mut config = SkyConfig::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, defaults);
    }
}
