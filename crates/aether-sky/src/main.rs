//! Offline sky renderer.
//!
//! Renders a tonemapped equirectangular sky to a PNG file:
//! `cargo run -p aether-sky -- -w 1024 -H 512 -o sky.png --sun-elevation 5`.
//! Settings are loaded from `sky.ron` in the config directory and can be
//! overridden via CLI flags.

use std::process::ExitCode;

use aether_atmosphere::{SkyAtmosphere, StaticScene};
use aether_config::{CliArgs, SkyConfig, default_config_dir};
use clap::Parser;
use tracing::{error, info};

const DEFAULT_CAMERA_HEIGHT_M: f32 = 500.0;
const DEFAULT_SUN_ELEVATION_DEG: f32 = 10.0;
const DEFAULT_SUN_AZIMUTH_DEG: f32 = 0.0;

fn main() -> ExitCode {
    run(CliArgs::parse())
}

fn run(args: CliArgs) -> ExitCode {
    // Checked before anything touches the config directory.
    let request = match args.output_request() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let config_dir = args.config.clone().or_else(|| default_config_dir().ok());

    let mut config = match &config_dir {
        Some(dir) => SkyConfig::load_or_create(dir).unwrap_or_else(|e| {
            eprintln!("Failed to load config: {e}, using defaults");
            SkyConfig::default()
        }),
        None => SkyConfig::default(),
    };
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.as_ref().map(|dir| dir.join("logs"));
    aether_log::init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));

    info!(
        "Rendering {}x{} sky to {}",
        request.width,
        request.height,
        request.path.display()
    );

    let scene = StaticScene::from_sun_angles(
        args.camera_height.unwrap_or(DEFAULT_CAMERA_HEIGHT_M),
        args.sun_elevation.unwrap_or(DEFAULT_SUN_ELEVATION_DEG),
        args.sun_azimuth.unwrap_or(DEFAULT_SUN_AZIMUTH_DEG),
    );

    let mut sky = match SkyAtmosphere::new(config) {
        Ok(sky) => sky,
        Err(e) => {
            error!("Invalid sky configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    sky.update(&scene);

    let image = match sky.create_sky_texture(request.width, request.height) {
        Ok(image) => image,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = image.write_png(&request.path, false) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_output_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("config");
        let args = CliArgs {
            width: Some(64),
            height: Some(32),
            config: Some(config_dir.clone()),
            ..Default::default()
        };

        assert_eq!(run(args), ExitCode::FAILURE);
        assert!(!config_dir.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_zero_width_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let args = CliArgs {
            width: Some(0),
            height: Some(32),
            output: Some(dir.path().join("sky.png")),
            config: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        assert_eq!(run(args), ExitCode::FAILURE);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
