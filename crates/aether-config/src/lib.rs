//! Configuration for the Aether sky simulator.
//!
//! Atmosphere coefficients, LUT sizes, and rendering settings persist to
//! disk as a RON file. The offline tool layers CLI overrides on top via
//! clap.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, OutputRequest};
pub use config::{
    AtmosphereConfig, CONFIG_FILE_NAME, DebugConfig, DispatchConfig, LutCachePolicy, LutConfig,
    RenderConfig, SkyConfig, SkyViewMapping, default_config_dir,
};
pub use error::ConfigError;
