//! CPU reference simulator for physically based sky rendering.
//!
//! Single-scattering light transport through a planetary atmosphere
//! (Rayleigh, Mie, ozone) evaluated into two lookup tables:
//!
//! - the transmittance LUT, `(view height, view zenith cosine) -> transmittance to the atmosphere top`
//! - the sky-view LUT, `(relative sun azimuth, view zenith) -> in-scattered radiance`
//!
//! [`SkyAtmosphere`] owns both tables, rebuilds them when rendering
//! parameters are gathered, and answers per-ray queries. [`SkyCompositor`]
//! and [`ToneMapPass`] assemble final images from the tables.
//!
//! Earth space (ES) has the planet center at the origin, `+Z` up at the
//! world origin, and distances in kilometers. World space is in meters.

mod compositor;
mod controller;
mod error;
mod geometry;
mod params;
mod phase;
mod profile;
mod sky_view;
mod transmittance;

pub use compositor::{
    SkyCompositor, SkyProjection, ToneMapPass, WHITE_POINT, tonemap, uv_to_view_dir_longlat,
    view_dir_to_uv_longlat,
};
pub use controller::SkyAtmosphere;
pub use error::AtmosphereError;
pub use geometry::{
    MIN_VIEW_ALTITUDE_KM, RaymarchInterval, compute_raymarch_interval, project_to_plane,
    ray_sphere_intersect_nearest, ws_to_es,
};
pub use params::{DEFAULT_SUN_FORWARD, RenderingParams, SceneSource, StaticScene};
pub use phase::{mie_phase, rayleigh_phase};
pub use profile::{AtmosphereProfile, AtmosphereSample};
pub use sky_view::{
    SkyViewLutSim, SkyViewProxy, compute_sky_radiance, sky_view_params_to_uv,
    uv_to_sky_view_params,
};
pub use transmittance::{
    TRANSMITTANCE_SAMPLE_COUNT, TransmittanceLutSim, compute_transmittance_to_sun,
    sample_transmittance_lut, transmittance_lut_params_to_uv, uv_to_transmittance_lut_params,
};

/// Position of each raymarch sample inside its segment, as a fraction of the segment length.
pub const SAMPLE_SEGMENT_OFFSET: f32 = 0.3;
