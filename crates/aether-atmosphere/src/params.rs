//! Rendering parameters gathered from configuration and scene state.

use aether_config::SkyConfig;
use glam::{Vec2, Vec3};

use crate::AtmosphereProfile;
use crate::geometry::{lift_above_ground, ws_to_es};

/// Sun light forward direction used when the scene has no sun.
/// Points straight down, so the sun sits at the zenith.
pub const DEFAULT_SUN_FORWARD: Vec3 = Vec3::new(0.0, 0.0, -1.0);

/// Scene state the simulator reads on every update.
pub trait SceneSource {
    /// World-space position of the active camera, in meters.
    fn camera_position(&self) -> Option<Vec3>;

    /// Forward direction of the sun light, pointing from the sun into the scene.
    fn sun_forward(&self) -> Option<Vec3>;
}

/// Plain-data scene.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StaticScene {
    pub camera_position: Option<Vec3>,
    pub sun_forward: Option<Vec3>,
}

impl StaticScene {
    /// Camera `camera_height_m` above the world origin and a sun at the given
    /// elevation above the horizon and azimuth counter-clockwise from `+X`.
    pub fn from_sun_angles(camera_height_m: f32, sun_elevation_deg: f32, sun_azimuth_deg: f32) -> Self {
        let (elevation, azimuth) = (sun_elevation_deg.to_radians(), sun_azimuth_deg.to_radians());
        let dir2sun = Vec3::new(
            elevation.cos() * azimuth.cos(),
            elevation.cos() * azimuth.sin(),
            elevation.sin(),
        );
        Self {
            camera_position: Some(Vec3::new(0.0, 0.0, camera_height_m)),
            sun_forward: Some(-dir2sun),
        }
    }
}

impl SceneSource for StaticScene {
    fn camera_position(&self) -> Option<Vec3> {
        self.camera_position
    }

    fn sun_forward(&self) -> Option<Vec3> {
        self.sun_forward
    }
}

/// Everything the LUT passes and the compositor read.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderingParams {
    pub atmosphere: AtmosphereProfile,
    /// World space, meters.
    pub camera_pos_ws: Vec3,
    /// Unit vector toward the sun, earth space.
    pub dir2sun: Vec3,
    pub sun_luminance: Vec3,
    pub sky_view_num_samples_min_max: Vec2,
    pub exposure: f32,
    /// Radians.
    pub sun_angular_radius: f32,
}

impl Default for RenderingParams {
    fn default() -> Self {
        Self::gather(&SkyConfig::default(), &StaticScene::default())
    }
}

impl RenderingParams {
    /// Build parameters from the current configuration and scene.
    ///
    /// A scene without a camera puts the viewer at the world origin; one
    /// without a sun uses [`DEFAULT_SUN_FORWARD`].
    pub fn gather(config: &SkyConfig, scene: &impl SceneSource) -> Self {
        let render = &config.render;
        let camera = scene.camera_position().unwrap_or(Vec3::ZERO)
            + Vec3::new(0.0, 0.0, render.view_height_offset_m);
        let forward = scene
            .sun_forward()
            .and_then(Vec3::try_normalize)
            .unwrap_or(DEFAULT_SUN_FORWARD);

        Self {
            atmosphere: AtmosphereProfile::from(&config.atmosphere),
            camera_pos_ws: camera,
            dir2sun: -forward,
            sun_luminance: Vec3::from(render.sun_luminance),
            sky_view_num_samples_min_max: Vec2::from(render.sky_view_num_samples_min_max),
            exposure: render.exposure,
            sun_angular_radius: render.sun_angular_radius,
        }
    }

    /// Camera in earth space, kept at least
    /// [`MIN_VIEW_ALTITUDE_KM`](crate::MIN_VIEW_ALTITUDE_KM) above the ground.
    pub fn camera_pos_es(&self) -> Vec3 {
        let bottom = self.atmosphere.bottom_radius;
        lift_above_ground(ws_to_es(self.camera_pos_ws, bottom), bottom)
    }
}
