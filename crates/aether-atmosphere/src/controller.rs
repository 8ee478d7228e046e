//! Owner of the two LUTs and the entry point for renderers.

use std::time::Instant;

use aether_config::{LutCachePolicy, SkyConfig};
use aether_image::{CpuImage, KernelDispatcher, ShaderSim};
use glam::Vec3;

use crate::compositor::{SkyCompositor, SkyProjection, ToneMapPass};
use crate::geometry::ray_sphere_intersect_nearest;
use crate::params::{RenderingParams, SceneSource, StaticScene};
use crate::sky_view::SkyViewLutSim;
use crate::transmittance::{TransmittanceLutSim, sample_transmittance_lut};
use crate::{AtmosphereError, AtmosphereProfile};

/// CPU sky simulator.
///
/// Holds the current [`RenderingParams`], the parameters the LUTs were last
/// built from, and the transmittance and sky-view LUTs themselves. LUTs are
/// allocated once at the configured sizes and are only reallocated when
/// [`SkyAtmosphere::set_config`] changes a size.
///
/// ```no_run
/// use aether_atmosphere::{SkyAtmosphere, StaticScene};
/// use aether_config::SkyConfig;
///
/// let mut sky = SkyAtmosphere::new(SkyConfig::default())?;
/// sky.update(&StaticScene::from_sun_angles(500.0, 10.0, 0.0));
/// let image = sky.create_sky_texture(512, 256)?;
/// assert_eq!(image.width(), 512);
/// # Ok::<(), aether_atmosphere::AtmosphereError>(())
/// ```
#[derive(Debug)]
pub struct SkyAtmosphere {
    config: SkyConfig,
    params: RenderingParams,
    cached: Option<RenderingParams>,
    force_update: bool,
    dispatcher: KernelDispatcher,
    transmittance_lut: CpuImage,
    sky_view_lut: CpuImage,
}

/// Check everything in `config` the simulator depends on.
fn validate_config(config: &SkyConfig) -> Result<(), AtmosphereError> {
    AtmosphereProfile::from(&config.atmosphere).validate()?;

    let sizes = [
        ("transmittance", config.luts.transmittance_size),
        ("sky-view", config.luts.sky_view_size),
    ];
    for (name, [width, height]) in sizes {
        if width == 0 || height == 0 {
            return Err(AtmosphereError::InvalidLutSize {
                name,
                width,
                height,
            });
        }
    }

    let [min, max] = config.render.sky_view_num_samples_min_max;
    if !(min >= 1.0 && min <= max && max.is_finite()) {
        return Err(AtmosphereError::InvalidSampleBounds { min, max });
    }
    Ok(())
}

fn allocate_lut([width, height]: [u32; 2]) -> CpuImage {
    CpuImage::new(width, height)
}

impl SkyAtmosphere {
    /// Validate `config` and allocate zeroed LUTs.
    ///
    /// LUT contents are undefined until the first [`update`](Self::update)
    /// or [`update_luts`](Self::update_luts).
    pub fn new(config: SkyConfig) -> Result<Self, AtmosphereError> {
        validate_config(&config)?;
        let params = RenderingParams::gather(&config, &StaticScene::default());
        Ok(Self {
            dispatcher: KernelDispatcher::new(config.dispatch.worker_count),
            transmittance_lut: allocate_lut(config.luts.transmittance_size),
            sky_view_lut: allocate_lut(config.luts.sky_view_size),
            params,
            cached: None,
            force_update: true,
            config,
        })
    }

    /// Gather parameters from `scene` and rebuild the LUTs if they are stale.
    ///
    /// Under [`LutCachePolicy::Always`] every call rebuilds. Under
    /// [`LutCachePolicy::OnChange`] a rebuild happens only when the gathered
    /// parameters differ from the ones the LUTs were built from. Returns
    /// whether the LUTs were rebuilt.
    pub fn update(&mut self, scene: &impl SceneSource) -> bool {
        self.params = RenderingParams::gather(&self.config, scene);

        let stale = self.force_update
            || match self.config.luts.cache_policy {
                LutCachePolicy::Always => true,
                LutCachePolicy::OnChange => self.cached != Some(self.params),
            };
        if stale {
            self.update_luts();
        }
        stale
    }

    /// Rebuild both LUTs from the current parameters: transmittance first,
    /// then sky-view, which reads it.
    pub fn update_luts(&mut self) {
        let start = Instant::now();

        TransmittanceLutSim::new(self.params.atmosphere)
            .run_sim(&self.dispatcher, &mut self.transmittance_lut);
        SkyViewLutSim {
            params: &self.params,
            transmittance_lut: &self.transmittance_lut,
            mapping: self.config.luts.sky_view_mapping,
        }
        .run_sim(&self.dispatcher, &mut self.sky_view_lut);

        self.cached = Some(self.params);
        self.force_update = false;

        tracing::info!(
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            workers = self.dispatcher.worker_count(),
            "sky LUTs updated"
        );
    }

    fn compositor(&self, projection: SkyProjection) -> SkyCompositor<'_> {
        SkyCompositor {
            params: &self.params,
            transmittance_lut: &self.transmittance_lut,
            sky_view_lut: &self.sky_view_lut,
            mapping: self.config.luts.sky_view_mapping,
            projection,
        }
    }

    /// Untonemapped sky radiance along a world-space view direction,
    /// including the sun disk.
    pub fn sample_sky_color(&self, view_dir: Vec3) -> Vec3 {
        match view_dir.try_normalize() {
            Some(dir) => self.compositor(SkyProjection::LongLat).radiance(dir),
            None => Vec3::ZERO,
        }
    }

    /// Transmittance from the camera to space along `view_dir`; zero when
    /// the ground blocks the ray.
    pub fn sample_sun_transmittance(&self, view_dir: Vec3) -> Vec3 {
        let Some(dir) = view_dir.try_normalize() else {
            return Vec3::ZERO;
        };
        let profile = &self.params.atmosphere;
        let camera = self.params.camera_pos_es();
        if ray_sphere_intersect_nearest(camera, dir, Vec3::ZERO, profile.bottom_radius).is_some() {
            return Vec3::ZERO;
        }
        let height = camera.length();
        sample_transmittance_lut(&self.transmittance_lut, profile, height, dir.dot(camera) / height)
    }

    /// Raw radiance image of the sky under `projection`.
    pub fn render_sky(
        &self,
        width: u32,
        height: u32,
        projection: SkyProjection,
    ) -> Result<CpuImage, AtmosphereError> {
        if width == 0 || height == 0 {
            return Err(AtmosphereError::InvalidImageSize { width, height });
        }
        let mut raw = CpuImage::new(width, height);
        self.compositor(projection).run_sim(&self.dispatcher, &mut raw);
        Ok(raw)
    }

    /// Tonemapped equirectangular image of the whole sky.
    pub fn create_sky_texture(&self, width: u32, height: u32) -> Result<CpuImage, AtmosphereError> {
        let raw = self.render_sky(width, height, SkyProjection::LongLat)?;
        let mut output = CpuImage::new(width, height);
        ToneMapPass {
            raw: &raw,
            exposure: self.params.exposure,
        }
        .run_sim(&self.dispatcher, &mut output);
        Ok(output)
    }

    /// Replace the configuration.
    ///
    /// LUTs are reallocated only if their size changed; the next
    /// [`update`](Self::update) always rebuilds them. On error the current
    /// configuration is kept.
    pub fn set_config(&mut self, config: SkyConfig) -> Result<(), AtmosphereError> {
        validate_config(&config)?;
        if config.luts.transmittance_size != self.config.luts.transmittance_size {
            self.transmittance_lut = allocate_lut(config.luts.transmittance_size);
        }
        if config.luts.sky_view_size != self.config.luts.sky_view_size {
            self.sky_view_lut = allocate_lut(config.luts.sky_view_size);
        }
        self.dispatcher = KernelDispatcher::new(config.dispatch.worker_count);
        self.force_update = true;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &SkyConfig {
        &self.config
    }

    /// Parameters from the most recent [`update`](Self::update).
    pub fn params(&self) -> &RenderingParams {
        &self.params
    }

    pub fn transmittance_lut(&self) -> &CpuImage {
        &self.transmittance_lut
    }

    pub fn sky_view_lut(&self) -> &CpuImage {
        &self.sky_view_lut
    }
}
