//! Compute-shader-like passes that run a per-texel function over an image.

use std::time::Instant;

use glam::{UVec2, Vec2, Vec4};

use crate::{CpuImage, KernelDispatcher};

/// UV of the center of texel `(x, y)` in an image of size `dims`.
pub fn texel_center_uv(x: u32, y: u32, dims: UVec2) -> Vec2 {
    (Vec2::new(x as f32, y as f32) + 0.5) / dims.as_vec2()
}

/// A full-image pass evaluated at texel-center UVs.
///
/// Implementors only describe the per-texel function; [`ShaderSim::run_sim`]
/// fans it out through a [`KernelDispatcher`] and overwrites every texel of
/// the output image.
pub trait ShaderSim: Sync {
    /// Short name used in log output.
    fn label(&self) -> &'static str;

    /// Color of the texel whose center is at `uv`.
    fn shade(&self, uv: Vec2) -> Vec4;

    /// Run the pass over all of `output`.
    fn run_sim(&self, dispatcher: &KernelDispatcher, output: &mut CpuImage) {
        let dims = output.dimensions();
        let start = Instant::now();
        dispatcher.dispatch(output, |x, y| self.shade(texel_center_uv(x, y, dims)));
        tracing::debug!(
            pass = self.label(),
            width = dims.x,
            height = dims.y,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "pass finished"
        );
    }
}
