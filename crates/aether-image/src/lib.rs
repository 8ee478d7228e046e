//! CPU-side float images and a parallel per-pixel dispatcher.
//!
//! [`CpuImage`] is a row-major RGBA32F buffer with bilinear sampling.
//! [`KernelDispatcher`] evaluates a pure `(x, y) -> Vec4` kernel over an
//! image on a fixed number of worker threads, and [`ShaderSim`] wraps that
//! into a compute-shader-like pass driven by texel-center UVs.

mod cpu_image;
mod dispatch;
mod error;
mod export;
mod shader;

pub use cpu_image::{CpuImage, WrapMode};
pub use dispatch::{DEFAULT_WORKER_COUNT, KernelDispatcher};
pub use error::ImageError;
pub use shader::{ShaderSim, texel_center_uv};
