//! Validation errors for atmosphere profiles and simulator settings.

/// Errors raised when building a simulator from invalid settings.
///
/// The simulation itself never fails; these are rejected up front.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AtmosphereError {
    /// Radii must satisfy `0 < bottom < top`.
    #[error("invalid atmosphere radii: bottom {bottom} km, top {top} km")]
    InvalidRadii {
        /// Planet surface radius.
        bottom: f32,
        /// Atmosphere top radius.
        top: f32,
    },

    /// A scattering or absorption coefficient is negative or not finite.
    #[error("coefficient {name} must be finite and non-negative")]
    InvalidCoefficient {
        /// Profile field name.
        name: &'static str,
    },

    /// The Henyey-Greenstein asymmetry must lie strictly inside `(-1, 1)`.
    #[error("mie phase g must be in (-1, 1), got {0}")]
    InvalidMiePhaseG(f32),

    /// A LUT dimension is zero.
    #[error("{name} LUT size {width}x{height} must be non-zero")]
    InvalidLutSize {
        /// Which table.
        name: &'static str,
        width: u32,
        height: u32,
    },

    /// A requested output image has a zero dimension.
    #[error("output image size {width}x{height} must be non-zero")]
    InvalidImageSize { width: u32, height: u32 },

    /// Raymarch sample bounds must satisfy `1 <= min <= max`.
    #[error("sky-view sample bounds [{min}, {max}] must satisfy 1 <= min <= max")]
    InvalidSampleBounds {
        min: f32,
        max: f32,
    },
}
