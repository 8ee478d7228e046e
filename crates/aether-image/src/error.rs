//! Image export error types.

use std::path::PathBuf;

/// Errors that can occur when writing a [`CpuImage`](crate::CpuImage) to disk.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// Encoding or writing the PNG failed.
    #[error("failed to write image to {path}: {source}")]
    Export {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying encoder or I/O error.
        #[source]
        source: image::ImageError,
    },
}
