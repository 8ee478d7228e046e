//! Parallel per-pixel kernel evaluation over row bands.
//!
//! The image is split into contiguous bands of whole rows and each band is
//! handed to its own scoped OS thread. Band heights differ by at most one
//! row. Bands never overlap, so workers write
//! through disjoint `&mut` slices and need no locking. Threads are spawned
//! per dispatch and joined before [`KernelDispatcher::dispatch`] returns.

use std::ops::Range;
use std::time::Instant;

use glam::Vec4;

use crate::CpuImage;

/// Number of row bands used by [`KernelDispatcher::default`].
pub const DEFAULT_WORKER_COUNT: usize = 8;

/// Evaluates `(x, y) -> Vec4` kernels across a fixed number of workers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelDispatcher {
    worker_count: usize,
}

impl Default for KernelDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_COUNT)
    }
}

impl KernelDispatcher {
    /// Create a dispatcher that splits work into `worker_count` bands.
    /// A count of zero selects one band per logical CPU.
    pub fn new(worker_count: usize) -> Self {
        let worker_count = match worker_count {
            0 => num_cpus::get().max(1),
            n => n,
        };
        Self { worker_count }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Evaluate `kernel` once for every texel of `image` and store the result.
    ///
    /// Blocks until every band has finished. The order in which pixels are
    /// evaluated is unspecified. A panicking kernel propagates the panic to
    /// the caller after the remaining workers have been joined; the image
    /// contents are unspecified in that case.
    pub fn dispatch<K>(&self, image: &mut CpuImage, kernel: K)
    where
        K: Fn(u32, u32) -> Vec4 + Sync,
    {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let ranges = band_rows(height, self.worker_count);
        let bands = ranges.len();
        let kernel = &kernel;

        let start = Instant::now();
        std::thread::scope(|scope| {
            let mut rest = image.texels_mut();
            for (band, rows) in ranges.into_iter().enumerate() {
                let (texels, tail) = std::mem::take(&mut rest).split_at_mut(rows.len() * width);
                rest = tail;
                let first_row = rows.start;
                std::thread::Builder::new()
                    .name(format!("kernel-band-{band}"))
                    .spawn_scoped(scope, move || {
                        for (offset, row) in texels.chunks_mut(width).enumerate() {
                            let y = (first_row + offset) as u32;
                            for (x, texel) in row.iter_mut().enumerate() {
                                *texel = kernel(x as u32, y);
                            }
                        }
                    })
                    .expect("Failed to spawn kernel dispatch worker thread");
            }
        });

        tracing::debug!(
            width,
            height,
            bands,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "kernel dispatch finished"
        );
    }
}

/// Split `0..height` into `min(bands, height)` contiguous ranges. The first
/// `height % bands` ranges take one extra row.
fn band_rows(height: usize, bands: usize) -> Vec<Range<usize>> {
    let bands = bands.min(height).max(1);
    let (base, extra) = (height / bands, height % bands);
    let mut start = 0;
    (0..bands)
        .map(|band| {
            let len = base + usize::from(band < extra);
            let rows = start..start + len;
            start += len;
            rows
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_kernel_runs_once_per_pixel() {
        let (width, height) = (37, 23);
        let counters: Vec<AtomicU32> = (0..width * height).map(|_| AtomicU32::new(0)).collect();
        let mut image = CpuImage::new(width, height);

        KernelDispatcher::new(8).dispatch(&mut image, |x, y| {
            counters[(y * width + x) as usize].fetch_add(1, Ordering::Relaxed);
            Vec4::ONE
        });

        assert!(counters.iter().all(|c| c.load(Ordering::Relaxed) == 1));
        assert!(image.texels().iter().all(|t| *t == Vec4::ONE));
    }

    #[test]
    fn test_every_texel_written_with_its_coordinates() {
        let mut image = CpuImage::new(16, 9);
        KernelDispatcher::default().dispatch(&mut image, |x, y| {
            Vec4::new(x as f32, y as f32, 0.0, 1.0)
        });
        for y in 0..9 {
            for x in 0..16 {
                assert_eq!(image.load_texel(x, y), Vec4::new(x as f32, y as f32, 0.0, 1.0));
            }
        }
    }

    #[test]
    fn test_more_workers_than_rows() {
        let mut image = CpuImage::new(5, 3);
        KernelDispatcher::new(64).dispatch(&mut image, |x, y| Vec4::splat((x + y) as f32));
        assert_eq!(image.load_texel(4, 2), Vec4::splat(6.0));
    }

    #[test]
    fn test_single_worker_matches_parallel() {
        let kernel = |x: u32, y: u32| Vec4::new((x * 3) as f32, (y * 7) as f32, 1.0, 0.5);
        let mut serial = CpuImage::new(31, 17);
        let mut parallel = CpuImage::new(31, 17);
        KernelDispatcher::new(1).dispatch(&mut serial, kernel);
        KernelDispatcher::new(5).dispatch(&mut parallel, kernel);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_zero_workers_uses_logical_cpus() {
        assert_eq!(KernelDispatcher::new(0).worker_count(), num_cpus::get().max(1));
        assert_eq!(KernelDispatcher::new(3).worker_count(), 3);
    }

    #[test]
    fn test_band_rows_spread_remainder() {
        let rows = band_rows(9, 8);
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0], 0..2);
        assert!(rows[1..].iter().all(|r| r.len() == 1));
        assert_eq!(rows.last().map(|r| r.end), Some(9));

        assert_eq!(band_rows(3, 64).len(), 3);
        assert_eq!(band_rows(16, 8).iter().map(|r| r.len()).collect::<Vec<_>>(), vec![2; 8]);
    }

    #[test]
    fn test_uses_every_configured_band() {
        let names = Mutex::new(HashSet::new());
        let mut image = CpuImage::new(4, 9);
        KernelDispatcher::new(8).dispatch(&mut image, |x, y| {
            if let Some(name) = std::thread::current().name() {
                names.lock().unwrap().insert(name.to_string());
            }
            Vec4::new(x as f32, y as f32, 0.0, 1.0)
        });
        assert_eq!(names.into_inner().unwrap().len(), 8);
        assert_eq!(image.load_texel(3, 8), Vec4::new(3.0, 8.0, 0.0, 1.0));
    }
}
