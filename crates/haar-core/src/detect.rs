//! Exhaustive multi-scale window search driven by the cascade.
use crate::cascade::{Cascade, CascadeOutcome, CHECKPOINTS};
use crate::integral::IntegralImages;
use crate::merge::merge_detections;
use crate::{Detection, SearchParams, WINDOW_SIZE};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
#[cfg(feature = "tracing")]
use tracing::{debug_span, instrument};

/// Timed detection outcome with cascade statistics.
#[derive(Clone, Debug)]
pub struct SearchResult {
    /// Merged detections.
    pub detections: Vec<Detection>,
    /// Number of windows accepted by the cascade before merging.
    pub raw_count: usize,
    /// Number of windows evaluated across all scales.
    pub windows: usize,
    /// Rejection count per checkpoint (indexed like [`CHECKPOINTS`]).
    pub rejected_at: [usize; CHECKPOINTS.len()],
    /// Time spent building the integral images (milliseconds).
    pub integral_ms: f64,
    /// Time spent scanning windows (milliseconds).
    pub scan_ms: f64,
    /// Time spent merging raw detections (milliseconds).
    pub merge_ms: f64,
}

#[derive(Clone, Copy, Debug, Default)]
struct ScanStats {
    windows: usize,
    rejected_at: [usize; CHECKPOINTS.len()],
}

impl ScanStats {
    fn absorb(&mut self, other: &ScanStats) {
        self.windows += other.windows;
        for (a, b) in self.rejected_at.iter_mut().zip(other.rejected_at.iter()) {
            *a += b;
        }
    }
}

/// Window geometry for one scale.
#[derive(Clone, Copy, Debug)]
struct ScaleGrid {
    scale: f64,
    window: u32,
    stride: u32,
    x_end: u32,
    y_end: u32,
}

impl ScaleGrid {
    fn new(scale: f64, params: &SearchParams, w: usize, h: usize) -> Self {
        let window = (WINDOW_SIZE as f64 * scale).floor() as u32;
        // a stride below one pixel would never advance
        let stride = ((params.step_size * scale).floor() as u32).max(1);
        Self {
            scale,
            window,
            stride,
            x_end: (w as u32).saturating_sub(window),
            y_end: (h as u32).saturating_sub(window),
        }
    }

    fn rows(&self) -> u32 {
        self.y_end.div_ceil(self.stride)
    }

    fn scan_row(
        &self,
        ii: &IntegralImages,
        cascade: &Cascade,
        y: u32,
    ) -> (Vec<Detection>, ScanStats) {
        let mut out = Vec::new();
        let mut stats = ScanStats::default();
        for x in (0..self.x_end).step_by(self.stride as usize) {
            stats.windows += 1;
            match cascade.evaluate(ii, x, y, self.scale) {
                CascadeOutcome::Accepted { score } => out.push(Detection {
                    x,
                    y,
                    scale_factor: self.scale,
                    confidence: score,
                }),
                CascadeOutcome::Rejected { stage, .. } => stats.rejected_at[stage] += 1,
            }
        }
        (out, stats)
    }
}

fn scan_all(
    ii: &IntegralImages,
    cascade: &Cascade,
    params: &SearchParams,
) -> (Vec<Detection>, ScanStats) {
    let (w, h) = (ii.width(), ii.height());
    let mut detections = Vec::new();
    let mut stats = ScanStats::default();

    for scale in params.scales() {
        let grid = ScaleGrid::new(scale, params, w, h);

        #[cfg(feature = "rayon")]
        let rows: Vec<(Vec<Detection>, ScanStats)> = (0..grid.rows())
            .into_par_iter()
            .map(|r| grid.scan_row(ii, cascade, r * grid.stride))
            .collect();

        #[cfg(not(feature = "rayon"))]
        let rows: Vec<(Vec<Detection>, ScanStats)> = (0..grid.rows())
            .map(|r| grid.scan_row(ii, cascade, r * grid.stride))
            .collect();

        for (mut row, row_stats) in rows {
            detections.append(&mut row);
            stats.absorb(&row_stats);
        }
    }

    (detections, stats)
}

/// Run the cascade on every window of every scale and return the accepted
/// windows, unmerged.
///
/// Order is ascending scale, then row-major window position, regardless of
/// whether the `rayon` feature is enabled.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(ii, cascade, params),
        fields(w = ii.width(), h = ii.height(), stumps = cascade.len())
    )
)]
pub fn scan_windows(
    ii: &IntegralImages,
    cascade: &Cascade,
    params: &SearchParams,
) -> Vec<Detection> {
    scan_all(ii, cascade, params).0
}

/// Sequential variant of [`scan_windows`] that can be abandoned.
///
/// `cancel` is polled between window evaluations; once it reads `true` the
/// partial detection list is dropped and `None` is returned.
pub fn scan_windows_cancellable(
    ii: &IntegralImages,
    cascade: &Cascade,
    params: &SearchParams,
    cancel: &AtomicBool,
) -> Option<Vec<Detection>> {
    let (w, h) = (ii.width(), ii.height());
    let mut detections = Vec::new();

    for scale in params.scales() {
        let grid = ScaleGrid::new(scale, params, w, h);
        for y in (0..grid.y_end).step_by(grid.stride as usize) {
            for x in (0..grid.x_end).step_by(grid.stride as usize) {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                if let CascadeOutcome::Accepted { score } = cascade.evaluate(ii, x, y, scale) {
                    detections.push(Detection {
                        x,
                        y,
                        scale_factor: scale,
                        confidence: score,
                    });
                }
            }
        }
    }

    Some(detections)
}

/// Scan all windows and merge overlapping hits with
/// [`SearchParams::merge_radius`].
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(ii, cascade, params), fields(stumps = cascade.len()))
)]
pub fn find_faces(ii: &IntegralImages, cascade: &Cascade, params: &SearchParams) -> Vec<Detection> {
    #[cfg(feature = "tracing")]
    let scan_span = debug_span!("scan").entered();
    let raw = scan_windows(ii, cascade, params);
    #[cfg(feature = "tracing")]
    drop(scan_span);

    #[cfg(feature = "tracing")]
    let _merge_span = debug_span!("merge", raw = raw.len()).entered();
    merge_detections(raw, params.merge_radius)
}

/// Detect objects in an interleaved 8-bit frame.
///
/// This is a convenience that combines:
/// - integral image construction
/// - the multi-scale cascade scan
/// - per-axis detection merging
pub fn find_faces_u8(
    pixels: &[u8],
    w: usize,
    h: usize,
    channels: usize,
    cascade: &Cascade,
    params: &SearchParams,
) -> Vec<Detection> {
    let ii = IntegralImages::from_pixels(pixels, w, h, channels);
    find_faces(&ii, cascade, params)
}

/// Same as [`find_faces_u8`], additionally reporting per-phase timings and
/// cascade statistics.
pub fn find_faces_with_trace(
    pixels: &[u8],
    w: usize,
    h: usize,
    channels: usize,
    cascade: &Cascade,
    params: &SearchParams,
) -> SearchResult {
    let integral_started = Instant::now();
    let ii = IntegralImages::from_pixels(pixels, w, h, channels);
    let integral_ms = integral_started.elapsed().as_secs_f64() * 1000.0;

    let scan_started = Instant::now();
    let (raw, stats) = scan_all(&ii, cascade, params);
    let scan_ms = scan_started.elapsed().as_secs_f64() * 1000.0;

    let raw_count = raw.len();
    let merge_started = Instant::now();
    let detections = merge_detections(raw, params.merge_radius);
    let merge_ms = merge_started.elapsed().as_secs_f64() * 1000.0;

    SearchResult {
        detections,
        raw_count,
        windows: stats.windows,
        rejected_at: stats.rejected_at,
        integral_ms,
        scan_ms,
        merge_ms,
    }
}
