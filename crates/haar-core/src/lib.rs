//! Core primitives for Viola-Jones style object detection with Haar-like
//! features and a staged cascade of decision stumps.
//!
//! # Overview
//!
//! The crate is organized leaf-first:
//!
//! - [`integral`] – summed-area tables (intensity and squared intensity) built
//!   from an interleaved 8-bit pixel buffer, with O(1) region sums.
//! - [`feature`] – the six Haar feature shapes and their variance-normalized
//!   response over a detection window.
//! - [`stump`] – weak classifiers (decision stumps) and their binary vote.
//! - [`cascade`] – the immutable stump bank and the attentional cascade that
//!   accepts or rejects a single window.
//! - [`detect`] – exhaustive multi-scale window search on top of the cascade.
//! - [`merge`] – greedy per-axis clustering of raw detections.
//!
//! A detection window is [`WINDOW_SIZE`] units on a side at scale 1 and grows
//! linearly with the scale factor; feature geometry and stump thresholds are
//! scaled accordingly, so the integral images are built once per frame.
//!
//! # Features
//!
//! - `rayon` – scans the rows of each scale in parallel. Results are
//!   concatenated in row-major order, so the output is identical to the
//!   sequential scan.
//! - `tracing` – instruments the search entry points and emits spans for the
//!   scan and merge phases.

pub mod cascade;
pub mod detect;
pub mod feature;
pub mod integral;
pub mod merge;
pub mod stump;

pub use crate::cascade::{Cascade, CascadeOutcome, CHECKPOINTS, MAX_STUMPS};
pub use crate::detect::{
    find_faces, find_faces_u8, find_faces_with_trace, scan_windows, SearchResult,
};
pub use crate::feature::{FeatureShape, HaarFeature};
pub use crate::integral::{IntegralImages, SumGrid};
pub use crate::merge::merge_detections;
pub use crate::stump::{Polarity, Stump};

/// Side length of the base (scale 1) detection window, in grid units.
pub const WINDOW_SIZE: u32 = 24;

/// Tunable parameters for the multi-scale search and detection merging.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchParams {
    /// Base window stride at scale 1; the effective stride is
    /// `floor(step_size * scale)`.
    pub step_size: f64,
    /// Largest scale factor searched (inclusive).
    pub max_scale: f64,
    /// Additive increment between successive scale factors.
    pub scale_step: f64,
    /// Per-axis distance below which two detections fall in the same cluster.
    pub merge_radius: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            step_size: 1.5,
            max_scale: 5.0,
            scale_step: 0.25,
            merge_radius: 0.75 * WINDOW_SIZE as f64,
        }
    }
}

impl SearchParams {
    /// Create a new parameter set with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn with_max_scale(mut self, max_scale: f64) -> Self {
        self.max_scale = max_scale;
        self
    }

    pub fn with_scale_step(mut self, scale_step: f64) -> Self {
        self.scale_step = scale_step;
        self
    }

    pub fn with_merge_radius(mut self, merge_radius: f64) -> Self {
        self.merge_radius = merge_radius;
        self
    }

    /// Scale factors visited by the search, in ascending order.
    ///
    /// Starts at 1.0 and adds `scale_step` while the factor stays within
    /// `max_scale`. A non-positive step yields only the first scale.
    pub fn scales(&self) -> impl Iterator<Item = f64> + '_ {
        let mut next = Some(1.0f64);
        std::iter::from_fn(move || {
            let s = next?;
            if s > self.max_scale {
                next = None;
                return None;
            }
            next = if self.scale_step > 0.0 {
                Some(s + self.scale_step)
            } else {
                None
            };
            Some(s)
        })
    }
}

/// A window accepted by the full cascade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Window top-left corner in the coordinate space of the search.
    pub x: u32,
    pub y: u32,
    /// Scale factor the window was evaluated at (>= 1).
    pub scale_factor: f64,
    /// Signed cascade margin (sum of weighted votes).
    pub confidence: f64,
}

impl Detection {
    /// Side length of the detection window in search coordinates.
    #[inline]
    pub fn side(&self) -> f64 {
        WINDOW_SIZE as f64 * self.scale_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scales_step_by_a_quarter_up_to_five() {
        let params = SearchParams::default();
        let scales: Vec<f64> = params.scales().collect();
        assert_eq!(scales.len(), 17);
        assert_eq!(scales[0], 1.0);
        assert_eq!(scales[1], 1.25);
        assert_eq!(*scales.last().unwrap(), 5.0);
    }

    #[test]
    fn non_positive_scale_step_yields_base_scale_only() {
        let params = SearchParams::default().with_scale_step(0.0);
        assert_eq!(params.scales().collect::<Vec<_>>(), vec![1.0]);
    }

    #[test]
    fn max_scale_below_one_searches_nothing() {
        let params = SearchParams::default().with_max_scale(0.5);
        assert_eq!(params.scales().count(), 0);
    }

    #[test]
    fn default_merge_radius_is_three_quarters_of_window() {
        assert_eq!(SearchParams::default().merge_radius, 18.0);
    }
}
