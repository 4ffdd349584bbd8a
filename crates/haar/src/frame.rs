//! Per-frame detection driver.
//!
//! A [`FaceDetector`] owns the integral-image storage (reused across frames of
//! the same size) and a shared, immutable [`Cascade`]. Each call resamples the
//! input to the fixed detection grid, runs the engine, drops detections at or
//! below the confidence threshold and maps the survivors back to input
//! coordinates.

use crate::image::ColorPixel;
use haar_core::detect::scan_windows_cancellable;
use haar_core::{
    find_faces, merge_detections, Cascade, Detection, IntegralImages, SearchParams, WINDOW_SIZE,
};
use image::imageops::{resize, FilterType};
use image::ImageBuffer;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Host-level detection settings.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorParams {
    pub search: SearchParams,
    /// Width of the grid the engine runs on.
    pub detection_width: u32,
    /// Height of the grid the engine runs on.
    pub detection_height: u32,
    /// Detections must score strictly above this to be reported.
    pub confidence_threshold: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            search: SearchParams::default(),
            detection_width: 240,
            detection_height: 135,
            confidence_threshold: 300.0,
        }
    }
}

impl DetectorParams {
    pub fn with_search(mut self, search: SearchParams) -> Self {
        self.search = search;
        self
    }

    pub fn with_detection_grid(mut self, width: u32, height: u32) -> Self {
        self.detection_width = width;
        self.detection_height = height;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}

/// A detection mapped to the coordinate space of the input frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayDetection {
    /// Top-left corner in input pixels.
    pub x: f64,
    pub y: f64,
    /// Side of the square detection window in input pixels.
    pub side: f64,
    /// Scale factor the window was found at on the detection grid.
    pub scale_factor: f64,
    pub confidence: f64,
}

impl DisplayDetection {
    /// Map a detection-grid hit into input coordinates, where
    /// `feed_to_input` is `input_width / detection_width`.
    pub fn from_detection(d: &Detection, feed_to_input: f64) -> Self {
        Self {
            x: d.x as f64 * feed_to_input,
            y: d.y as f64 * feed_to_input,
            side: WINDOW_SIZE as f64 * d.scale_factor * feed_to_input,
            scale_factor: d.scale_factor,
            confidence: d.confidence,
        }
    }
}

/// Frame-by-frame face detector with reusable buffers.
pub struct FaceDetector {
    cascade: Arc<Cascade>,
    params: DetectorParams,
    integral: IntegralImages,
}

impl FaceDetector {
    pub fn new(cascade: Arc<Cascade>, params: DetectorParams) -> Self {
        log_cascade(&cascade);
        Self {
            cascade,
            params,
            integral: IntegralImages::new(),
        }
    }

    /// Replace the stump bank. The next frame uses the new bank in full.
    pub fn set_cascade(&mut self, cascade: Arc<Cascade>) {
        log_cascade(&cascade);
        self.cascade = cascade;
    }

    pub fn cascade(&self) -> &Arc<Cascade> {
        &self.cascade
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    pub fn set_params(&mut self, params: DetectorParams) {
        self.params = params;
    }

    fn prepare(&mut self, pixels: &[u8], w: usize, h: usize, channels: usize) {
        if self.integral.width() != w || self.integral.height() != h {
            info!("allocating integral images {w}x{h}");
        }
        self.integral.rebuild(pixels, w, h, channels);
    }

    /// Run the engine on a frame already at detection resolution.
    ///
    /// Returns merged detections in frame coordinates, before confidence
    /// filtering.
    pub fn detect_frame(
        &mut self,
        pixels: &[u8],
        w: usize,
        h: usize,
        channels: usize,
    ) -> Vec<Detection> {
        self.prepare(pixels, w, h, channels);
        find_faces(&self.integral, &self.cascade, &self.params.search)
    }

    /// Like [`FaceDetector::detect_frame`], but gives up between window
    /// evaluations once `cancel` is set, returning `None`.
    pub fn detect_frame_cancellable(
        &mut self,
        pixels: &[u8],
        w: usize,
        h: usize,
        channels: usize,
        cancel: &AtomicBool,
    ) -> Option<Vec<Detection>> {
        self.prepare(pixels, w, h, channels);
        let search = &self.params.search;
        let raw = scan_windows_cancellable(&self.integral, &self.cascade, search, cancel)?;
        Some(merge_detections(raw, self.params.search.merge_radius))
    }

    /// Full per-frame pipeline on an arbitrary-size image: resample to the
    /// detection grid, detect, threshold, and remap to `img` coordinates.
    pub fn detect_image<P>(&mut self, img: &ImageBuffer<P, Vec<u8>>) -> Vec<DisplayDetection>
    where
        P: ColorPixel + 'static,
    {
        let (dw, dh) = (self.params.detection_width, self.params.detection_height);
        if img.width() == 0 || dw == 0 || dh == 0 {
            return Vec::new();
        }

        let grid = if img.dimensions() == (dw, dh) {
            None
        } else {
            Some(resize(img, dw, dh, FilterType::Triangle))
        };
        let frame = grid.as_ref().unwrap_or(img);

        let detections = self.detect_frame(
            frame.as_raw(),
            dw as usize,
            dh as usize,
            P::CHANNEL_COUNT as usize,
        );

        let feed_to_input = img.width() as f64 / dw as f64;
        let threshold = self.params.confidence_threshold;
        let out: Vec<DisplayDetection> = detections
            .iter()
            .filter(|d| d.confidence > threshold)
            .map(|d| DisplayDetection::from_detection(d, feed_to_input))
            .collect();

        if !detections.is_empty() {
            debug!(
                "detected {} faces ({} above threshold {})",
                detections.len(),
                out.len(),
                threshold
            );
        }
        out
    }
}

fn log_cascade(cascade: &Cascade) {
    if cascade.is_empty() {
        warn!("stump bank is empty; no faces will be detected");
    } else {
        info!("initialized {} stumps for face detection", cascade.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haar_core::{FeatureShape, HaarFeature, Polarity, Stump};
    use image::{Rgba, RgbaImage};

    fn accept_all() -> Arc<Cascade> {
        Arc::new(Cascade::new(vec![Stump {
            feature: HaarFeature::new(FeatureShape::EdgeVertical, 4, 4, 0, 0),
            threshold: 1.0e9,
            polarity: Polarity::Positive,
            weight: 500.0,
            error: 0.0,
        }]))
    }

    #[test]
    fn display_mapping_scales_position_and_side() {
        let d = Detection {
            x: 10,
            y: 20,
            scale_factor: 1.5,
            confidence: 7.0,
        };
        let m = DisplayDetection::from_detection(&d, 4.0);
        assert_eq!((m.x, m.y, m.side), (40.0, 80.0, 144.0));
        assert_eq!(m.scale_factor, 1.5);
        assert_eq!(m.confidence, 7.0);
    }

    #[test]
    fn empty_cascade_detects_nothing() {
        let mut det = FaceDetector::new(Arc::new(Cascade::default()), DetectorParams::default());
        let img = RgbaImage::from_pixel(240, 135, Rgba([128, 128, 128, 255]));
        assert!(det.detect_image(&img).is_empty());
    }

    #[test]
    fn threshold_is_strict_and_coordinates_are_remapped() {
        let params = DetectorParams::default()
            .with_search(SearchParams::default().with_max_scale(1.0))
            .with_detection_grid(30, 30);
        let strict = params.clone().with_confidence_threshold(500.0);
        let mut det = FaceDetector::new(accept_all(), strict);
        let img = RgbaImage::from_pixel(120, 120, Rgba([50, 60, 70, 255]));
        assert!(det.detect_image(&img).is_empty());

        det.set_params(params.with_confidence_threshold(499.0));
        let faces = det.detect_image(&img);
        assert_eq!(faces.len(), 1);
        assert_eq!((faces[0].x, faces[0].y, faces[0].side), (0.0, 0.0, 96.0));
    }

    #[test]
    fn swapping_cascade_takes_effect_next_frame() {
        let params = DetectorParams::default()
            .with_search(SearchParams::default().with_max_scale(1.0))
            .with_detection_grid(30, 30);
        let mut det = FaceDetector::new(accept_all(), params);
        let px = vec![100u8; 30 * 30 * 3];
        assert_eq!(det.detect_frame(&px, 30, 30, 3).len(), 1);

        det.set_cascade(Arc::new(Cascade::default()));
        assert!(det.detect_frame(&px, 30, 30, 3).is_empty());
    }

    #[test]
    fn cancelled_frame_returns_none() {
        let mut det = FaceDetector::new(accept_all(), DetectorParams::default());
        let px = vec![100u8; 240 * 135 * 4];
        let cancel = AtomicBool::new(true);
        assert!(det.detect_frame_cancellable(&px, 240, 135, 4, &cancel).is_none());
    }
}
