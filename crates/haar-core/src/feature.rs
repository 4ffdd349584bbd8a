//! Haar-like features and their normalized response over a detection window.
use crate::integral::{IntegralImages, SumGrid};

/// Variance floor used before taking the square root.
const MIN_VARIANCE: f64 = 1e-6;

/// Rectangle layout of a Haar-like feature.
///
/// The numeric codes (`0..=5`, in declaration order) are the encoding used by
/// the training data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureShape {
    /// Two columns; the right half is the black region.
    EdgeHorizontal,
    /// Two rows; the bottom half is the black region.
    EdgeVertical,
    /// Three columns; the middle third is black and counted twice.
    ThreeHorizontal,
    /// Three rows; the middle third is black and counted twice.
    ThreeVertical,
    /// 2x2 checkerboard; top-right and bottom-left quadrants are black.
    FourBottomToTop,
    /// 2x2 checkerboard; top-left and bottom-right quadrants are black.
    FourTopToBottom,
}

impl FeatureShape {
    /// Training-data code of this shape.
    pub fn code(self) -> u8 {
        match self {
            FeatureShape::EdgeHorizontal => 0,
            FeatureShape::EdgeVertical => 1,
            FeatureShape::ThreeHorizontal => 2,
            FeatureShape::ThreeVertical => 3,
            FeatureShape::FourBottomToTop => 4,
            FeatureShape::FourTopToBottom => 5,
        }
    }
}

impl TryFrom<u8> for FeatureShape {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(FeatureShape::EdgeHorizontal),
            1 => Ok(FeatureShape::EdgeVertical),
            2 => Ok(FeatureShape::ThreeHorizontal),
            3 => Ok(FeatureShape::ThreeVertical),
            4 => Ok(FeatureShape::FourBottomToTop),
            5 => Ok(FeatureShape::FourTopToBottom),
            other => Err(format!("invalid feature type {other}, expected 0..=5")),
        }
    }
}

/// A Haar-like feature placed relative to the top-left corner of a
/// scale-1 detection window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HaarFeature {
    pub shape: FeatureShape,
    pub width: u32,
    pub height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

impl HaarFeature {
    pub fn new(shape: FeatureShape, width: u32, height: u32, offset_x: u32, offset_y: u32) -> Self {
        Self {
            shape,
            width,
            height,
            offset_x,
            offset_y,
        }
    }

    /// Feature rectangle `(x, y, w, h)` in frame coordinates for a window at
    /// `(window_x, window_y)` evaluated at `scale`.
    ///
    /// Offsets are floored, extents rounded (half up).
    #[inline]
    pub fn scaled_region(
        &self,
        window_x: u32,
        window_y: u32,
        scale: f64,
    ) -> (usize, usize, usize, usize) {
        let x = (self.offset_x as f64 * scale).floor() as usize + window_x as usize;
        let y = (self.offset_y as f64 * scale).floor() as usize + window_y as usize;
        let w = (self.width as f64 * scale).round() as usize;
        let h = (self.height as f64 * scale).round() as usize;
        (x, y, w, h)
    }

    /// Variance-normalized response of this feature for one window.
    ///
    /// The raw value is `black - white` over the feature rectangle. It is
    /// divided by the rectangle's intensity standard deviation when the
    /// variance estimate is positive, and returned unscaled otherwise.
    pub fn apply(&self, ii: &IntegralImages, window_x: u32, window_y: u32, scale: f64) -> f64 {
        let (x, y, w, h) = self.scaled_region(window_x, window_y, scale);

        let sum = ii.sum.region_sum(x, y, w, h);
        let sq_sum = ii.sq_sum.region_sum(x, y, w, h);
        let area = (w * h) as f64;

        let mean = sum / area;
        let variance = sq_sum / area - mean * mean;
        let std_dev = variance.max(MIN_VARIANCE).sqrt();

        let (black, white) = self.partition(&ii.sum, x, y, w, h);
        let raw = black - white;

        if variance > 0.0 {
            raw / std_dev
        } else {
            raw
        }
    }

    /// Black and white sums of the rectangle `(x, y, w, h)` for this shape.
    ///
    /// For the three-rectangle shapes, white is derived from the single black
    /// sum first and only then is black doubled.
    pub fn partition(&self, grid: &SumGrid, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let total = grid.region_sum(x, y, w, h);
        let (hw, hh) = (w / 2, h / 2);

        let black = match self.shape {
            FeatureShape::EdgeHorizontal => grid.region_sum(x + hw, y, hw, h),
            FeatureShape::EdgeVertical => grid.region_sum(x, y + hh, w, hh),
            FeatureShape::ThreeHorizontal => grid.region_sum(x + w / 3, y, w / 3, h),
            FeatureShape::ThreeVertical => grid.region_sum(x, y + h / 3, w, h / 3),
            FeatureShape::FourBottomToTop => {
                grid.region_sum(x + hw, y, hw, hh) + grid.region_sum(x, y + hh, hw, hh)
            }
            FeatureShape::FourTopToBottom => {
                grid.region_sum(x, y, hw, hh) + grid.region_sum(x + hw, y + hh, hw, hh)
            }
        };

        let white = total - black;
        match self.shape {
            FeatureShape::ThreeHorizontal | FeatureShape::ThreeVertical => (black * 2.0, white),
            _ => (black, white),
        }
    }
}
