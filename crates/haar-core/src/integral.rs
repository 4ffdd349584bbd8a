//! Summed-area tables over normalized intensity.
//!
//! Both grids are `(h + 1) x (w + 1)` with a zero first row and column, so a
//! rectangle sum needs no special casing at the top-left border.

/// One accumulator grid in row-major layout.
///
/// `w`/`h` are the dimensions of the source frame; `data` holds
/// `(w + 1) * (h + 1)` entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SumGrid {
    pub w: usize,
    pub h: usize,
    pub data: Vec<f64>,
}

impl SumGrid {
    /// Grid value at `(x, y)`, or 0 outside the grid.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f64 {
        if x > self.w || y > self.h {
            return 0.0;
        }
        self.data[y * (self.w + 1) + x]
    }

    /// Sum of the source values inside the `w x h` rectangle at `(x, y)`.
    ///
    /// Corners falling outside the grid contribute 0, so windows that hang
    /// over the frame border under-count instead of faulting.
    #[inline]
    pub fn region_sum(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        let br = self.at(x + w, y + h);
        let bl = if x > 0 { self.at(x, y + h) } else { 0.0 };
        let tr = if y > 0 { self.at(x + w, y) } else { 0.0 };
        let tl = if x > 0 && y > 0 { self.at(x, y) } else { 0.0 };
        br - bl - tr + tl
    }

    fn reset(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.data.resize((w + 1) * (h + 1), 0.0);
    }
}

/// Intensity and squared-intensity summed-area tables for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntegralImages {
    pub sum: SumGrid,
    pub sq_sum: SumGrid,
}

impl IntegralImages {
    /// Empty storage; call [`IntegralImages::rebuild`] before searching.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build both grids from an interleaved 8-bit buffer.
    ///
    /// `channels` must be at least 3; the grayscale value is the mean of the
    /// first three channels of each pixel.
    pub fn from_pixels(pixels: &[u8], w: usize, h: usize, channels: usize) -> Self {
        let mut ii = Self::new();
        ii.rebuild(pixels, w, h, channels);
        ii
    }

    /// Build both grids from intensities already normalized to `[0, 1]`,
    /// one value per pixel in row-major order.
    pub fn from_gray(values: &[f64], w: usize, h: usize) -> Self {
        let mut ii = Self::new();
        ii.fill(w, h, |x, y| values[y * w + x]);
        ii
    }

    /// Source frame width.
    #[inline]
    pub fn width(&self) -> usize {
        self.sum.w
    }

    /// Source frame height.
    #[inline]
    pub fn height(&self) -> usize {
        self.sum.h
    }

    /// Recompute both grids for a new frame, reusing the allocation when the
    /// dimensions are unchanged.
    ///
    /// Every cell, including the zero border, is rewritten, so nothing from a
    /// previous frame survives.
    pub fn rebuild(&mut self, pixels: &[u8], w: usize, h: usize, channels: usize) {
        debug_assert!(channels >= 3, "need at least 3 channels per pixel");
        debug_assert!(pixels.len() >= w * h * channels, "pixel buffer too short");
        self.fill(w, h, |x, y| {
            let idx = (y * w + x) * channels;
            let gray =
                (pixels[idx] as f64 + pixels[idx + 1] as f64 + pixels[idx + 2] as f64) / 3.0;
            gray / 255.0
        });
    }

    fn fill(&mut self, w: usize, h: usize, value: impl Fn(usize, usize) -> f64) {
        self.sum.reset(w, h);
        self.sq_sum.reset(w, h);

        let stride = w + 1;
        let sum = &mut self.sum.data;
        let sq = &mut self.sq_sum.data;

        sum[..stride].fill(0.0);
        sq[..stride].fill(0.0);

        for y in 0..h {
            let row = (y + 1) * stride;
            let above = y * stride;
            sum[row] = 0.0;
            sq[row] = 0.0;
            for x in 0..w {
                let v = value(x, y);
                sum[row + x + 1] = v + sum[above + x + 1] + sum[row + x] - sum[above + x];
                sq[row + x + 1] = v * v + sq[above + x + 1] + sq[row + x] - sq[above + x];
            }
        }
    }
}
