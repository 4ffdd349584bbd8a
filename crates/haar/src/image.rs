//! Single-frame helpers for the Haar cascade detector.
//!
//! These wrappers expose the `haar-core` integral-image and search primitives
//! in terms of `image` buffers with at least three color channels.

use haar_core::{detect, Cascade, Detection, IntegralImages, SearchParams};
use image::{ImageBuffer, Pixel, Rgb, Rgba};

/// 8-bit pixel layouts the engine can read (three or more color channels).
pub trait ColorPixel: Pixel<Subpixel = u8> {}

impl ColorPixel for Rgb<u8> {}
impl ColorPixel for Rgba<u8> {}

/// Build the intensity and squared-intensity integral images of `img`.
#[inline]
pub fn integral_images<P: ColorPixel>(img: &ImageBuffer<P, Vec<u8>>) -> IntegralImages {
    IntegralImages::from_pixels(
        img.as_raw(),
        img.width() as usize,
        img.height() as usize,
        P::CHANNEL_COUNT as usize,
    )
}

/// Detect and merge faces in `img`, in the image's own pixel coordinates.
#[inline]
pub fn find_faces_image<P: ColorPixel>(
    img: &ImageBuffer<P, Vec<u8>>,
    cascade: &Cascade,
    params: &SearchParams,
) -> Vec<Detection> {
    detect::find_faces_u8(
        img.as_raw(),
        img.width() as usize,
        img.height() as usize,
        P::CHANNEL_COUNT as usize,
        cascade,
        params,
    )
}
