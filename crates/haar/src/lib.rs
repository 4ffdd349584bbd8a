//! Face detection on `image` buffers, built on the `haar-core` engine.
//!
//! This crate is organized into a few focused modules:
//! - [`image`] – single-frame helpers on `RgbImage`/`RgbaImage`.
//! - [`training`] – loading the pre-trained stump bank from JSON.
//! - [`frame`] – a per-frame driver with reusable buffers, detection-grid
//!   resampling, confidence filtering and coordinate remapping.
//! - [`app`] – config-driven runner shared by the examples.
//! - [`logger`] – `tracing` subscriber setup used by the examples.

pub mod app;
pub mod frame;
pub mod image;
pub mod logger;
pub mod training;

// Re-export the engine so most consumers need a single dependency.
pub use haar_core::*;

pub use crate::frame::{DetectorParams, DisplayDetection, FaceDetector};
pub use crate::image::{find_faces_image, integral_images, ColorPixel};
pub use crate::training::{load_cascade, parse_cascade, StumpRecord};
