//! Shared application-level helpers for the examples.
//!
//! These functions wire up I/O (load image and stump bank, optional input
//! downsampling, JSON/PNG output) around the [`FaceDetector`] so the examples
//! share the same behavior.

use crate::frame::{DetectorParams, DisplayDetection, FaceDetector};
use crate::training::load_cascade;
use anyhow::{Context, Result};
use image::{
    imageops::{resize, FilterType},
    ImageReader, Rgba, RgbaImage,
};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Write, path::Path, path::PathBuf, sync::Arc};
use tracing::info;

const BOX_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    pub image: PathBuf,
    pub stumps: PathBuf,
    pub step_size: Option<f64>,
    pub max_scale: Option<f64>,
    pub scale_step: Option<f64>,
    pub merge_radius: Option<f64>,
    pub confidence_threshold: Option<f64>,
    pub detection_width: Option<u32>,
    pub detection_height: Option<u32>,
    /// Inputs larger than `max_width` x `max_height` are downsampled
    /// (aspect preserved) before detection. Defaults to 1280x720.
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub output_json: Option<PathBuf>,
    pub output_png: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl DetectionConfig {
    /// Config with only the required inputs set.
    pub fn new(image: impl Into<PathBuf>, stumps: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            stumps: stumps.into(),
            step_size: None,
            max_scale: None,
            scale_step: None,
            merge_radius: None,
            confidence_threshold: None,
            detection_width: None,
            detection_height: None,
            max_width: None,
            max_height: None,
            output_json: None,
            output_png: None,
            log_level: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FaceOut {
    pub x: f64,
    pub y: f64,
    pub side: f64,
    pub scale_factor: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectionDump {
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub detection_width: u32,
    pub detection_height: u32,
    pub stumps: usize,
    pub confidence_threshold: f64,
    pub faces: Vec<FaceOut>,
}

/// Build validated detector parameters from the optional config overrides.
pub fn detector_params(cfg: &DetectionConfig) -> Result<DetectorParams> {
    let mut params = DetectorParams::default();
    let search = &mut params.search;

    if let Some(v) = cfg.step_size {
        if v <= 0.0 {
            anyhow::bail!("step size must be > 0");
        }
        search.step_size = v;
    }
    if let Some(v) = cfg.max_scale {
        if v < 1.0 {
            anyhow::bail!("max scale must be >= 1");
        }
        search.max_scale = v;
    }
    if let Some(v) = cfg.scale_step {
        if v <= 0.0 {
            anyhow::bail!("scale step must be > 0");
        }
        search.scale_step = v;
    }
    if let Some(v) = cfg.merge_radius {
        if v <= 0.0 {
            anyhow::bail!("merge radius must be > 0");
        }
        search.merge_radius = v;
    }
    if let Some(v) = cfg.confidence_threshold {
        params.confidence_threshold = v;
    }
    if let Some(v) = cfg.detection_width {
        if v == 0 {
            anyhow::bail!("detection width must be >= 1");
        }
        params.detection_width = v;
    }
    if let Some(v) = cfg.detection_height {
        if v == 0 {
            anyhow::bail!("detection height must be >= 1");
        }
        params.detection_height = v;
    }
    Ok(params)
}

/// Load the image and stump bank named in `cfg`, detect faces, and write the
/// JSON dump and annotated PNG next to the input unless overridden.
pub fn run_detection(cfg: DetectionConfig) -> Result<DetectionDump> {
    let params = detector_params(&cfg)?;
    let cascade = Arc::new(load_cascade(&cfg.stumps)?);

    let img = ImageReader::open(&cfg.image)
        .with_context(|| format!("opening image {}", cfg.image.display()))?
        .decode()
        .with_context(|| format!("decoding image {}", cfg.image.display()))?
        .to_rgba8();
    let img = fit_within(
        img,
        cfg.max_width.unwrap_or(1280),
        cfg.max_height.unwrap_or(720),
    );

    let threshold = params.confidence_threshold;
    let (detection_width, detection_height) = (params.detection_width, params.detection_height);
    let stumps = cascade.len();
    let mut detector = FaceDetector::new(cascade, params);
    let faces = detector.detect_image(&img);
    info!("{} faces above threshold {threshold}", faces.len());

    let dump = DetectionDump {
        image: cfg.image.to_string_lossy().into_owned(),
        width: img.width(),
        height: img.height(),
        detection_width,
        detection_height,
        stumps,
        confidence_threshold: threshold,
        faces: faces.iter().map(face_out).collect(),
    };

    let json_out = cfg
        .output_json
        .unwrap_or_else(|| cfg.image.with_extension("faces.json"));
    write_json(&json_out, &dump)?;

    let png_out = cfg
        .output_png
        .unwrap_or_else(|| cfg.image.with_extension("faces.png"));
    let mut vis = img;
    draw_boxes(&mut vis, &faces);
    vis.save(&png_out)
        .with_context(|| format!("writing {}", png_out.display()))?;

    Ok(dump)
}

fn face_out(f: &DisplayDetection) -> FaceOut {
    FaceOut {
        x: f.x,
        y: f.y,
        side: f.side,
        scale_factor: f.scale_factor,
        confidence: f.confidence,
    }
}

/// Downsample `img` to fit inside `max_w` x `max_h`, keeping its aspect ratio.
pub fn fit_within(img: RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    if img.width() <= max_w && img.height() <= max_h {
        return img;
    }
    let s = (max_w as f64 / img.width() as f64).min(max_h as f64 / img.height() as f64);
    let w = ((img.width() as f64 * s) as u32).max(1);
    let h = ((img.height() as f64 * s) as u32).max(1);
    info!("downsampled image from {}x{} to {w}x{h}", img.width(), img.height());
    resize(&img, w, h, FilterType::Triangle)
}

/// Outline each detection with a 2 px box, clipped to the image.
pub fn draw_boxes(vis: &mut RgbaImage, faces: &[DisplayDetection]) {
    let (w, h) = (vis.width() as i64, vis.height() as i64);
    let mut plot = |x: i64, y: i64| {
        if x >= 0 && y >= 0 && x < w && y < h {
            vis.put_pixel(x as u32, y as u32, BOX_COLOR);
        }
    };

    for f in faces {
        let x0 = f.x.round() as i64;
        let y0 = f.y.round() as i64;
        let x1 = (f.x + f.side).round() as i64 - 1;
        let y1 = (f.y + f.side).round() as i64 - 1;
        for t in 0..2 {
            for x in x0..=x1 {
                plot(x, y0 + t);
                plot(x, y1 - t);
            }
            for y in y0..=y1 {
                plot(x0 + t, y);
                plot(x1 - t, y);
            }
        }
    }
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let mut json_file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(&mut json_file, value)?;
    json_file.write_all(b"\n")?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<DetectionConfig> {
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let cfg: DetectionConfig = serde_json::from_reader(file)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
