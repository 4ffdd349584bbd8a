use anyhow::Context;
use haar::app::{draw_boxes, fit_within};
use haar::{find_faces_with_trace, load_cascade, DisplayDetection, SearchParams, CHECKPOINTS};
use image::{
    imageops::{resize, FilterType},
    ImageReader,
};
use serde::Serialize;
use std::time::Instant;
use std::{fs::File, io::Write, path::PathBuf};

#[derive(Serialize)]
struct FaceOut {
    x: f64,
    y: f64,
    side: f64,
    confidence: f64,
}

#[derive(Serialize)]
struct FaceDump {
    image: String,
    width: u32,
    height: u32,
    detection_width: u32,
    detection_height: u32,
    faces: Vec<FaceOut>,
}

fn main() -> anyhow::Result<()> {
    haar::logger::init_logging(None)?;

    let mut args = std::env::args().skip(1);
    let usage =
        "usage: dump_faces <image> <stumps.json> [--grid WxH] [--max-scale S] [--threshold T]";
    let input: PathBuf = args.next().context(usage)?.into();
    let stumps: PathBuf = args.next().context(usage)?.into();

    let (mut grid_w, mut grid_h) = (240u32, 135u32);
    let mut params = SearchParams::default();
    let mut threshold = 300.0;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--grid" => {
                let v = args.next().context("expected WxH after --grid")?;
                let (w, h) = v.split_once('x').context("grid must look like 240x135")?;
                grid_w = w.parse().context("could not parse grid width")?;
                grid_h = h.parse().context("could not parse grid height")?;
                if grid_w == 0 || grid_h == 0 {
                    anyhow::bail!("grid must be at least 1x1");
                }
            }
            "--max-scale" => {
                let v = args.next().context("expected a number after --max-scale")?;
                params = params.with_max_scale(v.parse().context("could not parse max scale")?);
            }
            "--threshold" => {
                let v = args.next().context("expected a number after --threshold")?;
                threshold = v.parse().context("could not parse threshold")?;
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    let cascade = load_cascade(&stumps)?;
    let img = fit_within(ImageReader::open(&input)?.decode()?.to_rgba8(), 1280, 720);
    let grid = resize(&img, grid_w, grid_h, FilterType::Triangle);

    let started = Instant::now();
    let res = find_faces_with_trace(
        grid.as_raw(),
        grid_w as usize,
        grid_h as usize,
        4,
        &cascade,
        &params,
    );
    let total_ms = started.elapsed().as_secs_f64() * 1000.0;

    println!("image {}x{} pixels, grid {grid_w}x{grid_h}", img.width(), img.height());
    println!("haar: {:6.2} ms", total_ms);
    println!(" - integral: {:6.2} ms", res.integral_ms);
    println!(" -     scan: {:6.2} ms", res.scan_ms);
    println!(" -    merge: {:6.2} ms", res.merge_ms);
    println!("windows: {}, accepted: {}", res.windows, res.raw_count);
    for (stage, rejected) in CHECKPOINTS.iter().zip(res.rejected_at) {
        println!(" - rejected at {stage:>4}: {rejected}");
    }

    let feed_to_input = img.width() as f64 / grid_w as f64;
    let faces: Vec<DisplayDetection> = res
        .detections
        .iter()
        .filter(|d| d.confidence > threshold)
        .map(|d| DisplayDetection::from_detection(d, feed_to_input))
        .collect();
    println!(
        "Detected {} faces ({} merged, threshold {threshold})",
        faces.len(),
        res.detections.len()
    );

    let json_out = input.with_extension("faces.json");
    let dump = FaceDump {
        image: input.to_string_lossy().into_owned(),
        width: img.width(),
        height: img.height(),
        detection_width: grid_w,
        detection_height: grid_h,
        faces: faces
            .iter()
            .map(|f| FaceOut {
                x: f.x,
                y: f.y,
                side: f.side,
                confidence: f.confidence,
            })
            .collect(),
    };
    let mut json_file = File::create(&json_out)?;
    serde_json::to_writer_pretty(&mut json_file, &dump)?;
    json_file.write_all(b"\n")?;
    println!("Saved JSON dump to {}", json_out.display());

    let mut vis = img;
    draw_boxes(&mut vis, &faces);
    let out = input.with_extension("faces.png");
    vis.save(&out)?;
    println!("Saved visualization to {}", out.display());

    Ok(())
}
