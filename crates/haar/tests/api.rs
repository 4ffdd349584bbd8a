use haar::{
    find_faces_image, find_faces_u8, find_faces_with_trace, integral_images, load_cascade,
    Cascade, DetectorParams, FaceDetector, FeatureShape, HaarFeature, IntegralImages, Polarity,
    SearchParams, Stump,
};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::sync::Arc;

/// Black 240x135 frame with a 24x24 white square whose top-left is (100, 50).
fn bright_square() -> RgbaImage {
    RgbaImage::from_fn(240, 135, |x, y| {
        if (100..124).contains(&x) && (50..74).contains(&y) {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

/// Fires on a dark-to-bright vertical edge spanning most of a window's height.
fn left_edge_cascade() -> Cascade {
    Cascade::new(vec![Stump {
        feature: HaarFeature::new(FeatureShape::EdgeHorizontal, 2, 24, 0, 0),
        threshold: 45.0,
        polarity: Polarity::Negative,
        weight: 1.0,
        error: 0.1,
    }])
}

fn single_scale() -> SearchParams {
    SearchParams::default().with_max_scale(1.0)
}

#[test]
fn mid_gray_frame_with_empty_bank_finds_nothing() {
    let img = RgbaImage::from_pixel(240, 135, Rgba([128, 128, 128, 255]));
    let empty = Cascade::default();
    for params in [
        SearchParams::default(),
        single_scale(),
        SearchParams::default().with_step_size(4.0).with_scale_step(1.0),
    ] {
        assert!(find_faces_image(&img, &empty, &params).is_empty());
    }
}

#[test]
fn bright_square_yields_one_detection_at_its_edge() {
    let img = bright_square();
    let faces = find_faces_image(&img, &left_edge_cascade(), &single_scale());

    assert_eq!(faces.len(), 1, "{faces:?}");
    let f = faces[0];
    assert_eq!((f.x, f.y), (99, 49));
    assert_eq!(f.scale_factor, 1.0);
    assert_eq!(f.confidence, 1.0);
    assert!(f.x.abs_diff(100) < 18 && f.y.abs_diff(50) < 18);
}

#[test]
fn trace_reports_windows_and_rejections() {
    let img = bright_square();
    let cascade = left_edge_cascade();
    let params = single_scale();

    let res = find_faces_with_trace(img.as_raw(), 240, 135, 4, &cascade, &params);
    assert_eq!(res.detections, find_faces_image(&img, &cascade, &params));
    // scale 1: x in 0..216, y in 0..111, stride 1
    assert_eq!(res.windows, 216 * 111);
    assert_eq!(res.raw_count, 3);
    assert_eq!(res.rejected_at[0], res.windows - res.raw_count);
    assert_eq!(res.rejected_at[1..].iter().sum::<usize>(), 0);
}

#[test]
fn image_helpers_match_core_entry_points() {
    let img = bright_square();
    let cascade = left_edge_cascade();
    let params = single_scale();

    let helper = find_faces_image(&img, &cascade, &params);
    let core = find_faces_u8(img.as_raw(), 240, 135, 4, &cascade, &params);
    assert_eq!(helper, core);

    let rgb: RgbImage = RgbImage::from_fn(240, 135, |x, y| {
        let p = img.get_pixel(x, y).0;
        Rgb([p[0], p[1], p[2]])
    });
    assert_eq!(find_faces_image(&rgb, &cascade, &params), helper);
    assert_eq!(
        integral_images(&rgb),
        IntegralImages::from_pixels(img.as_raw(), 240, 135, 4)
    );
}

#[test]
fn detector_filters_and_remaps_frame_hits() {
    let params = DetectorParams::default()
        .with_search(single_scale())
        .with_confidence_threshold(0.0);
    let mut detector = FaceDetector::new(Arc::new(left_edge_cascade()), params.clone());

    let faces = detector.detect_image(&bright_square());
    assert_eq!(faces.len(), 1);
    assert_eq!((faces[0].x, faces[0].y, faces[0].side), (99.0, 49.0, 24.0));

    // a single stump can never clear the default threshold
    detector.set_params(params.with_confidence_threshold(300.0));
    assert!(detector.detect_image(&bright_square()).is_empty());
}

#[test]
fn stump_bank_loads_from_file() {
    let path = std::env::temp_dir().join(format!("haar-stumps-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"[{"feature": {"Type": 0, "Width": 2, "Height": 24, "PosX": 0, "PosY": 0},
             "threshold": 45, "error": 0.1, "polarity": -1, "amountOfSay": 1}]"#,
    )
    .unwrap();

    let loaded = load_cascade(&path);
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded.unwrap(), left_edge_cascade());
}

#[test]
fn missing_stump_file_is_an_error() {
    let path = std::env::temp_dir().join("haar-stumps-does-not-exist.json");
    let err = load_cascade(&path).unwrap_err();
    assert!(format!("{err:#}").contains("opening stumps"));
}
