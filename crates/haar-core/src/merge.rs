//! Greedy clustering of raw detections.
//!
//! This is a coarse stand-in for non-maximum suppression: two detections are
//! neighbours when their top-left corners are closer than the radius on both
//! axes independently, regardless of window size or overlap area.
use crate::Detection;

/// Collapse neighbouring detections, keeping the most confident one per
/// cluster.
///
/// Detections are visited in input order. Each is compared against the
/// current cluster representatives in insertion order; the first one within
/// `radius` on both axes absorbs it (taking its fields if the newcomer is
/// strictly more confident). Unmatched detections start a new cluster.
pub fn merge_detections(
    detections: impl IntoIterator<Item = Detection>,
    radius: f64,
) -> Vec<Detection> {
    let mut out: Vec<Detection> = Vec::new();

    // O(N * clusters); clusters stay few after the cascade
    'outer: for d in detections {
        for rep in &mut out {
            let dx = (d.x as f64 - rep.x as f64).abs();
            let dy = (d.y as f64 - rep.y as f64).abs();
            if dx < radius && dy < radius {
                if d.confidence > rep.confidence {
                    *rep = d;
                }
                continue 'outer;
            }
        }
        out.push(d);
    }

    out
}
