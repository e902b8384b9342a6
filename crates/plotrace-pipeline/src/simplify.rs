//! Direction-change simplification.
//!
//! An optional post-trace filter that thins a traced path down to the
//! points where its heading changes. Each step's heading is measured with
//! `atan2`; a point is kept when its heading differs from the heading of
//! the last kept step by more than the angle threshold. The first and
//! last points always survive.
//!
//! This is lossy at corners: the kept point is the first one *after* the
//! turn, so a sharp corner is cut by one pixel. Headings are compared
//! without wrapping, so steps on either side of the negative x axis
//! (`π` vs `-π`) always count as a change.
//!
//! Disabled unless [`PipelineConfig::simplify_angle`](crate::PipelineConfig::simplify_angle)
//! is set.

use crate::types::{PathSet, PixelCoordinate, Polyline};

/// Thin `polyline` to the points where its heading changes by more than
/// `angle` radians.
///
/// Polylines with two or fewer points are returned unchanged.
#[must_use = "returns the simplified polyline"]
pub fn simplify_by_direction(polyline: &Polyline, angle: f64) -> Polyline {
    let points = polyline.points();
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return polyline.clone();
    };
    if points.len() <= 2 {
        return polyline.clone();
    }

    let mut kept = vec![first];
    let mut last_heading: Option<f64> = None;

    for pair in points.windows(2) {
        let current = pair[1];
        let h = heading(pair[0], current);
        if last_heading.is_none_or(|prev| (h - prev).abs() > angle) {
            kept.push(current);
            last_heading = Some(h);
        }
    }

    if kept.last() != Some(&last) {
        kept.push(last);
    }

    Polyline::new(kept)
}

/// Simplify every path with a threshold given in degrees.
#[must_use = "returns the simplified paths"]
pub fn simplify_paths(paths: &[Polyline], angle_degrees: f64) -> PathSet {
    let angle = angle_degrees.to_radians();
    paths
        .iter()
        .map(|p| simplify_by_direction(p, angle))
        .collect()
}

/// Heading of the step `from -> to` in radians, in `(-π, π]`.
fn heading(from: PixelCoordinate, to: PixelCoordinate) -> f64 {
    let dx = f64::from(to.x) - f64::from(from.x);
    let dy = f64::from(to.y) - f64::from(from.y);
    dy.atan2(dx)
}
