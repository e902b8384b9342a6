//! Property tests over random masks: the tracer consumes every
//! foreground cell exactly once, and ordering only permutes paths.

#![allow(clippy::unwrap_used)]

use plotrace_pipeline::optimize::order_paths;
use plotrace_pipeline::trace::NEIGHBOR_OFFSETS;
use plotrace_pipeline::{
    Dimensions, ForegroundMask, PathTracer, PathTracerKind, PipelineConfig, Polyline,
    RgbaBuffer, process,
};
use proptest::prelude::*;

/// A random mask as `(dimensions, row-major cells)`.
fn random_mask() -> impl Strategy<Value = (Dimensions, Vec<bool>)> {
    (1u32..16, 1u32..16).prop_flat_map(|(width, height)| {
        let len = (width * height) as usize;
        (
            Just(Dimensions { width, height }),
            proptest::collection::vec(any::<bool>(), len),
        )
    })
}

fn build(dimensions: Dimensions, cells: &[bool]) -> ForegroundMask {
    ForegroundMask::from_fn(dimensions, |x, y| {
        cells[(y * dimensions.width + x) as usize]
    })
}

fn sorted_points(paths: &[Polyline]) -> Vec<(u32, u32)> {
    let mut points: Vec<_> = paths
        .iter()
        .flat_map(|p| p.points().iter().map(|c| (c.x, c.y)))
        .collect();
    points.sort_unstable();
    points
}

proptest! {
    /// Every foreground cell lands in exactly one retained path or is
    /// counted as a discarded singleton.
    #[test]
    fn pixels_are_conserved((dimensions, cells) in random_mask()) {
        let mut mask = build(dimensions, &cells);
        let foreground = mask.foreground_count();
        let (paths, stats) = PathTracerKind::GreedyWalk.trace(&mut mask);

        let traced: usize = paths.iter().map(Polyline::len).sum();
        prop_assert_eq!(traced, stats.traced_points);
        prop_assert_eq!((traced + stats.discarded_singletons) as u64, foreground);

        let points = sorted_points(&paths);
        let mut unique = points.clone();
        unique.dedup();
        prop_assert_eq!(points.len(), unique.len());
        for (x, y) in points {
            prop_assert!(cells[(y * dimensions.width + x) as usize]);
        }
    }

    /// Tracing leaves nothing behind and every retained path has at
    /// least two points.
    #[test]
    fn mask_is_exhausted((dimensions, cells) in random_mask()) {
        let mut mask = build(dimensions, &cells);
        let (paths, _) = PathTracerKind::GreedyWalk.trace(&mut mask);
        prop_assert!(mask.is_exhausted());
        prop_assert!(paths.iter().all(|p| p.len() >= 2));
    }

    /// Consecutive points are always one of the twelve candidate steps.
    #[test]
    fn steps_follow_neighbor_offsets((dimensions, cells) in random_mask()) {
        let mut mask = build(dimensions, &cells);
        let (paths, _) = PathTracerKind::GreedyWalk.trace(&mut mask);
        for path in &paths {
            for pair in path.points().windows(2) {
                let step = (
                    i64::from(pair[1].x) - i64::from(pair[0].x),
                    i64::from(pair[1].y) - i64::from(pair[0].y),
                );
                prop_assert!(NEIGHBOR_OFFSETS.contains(&step));
            }
        }
    }

    /// Ordering returns the same paths, untouched, in a new order, and
    /// ordering twice changes nothing.
    #[test]
    fn ordering_is_a_stable_permutation((dimensions, cells) in random_mask()) {
        let mut mask = build(dimensions, &cells);
        let (paths, _) = PathTracerKind::GreedyWalk.trace(&mut mask);
        let ordered = order_paths(paths.clone());

        prop_assert_eq!(ordered.len(), paths.len());
        if let Some(first) = paths.first() {
            prop_assert_eq!(Some(first), ordered.first());
        }
        for path in &paths {
            let before = paths.iter().filter(|p| *p == path).count();
            let after = ordered.iter().filter(|p| *p == path).count();
            prop_assert_eq!(before, after);
        }
        prop_assert_eq!(order_paths(ordered.clone()), ordered);
    }

    /// The whole pipeline is deterministic over RGBA input.
    #[test]
    fn pipeline_is_deterministic(
        (dimensions, cells) in random_mask(),
        threshold in 0.0f64..=1.0,
    ) {
        let pixels: Vec<u8> = cells
            .iter()
            .flat_map(|&on| if on { [20, 20, 20, 255] } else { [230, 230, 230, 255] })
            .collect();
        let buffer = RgbaBuffer::new(&pixels, dimensions).unwrap();
        let config = PipelineConfig { threshold, ..PipelineConfig::default() };

        let first = process(buffer, &config).unwrap();
        let second = process(buffer, &config).unwrap();
        prop_assert_eq!(first, second);
    }
}
