//! Path ordering: reorder traced paths to cut pen-up travel.
//!
//! Uses a nearest-neighbor greedy heuristic on path endpoints: after
//! drawing a path, the pen moves to whichever remaining path *starts*
//! closest to where the current one *ends*. Paths keep their traced
//! direction; only the list order changes.
//!
//! This is O(n²) in the number of paths, which stays small because it
//! is bounded by image detail rather than pixel count. It never revisits
//! a decision, so it carries no global-distance guarantee.

use crate::types::{PathSet, PixelCoordinate, Polyline};

/// Reorder paths to approximately minimize total pen-up travel.
///
/// The first input path stays first. Each following slot goes to the
/// remaining path whose first point is nearest (Euclidean) to the
/// previous path's last point; ties go to the path that came earliest
/// in the input. The result is a permutation of the input: nothing is
/// dropped, reversed, or edited.
///
/// Empty paths (which the tracer never emits) have no start point, so
/// they sort after every non-empty candidate.
#[must_use = "returns the reordered paths"]
pub fn order_paths(paths: PathSet) -> PathSet {
    let n = paths.len();
    if n <= 1 {
        return paths;
    }

    let mut remaining: Vec<Option<Polyline>> = paths.into_iter().map(Some).collect();
    let mut result = Vec::with_capacity(n);
    let mut current_end: Option<PixelCoordinate> = None;

    // Start with the first path; every later pick is greedy.
    if let Some(first) = remaining[0].take() {
        current_end = first.last().copied();
        result.push(first);
    }

    for _ in 1..n {
        let mut best: Option<(usize, u64)> = None;

        for (j, candidate) in remaining.iter().enumerate() {
            let Some(candidate) = candidate else {
                continue;
            };
            let dist = match (current_end, candidate.first()) {
                (Some(end), Some(&start)) => end.distance_squared(start),
                _ => u64::MAX,
            };
            if best.is_none_or(|(_, best_dist)| dist < best_dist) {
                best = Some((j, dist));
            }
        }

        // At least one slot is still occupied on every iteration, so
        // `best` is always `Some` here.
        let Some(chosen) = best.and_then(|(j, _)| remaining[j].take()) else {
            continue;
        };
        if let Some(&end) = chosen.last() {
            current_end = Some(end);
        }
        result.push(chosen);
    }

    result
}

/// Total pen-up distance between consecutive paths, in pixels.
///
/// Sums the gap from each path's last point to the next path's first
/// point. Empty paths contribute nothing.
#[must_use]
pub fn travel_distance(paths: &[Polyline]) -> f64 {
    paths
        .windows(2)
        .filter_map(|pair| {
            let end = pair[0].last()?;
            let start = pair[1].first()?;
            Some(end.distance(*start))
        })
        .sum()
}
