//! Path tracing: walk a foreground mask into ordered point sequences.
//!
//! This module defines the [`PathTracer`] trait for pluggable tracing
//! walks and the [`PathTracerKind`] enum for selecting one at runtime.
//!
//! # Greedy walk
//!
//! Seeds are found by scanning the mask in row-major order. From each
//! seed the walk repeatedly steps to the first still-foreground cell
//! among [`NEIGHBOR_OFFSETS`], clearing every cell it lands on. There is
//! no backtracking: a cluster with several branches becomes one path
//! threaded through it in offset-priority order, and pixels stranded by
//! an earlier walk start paths of their own (or are dropped as
//! singletons).
//!
//! The output depends on the scan order and offset priority. It is
//! deterministic for a given mask but not invariant under rotation or
//! reflection, so both orders must stay exactly as they are.

use serde::{Deserialize, Serialize};

use crate::mask::ForegroundMask;
use crate::types::{PathSet, PixelCoordinate, Polyline};

/// Candidate steps from the current point, in priority order.
///
/// The eight unit neighbors (top row, middle row, bottom row, each left
/// to right) followed by the four distance-2 diagonal corners, which let
/// a walk hop a one-pixel diagonal gap.
pub const NEIGHBOR_OFFSETS: [(i64, i64); 12] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (-2, -2),
    (2, -2),
    (-2, 2),
    (2, 2),
];

/// Selects which tracing walk to run.
///
/// Only [`GreedyWalk`](Self::GreedyWalk) exists today; new variants can
/// be added without changing [`PipelineConfig`](crate::PipelineConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathTracerKind {
    /// Single-branch greedy walk over [`NEIGHBOR_OFFSETS`].
    #[default]
    GreedyWalk,
}

/// Counters collected during one tracing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    /// Number of walks started (one per seed pixel).
    pub seeds: usize,
    /// Walks that produced a path of two or more points.
    pub paths: usize,
    /// Walks that never left their seed and were dropped.
    pub discarded_singletons: usize,
    /// Points across all retained paths.
    pub traced_points: usize,
}

/// Trait for tracing strategies.
///
/// Input: a foreground mask, which the tracer consumes in place.
/// Output: the retained paths (each with at least two points) and
/// counters describing the pass. The mask is left with no foreground
/// cells.
pub trait PathTracer {
    /// Trace every foreground cell of `mask` into paths.
    fn trace(&self, mask: &mut ForegroundMask) -> (PathSet, TraceStats);
}

impl PathTracer for PathTracerKind {
    fn trace(&self, mask: &mut ForegroundMask) -> (PathSet, TraceStats) {
        match *self {
            Self::GreedyWalk => trace_greedy_walk(mask),
        }
    }
}

/// Trace `mask` with the default greedy walk, discarding the counters.
#[must_use = "returns the traced paths"]
pub fn trace_paths(mask: &mut ForegroundMask) -> PathSet {
    trace_greedy_walk(mask).0
}

fn trace_greedy_walk(mask: &mut ForegroundMask) -> (PathSet, TraceStats) {
    let dimensions = mask.dimensions();
    let mut paths = Vec::new();
    let mut stats = TraceStats::default();

    for y in 0..dimensions.height {
        for x in 0..dimensions.width {
            if !mask.take(i64::from(x), i64::from(y)) {
                continue;
            }
            stats.seeds += 1;

            let mut points = vec![PixelCoordinate::new(x, y)];
            let mut current = points[0];
            while let Some(next) = step(mask, current) {
                points.push(next);
                current = next;
            }

            if points.len() < 2 {
                stats.discarded_singletons += 1;
                continue;
            }
            stats.paths += 1;
            stats.traced_points += points.len();
            paths.push(Polyline::new(points));
        }
    }

    (paths, stats)
}

/// Take the first foreground candidate around `from`, if any.
fn step(mask: &mut ForegroundMask, from: PixelCoordinate) -> Option<PixelCoordinate> {
    NEIGHBOR_OFFSETS.iter().find_map(|&(dx, dy)| {
        let x = i64::from(from.x) + dx;
        let y = i64::from(from.y) + dy;
        if mask.take(x, y) {
            Some(PixelCoordinate::new(
                u32::try_from(x).ok()?,
                u32::try_from(y).ok()?,
            ))
        } else {
            None
        }
    })
}
