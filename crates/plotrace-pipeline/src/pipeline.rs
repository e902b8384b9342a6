//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process`] which runs everything in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use plotrace_pipeline::{Dimensions, Pipeline, PipelineConfig, PipelineError, RgbaBuffer};
//! # fn run(pixels: &[u8], dimensions: Dimensions) -> Result<(), PipelineError> {
//! let buffer = RgbaBuffer::new(pixels, dimensions)?;
//! let ordered = Pipeline::new(buffer, PipelineConfig::default())
//!     .build_mask()?
//!     .trace()
//!     .simplify()
//!     .order();
//!
//! let staged = ordered.into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for the one fallible stage), carrying the previously
//! computed intermediates along. The foreground mask itself is dropped
//! once tracing has consumed it.

use crate::diagnostics::{StageMetrics, path_stats, total_points};
use crate::mask::ForegroundMask;
use crate::trace::{PathTracer, TraceStats};
use crate::types::{
    Dimensions, PathSet, PipelineConfig, PipelineError, Polyline, RgbaBuffer, StagedResult,
};

/// Entry point for the staged API.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline over a validated RGBA buffer.
    pub const fn new(buffer: RgbaBuffer<'_>, config: PipelineConfig) -> Pending<'_> {
        Pending { config, buffer }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`build_mask`](Self::build_mask) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .build_mask() to continue"]
pub struct Pending<'a> {
    config: PipelineConfig,
    buffer: RgbaBuffer<'a>,
}

impl Pending<'_> {
    /// The configuration this run will use.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Threshold the buffer and advance to the [`Masked`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the configuration
    /// fails [`PipelineConfig::validate`]. No mask is built in that case.
    pub fn build_mask(self) -> Result<Masked, PipelineError> {
        self.config.validate()?;
        let mask = ForegroundMask::from_buffer(self.buffer, self.config.threshold);
        let foreground_pixels = mask.foreground_count();
        tracing::debug!(
            width = self.buffer.dimensions().width,
            height = self.buffer.dimensions().height,
            threshold = self.config.threshold,
            foreground_pixels,
            "built foreground mask",
        );
        Ok(Masked {
            config: self.config,
            dimensions: self.buffer.dimensions(),
            mask,
            foreground_pixels,
        })
    }
}

// ───────────────────────── Stage 1: Masked ───────────────────────────

/// Pipeline state after thresholding.
///
/// Call [`trace`](Self::trace) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .trace() to continue"]
pub struct Masked {
    config: PipelineConfig,
    dimensions: Dimensions,
    mask: ForegroundMask,
    foreground_pixels: u64,
}

impl Masked {
    /// The foreground mask awaiting tracing.
    #[must_use]
    pub const fn mask(&self) -> &ForegroundMask {
        &self.mask
    }

    /// Number of foreground cells in the mask.
    #[must_use]
    pub const fn foreground_pixels(&self) -> u64 {
        self.foreground_pixels
    }

    /// Metrics describing the thresholding step.
    #[must_use]
    pub const fn metrics(&self) -> StageMetrics {
        StageMetrics::Mask {
            width: self.dimensions.width,
            height: self.dimensions.height,
            threshold: self.config.threshold,
            foreground_pixels: self.foreground_pixels,
        }
    }

    /// Walk the mask into paths and advance to the [`Traced`] stage.
    pub fn trace(mut self) -> Traced {
        let (paths, stats) = self.config.path_tracer.trace(&mut self.mask);
        tracing::debug!(
            seeds = stats.seeds,
            paths = stats.paths,
            discarded_singletons = stats.discarded_singletons,
            points = stats.traced_points,
            "traced foreground mask",
        );
        Traced {
            config: self.config,
            dimensions: self.dimensions,
            foreground_pixels: self.foreground_pixels,
            paths,
            stats,
        }
    }
}

// ───────────────────────── Stage 2: Traced ───────────────────────────

/// Pipeline state after tracing.
///
/// Call [`simplify`](Self::simplify) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .simplify() to continue"]
pub struct Traced {
    config: PipelineConfig,
    dimensions: Dimensions,
    foreground_pixels: u64,
    paths: PathSet,
    stats: TraceStats,
}

impl Traced {
    /// The traced paths, in seed-scan order.
    #[must_use]
    pub fn paths(&self) -> &[Polyline] {
        &self.paths
    }

    /// Counters collected while tracing.
    #[must_use]
    pub const fn stats(&self) -> TraceStats {
        self.stats
    }

    /// Metrics describing the tracing step.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        let summary = path_stats(&self.paths);
        StageMetrics::Trace {
            seeds: self.stats.seeds,
            path_count: self.stats.paths,
            discarded_singletons: self.stats.discarded_singletons,
            total_point_count: summary.total,
            min_path_points: summary.min,
            max_path_points: summary.max,
            mean_path_points: summary.mean,
        }
    }

    /// Apply the optional direction simplifier and advance to the
    /// [`Simplified`] stage.
    ///
    /// When `config.simplify_angle` is `None` this is a pass-through.
    pub fn simplify(self) -> Simplified {
        let reduced = self.config.simplify_angle.map(|angle| {
            let reduced = crate::simplify::simplify_paths(&self.paths, angle);
            tracing::debug!(
                angle_degrees = angle,
                points_before = total_points(&self.paths),
                points_after = total_points(&reduced),
                "simplified paths",
            );
            reduced
        });
        Simplified {
            config: self.config,
            dimensions: self.dimensions,
            foreground_pixels: self.foreground_pixels,
            traced: self.paths,
            stats: self.stats,
            reduced,
        }
    }
}

// ───────────────────────── Stage 3: Simplified ───────────────────────

/// Pipeline state after optional simplification.
///
/// Call [`order`](Self::order) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing; call .order() to continue"]
pub struct Simplified {
    config: PipelineConfig,
    dimensions: Dimensions,
    foreground_pixels: u64,
    traced: PathSet,
    stats: TraceStats,
    reduced: Option<PathSet>,
}

impl Simplified {
    /// The simplified paths, or `None` if simplification was disabled.
    #[must_use]
    pub fn simplified(&self) -> Option<&[Polyline]> {
        self.reduced.as_deref()
    }

    /// The paths the ordering stage will receive.
    #[must_use]
    pub fn current(&self) -> &[Polyline] {
        self.reduced.as_deref().unwrap_or(&self.traced)
    }

    /// Metrics describing the simplification step, if it ran.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        let (angle, reduced) = self.config.simplify_angle.zip(self.reduced.as_ref())?;
        let points_before = total_points(&self.traced);
        let points_after = total_points(reduced);
        #[allow(clippy::cast_precision_loss)]
        let reduction_ratio = if points_before > 0 {
            1.0 - points_after as f64 / points_before as f64
        } else {
            0.0
        };
        Some(StageMetrics::Simplify {
            angle_degrees: angle,
            points_before,
            points_after,
            reduction_ratio,
        })
    }

    /// Reorder paths for plotting and advance to the [`Ordered`] stage.
    pub fn order(self) -> Ordered {
        let input = self.current().to_vec();
        let travel_before = crate::optimize::travel_distance(&input);
        let ordered = crate::optimize::order_paths(input);
        let travel_after = crate::optimize::travel_distance(&ordered);
        tracing::debug!(
            paths = ordered.len(),
            travel_before,
            travel_after,
            "ordered paths",
        );
        Ordered {
            dimensions: self.dimensions,
            foreground_pixels: self.foreground_pixels,
            traced: self.traced,
            stats: self.stats,
            simplified: self.reduced,
            ordered,
            travel_before,
            travel_after,
        }
    }
}

// ───────────────────────── Stage 4: Ordered ──────────────────────────

/// Pipeline state after ordering, the final stage.
///
/// Call [`into_result`](Self::into_result) to extract the
/// [`StagedResult`] containing all intermediates.
#[must_use = "call .into_result() to extract the StagedResult"]
pub struct Ordered {
    dimensions: Dimensions,
    foreground_pixels: u64,
    traced: PathSet,
    stats: TraceStats,
    simplified: Option<PathSet>,
    ordered: PathSet,
    travel_before: f64,
    travel_after: f64,
}

impl Ordered {
    /// The paths in plotting order.
    #[must_use]
    pub fn paths(&self) -> &[Polyline] {
        &self.ordered
    }

    /// Image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Metrics describing the ordering step.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Order {
            path_count: self.ordered.len(),
            travel_before: self.travel_before,
            travel_after: self.travel_after,
        }
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            foreground_pixels: self.foreground_pixels,
            traced: self.traced,
            trace_stats: self.stats,
            simplified: self.simplified,
            ordered: self.ordered,
            dimensions: self.dimensions,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper: RGBA bytes with dark pixels at `on`, white elsewhere.
    fn pixels(width: u32, height: u32, on: &[(u32, u32)]) -> Vec<u8> {
        let mut out = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let v = if on.contains(&(x, y)) { 0 } else { 255 };
                out.extend_from_slice(&[v, v, v, 255]);
            }
        }
        out
    }

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn stages_expose_intermediates() {
        // (5, 2) is out of reach of both strokes, including the
        // distance-2 corner steps, so it is traced alone and dropped.
        let px = pixels(12, 5, &[(0, 0), (1, 0), (10, 4), (11, 4), (5, 2)]);
        let buffer = RgbaBuffer::new(&px, dims(12, 5)).unwrap();

        let masked = Pipeline::new(buffer, PipelineConfig::default())
            .build_mask()
            .unwrap();
        assert_eq!(masked.foreground_pixels(), 5);
        assert_eq!(masked.mask().foreground_count(), 5);

        let traced = masked.trace();
        assert_eq!(traced.paths().len(), 2);
        assert_eq!(traced.stats().discarded_singletons, 1);

        let simplified = traced.simplify();
        assert!(simplified.simplified().is_none());
        assert_eq!(simplified.current().len(), 2);

        let ordered = simplified.order();
        assert_eq!(ordered.paths().len(), 2);
        assert_eq!(ordered.dimensions(), dims(12, 5));

        let result = ordered.into_result();
        assert_eq!(result.foreground_pixels, 5);
        assert_eq!(result.trace_stats.traced_points, 4);
    }

    #[test]
    fn invalid_threshold_stops_before_masking() {
        let px = pixels(2, 2, &[]);
        let buffer = RgbaBuffer::new(&px, dims(2, 2)).unwrap();
        let config = PipelineConfig {
            threshold: 2.0,
            ..PipelineConfig::default()
        };
        let result = Pipeline::new(buffer, config).build_mask();
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn simplification_runs_when_configured() {
        let run: Vec<(u32, u32)> = (0..6).map(|x| (x, 1)).collect();
        let px = pixels(6, 3, &run);
        let buffer = RgbaBuffer::new(&px, dims(6, 3)).unwrap();
        let config = PipelineConfig {
            simplify_angle: Some(2.0),
            ..PipelineConfig::default()
        };

        let simplified = Pipeline::new(buffer, config)
            .build_mask()
            .unwrap()
            .trace()
            .simplify();
        let reduced = simplified.simplified().unwrap();
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].len(), 3);
        assert!(matches!(
            simplified.metrics(),
            Some(StageMetrics::Simplify {
                points_before: 6,
                points_after: 3,
                ..
            })
        ));

        let result = simplified.order().into_result();
        assert_eq!(result.traced[0].len(), 6);
        assert_eq!(result.ordered[0].len(), 3);
    }

    #[test]
    fn metrics_report_each_stage() {
        let px = pixels(4, 1, &[(0, 0), (1, 0), (2, 0)]);
        let buffer = RgbaBuffer::new(&px, dims(4, 1)).unwrap();
        let masked = Pipeline::new(buffer, PipelineConfig::default())
            .build_mask()
            .unwrap();
        assert!(matches!(
            masked.metrics(),
            StageMetrics::Mask {
                foreground_pixels: 3,
                ..
            }
        ));
        let traced = masked.trace();
        assert!(matches!(
            traced.metrics(),
            StageMetrics::Trace {
                path_count: 1,
                total_point_count: 3,
                ..
            }
        ));
        let ordered = traced.simplify().order();
        assert!(matches!(
            ordered.metrics(),
            StageMetrics::Order { path_count: 1, .. }
        ));
    }
}
