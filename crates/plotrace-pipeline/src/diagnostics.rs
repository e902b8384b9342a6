//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! [`process_with_diagnostics`] drives the staged [`Pipeline`] and
//! measures each step with a caller-supplied [`Clock`]. The pipeline
//! itself never reads the time, so tests can substitute a fake clock
//! and native/WASM callers can pick their own time source.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::types::{PipelineConfig, PipelineError, Polyline, RgbaBuffer, StagedResult};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Capture the current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by `web_time::Instant`: `performance.now()` on
/// WASM, `std::time::Instant` everywhere else.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebClock;

impl Clock for WebClock {
    type Instant = web_time::Instant;

    fn now(&self) -> web_time::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &web_time::Instant) -> Duration {
        since.elapsed()
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Thresholding into the foreground mask.
    pub mask: StageDiagnostics,
    /// Greedy tracing walk.
    pub trace: StageDiagnostics,
    /// Direction simplification (only when `config.simplify_angle` is set).
    pub simplify: Option<StageDiagnostics>,
    /// Nearest-neighbor path ordering.
    pub order: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Thresholding metrics.
    Mask {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Luminance cutoff used.
        threshold: f64,
        /// Cells marked foreground.
        foreground_pixels: u64,
    },
    /// Tracing metrics.
    Trace {
        /// Walks started.
        seeds: usize,
        /// Paths retained (two or more points).
        path_count: usize,
        /// Single-pixel walks that were dropped.
        discarded_singletons: usize,
        /// Total number of points across all paths.
        total_point_count: usize,
        /// Minimum points in any single path.
        min_path_points: usize,
        /// Maximum points in any single path.
        max_path_points: usize,
        /// Mean points per path.
        mean_path_points: f64,
    },
    /// Direction simplification metrics.
    Simplify {
        /// Heading change threshold in degrees.
        angle_degrees: f64,
        /// Total points before simplification.
        points_before: usize,
        /// Total points after simplification.
        points_after: usize,
        /// Reduction ratio: `1.0 - (after / before)`.
        reduction_ratio: f64,
    },
    /// Ordering metrics.
    Order {
        /// Number of paths ordered.
        path_count: usize,
        /// Pen-up travel in the traced order, in pixels.
        travel_before: f64,
        /// Pen-up travel in the final order, in pixels.
        travel_after: f64,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Cells that passed the threshold.
    pub foreground_pixels: u64,
    /// Number of paths in the output.
    pub path_count: usize,
    /// Points across all output paths.
    pub final_point_count: usize,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels, {} foreground)",
            self.summary.image_width,
            self.summary.image_height,
            self.summary.pixel_count,
            self.summary.foreground_pixels,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let mut stages = vec![("Mask", &self.mask), ("Trace", &self.trace)];
        if let Some(ref simplify) = self.simplify {
            stages.push(("Simplify", simplify));
        }
        stages.push(("Order", &self.order));

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Paths: {}  |  Final points: {}",
            self.summary.path_count, self.summary.final_point_count,
        ));

        lines.join("\n")
    }
}

/// Run the pipeline stage by stage, timing each step with `clock`.
///
/// Produces the same [`StagedResult`] as
/// [`process_staged`](crate::process_staged) plus per-stage diagnostics.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
pub fn process_with_diagnostics<C: Clock>(
    buffer: RgbaBuffer<'_>,
    config: &PipelineConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let dimensions = buffer.dimensions();
    let run_start = clock.now();

    let start = clock.now();
    let masked = Pipeline::new(buffer, config.clone()).build_mask()?;
    let mask = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: masked.metrics(),
    };

    let start = clock.now();
    let traced = masked.trace();
    let trace = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: traced.metrics(),
    };

    let start = clock.now();
    let simplified = traced.simplify();
    let simplify_duration = clock.elapsed(&start);
    let simplify = simplified.metrics().map(|metrics| StageDiagnostics {
        duration: simplify_duration,
        metrics,
    });

    let start = clock.now();
    let ordered = simplified.order();
    let order = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: ordered.metrics(),
    };

    let result = ordered.into_result();
    let total_duration = clock.elapsed(&run_start);

    let summary = PipelineSummary {
        image_width: dimensions.width,
        image_height: dimensions.height,
        pixel_count: dimensions.pixel_count(),
        foreground_pixels: result.foreground_pixels,
        path_count: result.ordered.len(),
        final_point_count: total_points(&result.ordered),
    };
    tracing::debug!(
        total_ms = duration_ms(total_duration),
        paths = summary.path_count,
        "pipeline diagnostics collected",
    );

    Ok((
        result,
        PipelineDiagnostics {
            mask,
            trace,
            simplify,
            order,
            total_duration,
            summary,
        },
    ))
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Mask {
            width,
            height,
            threshold,
            foreground_pixels,
        } => {
            let total = u64::from(*width) * u64::from(*height);
            #[allow(clippy::cast_precision_loss)]
            let density = if total > 0 {
                *foreground_pixels as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            format!("{width}x{height} t={threshold:.2} fg={foreground_pixels} ({density:.1}%)")
        }
        StageMetrics::Trace {
            seeds,
            path_count,
            discarded_singletons,
            total_point_count,
            min_path_points,
            max_path_points,
            mean_path_points,
        } => {
            format!(
                "{seeds} seeds, {path_count} paths (-{discarded_singletons} singletons), {total_point_count} pts (min={min_path_points} max={max_path_points} mean={mean_path_points:.1})",
            )
        }
        StageMetrics::Simplify {
            angle_degrees,
            points_before,
            points_after,
            reduction_ratio,
        } => {
            format!(
                "angle={angle_degrees:.1}deg {points_before}->{points_after} pts ({:.1}% reduction)",
                reduction_ratio * 100.0,
            )
        }
        StageMetrics::Order {
            path_count,
            travel_before,
            travel_after,
        } => {
            format!("{path_count} paths, travel {travel_before:.1}->{travel_after:.1}px")
        }
    }
}

/// Statistics for a set of paths.
pub(crate) struct PathStats {
    /// Total number of points across all paths.
    pub total: usize,
    /// Minimum number of points in any single path.
    pub min: usize,
    /// Maximum number of points in any single path.
    pub max: usize,
    /// Mean number of points per path.
    pub mean: f64,
}

/// Compute point statistics for a set of paths.
pub(crate) fn path_stats(paths: &[Polyline]) -> PathStats {
    let total = total_points(paths);
    let min = paths.iter().map(Polyline::len).min().unwrap_or(0);
    let max = paths.iter().map(Polyline::len).max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let mean = if paths.is_empty() {
        0.0
    } else {
        total as f64 / paths.len() as f64
    };
    PathStats {
        total,
        min,
        max,
        mean,
    }
}

/// Total points across a slice of paths.
pub(crate) fn total_points(paths: &[Polyline]) -> usize {
    paths.iter().map(Polyline::len).sum()
}
