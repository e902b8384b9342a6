//! Shared types for the plotrace tracing pipeline.

use serde::{Deserialize, Serialize};

use crate::trace::{PathTracerKind, TraceStats};

/// Re-export `RgbaImage` so downstream crates can hand decoded images
/// to the pipeline without depending on `image` directly.
pub use image::RgbaImage;

/// An integer pixel position in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelCoordinate {
    /// Column (pixels from left edge).
    pub x: u32,
    /// Row (pixels from top edge).
    pub y: u32,
}

impl PixelCoordinate {
    /// Create a new pixel coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Exact squared Euclidean distance to another coordinate.
    ///
    /// Integer arithmetic keeps nearest-neighbor comparisons free of
    /// floating-point ties.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> u64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        (dx * dx + dy * dy).unsigned_abs()
    }

    /// Euclidean distance to another coordinate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn distance(self, other: Self) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }
}

/// An ordered sequence of pixel coordinates traced from adjacent
/// foreground pixels.
///
/// Produced once by the tracer and never edited afterwards: ordering
/// permutes a list of polylines, it never touches their points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polyline(Vec<PixelCoordinate>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<PixelCoordinate>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&PixelCoordinate> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&PixelCoordinate> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[PixelCoordinate] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<PixelCoordinate> {
        self.0
    }
}

/// The ordered list of traced paths flowing between pipeline stages.
pub type PathSet = Vec<Polyline>;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total number of pixels (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Number of bytes an RGBA8 buffer of these dimensions must hold,
    /// or `None` if it would not fit in `usize`.
    #[must_use]
    pub fn rgba_len(self) -> Option<usize> {
        let width = usize::try_from(self.width).ok()?;
        let height = usize::try_from(self.height).ok()?;
        width.checked_mul(height)?.checked_mul(4)
    }
}

/// A borrowed RGBA8 pixel buffer whose length has been checked against
/// its dimensions.
#[derive(Debug, Clone, Copy)]
pub struct RgbaBuffer<'a> {
    pixels: &'a [u8],
    dimensions: Dimensions,
}

impl<'a> RgbaBuffer<'a> {
    /// Wrap a raw RGBA8 byte slice (row-major, 4 bytes per pixel).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if `pixels.len()` is not
    /// exactly `width * height * 4`.
    pub fn new(pixels: &'a [u8], dimensions: Dimensions) -> Result<Self, PipelineError> {
        let expected = dimensions.rgba_len().ok_or_else(|| {
            PipelineError::InvalidInput(format!(
                "{}x{} image is too large to address",
                dimensions.width, dimensions.height,
            ))
        })?;
        if pixels.len() != expected {
            return Err(PipelineError::InvalidInput(format!(
                "pixel buffer holds {} bytes, expected {expected} for {}x{} RGBA",
                pixels.len(),
                dimensions.width,
                dimensions.height,
            )));
        }
        Ok(Self { pixels, dimensions })
    }

    /// Borrow the pixels of a decoded RGBA image.
    #[must_use]
    pub fn from_image(image: &'a RgbaImage) -> Self {
        Self {
            pixels: image.as_raw(),
            dimensions: Dimensions {
                width: image.width(),
                height: image.height(),
            },
        }
    }

    /// The raw RGBA bytes.
    #[must_use]
    pub const fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    /// Buffer dimensions in pixels.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }
}

/// Configuration for the tracing pipeline.
///
/// Missing fields fall back to their defaults when deserializing, so a
/// JSON object like `{"threshold":0.3}` is a complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Luminance cutoff in `[0, 1]`. Pixels strictly darker than this
    /// become foreground.
    pub threshold: f64,

    /// Stroke color written on every exported path.
    pub line_color: String,

    /// Which tracing walk to run over the foreground mask.
    pub path_tracer: PathTracerKind,

    /// Direction-change simplification angle in degrees.
    ///
    /// `None` keeps every traced point.
    pub simplify_angle: Option<f64>,
}

impl PipelineConfig {
    /// Default luminance threshold.
    pub const DEFAULT_THRESHOLD: f64 = 0.5;

    /// Default stroke color.
    pub const DEFAULT_LINE_COLOR: &'static str = "#000000";

    /// Angle used when simplification is requested without a value.
    pub const DEFAULT_SIMPLIFY_ANGLE: f64 = 2.0;

    /// Check the invariants the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `threshold` is not a
    /// finite value in `[0, 1]` or `simplify_angle` is negative or not
    /// finite.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold,
            )));
        }
        if let Some(angle) = self.simplify_angle
            && (!angle.is_finite() || angle < 0.0)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "simplify_angle must be a non-negative number of degrees, got {angle}",
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            line_color: Self::DEFAULT_LINE_COLOR.to_owned(),
            path_tracer: PathTracerKind::default(),
            simplify_angle: None,
        }
    }
}

/// Result of running the full pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Traced paths in plotting order.
    pub paths: PathSet,

    /// Dimensions of the source image in pixels.
    ///
    /// Export serializers use this to size the document.
    pub dimensions: Dimensions,
}

/// Result of running the pipeline with every intermediate preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedResult {
    /// Number of foreground cells in the freshly built mask.
    pub foreground_pixels: u64,
    /// Paths in tracing order.
    pub traced: PathSet,
    /// Counters collected while tracing.
    pub trace_stats: TraceStats,
    /// Paths after direction simplification (`Some` only when enabled).
    pub simplified: Option<PathSet>,
    /// Paths in plotting order.
    pub ordered: PathSet,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedResult {
    /// The final paths in plotting order.
    #[must_use]
    pub fn final_paths(&self) -> &[Polyline] {
        &self.ordered
    }

    /// Drop the intermediates and keep only what exporters need.
    #[must_use]
    pub fn into_process_result(self) -> ProcessResult {
        ProcessResult {
            paths: self.ordered,
            dimensions: self.dimensions,
        }
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The pixel buffer does not match its declared dimensions.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// Failed to decode encoded image bytes.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The encoded image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    // --- PixelCoordinate ---

    #[test]
    fn coordinate_distance_squared_is_exact() {
        let a = PixelCoordinate::new(0, 0);
        let b = PixelCoordinate::new(3, 4);
        assert_eq!(a.distance_squared(b), 25);
        assert_eq!(b.distance_squared(a), 25);
    }

    #[test]
    fn coordinate_distance() {
        let a = PixelCoordinate::new(10, 10);
        let b = PixelCoordinate::new(13, 14);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
        assert!(a.distance(a).abs() < f64::EPSILON);
    }

    // --- Polyline ---

    #[test]
    fn polyline_accessors() {
        let pl = Polyline::new(vec![
            PixelCoordinate::new(1, 2),
            PixelCoordinate::new(3, 4),
            PixelCoordinate::new(5, 6),
        ]);
        assert_eq!(pl.len(), 3);
        assert!(!pl.is_empty());
        assert_eq!(pl.first(), Some(&PixelCoordinate::new(1, 2)));
        assert_eq!(pl.last(), Some(&PixelCoordinate::new(5, 6)));
        assert_eq!(pl.points().len(), 3);
    }

    #[test]
    fn polyline_empty() {
        let pl = Polyline::new(vec![]);
        assert!(pl.is_empty());
        assert!(pl.first().is_none());
        assert!(pl.last().is_none());
    }

    // --- RgbaBuffer ---

    #[test]
    fn rgba_buffer_accepts_exact_length() {
        let pixels = vec![0u8; 3 * 2 * 4];
        let buffer = RgbaBuffer::new(&pixels, dims(3, 2)).unwrap();
        assert_eq!(buffer.dimensions(), dims(3, 2));
        assert_eq!(buffer.pixels().len(), 24);
    }

    #[test]
    fn rgba_buffer_rejects_short_buffer() {
        let pixels = vec![0u8; 23];
        let err = RgbaBuffer::new(&pixels, dims(3, 2)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert!(err.to_string().contains("expected 24"));
    }

    #[test]
    fn rgba_buffer_rejects_long_buffer() {
        let pixels = vec![0u8; 28];
        let result = RgbaBuffer::new(&pixels, dims(3, 2));
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn rgba_buffer_empty_image_is_valid() {
        let buffer = RgbaBuffer::new(&[], dims(0, 7)).unwrap();
        assert_eq!(buffer.dimensions().pixel_count(), 0);
    }

    #[test]
    fn rgba_buffer_from_image_borrows_raw_pixels() {
        let img = RgbaImage::from_pixel(4, 5, image::Rgba([1, 2, 3, 4]));
        let buffer = RgbaBuffer::from_image(&img);
        assert_eq!(buffer.dimensions(), dims(4, 5));
        assert_eq!(buffer.pixels(), img.as_raw().as_slice());
    }

    // --- PipelineConfig ---

    #[test]
    fn pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert!((config.threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.line_color, "#000000");
        assert_eq!(config.path_tracer, PathTracerKind::GreedyWalk);
        assert!(config.simplify_angle.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn threshold_bounds_are_inclusive() {
        for threshold in [0.0, 1.0] {
            let config = PipelineConfig {
                threshold,
                ..PipelineConfig::default()
            };
            assert!(config.validate().is_ok(), "threshold {threshold}");
        }
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        for threshold in [-0.01, 1.01, f64::NAN, f64::INFINITY] {
            let config = PipelineConfig {
                threshold,
                ..PipelineConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(PipelineError::InvalidConfig(_))),
                "threshold {threshold} should be rejected",
            );
        }
    }

    #[test]
    fn negative_simplify_angle_is_rejected() {
        let config = PipelineConfig {
            simplify_angle: Some(-1.0),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn partial_config_json_fills_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"threshold":0.25}"#).unwrap();
        assert!((config.threshold - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.line_color, PipelineConfig::DEFAULT_LINE_COLOR);
    }

    #[test]
    fn pipeline_config_serde_round_trip() {
        let config = PipelineConfig {
            threshold: 0.7,
            line_color: "#ff0000".to_owned(),
            path_tracer: PathTracerKind::GreedyWalk,
            simplify_angle: Some(5.0),
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    // --- PipelineError ---

    #[test]
    fn error_display() {
        assert_eq!(
            PipelineError::EmptyInput.to_string(),
            "input image data is empty"
        );
        assert_eq!(
            PipelineError::InvalidInput("bad buffer".to_owned()).to_string(),
            "invalid input: bad buffer",
        );
        assert_eq!(
            PipelineError::InvalidConfig("threshold".to_owned()).to_string(),
            "invalid pipeline configuration: threshold",
        );
    }
}
