//! plotrace-pipeline: Pure raster-to-path pipeline (sans-IO).
//!
//! Converts an RGBA pixel buffer into ordered polylines for a pen
//! plotter through:
//! threshold mask -> greedy path trace -> optional direction
//! simplification -> nearest-neighbor ordering.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Capture, export, and
//! trigger handling live in `plotrace-io`; SVG serialization lives in
//! `plotrace-export`.

pub mod decode;
pub mod diagnostics;
pub mod mask;
pub mod optimize;
pub mod pipeline;
pub mod simplify;
pub mod trace;
pub mod types;

pub use diagnostics::{Clock, PipelineDiagnostics, WebClock, process_with_diagnostics};
pub use mask::ForegroundMask;
pub use pipeline::Pipeline;
pub use trace::{PathTracer, PathTracerKind, TraceStats};
pub use types::{
    Dimensions, PathSet, PipelineConfig, PipelineError, PixelCoordinate, Polyline,
    ProcessResult, RgbaBuffer, RgbaImage, StagedResult,
};

/// Run the full pipeline over a raw RGBA buffer.
///
/// # Pipeline steps
///
/// 1. Threshold the buffer into a foreground mask
/// 2. Trace the mask into paths (pluggable strategy)
/// 3. Optional direction simplification
/// 4. Nearest-neighbor path ordering
///
/// An all-background image is not an error: it yields an empty path
/// list with the source dimensions intact.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails
/// [`PipelineConfig::validate`].
#[tracing::instrument(skip_all, fields(
    width = buffer.dimensions().width,
    height = buffer.dimensions().height,
))]
pub fn process(
    buffer: RgbaBuffer<'_>,
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    process_staged(buffer, config).map(StagedResult::into_process_result)
}

/// Run the full pipeline and keep every intermediate.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails
/// [`PipelineConfig::validate`].
pub fn process_staged(
    buffer: RgbaBuffer<'_>,
    config: &PipelineConfig,
) -> Result<StagedResult, PipelineError> {
    Ok(Pipeline::new(buffer, config.clone())
        .build_mask()?
        .trace()
        .simplify()
        .order()
        .into_result())
}

/// Decode encoded image bytes (PNG, JPEG, BMP, WebP) and run the full
/// pipeline over them.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
#[tracing::instrument(skip_all, fields(input_bytes = image_bytes.len()))]
pub fn process_image_bytes(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    let image = decode::decode_rgba(image_bytes)?;
    process(RgbaBuffer::from_image(&image), config)
}
