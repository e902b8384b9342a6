//! Image decoding into an RGBA pixel buffer.
//!
//! Accepts encoded image bytes (PNG, JPEG, BMP, WebP) and produces the
//! `width*height*4` RGBA8 buffer the foreground mask consumes. Callers
//! that already hold raw pixels (a captured frame, a canvas readback)
//! skip this step and go straight to [`RgbaBuffer::new`](crate::RgbaBuffer::new).

use image::RgbaImage;

use crate::types::PipelineError;

/// Decode encoded image bytes into an RGBA8 image.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}
