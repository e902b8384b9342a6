//! Foreground mask: threshold an RGBA buffer by luminance.
//!
//! This is the first step in the pipeline: raw RGBA bytes in, a mutable
//! boolean grid out. The grid is then handed to the tracer, which owns
//! it exclusively and clears cells as it consumes them.

use crate::types::{Dimensions, PipelineError, RgbaBuffer, RgbaImage};

/// Luminance of an 8-bit RGB triple, normalized to `[0, 1]`.
///
/// Uses the Rec. 601 weights `0.299*R + 0.587*G + 0.114*B`.
/// Evaluated without fused multiply-adds so pixels sitting exactly on a
/// cutoff classify the same way on every platform.
#[must_use]
#[allow(clippy::suboptimal_flops)]
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0
}

/// A width×height grid of "ink" cells awaiting tracing.
///
/// A cell is `true` while its source pixel is darker than the threshold
/// and has not yet been consumed by a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundMask {
    dimensions: Dimensions,
    cells: Vec<bool>,
}

impl ForegroundMask {
    /// Threshold a raw RGBA8 buffer into a foreground mask.
    ///
    /// A pixel is foreground iff its [`luminance`] is strictly below
    /// `threshold`, so a threshold of `0.0` yields an empty mask. The
    /// alpha channel is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if `pixels.len()` is not
    /// `width * height * 4`. Nothing is allocated in that case.
    pub fn build(
        pixels: &[u8],
        dimensions: Dimensions,
        threshold: f64,
    ) -> Result<Self, PipelineError> {
        let buffer = RgbaBuffer::new(pixels, dimensions)?;
        Ok(Self::from_buffer(buffer, threshold))
    }

    /// Threshold an already validated buffer.
    #[must_use]
    pub fn from_buffer(buffer: RgbaBuffer<'_>, threshold: f64) -> Self {
        let cells = buffer
            .pixels()
            .chunks_exact(4)
            .map(|px| luminance(px[0], px[1], px[2]) < threshold)
            .collect();
        Self {
            dimensions: buffer.dimensions(),
            cells,
        }
    }

    /// Threshold a decoded RGBA image.
    #[must_use]
    pub fn from_image(image: &RgbaImage, threshold: f64) -> Self {
        Self::from_buffer(RgbaBuffer::from_image(image), threshold)
    }

    /// Build a mask directly from a predicate over pixel positions.
    ///
    /// Handy for tests and for callers that already hold a binary image.
    #[must_use]
    pub fn from_fn(dimensions: Dimensions, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut cells = Vec::with_capacity(usize::try_from(dimensions.pixel_count()).unwrap_or(0));
        for y in 0..dimensions.height {
            for x in 0..dimensions.width {
                cells.push(f(x, y));
            }
        }
        Self { dimensions, cells }
    }

    /// Grid dimensions in pixels.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Whether `(x, y)` is inside the grid and still foreground.
    ///
    /// Takes signed coordinates so callers can probe neighbor offsets
    /// without checking for underflow first.
    #[must_use]
    pub fn is_foreground(&self, x: i64, y: i64) -> bool {
        self.index(x, y).is_some_and(|i| self.cells[i])
    }

    /// Mark `(x, y)` as consumed. Out-of-bounds positions are ignored.
    pub fn clear(&mut self, x: i64, y: i64) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = false;
        }
    }

    /// Consume `(x, y)` if it is still foreground.
    ///
    /// Returns `true` when the cell was foreground (and is now cleared).
    pub fn take(&mut self, x: i64, y: i64) -> bool {
        match self.index(x, y) {
            Some(i) if self.cells[i] => {
                self.cells[i] = false;
                true
            }
            _ => false,
        }
    }

    /// Number of cells still marked as foreground.
    #[must_use]
    pub fn foreground_count(&self) -> u64 {
        self.cells.iter().map(|&c| u64::from(c)).sum()
    }

    /// Returns `true` if no foreground cells remain.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        !self.cells.contains(&true)
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        if x >= self.dimensions.width || y >= self.dimensions.height {
            return None;
        }
        let row = usize::try_from(y).ok()?;
        let col = usize::try_from(x).ok()?;
        let width = usize::try_from(self.dimensions.width).ok()?;
        Some(row * width + col)
    }
}
