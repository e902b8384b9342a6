//! Frame capture: produce the RGBA pixels the pipeline consumes.
//!
//! A [`FrameSource`] hands over one frame per call. Sources read image
//! files from disk or wrap a frame already in memory (a rendered
//! canvas, a decoded upload).

use std::path::{Path, PathBuf};

use plotrace_pipeline::{PipelineError, RgbaImage, decode};

/// Errors that can occur while capturing a frame.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The image file could not be opened or read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its contents are not a supported image.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        /// File that was being decoded.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// Encoded bytes could not be turned into pixels.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Something that can produce an RGBA frame on demand.
pub trait FrameSource {
    /// Capture the current frame.
    ///
    /// # Errors
    ///
    /// Returns a [`CaptureError`] if the frame cannot be produced.
    fn capture(&self) -> Result<RgbaImage, CaptureError>;

    /// Human-readable name for the frame, used as the SVG title.
    fn label(&self) -> Option<String> {
        None
    }
}

/// Reads and decodes an image file on every capture.
#[derive(Debug, Clone)]
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    /// Create a source for the image at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this source reads from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for ImageFileSource {
    fn capture(&self) -> Result<RgbaImage, CaptureError> {
        let image = load_image(&self.path)?;
        tracing::debug!(
            path = %self.path.display(),
            width = image.width(),
            height = image.height(),
            "captured frame from file",
        );
        Ok(image)
    }

    fn label(&self) -> Option<String> {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    }
}

/// Hands out clones of a frame held in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    image: RgbaImage,
    label: Option<String>,
}

impl InMemorySource {
    /// Wrap an already-decoded frame.
    #[must_use]
    pub const fn new(image: RgbaImage) -> Self {
        Self { image, label: None }
    }

    /// Decode encoded image bytes (PNG, JPEG, BMP, WebP) into a source.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Pipeline`] if the bytes are empty or not
    /// a supported image.
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, CaptureError> {
        Ok(Self::new(decode::decode_rgba(bytes)?))
    }

    /// Attach a label used as the exported document's title.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl FrameSource for InMemorySource {
    fn capture(&self) -> Result<RgbaImage, CaptureError> {
        Ok(self.image.clone())
    }

    fn label(&self) -> Option<String> {
        self.label.clone()
    }
}

/// Open and decode an image file, guessing the format from its contents.
///
/// # Errors
///
/// Returns [`CaptureError::Read`] if the file cannot be opened and
/// [`CaptureError::Decode`] if it is not a supported image.
pub fn load_image(path: &Path) -> Result<RgbaImage, CaptureError> {
    let read_error = |source| CaptureError::Read {
        path: path.to_path_buf(),
        source,
    };
    let reader = image::ImageReader::open(path)
        .map_err(read_error)?
        .with_guessed_format()
        .map_err(read_error)?;
    let image = reader.decode().map_err(|source| CaptureError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}
