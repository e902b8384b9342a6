//! Export sinks: where a finished SVG document goes.

use std::path::{Path, PathBuf};

use plotrace_pipeline::PipelineError;

use crate::capture::CaptureError;

/// Filename used when no seed is known.
pub const DEFAULT_FILENAME: &str = "plotter-optimized.svg";

/// Errors that can occur while exporting.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Another export is still running.
    #[error("an export is already in progress")]
    Busy,

    /// The frame could not be captured.
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// The pipeline rejected the frame or configuration.
    #[error("pipeline failed: {0}")]
    Pipeline(#[from] PipelineError),

    /// The configuration could not be embedded as JSON metadata.
    #[error("failed to serialize configuration: {0}")]
    Metadata(#[from] serde_json::Error),

    /// The document could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Destination that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Destination for exported documents.
pub trait ExportSink {
    /// Deliver `contents` under `filename`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Write`] if the document cannot be stored.
    fn deliver(&mut self, filename: &str, contents: &str) -> Result<(), ExportError>;
}

/// Writes documents into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl FileSink {
    /// Create a sink that writes into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Directory documents are written into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, oldest first.
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ExportSink for FileSink {
    fn deliver(&mut self, filename: &str, contents: &str) -> Result<(), ExportError> {
        let path = self.dir.join(filename);
        let write_error = |source| ExportError::Write {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(write_error)?;
        std::fs::write(&path, contents).map_err(write_error)?;
        tracing::info!(path = %path.display(), bytes = contents.len(), "wrote svg");
        self.written.push(path);
        Ok(())
    }
}

/// Keeps delivered documents in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// `(filename, contents)` pairs in delivery order.
    pub documents: Vec<(String, String)>,
}

impl ExportSink for MemorySink {
    fn deliver(&mut self, filename: &str, contents: &str) -> Result<(), ExportError> {
        self.documents
            .push((filename.to_owned(), contents.to_owned()));
        Ok(())
    }
}

/// Pick the export filename for an optional scene seed.
///
/// With a seed the name is `reef-<seed>.svg`; otherwise it is
/// [`DEFAULT_FILENAME`]. Characters other than ASCII letters, digits,
/// `-`, and `_` in the seed are replaced with `-` so the result is
/// always a bare filename.
#[must_use]
pub fn suggested_filename(seed: Option<&str>) -> String {
    match seed {
        Some(seed) if !seed.is_empty() => {
            let safe: String = seed
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                        c
                    } else {
                        '-'
                    }
                })
                .collect();
            format!("reef-{safe}.svg")
        }
        _ => DEFAULT_FILENAME.to_owned(),
    }
}
