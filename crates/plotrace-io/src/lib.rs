//! plotrace-io: The collaborators around the sans-IO pipeline.
//!
//! Captures frames from image files or encoded bytes, writes finished
//! SVG documents to an export sink, and turns key presses and taps into
//! export requests guarded against overlapping runs.

pub mod capture;
pub mod controller;
pub mod sink;
pub mod trigger;

pub use capture::{CaptureError, FrameSource, ImageFileSource, InMemorySource};
pub use controller::{ExportController, ExportOutcome};
pub use sink::{DEFAULT_FILENAME, ExportError, ExportSink, FileSink, MemorySink, suggested_filename};
pub use trigger::{DoubleTapDetector, ExportTrigger, TapState, TriggerEvent, is_export_key};
