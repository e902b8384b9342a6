//! Export controller: capture -> pipeline -> SVG -> sink, one run at a time.
//!
//! Runs are synchronous. A run that is requested while another is in
//! flight (for example from an input callback fired during capture) is
//! rejected with [`ExportError::Busy`] rather than queued.

use std::cell::{Cell, RefCell};

use plotrace_export::{SvgMetadata, VectorDocument, to_svg};
use plotrace_pipeline::{
    PipelineConfig, PipelineDiagnostics, RgbaBuffer, WebClock, process_with_diagnostics,
};

use crate::capture::FrameSource;
use crate::sink::{DEFAULT_FILENAME, ExportError, ExportSink, suggested_filename};
use crate::trigger::{DoubleTapDetector, ExportTrigger, TriggerEvent};

/// What a completed export produced.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    /// Name the document was delivered under.
    pub filename: String,
    /// The serialized document.
    pub document: VectorDocument,
    /// Per-stage timings and counts for the run.
    pub diagnostics: PipelineDiagnostics,
    /// Size of the SVG text in bytes.
    pub svg_bytes: usize,
}

/// Clears the busy flag when a run ends, however it ends.
struct BusyGuard<'a>(&'a Cell<bool>);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Owns the export configuration and sink, and serializes export runs.
pub struct ExportController<K> {
    config: PipelineConfig,
    seed: Option<String>,
    filename: Option<String>,
    sink: RefCell<K>,
    detector: RefCell<DoubleTapDetector>,
    busy: Cell<bool>,
}

impl<K: ExportSink> ExportController<K> {
    /// Create a controller that delivers to `sink`.
    pub fn new(config: PipelineConfig, sink: K) -> Self {
        Self {
            config,
            seed: None,
            filename: None,
            sink: RefCell::new(sink),
            detector: RefCell::new(DoubleTapDetector::new()),
            busy: Cell::new(false),
        }
    }

    /// Name pointer and command exports after a scene seed.
    #[must_use]
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// Always deliver under `filename`, whatever the trigger.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// The pipeline configuration used for every run.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Whether a run is in progress.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Consume the controller and return its sink.
    pub fn into_sink(self) -> K {
        self.sink.into_inner()
    }

    /// Filename for an export requested by `trigger`.
    ///
    /// An explicit filename wins. Otherwise keyboard exports use
    /// [`DEFAULT_FILENAME`] and every other export is named after the
    /// seed.
    #[must_use]
    pub fn filename_for(&self, trigger: ExportTrigger) -> String {
        if let Some(ref name) = self.filename {
            return name.clone();
        }
        match trigger {
            ExportTrigger::Keyboard => DEFAULT_FILENAME.to_owned(),
            ExportTrigger::Pointer | ExportTrigger::Command => {
                suggested_filename(self.seed.as_deref())
            }
        }
    }

    /// Feed an input event; run an export if it completes a trigger.
    ///
    /// Returns `None` when the event does not request an export.
    pub fn handle(
        &self,
        event: TriggerEvent<'_>,
        source: &dyn FrameSource,
    ) -> Option<Result<ExportOutcome, ExportError>> {
        let trigger = ExportTrigger::recognize(event, &mut self.detector.borrow_mut())?;
        tracing::info!(?trigger, "export requested");
        Some(self.export(trigger, source))
    }

    /// Capture a frame, trace it, and deliver the SVG.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Busy`] if another run is in progress,
    /// and otherwise propagates capture, pipeline, metadata, and sink
    /// failures. The busy flag is cleared on every exit path.
    pub fn export(
        &self,
        trigger: ExportTrigger,
        source: &dyn FrameSource,
    ) -> Result<ExportOutcome, ExportError> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::warn!("export rejected: previous export still running");
            return Err(ExportError::Busy);
        };

        let frame = source.capture()?;
        let (staged, diagnostics) =
            process_with_diagnostics(RgbaBuffer::from_image(&frame), &self.config, &WebClock)?;
        let document = VectorDocument::from_result(staged.into_process_result(), &self.config);

        let title = source.label();
        let description = format!(
            "plotrace threshold={} paths={}",
            self.config.threshold,
            document.paths.len(),
        );
        let config_json = serde_json::to_string(&self.config)?;
        let svg = to_svg(
            &document,
            &SvgMetadata {
                title: title.as_deref(),
                description: Some(&description),
                config_json: Some(&config_json),
            },
        );

        let filename = self.filename_for(trigger);
        self.sink.borrow_mut().deliver(&filename, &svg)?;
        tracing::info!(
            %filename,
            paths = document.paths.len(),
            bytes = svg.len(),
            "export complete",
        );

        Ok(ExportOutcome {
            filename,
            document,
            diagnostics,
            svg_bytes: svg.len(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use plotrace_pipeline::{PipelineError, RgbaImage};
    use web_time::Instant;

    use super::*;
    use crate::capture::{CaptureError, InMemorySource};
    use crate::sink::MemorySink;

    fn strokes() -> RgbaImage {
        RgbaImage::from_fn(16, 8, |x, y| {
            if (y == 2 && x < 5) || (y == 6 && x > 9) {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        })
    }

    fn controller() -> ExportController<MemorySink> {
        ExportController::new(PipelineConfig::default(), MemorySink::default())
    }

    struct FailingSource;

    impl FrameSource for FailingSource {
        fn capture(&self) -> Result<RgbaImage, CaptureError> {
            Err(CaptureError::Pipeline(PipelineError::EmptyInput))
        }
    }

    /// Tries to start a second export from inside capture.
    struct ReentrantSource<'a> {
        controller: &'a ExportController<MemorySink>,
        nested: RefCell<Option<Result<ExportOutcome, ExportError>>>,
    }

    impl FrameSource for ReentrantSource<'_> {
        fn capture(&self) -> Result<RgbaImage, CaptureError> {
            let inner = InMemorySource::new(strokes());
            *self.nested.borrow_mut() = Some(self.controller.export(ExportTrigger::Keyboard, &inner));
            Ok(strokes())
        }
    }

    #[test]
    fn keyboard_export_delivers_svg() {
        let controller = controller();
        let source = InMemorySource::new(strokes()).with_label("scene");
        let outcome = controller.export(ExportTrigger::Keyboard, &source).unwrap();

        assert_eq!(outcome.filename, "plotter-optimized.svg");
        assert_eq!(outcome.document.paths.len(), 2);
        assert_eq!(outcome.diagnostics.summary.path_count, 2);
        assert!(!controller.is_busy());

        let sink = controller.into_sink();
        assert_eq!(sink.documents.len(), 1);
        let (name, svg) = &sink.documents[0];
        assert_eq!(name, "plotter-optimized.svg");
        assert_eq!(svg.len(), outcome.svg_bytes);
        assert!(svg.contains("<title>scene</title>"));
        assert!(svg.contains("<plotrace:pipeline"));
        assert_eq!(svg.matches("<path").count(), 2);
    }

    #[test]
    fn pointer_export_uses_seed() {
        let controller = controller().with_seed("1234");
        assert_eq!(controller.filename_for(ExportTrigger::Pointer), "reef-1234.svg");
        assert_eq!(controller.filename_for(ExportTrigger::Command), "reef-1234.svg");
        assert_eq!(
            self::controller().filename_for(ExportTrigger::Command),
            "plotter-optimized.svg"
        );
        assert_eq!(
            controller.filename_for(ExportTrigger::Keyboard),
            "plotter-optimized.svg"
        );
    }

    #[test]
    fn explicit_filename_wins() {
        let controller = controller().with_seed("1234").with_filename("mine.svg");
        assert_eq!(controller.filename_for(ExportTrigger::Pointer), "mine.svg");
        assert_eq!(controller.filename_for(ExportTrigger::Keyboard), "mine.svg");
    }

    #[test]
    fn reentrant_export_is_rejected() {
        let controller = controller();
        let source = ReentrantSource {
            controller: &controller,
            nested: RefCell::new(None),
        };
        let outer = controller.export(ExportTrigger::Keyboard, &source);
        assert!(outer.is_ok());
        let nested = source.nested.into_inner().unwrap();
        assert!(matches!(nested, Err(ExportError::Busy)));
        assert!(!controller.is_busy());
        assert_eq!(controller.into_sink().documents.len(), 1);
    }

    #[test]
    fn failed_capture_clears_busy_flag() {
        let controller = controller();
        let err = controller
            .export(ExportTrigger::Keyboard, &FailingSource)
            .unwrap_err();
        assert!(matches!(err, ExportError::Capture(_)));
        assert!(!controller.is_busy());

        let ok = controller.export(ExportTrigger::Keyboard, &InMemorySource::new(strokes()));
        assert!(ok.is_ok());
    }

    #[test]
    fn invalid_config_is_reported() {
        let config = PipelineConfig {
            threshold: 3.0,
            ..PipelineConfig::default()
        };
        let controller = ExportController::new(config, MemorySink::default());
        let err = controller
            .export(ExportTrigger::Keyboard, &InMemorySource::new(strokes()))
            .unwrap_err();
        assert!(matches!(err, ExportError::Pipeline(PipelineError::InvalidConfig(_))));
        assert!(controller.into_sink().documents.is_empty());
    }

    #[test]
    fn handle_runs_on_trigger_events_only() {
        let controller = controller().with_seed("7");
        let source = InMemorySource::new(strokes());
        let t0 = Instant::now();

        assert!(controller.handle(TriggerEvent::Key("q"), &source).is_none());
        assert!(controller.handle(TriggerEvent::Tap(t0), &source).is_none());
        let outcome = controller
            .handle(TriggerEvent::Tap(t0 + Duration::from_millis(150)), &source)
            .unwrap()
            .unwrap();
        assert_eq!(outcome.filename, "reef-7.svg");

        let outcome = controller
            .handle(TriggerEvent::Key("s"), &source)
            .unwrap()
            .unwrap();
        assert_eq!(outcome.filename, "plotter-optimized.svg");
        assert_eq!(controller.into_sink().documents.len(), 2);
    }
}
