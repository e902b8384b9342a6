//! Export triggers: keyboard shortcuts, double-clicks, and double-taps.
//!
//! Touch input has no native double-tap event, so [`DoubleTapDetector`]
//! pairs taps itself: a second tap strictly within [`DOUBLE_TAP_WINDOW`]
//! of the first fires, anything slower starts over.

use std::time::Duration;

use web_time::Instant;

/// Maximum gap between two taps that still counts as a double-tap.
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);

/// Returns `true` for the keys that request an export (`s` or `S`).
#[must_use]
pub fn is_export_key(key: &str) -> bool {
    matches!(key, "s" | "S")
}

/// Where the double-tap detector is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapState {
    /// No tap pending.
    Idle,
    /// One tap seen; a second before the window closes fires.
    AwaitingSecondTap {
        /// When the first tap landed.
        first_at: Instant,
    },
}

/// Two-state machine that recognizes double-taps.
#[derive(Debug, Clone)]
pub struct DoubleTapDetector {
    state: TapState,
    window: Duration,
}

impl Default for DoubleTapDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl DoubleTapDetector {
    /// Detector with the standard [`DOUBLE_TAP_WINDOW`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_window(DOUBLE_TAP_WINDOW)
    }

    /// Detector with a custom window.
    #[must_use]
    pub const fn with_window(window: Duration) -> Self {
        Self {
            state: TapState::Idle,
            window,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TapState {
        self.state
    }

    /// Record a tap at `now`. Returns `true` when it completes a
    /// double-tap, after which the detector is back in `Idle`.
    ///
    /// A tap at the same instant as the pending one, or one at or past
    /// the window, replaces the pending tap instead of firing.
    pub fn tap(&mut self, now: Instant) -> bool {
        self.expire(now);
        match self.state {
            TapState::AwaitingSecondTap { first_at }
                if now > first_at && now.duration_since(first_at) < self.window =>
            {
                self.state = TapState::Idle;
                true
            }
            _ => {
                self.state = TapState::AwaitingSecondTap { first_at: now };
                false
            }
        }
    }

    /// Drop a pending tap whose window has closed by `now`.
    pub fn expire(&mut self, now: Instant) {
        if let TapState::AwaitingSecondTap { first_at } = self.state
            && now.saturating_duration_since(first_at) >= self.window
        {
            self.state = TapState::Idle;
        }
    }
}

/// Raw input events that may request an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent<'a> {
    /// A key press, by its key value (`"s"`, `"Enter"`, ...).
    Key(&'a str),
    /// A desktop double-click.
    DoubleClick,
    /// A single touch tap at the given time.
    Tap(Instant),
}

/// An export request recognized from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTrigger {
    /// The export shortcut key.
    Keyboard,
    /// A double-click or double-tap on the drawing.
    Pointer,
    /// A direct request from code or the command line.
    Command,
}

impl ExportTrigger {
    /// Feed one event through `detector`, returning the export request
    /// it completes, if any.
    pub fn recognize(event: TriggerEvent<'_>, detector: &mut DoubleTapDetector) -> Option<Self> {
        match event {
            TriggerEvent::Key(key) => is_export_key(key).then_some(Self::Keyboard),
            TriggerEvent::DoubleClick => Some(Self::Pointer),
            TriggerEvent::Tap(now) => detector.tap(now).then_some(Self::Pointer),
        }
    }
}
