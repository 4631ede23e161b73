//! Timed visual effects: transient notices and verdict pulses.
//!
//! The engine owns the clocks. The TUI only reads progress; `App::tick`
//! advances and clears expired effects.

use std::time::Duration;

/// How long a transient notice stays on screen.
pub const NOTICE_DURATION: Duration = Duration::from_millis(3200);

/// Border flash after a harmful verdict.
pub const HARMFUL_FLASH_DURATION: Duration = Duration::from_millis(600);

/// Border burst after a safe verdict.
pub const SAFE_BURST_DURATION: Duration = Duration::from_millis(1100);

/// A short-lived status message that replaces the status bar content.
#[derive(Debug, Clone)]
pub struct Notice {
    text: String,
    elapsed: Duration,
}

impl Notice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            elapsed: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn advance(&mut self, delta: Duration) {
        self.elapsed = self.elapsed.saturating_add(delta);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= NOTICE_DURATION
    }
}

/// The kind of verdict pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseKind {
    HarmfulFlash,
    SafeBurst,
}

/// Animation state for the verdict border pulse.
#[derive(Debug, Clone)]
pub struct VerdictPulse {
    kind: PulseKind,
    elapsed: Duration,
    duration: Duration,
}

impl VerdictPulse {
    pub fn harmful_flash() -> Self {
        Self {
            kind: PulseKind::HarmfulFlash,
            elapsed: Duration::ZERO,
            duration: HARMFUL_FLASH_DURATION,
        }
    }

    pub fn safe_burst() -> Self {
        Self {
            kind: PulseKind::SafeBurst,
            elapsed: Duration::ZERO,
            duration: SAFE_BURST_DURATION,
        }
    }

    /// Advance the animation by the given delta time.
    pub fn advance(&mut self, delta: Duration) {
        self.elapsed = self.elapsed.saturating_add(delta);
    }

    /// Get the animation progress (0.0 to 1.0).
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = self.elapsed.as_secs_f32();
        let total = self.duration.as_secs_f32();
        (elapsed / total).clamp(0.0, 1.0)
    }

    /// Check if the animation is finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Get the pulse kind.
    #[must_use]
    pub fn kind(&self) -> PulseKind {
        self.kind
    }
}
