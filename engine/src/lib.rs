//! Core engine for Vigil - application state and orchestration.
//!
//! This crate contains the App state machine without TUI dependencies. All
//! shared state lives in [`App`] and is mutated only from the frame-loop
//! context; the analysis task communicates through its channel.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use vigil_client::{AnalysisOutcome, DetectorClient, EndpointConfig, ResultOrigin, ValidationError};
use vigil_store::HistoryStore;
use vigil_types::{AnalysisResult, HistoryEntry};

mod config;
mod effects;
mod input;

pub use config::{BASE_URL_ENV, BackendConfig, ConfigError, VigilConfig};
pub use effects::{PulseKind, VerdictPulse};
pub use input::InputMode;

use config::resolve_endpoint;
use effects::Notice;
use input::{DraftInput, InputState};


// ============================================================================
// ActiveAnalysis - async request in flight
// ============================================================================

/// An analysis in flight - existence proves a request is running.
/// The spawned task reports through the channel; nothing else is shared.
#[derive(Debug)]
struct ActiveAnalysis {
    receiver: mpsc::Receiver<AnalysisOutcome>,
    text: String,
}

#[derive(Debug)]
enum OperationState {
    Idle,
    Analyzing(ActiveAnalysis),
}

// ============================================================================
// Insert mode - proof-token editing
// ============================================================================

/// Proof token for Insert mode operations.
#[derive(Debug)]
pub struct InsertToken(());

/// Mode wrapper for safe insert operations.
pub struct InsertEditor<'a> {
    app: &'a mut App,
}

impl InsertEditor<'_> {
    fn draft_mut(&mut self) -> &mut DraftInput {
        self.app.input.draft_mut()
    }

    pub fn move_cursor_left(&mut self) {
        self.draft_mut().move_cursor_left();
    }

    pub fn move_cursor_right(&mut self) {
        self.draft_mut().move_cursor_right();
    }

    pub fn reset_cursor(&mut self) {
        self.draft_mut().reset_cursor();
    }

    pub fn move_cursor_end(&mut self) {
        self.draft_mut().move_cursor_end();
    }

    pub fn enter_char(&mut self, new_char: char) {
        self.draft_mut().enter_char(new_char);
    }

    pub fn enter_newline(&mut self) {
        self.draft_mut().enter_newline();
    }

    pub fn enter_text(&mut self, text: &str) {
        self.draft_mut().enter_text(text);
    }

    pub fn delete_char(&mut self) {
        self.draft_mut().delete_char();
    }

    pub fn delete_char_forward(&mut self) {
        self.draft_mut().delete_char_forward();
    }

    pub fn delete_word_backwards(&mut self) {
        self.draft_mut().delete_word_backwards();
    }
}

// ============================================================================
// App - the single owned state record
// ============================================================================

pub struct App {
    client: DetectorClient,
    store: HistoryStore,
    input: InputState,
    state: OperationState,
    last_result: Option<AnalysisResult>,
    notice: Option<Notice>,
    pulse: Option<VerdictPulse>,
    last_frame: Instant,
    tick: usize,
    should_quit: bool,
}

impl App {
    /// Build the app from the loaded config file (if any): resolve the
    /// backend endpoint and open the default history file.
    #[must_use]
    pub fn new(config: Option<&VigilConfig>) -> Self {
        Self::with_store(
            DetectorClient::new(resolve_endpoint(config)),
            HistoryStore::open_default(),
        )
    }

    /// Build the app over an explicit client and store. Tests point these
    /// at a mock server and a TempDir-backed history file.
    #[must_use]
    pub fn with_store(client: DetectorClient, store: HistoryStore) -> Self {
        let mut app = Self {
            client,
            store,
            input: InputState::default(),
            state: OperationState::Idle,
            last_result: None,
            notice: None,
            pulse: None,
            last_frame: Instant::now(),
            tick: 0,
            should_quit: false,
        };

        if !app.store.is_empty() {
            let count = app.store.len();
            let label = if count == 1 { "analysis" } else { "analyses" };
            app.set_notice(format!("Loaded {count} previous {label}"));
        }

        app
    }

    // ------------------------------------------------------------------
    // Submission lifecycle
    // ------------------------------------------------------------------

    /// Submit the current draft for analysis.
    ///
    /// Rejected with a notice while a request is already in flight (never
    /// queued) or when the trimmed draft is empty. Otherwise spawns the
    /// request task and transitions to `Analyzing`.
    pub fn submit(&mut self) {
        if self.is_loading() {
            self.set_notice("Analysis already in progress");
            return;
        }

        let text = self.input.draft().text().trim().to_string();
        if text.is_empty() {
            self.set_notice(ValidationError.to_string());
            return;
        }

        let (sender, receiver) = mpsc::channel(1);
        let client = self.client.clone();
        let task_text = text.clone();
        tokio::spawn(async move {
            if let Ok(outcome) = client.analyze(&task_text).await {
                let _ = sender.send(outcome).await;
            }
        });

        tracing::debug!(chars = text.len(), "analysis submitted");
        self.state = OperationState::Analyzing(ActiveAnalysis { receiver, text });
    }

    /// Drain the in-flight analysis, if any. Called every frame.
    pub fn poll_analysis(&mut self) {
        let OperationState::Analyzing(active) = &mut self.state else {
            return;
        };

        match active.receiver.try_recv() {
            Ok(outcome) => {
                self.state = OperationState::Idle;
                self.finish_analysis(outcome);
            }
            Err(mpsc::error::TryRecvError::Empty) => {}
            Err(mpsc::error::TryRecvError::Disconnected) => {
                tracing::warn!("Analysis task dropped without reporting a result");
                self.state = OperationState::Idle;
                self.set_notice("analysis stopped unexpectedly");
            }
        }
    }

    fn finish_analysis(&mut self, outcome: AnalysisOutcome) {
        let AnalysisOutcome { result, origin } = outcome;

        self.pulse = Some(if result.harmful {
            VerdictPulse::harmful_flash()
        } else {
            VerdictPulse::safe_burst()
        });

        if let Err(err) = self.store.append(HistoryEntry::from_result(&result)) {
            tracing::warn!("Failed to persist history: {err}");
            self.set_notice(format!("history not saved: {err}"));
        }

        if let ResultOrigin::Fallback(cause) = &origin {
            self.set_notice(cause.reason());
        }

        self.last_result = Some(result);
    }

    // ------------------------------------------------------------------
    // Frame advancement
    // ------------------------------------------------------------------

    /// Advance one frame: bump the animation tick and age visual effects.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        let elapsed = self.frame_elapsed();
        self.advance_effects(elapsed);
    }

    /// Get elapsed time since last frame and update timing.
    fn frame_elapsed(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        elapsed
    }

    /// Advance notice and pulse timers, dropping the ones that finished.
    pub fn advance_effects(&mut self, delta: Duration) {
        if let Some(notice) = &mut self.notice {
            notice.advance(delta);
            if notice.is_finished() {
                self.notice = None;
            }
        }

        if let Some(pulse) = &mut self.pulse {
            pulse.advance(delta);
            if pulse.is_finished() {
                self.pulse = None;
            }
        }
    }

    // ------------------------------------------------------------------
    // Input operations
    // ------------------------------------------------------------------

    /// Append clipboard text to the draft, separated by a newline when the
    /// draft already has content. The cursor lands after the pasted text.
    pub fn paste_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        let draft = self.input.draft_mut();
        draft.move_cursor_end();
        if !draft.text().is_empty() {
            draft.enter_newline();
        }
        draft.enter_text(text);
    }

    /// Reset the draft and discard the last displayed result.
    pub fn clear_input(&mut self) {
        self.input.draft_mut().clear();
        self.last_result = None;
        self.pulse = None;
    }

    pub fn enter_insert_mode(&mut self) {
        self.input = std::mem::take(&mut self.input).into_insert();
    }

    pub fn enter_normal_mode(&mut self) {
        self.input = std::mem::take(&mut self.input).into_normal();
    }

    /// Get proof token if currently in Insert mode.
    pub fn insert_token(&self) -> Option<InsertToken> {
        matches!(&self.input, InputState::Insert(_)).then_some(InsertToken(()))
    }

    /// Get insert editor (requires proof token).
    pub fn insert_editor(&mut self, _token: InsertToken) -> InsertEditor<'_> {
        InsertEditor { app: self }
    }

    // ------------------------------------------------------------------
    // Accessors consumed by the presentation layer
    // ------------------------------------------------------------------

    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    /// Pretty-printed JSON of the last verdict, for the clipboard.
    #[must_use]
    pub fn result_json(&self) -> Option<String> {
        let result = self.last_result.as_ref()?;
        serde_json::to_string_pretty(result).ok()
    }

    /// Whether an analysis is currently in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, OperationState::Analyzing(_))
    }

    /// The trimmed text being analyzed, while a request is in flight.
    pub fn pending_text(&self) -> Option<&str> {
        match &self.state {
            OperationState::Analyzing(active) => Some(&active.text),
            OperationState::Idle => None,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(Notice::text)
    }

    pub fn set_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice::new(text));
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.store.entries()
    }

    pub fn pulse(&self) -> Option<&VerdictPulse> {
        self.pulse.as_ref()
    }

    pub fn draft_text(&self) -> &str {
        self.input.draft().text()
    }

    pub fn draft_cursor_byte_index(&self) -> usize {
        self.input.draft().byte_index()
    }

    pub fn input_mode(&self) -> InputMode {
        self.input.mode()
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    pub fn backend_url(&self) -> Option<&str> {
        self.client.endpoint().map(EndpointConfig::base_url)
    }

    pub fn tick_count(&self) -> usize {
        self.tick
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }
}
