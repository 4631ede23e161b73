//! Input handling for the Vigil TUI.

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;
use tracing::warn;

use vigil_engine::{App, InputMode};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Dedicated blocking reader thread feeding terminal events into a bounded
/// channel. The frame loop drains it without ever blocking on the terminal.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(stop2, tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close the receiver first to ensure the input thread unblocks if it
        // is currently backpressured on a send (e.g., during a large paste).
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop if caller exits early; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    // Bounded queue: apply backpressure instead of dropping
                    // events, so multi-line pastes arrive intact.
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain pending terminal events into the app. Returns `Ok(true)` when the
/// app should exit.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<bool> {
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };

        if apply_event(app, ev) {
            return Ok(true);
        }
        processed += 1;
    }
    Ok(app.should_quit())
}

fn apply_event(app: &mut App, event: Event) -> bool {
    match event {
        Event::Key(key) => {
            // Handle press + repeat events (ignore releases)
            if matches!(key.kind, KeyEventKind::Release) {
                return app.should_quit();
            }

            // Ctrl+C quits from any mode
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                app.request_quit();
                return true;
            }

            match app.input_mode() {
                InputMode::Normal => handle_normal_mode(app, key),
                InputMode::Insert => handle_insert_mode(app, key),
            }
        }
        Event::Paste(text) => {
            let normalized = normalize_line_endings(&text);
            if app.input_mode() == InputMode::Insert {
                let Some(token) = app.insert_token() else {
                    return app.should_quit();
                };
                app.insert_editor(token).enter_text(&normalized);
            } else {
                app.paste_text(&normalized);
            }
        }
        _ => {}
    }
    app.should_quit()
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.request_quit();
        }
        KeyCode::Char('i') => {
            app.enter_insert_mode();
        }
        KeyCode::Char('s') => {
            app.submit();
        }
        KeyCode::Char('p') => {
            paste_from_clipboard(app);
        }
        KeyCode::Char('y') => {
            copy_result_to_clipboard(app);
        }
        KeyCode::Char('c') => {
            app.clear_input();
        }
        // Reserved for scrolling once history can exceed the panel height.
        KeyCode::Char('j' | 'k') | KeyCode::Up | KeyCode::Down => {}
        _ => {}
    }
}

fn handle_insert_mode(app: &mut App, key: KeyEvent) {
    // Enter and Ctrl+Enter submit; Shift+Enter and Ctrl+J insert a newline.
    let is_newline = matches!(
        (key.code, key.modifiers),
        (KeyCode::Enter, m) if m.contains(KeyModifiers::SHIFT)
    ) || matches!(key, KeyEvent { code: KeyCode::Char('j'), modifiers: m, .. } if m.contains(KeyModifiers::CONTROL));

    if is_newline {
        let Some(token) = app.insert_token() else {
            return;
        };
        app.insert_editor(token).enter_newline();
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.enter_normal_mode();
        }
        KeyCode::Enter => {
            app.submit();
        }
        // Backspace: exit insert mode if empty, otherwise delete char
        KeyCode::Backspace => {
            if app.draft_text().is_empty() {
                app.enter_normal_mode();
            } else if let Some(token) = app.insert_token() {
                app.insert_editor(token).delete_char();
            }
        }
        _ => {
            let Some(token) = app.insert_token() else {
                return;
            };
            let mut editor = app.insert_editor(token);

            match key.code {
                KeyCode::Delete => {
                    editor.delete_char_forward();
                }
                KeyCode::Left => {
                    editor.move_cursor_left();
                }
                KeyCode::Right => {
                    editor.move_cursor_right();
                }
                KeyCode::Home => {
                    editor.reset_cursor();
                }
                KeyCode::End => {
                    editor.move_cursor_end();
                }
                KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    editor.delete_word_backwards();
                }
                // Insert character (ignore \r - it arrives via Enter or normalized paste)
                KeyCode::Char(c) if c != '\r' => {
                    editor.enter_char(c);
                }
                _ => {}
            }
        }
    }
}

fn paste_from_clipboard(app: &mut App) {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.get_text()) {
        Ok(text) => app.paste_text(&normalize_line_endings(&text)),
        Err(err) => {
            warn!("Clipboard read failed: {err}");
            app.set_notice("clipboard access denied");
        }
    }
}

fn copy_result_to_clipboard(app: &mut App) {
    let Some(json) = app.result_json() else {
        app.set_notice("no result to copy");
        return;
    };

    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(json)) {
        Ok(()) => app.set_notice("verdict copied as JSON"),
        Err(err) => {
            warn!("Clipboard write failed: {err}");
            app.set_notice("clipboard access denied");
        }
    }
}
