//! TUI rendering for Vigil using ratatui.

mod input;
mod theme;

pub use input::{InputPump, handle_events};
pub use theme::{Palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use vigil_engine::{App, BASE_URL_ENV, InputMode, PulseKind, VerdictPulse};
use vigil_types::{AnalysisResult, OutputCategory, truncate_with_ellipsis};

use self::theme::{STATUS_MISSING, STATUS_READY, risk_color};

const CATEGORY_BAR_WIDTH: usize = 20;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let palette = Palette::standard();

    // Clear with background color
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let input_height = match app.input_mode() {
        InputMode::Normal => 3,
        InputMode::Insert => 5,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(1),               // Verdict
            Constraint::Length(input_height), // Input
            Constraint::Length(7),            // History
            Constraint::Length(1),            // Status bar
        ])
        .split(frame.area());

    draw_verdict(frame, app, chunks[0], &palette);
    draw_input(frame, app, chunks[1], &palette);
    draw_history(frame, app, chunks[2], &palette);
    draw_status_bar(frame, app, chunks[3], &palette);
}

fn draw_verdict(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let border_style = app
        .pulse()
        .map_or(Style::default().fg(palette.bg_border), |pulse| {
            pulse_border_style(pulse, palette)
        });

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style)
        .padding(Padding::horizontal(1))
        .title_top(Line::from(vec![Span::styled(
            " Verdict ",
            styles::panel_title(palette),
        )]));

    let lines = if app.is_loading() {
        loading_lines(app, palette)
    } else if let Some(result) = app.last_result() {
        verdict_lines(result, palette)
    } else {
        welcome_lines(app, palette)
    };

    let panel = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}

/// Border emphasis while a verdict pulse is active. The flash starts loud
/// and decays to a plain colored border before the pulse clears.
fn pulse_border_style(pulse: &VerdictPulse, palette: &Palette) -> Style {
    let remaining = 1.0 - pulse.progress();
    match pulse.kind() {
        PulseKind::HarmfulFlash => {
            let mut style = Style::default().fg(palette.error);
            if remaining > 0.5 {
                style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
            }
            style
        }
        PulseKind::SafeBurst => {
            let mut style = Style::default().fg(palette.success);
            if remaining > 0.35 {
                style = style.add_modifier(Modifier::BOLD);
            }
            style
        }
    }
}

fn loading_lines(app: &App, palette: &Palette) -> Vec<Line<'static>> {
    let spinner = spinner_frame(app.tick_count());
    let preview = app
        .pending_text()
        .map(|text| truncate_with_ellipsis(text, 60))
        .unwrap_or_default();

    vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!(" {spinner} "),
                Style::default().fg(palette.primary),
            ),
            Span::styled("Analyzing...", Style::default().fg(palette.text_muted)),
        ]),
        Line::from(Span::styled(
            format!("   {preview}"),
            Style::default()
                .fg(palette.text_muted)
                .add_modifier(Modifier::ITALIC),
        )),
    ]
}

fn verdict_lines(result: &AnalysisResult, palette: &Palette) -> Vec<Line<'static>> {
    let risk_style = Style::default()
        .fg(risk_color(palette, result.risk_level))
        .add_modifier(Modifier::BOLD | Modifier::REVERSED);
    let (flag, flag_style) = if result.harmful {
        (
            "HARMFUL",
            Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("NOT HARMFUL", Style::default().fg(palette.success))
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!(" {} ", result.risk_level.as_str()), risk_style),
            Span::styled(" · ", Style::default().fg(palette.text_muted)),
            Span::styled(flag, flag_style),
        ]),
        Line::from(Span::styled(
            format!("   {}", result.timestamp),
            Style::default().fg(palette.text_muted),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" {}", truncate_with_ellipsis(&result.post, 120)),
            Style::default().fg(palette.text_secondary),
        )),
        Line::from(""),
    ];

    if !result.predicted_skills.is_empty() {
        lines.push(Line::from(vec![
            Span::styled(" Skills: ", Style::default().fg(palette.text_muted)),
            Span::styled(
                result.predicted_skills.join(", "),
                Style::default().fg(palette.accent),
            ),
        ]));
        lines.push(Line::from(""));
    }

    for category in &result.output {
        lines.push(category_line(category, palette));
    }

    lines
}

fn category_line(category: &OutputCategory, palette: &Palette) -> Line<'static> {
    let filled = (category.confidence * CATEGORY_BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(CATEGORY_BAR_WIDTH);
    let bar_color = if category.confidence >= 0.75 {
        palette.error
    } else if category.confidence >= 0.4 {
        palette.warning
    } else {
        palette.accent
    };

    Line::from(vec![
        Span::styled(
            format!(" {:<14}", truncate_with_ellipsis(&category.label, 14)),
            Style::default().fg(palette.text_secondary),
        ),
        Span::styled("█".repeat(filled), Style::default().fg(bar_color)),
        Span::styled(
            "░".repeat(CATEGORY_BAR_WIDTH - filled),
            Style::default().fg(palette.bg_highlight),
        ),
        Span::styled(
            format!(" {:>5.1}%", category.confidence * 100.0),
            Style::default().fg(palette.text_muted),
        ),
    ])
}

fn welcome_lines(app: &App, palette: &Palette) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Vigil - harmful content triage",
            Style::default()
                .fg(palette.primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "  Paste or type a post, then submit it for analysis.",
            Style::default().fg(palette.text_secondary),
        )),
        Line::from(""),
        hint_line("i", "  Enter insert mode to type", palette),
        hint_line("Enter", "  Analyze the draft", palette),
        hint_line("p", "  Paste from the clipboard", palette),
        hint_line("y", "  Copy the last verdict as JSON", palette),
        hint_line("c", "  Clear the draft and verdict", palette),
        hint_line("q", "  Quit", palette),
        Line::from(""),
    ];

    if let Some(url) = app.backend_url() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {STATUS_READY} "),
                Style::default().fg(palette.success),
            ),
            Span::styled(url.to_string(), Style::default().fg(palette.text_secondary)),
        ]));
    } else {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {STATUS_MISSING} "),
                Style::default().fg(palette.text_muted),
            ),
            Span::styled("No backend - set ", Style::default().fg(palette.text_muted)),
            Span::styled(BASE_URL_ENV, Style::default().fg(palette.warning)),
            Span::styled(
                " for live verdicts; offline example verdicts otherwise",
                Style::default().fg(palette.text_muted),
            ),
        ]));
    }

    lines
}

fn hint_line(key: &'static str, action: &'static str, palette: &Palette) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("    {key}"), styles::key_highlight(palette)),
        Span::styled(action, styles::key_hint(palette)),
    ])
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let mode = app.input_mode();
    let multiline = mode == InputMode::Insert && app.draft_text().contains('\n');

    let (mode_label, mode_style, border_style) = match mode {
        InputMode::Normal => (
            "NORMAL",
            styles::mode_normal(palette),
            Style::default().fg(palette.text_muted),
        ),
        InputMode::Insert => (
            "INSERT",
            styles::mode_insert(palette),
            Style::default().fg(palette.green),
        ),
    };
    let mode_text = if multiline {
        format!(" {mode_label} · MULTI ")
    } else {
        format!(" {mode_label} ")
    };

    let hints = match mode {
        InputMode::Normal => vec![
            Span::styled("i", styles::key_highlight(palette)),
            Span::styled(" insert  ", styles::key_hint(palette)),
            Span::styled("s", styles::key_highlight(palette)),
            Span::styled(" submit  ", styles::key_hint(palette)),
            Span::styled("p", styles::key_highlight(palette)),
            Span::styled(" paste  ", styles::key_hint(palette)),
            Span::styled("y", styles::key_highlight(palette)),
            Span::styled(" copy  ", styles::key_hint(palette)),
            Span::styled("c", styles::key_highlight(palette)),
            Span::styled(" clear  ", styles::key_hint(palette)),
            Span::styled("q", styles::key_highlight(palette)),
            Span::styled(" quit ", styles::key_hint(palette)),
        ],
        InputMode::Insert => vec![
            Span::styled("Enter", styles::key_highlight(palette)),
            Span::styled(" analyze  ", styles::key_hint(palette)),
            Span::styled("Shift+Enter", styles::key_highlight(palette)),
            Span::styled(" newline  ", styles::key_hint(palette)),
            Span::styled("Esc", styles::key_highlight(palette)),
            Span::styled(" normal ", styles::key_hint(palette)),
        ],
    };

    let prompt_char = if mode == InputMode::Insert { "❯" } else { "" };
    let prefix = format!(" {prompt_char} ");
    let prefix_width = prefix.width() as u16;

    let padding_v: u16 = match mode {
        InputMode::Normal => 0,
        InputMode::Insert if multiline => 0,
        InputMode::Insert => 1,
    };
    let inner_height = area
        .height
        .saturating_sub(2 + padding_v.saturating_mul(2))
        .max(1);
    let content_width = area
        .width
        .saturating_sub(2)
        .saturating_sub(prefix_width)
        .max(1) as usize;

    let mut cursor_pos: Option<(u16, u16)> = None;
    let input_lines: Vec<Line> = if mode == InputMode::Insert {
        let draft = app.draft_text();
        let cursor_index = app.draft_cursor_byte_index();
        let before_cursor = &draft[..cursor_index];
        let cursor_line_index = before_cursor.matches('\n').count();
        let cursor_column_width = before_cursor.rsplit('\n').next().unwrap_or("").width();

        let raw_lines: Vec<&str> = draft.split('\n').collect();
        let visible_lines = inner_height as usize;
        let start_line = (cursor_line_index + 1).saturating_sub(visible_lines);
        let end_line = (start_line + visible_lines).min(raw_lines.len());

        let mut display_lines = Vec::new();
        let mut horizontal_scroll: u16 = 0;

        for (idx, line) in raw_lines[start_line..end_line].iter().enumerate() {
            let is_cursor_line = start_line + idx == cursor_line_index;
            let mut line_text = (*line).to_string();
            if is_cursor_line && cursor_column_width >= content_width {
                let scroll_target = cursor_column_width - content_width + 1;
                let (byte_offset, skipped_width) = grapheme_scroll(line, scroll_target);
                line_text = line[byte_offset..].to_string();
                horizontal_scroll = skipped_width as u16;
            }

            let prefix_text = if idx == 0 {
                prefix.clone()
            } else {
                " ".repeat(prefix_width as usize)
            };
            display_lines.push(Line::from(vec![
                Span::styled(prefix_text, Style::default().fg(palette.primary)),
                Span::styled(line_text, Style::default().fg(palette.text_primary)),
            ]));
        }

        let cursor_row = cursor_line_index.saturating_sub(start_line) as u16;
        let cursor_x = area
            .x
            .saturating_add(1 + prefix_width)
            .saturating_add(cursor_column_width as u16)
            .saturating_sub(horizontal_scroll);
        let cursor_y = area
            .y
            .saturating_add(1 + padding_v)
            .saturating_add(cursor_row);
        cursor_pos = Some((cursor_x, cursor_y));

        display_lines
    } else {
        vec![Line::from(vec![
            Span::styled(prefix.clone(), Style::default().fg(palette.primary)),
            Span::styled(
                app.draft_text().to_string(),
                Style::default().fg(palette.text_secondary),
            ),
        ])]
    };

    let input = Paragraph::new(input_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_top(Line::from(vec![Span::styled(mode_text, mode_style)]))
            .title_top(Line::from(hints).alignment(Alignment::Right))
            .padding(Padding::vertical(padding_v)),
    );

    frame.render_widget(input, area);

    if let Some((cursor_x, cursor_y)) = cursor_pos {
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

/// Byte offset and skipped display width for horizontally scrolling `line`
/// so the cursor stays visible once it passes `scroll_target` columns.
/// Whole grapheme clusters are skipped, never split.
fn grapheme_scroll(line: &str, scroll_target: usize) -> (usize, usize) {
    let mut byte_offset = 0;
    let mut skipped_width = 0;
    for (idx, grapheme) in line.grapheme_indices(true) {
        if skipped_width >= scroll_target {
            byte_offset = idx;
            break;
        }
        skipped_width += grapheme.width();
    }
    (byte_offset, skipped_width)
}

fn draw_history(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.text_muted))
        .padding(Padding::horizontal(1))
        .title_top(Line::from(vec![Span::styled(
            " History ",
            styles::panel_title(palette),
        )]));

    let entries = app.history();
    if entries.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No analyses yet",
            Style::default()
                .fg(palette.text_muted)
                .add_modifier(Modifier::ITALIC),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    // Level badge + timestamp occupy a fixed prefix; the preview gets the rest.
    let preview_width = area.width.saturating_sub(36).max(10) as usize;
    let lines: Vec<Line> = entries
        .iter()
        .map(|entry| {
            let level_style = Style::default()
                .fg(risk_color(palette, entry.risk_level))
                .add_modifier(Modifier::BOLD);
            Line::from(vec![
                Span::styled(format!("{:<6}", entry.risk_level.as_str()), level_style),
                Span::styled(
                    format!(" {} ", entry.timestamp),
                    Style::default().fg(palette.text_muted),
                ),
                Span::styled(
                    truncate_with_ellipsis(&entry.text, preview_width),
                    Style::default().fg(palette.text_secondary),
                ),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let (status_text, status_style) = if let Some(notice) = app.notice() {
        (notice.to_string(), Style::default().fg(palette.warning))
    } else if app.is_loading() {
        let spinner = spinner_frame(app.tick_count());
        (
            format!("{spinner} Analyzing..."),
            Style::default().fg(palette.primary),
        )
    } else if let Some(url) = app.backend_url() {
        (
            format!("{STATUS_READY} {url}"),
            Style::default().fg(palette.success),
        )
    } else {
        (
            format!("{STATUS_MISSING} No backend configured │ Set {BASE_URL_ENV} or [backend] base_url"),
            Style::default().fg(palette.error),
        )
    };

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(status_text, status_style),
    ]));
    frame.render_widget(status, area);
}
