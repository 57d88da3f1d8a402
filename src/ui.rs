//! UI rendering helpers for the terminal user interface.
//!
//! Layout, top to bottom: header, status box, track list, player bar,
//! controls help. The metadata popup is drawn over the list.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::catalog::Track;
use crate::config::{ControlsSettings, UiSettings};

const LEFT_PAD: Padding = Padding {
    left: 1,
    right: 0,
    top: 0,
    bottom: 0,
};

/// Format seconds as `mm:ss`. Negative or non-finite input renders as `00:00`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let secs = seconds.floor() as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn controls_text(controls: &ControlsSettings) -> String {
    let step = (controls.volume_step * 100.0).round();
    [
        "[j/k] up/down".to_string(),
        "[h/l] prev/next".to_string(),
        format!("[H/L] seek -/+{}s", controls.seek_seconds),
        "[enter] play selected".to_string(),
        "[space/p] play/pause".to_string(),
        format!("[-/+] volume -/+{step}%"),
        "[m] mute".to_string(),
        "[gg/G] top/bottom".to_string(),
        "[zz] now playing".to_string(),
        "[K] metadata".to_string(),
        "[/] filter".to_string(),
        "[q] quit".to_string(),
    ]
    .join(" | ")
}

fn status_text(app: &App) -> String {
    let mut parts: Vec<String> = Vec::new();

    if app.follow_playback {
        parts.push(" CURSOR: Follow".to_string());
    } else {
        parts.push(" CURSOR: Free-roam".to_string());
    }

    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        if q.is_empty() {
            parts.push("FILTER:".to_string());
        } else {
            parts.push(format!("FILTER: {q}"));
        }
    }

    parts.push(format!("{} tracks", app.tracks.len()));
    if let Some(source) = &app.source_label {
        parts.push(format!("Catalog: {source}"));
    }
    if let Some(msg) = &app.status_message {
        parts.push(msg.clone());
    }

    parts.join(" • ")
}

/// Title line of the player bar.
fn now_playing_line(app: &App) -> String {
    if !app.player_available {
        return "player unavailable".to_string();
    }
    match &app.playback.current_track {
        Some(track) => {
            let icon = if app.playback.is_playing { "▶" } else { "⏸" };
            format!("{icon} {} · {}", track.title, track.user.display_name)
        }
        None => "Nothing playing".to_string(),
    }
}

fn volume_text(volume: f32) -> String {
    if volume <= 0.0 {
        "vol muted".to_string()
    } else {
        format!("vol {:.0}%", volume * 100.0)
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width.saturating_sub(2)).max(10);
    let height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn metadata_text(track: Option<&Track>) -> String {
    let Some(track) = track else {
        return "No track selected".to_string();
    };
    let uploaded = track
        .uploaded_at
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    let duration = if track.duration > 0 {
        format_duration(f64::from(track.duration))
    } else {
        "-".to_string()
    };
    format!(
        "Title: {}\nBy: {}\nGenre: {}\nDuration: {}\nLikes: {}\nUploaded: {}\nSource: {}",
        track.title,
        track.user.display_name,
        track.genre,
        duration,
        track.like_count,
        uploaded,
        track.audio_url
    )
}

/// Apply filter highlighting by upper-casing matched characters.
fn highlighted(app: &App, index: usize, title: String) -> String {
    let Some(positions) = app.filter_highlights(index) else {
        return title;
    };
    let mut rendered = String::with_capacity(title.len());
    let mut pos_iter = positions.into_iter().peekable();
    for (ci, ch) in title.chars().enumerate() {
        if pos_iter.peek() == Some(&ci) {
            rendered.extend(ch.to_uppercase());
            pos_iter.next();
        } else {
            rendered.push(ch);
        }
    }
    rendered
}

fn draw_list(frame: &mut Frame, app: &App, display: &[usize], area: Rect) {
    let filtering = !app.filter_query.trim().is_empty();
    let playing = app.now_playing_index();

    // Only build items for the window around the selection.
    let total = display.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
    let (start, end) = if total <= list_height || list_height == 0 {
        (0, total)
    } else {
        let half = list_height / 2;
        let start = sel_pos.saturating_sub(half).min(total - list_height);
        (start, start + list_height)
    };

    let items: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let mut title = app.tracks[i].display();
            if filtering {
                title = highlighted(app, i, title);
            }
            if playing == Some(i) {
                ListItem::new(format!("♪ {title}"))
                    .style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                ListItem::new(title)
            }
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" tracks "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if total > 0 {
        state.select(Some(sel_pos - start));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_player_bar(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::bordered().padding(LEFT_PAD).title(" now playing ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let snapshot = &app.playback;
    let title = Line::from(vec![
        now_playing_line(app).into(),
        "  ".into(),
        Span::styled(
            volume_text(snapshot.volume),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), rows[0]);

    let label = format!(
        "{} / {}",
        format_duration(snapshot.progress),
        format_duration(snapshot.duration)
    );
    let gauge = Gauge::default()
        .ratio(snapshot.progress_ratio())
        .label(label)
        .use_unicode(true);
    frame.render_widget(gauge, rows[1]);
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    display: &[usize],
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" encore ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(app))
        .block(Block::bordered().padding(LEFT_PAD).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    draw_list(frame, app, display, chunks[2]);

    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 11, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let meta = Paragraph::new(metadata_text(app.selected_track()))
            .block(
                Block::default()
                    .padding(LEFT_PAD)
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta, popup_area);
    }

    draw_player_bar(frame, app, chunks[3]);

    let footer = Paragraph::new(controls_text(controls_settings))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(LEFT_PAD),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
