use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::warn;

use crate::app::{App, mute_toggled, stepped_volume};
use crate::catalog::TrackCatalog;
use crate::config;
use crate::media::MediaResource;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::session::{PlaybackError, Subscription};
use crate::transport::TransportSurface;
use crate::ui;

use super::Transport;

/// How long one iteration waits for media notifications, then for input.
const MEDIA_WAIT: Duration = Duration::from_millis(25);
const INPUT_WAIT: Duration = Duration::from_millis(25);

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Two-key prefix state for `gg`.
    pending_gg: bool,
    /// Two-key prefix state for `zz`.
    pending_zz: bool,
    subscription: Option<Subscription>,
}

impl EventLoopState {
    pub fn new<R: MediaResource, C: TrackCatalog>(
        transport: Option<&TransportSurface<R, C>>,
    ) -> Self {
        Self {
            pending_gg: false,
            pending_zz: false,
            subscription: transport.map(TransportSurface::subscribe),
        }
    }

    /// Stop observing the session.
    pub fn detach<R: MediaResource, C: TrackCatalog>(
        &mut self,
        transport: Option<&TransportSurface<R, C>>,
    ) {
        if let (Some(t), Some(sub)) = (transport, self.subscription.take()) {
            t.unsubscribe(sub.id());
        }
    }
}

/// Main terminal event loop: applies media events, mirrors session state into
/// the app and MPRIS, draws, and handles input. Returns `Ok(())` on quit.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    transport: Option<&Transport>,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        if let Some(t) = transport {
            t.pump_for(MEDIA_WAIT);
        }

        if let Some(snapshot) = state.subscription.as_ref().and_then(Subscription::latest) {
            mpris.update(&snapshot);
            app.sync_playback(snapshot);
        }

        let display = app.display_indices();
        terminal.draw(|f| ui::draw(f, app, &display, &settings.ui, &settings.controls))?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, app, transport) {
                return Ok(());
            }
        }

        if event::poll(INPUT_WAIT)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, transport, state) {
                    return Ok(());
                }
            }
        }
    }
}

/// Surface a rejected command in the status box.
fn report(app: &mut App, result: Result<(), PlaybackError>) {
    match result {
        Ok(()) => app.clear_status(),
        Err(e) => {
            warn!(error = %e, "playback command rejected");
            app.set_status(e.to_string());
        }
    }
}

/// Play the track under the cursor within the visible list.
fn play_selected<R: MediaResource, C: TrackCatalog>(
    app: &mut App,
    transport: &TransportSurface<R, C>,
) {
    let Some(track) = app.selected_track().cloned() else {
        return;
    };
    if !app.filter_mode {
        app.follow_playback_on();
    }
    let result = transport.play_track(track, app.visible_playlist());
    report(app, result);
}

pub(super) fn handle_control_cmd<R: MediaResource, C: TrackCatalog>(
    cmd: ControlCmd,
    app: &mut App,
    transport: Option<&TransportSurface<R, C>>,
) -> bool {
    if cmd == ControlCmd::Quit {
        return true;
    }
    let Some(t) = transport else {
        return false;
    };

    let has_track = t.state().current_track.is_some();
    match cmd {
        ControlCmd::Play => {
            if has_track {
                t.play();
            } else {
                play_selected(app, t);
            }
        }
        ControlCmd::PlayPause => {
            if has_track {
                t.toggle_play_pause();
            } else {
                play_selected(app, t);
            }
        }
        // No stopped state of its own: stopping pauses in place.
        ControlCmd::Pause | ControlCmd::Stop => t.pause(),
        ControlCmd::Next => {
            let result = t.play_next();
            report(app, result);
        }
        ControlCmd::Prev => {
            let result = t.play_prev();
            report(app, result);
        }
        ControlCmd::SeekBy(offset) => t.seek((t.state().progress + offset).max(0.0)),
        ControlCmd::SeekTo(seconds) => t.seek(seconds),
        ControlCmd::SetVolume(volume) => t.set_volume(volume),
        ControlCmd::Quit => return true,
    }
    false
}

fn handle_filter_key<R: MediaResource, C: TrackCatalog>(
    key: KeyEvent,
    app: &mut App,
    transport: Option<&TransportSurface<R, C>>,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Char('j' | 'n') if ctrl => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k' | 'p') if ctrl => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Char(c) if !c.is_control() => app.push_filter_char(c),
        KeyCode::Enter => {
            if app.display_indices().is_empty() {
                return;
            }
            app.exit_filter_mode();
            app.follow_playback_on();
            if let Some(t) = transport {
                play_selected(app, t);
            }
        }
        _ => {}
    }
}

pub(super) fn handle_key_event<R: MediaResource, C: TrackCatalog>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    transport: Option<&TransportSurface<R, C>>,
    state: &mut EventLoopState,
) -> bool {
    if app.filter_mode {
        state.pending_gg = false;
        state.pending_zz = false;
        handle_filter_key(key, app, transport);
        return false;
    }

    // Any key other than the repeated one cancels a pending prefix.
    let was_gg = std::mem::take(&mut state.pending_gg);
    let was_zz = std::mem::take(&mut state.pending_zz);

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char('g') => {
            if was_gg {
                app.follow_playback_off();
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.select_last();
        }
        KeyCode::Char('z') => {
            if was_zz {
                if let Some(idx) = app.now_playing_index() {
                    app.set_selected(idx);
                }
            } else {
                state.pending_zz = true;
            }
        }
        KeyCode::Char('j') => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Char('K') => app.toggle_metadata_window(),
        _ => {
            if let Some(t) = transport {
                handle_transport_key(key.code, &settings.controls, app, t);
            }
        }
    }
    false
}

fn handle_transport_key<R: MediaResource, C: TrackCatalog>(
    code: KeyCode,
    controls: &config::ControlsSettings,
    app: &mut App,
    t: &TransportSurface<R, C>,
) {
    let seek = controls.seek_seconds as f64;
    match code {
        KeyCode::Enter => {
            let already_playing = app.playback.is_playing
                && app.now_playing_index() == Some(app.selected);
            if !already_playing {
                play_selected(app, t);
            }
        }
        KeyCode::Char('p' | ' ') => {
            if t.state().current_track.is_some() {
                t.toggle_play_pause();
            } else {
                play_selected(app, t);
            }
        }
        KeyCode::Char('l') => {
            let result = t.play_next();
            report(app, result);
        }
        KeyCode::Char('h') => {
            let result = t.play_prev();
            report(app, result);
        }
        KeyCode::Char('L') => t.seek(t.state().progress + seek),
        KeyCode::Char('H') => t.seek((t.state().progress - seek).max(0.0)),
        KeyCode::Char('+' | '=') => {
            t.set_volume(stepped_volume(t.state().volume, controls.volume_step));
        }
        KeyCode::Char('-') => {
            t.set_volume(stepped_volume(t.state().volume, -controls.volume_step));
        }
        KeyCode::Char('m') => t.set_volume(mute_toggled(t.state().volume)),
        _ => {}
    }
}
