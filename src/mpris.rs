//! MPRIS D-Bus surface, so desktop media keys and `playerctl` can drive the
//! session. Incoming method calls become `ControlCmd`s on a channel the
//! runtime drains; properties are served from a snapshot the runtime
//! refreshes after every session change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc::Sender};

use async_io::{Timer, block_on};
use tracing::{info, warn};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::session::PlaybackSnapshot;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.encore";
const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek, in seconds.
    SeekBy(f64),
    /// Absolute position in the current track, in seconds.
    SeekTo(f64),
    SetVolume(f32),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Status {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl Status {
    fn of(snapshot: &PlaybackSnapshot) -> Self {
        match (&snapshot.current_track, snapshot.is_playing) {
            (None, _) => Self::Stopped,
            (Some(_), true) => Self::Playing,
            (Some(_), false) => Self::Paused,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
        }
    }
}

#[derive(Debug, Default)]
struct SharedState {
    status: Status,
    track_id: Option<String>,
    title: Option<String>,
    artist: Vec<String>,
    genre: Vec<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    position_micros: i64,
    volume: f64,
}

impl SharedState {
    fn from_snapshot(snapshot: &PlaybackSnapshot) -> Self {
        let mut state = Self {
            status: Status::of(snapshot),
            position_micros: seconds_to_micros(snapshot.progress).unwrap_or(0),
            volume: f64::from(snapshot.volume),
            ..Self::default()
        };

        let Some(track) = &snapshot.current_track else {
            return state;
        };

        state.track_id = Some(match snapshot.current_index {
            Some(i) => format!("{OBJECT_PATH}/track/{i}"),
            None => format!("{OBJECT_PATH}/track/current"),
        });
        state.title = Some(track.title.clone());
        state.artist = non_empty(&track.user.display_name).into_iter().collect();
        state.genre = non_empty(&track.genre).into_iter().collect();
        state.url = non_empty(&track.audio_url);
        state.art_url = non_empty(&track.cover_art_url);

        let seconds = if snapshot.duration > 0.0 {
            snapshot.duration
        } else {
            f64::from(track.duration)
        };
        state.length_micros = seconds_to_micros(seconds).filter(|&m| m > 0);
        state
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn seconds_to_micros(seconds: f64) -> Option<i64> {
    (seconds.is_finite() && seconds >= 0.0).then(|| (seconds * 1_000_000.0).round() as i64)
}

fn micros_to_seconds(micros: i64) -> f64 {
    micros as f64 / 1_000_000.0
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
}

impl MprisHandle {
    /// Replace the served properties with those of `snapshot`.
    pub fn update(&self, snapshot: &PlaybackSnapshot) {
        if let Ok(mut s) = self.state.lock() {
            *s = SharedState::from_snapshot(snapshot);
        }
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "encore"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string(), "http".to_string(), "https".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::SeekBy(micros_to_seconds(offset)));
    }

    /// Ignored unless `track_id` names the current track.
    fn set_position(&self, track_id: OwnedObjectPath, position: i64) {
        if position < 0 {
            return;
        }
        let is_current = self
            .state
            .lock()
            .is_ok_and(|s| s.track_id.as_deref() == Some(track_id.as_str()));
        if is_current {
            let _ = self.tx.send(ControlCmd::SeekTo(micros_to_seconds(position)));
        }
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.state
            .lock()
            .map(|s| s.status.as_str())
            .unwrap_or("Stopped")
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.state.lock().map(|s| s.position_micros).unwrap_or(0)
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.state.lock().map(|s| s.volume).unwrap_or(1.0)
    }

    #[zbus(property)]
    fn set_volume(&mut self, volume: f64) {
        let _ = self.tx.send(ControlCmd::SetVolume(volume.clamp(0.0, 1.0) as f32));
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let track_id = s.track_id.as_deref().unwrap_or(NO_TRACK);
        if let Ok(path) = ObjectPath::try_from(track_id) {
            insert(&mut map, "mpris:trackid", Value::from(path));
        }
        if let Some(title) = &s.title {
            insert(&mut map, "xesam:title", Value::from(title.as_str()));
        }
        if !s.artist.is_empty() {
            insert(&mut map, "xesam:artist", Value::from(s.artist.clone()));
        }
        if !s.genre.is_empty() {
            insert(&mut map, "xesam:genre", Value::from(s.genre.clone()));
        }
        if let Some(url) = &s.url {
            insert(&mut map, "xesam:url", Value::from(url.as_str()));
        }
        if let Some(art) = &s.art_url {
            insert(&mut map, "mpris:artUrl", Value::from(art.as_str()));
        }
        if let Some(len) = s.length_micros {
            insert(&mut map, "mpris:length", Value::from(len));
        }
        map
    }
}

fn insert(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    match OwnedValue::try_from(value) {
        Ok(v) => {
            map.insert(key.to_string(), v);
        }
        Err(e) => warn!(key, error = %e, "dropping MPRIS metadata entry"),
    }
}

/// Serve MPRIS on the session bus from a background thread. Failure to reach
/// the bus is logged and leaves the rest of the player unaffected.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            let connection = match Connection::session().await {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "MPRIS: failed to connect to session bus");
                    return;
                }
            };

            if let Err(e) = connection.request_name(BUS_NAME).await {
                warn!(error = %e, "MPRIS: failed to acquire name");
                return;
            }

            let object_server = connection.object_server();

            if let Err(e) = object_server
                .at(OBJECT_PATH, RootIface { tx: tx.clone() })
                .await
            {
                warn!(error = %e, "MPRIS: failed to register root iface");
                return;
            }

            if let Err(e) = object_server
                .at(
                    OBJECT_PATH,
                    PlayerIface {
                        tx,
                        state: state_for_thread,
                    },
                )
                .await
            {
                warn!(error = %e, "MPRIS: failed to register player iface");
                return;
            }
            info!(name = BUS_NAME, "MPRIS service registered");

            // Keep the connection (and with it the service) alive.
            loop {
                Timer::after(std::time::Duration::from_secs(3600)).await;
            }
        });
    });

    MprisHandle { state }
}
