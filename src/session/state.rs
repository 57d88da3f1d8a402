use crate::catalog::Track;

/// Where the session is in its play/pause lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has been loaded yet.
    #[default]
    Idle,
    /// A play request is outstanding.
    Loading,
    Playing,
    Paused,
}

/// What observers see of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub current_track: Option<Track>,
    /// Position of `current_track` in the active playlist; `None` when the
    /// track is not a member of it.
    pub current_index: Option<usize>,
    pub is_playing: bool,
    /// Seconds.
    pub progress: f64,
    /// Seconds; 0 until the media resource reports the real value.
    pub duration: f64,
    pub volume: f32,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            current_track: None,
            current_index: None,
            is_playing: false,
            progress: 0.0,
            duration: 0.0,
            volume: 1.0,
        }
    }
}

impl PlaybackSnapshot {
    /// Progress as a fraction of the duration, clamped to `[0, 1]` for display.
    pub fn progress_ratio(&self) -> f64 {
        if self.duration > 0.0 && self.duration.is_finite() && self.progress.is_finite() {
            (self.progress / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
