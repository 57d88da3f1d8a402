//! Media-related small types: identifiers, notifications, errors and the
//! command set understood by the audio thread.

use thiserror::Error;

use super::locator::Locator;

/// Generation number of a `load`. Every notification names the source that
/// produced it so listeners can drop ones from a replaced source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u64);

impl SourceId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Generation number of a `play` request; echoed back in its resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayTicket(pub u64);

impl PlayTicket {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Asynchronous notifications emitted by a media resource.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position moved (periodic while playing, and after seeks/loads).
    PositionChanged { source: SourceId, seconds: f64 },
    /// The real duration became known.
    DurationKnown { source: SourceId, seconds: f64 },
    /// The source played through to its end. Never caused by pause or seek.
    Ended { source: SourceId },
    /// Outcome of the `play` request identified by `ticket`.
    PlayResolved {
        ticket: PlayTicket,
        outcome: Result<(), StartFailure>,
    },
}

/// Why a `play` request did not start playback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartFailure {
    #[error("no source loaded")]
    NoSource,

    #[error("failed to open {locator}: {reason}")]
    Open { locator: String, reason: String },

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to decode {locator}: {reason}")]
    Decode { locator: String, reason: String },

    #[error("audio thread is not running")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum MediaError {
    /// The output device could not be opened; playback is unavailable.
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug)]
pub(super) enum MediaCmd {
    Load { locator: Locator, source: SourceId },
    Play(PlayTicket),
    Pause,
    Seek(f64),
    SetVolume(f32),
    /// Stop emitting notifications.
    Unsubscribe,
    Quit,
}
