//! The playback session: one logical "now playing" state machine.
//!
//! A `PlaybackSession` owns the media resource and the receiving end of its
//! notification channel. It keeps the active playlist and current track,
//! turns user intents into resource commands, and publishes a
//! `PlaybackSnapshot` to subscribers after every change.
//!
//! Two generation counters keep asynchronous notifications honest:
//! every `load` gets a fresh `SourceId` (position, duration and end
//! notifications from older sources are ignored) and every `play` gets a
//! fresh `PlayTicket` (only the newest request's resolution counts).

mod ring;
mod state;
mod subscription;

use std::mem;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Track, TrackCatalog};
use crate::media::{
    Locator, LocatorError, MediaEvent, MediaResource, PlayTicket, SourceId, StartFailure,
};

pub use state::{Phase, PlaybackSnapshot};
pub use subscription::{Subscription, SubscriptionId};

use subscription::Subscribers;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("track {track_id} has an unusable media locator: {source}")]
    InvalidTrack {
        track_id: String,
        #[source]
        source: LocatorError,
    },
}

pub struct PlaybackSession<R: MediaResource, C: TrackCatalog> {
    resource: R,
    events: Receiver<MediaEvent>,
    catalog: C,

    playlist: Vec<Track>,
    current: Option<Track>,
    current_index: Option<usize>,

    phase: Phase,
    progress: f64,
    duration: f64,
    volume: f32,

    source: SourceId,
    ticket: PlayTicket,

    subscribers: Subscribers,
    closed: bool,
}

impl<R: MediaResource, C: TrackCatalog> PlaybackSession<R, C> {
    /// `events` must be the receiver paired with the sender given to
    /// `resource`. The initial volume is pushed to the resource.
    pub fn new(mut resource: R, events: Receiver<MediaEvent>, catalog: C, volume: f32) -> Self {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            1.0
        };
        resource.set_volume(volume);

        Self {
            resource,
            events,
            catalog,
            playlist: Vec::new(),
            current: None,
            current_index: None,
            phase: Phase::Idle,
            progress: 0.0,
            duration: 0.0,
            volume,
            source: SourceId::default(),
            ticket: PlayTicket::default(),
            subscribers: Subscribers::default(),
            closed: false,
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_track: self.current.clone(),
            current_index: self.current_index,
            is_playing: self.phase == Phase::Playing,
            progress: self.progress,
            duration: self.duration,
            volume: self.volume,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn playlist(&self) -> &[Track] {
        &self.playlist
    }

    #[cfg(test)]
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn subscribe(&mut self) -> Subscription {
        let snapshot = self.snapshot();
        self.subscribers.add(snapshot)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Start `track`. `playlist` becomes the active playlist; without one the
    /// whole catalog is used. The track does not have to be a member of it.
    pub fn play_track(
        &mut self,
        track: Track,
        playlist: Option<Vec<Track>>,
    ) -> Result<(), PlaybackError> {
        if self.closed {
            return Ok(());
        }
        let locator = parse_locator(&track)?;
        let playlist = playlist.unwrap_or_else(|| self.catalog.list_all_tracks());
        self.start(track, locator, playlist);
        Ok(())
    }

    pub fn play_next(&mut self) -> Result<(), PlaybackError> {
        self.step(ring::next)
    }

    pub fn play_prev(&mut self) -> Result<(), PlaybackError> {
        self.step(ring::prev)
    }

    pub fn toggle_play_pause(&mut self) {
        match self.phase {
            Phase::Playing | Phase::Loading => self.pause(),
            Phase::Paused | Phase::Idle => self.play(),
        }
    }

    /// Resume the current track. Only a paused session acts on this; a start
    /// already in flight or under way is left alone.
    pub fn play(&mut self) {
        if self.closed || self.current.is_none() {
            return;
        }
        if !matches!(self.phase, Phase::Paused | Phase::Idle) {
            return;
        }
        self.ticket = self.ticket.next();
        self.resource.play(self.ticket);
        self.phase = Phase::Loading;
        self.publish();
    }

    /// Pause the current track, including one that is still starting.
    pub fn pause(&mut self) {
        if self.closed || self.current.is_none() {
            return;
        }
        match self.phase {
            Phase::Playing => {}
            // The outstanding request must not flip us back to playing.
            Phase::Loading => self.ticket = self.ticket.next(),
            Phase::Paused | Phase::Idle => return,
        }
        self.resource.pause();
        self.phase = Phase::Paused;
        self.publish();
    }

    pub fn seek(&mut self, seconds: f64) {
        if self.closed {
            return;
        }
        if !seconds.is_finite() {
            warn!(seconds, "ignoring non-finite seek target");
            return;
        }
        self.resource.seek(seconds);
        self.progress = seconds;
        self.publish();
    }

    /// Values outside `[0, 1]` are clamped.
    pub fn set_volume(&mut self, volume: f32) {
        if self.closed {
            return;
        }
        if !volume.is_finite() {
            warn!(volume, "ignoring non-finite volume");
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.resource.set_volume(volume);
        self.volume = volume;
        self.publish();
    }

    /// Apply every queued media notification. Returns how many were handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            handled += 1;
        }
        handled
    }

    /// Block up to `timeout` for one notification and apply it.
    pub fn wait_for_event(&mut self, timeout: Duration) -> bool {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.apply(event);
                true
            }
            Err(_) => false,
        }
    }

    pub fn apply(&mut self, event: MediaEvent) {
        if self.closed {
            return;
        }

        match event {
            MediaEvent::PositionChanged { source, seconds } => {
                if source != self.source {
                    return;
                }
                self.progress = seconds;
            }
            MediaEvent::DurationKnown { source, seconds } => {
                if source != self.source {
                    return;
                }
                self.duration = seconds;
            }
            MediaEvent::Ended { source } => {
                if source != self.source || self.phase != Phase::Playing {
                    debug!(
                        source = source.0,
                        current = self.source.0,
                        "ignoring end of stale source"
                    );
                    return;
                }
                self.on_ended();
                return;
            }
            MediaEvent::PlayResolved { ticket, outcome } => {
                if ticket != self.ticket {
                    debug!(
                        ticket = ticket.0,
                        latest = self.ticket.0,
                        "ignoring stale play resolution"
                    );
                    return;
                }
                self.resolve(outcome);
            }
        }
        self.publish();
    }

    /// Detach from the resource and stop it. Later commands are ignored.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.resource.unsubscribe();
        self.resource.pause();
        while self.events.try_recv().is_ok() {}

        if self.current.is_some() {
            self.phase = Phase::Paused;
        }
        self.publish();
        self.subscribers.clear();
        self.closed = true;
        info!("playback session closed");
    }

    fn start(&mut self, track: Track, locator: Locator, playlist: Vec<Track>) {
        self.current_index = ring::position(&playlist, &track.id);
        self.playlist = playlist;
        self.progress = 0.0;
        self.duration = 0.0;

        self.source = self.source.next();
        self.resource.load(&locator, self.source);
        self.ticket = self.ticket.next();
        self.resource.play(self.ticket);
        self.phase = Phase::Loading;

        info!(
            track_id = %track.id,
            title = %track.title,
            index = ?self.current_index,
            ticket = self.ticket.0,
            "starting track"
        );
        self.current = Some(track);
        self.publish();
    }

    fn step(&mut self, advance: fn(usize, usize) -> Option<usize>) -> Result<(), PlaybackError> {
        if self.closed || self.current.is_none() {
            return Ok(());
        }
        let Some(target) = self.neighbour(advance) else {
            debug!(
                index = ?self.current_index,
                playlist_len = self.playlist.len(),
                "no playlist position to step from"
            );
            return Ok(());
        };
        self.advance_to(target)
    }

    fn neighbour(&self, advance: fn(usize, usize) -> Option<usize>) -> Option<usize> {
        self.current_index
            .and_then(|index| advance(index, self.playlist.len()))
    }

    fn advance_to(&mut self, target: usize) -> Result<(), PlaybackError> {
        let Some(track) = self.playlist.get(target).cloned() else {
            return Ok(());
        };
        // Validate before giving up the playlist so a bad entry leaves it intact.
        let locator = parse_locator(&track)?;
        let playlist = mem::take(&mut self.playlist);
        self.start(track, locator, playlist);
        Ok(())
    }

    fn on_ended(&mut self) {
        let Some(target) = self.neighbour(ring::next) else {
            debug!("track ended with nothing to advance to");
            self.phase = Phase::Paused;
            self.publish();
            return;
        };

        if let Err(err) = self.advance_to(target) {
            warn!(error = %err, "auto-advance failed");
            self.phase = Phase::Paused;
            self.publish();
        }
    }

    fn resolve(&mut self, outcome: Result<(), StartFailure>) {
        match outcome {
            Ok(()) => self.phase = Phase::Playing,
            Err(failure) => {
                warn!(
                    track_id = ?self.current.as_ref().map(|t| t.id.as_str()),
                    ticket = self.ticket.0,
                    error = %failure,
                    "playback did not start"
                );
                self.phase = Phase::Paused;
            }
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.subscribers.publish(&snapshot);
    }
}

impl<R: MediaResource, C: TrackCatalog> Drop for PlaybackSession<R, C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn parse_locator(track: &Track) -> Result<Locator, PlaybackError> {
    Locator::parse(&track.audio_url).map_err(|source| PlaybackError::InvalidTrack {
        track_id: track.id.clone(),
        source,
    })
}

#[cfg(test)]
mod tests;
