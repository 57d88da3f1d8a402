//! Consumer-facing control surface over the shared playback session.
//!
//! Every front-end piece (track list, player bar, media keys) holds its own
//! `TransportSurface`; all clones drive and observe the same session.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::catalog::{Track, TrackCatalog};
use crate::media::MediaResource;
use crate::session::{
    PlaybackError, PlaybackSession, PlaybackSnapshot, Subscription, SubscriptionId,
};

pub type SharedSession<R, C> = Rc<RefCell<PlaybackSession<R, C>>>;

pub fn share<R: MediaResource, C: TrackCatalog>(
    session: PlaybackSession<R, C>,
) -> SharedSession<R, C> {
    Rc::new(RefCell::new(session))
}

pub struct TransportSurface<R: MediaResource, C: TrackCatalog> {
    session: SharedSession<R, C>,
}

// Derived Clone would require `R: Clone` and `C: Clone`.
impl<R: MediaResource, C: TrackCatalog> Clone for TransportSurface<R, C> {
    fn clone(&self) -> Self {
        Self {
            session: Rc::clone(&self.session),
        }
    }
}

impl<R: MediaResource, C: TrackCatalog> TransportSurface<R, C> {
    pub fn new(session: SharedSession<R, C>) -> Self {
        Self { session }
    }

    pub fn state(&self) -> PlaybackSnapshot {
        self.session.borrow().snapshot()
    }

    pub fn play_track(
        &self,
        track: Track,
        playlist: Option<Vec<Track>>,
    ) -> Result<(), PlaybackError> {
        self.session.borrow_mut().play_track(track, playlist)
    }

    pub fn toggle_play_pause(&self) {
        self.session.borrow_mut().toggle_play_pause();
    }

    pub fn play(&self) {
        self.session.borrow_mut().play();
    }

    pub fn pause(&self) {
        self.session.borrow_mut().pause();
    }

    pub fn play_next(&self) -> Result<(), PlaybackError> {
        self.session.borrow_mut().play_next()
    }

    pub fn play_prev(&self) -> Result<(), PlaybackError> {
        self.session.borrow_mut().play_prev()
    }

    pub fn seek(&self, seconds: f64) {
        self.session.borrow_mut().seek(seconds);
    }

    pub fn set_volume(&self, volume: f32) {
        self.session.borrow_mut().set_volume(volume);
    }

    pub fn subscribe(&self) -> Subscription {
        self.session.borrow_mut().subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.session.borrow_mut().unsubscribe(id)
    }

    /// Tear the session down; every clone sees it closed.
    pub fn shutdown(&self) {
        self.session.borrow_mut().shutdown();
    }

    /// Apply queued media notifications to the session.
    pub fn pump(&self) -> usize {
        self.session.borrow_mut().process_pending()
    }

    /// Block up to `timeout` for the next media notification, then drain the
    /// rest. Returns how many were applied.
    pub fn pump_for(&self, timeout: Duration) -> usize {
        let mut session = self.session.borrow_mut();
        if !session.wait_for_event(timeout) {
            return 0;
        }
        1 + session.process_pending()
    }
}
