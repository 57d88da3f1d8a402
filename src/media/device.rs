use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use tracing::{info, warn};

use crate::config::AudioSettings;

use super::locator::Locator;
use super::resource::MediaResource;
use super::thread::spawn_audio_thread;
use super::types::{MediaCmd, MediaError, MediaEvent, PlayTicket, SourceId, StartFailure};

/// `MediaResource` backed by `rodio` on a dedicated audio thread.
///
/// The thread and its output stream live exactly as long as this handle;
/// dropping it stops playback and joins the thread.
pub struct RodioResource {
    tx: Sender<MediaCmd>,
    // Used only to report a dead audio thread when a `play` cannot be delivered.
    events: Option<Sender<MediaEvent>>,
    join: Option<JoinHandle<()>>,
}

impl RodioResource {
    pub fn open(events: Sender<MediaEvent>, settings: &AudioSettings) -> Result<Self, MediaError> {
        let (tx, rx) = mpsc::channel::<MediaCmd>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        let join = spawn_audio_thread(rx, events.clone(), ready_tx, settings.clone());

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("audio output opened");
                Ok(Self {
                    tx,
                    events: Some(events),
                    join: Some(join),
                })
            }
            Ok(Err(reason)) => {
                let _ = join.join();
                Err(MediaError::Unavailable(reason))
            }
            Err(_) => {
                let _ = join.join();
                Err(MediaError::Unavailable(
                    "audio thread exited during startup".to_string(),
                ))
            }
        }
    }

    fn send(&self, cmd: MediaCmd) -> bool {
        if self.tx.send(cmd).is_err() {
            warn!("audio thread is gone; command dropped");
            return false;
        }
        true
    }
}

impl MediaResource for RodioResource {
    fn load(&mut self, locator: &Locator, source: SourceId) {
        self.send(MediaCmd::Load {
            locator: locator.clone(),
            source,
        });
    }

    fn play(&mut self, ticket: PlayTicket) {
        if !self.send(MediaCmd::Play(ticket)) {
            if let Some(events) = &self.events {
                let _ = events.send(MediaEvent::PlayResolved {
                    ticket,
                    outcome: Err(StartFailure::Disconnected),
                });
            }
        }
    }

    fn pause(&mut self) {
        self.send(MediaCmd::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.send(MediaCmd::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(MediaCmd::SetVolume(volume));
    }

    fn unsubscribe(&mut self) {
        self.events = None;
        self.send(MediaCmd::Unsubscribe);
    }
}

impl Drop for RodioResource {
    fn drop(&mut self) {
        let _ = self.tx.send(MediaCmd::Quit);
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}
