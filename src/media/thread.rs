use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use crate::config::AudioSettings;

use super::locator::Locator;
use super::sink::{HttpFetcher, clamp_seek, open_sink};
use super::types::{MediaCmd, MediaEvent, PlayTicket, SourceId, StartFailure};

/// Spawn the audio thread. It opens the default output stream first and
/// reports the outcome through `ready` before accepting commands.
pub(super) fn spawn_audio_thread(
    rx: Receiver<MediaCmd>,
    events: Sender<MediaEvent>,
    ready: Sender<Result<(), String>>,
    settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                let _ = ready.send(Err(e.to_string()));
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped, which would land on the TUI.
        stream.log_on_drop(false);
        let _ = ready.send(Ok(()));

        let mut deck = Deck::new(
            events,
            HttpFetcher::new(Duration::from_secs(settings.http_timeout_secs)),
        );
        let tick = Duration::from_millis(settings.tick_ms.max(1));

        loop {
            match rx.recv_timeout(tick) {
                Ok(MediaCmd::Quit) | Err(RecvTimeoutError::Disconnected) => {
                    deck.stop();
                    break;
                }
                Ok(cmd) => deck.handle(cmd, &stream),
                Err(RecvTimeoutError::Timeout) => deck.tick(),
            }
        }
        debug!("audio thread finished");
    })
}

/// State owned by the audio thread: the loaded source and its sink.
pub(super) struct Deck {
    events: Option<Sender<MediaEvent>>,
    http: HttpFetcher,
    source: SourceId,
    locator: Option<Locator>,
    sink: Option<Sink>,
    duration: Option<Duration>,
    volume: f32,
    ended_reported: bool,
}

impl Deck {
    pub(super) fn new(events: Sender<MediaEvent>, http: HttpFetcher) -> Self {
        Self {
            events: Some(events),
            http,
            source: SourceId::default(),
            locator: None,
            sink: None,
            duration: None,
            volume: 1.0,
            ended_reported: false,
        }
    }

    fn emit(&self, event: MediaEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn handle(&mut self, cmd: MediaCmd, stream: &OutputStream) {
        match cmd {
            MediaCmd::Load { locator, source } => self.load(locator, source),
            MediaCmd::Play(ticket) => self.play(ticket, stream),
            MediaCmd::Pause => {
                if let Some(s) = &self.sink {
                    s.pause();
                }
            }
            MediaCmd::Seek(seconds) => self.seek(seconds),
            MediaCmd::SetVolume(v) => {
                self.volume = v.clamp(0.0, 1.0);
                if let Some(s) = &self.sink {
                    s.set_volume(self.volume);
                }
            }
            MediaCmd::Unsubscribe => self.events = None,
            MediaCmd::Quit => self.stop(),
        }
    }

    pub(super) fn load(&mut self, locator: Locator, source: SourceId) {
        self.stop();
        debug!(%locator, source = source.0, "source loaded");
        self.locator = Some(locator);
        self.source = source;
        self.duration = None;
        self.ended_reported = false;
        self.emit(MediaEvent::PositionChanged {
            source,
            seconds: 0.0,
        });
    }

    fn play(&mut self, ticket: PlayTicket, stream: &OutputStream) {
        let Some(locator) = self.locator.clone() else {
            self.resolve(ticket, Err(StartFailure::NoSource));
            return;
        };

        // A drained sink means the track ended; playing again restarts it.
        let needs_open = self.sink.as_ref().is_none_or(Sink::empty);
        if needs_open {
            match open_sink(stream, &locator, &mut self.http) {
                Ok((sink, total)) => {
                    sink.set_volume(self.volume);
                    self.sink = Some(sink);
                    self.duration = total;
                    self.ended_reported = false;
                    if let Some(d) = total {
                        self.emit(MediaEvent::DurationKnown {
                            source: self.source,
                            seconds: d.as_secs_f64(),
                        });
                    }
                }
                Err(failure) => {
                    warn!(%locator, error = %failure, "could not open source");
                    self.resolve(ticket, Err(failure));
                    return;
                }
            }
        }

        if let Some(s) = &self.sink {
            s.play();
        }
        self.resolve(ticket, Ok(()));
    }

    fn resolve(&self, ticket: PlayTicket, outcome: Result<(), StartFailure>) {
        self.emit(MediaEvent::PlayResolved { ticket, outcome });
    }

    pub(super) fn seek(&mut self, seconds: f64) {
        // Nothing open yet (or the last start failed): the next play starts
        // from the beginning, so report that rather than the request.
        let Some(sink) = &self.sink else {
            debug!(seconds, source = self.source.0, "seek without an open sink");
            self.emit(MediaEvent::PositionChanged {
                source: self.source,
                seconds: 0.0,
            });
            return;
        };

        let target = clamp_seek(seconds, self.duration);
        if let Err(e) = sink.try_seek(Duration::from_secs_f64(target)) {
            warn!(target, error = %e, "seek failed");
            return;
        }
        self.emit(MediaEvent::PositionChanged {
            source: self.source,
            seconds: target,
        });
    }

    /// Periodic position report and end-of-track detection.
    fn tick(&mut self) {
        let Some(sink) = &self.sink else {
            return;
        };
        if sink.is_paused() {
            return;
        }

        if sink.empty() {
            if !self.ended_reported {
                self.ended_reported = true;
                self.emit(MediaEvent::Ended {
                    source: self.source,
                });
            }
        } else {
            self.emit(MediaEvent::PositionChanged {
                source: self.source,
                seconds: sink.get_pos().as_secs_f64(),
            });
        }
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
    }
}
