//! Scripted `MediaResource` for session and transport tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use super::locator::Locator;
use super::resource::MediaResource;
use super::types::{MediaEvent, PlayTicket, SourceId, StartFailure};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Load(Locator, SourceId),
    Play(PlayTicket),
    Pause,
    Seek(f64),
    SetVolume(f32),
    Unsubscribe,
}

/// Records every call. With `auto_resolve` set, each `play` immediately
/// queues a successful resolution, like a resource that never fails.
pub(crate) struct FakeResource {
    calls: Rc<RefCell<Vec<Call>>>,
    events: Option<Sender<MediaEvent>>,
    auto_resolve: bool,
}

/// Test-side view of a `FakeResource`: inspect calls, inject notifications.
#[derive(Clone)]
pub(crate) struct FakeHandle {
    calls: Rc<RefCell<Vec<Call>>>,
    events: Sender<MediaEvent>,
}

impl FakeResource {
    pub(crate) fn new(auto_resolve: bool) -> (Self, FakeHandle, Receiver<MediaEvent>) {
        let (tx, rx) = mpsc::channel();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let resource = Self {
            calls: calls.clone(),
            events: Some(tx.clone()),
            auto_resolve,
        };
        (resource, FakeHandle { calls, events: tx }, rx)
    }
}

impl MediaResource for FakeResource {
    fn load(&mut self, locator: &Locator, source: SourceId) {
        self.calls
            .borrow_mut()
            .push(Call::Load(locator.clone(), source));
    }

    fn play(&mut self, ticket: PlayTicket) {
        self.calls.borrow_mut().push(Call::Play(ticket));
        if self.auto_resolve {
            if let Some(tx) = &self.events {
                let _ = tx.send(MediaEvent::PlayResolved {
                    ticket,
                    outcome: Ok(()),
                });
            }
        }
    }

    fn pause(&mut self) {
        self.calls.borrow_mut().push(Call::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.calls.borrow_mut().push(Call::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f32) {
        self.calls.borrow_mut().push(Call::SetVolume(volume));
    }

    fn unsubscribe(&mut self) {
        self.events = None;
        self.calls.borrow_mut().push(Call::Unsubscribe);
    }
}

impl FakeHandle {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub(crate) fn tickets(&self) -> Vec<PlayTicket> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Play(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_ticket(&self) -> PlayTicket {
        self.tickets().last().copied().unwrap_or_default()
    }

    pub(crate) fn last_source(&self) -> SourceId {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Load(_, s) => Some(*s),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub(crate) fn resolve(&self, ticket: PlayTicket, outcome: Result<(), StartFailure>) {
        self.send(MediaEvent::PlayResolved { ticket, outcome });
    }

    pub(crate) fn position(&self, source: SourceId, seconds: f64) {
        self.send(MediaEvent::PositionChanged { source, seconds });
    }

    pub(crate) fn duration(&self, source: SourceId, seconds: f64) {
        self.send(MediaEvent::DurationKnown { source, seconds });
    }

    pub(crate) fn ended(&self, source: SourceId) {
        self.send(MediaEvent::Ended { source });
    }

    fn send(&self, event: MediaEvent) {
        self.events.send(event).expect("session receiver alive");
    }
}
