use super::locator::Locator;
use super::types::{PlayTicket, SourceId};

/// One playable audio output unit, exclusively owned by a playback session.
///
/// Every method returns immediately. `play` is the only operation whose
/// outcome is asynchronous: it is delivered later as
/// [`MediaEvent::PlayResolved`](super::MediaEvent::PlayResolved) carrying the
/// same ticket.
pub trait MediaResource {
    /// Replace the current source. Does not start playback.
    fn load(&mut self, locator: &Locator, source: SourceId);

    /// Request playback of the loaded source.
    fn play(&mut self, ticket: PlayTicket);

    fn pause(&mut self);

    /// Move to `seconds`; the resource clamps to `[0, duration]`.
    fn seek(&mut self, seconds: f64);

    /// `volume` is within `[0, 1]`.
    fn set_volume(&mut self, volume: f32);

    /// Stop delivering notifications.
    fn unsubscribe(&mut self);
}
