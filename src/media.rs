//! The media resource: one audio decode/output unit.
//!
//! `MediaResource` is the seam between the playback session and whatever
//! actually makes sound. `RodioResource` is the real backend; it owns a
//! dedicated audio thread and reports back through `MediaEvent`s.

mod device;
mod locator;
mod resource;
mod sink;
mod thread;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use device::RodioResource;
pub use locator::{Locator, LocatorError};
pub use resource::MediaResource;
pub use types::{MediaError, MediaEvent, PlayTicket, SourceId, StartFailure};
