//! Audio Manager - routes playback to one backend at a time.
//!
//! The controller owns the "now playing" record and the active backend; each
//! backend adapter reports progress and transport changes back through an
//! [`EventSink`] tagged with the generation it was created for, so events from
//! a torn-down backend can be told apart and dropped.

use std::rc::Rc;

use crate::api::models::{MediaKind, PlaybackState};
use crate::error::Result;

mod controller;
mod readiness;
mod video_state;

#[cfg(target_arch = "wasm32")]
mod audio_embed;
#[cfg(target_arch = "wasm32")]
mod local_audio;
#[cfg(target_arch = "wasm32")]
mod script_loader;
#[cfg(target_arch = "wasm32")]
mod video_embed;
#[cfg(target_arch = "wasm32")]
mod web_factory;

pub use controller::{PlaybackPhase, Player, PlayerController};
pub use readiness::ReadinessGate;
pub use video_state::{is_cued, parked_seek, video_state_event, ParkedSeek};

#[cfg(target_arch = "wasm32")]
pub use web_factory::WebBackendFactory;

/// Something a backend reports back to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackendEvent {
    /// One-time signal: metadata/API available, pending requests flushed.
    Ready,
    Progress { position: f64, duration: Option<f64> },
    Playing,
    Paused,
    Ended,
}

type Deliver = Rc<dyn Fn(u64, BackendEvent)>;

/// Handle a backend uses to report events, bound to one backend lifetime.
#[derive(Clone)]
pub struct EventSink {
    generation: u64,
    deliver: Deliver,
}

impl EventSink {
    pub fn new(generation: u64, deliver: Rc<dyn Fn(u64, BackendEvent)>) -> Self {
        Self {
            generation,
            deliver,
        }
    }

    /// Sink that goes nowhere.
    pub fn detached() -> Self {
        Self::new(0, Rc::new(|_: u64, _: BackendEvent| {}))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, event: BackendEvent) {
        (self.deliver)(self.generation, event);
    }
}

/// Capability set every playback technology provides.
pub trait PlaybackBackend {
    fn kind(&self) -> MediaKind;
    /// Begin playback right after construction.
    fn start(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    /// Deferred by the backend until it can honour it.
    fn seek(&mut self, offset_seconds: f64);
    fn current_time(&self) -> Option<f64>;
    /// `None` while unknown.
    fn duration(&self) -> Option<f64>;
    /// Stop output, detach listeners and drop any embed. Idempotent.
    fn teardown(&mut self);
}

/// Single dispatch point from a state's kind to a backend.
pub trait BackendFactory {
    fn create(&mut self, state: &PlaybackState, events: EventSink)
        -> Result<Box<dyn PlaybackBackend>>;
}

pub(crate) fn known_duration(duration: f64) -> Option<f64> {
    (duration.is_finite() && duration > 0.0).then_some(duration)
}
