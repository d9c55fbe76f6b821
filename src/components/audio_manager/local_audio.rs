// Local audio backend: a native audio element playing a file from the site.
use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlAudioElement, HtmlMediaElement};

use super::{known_duration, BackendEvent, EventSink, PlaybackBackend, ReadinessGate};
use crate::api::models::MediaKind;
use crate::error::Result;

pub struct LocalAudioBackend {
    audio: HtmlAudioElement,
    events: EventSink,
    // Setting currentTime before metadata is known is silently dropped by the element.
    seek_gate: Rc<RefCell<ReadinessGate<f64>>>,
    listeners: Vec<(&'static str, Closure<dyn FnMut()>)>,
}

impl LocalAudioBackend {
    pub fn new(src: &str, events: EventSink) -> Result<Self> {
        let audio = HtmlAudioElement::new_with_src(src)?;
        audio.set_preload("metadata");

        let mut backend = Self {
            audio,
            events,
            seek_gate: Rc::new(RefCell::new(ReadinessGate::new())),
            listeners: Vec::new(),
        };

        {
            let audio = backend.audio.clone();
            let events = backend.events.clone();
            backend.listen("timeupdate", move || {
                events.emit(BackendEvent::Progress {
                    position: audio.current_time(),
                    duration: known_duration(audio.duration()),
                });
            })?;
        }
        {
            let audio = backend.audio.clone();
            let events = backend.events.clone();
            let seek_gate = backend.seek_gate.clone();
            backend.listen("loadedmetadata", move || {
                let pending = seek_gate.borrow_mut().open();
                if let Some(offset) = pending {
                    audio.set_current_time(offset);
                }
                events.emit(BackendEvent::Ready);
            })?;
        }
        for (name, event) in [
            ("play", BackendEvent::Playing),
            ("pause", BackendEvent::Paused),
            ("ended", BackendEvent::Ended),
        ] {
            let events = backend.events.clone();
            backend.listen(name, move || events.emit(event))?;
        }

        if backend.audio.ready_state() >= HtmlMediaElement::HAVE_METADATA {
            backend.seek_gate.borrow_mut().open();
        }
        Ok(backend)
    }

    fn listen<F>(&mut self, name: &'static str, f: F) -> Result<()>
    where
        F: FnMut() + 'static,
    {
        let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut()>);
        self.audio
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        self.listeners.push((name, closure));
        Ok(())
    }

    fn try_play(&self) {
        let Ok(promise) = self.audio.play() else {
            return;
        };
        let events = self.events.clone();
        wasm_bindgen_futures::spawn_local(async move {
            // Autoplay refusals reject the play() promise; report them as a pause.
            if let Err(err) = JsFuture::from(promise).await {
                debug!(error = %crate::error::js_message(&err), "play() refused");
                events.emit(BackendEvent::Paused);
            }
        });
    }
}

impl PlaybackBackend for LocalAudioBackend {
    fn kind(&self) -> MediaKind {
        MediaKind::LocalAudio
    }

    fn start(&mut self) {
        self.try_play();
    }

    fn pause(&mut self) {
        let _ = self.audio.pause();
    }

    fn resume(&mut self) {
        self.try_play();
    }

    fn seek(&mut self, offset_seconds: f64) {
        let ready = self.seek_gate.borrow_mut().submit(offset_seconds);
        if let Some(offset) = ready {
            self.audio.set_current_time(offset);
        }
    }

    fn current_time(&self) -> Option<f64> {
        Some(self.audio.current_time()).filter(|t| t.is_finite())
    }

    fn duration(&self) -> Option<f64> {
        known_duration(self.audio.duration())
    }

    fn teardown(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let _ = self.audio.pause();
        for (name, closure) in self.listeners.drain(..) {
            let _ = self
                .audio
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
        // Stop the network fetch as well.
        let _ = self.audio.remove_attribute("src");
        self.audio.load();
    }
}

impl Drop for LocalAudioBackend {
    fn drop(&mut self) {
        self.teardown();
    }
}
