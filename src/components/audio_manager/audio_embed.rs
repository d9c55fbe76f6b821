// Audio-embed backend: the hosted mix widget inside an iframe, driven through its JS API.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{window, Element, HtmlIFrameElement};

use super::script_loader::{ensure_loaded, ReadySignal, ScriptSpec};
use super::{known_duration, BackendEvent, EventSink, PlaybackBackend, ReadinessGate};
use crate::api::models::MediaKind;
use crate::error::{PlayerError, Result};

const WIDGET_SDK: ScriptSpec = ScriptSpec {
    global: "Mixcloud",
    member: "PlayerWidget",
    ready: ReadySignal::OnLoad,
};

#[wasm_bindgen]
extern "C" {
    #[derive(Clone)]
    type MixcloudWidget;

    #[wasm_bindgen(js_namespace = Mixcloud, js_name = PlayerWidget, catch)]
    fn player_widget(iframe: &HtmlIFrameElement) -> std::result::Result<MixcloudWidget, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn ready(this: &MixcloudWidget) -> js_sys::Promise;

    #[wasm_bindgen(method)]
    fn play(this: &MixcloudWidget);

    #[wasm_bindgen(method)]
    fn pause(this: &MixcloudWidget);

    #[wasm_bindgen(method)]
    fn seek(this: &MixcloudWidget, seconds: f64) -> js_sys::Promise;

    #[wasm_bindgen(method, js_name = getDuration)]
    fn get_duration(this: &MixcloudWidget) -> js_sys::Promise;

    #[wasm_bindgen(method, getter)]
    fn events(this: &MixcloudWidget) -> WidgetEvents;

    type WidgetEvents;

    #[wasm_bindgen(method, getter)]
    fn progress(this: &WidgetEvents) -> WidgetEvent;

    #[wasm_bindgen(method, getter = play)]
    fn play_event(this: &WidgetEvents) -> WidgetEvent;

    #[wasm_bindgen(method, getter = pause)]
    fn pause_event(this: &WidgetEvents) -> WidgetEvent;

    #[wasm_bindgen(method, getter)]
    fn ended(this: &WidgetEvents) -> WidgetEvent;

    type WidgetEvent;

    #[wasm_bindgen(method)]
    fn on(this: &WidgetEvent, callback: &js_sys::Function);

    #[wasm_bindgen(method)]
    fn off(this: &WidgetEvent, callback: &js_sys::Function);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Transport {
    Play,
    Pause,
}

#[derive(Default)]
struct WidgetShared {
    widget: Option<MixcloudWidget>,
    transport: ReadinessGate<Transport>,
    seek: ReadinessGate<f64>,
    position: f64,
    duration: Option<f64>,
    torn_down: bool,
    listeners: Vec<(WidgetEvent, Closure<dyn FnMut(JsValue, JsValue)>)>,
}

pub struct AudioEmbedBackend {
    iframe: HtmlIFrameElement,
    shared: Rc<RefCell<WidgetShared>>,
}

impl AudioEmbedBackend {
    pub fn new(
        container: &Element,
        embed_url: &str,
        script_url: &str,
        events: EventSink,
    ) -> Result<Self> {
        let document = window()
            .and_then(|w| w.document())
            .ok_or_else(|| PlayerError::Js("no document".to_string()))?;
        let iframe: HtmlIFrameElement = document
            .create_element("iframe")?
            .dyn_into()
            .map_err(|_| PlayerError::Js("iframe element has the wrong type".to_string()))?;
        iframe.set_src(embed_url);
        iframe.set_width("100%");
        iframe.set_height("60");
        iframe.set_attribute("frameborder", "0")?;
        iframe.set_attribute("allow", "autoplay")?;
        container.append_child(&iframe)?;

        let shared = Rc::new(RefCell::new(WidgetShared::default()));
        spawn_local(attach_widget(
            iframe.clone(),
            script_url.to_string(),
            Rc::downgrade(&shared),
            events,
        ));

        Ok(Self { iframe, shared })
    }

    fn transport(&mut self, request: Transport) {
        let (ready, widget) = {
            let mut shared = self.shared.borrow_mut();
            (shared.transport.submit(request), shared.widget.clone())
        };
        if let (Some(request), Some(widget)) = (ready, widget) {
            apply_transport(&widget, request);
        }
    }
}

async fn attach_widget(
    iframe: HtmlIFrameElement,
    script_url: String,
    shared: Weak<RefCell<WidgetShared>>,
    events: EventSink,
) {
    if let Err(err) = ensure_loaded(&script_url, WIDGET_SDK).await {
        warn!(error = %err, "audio embed sdk unavailable");
        return;
    }
    let widget = match player_widget(&iframe) {
        Ok(widget) => widget,
        Err(err) => {
            warn!(error = %PlayerError::from(err), "audio embed widget failed");
            return;
        }
    };
    if let Err(err) = JsFuture::from(widget.ready()).await {
        warn!(error = %PlayerError::from(err), "audio embed never became ready");
        return;
    }
    let duration = JsFuture::from(widget.get_duration())
        .await
        .ok()
        .and_then(|value| value.as_f64())
        .and_then(known_duration);

    let Some(shared) = shared.upgrade() else {
        return;
    };
    let (transport, seek) = {
        let mut state = shared.borrow_mut();
        if state.torn_down {
            return;
        }
        state.widget = Some(widget.clone());
        state.duration = duration;
        state.listeners = subscribe(&widget, Rc::downgrade(&shared), &events);
        let seek = state.seek.open();
        if let Some(offset) = seek {
            state.position = offset;
        }
        (state.transport.open(), seek)
    };
    debug!(?duration, "audio embed ready");

    if let Some(offset) = seek {
        let _ = widget.seek(offset);
    }
    if let Some(request) = transport {
        apply_transport(&widget, request);
    }
    events.emit(BackendEvent::Ready);
}

fn subscribe(
    widget: &MixcloudWidget,
    shared: Weak<RefCell<WidgetShared>>,
    events: &EventSink,
) -> Vec<(WidgetEvent, Closure<dyn FnMut(JsValue, JsValue)>)> {
    let hub = widget.events();
    let mut listeners = Vec::new();

    let progress = {
        let events = events.clone();
        Closure::wrap(Box::new(move |position: JsValue, duration: JsValue| {
            let position = position.as_f64().unwrap_or(0.0);
            let duration = duration.as_f64().and_then(known_duration);
            if let Some(shared) = shared.upgrade() {
                let mut state = shared.borrow_mut();
                state.position = position;
                if duration.is_some() {
                    state.duration = duration;
                }
            }
            events.emit(BackendEvent::Progress { position, duration });
        }) as Box<dyn FnMut(JsValue, JsValue)>)
    };
    listeners.push((hub.progress(), progress));

    for (source, event) in [
        (hub.play_event(), BackendEvent::Playing),
        (hub.pause_event(), BackendEvent::Paused),
        (hub.ended(), BackendEvent::Ended),
    ] {
        let events = events.clone();
        let closure = Closure::wrap(Box::new(move |_: JsValue, _: JsValue| {
            events.emit(event);
        }) as Box<dyn FnMut(JsValue, JsValue)>);
        listeners.push((source, closure));
    }

    for (source, closure) in &listeners {
        source.on(closure.as_ref().unchecked_ref());
    }
    listeners
}

fn apply_transport(widget: &MixcloudWidget, request: Transport) {
    match request {
        Transport::Play => widget.play(),
        Transport::Pause => widget.pause(),
    }
}

impl PlaybackBackend for AudioEmbedBackend {
    fn kind(&self) -> MediaKind {
        MediaKind::AudioEmbed
    }

    fn start(&mut self) {
        self.transport(Transport::Play);
    }

    fn pause(&mut self) {
        self.transport(Transport::Pause);
    }

    fn resume(&mut self) {
        self.transport(Transport::Play);
    }

    fn seek(&mut self, offset_seconds: f64) {
        let (ready, widget) = {
            let mut shared = self.shared.borrow_mut();
            (shared.seek.submit(offset_seconds), shared.widget.clone())
        };
        if let (Some(offset), Some(widget)) = (ready, widget) {
            let _ = widget.seek(offset);
            self.shared.borrow_mut().position = offset;
        }
    }

    fn current_time(&self) -> Option<f64> {
        Some(self.shared.borrow().position)
    }

    fn duration(&self) -> Option<f64> {
        self.shared.borrow().duration
    }

    fn teardown(&mut self) {
        let (widget, listeners) = {
            let mut shared = self.shared.borrow_mut();
            if shared.torn_down {
                return;
            }
            shared.torn_down = true;
            (shared.widget.take(), std::mem::take(&mut shared.listeners))
        };
        if let Some(widget) = widget {
            widget.pause();
        }
        for (source, closure) in &listeners {
            source.off(closure.as_ref().unchecked_ref());
        }
        self.iframe.remove();
    }
}

impl Drop for AudioEmbedBackend {
    fn drop(&mut self) {
        self.teardown();
    }
}
