// Video-embed backend: the hosted video player, of which only the audio matters here.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Interval;
use js_sys::{Object, Reflect};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{window, Element};

use super::script_loader::{ensure_loaded, ReadySignal, ScriptSpec};
use super::{
    is_cued, known_duration, parked_seek, video_state_event, BackendEvent, EventSink,
    ParkedSeek, PlaybackBackend, ReadinessGate,
};
use crate::api::models::MediaKind;
use crate::error::{PlayerError, Result};

const PLAYER_SDK: ScriptSpec = ScriptSpec {
    global: "YT",
    member: "Player",
    ready: ReadySignal::GlobalCallback("onYouTubeIframeAPIReady"),
};

#[wasm_bindgen(js_namespace = YT)]
extern "C" {
    #[wasm_bindgen(js_name = Player)]
    #[derive(Clone)]
    type YtPlayer;

    #[wasm_bindgen(constructor, js_class = "Player", catch)]
    fn new(element: &Element, options: &JsValue) -> std::result::Result<YtPlayer, JsValue>;

    #[wasm_bindgen(method, js_class = "Player", js_name = playVideo)]
    fn play_video(this: &YtPlayer);

    #[wasm_bindgen(method, js_class = "Player", js_name = pauseVideo)]
    fn pause_video(this: &YtPlayer);

    #[wasm_bindgen(method, js_class = "Player", js_name = seekTo)]
    fn seek_to(this: &YtPlayer, seconds: f64, allow_seek_ahead: bool);

    #[wasm_bindgen(method, js_class = "Player", js_name = cueVideoById)]
    fn cue_video_by_id(this: &YtPlayer, options: &JsValue);

    #[wasm_bindgen(method, js_class = "Player", js_name = getPlayerState)]
    fn get_player_state(this: &YtPlayer) -> i32;

    #[wasm_bindgen(method, js_class = "Player", js_name = getCurrentTime)]
    fn get_current_time(this: &YtPlayer) -> f64;

    #[wasm_bindgen(method, js_class = "Player", js_name = getDuration)]
    fn get_duration(this: &YtPlayer) -> f64;

    #[wasm_bindgen(method, js_class = "Player")]
    fn destroy(this: &YtPlayer);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Transport {
    Play,
    Pause,
}

#[derive(Default)]
struct VideoShared {
    video_id: String,
    player: Option<YtPlayer>,
    ready: bool,
    transport: ReadinessGate<Transport>,
    seek: ReadinessGate<f64>,
    position: f64,
    torn_down: bool,
    poll: Option<Interval>,
    on_ready: Option<Closure<dyn FnMut(JsValue)>>,
    on_state_change: Option<Closure<dyn FnMut(JsValue)>>,
}

impl VideoShared {
    fn ready_player(&self) -> Option<YtPlayer> {
        self.player.clone().filter(|_| self.ready)
    }

    /// Ready player that has left the cued state.
    fn started_player(&self) -> Option<YtPlayer> {
        self.ready_player()
            .filter(|player| !is_cued(player.get_player_state()))
    }
}

pub struct VideoEmbedBackend {
    container: Element,
    shared: Rc<RefCell<VideoShared>>,
}

impl VideoEmbedBackend {
    pub fn new(
        container: &Element,
        video_id: String,
        script_url: &str,
        poll_interval_ms: u32,
        events: EventSink,
    ) -> Result<Self> {
        let document = window()
            .and_then(|w| w.document())
            .ok_or_else(|| PlayerError::Js("no document".to_string()))?;
        // The SDK swaps this placeholder for its own iframe.
        let host = document.create_element("div")?;
        container.append_child(&host)?;

        let shared = Rc::new(RefCell::new(VideoShared {
            video_id: video_id.clone(),
            ..Default::default()
        }));
        spawn_local(attach_player(
            host,
            video_id,
            script_url.to_string(),
            poll_interval_ms,
            Rc::downgrade(&shared),
            events,
        ));

        Ok(Self {
            container: container.clone(),
            shared,
        })
    }

    fn transport(&mut self, request: Transport) {
        let (ready, player) = {
            let mut shared = self.shared.borrow_mut();
            (shared.transport.submit(request), shared.ready_player())
        };
        if let (Some(request), Some(player)) = (ready, player) {
            apply_transport(&player, request);
        }
    }
}

async fn attach_player(
    host: Element,
    video_id: String,
    script_url: String,
    poll_interval_ms: u32,
    shared: Weak<RefCell<VideoShared>>,
    events: EventSink,
) {
    if let Err(err) = ensure_loaded(&script_url, PLAYER_SDK).await {
        warn!(error = %err, "video embed sdk unavailable");
        return;
    }
    let Some(strong) = shared.upgrade() else {
        return;
    };
    if strong.borrow().torn_down {
        return;
    }

    let on_ready = {
        let shared = shared.clone();
        let events = events.clone();
        Closure::wrap(Box::new(move |_event: JsValue| {
            on_player_ready(&shared, &events, poll_interval_ms);
        }) as Box<dyn FnMut(JsValue)>)
    };
    let on_state_change = {
        let events = events.clone();
        Closure::wrap(Box::new(move |event: JsValue| {
            let code = Reflect::get(&event, &JsValue::from_str("data"))
                .ok()
                .and_then(|data| data.as_f64());
            if let Some(mapped) = code.and_then(|code| video_state_event(code as i32)) {
                events.emit(mapped);
            }
        }) as Box<dyn FnMut(JsValue)>)
    };

    let options = match player_options(&video_id, &on_ready, &on_state_change) {
        Ok(options) => options,
        Err(err) => {
            warn!(error = %err, "could not build video player options");
            return;
        }
    };
    match YtPlayer::new(&host, &options) {
        Ok(player) => {
            let mut state = strong.borrow_mut();
            state.player = Some(player);
            state.on_ready = Some(on_ready);
            state.on_state_change = Some(on_state_change);
            debug!(%video_id, "video player created");
        }
        Err(err) => warn!(error = %PlayerError::from(err), "video player failed"),
    }
}

fn player_options(
    video_id: &str,
    on_ready: &Closure<dyn FnMut(JsValue)>,
    on_state_change: &Closure<dyn FnMut(JsValue)>,
) -> Result<JsValue> {
    let player_vars = Object::new();
    Reflect::set(&player_vars, &"autoplay".into(), &JsValue::from_f64(0.0))?;
    Reflect::set(&player_vars, &"playsinline".into(), &JsValue::from_f64(1.0))?;

    let handlers = Object::new();
    Reflect::set(&handlers, &"onReady".into(), on_ready.as_ref())?;
    Reflect::set(&handlers, &"onStateChange".into(), on_state_change.as_ref())?;

    let options = Object::new();
    Reflect::set(&options, &"videoId".into(), &JsValue::from_str(video_id))?;
    Reflect::set(&options, &"width".into(), &JsValue::from_str("100%"))?;
    Reflect::set(&options, &"height".into(), &JsValue::from_str("60"))?;
    Reflect::set(&options, &"playerVars".into(), &player_vars)?;
    Reflect::set(&options, &"events".into(), &handlers)?;
    Ok(options.into())
}

fn on_player_ready(shared: &Weak<RefCell<VideoShared>>, events: &EventSink, poll_interval_ms: u32) {
    let Some(strong) = shared.upgrade() else {
        return;
    };
    let (player, video_id, transport, seek) = {
        let mut state = strong.borrow_mut();
        if state.torn_down {
            return;
        }
        let Some(player) = state.player.clone() else {
            return;
        };
        state.ready = true;

        let poll_player = player.clone();
        let poll_shared = shared.clone();
        let poll_events = events.clone();
        state.poll = Some(Interval::new(poll_interval_ms, move || {
            if is_cued(poll_player.get_player_state()) {
                return;
            }
            let position = poll_player.get_current_time();
            if let Some(shared) = poll_shared.upgrade() {
                shared.borrow_mut().position = position;
            }
            poll_events.emit(BackendEvent::Progress {
                position,
                duration: known_duration(poll_player.get_duration()),
            });
        }));
        let transport = state.transport.open();
        let seek = parked_seek(state.seek.open(), transport == Some(Transport::Play));
        if let Some(ParkedSeek::Cue(offset) | ParkedSeek::Seek(offset)) = seek {
            state.position = offset;
        }
        (player, state.video_id.clone(), transport, seek)
    };

    match seek {
        Some(ParkedSeek::Cue(offset)) => match cue_options(&video_id, offset) {
            Ok(options) => player.cue_video_by_id(&options),
            Err(err) => warn!(error = %err, "could not cue video at saved offset"),
        },
        Some(ParkedSeek::Seek(offset)) => player.seek_to(offset, true),
        None => {}
    }
    if let Some(request) = transport {
        apply_transport(&player, request);
    }
    events.emit(BackendEvent::Ready);
}

fn cue_options(video_id: &str, start_seconds: f64) -> Result<JsValue> {
    let options = Object::new();
    Reflect::set(&options, &"videoId".into(), &JsValue::from_str(video_id))?;
    Reflect::set(&options, &"startSeconds".into(), &JsValue::from_f64(start_seconds))?;
    Ok(options.into())
}

fn apply_transport(player: &YtPlayer, request: Transport) {
    match request {
        Transport::Play => player.play_video(),
        Transport::Pause => player.pause_video(),
    }
}

impl PlaybackBackend for VideoEmbedBackend {
    fn kind(&self) -> MediaKind {
        MediaKind::VideoEmbed
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
        let (ready, player) = {
            let mut shared = self.shared.borrow_mut();
            (shared.seek.submit(offset_seconds), shared.ready_player())
        };
        if let (Some(offset), Some(player)) = (ready, player) {
            player.seek_to(offset, true);
            self.shared.borrow_mut().position = offset;
        }
    }

    fn current_time(&self) -> Option<f64> {
        let shared = self.shared.borrow();
        match shared.started_player() {
            Some(player) => Some(player.get_current_time()).filter(|t| t.is_finite()),
            None => Some(shared.position),
        }
    }

    fn duration(&self) -> Option<f64> {
        self.shared
            .borrow()
            .ready_player()
            .and_then(|player| known_duration(player.get_duration()))
    }

    fn teardown(&mut self) {
        let player = {
            let mut shared = self.shared.borrow_mut();
            if shared.torn_down {
                return;
            }
            shared.torn_down = true;
            shared.ready = false;
            // Dropping the interval clears it.
            shared.poll = None;
            shared.player.take()
        };
        if let Some(player) = player {
            player.destroy();
        }
        // Handlers are released only after the player that calls them is gone.
        {
            let mut shared = self.shared.borrow_mut();
            shared.on_ready = None;
            shared.on_state_change = None;
        }
        self.container.set_inner_html("");
    }
}

impl Drop for VideoEmbedBackend {
    fn drop(&mut self) {
        self.teardown();
    }
}
