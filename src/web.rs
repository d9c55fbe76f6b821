// JS entry points: the `KloomPlayer` class and the start hook.
use gloo_timers::callback::Interval;
use js_sys::Reflect;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::MouseEvent;

use crate::api::models::LoadDescriptor;
use crate::components::audio_manager::{Player, WebBackendFactory};
use crate::components::player::DomSurface;
use crate::components::search::install_search;
use crate::db::{LocalSnapshotStore, PlayerSettings};
use crate::diagnostics::init_logging;

#[wasm_bindgen]
pub struct KloomPlayer {
    player: Player,
    _snapshot_tick: Interval,
}

#[wasm_bindgen]
impl KloomPlayer {
    /// `options` is an optional plain object overriding `PlayerSettings`.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> KloomPlayer {
        Self::with_settings(settings_from_js(options))
    }

    pub fn load(&self, descriptor: JsValue) {
        if let Some(descriptor) = descriptor_from_js(descriptor) {
            self.player.load(descriptor);
        }
    }

    #[wasm_bindgen(js_name = setNowPlaying)]
    pub fn set_now_playing(&self, descriptor: JsValue) {
        if let Some(descriptor) = descriptor_from_js(descriptor) {
            self.player.set_now_playing(descriptor);
        }
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&self) {
        self.player.toggle_play();
    }

    pub fn seek(&self, event: &MouseEvent) {
        self.player.seek(event.client_x() as f64);
    }

    pub fn close(&self) {
        self.player.close();
    }

    pub fn restore(&self) {
        self.player.restore();
    }
}

impl KloomPlayer {
    fn with_settings(settings: PlayerSettings) -> Self {
        let player = Player::new(
            settings.clone(),
            Box::new(WebBackendFactory::new(settings.clone())),
            Box::new(DomSurface::new(settings.anchors.clone())),
            Box::new(LocalSnapshotStore::new(settings.storage_key.clone())),
        );
        let ticking = player.clone();
        let snapshot_tick = Interval::new(settings.snapshot_interval_ms, move || {
            ticking.persist_tick();
        });
        Self {
            player,
            _snapshot_tick: snapshot_tick,
        }
    }
}

fn settings_from_js(options: JsValue) -> PlayerSettings {
    if options.is_undefined() || options.is_null() {
        return PlayerSettings::default();
    }
    serde_wasm_bindgen::from_value(options).unwrap_or_else(|err| {
        warn!(error = %err, "player options ignored");
        PlayerSettings::default()
    })
}

fn descriptor_from_js(descriptor: JsValue) -> Option<LoadDescriptor> {
    match serde_wasm_bindgen::from_value(descriptor) {
        Ok(descriptor) => Some(descriptor),
        Err(err) => {
            warn!(error = %err, "unreadable media descriptor");
            None
        }
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    init_logging();

    let settings = PlayerSettings::default();
    install_search(settings.search.clone());

    let Some(window) = web_sys::window() else {
        return;
    };
    let instance = KloomPlayer::with_settings(settings);
    if let Err(err) = Reflect::set(&window, &JsValue::from_str("KloomPlayer"), &instance.into()) {
        warn!(error = %crate::error::js_message(&err), "could not publish window.KloomPlayer");
        return;
    }
    info!("kloom player ready");
}
