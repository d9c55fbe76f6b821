//! Browser tests for the DOM control strip and the local-storage snapshot store.

#![cfg(target_arch = "wasm32")]

use std::rc::Rc;

use kloom_player::components::player::{Chrome, ControlSurface, DomSurface, SurfaceHooks};
use kloom_player::db::{AnchorIds, LocalSnapshotStore, SnapshotStore};
use kloom_player::{LoadDescriptor, MediaKind, PlaybackState};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn mount_strip() -> HtmlElement {
    let root: HtmlElement = document()
        .create_element("div")
        .unwrap()
        .dyn_into()
        .unwrap();
    root.set_id("kloom-player");
    root.set_inner_html(
        "<span id=\"kp-title\"></span><span id=\"kp-meta\"></span>\
         <button id=\"kp-play-btn\"></button><div id=\"kp-mid\"></div>",
    );
    document().body().unwrap().append_child(&root).unwrap();
    root
}

fn chrome(kind: MediaKind) -> Chrome {
    Chrome {
        title: "Night Shift".into(),
        meta: "KLOOM // 2024-05-01".into(),
        kind,
    }
}

fn text_of(id: &str) -> String {
    document()
        .get_element_by_id(id)
        .and_then(|el| el.text_content())
        .unwrap_or_default()
}

#[wasm_bindgen_test]
fn snapshot_round_trip_through_local_storage() {
    let store = LocalSnapshotStore::new("kloom_player_test");
    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), None);

    let mut state = PlaybackState::from_descriptor(LoadDescriptor {
        id: "ep-1".into(),
        src: "audio/ep-1.mp3".into(),
        ..Default::default()
    });
    state.position_seconds = 42.0;
    store.save(&state).unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.id, "ep-1");
    assert_eq!(loaded.position_seconds, 42.0);

    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), None);
}

#[wasm_bindgen_test]
fn surface_without_markup_is_inert() {
    let mut surface = DomSurface::new(AnchorIds {
        root: "no-such-player".into(),
        middle: "no-such-mid".into(),
        progress: "no-such-progress".into(),
        ..Default::default()
    });
    let hooks = SurfaceHooks::inert();

    surface.render_player(&chrome(MediaKind::LocalAudio), &hooks);
    surface.render_indicator(&chrome(MediaKind::VideoEmbed), "shows/ep.html");
    surface.sync_play_button(true);
    surface.sync_progress(10.0, Some(20.0));
    surface.show_resume_hint(&hooks);
    surface.clear_resume_hint();
    surface.clear_media();
    surface.hide();
    assert_eq!(surface.progress_bounds(), None);
}

#[wasm_bindgen_test]
fn surface_renders_and_syncs_the_strip() {
    let root = mount_strip();
    let mut surface = DomSurface::new(AnchorIds::default());

    surface.render_player(&chrome(MediaKind::AudioEmbed), &SurfaceHooks::inert());
    assert!(root.class_list().contains("active"));
    assert_eq!(text_of("kp-title"), "Night Shift");
    assert_eq!(text_of("kp-meta"), "KLOOM // 2024-05-01");
    assert!(document().get_element_by_id("kp-progress").is_some());
    assert!(document().get_element_by_id("kp-embed").is_some());

    surface.sync_play_button(true);
    assert_eq!(text_of("kp-play-btn"), "\u{23F8}");

    surface.sync_progress(30.0, Some(120.0));
    assert_eq!(text_of("kp-time"), "0:30 / 2:00");
    let fill: HtmlElement = document()
        .get_element_by_id("kp-fill")
        .unwrap()
        .dyn_into()
        .unwrap();
    assert_eq!(fill.style().get_property_value("width").unwrap(), "25%");

    surface.hide();
    assert!(!root.class_list().contains("active"));
    root.remove();
}

#[wasm_bindgen_test]
fn resume_hint_removes_itself_and_resumes() {
    let root = mount_strip();
    let mut surface = DomSurface::new(AnchorIds::default());
    let resumed = Rc::new(std::cell::Cell::new(0));
    let counter = resumed.clone();
    let hooks = SurfaceHooks {
        resume: Rc::new(move || counter.set(counter.get() + 1)),
        seek: Rc::new(|_: f64| {}),
    };

    surface.render_player(&chrome(MediaKind::LocalAudio), &hooks);
    surface.show_resume_hint(&hooks);
    let hint: HtmlElement = document()
        .get_element_by_id("kp-resume")
        .unwrap()
        .dyn_into()
        .unwrap();
    let mid = document().get_element_by_id("kp-mid").unwrap();
    assert_eq!(mid.first_element_child().unwrap().id(), "kp-resume");

    hint.click();
    assert_eq!(resumed.get(), 1);
    assert!(document().get_element_by_id("kp-resume").is_none());
    root.remove();
}

#[wasm_bindgen_test]
fn indicator_hides_the_play_button() {
    let root = mount_strip();
    let mut surface = DomSurface::new(AnchorIds::default());

    surface.render_indicator(&chrome(MediaKind::VideoEmbed), "shows/ep-3.html");
    let button: HtmlElement = document()
        .get_element_by_id("kp-play-btn")
        .unwrap()
        .dyn_into()
        .unwrap();
    assert_eq!(button.style().get_property_value("display").unwrap(), "none");

    let badge = document()
        .get_element_by_id("kp-mid")
        .unwrap()
        .first_element_child()
        .unwrap();
    assert_eq!(badge.get_attribute("href").as_deref(), Some("shows/ep-3.html"));
    assert_eq!(badge.class_name(), "kp-badge");
    root.remove();
}

#[wasm_bindgen_test]
fn logging_can_be_installed_twice() {
    kloom_player::diagnostics::init_logging();
    kloom_player::diagnostics::init_logging();
    tracing::info!("console logging ready");
}
