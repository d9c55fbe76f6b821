use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::models::PlaybackState;
use crate::error::Result;

#[cfg(target_arch = "wasm32")]
use gloo_storage::{errors::StorageError, LocalStorage, Storage};

const PLAYBACK_KEY: &str = "kloom_player";

pub const AUDIO_EMBED_SCRIPT: &str = "https://widget.mixcloud.com/media/js/widgetApi.js";
pub const VIDEO_EMBED_SCRIPT: &str = "https://www.youtube.com/iframe_api";

/// Ids of the host-page elements the player drives. Any of them may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorIds {
    pub root: String,
    pub title: String,
    pub meta: String,
    pub play_button: String,
    pub middle: String,
    pub progress: String,
    pub fill: String,
    pub time: String,
    pub resume_hint: String,
    pub embed: String,
}

impl Default for AnchorIds {
    fn default() -> Self {
        Self {
            root: "kloom-player".to_string(),
            title: "kp-title".to_string(),
            meta: "kp-meta".to_string(),
            play_button: "kp-play-btn".to_string(),
            middle: "kp-mid".to_string(),
            progress: "kp-progress".to_string(),
            fill: "kp-fill".to_string(),
            time: "kp-time".to_string(),
            resume_hint: "kp-resume".to_string(),
            embed: "kp-embed".to_string(),
        }
    }
}

/// Search filter wiring on the archive page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub input_id: String,
    pub index_path: String,
    pub card_selector: String,
    pub header_selector: String,
    pub card_id_prefix: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            input_id: "kloom-search".to_string(),
            index_path: "search-index.json".to_string(),
            card_selector: ".show-item".to_string(),
            header_selector: ".section-header".to_string(),
            card_id_prefix: "card-".to_string(),
        }
    }
}

/// Player configuration, overridable from the host page constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub storage_key: String,
    pub snapshot_interval_ms: u32,
    pub video_poll_interval_ms: u32,
    pub audio_embed_script: String,
    pub video_embed_script: String,
    /// `{id}` is replaced with the show id.
    pub show_page_pattern: String,
    pub anchors: AnchorIds,
    pub search: SearchSettings,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            storage_key: PLAYBACK_KEY.to_string(),
            snapshot_interval_ms: 3_000,
            video_poll_interval_ms: 1_000,
            audio_embed_script: AUDIO_EMBED_SCRIPT.to_string(),
            video_embed_script: VIDEO_EMBED_SCRIPT.to_string(),
            show_page_pattern: "shows/{id}.html".to_string(),
            anchors: AnchorIds::default(),
            search: SearchSettings::default(),
        }
    }
}

impl PlayerSettings {
    pub fn show_page_url(&self, id: &str) -> String {
        self.show_page_pattern.replace("{id}", id)
    }
}

/// Key-value home of the single playback snapshot.
pub trait SnapshotStore {
    /// Decoded snapshot as stored, before restore validation.
    fn load(&self) -> Result<Option<PlaybackState>>;
    fn save(&self, state: &PlaybackState) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// In-memory store for tests and pages without storage access.
///
/// Holds the serialized JSON so decode failures behave like real storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(raw.into()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<PlaybackState>> {
        match self.slot.borrow().as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &PlaybackState) -> Result<()> {
        *self.slot.borrow_mut() = Some(state.to_snapshot()?);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.slot.borrow_mut().take();
        Ok(())
    }
}

/// `localStorage` backed store
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalSnapshotStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalSnapshotStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[cfg(target_arch = "wasm32")]
impl SnapshotStore for LocalSnapshotStore {
    fn load(&self) -> Result<Option<PlaybackState>> {
        match LocalStorage::get(&self.key) {
            Ok(state) => Ok(Some(state)),
            Err(StorageError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, state: &PlaybackState) -> Result<()> {
        LocalStorage::set(&self.key, state)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        LocalStorage::delete(&self.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_keep_defaults() {
        let settings: PlayerSettings = serde_json::from_str(
            r#"{"storage_key": "radio_player", "anchors": {"title": "np-title"}}"#,
        )
        .unwrap();
        assert_eq!(settings.storage_key, "radio_player");
        assert_eq!(settings.snapshot_interval_ms, 3_000);
        assert_eq!(settings.anchors.title, "np-title");
        assert_eq!(settings.anchors.progress, "kp-progress");
        assert_eq!(settings.search.index_path, "search-index.json");
    }

    #[test]
    fn show_page_url_fills_id() {
        let settings = PlayerSettings::default();
        assert_eq!(settings.show_page_url("ep-12"), "shows/ep-12.html");
    }

    #[test]
    fn memory_store_keeps_only_latest_snapshot() {
        let store = MemorySnapshotStore::new();
        assert_eq!(store.load().unwrap(), None);

        let mut state = PlaybackState::from_descriptor(Default::default());
        state.src = "a.mp3".into();
        store.save(&state).unwrap();
        state.position_seconds = 9.0;
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap().unwrap().position_seconds, 9.0);

        store.clear().unwrap();
        assert_eq!(store.raw(), None);
    }

    #[test]
    fn memory_store_surfaces_decode_errors() {
        let store = MemorySnapshotStore::with_raw("{broken");
        assert!(store.load().is_err());
    }
}
