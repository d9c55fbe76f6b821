use web_sys::{window, Element};

use super::audio_embed::AudioEmbedBackend;
use super::local_audio::LocalAudioBackend;
use super::video_embed::VideoEmbedBackend;
use super::{BackendFactory, EventSink, PlaybackBackend};
use crate::api::models::{MediaKind, PlaybackState};
use crate::db::PlayerSettings;
use crate::error::{PlayerError, Result};
use crate::utils::embed_video_id;

/// Builds browser-backed backends. The embed container must already be in the
/// page, which `DomSurface::render_player` guarantees.
pub struct WebBackendFactory {
    settings: PlayerSettings,
}

impl WebBackendFactory {
    pub fn new(settings: PlayerSettings) -> Self {
        Self { settings }
    }

    fn embed_container(&self) -> Result<Element> {
        let id = &self.settings.anchors.embed;
        window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
            .ok_or_else(|| PlayerError::MissingAnchor(id.clone()))
    }
}

impl BackendFactory for WebBackendFactory {
    fn create(
        &mut self,
        state: &PlaybackState,
        events: EventSink,
    ) -> Result<Box<dyn PlaybackBackend>> {
        let locator = state
            .locator()
            .ok_or(PlayerError::MissingLocator(state.kind))?;

        let backend: Box<dyn PlaybackBackend> = match state.kind {
            MediaKind::LocalAudio => Box::new(LocalAudioBackend::new(locator, events)?),
            MediaKind::AudioEmbed => Box::new(AudioEmbedBackend::new(
                &self.embed_container()?,
                locator,
                &self.settings.audio_embed_script,
                events,
            )?),
            MediaKind::VideoEmbed => {
                let video_id =
                    embed_video_id(locator).ok_or(PlayerError::MissingLocator(state.kind))?;
                Box::new(VideoEmbedBackend::new(
                    &self.embed_container()?,
                    video_id,
                    &self.settings.video_embed_script,
                    self.settings.video_poll_interval_ms,
                    events,
                )?)
            }
        };
        Ok(backend)
    }
}
