// Player controller: the single "now playing" record and the backend driving it.
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};

use super::{known_duration, BackendEvent, BackendFactory, EventSink, PlaybackBackend};
use crate::api::models::{sanitize_seconds, LoadDescriptor, MediaKind, PlaybackState};
use crate::components::player::{Chrome, ControlSurface, SurfaceHooks};
use crate::db::{PlayerSettings, SnapshotStore};
use crate::utils::listen_url;

/// Lifecycle of one playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    /// Backend created, readiness not reported yet.
    Loading,
    Playing,
    Paused,
    Ended,
    /// Display-only state for media the host plays itself.
    Indicator,
}

pub struct PlayerController {
    settings: PlayerSettings,
    state: Option<PlaybackState>,
    phase: PlaybackPhase,
    backend: Option<Box<dyn PlaybackBackend>>,
    generation: u64,
    factory: Box<dyn BackendFactory>,
    surface: Box<dyn ControlSurface>,
    store: Box<dyn SnapshotStore>,
    hooks: SurfaceHooks,
    deliver: Option<Rc<dyn Fn(u64, BackendEvent)>>,
}

impl PlayerController {
    pub fn new(
        settings: PlayerSettings,
        factory: Box<dyn BackendFactory>,
        surface: Box<dyn ControlSurface>,
        store: Box<dyn SnapshotStore>,
    ) -> Self {
        Self {
            settings,
            state: None,
            phase: PlaybackPhase::Idle,
            backend: None,
            generation: 0,
            factory,
            surface,
            store,
            hooks: SurfaceHooks::inert(),
            deliver: None,
        }
    }

    pub fn state(&self) -> Option<&PlaybackState> {
        self.state.as_ref()
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn load(&mut self, descriptor: LoadDescriptor) {
        self.teardown();

        let state = match PlaybackState::from_descriptor(descriptor).validate() {
            Ok(state) => state,
            Err(err) => {
                warn!(error = %err, "ignoring load request");
                self.clear_session();
                return;
            }
        };
        info!(id = %state.id, kind = %state.kind, "loading media");

        self.surface
            .render_player(&Chrome::for_state(&state), &self.hooks);
        self.surface.sync_progress(0.0, None);
        self.state = Some(state);
        self.phase = PlaybackPhase::Loading;

        self.attach_backend();
        if let Some(backend) = self.backend.as_mut() {
            backend.start();
        } else {
            self.phase = PlaybackPhase::Idle;
        }

        self.sync_play_button();
        self.persist();
    }

    /// Indicator mode for embeds the host page plays inline.
    pub fn set_now_playing(&mut self, descriptor: LoadDescriptor) {
        let local_audio_playing = self
            .backend
            .as_ref()
            .is_some_and(|b| b.kind() == MediaKind::LocalAudio)
            && self.state.as_ref().is_some_and(|s| s.is_playing);
        if local_audio_playing {
            debug!("local audio is playing, indicator left alone");
            return;
        }

        self.teardown();
        let state = PlaybackState::from_descriptor(descriptor);
        let href = if !state.show_url.trim().is_empty() {
            state.show_url.clone()
        } else if !state.id.trim().is_empty() {
            self.settings.show_page_url(&state.id)
        } else {
            listen_url(state.kind, &state.embed_url).unwrap_or_default()
        };
        self.surface
            .render_indicator(&Chrome::for_state(&state), &href);
        self.state = Some(state);
        self.phase = PlaybackPhase::Indicator;
    }

    pub fn toggle_play(&mut self) {
        let (Some(state), Some(backend)) = (self.state.as_mut(), self.backend.as_mut()) else {
            return;
        };
        self.surface.clear_resume_hint();

        if state.is_playing {
            backend.pause();
            state.is_playing = false;
        } else {
            backend.resume();
            state.is_playing = true;
        }
        if self.phase != PlaybackPhase::Loading {
            self.phase = if state.is_playing {
                PlaybackPhase::Playing
            } else {
                PlaybackPhase::Paused
            };
        }

        self.sync_play_button();
        self.persist();
    }

    /// Seek to the spot under `client_x` on the progress bar.
    pub fn seek(&mut self, client_x: f64) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let Some(duration) = backend.duration().and_then(known_duration) else {
            debug!("seek ignored, duration unknown");
            return;
        };
        let Some(fraction) = self
            .surface
            .progress_bounds()
            .and_then(|bar| bar.fraction_at(client_x))
        else {
            return;
        };

        let target = fraction * duration;
        backend.seek(target);
        if let Some(state) = self.state.as_mut() {
            state.position_seconds = target;
        }
        self.surface.sync_progress(target, Some(duration));
    }

    pub fn close(&mut self) {
        info!("closing player");
        self.teardown();
        self.clear_session();
    }

    pub fn restore(&mut self) {
        if self.backend.is_some() {
            debug!("restore skipped, media already active");
            return;
        }

        let state = match self.store.load() {
            Ok(Some(state)) => state,
            Ok(None) => return,
            Err(err) => {
                debug!(error = %err, "snapshot unreadable, nothing restored");
                return;
            }
        };
        let state = match state.into_restored() {
            Ok(state) => state,
            Err(err) => {
                debug!(error = %err, "snapshot invalid, nothing restored");
                return;
            }
        };
        info!(
            id = %state.id,
            kind = %state.kind,
            position = state.position_seconds,
            "restoring media"
        );

        self.teardown();
        let resume_at = state.position_seconds;
        self.surface
            .render_player(&Chrome::for_state(&state), &self.hooks);
        self.surface.sync_progress(resume_at, None);
        self.state = Some(state);
        self.phase = PlaybackPhase::Loading;

        self.attach_backend();
        match self.backend.as_mut() {
            Some(backend) if resume_at > 0.0 => backend.seek(resume_at),
            Some(_) => {}
            None => self.phase = PlaybackPhase::Idle,
        }

        self.sync_play_button();
        self.surface.show_resume_hint(&self.hooks);
    }

    /// Periodic snapshot while playing.
    pub fn persist_tick(&mut self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if !state.is_playing {
            return;
        }
        if let Some(position) = backend.current_time() {
            state.position_seconds = sanitize_seconds(position);
        }
        self.persist();
    }

    pub fn handle_event(&mut self, generation: u64, event: BackendEvent) {
        if generation != self.generation || self.backend.is_none() {
            debug!(
                generation,
                current = self.generation,
                ?event,
                "dropping stale backend event"
            );
            return;
        }
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            BackendEvent::Ready => {
                let restoring = self.phase == PlaybackPhase::Loading && !state.is_playing;
                if self.phase == PlaybackPhase::Loading {
                    self.phase = intent_phase(state.is_playing);
                }
                let (position, duration) = match self.backend.as_ref() {
                    Some(backend) => (
                        backend.current_time().unwrap_or(state.position_seconds),
                        backend.duration(),
                    ),
                    None => (state.position_seconds, None),
                };
                let position = sanitize_seconds(position);
                // A paused embed may still report 0 before its first frame.
                if !restoring || position > state.position_seconds {
                    state.position_seconds = position;
                }
                self.surface
                    .sync_progress(state.position_seconds, duration);
            }
            BackendEvent::Progress { position, duration } => {
                if self.phase == PlaybackPhase::Ended {
                    return;
                }
                if self.phase == PlaybackPhase::Loading {
                    self.phase = intent_phase(state.is_playing);
                }
                state.position_seconds = sanitize_seconds(position);
                self.surface
                    .sync_progress(state.position_seconds, duration);
            }
            BackendEvent::Playing => {
                state.is_playing = true;
                self.phase = PlaybackPhase::Playing;
                self.surface.clear_resume_hint();
                self.sync_play_button();
                self.persist();
            }
            BackendEvent::Paused => {
                state.is_playing = false;
                if self.phase != PlaybackPhase::Ended {
                    self.phase = PlaybackPhase::Paused;
                }
                self.sync_play_button();
                self.persist();
            }
            BackendEvent::Ended => {
                info!(id = %state.id, "media ended");
                state.is_playing = false;
                self.phase = PlaybackPhase::Ended;
                self.sync_play_button();
                self.persist();
            }
        }
    }

    fn wire(&mut self, hooks: SurfaceHooks, deliver: Rc<dyn Fn(u64, BackendEvent)>) {
        self.hooks = hooks;
        self.deliver = Some(deliver);
    }

    fn attach_backend(&mut self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let events = match self.deliver.as_ref() {
            Some(deliver) => EventSink::new(self.generation, deliver.clone()),
            None => EventSink::detached(),
        };
        match self.factory.create(state, events) {
            Ok(backend) => self.backend = Some(backend),
            Err(err) => warn!(error = %err, kind = %state.kind, "backend unavailable"),
        }
    }

    /// Retire the active backend; anything it still emits becomes stale.
    fn teardown(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.teardown();
        }
        self.generation = self.generation.wrapping_add(1);
        self.surface.clear_resume_hint();
        self.surface.clear_media();
    }

    fn clear_session(&mut self) {
        self.state = None;
        self.phase = PlaybackPhase::Idle;
        self.surface.hide();
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "could not erase playback snapshot");
        }
    }

    fn sync_play_button(&mut self) {
        let playing = self.state.as_ref().is_some_and(|s| s.is_playing);
        self.surface.sync_play_button(playing);
    }

    fn persist(&mut self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        if let Err(err) = self.store.save(state) {
            warn!(error = %err, "could not persist playback snapshot");
        }
    }
}

fn intent_phase(is_playing: bool) -> PlaybackPhase {
    if is_playing {
        PlaybackPhase::Playing
    } else {
        PlaybackPhase::Paused
    }
}

/// Shared handle the host page and every callback hold.
///
/// Backend events land in a backlog first and are applied once the
/// controller is not mid-operation, so a backend that reports synchronously
/// from inside a controller call never re-enters it.
#[derive(Clone)]
pub struct Player {
    controller: Rc<RefCell<PlayerController>>,
    backlog: Rc<RefCell<VecDeque<(u64, BackendEvent)>>>,
}

struct WeakPlayer {
    controller: Weak<RefCell<PlayerController>>,
    backlog: Weak<RefCell<VecDeque<(u64, BackendEvent)>>>,
}

impl WeakPlayer {
    fn upgrade(&self) -> Option<Player> {
        Some(Player {
            controller: self.controller.upgrade()?,
            backlog: self.backlog.upgrade()?,
        })
    }
}

impl Player {
    pub fn new(
        settings: PlayerSettings,
        factory: Box<dyn BackendFactory>,
        surface: Box<dyn ControlSurface>,
        store: Box<dyn SnapshotStore>,
    ) -> Self {
        let player = Self {
            controller: Rc::new(RefCell::new(PlayerController::new(
                settings, factory, surface, store,
            ))),
            backlog: Rc::new(RefCell::new(VecDeque::new())),
        };

        let resume_target = player.downgrade();
        let seek_target = player.downgrade();
        let event_target = player.downgrade();
        let hooks = SurfaceHooks {
            resume: Rc::new(move || {
                if let Some(player) = resume_target.upgrade() {
                    player.toggle_play();
                }
            }),
            seek: Rc::new(move |client_x: f64| {
                if let Some(player) = seek_target.upgrade() {
                    player.seek(client_x);
                }
            }),
        };
        let deliver: Rc<dyn Fn(u64, BackendEvent)> =
            Rc::new(move |generation: u64, event: BackendEvent| {
                if let Some(player) = event_target.upgrade() {
                    player.backlog.borrow_mut().push_back((generation, event));
                    player.drain();
                }
            });
        player.controller.borrow_mut().wire(hooks, deliver);
        player
    }

    fn downgrade(&self) -> WeakPlayer {
        WeakPlayer {
            controller: Rc::downgrade(&self.controller),
            backlog: Rc::downgrade(&self.backlog),
        }
    }

    fn with_controller(&self, op: &str, f: impl FnOnce(&mut PlayerController)) {
        match self.controller.try_borrow_mut() {
            Ok(mut controller) => f(&mut controller),
            Err(_) => debug!(op, "player busy, request dropped"),
        }
        self.drain();
    }

    fn drain(&self) {
        loop {
            let Ok(mut controller) = self.controller.try_borrow_mut() else {
                return;
            };
            let next = self.backlog.borrow_mut().pop_front();
            match next {
                Some((generation, event)) => controller.handle_event(generation, event),
                None => return,
            }
        }
    }

    pub fn load(&self, descriptor: LoadDescriptor) {
        self.with_controller("load", |c| c.load(descriptor));
    }

    pub fn set_now_playing(&self, descriptor: LoadDescriptor) {
        self.with_controller("set_now_playing", |c| c.set_now_playing(descriptor));
    }

    pub fn toggle_play(&self) {
        self.with_controller("toggle_play", |c| c.toggle_play());
    }

    pub fn seek(&self, client_x: f64) {
        self.with_controller("seek", |c| c.seek(client_x));
    }

    pub fn close(&self) {
        self.with_controller("close", |c| c.close());
    }

    pub fn restore(&self) {
        self.with_controller("restore", |c| c.restore());
    }

    pub fn persist_tick(&self) {
        self.with_controller("persist_tick", |c| c.persist_tick());
    }

    pub fn state(&self) -> Option<PlaybackState> {
        self.controller.borrow().state().cloned()
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.controller.borrow().phase()
    }

    pub fn is_active(&self) -> bool {
        self.controller.borrow().has_backend()
    }
}
