//! Kloom player: the site's persistent mini-player and the archive search box,
//! compiled to WebAssembly and driven from plain page scripts.
//!
//! Everything browser-facing is gated on `wasm32`; the playback state
//! machine, snapshot format and search matching build and test natively.

pub mod api;
pub mod components;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod utils;

#[cfg(target_arch = "wasm32")]
mod web;

pub use api::models::{LoadDescriptor, MediaKind, PlaybackState, ShowRecord};
pub use components::audio_manager::{
    BackendEvent, BackendFactory, EventSink, PlaybackBackend, PlaybackPhase, Player,
};
pub use db::{MemorySnapshotStore, PlayerSettings, SnapshotStore};
pub use error::{PlayerError, Result};

#[cfg(target_arch = "wasm32")]
pub use web::KloomPlayer;
