//! The components module contains the player widget and the search filter.

pub mod audio_manager;
pub mod player;
pub mod search;

pub use audio_manager::{Player, PlaybackPhase};
pub use player::{ControlSurface, SurfaceHooks};
pub use search::SearchIndex;
