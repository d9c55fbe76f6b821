//! The mini-player strip: the visible controls the controller keeps in sync.

use std::rc::Rc;

use crate::api::models::{MediaKind, PlaybackState};

#[cfg(target_arch = "wasm32")]
mod dom;

#[cfg(target_arch = "wasm32")]
pub use dom::DomSurface;

pub const PLAY_GLYPH: &str = "\u{25B6}";
pub const PAUSE_GLYPH: &str = "\u{23F8}";
pub const RESUME_HINT_TEXT: &str = "\u{25B6}  TAP TO RESUME";
pub const INDICATOR_TEXT: &str = "\u{25B6} PLAYING \u{00A0} OPEN \u{2192}";

/// Text shown in the strip for the active state
#[derive(Debug, Clone, PartialEq)]
pub struct Chrome {
    pub title: String,
    pub meta: String,
    pub kind: MediaKind,
}

impl Chrome {
    pub fn for_state(state: &PlaybackState) -> Self {
        Self {
            title: state.title.clone(),
            meta: state.meta_line(),
            kind: state.kind,
        }
    }
}

/// Callbacks the surface wires into the markup it renders.
#[derive(Clone)]
pub struct SurfaceHooks {
    pub resume: Rc<dyn Fn()>,
    /// Receives the pointer's horizontal viewport coordinate.
    pub seek: Rc<dyn Fn(f64)>,
}

impl SurfaceHooks {
    pub fn inert() -> Self {
        Self {
            resume: Rc::new(|| {}),
            seek: Rc::new(|_: f64| {}),
        }
    }
}

/// Horizontal extent of the progress bar in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarBounds {
    pub left: f64,
    pub width: f64,
}

impl BarBounds {
    /// Fraction of the bar under `client_x`, clamped to `0.0..=1.0`.
    pub fn fraction_at(&self, client_x: f64) -> Option<f64> {
        if !(self.width.is_finite() && self.width > 0.0) || !client_x.is_finite() {
            return None;
        }
        Some(((client_x - self.left) / self.width).clamp(0.0, 1.0))
    }
}

/// Fill width of the progress bar, in percent.
pub fn progress_percent(position: f64, duration: Option<f64>) -> Option<f64> {
    let duration = duration.filter(|d| d.is_finite() && *d > 0.0)?;
    let position = if position.is_finite() { position } else { 0.0 };
    Some((position / duration * 100.0).clamp(0.0, 100.0))
}

/// Control strip the controller renders into. Implementations must tolerate
/// any of their anchor elements being absent and treat that as a no-op.
pub trait ControlSurface {
    /// Full chrome: title, meta line, play button, progress bar and, for
    /// embeds, the container the embed is injected into.
    fn render_player(&mut self, chrome: &Chrome, hooks: &SurfaceHooks);
    /// Display-only badge linking to the show page; play button hidden.
    fn render_indicator(&mut self, chrome: &Chrome, href: &str);
    fn hide(&mut self);
    fn sync_play_button(&mut self, playing: bool);
    fn sync_progress(&mut self, position: f64, duration: Option<f64>);
    fn show_resume_hint(&mut self, hooks: &SurfaceHooks);
    fn clear_resume_hint(&mut self);
    /// Empty the embed container.
    fn clear_media(&mut self);
    fn progress_bounds(&self) -> Option<BarBounds>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_of_the_bar() {
        let bar = BarBounds {
            left: 100.0,
            width: 400.0,
        };
        assert_eq!(bar.fraction_at(100.0), Some(0.0));
        assert_eq!(bar.fraction_at(500.0), Some(1.0));
        assert_eq!(bar.fraction_at(300.0), Some(0.5));
    }

    #[test]
    fn outside_the_bar_clamps() {
        let bar = BarBounds {
            left: 10.0,
            width: 100.0,
        };
        assert_eq!(bar.fraction_at(0.0), Some(0.0));
        assert_eq!(bar.fraction_at(999.0), Some(1.0));
    }

    #[test]
    fn collapsed_bar_has_no_fraction() {
        let bar = BarBounds {
            left: 10.0,
            width: 0.0,
        };
        assert_eq!(bar.fraction_at(10.0), None);
    }

    #[test]
    fn percent_needs_a_duration() {
        assert_eq!(progress_percent(30.0, None), None);
        assert_eq!(progress_percent(30.0, Some(f64::NAN)), None);
        assert_eq!(progress_percent(30.0, Some(120.0)), Some(25.0));
        assert_eq!(progress_percent(500.0, Some(120.0)), Some(100.0));
    }

    #[test]
    fn chrome_meta_line() {
        let state = PlaybackState {
            id: "ep".into(),
            title: "Night Shift".into(),
            series: "KLOOM".into(),
            date: "2024-03-01".into(),
            kind: MediaKind::LocalAudio,
            src: "ep.mp3".into(),
            media_url: String::new(),
            embed_url: String::new(),
            show_url: String::new(),
            position_seconds: 0.0,
            is_playing: false,
        };
        let chrome = Chrome::for_state(&state);
        assert_eq!(chrome.meta, "KLOOM // 2024-03-01");
        assert_eq!(chrome.title, "Night Shift");
    }
}
