use tracing::debug;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{window, Document, Element, HtmlElement, MouseEvent};

use super::{
    progress_percent, BarBounds, Chrome, ControlSurface, SurfaceHooks, INDICATOR_TEXT,
    PAUSE_GLYPH, PLAY_GLYPH, RESUME_HINT_TEXT,
};
use crate::api::models::format_progress;
use crate::db::AnchorIds;

/// Control strip backed by the host page's markup, looked up by id on every
/// call so pages without the strip simply see no-ops.
pub struct DomSurface {
    anchors: AnchorIds,
    // Listeners stay owned here; replaced on the next render, never dropped
    // from inside their own callback.
    progress_click: Option<Closure<dyn FnMut(MouseEvent)>>,
    hint_click: Option<Closure<dyn FnMut()>>,
}

impl DomSurface {
    pub fn new(anchors: AnchorIds) -> Self {
        Self {
            anchors,
            progress_click: None,
            hint_click: None,
        }
    }

    fn document(&self) -> Option<Document> {
        window()?.document()
    }

    fn element(&self, id: &str) -> Option<Element> {
        let found = self.document()?.get_element_by_id(id);
        if found.is_none() {
            debug!(id, "anchor not on this page");
        }
        found
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.element(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_style(&self, id: &str, property: &str, value: &str) {
        if let Some(el) = self.element(id).and_then(|el| el.dyn_into::<HtmlElement>().ok()) {
            let _ = el.style().set_property(property, value);
        }
    }

    fn show_chrome(&self, chrome: &Chrome) -> bool {
        let Some(root) = self.element(&self.anchors.root) else {
            return false;
        };
        let _ = root.class_list().add_1("active");
        self.set_text(&self.anchors.title, &chrome.title);
        self.set_text(&self.anchors.meta, &chrome.meta);
        true
    }

    fn progress_markup(&self, with_embed: bool) -> String {
        let a = &self.anchors;
        let mut html = format!(
            "<div class=\"kp-progress-wrap\">\
             <div class=\"kp-progress\" id=\"{}\"><div class=\"kp-progress-fill\" id=\"{}\"></div></div>\
             <span class=\"kp-time\" id=\"{}\">0:00 / 0:00</span>\
             </div>",
            a.progress, a.fill, a.time
        );
        if with_embed {
            html.push_str(&format!("<div class=\"kp-embed\" id=\"{}\"></div>", a.embed));
        }
        html
    }
}

impl ControlSurface for DomSurface {
    fn render_player(&mut self, chrome: &Chrome, hooks: &SurfaceHooks) {
        if !self.show_chrome(chrome) {
            return;
        }
        self.set_style(&self.anchors.play_button, "display", "");

        let Some(mid) = self.element(&self.anchors.middle) else {
            return;
        };
        mid.set_inner_html(&self.progress_markup(chrome.kind.is_embed()));

        let Some(bar) = self.element(&self.anchors.progress) else {
            return;
        };
        let seek = hooks.seek.clone();
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            seek(event.client_x() as f64);
        }) as Box<dyn FnMut(MouseEvent)>);
        let _ = bar.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        self.progress_click = Some(closure);
    }

    fn render_indicator(&mut self, chrome: &Chrome, href: &str) {
        if !self.show_chrome(chrome) {
            return;
        }
        self.set_style(&self.anchors.play_button, "display", "none");

        let (Some(document), Some(mid)) = (self.document(), self.element(&self.anchors.middle))
        else {
            return;
        };
        mid.set_inner_html("");
        let Ok(badge) = document.create_element("a") else {
            return;
        };
        let _ = badge.set_attribute("href", href);
        badge.set_class_name("kp-badge");
        badge.set_text_content(Some(INDICATOR_TEXT));
        let _ = mid.append_child(&badge);
    }

    fn hide(&mut self) {
        if let Some(root) = self.element(&self.anchors.root) {
            let _ = root.class_list().remove_1("active");
        }
    }

    fn sync_play_button(&mut self, playing: bool) {
        let glyph = if playing { PAUSE_GLYPH } else { PLAY_GLYPH };
        self.set_text(&self.anchors.play_button, glyph);
    }

    fn sync_progress(&mut self, position: f64, duration: Option<f64>) {
        if let Some(percent) = progress_percent(position, duration) {
            self.set_style(&self.anchors.fill, "width", &format!("{percent}%"));
        }
        self.set_text(&self.anchors.time, &format_progress(position, duration));
    }

    fn show_resume_hint(&mut self, hooks: &SurfaceHooks) {
        let (Some(document), Some(mid)) = (self.document(), self.element(&self.anchors.middle))
        else {
            return;
        };
        let Ok(hint) = document.create_element("div") else {
            return;
        };
        hint.set_id(&self.anchors.resume_hint);
        hint.set_class_name("kp-resume");
        hint.set_text_content(Some(RESUME_HINT_TEXT));

        let resume = hooks.resume.clone();
        let target = hint.clone();
        let closure = Closure::wrap(Box::new(move || {
            target.remove();
            resume();
        }) as Box<dyn FnMut()>);
        let _ = hint.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        self.hint_click = Some(closure);

        let _ = mid.insert_before(&hint, mid.first_child().as_ref());
    }

    fn clear_resume_hint(&mut self) {
        // Only the element goes; the listener may be the one running right now.
        if let Some(hint) = self.element(&self.anchors.resume_hint) {
            hint.remove();
        }
    }

    fn clear_media(&mut self) {
        if let Some(embed) = self.element(&self.anchors.embed) {
            embed.set_inner_html("");
        }
    }

    fn progress_bounds(&self) -> Option<BarBounds> {
        let rect = self.element(&self.anchors.progress)?.get_bounding_client_rect();
        Some(BarBounds {
            left: rect.left(),
            width: rect.width(),
        })
    }
}
