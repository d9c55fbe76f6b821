// Lazy, single-flight loading of the third-party player SDK scripts.
use std::cell::RefCell;
use std::collections::HashMap;

use futures_util::future::{FutureExt, LocalBoxFuture, Shared};
use js_sys::{Function, Promise, Reflect};
use tracing::debug;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, HtmlScriptElement};

use crate::error::{js_message, PlayerError, Result};

/// How a script announces that its API can be used.
#[derive(Debug, Clone, Copy)]
pub enum ReadySignal {
    /// Usable as soon as the script element fires `load`.
    OnLoad,
    /// The script calls this global function once its API is ready.
    GlobalCallback(&'static str),
}

/// An SDK script plus the global it defines.
#[derive(Debug, Clone, Copy)]
pub struct ScriptSpec {
    /// Global object the SDK installs, e.g. `YT`.
    pub global: &'static str,
    /// Constructor on that global whose presence means the SDK is usable.
    pub member: &'static str,
    pub ready: ReadySignal,
}

type LoadFuture = Shared<LocalBoxFuture<'static, std::result::Result<(), String>>>;

thread_local! {
    static IN_FLIGHT: RefCell<HashMap<String, LoadFuture>> = RefCell::new(HashMap::new());
}

/// Resolves once the script at `url` is loaded and its API is usable.
///
/// The script tag is injected at most once per page; every caller shares the
/// same outcome, failures included.
pub async fn ensure_loaded(url: &str, spec: ScriptSpec) -> Result<()> {
    let load = IN_FLIGHT.with(|in_flight| {
        in_flight
            .borrow_mut()
            .entry(url.to_string())
            .or_insert_with(|| inject(url.to_string(), spec).boxed_local().shared())
            .clone()
    });
    load.await.map_err(|message| PlayerError::Script {
        url: url.to_string(),
        message,
    })
}

pub fn global_present(spec: &ScriptSpec) -> bool {
    let Some(window) = window() else {
        return false;
    };
    let Ok(global) = Reflect::get(&window, &JsValue::from_str(spec.global)) else {
        return false;
    };
    if global.is_undefined() || global.is_null() {
        return false;
    }
    Reflect::get(&global, &JsValue::from_str(spec.member))
        .map(|member| member.is_function())
        .unwrap_or(false)
}

async fn inject(url: String, spec: ScriptSpec) -> std::result::Result<(), String> {
    if global_present(&spec) {
        debug!(%url, "sdk already on the page");
        return Ok(());
    }

    let window = window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let script: HtmlScriptElement = document
        .create_element("script")
        .map_err(|e| js_message(&e))?
        .dyn_into()
        .map_err(|_| "script element has the wrong type".to_string())?;

    let ready = Promise::new(&mut |resolve: Function, reject: Function| {
        match spec.ready {
            ReadySignal::OnLoad => script.set_onload(Some(&resolve)),
            ReadySignal::GlobalCallback(name) => {
                // Keep any callback the host page registered itself.
                let previous = Reflect::get(&window, &JsValue::from_str(name))
                    .ok()
                    .and_then(|value| value.dyn_into::<Function>().ok());
                let hook = Closure::once_into_js(move || {
                    if let Some(previous) = previous {
                        let _ = previous.call0(&JsValue::NULL);
                    }
                    let _ = resolve.call0(&JsValue::NULL);
                });
                let _ = Reflect::set(&window, &JsValue::from_str(name), &hook);
            }
        }
        script.set_onerror(Some(&reject));
    });

    script.set_src(&url);
    script.set_async(true);
    let parent = document
        .head()
        .map(|head| head.unchecked_into::<web_sys::Node>())
        .or_else(|| document.body().map(|body| body.unchecked_into()))
        .ok_or("document has no head or body")?;
    parent.append_child(&script).map_err(|e| js_message(&e))?;
    debug!(%url, "injected sdk script");

    JsFuture::from(ready)
        .await
        .map(|_| ())
        .map_err(|_| "script failed to load".to_string())
}
