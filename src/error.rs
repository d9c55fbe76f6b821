//! Error type shared by the player and the search filter.
//!
//! Nothing here is ever shown to the visitor: public operations log these
//! and fall back to doing nothing.

use thiserror::Error;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{JsCast, JsValue};

use crate::api::models::MediaKind;

pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Error, Debug)]
pub enum PlayerError {
    /// Local storage missing, full or refusing writes
    #[error("storage error: {0}")]
    Storage(String),

    /// Snapshot or descriptor JSON did not decode
    #[error("snapshot decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A decoded record is missing the locator its kind needs
    #[error("{0} state has no media locator")]
    MissingLocator(MediaKind),

    /// Host page does not carry the named anchor element
    #[error("missing DOM anchor #{0}")]
    MissingAnchor(String),

    /// External SDK script failed to load or never signalled readiness
    #[error("script {url} failed to load: {message}")]
    Script { url: String, message: String },

    /// Exception thrown across the JS boundary
    #[error("JavaScript error: {0}")]
    Js(String),

    /// Search index could not be fetched or parsed
    #[error("search index unavailable: {0}")]
    Index(String),
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn js_message(err: &JsValue) -> String {
    if let Some(message) = err.as_string() {
        message
    } else if let Some(js_err) = err.dyn_ref::<js_sys::Error>() {
        js_err.message().into()
    } else {
        format!("{err:?}")
    }
}

#[cfg(target_arch = "wasm32")]
impl From<JsValue> for PlayerError {
    fn from(err: JsValue) -> Self {
        PlayerError::Js(js_message(&err))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<gloo_storage::errors::StorageError> for PlayerError {
    fn from(err: gloo_storage::errors::StorageError) -> Self {
        PlayerError::Storage(err.to_string())
    }
}
