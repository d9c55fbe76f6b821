// Static show index used by the archive search box.
#[cfg(target_arch = "wasm32")]
use gloo_net::http::Request;
use serde_json::Value;

use crate::api::models::ShowRecord;
use crate::error::{PlayerError, Result};

#[cfg(target_arch = "wasm32")]
pub async fn fetch_search_index(path: &str) -> Result<Vec<ShowRecord>> {
    let response = Request::get(path)
        .send()
        .await
        .map_err(|e| PlayerError::Index(e.to_string()))?;
    if !response.ok() {
        return Err(PlayerError::Index(format!(
            "{path} answered {}",
            response.status()
        )));
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|e| PlayerError::Index(e.to_string()))?;
    parse_index(payload)
}

/// Records that fail to decode are skipped rather than failing the whole index.
pub fn parse_index(payload: Value) -> Result<Vec<ShowRecord>> {
    let Value::Array(items) = payload else {
        return Err(PlayerError::Index("index is not a JSON array".to_string()));
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lenient_records() {
        let shows = parse_index(json!([
            {"id": "a", "title": "Alpha", "description": "d", "series": "s", "tags": ["x"]},
            {"id": "b", "title": "Beta"},
            {"title": "no id"}
        ]))
        .unwrap();
        assert_eq!(shows.len(), 2);
        assert_eq!(shows[1].id, "b");
        assert!(shows[1].tags.is_empty());
        assert_eq!(shows[1].guest, None);
    }

    #[test]
    fn non_array_payload_is_an_error() {
        assert!(matches!(
            parse_index(json!({"shows": []})),
            Err(PlayerError::Index(_))
        ));
    }
}
