use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::spawn_local;
use web_sys::{window, Document, HtmlElement, HtmlInputElement};

use super::{plan_filter, SearchIndex};
use crate::api::search_index::fetch_search_index;
use crate::db::SearchSettings;

/// Wires the archive search box, if the page has one. The index is fetched
/// once in the background; until it arrives every non-empty query hides all
/// cards.
pub fn install_search(settings: SearchSettings) {
    let Some(document) = window().and_then(|w| w.document()) else {
        return;
    };
    let Some(input) = document
        .get_element_by_id(&settings.input_id)
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    else {
        debug!(id = %settings.input_id, "no search box on this page");
        return;
    };

    let index = Rc::new(RefCell::new(SearchIndex::default()));
    {
        let index = index.clone();
        let path = settings.index_path.clone();
        spawn_local(async move {
            match fetch_search_index(&path).await {
                Ok(records) => {
                    let loaded = SearchIndex::from_records(&records);
                    info!(shows = loaded.len(), "search index loaded");
                    *index.borrow_mut() = loaded;
                }
                Err(err) => warn!(error = %err, "search disabled"),
            }
        });
    }

    let target = input.clone();
    let on_input = Closure::wrap(Box::new(move || {
        apply_filter(&document, &settings, &index.borrow(), &target.value());
    }) as Box<dyn FnMut()>);
    let _ = input.add_event_listener_with_callback("input", on_input.as_ref().unchecked_ref());
    // Lives as long as the page.
    on_input.forget();
}

fn apply_filter(document: &Document, settings: &SearchSettings, index: &SearchIndex, query: &str) {
    let cards = matching_elements(document, &settings.card_selector);
    let card_ids: Vec<String> = cards.iter().map(|card| card.id()).collect();
    let plan = plan_filter(
        index,
        query,
        card_ids.iter().map(String::as_str),
        &settings.card_id_prefix,
    );

    let header_display = if plan.headers_visible { "" } else { "none" };
    for header in matching_elements(document, &settings.header_selector) {
        let _ = header.style().set_property("display", header_display);
    }
    for (card, visible) in cards.iter().zip(plan.cards) {
        let _ = card
            .style()
            .set_property("display", if visible { "" } else { "none" });
    }
}

fn matching_elements(document: &Document, selector: &str) -> Vec<HtmlElement> {
    let Ok(nodes) = document.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.get(i))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .collect()
}
