//! Client-side show filter: hides show cards whose index record does not
//! contain the typed query.

use std::collections::HashMap;

use crate::api::models::ShowRecord;

#[cfg(target_arch = "wasm32")]
mod dom;

#[cfg(target_arch = "wasm32")]
pub use dom::install_search;

/// Lower-cased haystacks keyed by show id.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    haystacks: HashMap<String, String>,
}

impl SearchIndex {
    pub fn from_records(records: &[ShowRecord]) -> Self {
        let mut haystacks = HashMap::with_capacity(records.len());
        for record in records {
            // First record wins for a duplicated id.
            haystacks
                .entry(record.id.clone())
                .or_insert_with(|| record.haystack());
        }
        Self { haystacks }
    }

    pub fn len(&self) -> usize {
        self.haystacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.haystacks.is_empty()
    }

    /// `query` must already be normalized. Unknown ids never match.
    pub fn matches(&self, query: &str, show_id: &str) -> bool {
        self.haystacks
            .get(show_id)
            .is_some_and(|haystack| haystack.contains(query))
    }
}

pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Show id behind a card element id; ids without the prefix are used as-is.
pub fn show_id_from_card<'a>(card_id: &'a str, prefix: &str) -> &'a str {
    card_id.strip_prefix(prefix).unwrap_or(card_id)
}

/// Visibility decided for one keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPlan {
    pub headers_visible: bool,
    /// One entry per card, in the order given.
    pub cards: Vec<bool>,
}

pub fn plan_filter<'a>(
    index: &SearchIndex,
    raw_query: &str,
    card_ids: impl IntoIterator<Item = &'a str>,
    prefix: &str,
) -> FilterPlan {
    let query = normalize_query(raw_query);
    if query.is_empty() {
        return FilterPlan {
            headers_visible: true,
            cards: card_ids.into_iter().map(|_| true).collect(),
        };
    }
    FilterPlan {
        headers_visible: false,
        cards: card_ids
            .into_iter()
            .map(|card_id| index.matches(&query, show_id_from_card(card_id, prefix)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str, tags: &[&str]) -> ShowRecord {
        ShowRecord {
            id: id.to_string(),
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn index() -> SearchIndex {
        SearchIndex::from_records(&[
            record("night-shift", "Night Shift", &["dub", "techno"]),
            record("morning", "Morning Coffee", &["jazz"]),
        ])
    }

    const CARDS: [&str; 2] = ["card-night-shift", "card-morning"];

    #[test]
    fn empty_query_shows_everything() {
        let plan = plan_filter(&index(), "   ", CARDS, "card-");
        assert!(plan.headers_visible);
        assert_eq!(plan.cards, vec![true, true]);
    }

    #[test]
    fn tag_match_hides_other_cards() {
        let plan = plan_filter(&index(), " Dub ", CARDS, "card-");
        assert!(!plan.headers_visible);
        assert_eq!(plan.cards, vec![true, false]);
    }

    #[test]
    fn no_match_hides_all_cards() {
        let plan = plan_filter(&index(), "polka", CARDS, "card-");
        assert_eq!(plan.cards, vec![false, false]);
    }

    #[test]
    fn missing_index_hides_cards() {
        let plan = plan_filter(&SearchIndex::default(), "night", CARDS, "card-");
        assert!(!plan.headers_visible);
        assert_eq!(plan.cards, vec![false, false]);
    }

    #[test]
    fn first_duplicate_wins() {
        let index = SearchIndex::from_records(&[
            record("ep", "Original", &[]),
            record("ep", "Imposter", &[]),
        ]);
        assert_eq!(index.len(), 1);
        assert!(index.matches("original", "ep"));
        assert!(!index.matches("imposter", "ep"));
    }

    #[test]
    fn card_prefix_is_optional() {
        assert_eq!(show_id_from_card("card-ep-1", "card-"), "ep-1");
        assert_eq!(show_id_from_card("ep-1", "card-"), "ep-1");
    }
}
