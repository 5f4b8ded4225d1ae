//! Title-based de-duplication.
//!
//! Exact equality after normalisation only; there is no fuzzy matching.

use std::collections::HashSet;

use giftdb_core::{CatalogRow, ProductRecord};

pub trait HasTitle {
    fn title(&self) -> Option<&str>;
}

impl HasTitle for ProductRecord {
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

impl HasTitle for CatalogRow {
    fn title(&self) -> Option<&str> {
        Some(self.title.as_str())
    }
}

/// Lower-case, map non-word characters to spaces, collapse whitespace.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop items whose normalised title was already seen, keeping first
/// occurrences in order. Untitled items are never considered duplicates.
#[must_use]
pub fn dedup_by_title<T: HasTitle>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match item.title().map(normalize_title) {
            Some(key) if !key.is_empty() => seen.insert(key),
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: Option<&str>, url: &str) -> ProductRecord {
        let mut r = ProductRecord::for_url(url);
        r.title = title.map(str::to_string);
        r
    }

    #[test]
    fn punctuation_and_case_collapse() {
        assert_eq!(normalize_title("LEGO Friends: Mall!"), "lego friends mall");
        assert_eq!(normalize_title("  lego   friends mall "), "lego friends mall");
        assert_eq!(normalize_title("Café/Set"), "café set");
    }

    #[test]
    fn keeps_first_occurrence_in_order() {
        let out = dedup_by_title(vec![
            record(Some("LEGO Friends: Mall!"), "https://a/1"),
            record(Some("Barbie Dreamhouse"), "https://a/2"),
            record(Some("lego friends mall"), "https://a/3"),
        ]);
        let urls: Vec<&str> = out.iter().map(|r| r.product_url.as_str()).collect();
        assert_eq!(urls, vec!["https://a/1", "https://a/2"]);
    }

    #[test]
    fn untitled_items_survive() {
        let out = dedup_by_title(vec![
            record(None, "https://a/1"),
            record(None, "https://a/2"),
            record(Some("!!!"), "https://a/3"),
        ]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn dedup_is_idempotent() {
        let input = vec![
            record(Some("Magna-Tiles 32pc"), "https://a/1"),
            record(Some("magna tiles 32PC"), "https://a/2"),
            record(Some("Uno"), "https://a/3"),
            record(None, "https://a/4"),
        ];
        let once = dedup_by_title(input);
        let twice = dedup_by_title(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }
}
