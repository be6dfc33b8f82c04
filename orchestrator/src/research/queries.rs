use std::collections::HashSet;

use crate::models::SearchItem;

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Drop repeated and blank queries (trim + case-fold), keep first occurrences in order, cap at `max`.
pub fn dedupe_queries(items: &[SearchItem], max: usize) -> Vec<SearchItem> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| {
            let key = normalize(&item.query);
            !key.is_empty() && seen.insert(key)
        })
        .take(max)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(queries: &[&str]) -> Vec<SearchItem> {
        queries.iter().map(|q| SearchItem::new(*q, "why")).collect()
    }

    fn queries(items: &[SearchItem]) -> Vec<&str> {
        items.iter().map(|i| i.query.as_str()).collect()
    }

    #[test]
    fn keeps_first_occurrence_in_order() {
        let input = items(&["Acme earnings", "acme layoffs", "  ACME EARNINGS ", "Acme 10-Q"]);
        let out = dedupe_queries(&input, 10);
        assert_eq!(queries(&out), vec!["Acme earnings", "acme layoffs", "Acme 10-Q"]);
    }

    #[test]
    fn caps_after_deduplication() {
        let input = items(&["a", "A", "b", "c", "d"]);
        let out = dedupe_queries(&input, 3);
        assert_eq!(queries(&out), vec!["a", "b", "c"]);
    }

    #[test]
    fn blank_queries_are_dropped() {
        let input = items(&["", "   ", "acme"]);
        assert_eq!(queries(&dedupe_queries(&input, 6)), vec!["acme"]);
    }

    #[test]
    fn idempotent() {
        let input = items(&["x", "y", "X ", "z", "y"]);
        let once = dedupe_queries(&input, 6);
        let twice = dedupe_queries(&once, 6);
        assert_eq!(once, twice);
    }
}
