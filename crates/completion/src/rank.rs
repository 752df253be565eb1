//! Candidate filtering and ordering.

use std::collections::HashSet;

use crate::item::{CompletionItem, ItemKind};
use crate::semantic::SemanticCompletion;

/// Keyword and document-word suggestions for `prefix`.
///
/// Empty when the prefix is shorter than `min_len`. An exact match
/// (ignoring case) comes first, the rest follow in lowercase order.
pub fn rank_static(
    prefix: &str,
    base: &[String],
    dynamic: &[String],
    min_len: usize,
    max_items: usize,
) -> Vec<CompletionItem> {
    if prefix.chars().count() < min_len {
        return Vec::new();
    }
    let needle = prefix.to_lowercase();

    let mut seen = HashSet::new();
    let mut candidates: Vec<&str> = base
        .iter()
        .chain(dynamic.iter())
        .map(String::as_str)
        .filter(|w| seen.insert(*w))
        .filter(|w| w.to_lowercase().starts_with(&needle))
        .collect();

    candidates.sort_by_cached_key(|w| {
        let lower = w.to_lowercase();
        (lower != needle, lower)
    });

    candidates
        .into_iter()
        .take(max_items)
        .map(|w| CompletionItem::new(w, ItemKind::Keyword))
        .collect()
}

/// Semantic results narrowed to `ident_prefix`, sorted by name.
pub fn rank_semantic(
    completions: &[SemanticCompletion],
    ident_prefix: &str,
    max_items: usize,
) -> Vec<CompletionItem> {
    let needle = ident_prefix.to_lowercase();
    let mut items: Vec<CompletionItem> = completions
        .iter()
        .filter(|c| c.name.to_lowercase().starts_with(&needle))
        .map(|c| CompletionItem::new(c.name.clone(), ItemKind::from_jedi_type(&c.kind)))
        .collect();
    items.sort_by(|a, b| a.label.cmp(&b.label));
    items.dedup_by(|a, b| a.label == b.label);
    items.truncate(max_items);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn short_prefix_gives_nothing() {
        let base = words(&["for", "function"]);
        assert!(rank_static("f", &base, &[], 2, 50).is_empty());
    }

    #[test]
    fn exact_match_first_then_alphabetical() {
        let base = words(&["function", "Fun", "funnel"]);
        let dynamic = words(&["fun_stuff", "function"]);
        let items = rank_static("fun", &base, &dynamic, 2, 50);
        assert_eq!(labels(&items), vec!["Fun", "fun_stuff", "function", "funnel"]);
        assert!(items.iter().all(|i| i.kind == ItemKind::Keyword));
    }

    #[test]
    fn matching_ignores_case_and_caps_count() {
        let base = words(&["Alpha", "alphabet", "alpine", "beta"]);
        let items = rank_static("AL", &base, &[], 2, 2);
        assert_eq!(labels(&items), vec!["Alpha", "alphabet"]);
    }

    #[test]
    fn semantic_results_are_filtered_and_sorted() {
        let results = vec![
            SemanticCompletion::new("pathsep", "statement"),
            SemanticCompletion::new("path", "module"),
            SemanticCompletion::new("getcwd", "function"),
            SemanticCompletion::new("PathLike", "class"),
        ];
        let items = rank_semantic(&results, "pa", 50);
        assert_eq!(labels(&items), vec!["PathLike", "path", "pathsep"]);
        assert_eq!(items[0].kind, ItemKind::Class);
        assert_eq!(items[1].kind, ItemKind::Variable);

        assert_eq!(rank_semantic(&results, "", 50).len(), 4);
    }
}
