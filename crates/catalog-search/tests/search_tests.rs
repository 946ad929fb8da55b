use std::collections::{BTreeMap, BTreeSet};

use catalog_core::traits::SearchEngine;
use catalog_core::types::{CatalogEntry, CatalogIndex, DocumentKind, MatchOrigin, SearchQuery, INDEX_FORMAT_VERSION};
use catalog_search::{search, KeywordSearchEngine};

fn entry(id: &str, name: &str, category: Option<&str>, tags: &[&str], description: &str) -> CatalogEntry {
    CatalogEntry {
        identifier: id.to_string(),
        name: name.to_string(),
        kind: DocumentKind::Product,
        category: category.map(str::to_string),
        price: None,
        description: description.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
        source_path: format!("products-{}.json", id.to_lowercase()),
        asset_paths: Vec::new(),
        url: None,
    }
}

fn index(entries: Vec<CatalogEntry>) -> CatalogIndex {
    CatalogIndex {
        built_at: chrono::DateTime::default(),
        source_count: entries.len(),
        version: INDEX_FORMAT_VERSION,
        entries: entries.into_iter().map(|e| (e.identifier.clone(), e)).collect::<BTreeMap<_, _>>(),
    }
}

fn catalog() -> CatalogIndex {
    index(vec![
        entry("A100", "Cloud 6", Some("Shoes"), &["Running"], "Everyday running shoe"),
        entry("B200", "Trail Pant", Some("Apparel"), &["Hiking"], "Pants for the trail"),
        entry("C300", "Cloudmonster", Some("Shoes"), &["Running", "Road"], "Max cushion for trail and road, trail ready"),
        entry("D400", "Trail Tee", Some("Apparel"), &[], "Breathable tee"),
        entry("E500", "Running Cap", Some("Accessories"), &["Trail"], "Light cap"),
    ])
}

fn ids(results: &[catalog_core::types::SearchHit]) -> Vec<&str> {
    results.iter().map(|h| h.identifier.as_str()).collect()
}

#[test]
fn hints_with_empty_query_come_back_in_order() {
    let results = search(&catalog(), &SearchQuery::new("").with_hints(["C300", "A100"]));
    assert_eq!(ids(&results), vec!["C300", "A100"]);
    assert!(results.iter().all(|h| h.score == 0 && h.origin == MatchOrigin::Hint));
}

#[test]
fn empty_query_without_hints_is_empty() {
    assert!(search(&catalog(), &SearchQuery::new("   ")).is_empty());
}

#[test]
fn unknown_and_duplicate_hints_are_ignored() {
    let results = search(&catalog(), &SearchQuery::new("").with_hints(["ZZZ", "B200", "B200"]));
    assert_eq!(ids(&results), vec!["B200"]);
}

#[test]
fn no_match_is_empty() {
    assert!(search(&catalog(), &SearchQuery::new("snowboard")).is_empty());
}

#[test]
fn name_match_outranks_other_fields() {
    let results = search(&catalog(), &SearchQuery::new("trail"));
    // B200 and D400 match on name; E500 on tags; C300 on description only.
    assert_eq!(ids(&results), vec!["B200", "D400", "E500", "C300"]);
    assert!(results.iter().all(|h| h.origin == MatchOrigin::Keyword));
    assert!(results[1].score > results[2].score && results[2].score > results[3].score);
}

#[test]
fn exact_identifier_ranks_first() {
    let results = search(&catalog(), &SearchQuery::new("running e500"));
    assert_eq!(results[0].identifier, "E500");
    assert_eq!(results[0].origin, MatchOrigin::Identifier);
    assert!(results.iter().skip(1).all(|h| h.origin == MatchOrigin::Keyword));
}

#[test]
fn hinted_entries_precede_better_keyword_matches() {
    let results = search(&catalog(), &SearchQuery::new("trail").with_hints(["A100"]));
    assert_eq!(results[0].identifier, "A100");
    assert_eq!(results[0].origin, MatchOrigin::Hint);
    assert_eq!(results[0].score, 0);
    assert_eq!(results.len(), 5);
}

#[test]
fn limit_truncates() {
    let results = search(&catalog(), &SearchQuery::new("trail").with_limit(2));
    assert_eq!(ids(&results), vec!["B200", "D400"]);
    assert!(search(&catalog(), &SearchQuery::new("trail").with_limit(0)).is_empty());
}

#[test]
fn precomputed_engine_matches_one_shot_search() {
    let engine = KeywordSearchEngine::new(catalog());
    for query in [
        SearchQuery::new("trail"),
        SearchQuery::new("running shoes"),
        SearchQuery::new("cloud").with_hints(["D400"]).with_limit(3),
    ] {
        assert_eq!(engine.search(&query), search(engine.index(), &query));
    }
}

#[test]
fn engine_is_shareable_across_threads() {
    let engine = std::sync::Arc::new(KeywordSearchEngine::new(catalog()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            std::thread::spawn(move || engine.search(&SearchQuery::new("running")).len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
}
