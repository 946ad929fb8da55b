use std::borrow::Cow;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use catalog_core::traits::SearchEngine;
use catalog_core::types::{CatalogEntry, CatalogIndex, Identifier, MatchOrigin, SearchHit, SearchQuery, SearchResult};

use crate::analyzer::Analyzer;

/// Per-entry token sets for the four text fields.
#[derive(Debug, Clone, Default)]
struct EntryTokens {
    name: HashSet<String>,
    category: HashSet<String>,
    tags: HashSet<String>,
    description: HashSet<String>,
}

impl EntryTokens {
    fn new(entry: &CatalogEntry, analyzer: &Analyzer) -> Self {
        Self {
            name: analyzer.token_set([entry.name.as_str()]),
            category: analyzer.token_set(entry.category.as_deref()),
            tags: analyzer.token_set(entry.tags.iter().map(String::as_str)),
            description: analyzer.token_set([entry.description.as_str()]),
        }
    }
}

struct ParsedQuery {
    tokens: Vec<String>,
    /// Lower-cased forms that count as an exact identifier match.
    id_forms: HashSet<String>,
    base: u64,
}

impl ParsedQuery {
    fn new(text: &str, analyzer: &Analyzer) -> Self {
        let tokens = analyzer.query_tokens(text);
        let trimmed = text.trim();
        let mut id_forms: HashSet<String> = tokens.iter().cloned().collect();
        if !trimmed.is_empty() {
            id_forms.insert(trimmed.to_lowercase());
        }
        id_forms.extend(
            trimmed
                .split_whitespace()
                .map(|w| w.trim_matches(|c: char| ",;:!?\"'()".contains(c)).to_lowercase())
                .filter(|w| !w.is_empty()),
        );
        Self { base: tokens.len() as u64 + 1, tokens, id_forms }
    }

    fn is_empty(&self) -> bool {
        self.id_forms.is_empty()
    }

    /// Radix score: one identifier match outweighs all field matches, one
    /// name match outweighs any number of category, tag or description
    /// matches, and so on down.
    fn score(&self, entry: &CatalogEntry, fields: &EntryTokens) -> (u64, bool) {
        let id_match = self.id_forms.contains(&entry.identifier.to_lowercase());
        let count = |set: &HashSet<String>| self.tokens.iter().filter(|t| set.contains(*t)).count() as u64;
        let b = self.base;
        let score = u64::from(id_match) * b.pow(4)
            + count(&fields.name) * b.pow(3)
            + count(&fields.category) * b.pow(2)
            + count(&fields.tags) * b
            + count(&fields.description);
        (score, id_match)
    }
}

fn rank<'a, F>(index: &CatalogIndex, query: &SearchQuery, analyzer: &Analyzer, tokens_for: F) -> SearchResult
where
    F: Fn(&CatalogEntry) -> Cow<'a, EntryTokens>,
{
    let parsed = ParsedQuery::new(&query.text, analyzer);
    let mut hinted: Vec<(SearchHit, usize)> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (pos, hint) in query.hints.iter().map(|h| h.trim()).enumerate() {
        if hint.is_empty() || !seen.insert(hint) {
            continue;
        }
        let Some(entry) = index.get(hint) else {
            debug!(identifier = %hint, "hinted identifier not in index");
            continue;
        };
        let (score, _) = if parsed.is_empty() { (0, false) } else { parsed.score(entry, &tokens_for(entry)) };
        hinted.push((hit(entry, score, MatchOrigin::Hint), pos));
    }
    hinted.sort_by_key(|(h, pos)| (Reverse(h.score), *pos));

    let mut matched: Vec<SearchHit> = Vec::new();
    if !parsed.is_empty() {
        for entry in index.iter() {
            if seen.contains(entry.identifier.as_str()) {
                continue;
            }
            let (score, id_match) = parsed.score(entry, &tokens_for(entry));
            if score == 0 {
                continue;
            }
            let origin = if id_match { MatchOrigin::Identifier } else { MatchOrigin::Keyword };
            matched.push(hit(entry, score, origin));
        }
    }
    matched.sort_by(|a, b| {
        (a.origin, Reverse(a.score), &a.identifier).cmp(&(b.origin, Reverse(b.score), &b.identifier))
    });

    let mut results: SearchResult = hinted.into_iter().map(|(h, _)| h).chain(matched).collect();
    if let Some(limit) = query.limit {
        results.truncate(limit);
    }
    debug!(query = %query.text, tokens = parsed.tokens.len(), hits = results.len(), "search done");
    results
}

fn hit(entry: &CatalogEntry, score: u64, origin: MatchOrigin) -> SearchHit {
    SearchHit { identifier: entry.identifier.clone(), score, origin, entry: entry.clone() }
}

/// One-shot search that tokenizes entries on the fly.
pub fn search(index: &CatalogIndex, query: &SearchQuery) -> SearchResult {
    let analyzer = Analyzer::new();
    rank(index, query, &analyzer, |entry| Cow::Owned(EntryTokens::new(entry, &analyzer)))
}

/// Search over an index loaded once, with entry tokens computed up front.
pub struct KeywordSearchEngine {
    index: CatalogIndex,
    analyzer: Analyzer,
    tokens: HashMap<Identifier, EntryTokens>,
}

impl KeywordSearchEngine {
    pub fn new(index: CatalogIndex) -> Self {
        let analyzer = Analyzer::new();
        let tokens = index
            .iter()
            .map(|entry| (entry.identifier.clone(), EntryTokens::new(entry, &analyzer)))
            .collect();
        Self { index, analyzer, tokens }
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }
}

impl SearchEngine for KeywordSearchEngine {
    fn search(&self, query: &SearchQuery) -> SearchResult {
        rank(&self.index, query, &self.analyzer, |entry| match self.tokens.get(&entry.identifier) {
            Some(tokens) => Cow::Borrowed(tokens),
            None => Cow::Owned(EntryTokens::new(entry, &self.analyzer)),
        })
    }
}
