//! catalog-extract
//!
//! Turns a [`RawDocument`] into catalog records in two ordered phases:
//! linked-data entities first, then the free-form content block for any
//! field still empty. Both phases meet through [`PartialEntry::absorb`], so
//! phase 2 can only fill gaps and never replaces phase-1 values. Phase 2 only
//! applies to the entity the page itself describes.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

mod content;
mod jsonld;
pub mod price;
pub mod text;

use tracing::debug;

use catalog_core::config::ExtractConfig;
use catalog_core::traits::Extractor;
use catalog_core::types::{DocumentKind, PartialEntry, RawDocument};

pub use price::PriceParser;

pub struct FieldExtractor {
    prices: PriceParser,
    max_description_chars: usize,
}

impl FieldExtractor {
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            prices: PriceParser::new(&config.fallback_currency),
            max_description_chars: config.max_description_chars,
        }
    }

    fn finalize(&self, doc: &RawDocument, mut entry: PartialEntry) -> PartialEntry {
        entry.kind.get_or_insert(doc.kind);
        if entry.source_path.is_none() {
            entry.source_path = Some(doc.source_path.clone());
        }
        entry.identifier = entry.key().map(str::to_string);
        entry.name = entry.name.map(|n| text::plain_text(&n)).filter(|n| !n.is_empty());
        entry.description = entry
            .description
            .map(|d| text::truncate_chars(&text::plain_text(&d), self.max_description_chars))
            .filter(|d| !d.is_empty());
        entry.tags = entry
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        entry
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(&ExtractConfig::default())
    }
}

impl Extractor for FieldExtractor {
    fn extract_all(&self, doc: &RawDocument) -> Vec<PartialEntry> {
        let linked = jsonld::collect(doc, &self.prices);

        // Page-level data only describes the page's own product. Listings of
        // several products, or a collection naming one, keep phase-1 fields.
        let describes_primary = match linked.products.len() {
            0 => true,
            1 => doc.kind == DocumentKind::Product,
            _ => false,
        };
        let mut entries = linked.products;
        if describes_primary {
            let mut primary = entries.pop().unwrap_or_default();
            primary.absorb(linked.extras);
            primary.absorb(content::fallback(doc, &self.prices));
            entries.push(primary);
        }

        let out: Vec<PartialEntry> = entries
            .into_iter()
            .map(|entry| self.finalize(doc, entry))
            .filter(|entry| entry.key().is_some())
            .collect();
        if out.is_empty() {
            debug!(path = %doc.source_path, kind = %doc.kind, "no product identifier, document excluded");
        }
        out
    }
}
