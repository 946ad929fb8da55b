//! Phase 2: fill what linked data left empty from the free-form `content`
//! block, the page metadata and the document URL.

use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

use catalog_core::types::{DocumentKind, PartialEntry, Price, RawDocument};

use crate::jsonld::{images, scalar};
use crate::price::PriceParser;
use crate::text::{bare_sku, sku_suffix};

const URL_CATEGORIES: [&str; 3] = ["shoes", "apparel", "accessories"];

pub(crate) fn fallback(doc: &RawDocument, prices: &PriceParser) -> PartialEntry {
    let crumbs = labels(["breadcrumbs", "breadcrumb"].iter().filter_map(|k| doc.content_field(k)));
    let name = ["name", "title"]
        .iter()
        .find_map(|k| doc.content_str(k))
        .or_else(|| doc.open_graph("og:title"))
        .or(doc.metadata.title.as_deref())
        .map(str::to_string);

    let mut tags: BTreeSet<String> = crumbs
        .iter()
        .filter(|c| !c.eq_ignore_ascii_case("home"))
        .cloned()
        .collect();
    tags.extend(labels(
        ["relatedLinks", "related", "tags"].iter().filter_map(|k| doc.content_field(k)),
    ));

    let mut asset_paths = ["images", "gallery", "imageGallery"]
        .iter()
        .map(|k| images(doc.content_field(k)))
        .find(|found| !found.is_empty())
        .unwrap_or_default();
    if asset_paths.is_empty() {
        asset_paths.extend(doc.open_graph("og:image").map(str::to_string));
    }

    PartialEntry {
        identifier: identifier(doc, name.as_deref()),
        name,
        category: doc
            .content_str("category")
            .map(str::to_string)
            .or_else(|| {
                crumbs
                    .len()
                    .checked_sub(2)
                    .map(|i| crumbs[i].clone())
                    .filter(|c| !c.eq_ignore_ascii_case("home"))
            })
            .or_else(|| url_category(doc)),
        price: price(doc, prices),
        description: ["description", "body", "bodyText", "text"]
            .iter()
            .find_map(|k| doc.content_str(k))
            .or_else(|| doc.open_graph("og:description"))
            .or(doc.metadata.description.as_deref())
            .map(str::to_string),
        url: doc.metadata.canonical.clone().or_else(|| doc.url.clone()),
        tags,
        asset_paths,
        ..PartialEntry::default()
    }
}

/// Content SKU, then the URL slug suffix, then the file stem suffix.
/// Slug and stem suffixes are only trusted on product documents. Category
/// landing pages ("Shop all") never resolve to a product.
fn identifier(doc: &RawDocument, name: Option<&str>) -> Option<String> {
    if name.is_some_and(|n| n.eq_ignore_ascii_case("shop all")) {
        return None;
    }
    let explicit = doc.content_str("sku").and_then(bare_sku);
    if explicit.is_some() || doc.kind != DocumentKind::Product {
        return explicit;
    }
    doc.url
        .as_deref()
        .and_then(sku_suffix)
        .or_else(|| {
            Path::new(&doc.source_path)
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(sku_suffix)
        })
}

fn price(doc: &RawDocument, prices: &PriceParser) -> Option<Price> {
    let currency = doc.content_str("priceCurrency").or_else(|| doc.content_str("currency"));
    doc.content_field("price")
        .and_then(|v| prices.parse(v, currency))
        .or_else(|| {
            ["sku", "priceText"]
                .iter()
                .filter_map(|k| doc.content_str(k))
                .find_map(|text| prices.find_in_text(text))
        })
}

fn url_category(doc: &RawDocument) -> Option<String> {
    let url = doc.url.as_deref()?.to_ascii_lowercase();
    URL_CATEGORIES
        .iter()
        .find(|c| url.contains(*c))
        .map(|c| (*c).to_string())
}

/// Text labels from arrays of strings or link-like objects.
fn labels<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<String> {
    let mut out = Vec::new();
    for value in values {
        let items = match value {
            Value::Array(items) => items.as_slice(),
            other => std::slice::from_ref(other),
        };
        for item in items {
            let label = match item {
                Value::Object(obj) => ["name", "text", "title", "label"]
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(scalar)),
                other => scalar(other),
            };
            if let Some(label) = label {
                if !out.contains(&label) {
                    out.push(label);
                }
            }
        }
    }
    out
}
