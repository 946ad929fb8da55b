//! Phase 1: typed entities from linked-data blocks.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use catalog_core::types::{DocumentKind, PartialEntry, Price, RawDocument};

use crate::price::PriceParser;

const MAX_DEPTH: usize = 8;

#[derive(Debug, Default)]
pub(crate) struct LinkedData {
    /// Entities that carry their own identifier, in document order.
    pub products: Vec<PartialEntry>,
    /// Fields from offers, articles, breadcrumbs and identifier-less products.
    /// They belong to the document's primary entry.
    pub extras: PartialEntry,
}

pub(crate) fn collect(doc: &RawDocument, prices: &PriceParser) -> LinkedData {
    let mut out = LinkedData::default();
    for block in &doc.structured_data.json_ld {
        visit(block, prices, &mut out, 0);
    }
    if let Some(schema) = &doc.structured_data.schema_org {
        visit(schema, prices, &mut out, 0);
    }
    out
}

fn visit(node: &Value, prices: &PriceParser, out: &mut LinkedData, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    let obj = match node {
        Value::Array(items) => {
            for item in items {
                visit(item, prices, out, depth + 1);
            }
            return;
        }
        Value::Object(obj) => obj,
        _ => return,
    };
    if let Some(graph) = obj.get("@graph") {
        visit(graph, prices, out, depth + 1);
    }

    if has_type(obj, &["ProductGroup"]) {
        product_group(obj, prices, out);
    } else if has_type(obj, &["Product", "IndividualProduct", "ProductModel"]) {
        route(product_fields(obj, None, prices), out);
    } else if has_type(obj, &["ItemList", "OfferCatalog"]) {
        for element in many(obj.get("itemListElement")) {
            let item = element.get("item").filter(|v| v.is_object()).unwrap_or(element);
            visit(item, prices, out, depth + 1);
        }
    } else if has_type(obj, &["Offer", "AggregateOffer"]) {
        let (price, url) = offer_fields(node, prices);
        out.extras.absorb(PartialEntry { price, url, ..PartialEntry::default() });
    } else if has_type(obj, &["Article", "BlogPosting", "NewsArticle"]) {
        let article = PartialEntry {
            identifier: first_scalar(obj, &["sku", "identifier"]),
            name: first_scalar(obj, &["headline", "name"]),
            description: first_scalar(obj, &["description", "abstract"]),
            url: first_scalar(obj, &["url"]),
            asset_paths: images(obj.get("image")),
            ..PartialEntry::default()
        };
        route(article, out);
    } else if has_type(obj, &["BreadcrumbList"]) {
        for element in many(obj.get("itemListElement")) {
            let name = element
                .get("name")
                .or_else(|| element.get("item").and_then(|i| i.get("name")))
                .and_then(scalar);
            out.extras.tags.extend(name);
        }
    }
}

fn route(entry: PartialEntry, out: &mut LinkedData) {
    if entry.key().is_some() {
        out.products.push(entry);
    } else {
        out.extras.absorb(entry);
    }
}

/// One entry per SKU-bearing variant, or the group itself when none has a SKU.
fn product_group(group: &Map<String, Value>, prices: &PriceParser, out: &mut LinkedData) {
    let mut found = false;
    for variant in many(group.get("hasVariant")) {
        let Some(variant) = variant.as_object() else { continue };
        let entry = product_fields(variant, Some(group), prices);
        if entry.key().is_some() {
            out.products.push(entry);
            found = true;
        }
    }
    if !found {
        let mut entry = product_fields(group, None, prices);
        if entry.key().is_none() {
            entry.identifier = first_scalar(group, &["productGroupID"]);
        }
        route(entry, out);
    }
}

fn product_fields(node: &Map<String, Value>, group: Option<&Map<String, Value>>, prices: &PriceParser) -> PartialEntry {
    let inherited = |keys: &[&str]| {
        first_scalar(node, keys).or_else(|| group.and_then(|g| first_scalar(g, keys)))
    };
    let (price, offer_url) = node
        .get("offers")
        .map(|offers| offer_fields(offers, prices))
        .unwrap_or_default();

    let mut tags = BTreeSet::new();
    tags.extend(group.and_then(|g| first_scalar(g, &["name"])));
    for key in ["color", "size", "material"] {
        tags.extend(node.get(key).and_then(scalar));
    }
    tags.extend(brand(node).or_else(|| group.and_then(brand)));

    let mut asset_paths = images(node.get("image"));
    if asset_paths.is_empty() {
        asset_paths = group.map(|g| images(g.get("image"))).unwrap_or_default();
    }

    PartialEntry {
        identifier: first_scalar(node, &["sku", "productID", "mpn", "identifier"]),
        name: inherited(&["name"]),
        kind: Some(DocumentKind::Product),
        category: category(node).or_else(|| group.and_then(category)),
        price,
        description: inherited(&["description"]),
        url: offer_url.or_else(|| inherited(&["url"])),
        tags,
        asset_paths,
        ..PartialEntry::default()
    }
}

/// Price and URL from an offer object or the first priced offer of a list.
fn offer_fields(offers: &Value, prices: &PriceParser) -> (Option<Price>, Option<String>) {
    let mut url = None;
    for offer in many(Some(offers)) {
        let Some(obj) = offer.as_object() else { continue };
        if url.is_none() {
            url = first_scalar(obj, &["url"]);
        }
        let currency = obj.get("priceCurrency").and_then(Value::as_str);
        let amount = ["price", "lowPrice"]
            .iter()
            .filter_map(|k| obj.get(*k))
            .find_map(|v| prices.parse(v, currency))
            .or_else(|| {
                obj.get("priceSpecification")
                    .and_then(|terms| {
                        let currency = terms.get("priceCurrency").and_then(Value::as_str).or(currency);
                        terms.get("price").and_then(|v| prices.parse(v, currency))
                    })
            });
        if let Some(price) = amount {
            return (Some(price), url.or_else(|| first_scalar(obj, &["url"])));
        }
    }
    (None, url)
}

fn has_type(obj: &Map<String, Value>, wanted: &[&str]) -> bool {
    let matches = |t: &str| {
        let short = t.rsplit(['/', '#', ':']).next().unwrap_or(t);
        wanted.iter().any(|w| w.eq_ignore_ascii_case(short))
    };
    match obj.get("@type") {
        Some(Value::String(t)) => matches(t),
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

fn many(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    let items: &[Value] = match value {
        Some(Value::Array(items)) => items,
        Some(v) if !v.is_null() => std::slice::from_ref(v),
        _ => &[],
    };
    items.iter()
}

/// String or number as trimmed text; a `PropertyValue` yields its `value`.
pub(crate) fn scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(obj) => return obj.get("value").or_else(|| obj.get("name")).and_then(scalar),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn first_scalar(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(scalar)
}

fn category(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("category")? {
        Value::Array(items) => items.iter().find_map(scalar),
        other => scalar(other),
    }
}

fn brand(obj: &Map<String, Value>) -> Option<String> {
    obj.get("brand").and_then(scalar)
}

/// Image references: a URL string, a list, or `ImageObject`s with `url`/`contentUrl`.
pub(crate) fn images(value: Option<&Value>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in many(value) {
        let path = match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(obj) => ["url", "contentUrl", "src", "path"]
                .iter()
                .filter_map(|k| obj.get(*k).and_then(Value::as_str))
                .map(|s| s.trim().to_string())
                .next(),
            _ => None,
        };
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            if !out.contains(&path) {
                out.push(path);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(json_ld: Value) -> RawDocument {
        serde_json::from_value(json!({ "structuredData": { "jsonLd": json_ld } })).expect("doc")
    }

    #[test]
    fn product_group_variants_become_entries() {
        let d = doc(json!([{ "@graph": [{
            "@type": "ProductGroup",
            "name": "Cloud 6",
            "description": "Everyday running shoe",
            "category": "Shoes",
            "brand": { "@type": "Brand", "name": "On" },
            "hasVariant": [
                { "@type": "Product", "sku": "3MD10251043", "name": "Cloud 6 Black", "color": "Black",
                  "image": "img/black.jpg",
                  "offers": { "@type": "Offer", "price": "150.00", "priceCurrency": "USD", "url": "https://on/black" } },
                { "@type": "Product", "sku": "3MD10251044", "color": "White" },
                { "@type": "Product", "name": "no sku" }
            ]
        }]}]));
        let ld = collect(&d, &PriceParser::new("USD"));
        assert_eq!(ld.products.len(), 2);
        let black = &ld.products[0];
        assert_eq!(black.identifier.as_deref(), Some("3MD10251043"));
        assert_eq!(black.name.as_deref(), Some("Cloud 6 Black"));
        assert_eq!(black.category.as_deref(), Some("Shoes"));
        assert_eq!(black.price.as_ref().map(|p| p.amount), Some(150.0));
        assert_eq!(black.url.as_deref(), Some("https://on/black"));
        assert!(black.tags.contains("Black") && black.tags.contains("On") && black.tags.contains("Cloud 6"));
        assert_eq!(black.asset_paths, vec!["img/black.jpg".to_string()]);
        let white = &ld.products[1];
        assert_eq!(white.name.as_deref(), Some("Cloud 6"));
        assert_eq!(white.description.as_deref(), Some("Everyday running shoe"));
    }

    #[test]
    fn item_list_of_groups_and_schema_uri_types() {
        let d = doc(json!({
            "@type": "ItemList",
            "itemListElement": [
                { "@type": "ListItem", "item": { "@type": "http://schema.org/ProductGroup",
                  "hasVariant": [{ "sku": "AAA11111" }] } },
                { "@type": ["Thing", "Product"], "sku": 12345678 }
            ]
        }));
        let ld = collect(&d, &PriceParser::new("USD"));
        let ids: Vec<_> = ld.products.iter().filter_map(|p| p.identifier.clone()).collect();
        assert_eq!(ids, vec!["AAA11111".to_string(), "12345678".to_string()]);
    }

    #[test]
    fn identifier_less_entities_feed_extras() {
        let d = doc(json!([
            { "@type": "Product", "name": "Cloudmonster", "description": "Max cushioning" },
            { "@type": "AggregateOffer", "lowPrice": 170, "priceCurrency": "EUR" },
            { "@type": "BreadcrumbList", "itemListElement": [{ "name": "Men" }, { "item": { "name": "Shoes" } }] }
        ]));
        let ld = collect(&d, &PriceParser::new("USD"));
        assert!(ld.products.is_empty());
        assert_eq!(ld.extras.name.as_deref(), Some("Cloudmonster"));
        assert_eq!(ld.extras.price.as_ref().map(|p| p.currency.as_str()), Some("EUR"));
        assert!(ld.extras.tags.contains("Men") && ld.extras.tags.contains("Shoes"));
    }

    #[test]
    fn group_without_variants_uses_group_id() {
        let d = doc(json!({ "@type": "ProductGroup", "productGroupID": "GRP12345", "name": "Cloud X" }));
        let ld = collect(&d, &PriceParser::new("USD"));
        assert_eq!(ld.products[0].identifier.as_deref(), Some("GRP12345"));
    }

    #[test]
    fn non_numeric_offer_price_is_left_empty() {
        let d = doc(json!({ "@type": "Product", "sku": "ZZZ99999",
            "offers": [{ "price": "call us" }, { "url": "https://x" }] }));
        let ld = collect(&d, &PriceParser::new("USD"));
        assert!(ld.products[0].price.is_none());
        assert_eq!(ld.products[0].identifier.as_deref(), Some("ZZZ99999"));
    }
}
