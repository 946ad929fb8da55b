//! Domain types shared by the loader, extractor, builder and search engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub type Identifier = String;

/// Declared or inferred kind of a scraped document.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Product,
    #[default]
    Page,
    Collection,
    Story,
}

impl DocumentKind {
    /// Parse a declared `type` value. Plural forms are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" | "products" => Some(Self::Product),
            "page" | "pages" => Some(Self::Page),
            "collection" | "collections" => Some(Self::Collection),
            "story" | "stories" => Some(Self::Story),
            _ => None,
        }
    }

    /// Classify by the scraper's filename prefix convention; plain files are pages.
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("products-") || lower.starts_with("product-") {
            Self::Product
        } else if lower.starts_with("collection-") || lower.starts_with("collections-") {
            Self::Collection
        } else if lower.starts_with("stories-") || lower.starts_with("story-") {
            Self::Story
        } else {
            Self::Page
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Page => "page",
            Self::Collection => "collection",
            Self::Story => "story",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scraped file as read from disk.
///
/// Every field is optional: a value of the wrong JSON type is treated as
/// absent instead of failing the whole document. `kind` and `source_path`
/// are not part of the file; the loader fills them in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    #[serde(default, deserialize_with = "lenient::string")]
    pub url: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub declared_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub extracted_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub metadata: Metadata,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub structured_data: StructuredData,
    #[serde(default)]
    pub content: Value,
    #[serde(skip)]
    pub kind: DocumentKind,
    #[serde(skip)]
    pub source_path: String,
}

impl RawDocument {
    /// Field of the free-form `content` block, if `content` is an object.
    pub fn content_field(&self, key: &str) -> Option<&Value> {
        self.content.as_object().and_then(|o| o.get(key)).filter(|v| !v.is_null())
    }

    /// Non-empty string field of the `content` block.
    pub fn content_str(&self, key: &str) -> Option<&str> {
        self.content_field(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Social-preview value such as `og:title`.
    pub fn open_graph(&self, key: &str) -> Option<&str> {
        self.metadata
            .open_graph
            .get(key)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: Option<String>,
    #[serde(default, alias = "canonicalUrl", deserialize_with = "lenient::string")]
    pub canonical: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_map")]
    pub open_graph: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredData {
    /// Linked-data blocks; a lone object is accepted as a one-element list.
    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub json_ld: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub schema_org: Option<Value>,
}

/// Normalized price: upper-case ISO-4217 currency plus a non-negative amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub currency: String,
    pub amount: f64,
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.amount)
    }
}

/// Two documents disagreed on a populated field; the first value was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConflict {
    pub field: &'static str,
    pub kept: String,
    pub ignored: String,
}

/// Extraction output before it is merged into the index.
///
/// Every field may be empty. Records are combined with [`PartialEntry::absorb`],
/// which only ever fills gaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialEntry {
    pub identifier: Option<Identifier>,
    pub name: Option<String>,
    pub kind: Option<DocumentKind>,
    pub category: Option<String>,
    pub price: Option<Price>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub tags: BTreeSet<String>,
    pub source_path: Option<String>,
    pub asset_paths: Vec<String>,
}

trait FieldValue {
    fn is_blank(&self) -> bool;
    fn describe(&self) -> String;
}

impl FieldValue for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
    fn describe(&self) -> String {
        self.clone()
    }
}

impl FieldValue for Price {
    fn is_blank(&self) -> bool {
        false
    }
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl FieldValue for BTreeSet<String> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
    fn describe(&self) -> String {
        self.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

impl FieldValue for Vec<String> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
    fn describe(&self) -> String {
        self.join(", ")
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn is_blank(&self) -> bool {
        !matches!(self, Some(v) if !v.is_blank())
    }
    fn describe(&self) -> String {
        self.as_ref().map(FieldValue::describe).unwrap_or_default()
    }
}

fn fill_field<T: FieldValue + PartialEq>(
    field: &'static str,
    slot: &mut T,
    incoming: T,
    conflicts: &mut Vec<FieldConflict>,
) {
    if incoming.is_blank() {
        return;
    }
    if slot.is_blank() {
        *slot = incoming;
    } else if *slot != incoming {
        conflicts.push(FieldConflict { field, kept: slot.describe(), ignored: incoming.describe() });
    }
}

impl PartialEntry {
    /// Fill this record's empty fields from `later`.
    ///
    /// Populated fields are never overwritten (first writer wins). Returns the
    /// fields where both sides were populated with different values. `kind`
    /// and `source_path` follow the same fill rule but are not reported.
    pub fn absorb(&mut self, later: PartialEntry) -> Vec<FieldConflict> {
        let mut conflicts = Vec::new();
        if self.identifier.is_blank() {
            self.identifier = later.identifier;
        }
        if self.kind.is_none() {
            self.kind = later.kind;
        }
        if self.source_path.is_blank() {
            self.source_path = later.source_path;
        }
        fill_field("name", &mut self.name, later.name, &mut conflicts);
        fill_field("category", &mut self.category, later.category, &mut conflicts);
        fill_field("price", &mut self.price, later.price, &mut conflicts);
        fill_field("description", &mut self.description, later.description, &mut conflicts);
        fill_field("url", &mut self.url, later.url, &mut conflicts);
        fill_field("tags", &mut self.tags, later.tags, &mut conflicts);
        fill_field("assetPaths", &mut self.asset_paths, later.asset_paths, &mut conflicts);
        conflicts
    }

    /// Trimmed identifier, if one is present and non-blank.
    pub fn key(&self) -> Option<&str> {
        self.identifier.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Finalize into an index entry. Records without an identifier yield `None`.
    pub fn into_entry(self) -> Option<CatalogEntry> {
        let identifier = self.key()?.to_string();
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| identifier.clone());
        Some(CatalogEntry {
            identifier,
            name,
            kind: self.kind.unwrap_or_default(),
            category: self.category.filter(|c| !c.trim().is_empty()),
            price: self.price,
            description: self.description.unwrap_or_default(),
            tags: self.tags,
            source_path: self.source_path.unwrap_or_default(),
            asset_paths: self.asset_paths,
            url: self.url.filter(|u| !u.trim().is_empty()),
        })
    }
}

/// A normalized record stored in the index.
///
/// `identifier` is the map key in the persisted file and is restored on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(skip)]
    pub identifier: Identifier,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub category: Option<String>,
    pub price: Option<Price>,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub source_path: String,
    pub asset_paths: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

pub const INDEX_FORMAT_VERSION: u32 = 1;

/// The aggregate lookup index. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredIndex")]
pub struct CatalogIndex {
    pub built_at: DateTime<Utc>,
    pub source_count: usize,
    pub version: u32,
    pub entries: BTreeMap<Identifier, CatalogEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredIndex {
    built_at: DateTime<Utc>,
    source_count: usize,
    version: u32,
    entries: BTreeMap<Identifier, CatalogEntry>,
}

impl From<StoredIndex> for CatalogIndex {
    fn from(stored: StoredIndex) -> Self {
        let entries = stored
            .entries
            .into_iter()
            .map(|(id, mut entry)| {
                entry.identifier.clone_from(&id);
                (id, entry)
            })
            .collect();
        Self {
            built_at: stored.built_at,
            source_count: stored.source_count,
            version: stored.version,
            entries,
        }
    }
}

impl CatalogIndex {
    pub fn get(&self, identifier: &str) -> Option<&CatalogEntry> {
        self.entries.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }
}

/// Free text plus identifiers the caller wants included regardless of text match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    #[serde(default)]
    pub hints: Vec<Identifier>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints = hints.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Why an entry is in a result. Variant order is rank order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MatchOrigin {
    Hint,
    Identifier,
    Keyword,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub identifier: Identifier,
    pub score: u64,
    pub origin: MatchOrigin,
    pub entry: CatalogEntry,
}

pub type SearchResult = Vec<SearchHit>;

mod lenient {
    //! Deserializers that turn wrongly-typed values into "absent".

    use chrono::{DateTime, Utc};
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::collections::BTreeMap;

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned))
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(v.as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|t| t.with_timezone(&Utc)))
    }

    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let v = Value::deserialize(d)?;
        Ok(serde_json::from_value(v).unwrap_or_default())
    }

    pub fn string_map<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, String>, D::Error> {
        let v = Value::deserialize(d)?;
        let Value::Object(map) = v else { return Ok(BTreeMap::new()) };
        Ok(map
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect())
    }

    pub fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.into_iter().filter(Value::is_object).collect(),
            v @ Value::Object(_) => vec![v],
            _ => Vec::new(),
        })
    }

    pub fn object<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(v.is_object().then_some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(id: &str) -> PartialEntry {
        PartialEntry { identifier: Some(id.to_string()), ..PartialEntry::default() }
    }

    #[test]
    fn absorb_fills_gaps_from_both_sides() {
        let mut first = partial("SKU123");
        first.category = Some("Pants".into());
        first.description = Some(String::new());
        let mut second = partial("SKU123");
        second.description = Some("Lightweight trail pants".into());

        let conflicts = first.absorb(second);
        assert!(conflicts.is_empty());
        assert_eq!(first.category.as_deref(), Some("Pants"));
        assert_eq!(first.description.as_deref(), Some("Lightweight trail pants"));
    }

    #[test]
    fn absorb_keeps_first_writer_and_reports_conflict() {
        let mut first = partial("A1");
        first.name = Some("Cloud 6".into());
        first.tags.insert("running".into());
        let mut second = partial("A1");
        second.name = Some("Cloud 6 Waterproof".into());
        second.tags.insert("hiking".into());
        second.price = Some(Price { currency: "USD".into(), amount: 150.0 });

        let conflicts = first.absorb(second);
        assert_eq!(first.name.as_deref(), Some("Cloud 6"));
        assert_eq!(first.tags.len(), 1);
        assert_eq!(first.price.as_ref().map(|p| p.amount), Some(150.0));
        let fields: Vec<_> = conflicts.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec!["name", "tags"]);
        assert_eq!(conflicts[0].ignored, "Cloud 6 Waterproof");
    }

    #[test]
    fn equal_values_are_not_conflicts() {
        let mut first = partial("A1");
        first.name = Some("Same".into());
        let mut second = partial("A1");
        second.name = Some("Same".into());
        assert!(first.absorb(second).is_empty());
    }

    #[test]
    fn into_entry_requires_identifier_and_defaults_name() {
        assert!(PartialEntry::default().into_entry().is_none());
        assert!(partial("   ").into_entry().is_none());
        let entry = partial(" X9 ").into_entry().expect("entry");
        assert_eq!(entry.identifier, "X9");
        assert_eq!(entry.name, "X9");
        assert_eq!(entry.kind, DocumentKind::Page);
    }

    #[test]
    fn kind_classification() {
        assert_eq!(DocumentKind::from_file_name("products-cloud-6-3MD10.json"), DocumentKind::Product);
        assert_eq!(DocumentKind::from_file_name("collection-mens.json"), DocumentKind::Collection);
        assert_eq!(DocumentKind::from_file_name("stories-trail.json"), DocumentKind::Story);
        assert_eq!(DocumentKind::from_file_name("about-us.json"), DocumentKind::Page);
        assert_eq!(DocumentKind::parse("Stories"), Some(DocumentKind::Story));
        assert_eq!(DocumentKind::parse("widget"), None);
    }

    #[test]
    fn raw_document_tolerates_wrong_types() {
        let doc: RawDocument = serde_json::from_value(serde_json::json!({
            "url": 42,
            "type": "product",
            "extractedAt": "not a date",
            "metadata": "oops",
            "structuredData": { "jsonLd": { "@type": "Product" }, "schemaOrg": [1, 2] },
            "content": { "name": "  Cloud  " }
        }))
        .expect("lenient parse");
        assert!(doc.url.is_none());
        assert!(doc.extracted_at.is_none());
        assert!(doc.metadata.title.is_none());
        assert_eq!(doc.structured_data.json_ld.len(), 1);
        assert!(doc.structured_data.schema_org.is_none());
        assert_eq!(doc.content_str("name"), Some("Cloud"));
    }

    #[test]
    fn index_restores_identifiers_on_load() {
        let json = serde_json::json!({
            "builtAt": "2024-05-01T00:00:00Z",
            "sourceCount": 1,
            "version": 1,
            "entries": { "A1": {
                "name": "Cloud", "type": "product", "category": null, "price": null,
                "description": "", "tags": [], "sourcePath": "p.json", "assetPaths": []
            } }
        });
        let index: CatalogIndex = serde_json::from_value(json).expect("index");
        assert_eq!(index.get("A1").map(|e| e.identifier.as_str()), Some("A1"));
    }
}
