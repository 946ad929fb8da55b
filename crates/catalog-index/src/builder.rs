use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

use catalog_core::error::Error;
use catalog_core::types::{CatalogIndex, Identifier, PartialEntry, INDEX_FORMAT_VERSION};

/// Build metadata stamped into the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMeta {
    pub built_at: DateTime<Utc>,
    pub source_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Counters reported at the end of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub files_seen: usize,
    pub documents_loaded: usize,
    pub files_skipped: usize,
    pub documents_without_identifier: usize,
    pub entries: usize,
    pub merges: usize,
    pub conflicts: usize,
    pub skipped: Vec<SkippedFile>,
}

impl BuildReport {
    pub(crate) fn record_skip(&mut self, err: &Error) {
        self.files_skipped += 1;
        let skipped = match err {
            Error::Malformed { path, reason } => SkippedFile { path: path.clone(), reason: reason.clone() },
            other => SkippedFile { path: PathBuf::new(), reason: other.to_string() },
        };
        self.skipped.push(skipped);
    }
}

/// Streaming merge of partial records keyed by identifier.
///
/// Memory is bounded by the number of distinct identifiers, not by the
/// number of documents fed in.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    entries: BTreeMap<Identifier, PartialEntry>,
    merges: usize,
    conflicts: usize,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one record. Returns `false` if it had no usable identifier.
    pub fn add(&mut self, mut entry: PartialEntry) -> bool {
        let Some(key) = entry.key().map(str::to_string) else {
            warn!(source = ?entry.source_path, "dropping record without identifier");
            return false;
        };
        entry.identifier = Some(key.clone());
        match self.entries.get_mut(&key) {
            Some(existing) => {
                self.merges += 1;
                for conflict in existing.absorb(entry) {
                    self.conflicts += 1;
                    info!(
                        identifier = %key,
                        field = conflict.field,
                        kept = %conflict.kept,
                        ignored = %conflict.ignored,
                        "conflicting values for identifier, keeping first"
                    );
                }
            }
            None => {
                self.entries.insert(key, entry);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn merges(&self) -> usize {
        self.merges
    }

    pub fn conflicts(&self) -> usize {
        self.conflicts
    }

    pub fn finish(self, meta: BuildMeta) -> CatalogIndex {
        let entries = self
            .entries
            .into_values()
            .filter_map(PartialEntry::into_entry)
            .map(|entry| (entry.identifier.clone(), entry))
            .collect();
        CatalogIndex {
            built_at: meta.built_at,
            source_count: meta.source_count,
            version: INDEX_FORMAT_VERSION,
            entries,
        }
    }
}

/// Merge a whole sequence in one call.
pub fn build<I>(entries: I, meta: BuildMeta) -> CatalogIndex
where
    I: IntoIterator<Item = PartialEntry>,
{
    let mut builder = IndexBuilder::new();
    for entry in entries {
        builder.add(entry);
    }
    builder.finish(meta)
}
