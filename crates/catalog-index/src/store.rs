use serde_json::Value;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use catalog_core::error::{Error, Result};
use catalog_core::types::{CatalogIndex, INDEX_FORMAT_VERSION};

/// Reads and atomically writes the persisted index file.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pretty JSON with a trailing newline. Entries serialize in identifier
    /// order, so equal indexes give equal bytes.
    pub fn to_bytes(&self, index: &CatalogIndex) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(index)
            .map_err(|e| Error::Operation(format!("serialize index: {e}")))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Write to a temp file next to the destination, then rename over it.
    /// A failed write leaves any previous index untouched.
    pub fn write(&self, index: &CatalogIndex) -> Result<()> {
        let bytes = self.to_bytes(index)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let unwritable = |source| Error::OutputUnwritable { path: self.path.clone(), source };

        fs::create_dir_all(&dir).map_err(unwritable)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(unwritable)?;
        tmp.write_all(&bytes).map_err(unwritable)?;
        tmp.as_file().sync_all().map_err(unwritable)?;
        tmp.persist(&self.path).map_err(|e| unwritable(e.error))?;

        info!(path = %self.path.display(), entries = index.len(), bytes = bytes.len(), "index written");
        Ok(())
    }

    pub fn load(&self) -> Result<CatalogIndex> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::IndexMissing { path: self.path.clone() })
            }
            Err(e) => return Err(Error::io(&self.path, e)),
        };
        let corrupt = |reason: String| Error::IndexCorrupt { path: self.path.clone(), reason };

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        let found = value
            .get("version")
            .and_then(Value::as_u64)
            .ok_or_else(|| corrupt("missing format version".to_string()))?;
        if found != u64::from(INDEX_FORMAT_VERSION) {
            return Err(Error::IndexVersion {
                path: self.path.clone(),
                found: u32::try_from(found).unwrap_or(u32::MAX),
                expected: INDEX_FORMAT_VERSION,
            });
        }

        let index: CatalogIndex = serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))?;
        if index.entries.keys().any(|k| k.trim().is_empty()) {
            return Err(corrupt("entry with empty identifier".to_string()));
        }
        debug!(path = %self.path.display(), entries = index.len(), "index loaded");
        Ok(index)
    }
}
