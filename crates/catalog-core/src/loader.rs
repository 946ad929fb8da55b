//! Lazy walk over a tree of scraped JSON documents.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{DocumentKind, RawDocument};

pub struct DocumentLoader {
    root: PathBuf,
}

impl DocumentLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start walking the tree in sorted file-name order.
    ///
    /// Fails up front if the root is missing or unreadable. After that each
    /// item is either a parsed document or a recoverable `Malformed` error.
    pub fn documents(&self) -> Result<Documents> {
        let missing = || Error::InputDirMissing { path: self.root.clone() };
        let meta = fs::metadata(&self.root).map_err(|_| missing())?;
        if !meta.is_dir() {
            return Err(missing());
        }
        fs::read_dir(&self.root).map_err(|_| missing())?;
        Ok(Documents {
            root: self.root.clone(),
            walker: WalkDir::new(&self.root).sort_by_file_name().into_iter(),
        })
    }
}

pub struct Documents {
    root: PathBuf,
    walker: walkdir::IntoIter,
}

impl Iterator for Documents {
    type Item = Result<RawDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map_or_else(|| self.root.clone(), Path::to_path_buf);
                    return Some(Err(Error::malformed(path, err.to_string())));
                }
            };
            if entry.file_type().is_file() && is_json(entry.path()) {
                return Some(load_document(&self.root, entry.path()));
            }
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Read and classify a single file. `root` is only used to compute `source_path`.
pub fn load_document(root: &Path, path: &Path) -> Result<RawDocument> {
    let bytes = fs::read(path).map_err(|e| Error::malformed(path, e.to_string()))?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|e| Error::malformed(path, e.to_string()))?;
    if !value.is_object() {
        return Err(Error::malformed(path, "top-level JSON value is not an object"));
    }
    let mut doc: RawDocument =
        serde_json::from_value(value).map_err(|e| Error::malformed(path, e.to_string()))?;

    let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let by_name = DocumentKind::from_file_name(&file_name);
    doc.kind = match doc.declared_type.as_deref() {
        Some(declared) => match DocumentKind::parse(declared) {
            Some(kind) => {
                if kind != by_name {
                    debug!(path = %path.display(), %declared, prefix = %by_name, "declared type overrides filename prefix");
                }
                kind
            }
            None => {
                warn!(path = %path.display(), %declared, "unrecognised document type, using filename prefix");
                by_name
            }
        },
        None => by_name,
    };
    doc.source_path = relative_path(root, path);
    Ok(doc)
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
