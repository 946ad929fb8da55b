//! catalog-index
//!
//! Merges extracted records into a [`CatalogIndex`](catalog_core::types::CatalogIndex)
//! and persists it as a single JSON file.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod builder;
pub mod pipeline;
pub mod store;

pub use builder::{build, BuildMeta, BuildReport, IndexBuilder, SkippedFile};
pub use pipeline::{spinner, Pipeline};
pub use store::IndexStore;

use indicatif::ProgressBar;

use catalog_core::config::Config;
use catalog_core::error::Result;
use catalog_core::types::CatalogIndex;

/// Rebuild the index described by `config` and write it.
pub fn rebuild(config: &Config, progress: Option<ProgressBar>) -> Result<BuildReport> {
    let pipeline = Pipeline::from_config(config);
    match progress {
        Some(pb) => pipeline.with_progress(pb).run(),
        None => pipeline.run(),
    }
}

/// Load the index described by `config`.
pub fn open(config: &Config) -> Result<CatalogIndex> {
    IndexStore::new(config.index_path()).load()
}
