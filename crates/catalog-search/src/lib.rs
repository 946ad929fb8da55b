//! catalog-search
//!
//! Keyword ranking over a loaded [`CatalogIndex`](catalog_core::types::CatalogIndex).
//! Fields are weighted identifier > name > category > tags > description, and
//! caller hints are always returned first.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod analyzer;
pub mod engine;

pub use analyzer::Analyzer;
pub use engine::{search, KeywordSearchEngine};
