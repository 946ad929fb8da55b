//! catalog-core
//!
//! Shared domain types, the field-level merge rule, error taxonomy,
//! configuration, and the document loader for the catalog index.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
