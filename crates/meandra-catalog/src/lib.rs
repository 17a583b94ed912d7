#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod catalog;
mod config;
mod entry;
mod error;
mod format;
mod template;

#[doc(hidden)]
pub mod prelude;

pub use catalog::DataCatalog;
pub use config::{CatalogBackend, CatalogConfig, EntryConfig};
pub use entry::CatalogEntry;
pub use error::{CatalogError, CatalogResult};
pub use format::DataFormat;
pub use template::{PathTemplate, TemplateVars};

/// Tracing target for catalog operations.
pub const TRACING_TARGET: &str = "meandra_catalog";
