//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use meandra_catalog::prelude::*;
//! ```

pub use crate::catalog::DataCatalog;
pub use crate::config::{CatalogBackend, CatalogConfig, EntryConfig};
pub use crate::entry::CatalogEntry;
pub use crate::error::{CatalogError, CatalogResult};
pub use crate::format::DataFormat;
pub use crate::template::{PathTemplate, TemplateVars};
