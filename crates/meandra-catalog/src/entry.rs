//! Resolved catalog entries.

use meandra_core::DataKey;
use serde::{Deserialize, Serialize};

use crate::format::DataFormat;

/// A logical key resolved to a concrete storage location and format.
///
/// Entries are created lazily when a key is first requested or produced;
/// the core never destroys them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// The logical key.
    pub key: DataKey,
    /// Resolved location relative to the backend root.
    pub location: String,
    /// Storage format.
    pub format: DataFormat,
}

impl CatalogEntry {
    /// Creates a new entry.
    pub fn new(key: DataKey, location: impl Into<String>, format: DataFormat) -> Self {
        Self {
            key,
            location: location.into(),
            format,
        }
    }
}
