//! Catalog configuration types.

use std::collections::BTreeMap;

use meandra_core::DataKey;
use serde::{Deserialize, Serialize};

use crate::format::DataFormat;
use crate::template::PathTemplate;

/// Storage backend selection for the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogBackend {
    /// Local filesystem rooted at a directory.
    Fs {
        /// Root directory for all entries.
        root: String,
    },
    /// In-memory storage, scoped to the process lifetime.
    Memory,
}

/// Per-key entry configuration.
///
/// Keys listed in the catalog configuration form the persistent set: their
/// values are written through to storage when produced. Keys without an
/// entry exist only as in-memory bindings for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConfig {
    /// Path template for the entry's location.
    pub path: PathTemplate,
    /// Storage format.
    #[serde(default)]
    pub format: DataFormat,
}

impl EntryConfig {
    /// Creates an entry configuration with the default format.
    pub fn new(path: impl Into<PathTemplate>) -> Self {
        Self {
            path: path.into(),
            format: DataFormat::default(),
        }
    }

    /// Sets the storage format.
    pub fn with_format(mut self, format: DataFormat) -> Self {
        self.format = format;
        self
    }
}

/// Catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Storage backend for persisted entries.
    pub backend: CatalogBackend,
    /// Configured entries, keyed by data key; this is the persistent set.
    #[serde(default)]
    pub entries: BTreeMap<DataKey, EntryConfig>,
    /// Fallback template for keys written without explicit configuration.
    #[serde(default = "CatalogConfig::default_template")]
    pub default_template: PathTemplate,
}

impl CatalogConfig {
    fn default_template() -> PathTemplate {
        PathTemplate::new("{run_id}/{key}.json")
    }

    /// Creates a filesystem-backed configuration.
    pub fn fs(root: impl Into<String>) -> Self {
        Self {
            backend: CatalogBackend::Fs { root: root.into() },
            entries: BTreeMap::new(),
            default_template: Self::default_template(),
        }
    }

    /// Creates an in-memory configuration.
    pub fn memory() -> Self {
        Self {
            backend: CatalogBackend::Memory,
            entries: BTreeMap::new(),
            default_template: Self::default_template(),
        }
    }

    /// Adds a configured entry in builder style.
    pub fn with_entry(mut self, key: impl Into<DataKey>, entry: EntryConfig) -> Self {
        self.entries.insert(key.into(), entry);
        self
    }

    /// Sets the fallback template.
    pub fn with_default_template(mut self, template: impl Into<PathTemplate>) -> Self {
        self.default_template = template.into();
        self
    }
}
