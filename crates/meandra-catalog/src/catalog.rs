//! Data catalog over an OpenDAL operator.

use std::collections::HashMap;
use std::sync::RwLock;

use meandra_core::{DataKey, DataValue};
use opendal::{Operator, services};

use crate::TRACING_TARGET;
use crate::config::{CatalogBackend, CatalogConfig};
use crate::entry::CatalogEntry;
use crate::error::{CatalogError, CatalogResult};
use crate::template::TemplateVars;

/// Maps logical data keys to storage locations and performs load/save.
///
/// The catalog holds locations, never values: every `get` deserializes from
/// the persisted location, so a key produced by a previous process is read
/// back from storage rather than trusted to local state.
pub struct DataCatalog {
    operator: Operator,
    config: CatalogConfig,
    /// Entries resolved or registered so far. Lazily created on first
    /// request or production of a key.
    registered: RwLock<HashMap<DataKey, CatalogEntry>>,
}

impl DataCatalog {
    /// Creates a catalog from configuration.
    pub fn new(config: CatalogConfig) -> CatalogResult<Self> {
        let operator = build_operator(&config.backend)?;

        tracing::info!(
            target: TRACING_TARGET,
            backend = ?config.backend,
            configured_entries = config.entries.len(),
            "Data catalog initialized"
        );

        Ok(Self {
            operator,
            config,
            registered: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the catalog configuration.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Returns whether a key belongs to the persistent set.
    ///
    /// Only persistent keys are written through to storage when produced;
    /// the rest live in the orchestrator's in-memory bindings.
    pub fn is_persistent(&self, key: &DataKey) -> bool {
        self.config.entries.contains_key(key)
    }

    /// Returns whether the catalog can resolve a key at all, either through
    /// configuration or through a location registered at run time.
    pub fn is_registered(&self, key: &DataKey) -> bool {
        self.is_persistent(key)
            || self
                .registered
                .read()
                .expect("catalog entry lock poisoned")
                .contains_key(key)
    }

    /// Resolves the storage entry for a key.
    ///
    /// Run-time registrations win over configuration; keys with neither a
    /// registration nor a configured entry fall back to the default
    /// template.
    pub fn resolve(&self, key: &DataKey, vars: &TemplateVars) -> CatalogResult<CatalogEntry> {
        if let Some(entry) = self
            .registered
            .read()
            .expect("catalog entry lock poisoned")
            .get(key)
        {
            return Ok(entry.clone());
        }

        let vars = vars.clone().with("key", key.as_str());
        let (template, format) = match self.config.entries.get(key) {
            Some(entry) => (&entry.path, entry.format),
            None => (&self.config.default_template, Default::default()),
        };
        let location = template.resolve(&vars)?;
        Ok(CatalogEntry::new(key.clone(), location, format))
    }

    /// Registers a previously persisted location for a key.
    ///
    /// Used when restoring a run: dependents then deserialize from the
    /// recorded location instead of recomputing.
    pub fn register_location(&self, key: &DataKey, location: impl Into<String>) {
        let format = self
            .config
            .entries
            .get(key)
            .map(|entry| entry.format)
            .unwrap_or_default();
        let entry = CatalogEntry::new(key.clone(), location, format);

        self.registered
            .write()
            .expect("catalog entry lock poisoned")
            .insert(key.clone(), entry);
    }

    /// Loads the value for a key.
    ///
    /// Fails with [`CatalogError::NotFound`] when the key has neither a
    /// registered nor a configured entry, or when nothing was written at
    /// the resolved location.
    pub async fn get(&self, key: &DataKey, vars: &TemplateVars) -> CatalogResult<DataValue> {
        if !self.is_registered(key) {
            return Err(CatalogError::NotFound(key.clone()));
        }
        let entry = self.resolve(key, vars)?;

        tracing::debug!(
            target: TRACING_TARGET,
            key = %key,
            location = %entry.location,
            "Loading catalog entry"
        );

        let bytes = match self.operator.read(&entry.location).await {
            Ok(buffer) => buffer.to_vec(),
            Err(err) if err.kind() == opendal::ErrorKind::NotFound => {
                return Err(CatalogError::NotFound(key.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        let value = entry.format.decode(key, &bytes)?;

        self.remember(entry);
        Ok(value)
    }

    /// Saves a value under a key, creating or overwriting its entry.
    pub async fn put(
        &self,
        key: &DataKey,
        value: &DataValue,
        vars: &TemplateVars,
    ) -> CatalogResult<CatalogEntry> {
        let entry = self.resolve(key, vars)?;
        let bytes = entry.format.encode(key, value)?;

        tracing::debug!(
            target: TRACING_TARGET,
            key = %key,
            location = %entry.location,
            size = bytes.len(),
            "Saving catalog entry"
        );

        self.operator.write(&entry.location, bytes).await?;

        self.remember(entry.clone());
        Ok(entry)
    }

    /// Returns whether a value exists at the key's resolved location.
    pub async fn exists(&self, key: &DataKey, vars: &TemplateVars) -> CatalogResult<bool> {
        if !self.is_registered(key) {
            return Ok(false);
        }
        let entry = self.resolve(key, vars)?;
        Ok(self.operator.exists(&entry.location).await?)
    }

    fn remember(&self, entry: CatalogEntry) {
        self.registered
            .write()
            .expect("catalog entry lock poisoned")
            .insert(entry.key.clone(), entry);
    }
}

/// Creates an OpenDAL operator for a backend selection.
fn build_operator(backend: &CatalogBackend) -> CatalogResult<Operator> {
    match backend {
        CatalogBackend::Fs { root } => Operator::new(services::Fs::default().root(root))
            .map(|op| op.finish())
            .map_err(|e| CatalogError::init(e.to_string())),
        CatalogBackend::Memory => Operator::new(services::Memory::default())
            .map(|op| op.finish())
            .map_err(|e| CatalogError::init(e.to_string())),
    }
}

impl std::fmt::Debug for DataCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCatalog")
            .field("backend", &self.config.backend)
            .field("configured_entries", &self.config.entries.len())
            .finish()
    }
}
