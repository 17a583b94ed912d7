//! Logical data keys and run identifiers.

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logical name of a piece of data exchanged between nodes.
///
/// A key names data, not storage: the catalog decides where (and whether)
/// a key is persisted. Keys produced inside a nested workflow are
/// scope-qualified during flattening so sibling subgraphs cannot collide.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct DataKey(String);

impl DataKey {
    /// Creates a new data key.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the key qualified with a scope prefix.
    pub fn scoped(&self, scope: &str) -> Self {
        Self(format!("{scope}.{}", self.0))
    }
}

impl From<&str> for DataKey {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

/// Identifier for one end-to-end execution of a workflow.
///
/// Run IDs key checkpoint records and catalog path templates; callers may
/// supply any stable string or generate a fresh one.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Creates a run ID from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh time-sortable run ID.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the run ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}
