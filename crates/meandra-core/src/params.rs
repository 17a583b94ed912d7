//! Node parameter bags.

use serde::{Deserialize, Serialize};

/// Value type for node parameters and data bindings.
pub type DataValue = serde_json::Value;

/// Opaque key-value bag passed to a node's computation.
///
/// Parameters are configuration-time values, as opposed to runtime inputs
/// resolved through the catalog. The core never interprets them; they are
/// forwarded verbatim to the node kind.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(serde_json::Map<String, DataValue>);

impl Params {
    /// Creates an empty parameter bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the value for a parameter name, if present.
    pub fn get(&self, name: &str) -> Option<&DataValue> {
        self.0.get(name)
    }

    /// Inserts a parameter, replacing any existing value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<DataValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Adds a parameter in builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Iterates over parameter names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DataValue)> {
        self.0.iter()
    }
}

impl std::fmt::Debug for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl FromIterator<(String, DataValue)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, DataValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
