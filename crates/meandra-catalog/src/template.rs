//! Path templates with run-time placeholders.

use std::collections::BTreeMap;

use derive_more::{Debug, Display, From, Into};
use meandra_core::RunId;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// A storage path with `{placeholder}` segments resolved at run time.
///
/// Resolution is deterministic: the same template and the same variable
/// values always produce the same location.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct PathTemplate(String);

impl PathTemplate {
    /// Creates a new path template.
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Returns the raw template string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolves the template against placeholder values.
    pub fn resolve(&self, vars: &TemplateVars) -> CatalogResult<String> {
        let mut resolved = String::with_capacity(self.0.len());
        let mut rest = self.0.as_str();

        while let Some(open) = rest.find('{') {
            let (literal, tail) = rest.split_at(open);
            resolved.push_str(literal);

            let Some(close) = tail.find('}') else {
                return Err(CatalogError::InvalidTemplate {
                    template: self.0.clone(),
                    message: "unclosed placeholder".into(),
                });
            };
            let placeholder = &tail[1..close];
            if placeholder.is_empty() {
                return Err(CatalogError::InvalidTemplate {
                    template: self.0.clone(),
                    message: "empty placeholder".into(),
                });
            }

            let value = vars
                .get(placeholder)
                .ok_or_else(|| CatalogError::UnknownPlaceholder {
                    template: self.0.clone(),
                    placeholder: placeholder.to_owned(),
                })?;
            resolved.push_str(value);
            rest = &tail[close + 1..];
        }

        resolved.push_str(rest);
        Ok(resolved)
    }
}

impl From<&str> for PathTemplate {
    fn from(template: &str) -> Self {
        Self(template.to_owned())
    }
}

/// Placeholder values available during template resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateVars(BTreeMap<String, String>);

impl TemplateVars {
    /// Creates an empty set of variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates variables seeded with a run ID under `run_id`.
    pub fn for_run(run_id: &RunId) -> Self {
        Self::new().with("run_id", run_id.as_str())
    }

    /// Adds a variable in builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Inserts a variable, replacing any existing value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns the value for a variable name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}
