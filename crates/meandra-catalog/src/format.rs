//! Storage formats for catalog entries.

use meandra_core::{DataKey, DataValue};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::error::{CatalogError, CatalogResult};

/// On-disk representation of a catalog entry.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Debug, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// A single JSON document.
    #[default]
    Json,
    /// One JSON document per line; the value must be an array.
    JsonLines,
    /// Raw UTF-8 text; the value must be a string.
    Text,
}

impl DataFormat {
    /// Returns the conventional file extension for the format.
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::JsonLines => "jsonl",
            Self::Text => "txt",
        }
    }

    /// Encodes a value into bytes.
    pub fn encode(&self, key: &DataKey, value: &DataValue) -> CatalogResult<Vec<u8>> {
        match self {
            Self::Json => Ok(serde_json::to_vec(value)?),
            Self::JsonLines => {
                let DataValue::Array(items) = value else {
                    return Err(CatalogError::encode(key, "json-lines value must be an array"));
                };
                let mut bytes = Vec::new();
                for item in items {
                    serde_json::to_writer(&mut bytes, item)?;
                    bytes.push(b'\n');
                }
                Ok(bytes)
            }
            Self::Text => {
                let DataValue::String(text) = value else {
                    return Err(CatalogError::encode(key, "text value must be a string"));
                };
                Ok(text.as_bytes().to_vec())
            }
        }
    }

    /// Decodes bytes into a value.
    pub fn decode(&self, key: &DataKey, bytes: &[u8]) -> CatalogResult<DataValue> {
        match self {
            Self::Json => {
                serde_json::from_slice(bytes).map_err(|e| CatalogError::decode(key, e.to_string()))
            }
            Self::JsonLines => bytes
                .split(|byte| *byte == b'\n')
                .filter(|line| !line.is_empty())
                .map(|line| {
                    serde_json::from_slice(line)
                        .map_err(|e| CatalogError::decode(key, e.to_string()))
                })
                .collect::<CatalogResult<Vec<DataValue>>>()
                .map(DataValue::Array),
            Self::Text => String::from_utf8(bytes.to_vec())
                .map(DataValue::String)
                .map_err(|e| CatalogError::decode(key, e.to_string())),
        }
    }
}
