//! Catalog error types.

use meandra_core::DataKey;
use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No entry exists and no producing node supplied the key.
    #[error("no catalog entry for key: {0}")]
    NotFound(DataKey),

    /// A path template references a placeholder with no value.
    #[error("unknown placeholder {{{placeholder}}} in template {template}")]
    UnknownPlaceholder {
        /// The template being resolved.
        template: String,
        /// The placeholder without a value.
        placeholder: String,
    },

    /// Malformed path template.
    #[error("invalid path template {template}: {message}")]
    InvalidTemplate {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        message: String,
    },

    /// Stored bytes do not match the entry's declared format.
    #[error("decode failed for key {key}: {message}")]
    Decode {
        /// The key being loaded.
        key: DataKey,
        /// Decoder error message.
        message: String,
    },

    /// A value cannot be represented in the entry's declared format.
    #[error("encode failed for key {key}: {message}")]
    Encode {
        /// The key being saved.
        key: DataKey,
        /// Encoder error message.
        message: String,
    },

    /// Failed to initialize the storage backend.
    #[error("catalog initialization failed: {0}")]
    Init(String),

    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(#[from] opendal::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CatalogError {
    /// Creates a new initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Creates a new decode error.
    pub fn decode(key: &DataKey, msg: impl Into<String>) -> Self {
        Self::Decode {
            key: key.clone(),
            message: msg.into(),
        }
    }

    /// Creates a new encode error.
    pub fn encode(key: &DataKey, msg: impl Into<String>) -> Self {
        Self::Encode {
            key: key.clone(),
            message: msg.into(),
        }
    }
}
