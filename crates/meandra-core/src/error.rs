//! Workflow model error types.

use thiserror::Error;

use crate::key::DataKey;
use crate::node::NodeId;

/// Result type for workflow model operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while validating a workflow description.
///
/// These are structural faults in the description itself. They are fatal,
/// raised before any node runs, and never retried.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Two sibling nodes declare the same ID.
    #[error("duplicate node id: {node_id}")]
    DuplicateNodeId {
        /// The repeated node ID.
        node_id: NodeId,
    },

    /// Two sibling nodes produce the same output key.
    #[error("node {node_id} produces {key}, already produced by {first}")]
    DuplicateOutputKey {
        /// The node that re-declares the key.
        node_id: NodeId,
        /// The contested output key.
        key: DataKey,
        /// The node that declared the key first.
        first: NodeId,
    },

    /// A nested workflow consumes a key its wrapper does not declare as an input.
    #[error("sub-workflow node {node_id} consumes {key} without declaring it as an input")]
    UnboundSubInput {
        /// The sub-workflow node ID.
        node_id: NodeId,
        /// The undeclared input key.
        key: DataKey,
    },

    /// A sub-workflow node declares an output no nested node produces.
    #[error("sub-workflow node {node_id} declares output {key} but nothing inside produces it")]
    UnboundSubOutput {
        /// The sub-workflow node ID.
        node_id: NodeId,
        /// The unproduced output key.
        key: DataKey,
    },

    /// A compute node references a kind absent from the registry.
    #[error("unknown node kind: {kind}")]
    UnknownKind {
        /// The unregistered kind name.
        kind: String,
    },

    /// Node parameters failed kind validation.
    #[error("invalid params for node {node_id}: {message}")]
    InvalidParams {
        /// The node with invalid parameters.
        node_id: NodeId,
        /// Error message from the kind's validation.
        message: String,
    },
}
