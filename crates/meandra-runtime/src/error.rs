//! Runtime error types.

use meandra_catalog::CatalogError;
use meandra_checkpoint::CheckpointError;
use meandra_core::{ConfigError, DataKey, NodeError, NodeId};
use thiserror::Error;

/// Result type for whole-run operations.
pub type RunResult<T> = Result<T, RunError>;

/// Errors raised while turning a workflow into an execution plan.
///
/// These are structural: they abort before any node runs and are never
/// retried.
#[derive(Debug, Clone, Error)]
pub enum DependencyError {
    /// The dependency graph contains a cycle.
    #[error("dependency cycle through nodes: {}", format_cycle(.nodes))]
    Cycle {
        /// Nodes on the cycle, in discovery order.
        nodes: Vec<NodeId>,
    },

    /// An input key has no producing node and no catalog entry.
    #[error("node {node_id} consumes {key}, which nothing produces or catalogs")]
    UnresolvedInput {
        /// The consuming node.
        node_id: NodeId,
        /// The unresolvable key.
        key: DataKey,
    },

    /// An explicit ordering edge references a node that does not exist.
    #[error("node {node_id} is ordered after unknown node {predecessor}")]
    UnknownPredecessor {
        /// The node carrying the explicit edge.
        node_id: NodeId,
        /// The missing predecessor.
        predecessor: NodeId,
    },
}

fn format_cycle(nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A single node's failure during execution.
///
/// Recorded per node; it taints the run outcome and skips dependents, but
/// does not abort the rest of the level.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The node computation returned an error.
    #[error("computation failed: {0}")]
    Node(#[from] NodeError),

    /// Catalog I/O failed while resolving inputs or persisting outputs.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The node finished without producing a declared output.
    #[error("declared output {key} was not produced")]
    MissingOutput {
        /// The missing output key.
        key: DataKey,
    },

    /// The completion record could not be written.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors that abort a run before or outside node execution.
#[derive(Debug, Error)]
pub enum RunError {
    /// The workflow description is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The execution plan could not be built.
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    /// The checkpoint store failed while restoring run state.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl RunError {
    /// Returns whether the error is structural: a fault in the workflow
    /// description or its dependency graph, detected before any node ran.
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Dependency(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_names_nodes() {
        let error = DependencyError::Cycle {
            nodes: vec![NodeId::new("a"), NodeId::new("b"), NodeId::new("c")],
        };
        assert_eq!(
            error.to_string(),
            "dependency cycle through nodes: a -> b -> c"
        );
    }

    #[test]
    fn test_run_error_structural() {
        let error = RunError::from(DependencyError::UnresolvedInput {
            node_id: NodeId::new("train"),
            key: DataKey::new("features"),
        });
        assert!(error.is_structural());
    }
}
