//! Workflow descriptions: validation and flattening.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::error::{ConfigError, ConfigResult};
use crate::key::DataKey;
use crate::metadata::WorkflowMetadata;
use crate::node::{NodeBehavior, NodeDescriptor, NodeId};

/// A declarative, possibly nested, collection of nodes.
///
/// Node order is significant: the resolver breaks scheduling ties by
/// declaration order, so two runs of the same workflow always produce the
/// same plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    /// Workflow identifier.
    pub id: String,
    /// Descriptive metadata.
    #[serde(default, skip_serializing_if = "is_default_metadata")]
    pub metadata: WorkflowMetadata,
    /// Nodes in declaration order.
    pub nodes: Vec<NodeDescriptor>,
}

fn is_default_metadata(metadata: &WorkflowMetadata) -> bool {
    *metadata == WorkflowMetadata::default()
}

impl WorkflowSpec {
    /// Creates a workflow from nodes, validating the description.
    ///
    /// Checks that sibling node IDs are unique, that no output key has two
    /// producers, and that every sub-workflow's boundary declaration covers
    /// the free keys of its nested workflow.
    pub fn new(id: impl Into<String>, nodes: Vec<NodeDescriptor>) -> ConfigResult<Self> {
        let workflow = Self {
            id: id.into(),
            metadata: WorkflowMetadata::default(),
            nodes,
        };
        workflow.validate()?;
        Ok(workflow)
    }

    /// Sets the metadata.
    pub fn with_metadata(mut self, metadata: WorkflowMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns the number of top-level nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns a node by ID.
    pub fn node(&self, id: &NodeId) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    /// Returns an iterator over top-level node IDs in declaration order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|node| &node.id)
    }

    /// Returns whether the workflow contains no sub-workflow nodes.
    pub fn is_flat(&self) -> bool {
        self.nodes.iter().all(|node| node.behavior.is_compute())
    }

    /// Validates the workflow description.
    ///
    /// Deserialized workflows bypass [`WorkflowSpec::new`], so consumers
    /// re-run this before resolving dependencies.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen_ids: HashSet<&NodeId> = HashSet::new();
        let mut producers: HashMap<&DataKey, &NodeId> = HashMap::new();

        for node in &self.nodes {
            if !seen_ids.insert(&node.id) {
                return Err(ConfigError::DuplicateNodeId {
                    node_id: node.id.clone(),
                });
            }

            for key in &node.output_keys {
                if let Some(first) = producers.insert(key, &node.id) {
                    return Err(ConfigError::DuplicateOutputKey {
                        node_id: node.id.clone(),
                        key: key.clone(),
                        first: first.clone(),
                    });
                }
            }

            if let NodeBehavior::SubWorkflow(sub) = &node.behavior {
                sub.workflow.validate()?;
                self.validate_boundary(node, &sub.workflow)?;
            }
        }

        Ok(())
    }

    /// Checks that a sub-workflow node's declared keys cover the free keys
    /// of its nested workflow, so nesting stays transparent to dependency
    /// analysis at the parent level.
    fn validate_boundary(&self, node: &NodeDescriptor, nested: &WorkflowSpec) -> ConfigResult<()> {
        let produced: HashSet<&DataKey> = nested
            .nodes
            .iter()
            .flat_map(|inner| &inner.output_keys)
            .collect();
        let declared_inputs: HashSet<&DataKey> = node.input_keys.iter().collect();

        for inner in &nested.nodes {
            for key in &inner.input_keys {
                if !produced.contains(key) && !declared_inputs.contains(key) {
                    return Err(ConfigError::UnboundSubInput {
                        node_id: node.id.clone(),
                        key: key.clone(),
                    });
                }
            }
        }

        for key in &node.output_keys {
            if !produced.contains(key) {
                return Err(ConfigError::UnboundSubOutput {
                    node_id: node.id.clone(),
                    key: key.clone(),
                });
            }
        }

        Ok(())
    }

    /// Recursively replaces every sub-workflow node with its nested nodes.
    ///
    /// Internal node IDs and internal keys are qualified with the wrapper's
    /// ID; boundary keys (declared on the wrapper) keep their names so they
    /// still connect to surrounding nodes. Flattening an already-flat
    /// workflow returns an identical copy.
    pub fn flatten(&self) -> ConfigResult<Self> {
        self.validate()?;

        let mut flat_nodes: Vec<NodeDescriptor> = Vec::with_capacity(self.nodes.len());
        // Wrapper IDs expanded at this level, with their member IDs, so
        // sibling `after` references can be rewritten afterwards.
        let mut expanded: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

        for node in &self.nodes {
            match &node.behavior {
                NodeBehavior::Compute(_) => flat_nodes.push(node.clone()),
                NodeBehavior::SubWorkflow(sub) => {
                    let inner = sub.workflow.flatten()?;
                    let scope = node.id.as_str();
                    let boundary: HashSet<&DataKey> = node
                        .input_keys
                        .iter()
                        .chain(node.output_keys.iter())
                        .collect();

                    let mut members = Vec::with_capacity(inner.nodes.len());
                    for inner_node in &inner.nodes {
                        let mut renamed = inner_node.clone();
                        renamed.id = inner_node.id.scoped(scope);
                        renamed.input_keys = scope_keys(&inner_node.input_keys, &boundary, scope);
                        renamed.output_keys = scope_keys(&inner_node.output_keys, &boundary, scope);
                        renamed.after = inner_node
                            .after
                            .iter()
                            .map(|id| id.scoped(scope))
                            // Explicit ordering on the wrapper gates every member.
                            .chain(node.after.iter().cloned())
                            .collect();
                        members.push(renamed.id.clone());
                        flat_nodes.push(renamed);
                    }

                    tracing::debug!(
                        target: TRACING_TARGET,
                        workflow = %self.id,
                        node_id = %node.id,
                        members = members.len(),
                        "Flattened sub-workflow node"
                    );
                    expanded.insert(node.id.clone(), members);
                }
            }
        }

        if !expanded.is_empty() {
            for node in &mut flat_nodes {
                if node.after.iter().any(|id| expanded.contains_key(id)) {
                    node.after = node
                        .after
                        .iter()
                        .flat_map(|id| match expanded.get(id) {
                            Some(members) => members.clone(),
                            None => vec![id.clone()],
                        })
                        .collect();
                }
            }
        }

        let flat = Self {
            id: self.id.clone(),
            metadata: self.metadata.clone(),
            nodes: flat_nodes,
        };
        flat.validate()?;
        Ok(flat)
    }
}

/// Qualifies non-boundary keys with a scope prefix.
fn scope_keys(keys: &[DataKey], boundary: &HashSet<&DataKey>, scope: &str) -> Vec<DataKey> {
    keys.iter()
        .map(|key| {
            if boundary.contains(key) {
                key.clone()
            } else {
                key.scoped(scope)
            }
        })
        .collect()
}
