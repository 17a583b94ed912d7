//! Node descriptors and identifiers.

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::key::DataKey;
use crate::params::Params;
use crate::workflow::WorkflowSpec;

/// Identifier for a node, unique within its enclosing workflow.
///
/// IDs are author-chosen names. Flattening qualifies nested node IDs with
/// their wrapper's ID, so uniqueness holds globally in a flat workflow.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a new node ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the ID qualified with a scope prefix.
    pub fn scoped(&self, scope: &str) -> Self {
        Self(format!("{scope}.{}", self.0))
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Compute behavior: invokes a registered node kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeNode {
    /// Name of the registered computation.
    pub kind: String,
}

/// Delegating behavior: expands to a nested workflow during flattening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubWorkflowNode {
    /// The nested workflow.
    pub workflow: WorkflowSpec,
}

/// What a node does when dispatched.
///
/// A node either computes (a registered kind) or delegates to a nested
/// workflow; the tagged representation makes the two mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeBehavior {
    /// Invokes a registered computation.
    Compute(ComputeNode),
    /// Expands to the nodes of a nested workflow.
    SubWorkflow(SubWorkflowNode),
}

impl NodeBehavior {
    /// Returns whether this is a compute node.
    pub const fn is_compute(&self) -> bool {
        matches!(self, NodeBehavior::Compute(_))
    }

    /// Returns whether this is a sub-workflow node.
    pub const fn is_sub_workflow(&self) -> bool {
        matches!(self, NodeBehavior::SubWorkflow(_))
    }
}

/// Declarative description of a single workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Node ID, unique within the enclosing workflow.
    pub id: NodeId,
    /// Compute or sub-workflow behavior.
    #[serde(flatten)]
    pub behavior: NodeBehavior,
    /// Opaque parameters forwarded to the computation.
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
    /// Logical keys consumed, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_keys: Vec<DataKey>,
    /// Logical keys produced, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_keys: Vec<DataKey>,
    /// Condition flag gating the node; an unset or false flag drops it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Explicit predecessors for side-effect-only ordering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<NodeId>,
}

impl NodeDescriptor {
    /// Creates a compute node descriptor.
    pub fn compute(id: impl Into<NodeId>, kind: impl Into<String>) -> Self {
        Self::with_behavior(id, NodeBehavior::Compute(ComputeNode { kind: kind.into() }))
    }

    /// Creates a sub-workflow node descriptor.
    pub fn sub_workflow(id: impl Into<NodeId>, workflow: WorkflowSpec) -> Self {
        Self::with_behavior(id, NodeBehavior::SubWorkflow(SubWorkflowNode { workflow }))
    }

    fn with_behavior(id: impl Into<NodeId>, behavior: NodeBehavior) -> Self {
        Self {
            id: id.into(),
            behavior,
            params: Params::new(),
            input_keys: Vec::new(),
            output_keys: Vec::new(),
            condition: None,
            after: Vec::new(),
        }
    }

    /// Sets the parameter bag.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Declares the consumed keys.
    pub fn with_inputs(mut self, keys: impl IntoIterator<Item = impl Into<DataKey>>) -> Self {
        self.input_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Declares the produced keys.
    pub fn with_outputs(mut self, keys: impl IntoIterator<Item = impl Into<DataKey>>) -> Self {
        self.output_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Gates the node on a condition flag.
    pub fn with_condition(mut self, flag: impl Into<String>) -> Self {
        self.condition = Some(flag.into());
        self
    }

    /// Declares explicit predecessors.
    pub fn with_after(mut self, ids: impl IntoIterator<Item = impl Into<NodeId>>) -> Self {
        self.after = ids.into_iter().map(Into::into).collect();
        self
    }
}
