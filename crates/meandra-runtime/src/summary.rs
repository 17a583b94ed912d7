//! Run-level outcomes and summaries.

use std::collections::BTreeMap;

use meandra_core::{NodeId, NodeRunState, RunId};
use serde::{Deserialize, Serialize};

/// Final outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every non-skipped node succeeded.
    Succeeded,
    /// One or more nodes failed.
    Failed {
        /// The originally failed nodes, not their cascaded skips.
        root_causes: Vec<NodeId>,
    },
}

impl RunOutcome {
    /// Returns whether the run succeeded.
    pub const fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// One node's final state within a run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeReport {
    /// Final lifecycle state.
    pub state: NodeRunState,
    /// Error text for failed nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeReport {
    /// Creates a report with no error.
    pub fn new(state: NodeRunState) -> Self {
        Self { state, error: None }
    }

    /// Creates a report for a failed node.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            state: NodeRunState::Failed,
            error: Some(error.into()),
        }
    }
}

/// Final report of a run: outcome plus every node's terminal state.
///
/// Skipped nodes appear distinctly from failed ones, so the root causes of
/// a failed run are unambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// The run this summary describes.
    pub run_id: RunId,
    /// Final outcome.
    pub outcome: RunOutcome,
    /// Per-node final states.
    pub nodes: BTreeMap<NodeId, NodeReport>,
    /// Nodes executed by this invocation, in completion order. Nodes
    /// restored from checkpoints do not appear here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub executed: Vec<NodeId>,
}

impl RunSummary {
    /// Returns whether the run succeeded.
    pub fn succeeded(&self) -> bool {
        self.outcome.is_succeeded()
    }

    /// Returns the nodes that ended in a given state.
    pub fn nodes_in_state(&self, state: NodeRunState) -> Vec<&NodeId> {
        self.nodes
            .iter()
            .filter(|(_, report)| report.state == state)
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_filters_by_state() {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodeId::new("a"), NodeReport::failed("boom"));
        nodes.insert(NodeId::new("b"), NodeReport::new(NodeRunState::Succeeded));
        nodes.insert(NodeId::new("c"), NodeReport::new(NodeRunState::Skipped));

        let summary = RunSummary {
            run_id: RunId::new("run-1"),
            outcome: RunOutcome::Failed {
                root_causes: vec![NodeId::new("a")],
            },
            nodes,
            executed: vec![NodeId::new("a"), NodeId::new("b")],
        };

        assert!(!summary.succeeded());
        assert_eq!(summary.nodes_in_state(NodeRunState::Failed), vec![&NodeId::new("a")]);
        assert_eq!(summary.nodes_in_state(NodeRunState::Skipped), vec![&NodeId::new("c")]);
    }
}
