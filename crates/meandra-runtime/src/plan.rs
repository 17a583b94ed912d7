//! Leveled execution plans.

use std::collections::BTreeMap;

use meandra_core::NodeId;
use serde::{Deserialize, Serialize};

/// A deterministic, leveled ordering of nodes ready for dispatch.
///
/// Nodes within a level have no dependencies among them and may run
/// concurrently; every dependency of a node sits in a strictly earlier
/// level. The plan also carries each node's direct predecessors so the
/// orchestrator can gate readiness and cascade skips.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionPlan {
    levels: Vec<Vec<NodeId>>,
    predecessors: BTreeMap<NodeId, Vec<NodeId>>,
}

impl ExecutionPlan {
    /// Creates a plan from levels and per-node predecessors.
    pub fn new(levels: Vec<Vec<NodeId>>, predecessors: BTreeMap<NodeId, Vec<NodeId>>) -> Self {
        Self {
            levels,
            predecessors,
        }
    }

    /// Returns the levels in execution order.
    pub fn levels(&self) -> &[Vec<NodeId>] {
        &self.levels
    }

    /// Returns the number of levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Returns the total number of nodes.
    pub fn node_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Returns whether the plan has no nodes.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns the level index of a node.
    pub fn level_of(&self, node_id: &NodeId) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.contains(node_id))
    }

    /// Returns the direct predecessors of a node.
    pub fn predecessors_of(&self, node_id: &NodeId) -> &[NodeId] {
        self.predecessors
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns an iterator over all node IDs in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.levels.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> ExecutionPlan {
        let a = NodeId::new("a");
        let b = NodeId::new("b");
        let c = NodeId::new("c");
        let mut predecessors = BTreeMap::new();
        predecessors.insert(c.clone(), vec![a.clone(), b.clone()]);
        ExecutionPlan::new(vec![vec![a, b], vec![c]], predecessors)
    }

    #[test]
    fn test_plan_accessors() {
        let plan = sample_plan();
        assert_eq!(plan.level_count(), 2);
        assert_eq!(plan.node_count(), 3);
        assert_eq!(plan.level_of(&NodeId::new("c")), Some(1));
        assert_eq!(plan.level_of(&NodeId::new("missing")), None);
        assert_eq!(
            plan.predecessors_of(&NodeId::new("c")),
            &[NodeId::new("a"), NodeId::new("b")]
        );
        assert!(plan.predecessors_of(&NodeId::new("a")).is_empty());
    }

    #[test]
    fn test_plan_iter_order() {
        let plan = sample_plan();
        let order: Vec<_> = plan.iter().map(NodeId::as_str).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}
