//! Dependency resolution: workflow to execution plan.

use std::collections::{BTreeMap, HashMap, HashSet};

use meandra_catalog::DataCatalog;
use meandra_core::{NodeId, WorkflowSpec};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::TRACING_TARGET;
use crate::context::RunContext;
use crate::error::DependencyError;
use crate::plan::ExecutionPlan;

/// Resolves a flattened workflow into a leveled [`ExecutionPlan`].
///
/// Dependency edges are derived from key production and consumption (B
/// feeds A when A consumes a key B produces) plus any explicit ordering
/// declarations. Ties within a level are broken by declaration order, so
/// the same workflow always yields the same plan regardless of traversal
/// details.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    /// Creates a scheduler.
    pub fn new() -> Self {
        Self
    }

    /// Builds the execution plan for a flattened workflow.
    ///
    /// Nodes whose condition flag evaluates false are dropped before the
    /// graph is built. Cycles and input keys that neither a node nor the
    /// catalog can supply fail here, before anything executes.
    pub fn plan(
        &self,
        workflow: &WorkflowSpec,
        ctx: &RunContext,
        catalog: &DataCatalog,
    ) -> Result<ExecutionPlan, DependencyError> {
        let active: Vec<_> = workflow
            .nodes
            .iter()
            .filter(|node| {
                node.condition
                    .as_deref()
                    .is_none_or(|flag| ctx.flag(flag))
            })
            .collect();

        let mut producers: HashMap<_, &NodeId> = HashMap::new();
        for node in &active {
            for key in &node.output_keys {
                producers.insert(key, &node.id);
            }
        }

        let mut graph: DiGraph<NodeId, ()> = DiGraph::new();
        let mut indices: HashMap<&NodeId, NodeIndex> = HashMap::new();
        for node in &active {
            let index = graph.add_node(node.id.clone());
            indices.insert(&node.id, index);
        }

        let declared_ids: HashSet<_> = workflow.nodes.iter().map(|node| &node.id).collect();

        let mut predecessors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for node in &active {
            let mut preds: Vec<NodeId> = Vec::new();

            for key in &node.input_keys {
                match producers.get(key) {
                    Some(producer) => push_unique(&mut preds, (*producer).clone()),
                    None if catalog.is_registered(key) => {}
                    None => {
                        return Err(DependencyError::UnresolvedInput {
                            node_id: node.id.clone(),
                            key: key.clone(),
                        });
                    }
                }
            }

            for predecessor in &node.after {
                if indices.contains_key(predecessor) {
                    push_unique(&mut preds, predecessor.clone());
                } else if !declared_ids.contains(predecessor) {
                    return Err(DependencyError::UnknownPredecessor {
                        node_id: node.id.clone(),
                        predecessor: predecessor.clone(),
                    });
                }
                // Ordering after a condition-dropped node is moot.
            }

            for pred in &preds {
                graph.add_edge(indices[pred], indices[&node.id], ());
            }
            predecessors.insert(node.id.clone(), preds);
        }

        if let Some(nodes) = find_cycle(&graph) {
            return Err(DependencyError::Cycle { nodes });
        }

        let levels = build_levels(&active, &predecessors);

        tracing::debug!(
            target: TRACING_TARGET,
            workflow = %workflow.id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            levels = levels.len(),
            "Execution plan built"
        );

        Ok(ExecutionPlan::new(levels, predecessors))
    }
}

fn push_unique(preds: &mut Vec<NodeId>, id: NodeId) {
    if !preds.contains(&id) {
        preds.push(id);
    }
}

/// Groups nodes into levels: a node is placed once every predecessor sits
/// in an earlier level. Each wave scans the remaining nodes in declaration
/// order, which fixes the order within a level.
fn build_levels(
    active: &[&meandra_core::NodeDescriptor],
    predecessors: &BTreeMap<NodeId, Vec<NodeId>>,
) -> Vec<Vec<NodeId>> {
    let mut placed: HashSet<NodeId> = HashSet::new();
    let mut remaining: Vec<&NodeId> = active.iter().map(|node| &node.id).collect();
    let mut levels = Vec::new();

    while !remaining.is_empty() {
        let mut level: Vec<NodeId> = Vec::new();
        let mut rest: Vec<&NodeId> = Vec::new();

        for id in remaining {
            let ready = predecessors
                .get(id)
                .is_none_or(|preds| preds.iter().all(|pred| placed.contains(pred)));
            if ready {
                level.push(id.clone());
            } else {
                rest.push(id);
            }
        }

        if level.is_empty() {
            // Ruled out by the cycle check.
            break;
        }

        placed.extend(level.iter().cloned());
        levels.push(level);
        remaining = rest;
    }

    levels
}

/// Depth-first cycle search with recursion-stack marking.
///
/// Returns the nodes of the first cycle found, in discovery order.
fn find_cycle(graph: &DiGraph<NodeId, ()>) -> Option<Vec<NodeId>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; graph.node_count()];
    let mut path: Vec<NodeIndex> = Vec::new();

    fn visit(
        graph: &DiGraph<NodeId, ()>,
        node: NodeIndex,
        marks: &mut [Mark],
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeId>> {
        marks[node.index()] = Mark::OnStack;
        path.push(node);

        for succ in graph.neighbors(node) {
            match marks[succ.index()] {
                Mark::OnStack => {
                    let start = path.iter().position(|idx| *idx == succ).unwrap_or(0);
                    return Some(path[start..].iter().map(|idx| graph[*idx].clone()).collect());
                }
                Mark::Unvisited => {
                    if let Some(cycle) = visit(graph, succ, marks, path) {
                        return Some(cycle);
                    }
                }
                Mark::Done => {}
            }
        }

        path.pop();
        marks[node.index()] = Mark::Done;
        None
    }

    graph.node_indices().find_map(|start| {
        if marks[start.index()] == Mark::Unvisited {
            visit(graph, start, &mut marks, &mut path)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use meandra_catalog::{CatalogConfig, EntryConfig};
    use meandra_core::NodeDescriptor;

    fn catalog() -> DataCatalog {
        DataCatalog::new(CatalogConfig::memory()).unwrap()
    }

    fn ctx() -> RunContext {
        RunContext::new("run-1")
    }

    fn producer(id: &str, output: &str) -> NodeDescriptor {
        NodeDescriptor::compute(id, "constant").with_outputs([output])
    }

    fn fan_in_workflow() -> WorkflowSpec {
        WorkflowSpec::new(
            "fan-in",
            vec![
                producer("a", "x"),
                producer("b", "y"),
                NodeDescriptor::compute("c", "merge")
                    .with_inputs(["x", "y"])
                    .with_outputs(["z"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_plan_levels_fan_in() {
        let plan = Scheduler::new()
            .plan(&fan_in_workflow(), &ctx(), &catalog())
            .unwrap();

        assert_eq!(
            plan.levels(),
            &[
                vec![NodeId::new("a"), NodeId::new("b")],
                vec![NodeId::new("c")],
            ]
        );
        assert_eq!(
            plan.predecessors_of(&NodeId::new("c")),
            &[NodeId::new("a"), NodeId::new("b")]
        );
    }

    #[test]
    fn test_plan_respects_every_edge() {
        let workflow = WorkflowSpec::new(
            "chain",
            vec![
                producer("a", "x"),
                NodeDescriptor::compute("b", "step")
                    .with_inputs(["x"])
                    .with_outputs(["y"]),
                NodeDescriptor::compute("c", "step")
                    .with_inputs(["x", "y"])
                    .with_outputs(["z"]),
            ],
        )
        .unwrap();

        let plan = Scheduler::new().plan(&workflow, &ctx(), &catalog()).unwrap();
        for node in &workflow.nodes {
            for pred in plan.predecessors_of(&node.id) {
                assert!(plan.level_of(pred).unwrap() < plan.level_of(&node.id).unwrap());
            }
        }
    }

    #[test]
    fn test_plan_declaration_order_tie_break() {
        let workflow = WorkflowSpec::new(
            "independent",
            vec![producer("zeta", "z"), producer("alpha", "a")],
        )
        .unwrap();

        let plan = Scheduler::new().plan(&workflow, &ctx(), &catalog()).unwrap();
        assert_eq!(
            plan.levels(),
            &[vec![NodeId::new("zeta"), NodeId::new("alpha")]]
        );
    }

    #[test]
    fn test_plan_cycle_rejected() {
        let workflow = WorkflowSpec::new(
            "cyclic",
            vec![
                NodeDescriptor::compute("a", "step")
                    .with_inputs(["y"])
                    .with_outputs(["x"]),
                NodeDescriptor::compute("b", "step")
                    .with_inputs(["x"])
                    .with_outputs(["y"]),
            ],
        )
        .unwrap();

        match Scheduler::new().plan(&workflow, &ctx(), &catalog()) {
            Err(DependencyError::Cycle { nodes }) => {
                assert!(!nodes.is_empty());
                for id in &nodes {
                    assert!(workflow.node(id).is_some());
                }
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_self_consumption_is_a_cycle() {
        let workflow = WorkflowSpec::new(
            "selfish",
            vec![
                NodeDescriptor::compute("a", "step")
                    .with_inputs(["x"])
                    .with_outputs(["x"]),
            ],
        )
        .unwrap();

        assert!(matches!(
            Scheduler::new().plan(&workflow, &ctx(), &catalog()),
            Err(DependencyError::Cycle { .. })
        ));
    }

    #[test]
    fn test_plan_unresolved_input() {
        let workflow = WorkflowSpec::new(
            "dangling",
            vec![
                NodeDescriptor::compute("train", "fit")
                    .with_inputs(["features"])
                    .with_outputs(["model"]),
            ],
        )
        .unwrap();

        match Scheduler::new().plan(&workflow, &ctx(), &catalog()) {
            Err(DependencyError::UnresolvedInput { node_id, key }) => {
                assert_eq!(node_id.as_str(), "train");
                assert_eq!(key.as_str(), "features");
            }
            other => panic!("expected UnresolvedInput, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_catalog_satisfies_input() {
        let catalog = DataCatalog::new(
            CatalogConfig::memory()
                .with_entry("features", EntryConfig::new("features/{run_id}.json")),
        )
        .unwrap();

        let workflow = WorkflowSpec::new(
            "from-catalog",
            vec![
                NodeDescriptor::compute("train", "fit")
                    .with_inputs(["features"])
                    .with_outputs(["model"]),
            ],
        )
        .unwrap();

        let plan = Scheduler::new().plan(&workflow, &ctx(), &catalog).unwrap();
        assert_eq!(plan.levels(), &[vec![NodeId::new("train")]]);
    }

    #[test]
    fn test_plan_condition_drops_node() {
        let workflow = WorkflowSpec::new(
            "conditional",
            vec![
                producer("always", "x"),
                producer("sometimes", "y").with_condition("extra"),
            ],
        )
        .unwrap();

        let without = Scheduler::new().plan(&workflow, &ctx(), &catalog()).unwrap();
        assert_eq!(without.node_count(), 1);

        let with = Scheduler::new()
            .plan(&workflow, &ctx().with_flag("extra", true), &catalog())
            .unwrap();
        assert_eq!(with.node_count(), 2);
    }

    #[test]
    fn test_plan_explicit_after_edge() {
        let workflow = WorkflowSpec::new(
            "ordered",
            vec![
                producer("setup", "x"),
                NodeDescriptor::compute("notify", "ping").with_after(["setup"]),
            ],
        )
        .unwrap();

        let plan = Scheduler::new().plan(&workflow, &ctx(), &catalog()).unwrap();
        assert_eq!(plan.level_of(&NodeId::new("setup")), Some(0));
        assert_eq!(plan.level_of(&NodeId::new("notify")), Some(1));
    }

    #[test]
    fn test_plan_after_unknown_node() {
        let workflow = WorkflowSpec::new(
            "ordered",
            vec![NodeDescriptor::compute("notify", "ping").with_after(["ghost"])],
        )
        .unwrap();

        assert!(matches!(
            Scheduler::new().plan(&workflow, &ctx(), &catalog()),
            Err(DependencyError::UnknownPredecessor { .. })
        ));
    }

    #[test]
    fn test_plan_after_condition_dropped_node_ignored() {
        let workflow = WorkflowSpec::new(
            "ordered",
            vec![
                producer("optional", "x").with_condition("extra"),
                NodeDescriptor::compute("notify", "ping").with_after(["optional"]),
            ],
        )
        .unwrap();

        let plan = Scheduler::new().plan(&workflow, &ctx(), &catalog()).unwrap();
        assert_eq!(plan.levels(), &[vec![NodeId::new("notify")]]);
    }

    #[test]
    fn test_plan_flatten_equivalent_to_flat() {
        let nested = WorkflowSpec::new(
            "prep",
            vec![
                NodeDescriptor::compute("stage", "scrub")
                    .with_inputs(["raw"])
                    .with_outputs(["staged"]),
                NodeDescriptor::compute("extract", "featurize")
                    .with_inputs(["staged"])
                    .with_outputs(["features"]),
            ],
        )
        .unwrap();
        let outer = WorkflowSpec::new(
            "outer",
            vec![
                producer("ingest", "raw"),
                NodeDescriptor::sub_workflow("prep", nested)
                    .with_inputs(["raw"])
                    .with_outputs(["features"]),
                NodeDescriptor::compute("train", "fit")
                    .with_inputs(["features"])
                    .with_outputs(["model"]),
            ],
        )
        .unwrap();

        let flat_equivalent = WorkflowSpec::new(
            "outer",
            vec![
                producer("ingest", "raw"),
                NodeDescriptor::compute("prep.stage", "scrub")
                    .with_inputs(["raw"])
                    .with_outputs(["prep.staged"]),
                NodeDescriptor::compute("prep.extract", "featurize")
                    .with_inputs(["prep.staged"])
                    .with_outputs(["features"]),
                NodeDescriptor::compute("train", "fit")
                    .with_inputs(["features"])
                    .with_outputs(["model"]),
            ],
        )
        .unwrap();

        let from_nested = Scheduler::new()
            .plan(&outer.flatten().unwrap(), &ctx(), &catalog())
            .unwrap();
        let from_flat = Scheduler::new()
            .plan(&flat_equivalent, &ctx(), &catalog())
            .unwrap();
        assert_eq!(from_nested.levels(), from_flat.levels());
    }
}
