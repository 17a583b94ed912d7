//! Plan execution with checkpointing and resume.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use jiff::Timestamp;
use meandra_catalog::{DataCatalog, TemplateVars};
use meandra_checkpoint::{CheckpointRecord, CheckpointStore, OutputBinding};
use meandra_core::{
    ConfigError, DataKey, DataValue, Inputs, Invocation, NodeBehavior, NodeDescriptor, NodeError,
    NodeId, NodeKind, NodeRegistry, NodeRunState, RunId, WorkflowSpec,
};
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::config::{FailurePolicy, OrchestratorConfig};
use crate::context::RunContext;
use crate::error::{ExecutionError, RunResult};
use crate::plan::ExecutionPlan;
use crate::report::{NoopReporter, ProgressReporter, RunEvent};
use crate::scheduler::Scheduler;
use crate::summary::{NodeReport, RunOutcome, RunSummary};

/// Tracing target for engine operations.
const TRACING_TARGET: &str = "meandra_runtime::engine";

/// In-memory bindings produced earlier in the run, shared across workers.
type Bindings = Arc<RwLock<BTreeMap<DataKey, DataValue>>>;

/// Walks an execution plan: levels strictly in order, nodes within a level
/// on a bounded worker pool.
///
/// Per node, the orchestrator resolves inputs from in-memory bindings (or
/// the catalog), invokes the registered kind, persists outputs, appends a
/// checkpoint record, and emits lifecycle events. At start it loads the
/// run's existing checkpoints, so a resumed run re-executes only what never
/// completed.
pub struct Orchestrator {
    registry: Arc<NodeRegistry>,
    catalog: Arc<DataCatalog>,
    checkpoints: Arc<dyn CheckpointStore>,
    reporter: Arc<dyn ProgressReporter>,
    config: OrchestratorConfig,
    cancel_token: CancellationToken,
}

impl Orchestrator {
    /// Creates an orchestrator with default configuration and no reporter.
    pub fn new(
        registry: Arc<NodeRegistry>,
        catalog: Arc<DataCatalog>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            registry,
            catalog,
            checkpoints,
            reporter: Arc::new(NoopReporter),
            config: OrchestratorConfig::default(),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches a progress reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Uses an external cancellation token.
    ///
    /// Cancelling stops dispatching new nodes; in-flight nodes finish and
    /// checkpoint normally.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Returns the cancellation token driving this orchestrator.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Executes a workflow for a run.
    ///
    /// Structural errors (invalid description, unresolvable dependencies)
    /// abort before any node runs. Node failures do not: they are recorded,
    /// their dependents are skipped, and the aggregate lands in the
    /// [`RunSummary`].
    pub async fn run(&self, workflow: &WorkflowSpec, ctx: &RunContext) -> RunResult<RunSummary> {
        workflow.validate()?;
        let flat = workflow.flatten()?;
        self.validate_kinds(&flat)?;
        let plan = Scheduler::new().plan(&flat, ctx, &self.catalog)?;

        tracing::info!(
            target: TRACING_TARGET,
            run_id = %ctx.run_id(),
            workflow = %flat.id,
            nodes = plan.node_count(),
            levels = plan.level_count(),
            "Starting run"
        );

        let descriptors: HashMap<&NodeId, &NodeDescriptor> =
            flat.nodes.iter().map(|node| (&node.id, node)).collect();

        let mut states: HashMap<NodeId, NodeRunState> = plan
            .iter()
            .map(|id| (id.clone(), NodeRunState::Pending))
            .collect();
        let mut errors: HashMap<NodeId, String> = HashMap::new();
        let bindings: Bindings = Arc::new(RwLock::new(BTreeMap::new()));

        self.restore(ctx, &plan, &mut states, &bindings).await?;

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let mut executed: Vec<NodeId> = Vec::new();

        for level in plan.levels() {
            let to_run = self.classify_level(level, &plan, &descriptors, &mut states);
            if to_run.is_empty() {
                continue;
            }

            let level_failed = Arc::new(AtomicBool::new(false));
            let mut join_set: JoinSet<(NodeId, Result<(), String>)> = JoinSet::new();

            for descriptor in to_run {
                if self.cancel_token.is_cancelled() {
                    tracing::info!(
                        target: TRACING_TARGET,
                        run_id = %ctx.run_id(),
                        "Cancellation requested, no further nodes dispatched"
                    );
                    break;
                }
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                // Checked after the permit wait: a sibling may have failed
                // while this slot was blocked.
                if self.config.failure_policy == FailurePolicy::FailFast
                    && level_failed.load(Ordering::Acquire)
                {
                    break;
                }

                states.insert(descriptor.id.clone(), NodeRunState::Running);
                let task = NodeTask {
                    run_id: ctx.run_id().clone(),
                    descriptor: descriptor.clone(),
                    kind: self.registry.get(kind_of(descriptor))?,
                    catalog: Arc::clone(&self.catalog),
                    checkpoints: Arc::clone(&self.checkpoints),
                    reporter: Arc::clone(&self.reporter),
                    bindings: Arc::clone(&bindings),
                    vars: ctx.vars().clone(),
                    level_failed: Arc::clone(&level_failed),
                };
                join_set.spawn(async move {
                    let _permit = permit;
                    task.run().await
                });
            }

            // Level barrier: the next level starts only after every node
            // dispatched here reached a terminal state.
            while let Some(joined) = join_set.join_next().await {
                let Ok((node_id, result)) = joined else {
                    continue;
                };
                match result {
                    Ok(()) => {
                        states.insert(node_id.clone(), NodeRunState::Succeeded);
                        executed.push(node_id);
                    }
                    Err(error) => {
                        states.insert(node_id.clone(), NodeRunState::Failed);
                        errors.insert(node_id.clone(), error);
                        executed.push(node_id);
                    }
                }
            }

            // Nodes marked ready but never dispatched (cancellation or
            // fail-fast) go back to pending; a resume picks them up.
            for node_id in level {
                if states.get(node_id) == Some(&NodeRunState::Ready) {
                    states.insert(node_id.clone(), NodeRunState::Pending);
                }
            }
        }

        let summary = self.summarize(ctx.run_id().clone(), &plan, states, errors, executed);

        self.reporter.report(&RunEvent::RunFinished {
            run_id: summary.run_id.clone(),
            outcome: summary.outcome.clone(),
            timestamp: Timestamp::now(),
        });
        tracing::info!(
            target: TRACING_TARGET,
            run_id = %summary.run_id,
            succeeded = summary.succeeded(),
            executed = summary.executed.len(),
            "Run finished"
        );

        Ok(summary)
    }

    /// Checks every compute node's kind exists and accepts its parameters.
    fn validate_kinds(&self, workflow: &WorkflowSpec) -> Result<(), ConfigError> {
        for node in &workflow.nodes {
            if let NodeBehavior::Compute(compute) = &node.behavior {
                let kind = self.registry.get(&compute.kind)?;
                kind.validate(&node.params)
                    .map_err(|message| ConfigError::InvalidParams {
                        node_id: node.id.clone(),
                        message,
                    })?;
            }
        }
        Ok(())
    }

    /// Loads checkpoint records for the run and restores completed nodes:
    /// their states become succeeded and their recorded bindings are put
    /// back into memory (or re-registered with the catalog).
    async fn restore(
        &self,
        ctx: &RunContext,
        plan: &ExecutionPlan,
        states: &mut HashMap<NodeId, NodeRunState>,
        bindings: &Bindings,
    ) -> RunResult<()> {
        let records = self.checkpoints.load(ctx.run_id()).await?;
        if records.is_empty() {
            return Ok(());
        }

        // Later records win: a node retried after a failure is judged by
        // its most recent completion.
        let mut latest: HashMap<NodeId, CheckpointRecord> = HashMap::new();
        for record in records {
            if states.contains_key(&record.node_id) {
                latest.insert(record.node_id.clone(), record);
            }
        }

        let mut restored = 0usize;
        for (node_id, record) in latest {
            if record.state != NodeRunState::Succeeded {
                continue;
            }
            states.insert(node_id, NodeRunState::Succeeded);
            restored += 1;

            let mut guard = bindings.write().await;
            for (key, binding) in record.output_bindings {
                match binding {
                    OutputBinding::Inline { value } => {
                        guard.insert(key, value);
                    }
                    OutputBinding::Stored { location } => {
                        self.catalog.register_location(&key, location);
                    }
                }
            }
        }

        if restored > 0 {
            tracing::info!(
                target: TRACING_TARGET,
                run_id = %ctx.run_id(),
                restored,
                of = plan.node_count(),
                "Restored completed nodes from checkpoints"
            );
        }

        Ok(())
    }

    /// Decides what happens to each node of a level: restored nodes stand,
    /// nodes downstream of a failure become skipped, nodes with incomplete
    /// predecessors stay pending, the rest become ready for dispatch.
    fn classify_level<'flat>(
        &self,
        level: &[NodeId],
        plan: &ExecutionPlan,
        descriptors: &HashMap<&NodeId, &'flat NodeDescriptor>,
        states: &mut HashMap<NodeId, NodeRunState>,
    ) -> Vec<&'flat NodeDescriptor> {
        let mut to_run = Vec::new();

        for node_id in level {
            if states.get(node_id) == Some(&NodeRunState::Succeeded) {
                continue;
            }

            let preds = plan.predecessors_of(node_id);
            let upstream_failure = preds.iter().any(|pred| {
                matches!(
                    states.get(pred),
                    Some(NodeRunState::Failed | NodeRunState::Skipped)
                )
            });
            if upstream_failure {
                states.insert(node_id.clone(), NodeRunState::Skipped);
                tracing::debug!(
                    target: TRACING_TARGET,
                    node_id = %node_id,
                    "Node skipped, upstream dependency failed"
                );
                continue;
            }

            let upstream_incomplete = preds
                .iter()
                .any(|pred| states.get(pred) != Some(&NodeRunState::Succeeded));
            if upstream_incomplete || self.cancel_token.is_cancelled() {
                // Stays pending; a resume schedules it again.
                continue;
            }

            if let Some(descriptor) = descriptors.get(node_id) {
                states.insert(node_id.clone(), NodeRunState::Ready);
                to_run.push(*descriptor);
            }
        }

        to_run
    }

    fn summarize(
        &self,
        run_id: RunId,
        plan: &ExecutionPlan,
        states: HashMap<NodeId, NodeRunState>,
        errors: HashMap<NodeId, String>,
        executed: Vec<NodeId>,
    ) -> RunSummary {
        let mut nodes = BTreeMap::new();
        let mut root_causes = Vec::new();
        let mut incomplete = false;

        for node_id in plan.iter() {
            let state = states
                .get(node_id)
                .copied()
                .unwrap_or(NodeRunState::Pending);
            let report = match state {
                NodeRunState::Failed => {
                    root_causes.push(node_id.clone());
                    match errors.get(node_id) {
                        Some(error) => NodeReport::failed(error.clone()),
                        None => NodeReport::new(state),
                    }
                }
                NodeRunState::Succeeded | NodeRunState::Skipped => NodeReport::new(state),
                _ => {
                    incomplete = true;
                    NodeReport::new(state)
                }
            };
            nodes.insert(node_id.clone(), report);
        }

        let outcome = if !root_causes.is_empty() {
            RunOutcome::Failed { root_causes }
        } else if incomplete {
            // Cancelled before every node could be dispatched.
            RunOutcome::Failed {
                root_causes: Vec::new(),
            }
        } else {
            RunOutcome::Succeeded
        };

        RunSummary {
            run_id,
            outcome,
            nodes,
            executed,
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .finish()
    }
}

/// Returns the kind name of a compute descriptor.
///
/// Sub-workflow nodes cannot reach execution: the plan is built from a
/// flattened workflow.
fn kind_of(descriptor: &NodeDescriptor) -> &str {
    match &descriptor.behavior {
        NodeBehavior::Compute(compute) => &compute.kind,
        NodeBehavior::SubWorkflow(_) => "",
    }
}

/// One node's execution: input resolution, invocation, persistence,
/// checkpointing, and event emission.
struct NodeTask {
    run_id: RunId,
    descriptor: NodeDescriptor,
    kind: Arc<dyn NodeKind>,
    catalog: Arc<DataCatalog>,
    checkpoints: Arc<dyn CheckpointStore>,
    reporter: Arc<dyn ProgressReporter>,
    bindings: Bindings,
    vars: TemplateVars,
    level_failed: Arc<AtomicBool>,
}

impl NodeTask {
    async fn run(self) -> (NodeId, Result<(), String>) {
        let node_id = self.descriptor.id.clone();

        self.reporter.report(&RunEvent::NodeStarted {
            node_id: node_id.clone(),
            timestamp: Timestamp::now(),
        });
        tracing::debug!(
            target: TRACING_TARGET,
            run_id = %self.run_id,
            node_id = %node_id,
            "Node started"
        );

        let result = std::panic::AssertUnwindSafe(self.execute())
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(ExecutionError::Node(NodeError::message(
                    "node computation panicked",
                )))
            });

        match result {
            Ok(()) => {
                self.reporter.report(&RunEvent::NodeFinished {
                    node_id: node_id.clone(),
                    timestamp: Timestamp::now(),
                });
                tracing::debug!(
                    target: TRACING_TARGET,
                    run_id = %self.run_id,
                    node_id = %node_id,
                    "Node finished"
                );
                (node_id, Ok(()))
            }
            Err(error) => {
                self.level_failed.store(true, Ordering::Release);
                let text = error.to_string();

                let record =
                    CheckpointRecord::failed(self.run_id.clone(), node_id.clone(), &text);
                if let Err(err) = self.checkpoints.append(record).await {
                    tracing::error!(
                        target: TRACING_TARGET,
                        run_id = %self.run_id,
                        node_id = %node_id,
                        error = %err,
                        "Could not checkpoint node failure"
                    );
                }

                self.reporter.report(&RunEvent::NodeFailed {
                    node_id: node_id.clone(),
                    error: text.clone(),
                    timestamp: Timestamp::now(),
                });
                tracing::error!(
                    target: TRACING_TARGET,
                    run_id = %self.run_id,
                    node_id = %node_id,
                    error = %text,
                    "Node failed"
                );
                (node_id, Err(text))
            }
        }
    }

    async fn execute(&self) -> Result<(), ExecutionError> {
        let mut inputs = Inputs::new();
        for key in &self.descriptor.input_keys {
            let bound = {
                let guard = self.bindings.read().await;
                guard.get(key).cloned()
            };
            let value = match bound {
                Some(value) => value,
                None => self.catalog.get(key, &self.vars).await?,
            };
            inputs.insert(key.clone(), value);
        }

        let invocation = Invocation {
            node_id: self.descriptor.id.clone(),
            input_keys: self.descriptor.input_keys.clone(),
            output_keys: self.descriptor.output_keys.clone(),
            inputs,
            params: self.descriptor.params.clone(),
        };
        let outputs = self
            .kind
            .execute(invocation)
            .await
            .map_err(ExecutionError::Node)?;

        let mut record_bindings = BTreeMap::new();
        for key in &self.descriptor.output_keys {
            let Some(value) = outputs.get(key) else {
                return Err(ExecutionError::MissingOutput { key: key.clone() });
            };
            let binding = if self.catalog.is_persistent(key) {
                let entry = self.catalog.put(key, value, &self.vars).await?;
                OutputBinding::Stored {
                    location: entry.location,
                }
            } else {
                OutputBinding::Inline {
                    value: value.clone(),
                }
            };
            record_bindings.insert(key.clone(), binding);
        }

        let record = CheckpointRecord::succeeded(
            self.run_id.clone(),
            self.descriptor.id.clone(),
            record_bindings,
        );
        self.checkpoints.append(record).await?;

        let mut guard = self.bindings.write().await;
        for key in &self.descriptor.output_keys {
            if let Some(value) = outputs.get(key) {
                guard.insert(key.clone(), value.clone());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunError;
    use crate::report::MemoryReporter;
    use meandra_catalog::{CatalogConfig, EntryConfig};
    use meandra_checkpoint::MemoryCheckpointStore;
    use meandra_core::{Outputs, Params};
    use serde_json::json;

    fn registry() -> Arc<NodeRegistry> {
        let mut registry = NodeRegistry::with_builtins();
        registry.register_fn("double", |invocation| {
            let value = invocation.input(&invocation.input_keys[0])?;
            let doubled = value
                .as_i64()
                .ok_or_else(|| NodeError::message("input is not an integer"))?
                * 2;
            Ok(Outputs::from([(
                invocation.output_keys[0].clone(),
                json!(doubled),
            )]))
        });
        registry.register_fn("sum", |invocation| {
            let mut total = 0;
            for key in &invocation.input_keys {
                total += invocation
                    .input(key)?
                    .as_i64()
                    .ok_or_else(|| NodeError::message("input is not an integer"))?;
            }
            Ok(Outputs::from([(
                invocation.output_keys[0].clone(),
                json!(total),
            )]))
        });
        registry.register_fn("boom", |_invocation| {
            Err(NodeError::message("deliberate failure"))
        });
        Arc::new(registry)
    }

    fn memory_catalog() -> Arc<DataCatalog> {
        Arc::new(DataCatalog::new(CatalogConfig::memory()).unwrap())
    }

    fn orchestrator(catalog: Arc<DataCatalog>, checkpoints: Arc<dyn CheckpointStore>) -> Orchestrator {
        Orchestrator::new(registry(), catalog, checkpoints)
    }

    fn constant(id: &str, key: &str, value: i64) -> NodeDescriptor {
        NodeDescriptor::compute(id, "constant")
            .with_params(Params::new().with(key, value))
            .with_outputs([key])
    }

    /// a -> x, b: x -> y
    fn chain_workflow() -> WorkflowSpec {
        WorkflowSpec::new(
            "chain",
            vec![
                constant("a", "x", 21),
                NodeDescriptor::compute("b", "double")
                    .with_inputs(["x"])
                    .with_outputs(["y"]),
            ],
        )
        .unwrap()
    }

    /// a -> x, b -> y, c: x + y -> z
    fn fan_in_workflow(failing_producer: bool) -> WorkflowSpec {
        let a = if failing_producer {
            NodeDescriptor::compute("a", "boom").with_outputs(["x"])
        } else {
            constant("a", "x", 1)
        };
        WorkflowSpec::new(
            "fan-in",
            vec![
                a,
                constant("b", "y", 2),
                NodeDescriptor::compute("c", "sum")
                    .with_inputs(["x", "y"])
                    .with_outputs(["z"]),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_chain_succeeds() {
        let reporter = Arc::new(MemoryReporter::new());
        let orchestrator = orchestrator(memory_catalog(), Arc::new(MemoryCheckpointStore::new()))
            .with_reporter(reporter.clone());

        let summary = orchestrator
            .run(&chain_workflow(), &RunContext::new("run-1"))
            .await
            .unwrap();

        assert!(summary.succeeded());
        assert_eq!(summary.executed, vec![NodeId::new("a"), NodeId::new("b")]);
        assert_eq!(
            summary.nodes_in_state(NodeRunState::Succeeded).len(),
            2
        );

        let events = reporter.events();
        let labels: Vec<&str> = events
            .iter()
            .map(|event| match event {
                RunEvent::NodeStarted { .. } => "started",
                RunEvent::NodeFinished { .. } => "finished",
                RunEvent::NodeFailed { .. } => "failed",
                RunEvent::RunFinished { .. } => "run_finished",
            })
            .collect();
        assert_eq!(
            labels,
            vec!["started", "finished", "started", "finished", "run_finished"]
        );
    }

    #[tokio::test]
    async fn test_run_failure_cascades_to_dependents() {
        let orchestrator = orchestrator(memory_catalog(), Arc::new(MemoryCheckpointStore::new()));

        let summary = orchestrator
            .run(&fan_in_workflow(true), &RunContext::new("run-1"))
            .await
            .unwrap();

        assert_eq!(
            summary.outcome,
            RunOutcome::Failed {
                root_causes: vec![NodeId::new("a")],
            }
        );
        assert_eq!(summary.nodes[&NodeId::new("a")].state, NodeRunState::Failed);
        assert_eq!(
            summary.nodes[&NodeId::new("a")].error.as_deref(),
            Some("computation failed: deliberate failure")
        );
        // the sibling still ran to completion, the dependent never started
        assert_eq!(summary.nodes[&NodeId::new("b")].state, NodeRunState::Succeeded);
        assert_eq!(summary.nodes[&NodeId::new("c")].state, NodeRunState::Skipped);
        assert!(!summary.executed.contains(&NodeId::new("c")));
    }

    #[tokio::test]
    async fn test_run_persists_configured_keys() {
        let catalog = Arc::new(
            DataCatalog::new(
                CatalogConfig::memory().with_entry("y", EntryConfig::new("out/{run_id}/y.json")),
            )
            .unwrap(),
        );
        let orchestrator = orchestrator(catalog.clone(), Arc::new(MemoryCheckpointStore::new()));

        let ctx = RunContext::new("run-1");
        let summary = orchestrator.run(&chain_workflow(), &ctx).await.unwrap();
        assert!(summary.succeeded());

        let value = catalog.get(&DataKey::new("y"), ctx.vars()).await.unwrap();
        assert_eq!(value, json!(42));
    }

    #[tokio::test]
    async fn test_resume_is_idempotent() {
        let catalog = memory_catalog();
        let checkpoints: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
        let ctx = RunContext::new("run-1");

        let first = orchestrator(catalog.clone(), checkpoints.clone());
        let summary = first.run(&chain_workflow(), &ctx).await.unwrap();
        assert!(summary.succeeded());
        assert_eq!(summary.executed.len(), 2);

        // Same run ID again: nothing executes, outcome is immediate.
        let second = orchestrator(catalog, checkpoints);
        let summary = second.run(&chain_workflow(), &ctx).await.unwrap();
        assert!(summary.succeeded());
        assert!(summary.executed.is_empty());
        assert_eq!(summary.nodes_in_state(NodeRunState::Succeeded).len(), 2);
    }

    #[tokio::test]
    async fn test_resume_after_failure_runs_only_missing_nodes() {
        // `x` is persistent, `y` is memory-only, so resume exercises both
        // stored and inline binding restoration.
        let config = CatalogConfig::memory()
            .with_entry("x", EntryConfig::new("data/{run_id}/x.json"))
            .with_entry("z", EntryConfig::new("data/{run_id}/z.json"));
        let catalog = Arc::new(DataCatalog::new(config).unwrap());
        let checkpoints: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
        let ctx = RunContext::new("run-1");

        // First attempt: the fan-in node fails, its producers succeed.
        let mut broken = NodeRegistry::with_builtins();
        broken.register_fn("sum", |_invocation| {
            Err(NodeError::message("interrupted"))
        });
        let first = Orchestrator::new(Arc::new(broken), catalog.clone(), checkpoints.clone());
        let summary = first.run(&fan_in_workflow(false), &ctx).await.unwrap();
        assert!(!summary.succeeded());
        assert_eq!(summary.nodes[&NodeId::new("c")].state, NodeRunState::Failed);

        // Resume with a working registry: only the failed node re-runs.
        let second = orchestrator(catalog.clone(), checkpoints);
        let summary = second.run(&fan_in_workflow(false), &ctx).await.unwrap();
        assert!(summary.succeeded());
        assert_eq!(summary.executed, vec![NodeId::new("c")]);

        // Final catalog contents match an uninterrupted run of the same
        // workflow and inputs.
        let resumed = catalog.get(&DataKey::new("z"), ctx.vars()).await.unwrap();

        let fresh_catalog = Arc::new(
            DataCatalog::new(
                CatalogConfig::memory()
                    .with_entry("x", EntryConfig::new("data/{run_id}/x.json"))
                    .with_entry("z", EntryConfig::new("data/{run_id}/z.json")),
            )
            .unwrap(),
        );
        let uninterrupted_ctx = RunContext::new("run-2");
        let uninterrupted = orchestrator(
            fresh_catalog.clone(),
            Arc::new(MemoryCheckpointStore::new()),
        );
        uninterrupted
            .run(&fan_in_workflow(false), &uninterrupted_ctx)
            .await
            .unwrap();
        let baseline = fresh_catalog
            .get(&DataKey::new("z"), uninterrupted_ctx.vars())
            .await
            .unwrap();

        assert_eq!(resumed, baseline);
    }

    #[tokio::test]
    async fn test_cancellation_stops_dispatch() {
        let orchestrator = orchestrator(memory_catalog(), Arc::new(MemoryCheckpointStore::new()));
        orchestrator.cancel_token().cancel();

        let summary = orchestrator
            .run(&chain_workflow(), &RunContext::new("run-1"))
            .await
            .unwrap();

        assert!(!summary.succeeded());
        assert!(summary.executed.is_empty());
        assert_eq!(summary.nodes_in_state(NodeRunState::Pending).len(), 2);
        assert_eq!(
            summary.outcome,
            RunOutcome::Failed {
                root_causes: Vec::new(),
            }
        );
    }

    #[tokio::test]
    async fn test_fail_fast_leaves_siblings_pending() {
        let workflow = WorkflowSpec::new(
            "wide",
            vec![
                NodeDescriptor::compute("f", "boom").with_outputs(["x"]),
                constant("g", "y", 1),
                constant("h", "z", 2),
            ],
        )
        .unwrap();

        let config = OrchestratorConfig {
            max_workers: 1,
            failure_policy: FailurePolicy::FailFast,
        };
        let orchestrator = orchestrator(memory_catalog(), Arc::new(MemoryCheckpointStore::new()))
            .with_config(config);

        let summary = orchestrator
            .run(&workflow, &RunContext::new("run-1"))
            .await
            .unwrap();

        assert_eq!(
            summary.outcome,
            RunOutcome::Failed {
                root_causes: vec![NodeId::new("f")],
            }
        );
        assert_eq!(summary.executed, vec![NodeId::new("f")]);
        assert_eq!(summary.nodes[&NodeId::new("g")].state, NodeRunState::Pending);
        assert_eq!(summary.nodes[&NodeId::new("h")].state, NodeRunState::Pending);
    }

    #[tokio::test]
    async fn test_structural_errors_abort_before_execution() {
        let reporter = Arc::new(MemoryReporter::new());
        let orchestrator = orchestrator(memory_catalog(), Arc::new(MemoryCheckpointStore::new()))
            .with_reporter(reporter.clone());

        let unknown_kind = WorkflowSpec::new(
            "unknown",
            vec![NodeDescriptor::compute("a", "no_such_kind").with_outputs(["x"])],
        )
        .unwrap();
        let result = orchestrator
            .run(&unknown_kind, &RunContext::new("run-1"))
            .await;
        match result {
            Err(error @ RunError::Config(_)) => assert!(error.is_structural()),
            other => panic!("expected Config error, got {other:?}"),
        }

        let dangling = WorkflowSpec::new(
            "dangling",
            vec![
                NodeDescriptor::compute("a", "double")
                    .with_inputs(["missing"])
                    .with_outputs(["x"]),
            ],
        )
        .unwrap();
        let result = orchestrator.run(&dangling, &RunContext::new("run-1")).await;
        match result {
            Err(error @ RunError::Dependency(_)) => assert!(error.is_structural()),
            other => panic!("expected Dependency error, got {other:?}"),
        }

        assert!(reporter.events().is_empty());
    }

    #[tokio::test]
    async fn test_nested_workflow_runs_end_to_end() {
        let nested = WorkflowSpec::new(
            "inner",
            vec![
                NodeDescriptor::compute("double", "double")
                    .with_inputs(["x"])
                    .with_outputs(["y"]),
            ],
        )
        .unwrap();
        let workflow = WorkflowSpec::new(
            "outer",
            vec![
                constant("seed", "x", 5),
                NodeDescriptor::sub_workflow("scale", nested)
                    .with_inputs(["x"])
                    .with_outputs(["y"]),
                NodeDescriptor::compute("final", "double")
                    .with_inputs(["y"])
                    .with_outputs(["out"]),
            ],
        )
        .unwrap();

        let catalog = Arc::new(
            DataCatalog::new(
                CatalogConfig::memory().with_entry("out", EntryConfig::new("{run_id}/out.json")),
            )
            .unwrap(),
        );
        let orchestrator = orchestrator(catalog.clone(), Arc::new(MemoryCheckpointStore::new()));

        let ctx = RunContext::new("run-1");
        let summary = orchestrator.run(&workflow, &ctx).await.unwrap();
        assert!(summary.succeeded());
        assert!(summary.nodes.contains_key(&NodeId::new("scale.double")));

        let value = catalog.get(&DataKey::new("out"), ctx.vars()).await.unwrap();
        assert_eq!(value, json!(20));
    }
}
