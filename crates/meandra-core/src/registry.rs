//! Node kind registry for in-process dispatch.
//!
//! A kind name on a compute node selects behavior at run time through a
//! registry of [`NodeKind`] capabilities, so new computations can be added
//! without touching the resolver or the orchestrator.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{ConfigError, ConfigResult};
use crate::key::DataKey;
use crate::node::NodeId;
use crate::params::{DataValue, Params};

/// Resolved input bindings handed to a node, keyed by data key.
pub type Inputs = BTreeMap<DataKey, DataValue>;

/// Output bindings returned by a node, keyed by data key.
pub type Outputs = BTreeMap<DataKey, DataValue>;

/// Error returned by a node computation.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Computation failed with a message.
    #[error("{0}")]
    Message(String),

    /// Computation failed with an underlying error.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl NodeError {
    /// Creates a new message error.
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}

/// Everything a node kind receives when invoked.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// ID of the node being executed.
    pub node_id: NodeId,
    /// Declared input keys in declaration order.
    pub input_keys: Vec<DataKey>,
    /// Declared output keys in declaration order.
    pub output_keys: Vec<DataKey>,
    /// Resolved input values.
    pub inputs: Inputs,
    /// Node parameters.
    pub params: Params,
}

impl Invocation {
    /// Returns the input value for a key.
    pub fn input(&self, key: &DataKey) -> Result<&DataValue, NodeError> {
        self.inputs
            .get(key)
            .ok_or_else(|| NodeError::message(format!("missing input: {key}")))
    }
}

/// A registered computation: parameter validation plus execution.
#[async_trait]
pub trait NodeKind: Send + Sync {
    /// Validates node parameters before any node runs.
    fn validate(&self, params: &Params) -> Result<(), String> {
        let _ = params;
        Ok(())
    }

    /// Executes the computation with resolved inputs.
    async fn execute(&self, invocation: Invocation) -> Result<Outputs, NodeError>;
}

/// Function-backed node kind.
struct FnKind<F> {
    func: F,
}

#[async_trait]
impl<F> NodeKind for FnKind<F>
where
    F: Fn(Invocation) -> Result<Outputs, NodeError> + Send + Sync,
{
    async fn execute(&self, invocation: Invocation) -> Result<Outputs, NodeError> {
        (self.func)(invocation)
    }
}

/// Emits one output per declared output key, taken from the node's params.
struct ConstantKind;

#[async_trait]
impl NodeKind for ConstantKind {
    async fn execute(&self, invocation: Invocation) -> Result<Outputs, NodeError> {
        invocation
            .output_keys
            .iter()
            .map(|key| {
                let value = invocation
                    .params
                    .get(key.as_str())
                    .cloned()
                    .ok_or_else(|| NodeError::message(format!("no param for output {key}")))?;
                Ok((key.clone(), value))
            })
            .collect()
    }
}

/// Forwards input values to output keys positionally.
struct RenameKind;

#[async_trait]
impl NodeKind for RenameKind {
    async fn execute(&self, invocation: Invocation) -> Result<Outputs, NodeError> {
        if invocation.input_keys.len() != invocation.output_keys.len() {
            return Err(NodeError::message(format!(
                "rename maps {} inputs onto {} outputs",
                invocation.input_keys.len(),
                invocation.output_keys.len()
            )));
        }
        invocation
            .input_keys
            .iter()
            .zip(invocation.output_keys.iter())
            .map(|(from, to)| Ok((to.clone(), invocation.input(from)?.clone())))
            .collect()
    }
}

/// Registry mapping kind names to node capabilities.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    kinds: HashMap<String, Arc<dyn NodeKind>>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-loaded with the builtin kinds
    /// `constant` and `rename`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("constant", ConstantKind);
        registry.register("rename", RenameKind);
        registry
    }

    /// Registers a kind, replacing any existing one with the same name.
    pub fn register(&mut self, name: impl Into<String>, kind: impl NodeKind + 'static) -> &mut Self {
        self.kinds.insert(name.into(), Arc::new(kind));
        self
    }

    /// Registers a function-backed kind.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(Invocation) -> Result<Outputs, NodeError> + Send + Sync + 'static,
    {
        self.register(name, FnKind { func })
    }

    /// Returns the kind registered under a name.
    pub fn get(&self, kind: &str) -> ConfigResult<Arc<dyn NodeKind>> {
        self.kinds
            .get(kind)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownKind {
                kind: kind.to_owned(),
            })
    }

    /// Returns whether a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Returns the registered kind names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .finish()
    }
}
