#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod key;
mod metadata;
mod node;
mod params;
mod registry;
mod state;
mod workflow;

#[doc(hidden)]
pub mod prelude;

pub use error::{ConfigError, ConfigResult};
pub use key::{DataKey, RunId};
pub use metadata::WorkflowMetadata;
pub use node::{ComputeNode, NodeBehavior, NodeDescriptor, NodeId, SubWorkflowNode};
pub use params::{DataValue, Params};
pub use registry::{Inputs, Invocation, NodeError, NodeKind, NodeRegistry, Outputs};
pub use state::NodeRunState;
pub use workflow::WorkflowSpec;

/// Tracing target for workflow model operations.
pub const TRACING_TARGET: &str = "meandra_core";
