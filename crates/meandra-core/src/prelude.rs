//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use meandra_core::prelude::*;
//! ```

pub use crate::error::{ConfigError, ConfigResult};
pub use crate::key::{DataKey, RunId};
pub use crate::metadata::WorkflowMetadata;
pub use crate::node::{NodeBehavior, NodeDescriptor, NodeId};
pub use crate::params::{DataValue, Params};
pub use crate::registry::{Inputs, Invocation, NodeError, NodeKind, NodeRegistry, Outputs};
pub use crate::state::NodeRunState;
pub use crate::workflow::WorkflowSpec;
