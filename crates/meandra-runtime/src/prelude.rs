//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use meandra_runtime::prelude::*;
//! ```

pub use crate::context::RunContext;
pub use crate::engine::{FailurePolicy, Orchestrator, OrchestratorConfig};
pub use crate::error::{DependencyError, ExecutionError, RunError, RunResult};
pub use crate::plan::ExecutionPlan;
pub use crate::report::{NoopReporter, ProgressReporter, RunEvent, TracingReporter};
pub use crate::scheduler::Scheduler;
pub use crate::summary::{NodeReport, RunOutcome, RunSummary};
