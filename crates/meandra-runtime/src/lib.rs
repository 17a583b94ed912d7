#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod context;
mod engine;
mod error;
mod plan;
mod report;
mod scheduler;
mod summary;

#[doc(hidden)]
pub mod prelude;

pub use context::RunContext;
pub use engine::{FailurePolicy, Orchestrator, OrchestratorConfig, OrchestratorConfigBuilder};
pub use error::{DependencyError, ExecutionError, RunError, RunResult};
pub use plan::ExecutionPlan;
pub use report::{MemoryReporter, NoopReporter, ProgressReporter, RunEvent, TracingReporter};
pub use scheduler::Scheduler;
pub use summary::{NodeReport, RunOutcome, RunSummary};

/// Tracing target for runtime operations.
pub const TRACING_TARGET: &str = "meandra_runtime";
