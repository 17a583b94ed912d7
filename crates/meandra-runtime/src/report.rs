//! Lifecycle events and progress reporting.

use std::sync::Mutex;

use jiff::Timestamp;
use meandra_core::{NodeId, RunId};
use serde::{Deserialize, Serialize};

use crate::summary::RunOutcome;

/// Tracing target for reported lifecycle events.
const TRACING_TARGET: &str = "meandra_runtime::report";

/// A lifecycle event emitted by the orchestrator.
///
/// Events are emitted whether or not a reporter is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// A node was dispatched.
    NodeStarted {
        /// The dispatched node.
        node_id: NodeId,
        /// When dispatch happened.
        timestamp: Timestamp,
    },
    /// A node completed successfully.
    NodeFinished {
        /// The completed node.
        node_id: NodeId,
        /// When completion was observed.
        timestamp: Timestamp,
    },
    /// A node failed.
    NodeFailed {
        /// The failed node.
        node_id: NodeId,
        /// Error text.
        error: String,
        /// When the failure was observed.
        timestamp: Timestamp,
    },
    /// The run reached its final outcome.
    RunFinished {
        /// The run.
        run_id: RunId,
        /// Final outcome.
        outcome: RunOutcome,
        /// When the run finished.
        timestamp: Timestamp,
    },
}

impl RunEvent {
    /// Returns the event timestamp.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::NodeStarted { timestamp, .. }
            | Self::NodeFinished { timestamp, .. }
            | Self::NodeFailed { timestamp, .. }
            | Self::RunFinished { timestamp, .. } => *timestamp,
        }
    }
}

/// Receives lifecycle events from the orchestrator.
///
/// The reporter handle is passed explicitly through the orchestrator, not
/// held in process-wide state, so parallel runs report independently.
pub trait ProgressReporter: Send + Sync {
    /// Handles one event.
    fn report(&self, event: &RunEvent);
}

/// Reporter that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: &RunEvent) {}
}

/// Reporter that logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: &RunEvent) {
        match event {
            RunEvent::NodeStarted { node_id, .. } => {
                tracing::info!(target: TRACING_TARGET, node_id = %node_id, "Node started");
            }
            RunEvent::NodeFinished { node_id, .. } => {
                tracing::info!(target: TRACING_TARGET, node_id = %node_id, "Node finished");
            }
            RunEvent::NodeFailed { node_id, error, .. } => {
                tracing::error!(
                    target: TRACING_TARGET,
                    node_id = %node_id,
                    error = %error,
                    "Node failed"
                );
            }
            RunEvent::RunFinished { run_id, outcome, .. } => {
                tracing::info!(
                    target: TRACING_TARGET,
                    run_id = %run_id,
                    outcome = ?outcome,
                    "Run finished"
                );
            }
        }
    }
}

/// Reporter that collects events in memory, for inspection in tests and
/// programmatic callers.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<RunEvent>>,
}

impl MemoryReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the collected events.
    pub fn events(&self) -> Vec<RunEvent> {
        self.events
            .lock()
            .expect("reporter event lock poisoned")
            .clone()
    }
}

impl ProgressReporter for MemoryReporter {
    fn report(&self, event: &RunEvent) {
        self.events
            .lock()
            .expect("reporter event lock poisoned")
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_collects() {
        let reporter = MemoryReporter::new();
        reporter.report(&RunEvent::NodeStarted {
            node_id: NodeId::new("a"),
            timestamp: Timestamp::now(),
        });
        reporter.report(&RunEvent::NodeFinished {
            node_id: NodeId::new("a"),
            timestamp: Timestamp::now(),
        });

        let events = reporter.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], RunEvent::NodeStarted { .. }));
    }

    #[test]
    fn test_event_serde_tagged() {
        let event = RunEvent::NodeFailed {
            node_id: NodeId::new("train"),
            error: "boom".into(),
            timestamp: Timestamp::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "node_failed");
        assert_eq!(json["node_id"], "train");
    }
}
