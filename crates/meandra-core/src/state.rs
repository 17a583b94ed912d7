//! Node lifecycle states.

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Lifecycle state of a node within a run.
///
/// `Pending` at plan load, `Ready` once every dependency has succeeded,
/// `Running` when dispatched, then terminal `Succeeded` or `Failed`.
/// Dependents of a failed node become `Skipped` and never reach `Ready`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NodeRunState {
    /// Waiting for dependencies to complete.
    Pending,
    /// All dependencies succeeded; eligible for dispatch.
    Ready,
    /// Currently executing.
    Running,
    /// Completed successfully.
    Succeeded,
    /// Computation or I/O failed.
    Failed,
    /// Never ran because an upstream dependency failed.
    Skipped,
}

impl NodeRunState {
    /// Returns whether the state is terminal.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }

    /// Returns whether the node completed successfully.
    pub const fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}
