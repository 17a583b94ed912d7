//! Orchestrator configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// How a node failure affects its not-yet-started siblings in the same
/// level. Across levels, failure always prevents dependents from starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Siblings keep running; the level completes before moving on.
    #[default]
    BestEffort,
    /// Stop dispatching further siblings; in-flight nodes finish and
    /// checkpoint normally.
    FailFast,
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct OrchestratorConfig {
    /// Maximum nodes executing concurrently within a level.
    #[builder(default = "4")]
    pub max_workers: usize,

    /// Reaction to a node failure within a level.
    #[builder(default)]
    pub failure_policy: FailurePolicy,
}

impl OrchestratorConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_workers {
            if max == 0 {
                return Err("max_workers must be at least 1".into());
            }
        }
        Ok(())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            failure_policy: FailurePolicy::default(),
        }
    }
}
