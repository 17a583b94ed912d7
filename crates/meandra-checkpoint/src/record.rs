//! Checkpoint records.

use std::collections::BTreeMap;

use jiff::Timestamp;
use meandra_core::{DataKey, DataValue, NodeId, NodeRunState, RunId};
use serde::{Deserialize, Serialize};

/// Where a produced value ended up when its node completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputBinding {
    /// Value captured directly in the record.
    Inline {
        /// The produced value.
        value: DataValue,
    },
    /// Value persisted at a resolved catalog location.
    Stored {
        /// Location relative to the catalog backend root.
        location: String,
    },
}

/// Durable record of one node's completion within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// The run this record belongs to.
    pub run_id: RunId,
    /// The node that completed.
    pub node_id: NodeId,
    /// Terminal state the node reached.
    pub state: NodeRunState,
    /// Bindings for the node's outputs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub output_bindings: BTreeMap<DataKey, OutputBinding>,
    /// Error text for failed nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the record was produced.
    pub timestamp: Timestamp,
}

impl CheckpointRecord {
    /// Creates a record for a node that succeeded.
    pub fn succeeded(
        run_id: RunId,
        node_id: NodeId,
        output_bindings: BTreeMap<DataKey, OutputBinding>,
    ) -> Self {
        Self {
            run_id,
            node_id,
            state: NodeRunState::Succeeded,
            output_bindings,
            error: None,
            timestamp: Timestamp::now(),
        }
    }

    /// Creates a record for a node that failed.
    pub fn failed(run_id: RunId, node_id: NodeId, error: impl Into<String>) -> Self {
        Self {
            run_id,
            node_id,
            state: NodeRunState::Failed,
            output_bindings: BTreeMap::new(),
            error: Some(error.into()),
            timestamp: Timestamp::now(),
        }
    }
}
