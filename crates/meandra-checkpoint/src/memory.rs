//! In-memory checkpoint store.

use std::collections::HashMap;

use async_trait::async_trait;
use meandra_core::RunId;
use tokio::sync::Mutex;

use crate::error::CheckpointResult;
use crate::record::CheckpointRecord;
use crate::store::CheckpointStore;

/// Checkpoint store held entirely in memory.
///
/// Durable only for the process lifetime; useful for tests and for runs
/// that do not need crash recovery.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    records: Mutex<HashMap<RunId, Vec<CheckpointRecord>>>,
}

impl MemoryCheckpointStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn append(&self, record: CheckpointRecord) -> CheckpointResult<()> {
        self.records
            .lock()
            .await
            .entry(record.run_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn load(&self, run_id: &RunId) -> CheckpointResult<Vec<CheckpointRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .get(run_id)
            .cloned()
            .unwrap_or_default())
    }
}
