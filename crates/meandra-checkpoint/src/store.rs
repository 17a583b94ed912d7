//! Checkpoint store interface.

use async_trait::async_trait;
use meandra_core::RunId;

use crate::error::CheckpointResult;
use crate::record::CheckpointRecord;

/// Persists per-node completion records for a run.
///
/// `append` must be durable before returning, and records for distinct
/// nodes must never interleave partially: each append is atomic.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Appends a record, durably.
    async fn append(&self, record: CheckpointRecord) -> CheckpointResult<()>;

    /// Loads all records for a run, in append order.
    ///
    /// A run with no records loads as an empty list. Corrupted or partially
    /// written records are discarded, never surfaced as completed nodes.
    async fn load(&self, run_id: &RunId) -> CheckpointResult<Vec<CheckpointRecord>>;
}
