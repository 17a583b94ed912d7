//! Filesystem-backed checkpoint store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use meandra_core::RunId;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::TRACING_TARGET;
use crate::error::CheckpointResult;
use crate::record::CheckpointRecord;
use crate::store::CheckpointStore;

/// Append-only checkpoint store writing one JSON record per line.
///
/// Records for a run live in `<root>/<run_id>.jsonl`. Appends take the
/// run's lock and fsync before returning, so a record is either fully on
/// disk or not present at all; a torn write from a crash shows up as a
/// malformed trailing line and is discarded on load. Locks are per run
/// file, so concurrent runs sharing a store never contend.
pub struct FileCheckpointStore {
    root: PathBuf,
    run_locks: Mutex<HashMap<RunId, Arc<Mutex<()>>>>,
}

impl FileCheckpointStore {
    /// Creates a store rooted at a directory.
    ///
    /// The directory is created on first append.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            run_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run_path(&self, run_id: &RunId) -> PathBuf {
        self.root.join(format!("{run_id}.jsonl"))
    }

    async fn run_lock(&self, run_id: &RunId) -> Arc<Mutex<()>> {
        let mut locks = self.run_locks.lock().await;
        locks
            .entry(run_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn append(&self, record: CheckpointRecord) -> CheckpointResult<()> {
        let line = serde_json::to_string(&record)?;
        let path = self.run_path(&record.run_id);

        let lock = self.run_lock(&record.run_id).await;
        let _guard = lock.lock().await;
        tokio::fs::create_dir_all(&self.root).await?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        // A leading separator keeps this record parseable even if the
        // previous append was torn mid-line by a crash. Blank lines are
        // skipped on load.
        if file.metadata().await?.len() > 0 {
            file.write_all(b"\n").await?;
        }
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.sync_all().await?;

        tracing::debug!(
            target: TRACING_TARGET,
            run_id = %record.run_id,
            node_id = %record.node_id,
            state = %record.state,
            "Checkpoint record appended"
        );

        Ok(())
    }

    async fn load(&self, run_id: &RunId) -> CheckpointResult<Vec<CheckpointRecord>> {
        let path = self.run_path(run_id);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut records = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CheckpointRecord>(line) {
                Ok(record) => records.push(record),
                Err(err) => {
                    // Torn or corrupted record: the node counts as not
                    // completed and will be scheduled again.
                    tracing::warn!(
                        target: TRACING_TARGET,
                        run_id = %run_id,
                        line = line_no + 1,
                        error = %err,
                        "Discarding corrupt checkpoint record"
                    );
                }
            }
        }

        Ok(records)
    }
}

impl std::fmt::Debug for FileCheckpointStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCheckpointStore")
            .field("root", &self.root)
            .finish()
    }
}
