//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use meandra_checkpoint::prelude::*;
//! ```

pub use crate::error::{CheckpointError, CheckpointResult};
pub use crate::file::FileCheckpointStore;
pub use crate::memory::MemoryCheckpointStore;
pub use crate::record::{CheckpointRecord, OutputBinding};
pub use crate::store::CheckpointStore;
