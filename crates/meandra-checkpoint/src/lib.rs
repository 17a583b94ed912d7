#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod file;
mod memory;
mod record;
mod store;

#[doc(hidden)]
pub mod prelude;

pub use error::{CheckpointError, CheckpointResult};
pub use file::FileCheckpointStore;
pub use memory::MemoryCheckpointStore;
pub use record::{CheckpointRecord, OutputBinding};
pub use store::CheckpointStore;

/// Tracing target for checkpoint operations.
pub const TRACING_TARGET: &str = "meandra_checkpoint";
