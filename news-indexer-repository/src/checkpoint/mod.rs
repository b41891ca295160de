//! Checkpoint store backends.

mod file;
mod memory;

pub use file::{FileCheckpointStore, DEFAULT_CHECKPOINT_PATH};
pub use memory::InMemoryCheckpointStore;
