//! Checkpoint persistence error types.

use thiserror::Error;

/// Errors that can occur while reading or writing the watermark checkpoint.
#[derive(Debug, Clone, Error)]
pub enum CheckpointError {
    /// The checkpoint location could not be read or written.
    #[error("Checkpoint IO error: {0}")]
    IoError(String),

    /// The persisted value is not a valid watermark.
    #[error("Corrupt checkpoint: {0}")]
    Corrupt(String),
}

impl CheckpointError {
    /// Create an IO error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    /// Create a corrupt checkpoint error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}
