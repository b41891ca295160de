//! Search index error types.
//!
//! This module defines the error types that can occur during search index operations.

use thiserror::Error;

/// Errors that can occur during search index operations.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Validation error (e.g., invalid configuration values).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The search engine did not answer within the configured timeout.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The search engine answered with a throttling or server-side status.
    #[error("Search engine unavailable (status {status}): {message}")]
    Unavailable { status: u16, message: String },

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// The bulk request as a whole was rejected.
    #[error("Bulk operation error: {0}")]
    BulkOperationError(String),

    /// A single document inside an otherwise accepted bulk request failed.
    #[error("Document rejected (status {status}): {reason}")]
    DocumentRejected { status: u16, reason: String },

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// The search engine response could not be interpreted.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an error for a non-success HTTP status on a whole request.
    ///
    /// Throttling and server-side statuses become `Unavailable`, everything
    /// else is reported through `fallback`.
    pub fn from_status(status: u16, body: String, fallback: fn(String) -> Self) -> Self {
        if status == 429 || status >= 500 {
            Self::Unavailable {
                status,
                message: body,
            }
        } else {
            fallback(format!("status {}: {}", status, body))
        }
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a bulk operation error.
    pub fn bulk_operation(msg: impl Into<String>) -> Self {
        Self::BulkOperationError(msg.into())
    }

    /// Create a per-document rejection.
    pub fn document_rejected(status: u16, reason: impl Into<String>) -> Self {
        Self::DocumentRejected {
            status,
            reason: reason.into(),
        }
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::Timeout(_) | Self::Unavailable { .. } => true,
            Self::DocumentRejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
