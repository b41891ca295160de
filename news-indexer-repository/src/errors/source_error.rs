//! Source store error types.

use thiserror::Error;

/// Errors that can occur while reading changes from the system of record.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Could not connect to, or lost the connection with, the source store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The source store did not answer within the configured timeout.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The page query was rejected.
    #[error("Query error: {0}")]
    QueryError(String),

    /// A column could not be decoded into a field value.
    #[error("Decode error in column {column}: {message}")]
    DecodeError { column: String, message: String },

    /// Invalid DSN, table or column names.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl SourceError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a decode error for the given column.
    pub fn decode(column: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::DecodeError {
            column: column.into(),
            message: msg.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionError(_) | Self::Timeout(_))
    }
}

impl From<sqlx::Error> for SourceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::timeout("timed out acquiring a source connection"),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::connection(err.to_string()),
            sqlx::Error::Database(ref db) => match db.code().as_deref() {
                // query_canceled, raised when statement_timeout fires
                Some("57014") => Self::timeout(err.to_string()),
                // connection_exception class and admin/crash shutdown
                Some(code) if code.starts_with("08") || code.starts_with("57P") => {
                    Self::connection(err.to_string())
                }
                _ => Self::query(err.to_string()),
            },
            sqlx::Error::ColumnNotFound(ref column) => Self::decode(column.clone(), err.to_string()),
            sqlx::Error::ColumnDecode { ref index, .. } => Self::decode(index.clone(), err.to_string()),
            sqlx::Error::Decode(_) | sqlx::Error::TypeNotFound { .. } => {
                Self::decode("<unknown>", err.to_string())
            }
            sqlx::Error::Configuration(_) => Self::configuration(err.to_string()),
            _ => Self::query(err.to_string()),
        }
    }
}
