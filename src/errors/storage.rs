//! Failures raised by the storage gateway.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    /// The store rejected a write because of a unique constraint.
    #[error("{operation} violated unique constraint {}", .constraint.as_deref().unwrap_or("<unknown>"))]
    UniqueViolation {
        operation: &'static str,
        constraint: Option<String>,
    },

    #[error("{operation} failed")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("database connection failed")]
    Connect(#[source] sqlx::Error),

    #[error("schema migration failed")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StorageError {
    /// Classify a driver error raised while running `operation`.
    pub fn from_sqlx(operation: &'static str, source: sqlx::Error) -> Self {
        if let Some(db_err) = source.as_database_error() {
            if db_err.is_unique_violation() {
                return Self::UniqueViolation {
                    operation,
                    constraint: db_err.constraint().map(str::to_owned),
                };
            }
        }
        Self::Query { operation, source }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}
