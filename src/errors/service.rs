//! Repository and service layer errors.

use thiserror::Error;

use super::StorageError;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A write matched no row.
    #[error("no matching row")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("user not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{context}")]
    Storage {
        context: &'static str,
        #[source]
        source: StorageError,
    },
}
