//! Shared error types for the services crate.

use thiserror::Error;

use checklist_core::model::{ProgressError, StudentError, StudentId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `StudentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudentServiceError {
    #[error("student {0} not found")]
    NotFound(StudentId),
    #[error("no student id starts with {0:?}")]
    UnknownPrefix(String),
    #[error("{matches} students match id prefix {prefix:?}, use more characters")]
    AmbiguousPrefix { prefix: String, matches: usize },
    #[error(transparent)]
    Student(#[from] StudentError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by staff access checks.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StaffError {
    #[error("PIN must be 4 to 8 digits long, got {len}")]
    InvalidPinLength { len: usize },
    #[error("PIN must contain digits only")]
    InvalidPinFormat,
    #[error("incorrect staff PIN")]
    WrongPin,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by export and import.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransferError {
    #[error("import rejected: {0}")]
    Malformed(#[source] StorageError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Students(#[from] StudentServiceError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Students(#[from] StudentServiceError),
}
