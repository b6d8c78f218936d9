//! Shared error types for the services crate.

use thiserror::Error;

use flash_core::ValidationError;
use flash_core::model::{Level, StudentError, StudentId};
use flash_core::reveal::RevealError;
use flash_core::table::{ExportError, ParseError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `StudentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudentServiceError {
    #[error(transparent)]
    Student(#[from] StudentError),
    #[error("student {0} not found")]
    NotFound(StudentId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ExerciseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExerciseServiceError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("group {0:?} appears more than once in the upload")]
    DuplicateGroup(String),
    #[error("no group named {group:?} at level {level}")]
    GroupNotFound { level: Level, group: String },
    #[error("the upload contains no usable questions")]
    EmptyImport,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by practice and progress services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("only students can practice")]
    NotAStudent,
    #[error(transparent)]
    Reveal(#[from] RevealError),
    #[error(transparent)]
    Exercise(#[from] ExerciseServiceError),
    #[error("progress could not be saved: {0}")]
    Persistence(#[source] StorageError),
}

/// Errors emitted by `AccountService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("email is required")]
    EmptyEmail,
    #[error("{0:?} is not a valid email address")]
    InvalidEmail(String),
    #[error(transparent)]
    Student(#[from] StudentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
