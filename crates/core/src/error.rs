use thiserror::Error;

use crate::chunking::ChunkError;
use crate::model::{
    CsvFileError, ExerciseError, LevelError, ProgressError, QuestionError, StudentError,
};

/// A record failed its field constraints.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
    #[error(transparent)]
    Student(#[from] StudentError),
    #[error(transparent)]
    CsvFile(#[from] CsvFileError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Chunk(#[from] ChunkError),
}
