mod csv_file;
mod exercise;
mod ids;
mod level;
mod progress;
mod question;
mod student;

pub use ids::{CsvFileId, ParseIdError, StudentId};
pub use level::{Level, LevelError};

pub use csv_file::{CsvFile, CsvFileDraft, CsvFileError, ValidatedCsvFile};
pub use exercise::{ExerciseError, ExerciseGroup};
pub use progress::{
    GroupProgress, ProgressError, ProgressRecord, SessionList, summarize_by_group,
};
pub use question::{Question, QuestionError};
pub use student::{
    MAX_AGE, MAX_FLASH_INTERVAL_MS, MAX_RESPONSE_TIME_SECS, MIN_AGE, MIN_FLASH_INTERVAL_MS,
    MIN_RESPONSE_TIME_SECS, Student, StudentDraft, StudentError, ValidatedStudent,
};
