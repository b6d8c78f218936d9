use chrono::{DateTime, Utc};
use flash_core::chunking::ExerciseChunk;
use flash_core::model::{
    CsvFile, CsvFileId, Level, ProgressRecord, Question, Student, StudentId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Like `conn`, but a unique-constraint violation becomes `Conflict`.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    let rejected = e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation() || db.is_check_violation());
    if rejected {
        StorageError::Conflict
    } else {
        conn(e)
    }
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn student_id_from_i64(v: i64) -> Result<StudentId, StorageError> {
    Ok(StudentId::new(i64_to_u64("student_id", v)?))
}

pub(crate) fn csv_file_id_from_i64(v: i64) -> Result<CsvFileId, StorageError> {
    Ok(CsvFileId::new(i64_to_u64("csv_file_id", v)?))
}

fn level_from_row(row: &SqliteRow, column: &str) -> Result<Level, StorageError> {
    let raw: String = row.try_get(column).map_err(ser)?;
    raw.parse::<Level>().map_err(ser)
}

pub(crate) fn map_student_row(row: &SqliteRow) -> Result<Student, StorageError> {
    let age = row
        .try_get::<Option<i64>, _>("age")
        .map_err(ser)?
        .map(|v| u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid age: {v}"))))
        .transpose()?;

    Student::from_persisted(
        student_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        age,
        level_from_row(row, "classroom")?,
        i64_to_u32(
            "flash_interval_ms",
            row.try_get::<i64, _>("flash_interval_ms").map_err(ser)?,
        )?,
        i64_to_u32(
            "response_time_secs",
            row.try_get::<i64, _>("response_time_secs").map_err(ser)?,
        )?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

/// Questions of a chunk as a JSON array for the `questions` column.
pub(crate) fn questions_to_json(questions: &[Question]) -> Result<String, StorageError> {
    serde_json::to_string(questions).map_err(ser)
}

fn questions_from_json(raw: &str) -> Result<Vec<Question>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_chunk_row(row: &SqliteRow) -> Result<ExerciseChunk, StorageError> {
    let questions: String = row.try_get("questions").map_err(ser)?;
    ExerciseChunk::from_persisted(
        level_from_row(row, "level")?,
        row.try_get::<String, _>("group_name").map_err(ser)?,
        i64_to_u32(
            "chunk_number",
            row.try_get::<i64, _>("chunk_number").map_err(ser)?,
        )?,
        i64_to_u32(
            "total_chunks",
            row.try_get::<i64, _>("total_chunks").map_err(ser)?,
        )?,
        i64_to_u32(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        questions_from_json(&questions)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let session_id: Uuid = row.try_get("session_id").map_err(ser)?;
    let answered_at: DateTime<Utc> = row.try_get("answered_at").map_err(ser)?;

    ProgressRecord::from_persisted(
        session_id,
        student_id_from_i64(row.try_get::<i64, _>("student_id").map_err(ser)?)?,
        level_from_row(row, "level")?,
        row.try_get::<String, _>("exercise_group").map_err(ser)?,
        i64_to_u32(
            "question_id",
            row.try_get::<i64, _>("question_id").map_err(ser)?,
        )?,
        row.try_get::<String, _>("response").map_err(ser)?,
        row.try_get::<i64, _>("is_correct").map_err(ser)? != 0,
        answered_at,
    )
    .map_err(ser)
}

pub(crate) fn map_csv_file_row(row: &SqliteRow) -> Result<CsvFile, StorageError> {
    CsvFile::from_persisted(
        csv_file_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("file_name").map_err(ser)?,
        level_from_row(row, "level")?,
        row.try_get::<String, _>("uploaded_by").map_err(ser)?,
        row.try_get("uploaded_at").map_err(ser)?,
    )
    .map_err(ser)
}
