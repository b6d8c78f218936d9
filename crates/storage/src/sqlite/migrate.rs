use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::SqliteInitError;

/// Applies versioned schema migrations, each in its own transaction.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: roster, exercise chunks, progress log, upload metadata.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS students (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    age INTEGER CHECK (age IS NULL OR age BETWEEN 5 AND 18),
                    classroom TEXT NOT NULL,
                    flash_interval_ms INTEGER NOT NULL CHECK (flash_interval_ms BETWEEN 500 AND 5000),
                    response_time_secs INTEGER NOT NULL CHECK (response_time_secs BETWEEN 5 AND 30),
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS exercise_chunks (
                    id INTEGER PRIMARY KEY,
                    level TEXT NOT NULL,
                    group_name TEXT NOT NULL,
                    chunk_number INTEGER NOT NULL CHECK (chunk_number >= 1),
                    total_chunks INTEGER NOT NULL CHECK (total_chunks >= chunk_number),
                    total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
                    questions TEXT NOT NULL,
                    UNIQUE (level, group_name, chunk_number)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS progress (
                    id INTEGER PRIMARY KEY,
                    session_id BLOB NOT NULL,
                    student_id INTEGER NOT NULL,
                    level TEXT NOT NULL,
                    exercise_group TEXT NOT NULL,
                    question_id INTEGER NOT NULL CHECK (question_id >= 1),
                    response TEXT NOT NULL,
                    is_correct INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
                    answered_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS csv_files (
                    id INTEGER PRIMARY KEY,
                    file_name TEXT NOT NULL CHECK (length(trim(file_name)) > 0),
                    level TEXT NOT NULL,
                    uploaded_by TEXT NOT NULL CHECK (length(trim(uploaded_by)) > 0),
                    uploaded_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_students_classroom_name
                    ON students (classroom, name COLLATE NOCASE);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_progress_student_answered_at
                    ON progress (student_id, answered_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_csv_files_uploaded_at
                    ON csv_files (uploaded_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(version = 1, "applied sqlite migration");
    }

    Ok(())
}
