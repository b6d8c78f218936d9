use flash_core::model::{ProgressRecord, StudentId};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn append_batch(&self, records: &[ProgressRecord]) -> Result<usize, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        for record in records {
            sqlx::query(
                r"
                INSERT INTO progress (
                    session_id, student_id, level, exercise_group,
                    question_id, response, is_correct, answered_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(record.session_id())
            .bind(id_i64("student_id", record.student_id().value())?)
            .bind(record.level().as_str())
            .bind(record.exercise_group().to_string())
            .bind(i64::from(record.question_id()))
            .bind(record.response().to_string())
            .bind(i64::from(record.is_correct()))
            .bind(record.timestamp())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(records.len())
    }

    async fn progress_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT session_id, student_id, level, exercise_group,
                   question_id, response, is_correct, answered_at
            FROM progress
            WHERE student_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(id_i64("student_id", student_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT session_id, student_id, level, exercise_group,
                   question_id, response, is_correct, answered_at
            FROM progress
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }
}
