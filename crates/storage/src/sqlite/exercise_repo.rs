use flash_core::chunking::ExerciseChunk;
use flash_core::model::{CsvFile, Level, ValidatedCsvFile};
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use super::SqliteRepository;
use super::csv_file_repo::insert_csv_file_on;
use super::mapping::{conn, map_chunk_row, questions_to_json, write_err};
use crate::repository::{ExerciseRepository, StorageError, check_level_chunks};

async fn delete_level_tx(
    tx: &mut Transaction<'_, Sqlite>,
    level: Level,
) -> Result<u64, StorageError> {
    Ok(sqlx::query("DELETE FROM exercise_chunks WHERE level = ?1")
        .bind(level.as_str())
        .execute(&mut **tx)
        .await
        .map_err(conn)?
        .rows_affected())
}

async fn insert_chunk_tx(
    tx: &mut Transaction<'_, Sqlite>,
    chunk: &ExerciseChunk,
) -> Result<(), StorageError> {
    sqlx::query(
        r"
        INSERT INTO exercise_chunks (level, group_name, chunk_number, total_chunks, total_questions, questions)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
    )
    .bind(chunk.level().as_str())
    .bind(chunk.group().to_string())
    .bind(i64::from(chunk.chunk_number()))
    .bind(i64::from(chunk.total_chunks()))
    .bind(i64::from(chunk.total_questions()))
    .bind(questions_to_json(chunk.questions())?)
    .execute(&mut **tx)
    .await
    .map_err(write_err)?;
    Ok(())
}

#[async_trait::async_trait]
impl ExerciseRepository for SqliteRepository {
    async fn replace_level_chunks(
        &self,
        level: Level,
        chunks: &[ExerciseChunk],
    ) -> Result<(), StorageError> {
        check_level_chunks(level, chunks)?;

        let mut tx = self.pool.begin().await.map_err(conn)?;
        let removed = delete_level_tx(&mut tx, level).await?;
        for chunk in chunks {
            insert_chunk_tx(&mut tx, chunk).await?;
        }
        tx.commit().await.map_err(conn)?;

        debug!(%level, removed, inserted = chunks.len(), "replaced exercise chunks");
        Ok(())
    }

    async fn replace_level_with_file(
        &self,
        level: Level,
        chunks: &[ExerciseChunk],
        file: ValidatedCsvFile,
    ) -> Result<CsvFile, StorageError> {
        check_level_chunks(level, chunks)?;

        // Dropping `tx` on any early return rolls both writes back.
        let mut tx = self.pool.begin().await.map_err(conn)?;
        let removed = delete_level_tx(&mut tx, level).await?;
        for chunk in chunks {
            insert_chunk_tx(&mut tx, chunk).await?;
        }
        let file = insert_csv_file_on(&mut tx, file).await?;
        tx.commit().await.map_err(conn)?;

        debug!(%level, removed, inserted = chunks.len(), csv_file_id = %file.id(), "imported level");
        Ok(file)
    }

    async fn insert_chunk(&self, chunk: &ExerciseChunk) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        insert_chunk_tx(&mut tx, chunk).await?;
        tx.commit().await.map_err(conn)
    }

    async fn list_chunks(&self, level: Option<Level>) -> Result<Vec<ExerciseChunk>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT level, group_name, chunk_number, total_chunks, total_questions, questions
            FROM exercise_chunks
            WHERE ?1 IS NULL OR level = ?1
            ORDER BY id ASC
            ",
        )
        .bind(level.map(Level::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut chunks = Vec::with_capacity(rows.len());
        for row in rows {
            chunks.push(map_chunk_row(&row)?);
        }
        Ok(chunks)
    }

    async fn delete_all_chunks(&self) -> Result<u64, StorageError> {
        let res = sqlx::query("DELETE FROM exercise_chunks")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected())
    }

    async fn delete_level_chunks(&self, level: Level) -> Result<u64, StorageError> {
        let res = sqlx::query("DELETE FROM exercise_chunks WHERE level = ?1")
            .bind(level.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected())
    }
}
