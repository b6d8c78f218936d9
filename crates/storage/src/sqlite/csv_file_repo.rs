use flash_core::model::{CsvFile, CsvFileId, ValidatedCsvFile};
use sqlx::SqliteConnection;

use super::SqliteRepository;
use super::mapping::{conn, csv_file_id_from_i64, id_i64, map_csv_file_row, write_err};
use crate::repository::{CsvFileRepository, StorageError};

/// Insert upload metadata on an open connection or transaction.
pub(super) async fn insert_csv_file_on(
    db: &mut SqliteConnection,
    file: ValidatedCsvFile,
) -> Result<CsvFile, StorageError> {
    let res = sqlx::query(
        r"
        INSERT INTO csv_files (file_name, level, uploaded_by, uploaded_at)
        VALUES (?1, ?2, ?3, ?4)
        ",
    )
    .bind(file.file_name.clone())
    .bind(file.level.as_str())
    .bind(file.uploaded_by.clone())
    .bind(file.uploaded_at)
    .execute(&mut *db)
    .await
    .map_err(write_err)?;

    Ok(file.assign_id(csv_file_id_from_i64(res.last_insert_rowid())?))
}

#[async_trait::async_trait]
impl CsvFileRepository for SqliteRepository {
    async fn insert_csv_file(&self, file: ValidatedCsvFile) -> Result<CsvFile, StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        insert_csv_file_on(&mut db, file).await
    }

    async fn list_csv_files(&self) -> Result<Vec<CsvFile>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, file_name, level, uploaded_by, uploaded_at
            FROM csv_files
            ORDER BY uploaded_at DESC, id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut files = Vec::with_capacity(rows.len());
        for row in rows {
            files.push(map_csv_file_row(&row)?);
        }
        Ok(files)
    }

    async fn get_csv_file(&self, id: CsvFileId) -> Result<Option<CsvFile>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, file_name, level, uploaded_by, uploaded_at
            FROM csv_files WHERE id = ?1
            ",
        )
        .bind(id_i64("csv_file_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_csv_file_row).transpose()
    }

    async fn delete_csv_file(&self, id: CsvFileId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM csv_files WHERE id = ?1")
            .bind(id_i64("csv_file_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
