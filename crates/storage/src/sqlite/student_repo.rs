use flash_core::model::{Level, Student, StudentId, ValidatedStudent};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_student_row, student_id_from_i64};
use crate::repository::{StorageError, StudentRepository};

const STUDENT_COLUMNS: &str =
    "id, name, age, classroom, flash_interval_ms, response_time_secs, created_at";

#[async_trait::async_trait]
impl StudentRepository for SqliteRepository {
    async fn insert_new_student(
        &self,
        student: ValidatedStudent,
    ) -> Result<Student, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO students (name, age, classroom, flash_interval_ms, response_time_secs, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(student.name.clone())
        .bind(student.age.map(i64::from))
        .bind(student.classroom.as_str())
        .bind(i64::from(student.flash_interval_ms))
        .bind(i64::from(student.response_time_secs))
        .bind(student.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(student.assign_id(student_id_from_i64(res.last_insert_rowid())?))
    }

    async fn upsert_student(&self, student: &Student) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO students (id, name, age, classroom, flash_interval_ms, response_time_secs, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                classroom = excluded.classroom,
                flash_interval_ms = excluded.flash_interval_ms,
                response_time_secs = excluded.response_time_secs
            ",
        )
        .bind(id_i64("student_id", student.id().value())?)
        .bind(student.name().to_string())
        .bind(student.age().map(i64::from))
        .bind(student.classroom().as_str())
        .bind(i64::from(student.flash_interval_ms()))
        .bind(i64::from(student.response_time_secs()))
        .bind(student.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError> {
        let row = sqlx::query(&format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"))
            .bind(id_i64("student_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_student_row).transpose()
    }

    async fn find_student_by_name(
        &self,
        name: &str,
        classroom: Level,
    ) -> Result<Option<Student>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students
             WHERE classroom = ?1 AND name = ?2 COLLATE NOCASE
             ORDER BY id ASC
             LIMIT 1"
        ))
        .bind(classroom.as_str())
        .bind(name.trim().to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_student_row).transpose()
    }

    async fn list_students(&self) -> Result<Vec<Student>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY name COLLATE NOCASE ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut students = Vec::with_capacity(rows.len());
        for row in rows {
            students.push(map_student_row(&row)?);
        }
        Ok(students)
    }

    async fn delete_student(&self, id: StudentId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM students WHERE id = ?1")
            .bind(id_i64("student_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
