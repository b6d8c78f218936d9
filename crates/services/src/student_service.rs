use std::sync::Arc;

use flash_core::model::{Student, StudentDraft, StudentId};
use storage::repository::StudentRepository;
use tracing::info;

use crate::Clock;
use crate::error::StudentServiceError;

/// Roster management for teachers.
#[derive(Clone)]
pub struct StudentService {
    clock: Clock,
    students: Arc<dyn StudentRepository>,
}

impl StudentService {
    #[must_use]
    pub fn new(clock: Clock, students: Arc<dyn StudentRepository>) -> Self {
        Self { clock, students }
    }

    /// Validate and store a new student.
    ///
    /// # Errors
    ///
    /// Returns `StudentServiceError::Student` for validation failures.
    /// Returns `StudentServiceError::Storage` if persistence fails.
    pub async fn create_student(&self, draft: StudentDraft) -> Result<Student, StudentServiceError> {
        let validated = draft.validate(self.clock.now())?;
        let student = self.students.insert_new_student(validated).await?;
        info!(student_id = %student.id(), classroom = %student.classroom(), "student created");
        Ok(student)
    }

    /// Replace the editable fields of an existing student.
    ///
    /// # Errors
    ///
    /// Returns `StudentServiceError::NotFound` if the id is unknown.
    pub async fn update_student(
        &self,
        id: StudentId,
        draft: StudentDraft,
    ) -> Result<Student, StudentServiceError> {
        let existing = self
            .students
            .get_student(id)
            .await?
            .ok_or(StudentServiceError::NotFound(id))?;

        let updated = draft.validate(existing.created_at())?.assign_id(id);
        self.students.upsert_student(&updated).await?;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns `StudentServiceError::NotFound` if the id is unknown.
    pub async fn delete_student(&self, id: StudentId) -> Result<(), StudentServiceError> {
        match self.students.delete_student(id).await {
            Ok(()) => {
                info!(student_id = %id, "student deleted");
                Ok(())
            }
            Err(storage::repository::StorageError::NotFound) => {
                Err(StudentServiceError::NotFound(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// # Errors
    ///
    /// Returns `StudentServiceError::Storage` if repository access fails.
    pub async fn list_students(&self) -> Result<Vec<Student>, StudentServiceError> {
        Ok(self.students.list_students().await?)
    }

    /// # Errors
    ///
    /// Returns `StudentServiceError::Storage` if repository access fails.
    pub async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StudentServiceError> {
        Ok(self.students.get_student(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use flash_core::model::{Level, StudentError};
    use flash_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn service() -> StudentService {
        StudentService::new(Clock::fixed(fixed_now()), Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn update_keeps_creation_time() {
        let service = service();
        let created = service
            .create_student(StudentDraft::new("Ada", Some(8), Level::Basic))
            .await
            .unwrap();

        let draft = StudentDraft::new("Ada L.", Some(9), Level::Junior).with_flash_interval_ms(800);
        let updated = service.update_student(created.id(), draft).await.unwrap();
        assert_eq!(updated.created_at(), created.created_at());
        assert_eq!(updated.classroom(), Level::Junior);

        let listed = service.list_students().await.unwrap();
        assert_eq!(listed, vec![updated]);
    }

    #[tokio::test]
    async fn rejects_invalid_and_unknown_students() {
        let service = service();
        let err = service
            .create_student(StudentDraft::new("Ada", Some(4), Level::Basic))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StudentServiceError::Student(StudentError::AgeOutOfRange(4))
        ));

        let missing = StudentId::new(42);
        assert!(matches!(
            service.delete_student(missing).await,
            Err(StudentServiceError::NotFound(id)) if id == missing
        ));
        assert!(matches!(
            service
                .update_student(missing, StudentDraft::new("X", None, Level::Basic))
                .await,
            Err(StudentServiceError::NotFound(_))
        ));
    }
}
