use async_trait::async_trait;
use flash_core::chunking::ExerciseChunk;
use flash_core::model::{
    CsvFile, CsvFileId, Level, ProgressRecord, Student, StudentId, ValidatedCsvFile,
    ValidatedStudent,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Roster of students.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Store a new student and assign its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the student cannot be stored.
    async fn insert_new_student(&self, student: ValidatedStudent)
    -> Result<Student, StorageError>;

    /// Persist or update a student with a known id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the student cannot be stored.
    async fn upsert_student(&self, student: &Student) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError>;

    /// Look a student up by name (ASCII case-insensitive) within a classroom.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_student_by_name(
        &self,
        name: &str,
        classroom: Level,
    ) -> Result<Option<Student>, StorageError>;

    /// All students ordered by name, then id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_students(&self) -> Result<Vec<Student>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no student has this id.
    async fn delete_student(&self, id: StudentId) -> Result<(), StorageError>;
}

/// Exercise groups, persisted as bounded chunks.
#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    /// Atomically replace every chunk of `level` with `chunks`.
    ///
    /// Other levels are left untouched. On failure the previous chunks remain.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a chunk belongs to another level or
    /// two chunks share a position, or other storage errors.
    async fn replace_level_chunks(
        &self,
        level: Level,
        chunks: &[ExerciseChunk],
    ) -> Result<(), StorageError>;

    /// Replace every chunk of `level` and record the upload they came from.
    ///
    /// Both writes land together or not at all.
    ///
    /// # Errors
    ///
    /// Same as [`ExerciseRepository::replace_level_chunks`], plus any failure
    /// to store the metadata. Either way nothing changes.
    async fn replace_level_with_file(
        &self,
        level: Level,
        chunks: &[ExerciseChunk],
        file: ValidatedCsvFile,
    ) -> Result<CsvFile, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the chunk position is already taken.
    async fn insert_chunk(&self, chunk: &ExerciseChunk) -> Result<(), StorageError>;

    /// Chunks in stored order, optionally filtered by level.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures or undecodable rows.
    async fn list_chunks(&self, level: Option<Level>) -> Result<Vec<ExerciseChunk>, StorageError>;

    /// Returns how many chunks were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_all_chunks(&self) -> Result<u64, StorageError>;

    /// Returns how many chunks were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_level_chunks(&self, level: Level) -> Result<u64, StorageError>;
}

/// Append-only answer log.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Persist a whole batch or nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any record cannot be stored; none are kept.
    async fn append_batch(&self, records: &[ProgressRecord]) -> Result<usize, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn progress_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<ProgressRecord>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError>;
}

/// Metadata of uploaded question files.
#[async_trait]
pub trait CsvFileRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the metadata cannot be stored.
    async fn insert_csv_file(&self, file: ValidatedCsvFile) -> Result<CsvFile, StorageError>;

    /// Newest upload first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_csv_files(&self) -> Result<Vec<CsvFile>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_csv_file(&self, id: CsvFileId) -> Result<Option<CsvFile>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no file has this id.
    async fn delete_csv_file(&self, id: CsvFileId) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

struct Table<K, V> {
    next_id: u64,
    rows: HashMap<K, V>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: HashMap::new(),
        }
    }
}

impl<K, V> Table<K, V> {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    students: Arc<Mutex<Table<StudentId, Student>>>,
    chunks: Arc<Mutex<Vec<ExerciseChunk>>>,
    progress: Arc<Mutex<Vec<ProgressRecord>>>,
    csv_files: Arc<Mutex<Table<CsvFileId, CsvFile>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_err<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Every chunk must belong to `level` and occupy a distinct position.
pub(crate) fn check_level_chunks(
    level: Level,
    chunks: &[ExerciseChunk],
) -> Result<(), StorageError> {
    let mut seen = std::collections::HashSet::new();
    for chunk in chunks {
        if chunk.level() != level {
            return Err(StorageError::Conflict);
        }
        if !seen.insert((chunk.level(), chunk.group(), chunk.chunk_number())) {
            return Err(StorageError::Conflict);
        }
    }
    Ok(())
}

fn same_position(a: &ExerciseChunk, b: &ExerciseChunk) -> bool {
    a.level() == b.level() && a.group() == b.group() && a.chunk_number() == b.chunk_number()
}

#[async_trait]
impl StudentRepository for InMemoryRepository {
    async fn insert_new_student(
        &self,
        student: ValidatedStudent,
    ) -> Result<Student, StorageError> {
        let mut guard = self.students.lock().map_err(lock_err)?;
        let id = StudentId::new(guard.allocate_id());
        let student = student.assign_id(id);
        guard.rows.insert(id, student.clone());
        Ok(student)
    }

    async fn upsert_student(&self, student: &Student) -> Result<(), StorageError> {
        let mut guard = self.students.lock().map_err(lock_err)?;
        guard.next_id = guard.next_id.max(student.id().value());
        guard.rows.insert(student.id(), student.clone());
        Ok(())
    }

    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError> {
        let guard = self.students.lock().map_err(lock_err)?;
        Ok(guard.rows.get(&id).cloned())
    }

    async fn find_student_by_name(
        &self,
        name: &str,
        classroom: Level,
    ) -> Result<Option<Student>, StorageError> {
        let name = name.trim();
        let guard = self.students.lock().map_err(lock_err)?;
        Ok(guard
            .rows
            .values()
            .filter(|s| s.classroom() == classroom && s.name().eq_ignore_ascii_case(name))
            .min_by_key(|s| s.id())
            .cloned())
    }

    async fn list_students(&self) -> Result<Vec<Student>, StorageError> {
        let guard = self.students.lock().map_err(lock_err)?;
        let mut out: Vec<Student> = guard.rows.values().cloned().collect();
        out.sort_by(|a, b| {
            a.name()
                .to_ascii_lowercase()
                .cmp(&b.name().to_ascii_lowercase())
                .then(a.id().cmp(&b.id()))
        });
        Ok(out)
    }

    async fn delete_student(&self, id: StudentId) -> Result<(), StorageError> {
        let mut guard = self.students.lock().map_err(lock_err)?;
        guard
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ExerciseRepository for InMemoryRepository {
    async fn replace_level_chunks(
        &self,
        level: Level,
        chunks: &[ExerciseChunk],
    ) -> Result<(), StorageError> {
        check_level_chunks(level, chunks)?;
        let mut guard = self.chunks.lock().map_err(lock_err)?;
        guard.retain(|c| c.level() != level);
        guard.extend(chunks.iter().cloned());
        Ok(())
    }

    async fn replace_level_with_file(
        &self,
        level: Level,
        chunks: &[ExerciseChunk],
        file: ValidatedCsvFile,
    ) -> Result<CsvFile, StorageError> {
        check_level_chunks(level, chunks)?;
        let mut stored = self.chunks.lock().map_err(lock_err)?;
        let mut files = self.csv_files.lock().map_err(lock_err)?;

        stored.retain(|c| c.level() != level);
        stored.extend(chunks.iter().cloned());
        let id = CsvFileId::new(files.allocate_id());
        let file = file.assign_id(id);
        files.rows.insert(id, file.clone());
        Ok(file)
    }

    async fn insert_chunk(&self, chunk: &ExerciseChunk) -> Result<(), StorageError> {
        let mut guard = self.chunks.lock().map_err(lock_err)?;
        if guard.iter().any(|c| same_position(c, chunk)) {
            return Err(StorageError::Conflict);
        }
        guard.push(chunk.clone());
        Ok(())
    }

    async fn list_chunks(&self, level: Option<Level>) -> Result<Vec<ExerciseChunk>, StorageError> {
        let guard = self.chunks.lock().map_err(lock_err)?;
        Ok(guard
            .iter()
            .filter(|c| level.is_none_or(|l| c.level() == l))
            .cloned()
            .collect())
    }

    async fn delete_all_chunks(&self) -> Result<u64, StorageError> {
        let mut guard = self.chunks.lock().map_err(lock_err)?;
        let removed = guard.len() as u64;
        guard.clear();
        Ok(removed)
    }

    async fn delete_level_chunks(&self, level: Level) -> Result<u64, StorageError> {
        let mut guard = self.chunks.lock().map_err(lock_err)?;
        let before = guard.len();
        guard.retain(|c| c.level() != level);
        Ok((before - guard.len()) as u64)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn append_batch(&self, records: &[ProgressRecord]) -> Result<usize, StorageError> {
        let mut guard = self.progress.lock().map_err(lock_err)?;
        guard.extend(records.iter().cloned());
        Ok(records.len())
    }

    async fn progress_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(lock_err)?;
        Ok(guard
            .iter()
            .filter(|r| r.student_id() == student_id)
            .cloned()
            .collect())
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(lock_err)?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl CsvFileRepository for InMemoryRepository {
    async fn insert_csv_file(&self, file: ValidatedCsvFile) -> Result<CsvFile, StorageError> {
        let mut guard = self.csv_files.lock().map_err(lock_err)?;
        let id = CsvFileId::new(guard.allocate_id());
        let file = file.assign_id(id);
        guard.rows.insert(id, file.clone());
        Ok(file)
    }

    async fn list_csv_files(&self) -> Result<Vec<CsvFile>, StorageError> {
        let guard = self.csv_files.lock().map_err(lock_err)?;
        let mut out: Vec<CsvFile> = guard.rows.values().cloned().collect();
        out.sort_by(|a, b| {
            b.uploaded_at()
                .cmp(&a.uploaded_at())
                .then(b.id().cmp(&a.id()))
        });
        Ok(out)
    }

    async fn get_csv_file(&self, id: CsvFileId) -> Result<Option<CsvFile>, StorageError> {
        let guard = self.csv_files.lock().map_err(lock_err)?;
        Ok(guard.rows.get(&id).cloned())
    }

    async fn delete_csv_file(&self, id: CsvFileId) -> Result<(), StorageError> {
        let mut guard = self.csv_files.lock().map_err(lock_err)?;
        guard
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub students: Arc<dyn StudentRepository>,
    pub exercises: Arc<dyn ExerciseRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub csv_files: Arc<dyn CsvFileRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let students: Arc<dyn StudentRepository> = Arc::new(repo.clone());
        let exercises: Arc<dyn ExerciseRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let csv_files: Arc<dyn CsvFileRepository> = Arc::new(repo);
        Self {
            students,
            exercises,
            progress,
            csv_files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flash_core::chunking::split_into_chunks;
    use flash_core::model::{CsvFileDraft, ExerciseGroup, Question, StudentDraft};
    use flash_core::time::fixed_now;

    fn group(level: Level, name: &str, count: u32) -> ExerciseGroup {
        let questions = (1..=count)
            .map(|id| Question::new(id, vec![1.0, f64::from(id)], f64::from(id) + 1.0).unwrap())
            .collect();
        ExerciseGroup::new(level, name, questions).unwrap()
    }

    #[tokio::test]
    async fn assigns_ids_and_finds_by_name() {
        let repo = InMemoryRepository::new();
        let draft = StudentDraft::new("Ada", Some(9), Level::Junior);
        let ada = repo
            .insert_new_student(draft.validate(fixed_now()).unwrap())
            .await
            .unwrap();
        assert_eq!(ada.id(), StudentId::new(1));

        let found = repo.find_student_by_name("ada ", Level::Junior).await.unwrap();
        assert_eq!(found, Some(ada.clone()));
        assert!(repo
            .find_student_by_name("Ada", Level::Basic)
            .await
            .unwrap()
            .is_none());

        repo.delete_student(ada.id()).await.unwrap();
        assert!(matches!(
            repo.delete_student(ada.id()).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn replacing_a_level_keeps_the_other() {
        let repo = InMemoryRepository::new();
        let basic = split_into_chunks(&group(Level::Basic, "B", 3), 2).unwrap();
        let junior = split_into_chunks(&group(Level::Junior, "J", 1), 2).unwrap();
        repo.replace_level_chunks(Level::Basic, &basic).await.unwrap();
        repo.replace_level_chunks(Level::Junior, &junior).await.unwrap();

        let fresh = split_into_chunks(&group(Level::Basic, "B2", 1), 2).unwrap();
        repo.replace_level_chunks(Level::Basic, &fresh).await.unwrap();

        let all = repo.list_chunks(None).await.unwrap();
        assert_eq!(all.len(), 2);
        let basic_now = repo.list_chunks(Some(Level::Basic)).await.unwrap();
        assert_eq!(basic_now.len(), 1);
        assert_eq!(basic_now[0].group(), "B2");
    }

    #[tokio::test]
    async fn replace_rejects_chunks_of_another_level() {
        let repo = InMemoryRepository::new();
        let junior = split_into_chunks(&group(Level::Junior, "J", 1), 2).unwrap();
        assert!(matches!(
            repo.replace_level_chunks(Level::Basic, &junior).await,
            Err(StorageError::Conflict)
        ));

        repo.insert_chunk(&junior[0]).await.unwrap();
        assert!(matches!(
            repo.insert_chunk(&junior[0]).await,
            Err(StorageError::Conflict)
        ));
        assert_eq!(repo.delete_all_chunks().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn import_write_stores_chunks_and_file_together() {
        let repo = InMemoryRepository::new();
        let upload = CsvFileDraft::new("basic.csv", Level::Basic, "teacher@example.com")
            .validate(fixed_now())
            .unwrap();
        let basic = split_into_chunks(&group(Level::Basic, "B", 3), 2).unwrap();
        let file = repo
            .replace_level_with_file(Level::Basic, &basic, upload.clone())
            .await
            .unwrap();
        assert_eq!(repo.list_chunks(Some(Level::Basic)).await.unwrap().len(), 2);
        assert_eq!(repo.get_csv_file(file.id()).await.unwrap(), Some(file));

        let junior = split_into_chunks(&group(Level::Junior, "J", 1), 2).unwrap();
        assert!(matches!(
            repo.replace_level_with_file(Level::Basic, &junior, upload).await,
            Err(StorageError::Conflict)
        ));
        assert_eq!(repo.list_chunks(Some(Level::Basic)).await.unwrap().len(), 2);
        assert_eq!(repo.list_csv_files().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn csv_files_list_newest_first() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        for (offset, name) in [(0, "old.csv"), (60, "new.csv")] {
            let file = CsvFileDraft::new(name, Level::Basic, "teacher@example.com")
                .validate(now + chrono::Duration::seconds(offset))
                .unwrap();
            repo.insert_csv_file(file).await.unwrap();
        }
        let names: Vec<String> = repo
            .list_csv_files()
            .await
            .unwrap()
            .iter()
            .map(|f| f.file_name().to_string())
            .collect();
        assert_eq!(names, vec!["new.csv", "old.csv"]);
    }
}
