use std::collections::HashSet;
use std::sync::Arc;

use flash_core::ValidationError;
use flash_core::chunking::{MAX_QUESTIONS_PER_CHUNK, merge_chunks, split_into_chunks};
use flash_core::model::{CsvFile, CsvFileDraft, CsvFileId, ExerciseGroup, Level};
use flash_core::table::{parse_exercises, write_exercises};
use storage::repository::{CsvFileRepository, ExerciseRepository};
use tracing::{debug, info};

use crate::Clock;
use crate::error::ExerciseServiceError;

/// Name and size of one imported group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub name: String,
    pub question_count: usize,
}

/// What an upload replaced the level's question set with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub file: CsvFile,
    pub groups: Vec<GroupSummary>,
    pub question_count: usize,
    pub chunk_count: usize,
}

/// Question-set uploads, lookups and exports.
#[derive(Clone)]
pub struct ExerciseService {
    clock: Clock,
    exercises: Arc<dyn ExerciseRepository>,
    csv_files: Arc<dyn CsvFileRepository>,
}

impl ExerciseService {
    #[must_use]
    pub fn new(
        clock: Clock,
        exercises: Arc<dyn ExerciseRepository>,
        csv_files: Arc<dyn CsvFileRepository>,
    ) -> Self {
        Self {
            clock,
            exercises,
            csv_files,
        }
    }

    /// Parse an uploaded table and make it the question set for `level`.
    ///
    /// Nothing is written unless the whole table parses and validates. The new
    /// groups and the upload record are stored in one write, and groups of the
    /// other level are not touched.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseServiceError::Parse` for a malformed table,
    /// `DuplicateGroup` or `EmptyImport` for unusable content, `Validation` for
    /// bad metadata, and `Storage` if persistence fails.
    pub async fn import_csv(
        &self,
        file_name: &str,
        content: &str,
        level: Level,
        uploaded_by: &str,
    ) -> Result<ImportReport, ExerciseServiceError> {
        let metadata = CsvFileDraft::new(file_name, level, uploaded_by)
            .validate(self.clock.now())
            .map_err(ValidationError::from)?;

        let groups = parse_exercises(content, level)?;
        if groups.is_empty() {
            return Err(ExerciseServiceError::EmptyImport);
        }

        let mut seen = HashSet::new();
        for group in &groups {
            if !seen.insert(group.group()) {
                return Err(ExerciseServiceError::DuplicateGroup(
                    group.group().to_string(),
                ));
            }
        }

        let mut chunks = Vec::new();
        for group in &groups {
            chunks.extend(
                split_into_chunks(group, MAX_QUESTIONS_PER_CHUNK).map_err(ValidationError::from)?,
            );
        }

        let file = self
            .exercises
            .replace_level_with_file(level, &chunks, metadata)
            .await?;

        let summaries: Vec<GroupSummary> = groups
            .iter()
            .map(|g| GroupSummary {
                name: g.group().to_string(),
                question_count: g.question_count(),
            })
            .collect();
        let question_count = summaries.iter().map(|g| g.question_count).sum();

        info!(
            file = file.file_name(),
            %level,
            groups = summaries.len(),
            questions = question_count,
            "imported question set"
        );

        Ok(ImportReport {
            file,
            groups: summaries,
            question_count,
            chunk_count: chunks.len(),
        })
    }

    /// Groups of one level, in upload order.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseServiceError` if chunks cannot be read or reassembled.
    pub async fn groups_for_level(
        &self,
        level: Level,
    ) -> Result<Vec<ExerciseGroup>, ExerciseServiceError> {
        let chunks = self.exercises.list_chunks(Some(level)).await?;
        debug!(%level, chunks = chunks.len(), "loaded exercise chunks");
        Ok(merge_chunks(chunks).map_err(ValidationError::from)?)
    }

    /// # Errors
    ///
    /// Returns `ExerciseServiceError` if chunks cannot be read or reassembled.
    pub async fn all_groups(&self) -> Result<Vec<ExerciseGroup>, ExerciseServiceError> {
        let chunks = self.exercises.list_chunks(None).await?;
        Ok(merge_chunks(chunks).map_err(ValidationError::from)?)
    }

    /// # Errors
    ///
    /// Returns `ExerciseServiceError::GroupNotFound` if no group of `level` has
    /// this name.
    pub async fn find_group(
        &self,
        level: Level,
        name: &str,
    ) -> Result<ExerciseGroup, ExerciseServiceError> {
        let name = name.trim();
        self.groups_for_level(level)
            .await?
            .into_iter()
            .find(|g| g.group() == name)
            .ok_or_else(|| ExerciseServiceError::GroupNotFound {
                level,
                group: name.to_string(),
            })
    }

    /// Render a level's groups in the upload table format.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseServiceError::Export` if a question cannot be written.
    pub async fn export_csv(&self, level: Level) -> Result<String, ExerciseServiceError> {
        let groups = self.groups_for_level(level).await?;
        Ok(write_exercises(&groups)?)
    }

    /// # Errors
    ///
    /// Returns `ExerciseServiceError::Storage` if repository access fails.
    pub async fn list_csv_files(&self) -> Result<Vec<CsvFile>, ExerciseServiceError> {
        Ok(self.csv_files.list_csv_files().await?)
    }

    /// Remove upload metadata. The imported groups stay in place.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseServiceError::Storage` if the id is unknown or removal fails.
    pub async fn delete_csv_file(&self, id: CsvFileId) -> Result<(), ExerciseServiceError> {
        self.csv_files.delete_csv_file(id).await?;
        info!(csv_file_id = %id, "deleted upload metadata");
        Ok(())
    }
}
