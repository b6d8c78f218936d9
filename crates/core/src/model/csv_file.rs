use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{CsvFileId, Level};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CsvFileError {
    #[error("file name is required")]
    EmptyFileName,

    #[error("uploaded by is required")]
    EmptyUploader,
}

/// Metadata for a question-set upload, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFileDraft {
    pub file_name: String,
    pub level: Level,
    pub uploaded_by: String,
}

impl CsvFileDraft {
    #[must_use]
    pub fn new(file_name: impl Into<String>, level: Level, uploaded_by: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            level,
            uploaded_by: uploaded_by.into(),
        }
    }

    /// # Errors
    ///
    /// Returns `CsvFileError` if the file name or uploader is blank.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedCsvFile, CsvFileError> {
        let file_name = self.file_name.trim().to_string();
        if file_name.is_empty() {
            return Err(CsvFileError::EmptyFileName);
        }
        let uploaded_by = self.uploaded_by.trim().to_string();
        if uploaded_by.is_empty() {
            return Err(CsvFileError::EmptyUploader);
        }
        Ok(ValidatedCsvFile {
            file_name,
            level: self.level,
            uploaded_by,
            uploaded_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCsvFile {
    pub file_name: String,
    pub level: Level,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

impl ValidatedCsvFile {
    #[must_use]
    pub fn assign_id(self, id: CsvFileId) -> CsvFile {
        CsvFile {
            id,
            file_name: self.file_name,
            level: self.level,
            uploaded_by: self.uploaded_by,
            uploaded_at: self.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFile {
    id: CsvFileId,
    file_name: String,
    level: Level,
    uploaded_by: String,
    uploaded_at: DateTime<Utc>,
}

impl CsvFile {
    /// # Errors
    ///
    /// Returns `CsvFileError` if stored values are blank.
    pub fn from_persisted(
        id: CsvFileId,
        file_name: String,
        level: Level,
        uploaded_by: String,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Self, CsvFileError> {
        Ok(CsvFileDraft {
            file_name,
            level,
            uploaded_by,
        }
        .validate(uploaded_at)?
        .assign_id(id))
    }

    #[must_use]
    pub fn id(&self) -> CsvFileId {
        self.id
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn uploaded_by(&self) -> &str {
        &self.uploaded_by
    }

    #[must_use]
    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }
}
