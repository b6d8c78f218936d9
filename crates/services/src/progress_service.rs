use std::sync::Arc;

use flash_core::model::{GroupProgress, ProgressRecord, SessionList, StudentId, summarize_by_group};
use storage::repository::ProgressRepository;
use tracing::{info, warn};

use crate::error::SessionError;

/// Persists finished practice runs and reports on them.
#[derive(Clone)]
pub struct ProgressService {
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressRepository>) -> Self {
        Self { progress }
    }

    /// Store every answer of the run as one batch.
    ///
    /// The list is cleared only after the batch is stored, so a failed save can
    /// be retried with the same list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Persistence` if the batch cannot be stored.
    pub async fn save_session(&self, list: &mut SessionList) -> Result<usize, SessionError> {
        if list.is_empty() {
            return Ok(0);
        }

        match self.progress.append_batch(list.records()).await {
            Ok(saved) => {
                list.mark_saved();
                info!(session_id = %list.session_id(), saved, "saved practice progress");
                Ok(saved)
            }
            Err(e) => {
                warn!(session_id = %list.session_id(), error = %e, "saving practice progress failed");
                Err(SessionError::Persistence(e))
            }
        }
    }

    /// Drop the run's answers without storing them.
    pub fn discard_session(&self, list: &mut SessionList) -> usize {
        let discarded = list.discard();
        info!(session_id = %list.session_id(), discarded, "discarded practice progress");
        discarded
    }

    /// # Errors
    ///
    /// Returns `SessionError::Persistence` if repository access fails.
    pub async fn progress_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<ProgressRecord>, SessionError> {
        self.progress
            .progress_for_student(student_id)
            .await
            .map_err(SessionError::Persistence)
    }

    /// Correct and total answers per group for one student.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Persistence` if repository access fails.
    pub async fn group_progress(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<GroupProgress>, SessionError> {
        let records = self.progress_for_student(student_id).await?;
        Ok(summarize_by_group(&records))
    }
}
