use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::account::AccountService;
use crate::error::AppServicesError;
use crate::exercise_service::ExerciseService;
use crate::progress_service::ProgressService;
use crate::sessions::FlashSessionService;
use crate::student_service::StudentService;

/// Assembles app-facing services over one storage backend and clock.
#[derive(Clone)]
pub struct AppServices {
    students: Arc<StudentService>,
    exercises: Arc<ExerciseService>,
    progress: Arc<ProgressService>,
    practice: Arc<FlashSessionService>,
    accounts: Arc<AccountService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock) -> Self {
        let students = Arc::new(StudentService::new(
            clock.clone(),
            Arc::clone(&storage.students),
        ));
        let exercises = Arc::new(ExerciseService::new(
            clock.clone(),
            Arc::clone(&storage.exercises),
            Arc::clone(&storage.csv_files),
        ));
        let progress = Arc::new(ProgressService::new(Arc::clone(&storage.progress)));
        let practice = Arc::new(FlashSessionService::new(
            clock.clone(),
            Arc::clone(&exercises),
            Arc::clone(&progress),
        ));
        let accounts = Arc::new(AccountService::new(clock, Arc::clone(&storage.students)));

        Self {
            students,
            exercises,
            progress,
            practice,
            accounts,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock))
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn students(&self) -> Arc<StudentService> {
        Arc::clone(&self.students)
    }

    #[must_use]
    pub fn exercises(&self) -> Arc<ExerciseService> {
        Arc::clone(&self.exercises)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn practice(&self) -> Arc<FlashSessionService> {
        Arc::clone(&self.practice)
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        Arc::clone(&self.accounts)
    }
}
