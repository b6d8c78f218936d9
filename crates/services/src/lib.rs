#![forbid(unsafe_code)]

pub mod account;
pub mod app_services;
pub mod error;
pub mod exercise_service;
pub mod progress_service;
pub mod sessions;
pub mod student_service;

pub use flash_core::Clock;

pub use account::{AccountService, UserSession};
pub use app_services::AppServices;
pub use error::{
    AppServicesError, AuthError, ExerciseServiceError, SessionError, StudentServiceError,
};
pub use exercise_service::{ExerciseService, GroupSummary, ImportReport};
pub use progress_service::ProgressService;
pub use sessions::{DecisionOutcome, FlashSessionService, SaveDecision};
pub use student_service::StudentService;
