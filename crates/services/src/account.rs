//! Who is using the app right now.
//!
//! Credentials are checked by the external account provider; this module only
//! turns an authenticated identity into a session value.

use std::sync::Arc;

use flash_core::model::{Level, Student, StudentDraft};
use storage::repository::StudentRepository;
use tracing::info;

use crate::Clock;
use crate::error::AuthError;

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSession {
    Student(Student),
    Teacher { email: String },
}

impl UserSession {
    #[must_use]
    pub fn student(&self) -> Option<&Student> {
        match self {
            UserSession::Student(student) => Some(student),
            UserSession::Teacher { .. } => None,
        }
    }

    #[must_use]
    pub fn is_teacher(&self) -> bool {
        matches!(self, UserSession::Teacher { .. })
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            UserSession::Student(student) => student.name(),
            UserSession::Teacher { email } => email,
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    clock: Clock,
    students: Arc<dyn StudentRepository>,
}

impl AccountService {
    #[must_use]
    pub fn new(clock: Clock, students: Arc<dyn StudentRepository>) -> Self {
        Self { clock, students }
    }

    /// Log a student in, creating a roster entry on first login.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Student` if the name is blank, or `Storage` if the
    /// roster cannot be read or written.
    pub async fn login_student(
        &self,
        name: &str,
        classroom: Level,
    ) -> Result<UserSession, AuthError> {
        if let Some(student) = self.students.find_student_by_name(name, classroom).await? {
            info!(student_id = %student.id(), "student logged in");
            return Ok(UserSession::Student(student));
        }

        let validated = StudentDraft::first_login(name, classroom).validate(self.clock.now())?;
        let student = self.students.insert_new_student(validated).await?;
        info!(student_id = %student.id(), %classroom, "created student on first login");
        Ok(UserSession::Student(student))
    }

    /// # Errors
    ///
    /// Returns `AuthError` if the email is blank or malformed.
    pub fn login_teacher(&self, email: &str) -> Result<UserSession, AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::EmptyEmail);
        }
        let well_formed = email
            .split_once('@')
            .is_some_and(|(user, domain)| !user.is_empty() && !domain.is_empty());
        if !well_formed {
            return Err(AuthError::InvalidEmail(email.to_string()));
        }
        info!(email, "teacher logged in");
        Ok(UserSession::Teacher {
            email: email.to_string(),
        })
    }

    pub fn logout(&self, session: UserSession) {
        info!(user = session.display_name(), "logged out");
    }
}
