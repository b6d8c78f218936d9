use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::{Level, StudentId};

pub const MIN_AGE: u8 = 5;
pub const MAX_AGE: u8 = 18;
pub const MIN_FLASH_INTERVAL_MS: u32 = 500;
pub const MAX_FLASH_INTERVAL_MS: u32 = 5_000;
pub const MIN_RESPONSE_TIME_SECS: u32 = 5;
pub const MAX_RESPONSE_TIME_SECS: u32 = 30;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudentError {
    #[error("student name cannot be empty")]
    EmptyName,

    #[error("age must be between 5 and 18, got {0}")]
    AgeOutOfRange(u8),

    #[error("flash speed must be between 0.5 and 5 seconds, got {0} ms")]
    FlashIntervalOutOfRange(u32),

    #[error("response time must be between 5 and 30 seconds, got {0}")]
    ResponseTimeOutOfRange(u32),
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated roster entry, as entered by a teacher or created at first login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDraft {
    pub name: String,
    pub age: Option<u8>,
    pub classroom: Level,
    pub flash_interval_ms: u32,
    pub response_time_secs: u32,
}

impl StudentDraft {
    /// Roster defaults: two seconds between flashes, ten seconds to answer.
    #[must_use]
    pub fn new(name: impl Into<String>, age: Option<u8>, classroom: Level) -> Self {
        Self {
            name: name.into(),
            age,
            classroom,
            flash_interval_ms: 2_000,
            response_time_secs: 10,
        }
    }

    /// Settings given to a student who logs in without a roster entry.
    #[must_use]
    pub fn first_login(name: impl Into<String>, classroom: Level) -> Self {
        Self {
            name: name.into(),
            age: None,
            classroom,
            flash_interval_ms: 1_000,
            response_time_secs: 30,
        }
    }

    #[must_use]
    pub fn with_flash_interval_ms(mut self, ms: u32) -> Self {
        self.flash_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn with_response_time_secs(mut self, secs: u32) -> Self {
        self.response_time_secs = secs;
        self
    }

    /// Validate the draft.
    ///
    /// # Errors
    ///
    /// Returns `StudentError` for a blank name or any setting outside its range.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedStudent, StudentError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(StudentError::EmptyName);
        }
        if let Some(age) = self.age {
            if !(MIN_AGE..=MAX_AGE).contains(&age) {
                return Err(StudentError::AgeOutOfRange(age));
            }
        }
        if !(MIN_FLASH_INTERVAL_MS..=MAX_FLASH_INTERVAL_MS).contains(&self.flash_interval_ms) {
            return Err(StudentError::FlashIntervalOutOfRange(self.flash_interval_ms));
        }
        if !(MIN_RESPONSE_TIME_SECS..=MAX_RESPONSE_TIME_SECS).contains(&self.response_time_secs) {
            return Err(StudentError::ResponseTimeOutOfRange(
                self.response_time_secs,
            ));
        }

        Ok(ValidatedStudent {
            name,
            age: self.age,
            classroom: self.classroom,
            flash_interval_ms: self.flash_interval_ms,
            response_time_secs: self.response_time_secs,
            created_at: now,
        })
    }
}

/// A draft that passed validation but has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStudent {
    pub name: String,
    pub age: Option<u8>,
    pub classroom: Level,
    pub flash_interval_ms: u32,
    pub response_time_secs: u32,
    pub created_at: DateTime<Utc>,
}

impl ValidatedStudent {
    #[must_use]
    pub fn assign_id(self, id: StudentId) -> Student {
        Student {
            id,
            name: self.name,
            age: self.age,
            classroom: self.classroom,
            flash_interval_ms: self.flash_interval_ms,
            response_time_secs: self.response_time_secs,
            created_at: self.created_at,
        }
    }
}

//
// ─── STUDENT ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    id: StudentId,
    name: String,
    age: Option<u8>,
    classroom: Level,
    flash_interval_ms: u32,
    response_time_secs: u32,
    created_at: DateTime<Utc>,
}

impl Student {
    /// Rehydrate a student from storage, re-checking every field.
    ///
    /// # Errors
    ///
    /// Returns `StudentError` if the stored values violate the roster rules.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: StudentId,
        name: String,
        age: Option<u8>,
        classroom: Level,
        flash_interval_ms: u32,
        response_time_secs: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, StudentError> {
        let draft = StudentDraft {
            name,
            age,
            classroom,
            flash_interval_ms,
            response_time_secs,
        };
        Ok(draft.validate(created_at)?.assign_id(id))
    }

    #[must_use]
    pub fn id(&self) -> StudentId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn age(&self) -> Option<u8> {
        self.age
    }

    #[must_use]
    pub fn classroom(&self) -> Level {
        self.classroom
    }

    #[must_use]
    pub fn flash_interval_ms(&self) -> u32 {
        self.flash_interval_ms
    }

    /// Delay between two reveals during practice.
    #[must_use]
    pub fn flash_interval(&self) -> Duration {
        Duration::milliseconds(i64::from(self.flash_interval_ms))
    }

    #[must_use]
    pub fn response_time_secs(&self) -> u32 {
        self.response_time_secs
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Editable fields of this student as a draft.
    #[must_use]
    pub fn to_draft(&self) -> StudentDraft {
        StudentDraft {
            name: self.name.clone(),
            age: self.age,
            classroom: self.classroom,
            flash_interval_ms: self.flash_interval_ms,
            response_time_secs: self.response_time_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn roster_defaults_validate() {
        let student = StudentDraft::new("  Ada ", Some(9), Level::Basic)
            .validate(fixed_now())
            .unwrap()
            .assign_id(StudentId::new(1));
        assert_eq!(student.name(), "Ada");
        assert_eq!(student.flash_interval(), Duration::seconds(2));
        assert_eq!(student.response_time_secs(), 10);
    }

    #[test]
    fn first_login_uses_fast_flash() {
        let v = StudentDraft::first_login("Lin", Level::Junior)
            .validate(fixed_now())
            .unwrap();
        assert_eq!(v.flash_interval_ms, 1_000);
        assert_eq!(v.response_time_secs, 30);
        assert_eq!(v.age, None);
    }

    #[test]
    fn rejects_out_of_range_settings() {
        let now = fixed_now();
        assert_eq!(
            StudentDraft::new("", Some(9), Level::Basic).validate(now).unwrap_err(),
            StudentError::EmptyName
        );
        assert_eq!(
            StudentDraft::new("A", Some(19), Level::Basic).validate(now).unwrap_err(),
            StudentError::AgeOutOfRange(19)
        );
        assert_eq!(
            StudentDraft::new("A", None, Level::Basic)
                .with_flash_interval_ms(499)
                .validate(now)
                .unwrap_err(),
            StudentError::FlashIntervalOutOfRange(499)
        );
        assert_eq!(
            StudentDraft::new("A", None, Level::Basic)
                .with_response_time_secs(31)
                .validate(now)
                .unwrap_err(),
            StudentError::ResponseTimeOutOfRange(31)
        );
    }
}
