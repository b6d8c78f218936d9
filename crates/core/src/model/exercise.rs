use std::collections::HashSet;

use thiserror::Error;

use crate::model::{Level, Question};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("group name cannot be empty")]
    EmptyName,

    #[error("group {group:?} has no questions")]
    NoQuestions { group: String },

    #[error("group {group:?} contains question id {id} more than once")]
    DuplicateQuestionId { group: String, id: u32 },
}

//
// ─── EXERCISE GROUP ────────────────────────────────────────────────────────────
//

/// A named set of questions for one difficulty level.
///
/// Questions keep their presentation order. Ids are unique within the group.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseGroup {
    level: Level,
    group: String,
    questions: Vec<Question>,
}

impl ExerciseGroup {
    /// Creates a validated exercise group.
    ///
    /// The name is trimmed before validation.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if the name is blank, there are no questions, or
    /// two questions share an id.
    pub fn new(
        level: Level,
        group: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, ExerciseError> {
        let group = group.into().trim().to_string();
        if group.is_empty() {
            return Err(ExerciseError::EmptyName);
        }
        if questions.is_empty() {
            return Err(ExerciseError::NoQuestions { group });
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(ExerciseError::DuplicateQuestionId {
                    group,
                    id: question.id(),
                });
            }
        }

        Ok(Self {
            level,
            group,
            questions,
        })
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Questions sorted by id, without reordering the group itself.
    #[must_use]
    pub fn questions_by_id(&self) -> Vec<&Question> {
        let mut sorted: Vec<&Question> = self.questions.iter().collect();
        sorted.sort_by_key(|q| q.id());
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: u32) -> Question {
        Question::new(id, vec![1.0, 2.0], 3.0).unwrap()
    }

    #[test]
    fn trims_and_keeps_order() {
        let group = ExerciseGroup::new(Level::Basic, "  Warmup ", vec![q(2), q(1)]).unwrap();
        assert_eq!(group.group(), "Warmup");
        assert_eq!(group.questions()[0].id(), 2);
        let ids: Vec<u32> = group.questions_by_id().iter().map(|q| q.id()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn rejects_blank_name() {
        let err = ExerciseGroup::new(Level::Junior, "   ", vec![q(1)]).unwrap_err();
        assert_eq!(err, ExerciseError::EmptyName);
    }

    #[test]
    fn rejects_empty_and_duplicate_ids() {
        let err = ExerciseGroup::new(Level::Basic, "A", Vec::new()).unwrap_err();
        assert!(matches!(err, ExerciseError::NoQuestions { .. }));

        let err = ExerciseGroup::new(Level::Basic, "A", vec![q(1), q(1)]).unwrap_err();
        assert_eq!(
            err,
            ExerciseError::DuplicateQuestionId {
                group: "A".into(),
                id: 1
            }
        );
    }
}
