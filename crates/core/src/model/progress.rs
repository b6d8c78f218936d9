use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{ExerciseGroup, Level, Question, StudentId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("exercise group is required")]
    EmptyGroup,

    #[error("question id is required")]
    InvalidQuestionId,
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// One answer event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    session_id: Uuid,
    student_id: StudentId,
    level: Level,
    exercise_group: String,
    question_id: u32,
    response: String,
    is_correct: bool,
    timestamp: DateTime<Utc>,
}

impl ProgressRecord {
    /// Record a response to `question`, grading it on the spot.
    #[must_use]
    pub fn answered(
        session_id: Uuid,
        student_id: StudentId,
        group: &ExerciseGroup,
        question: &Question,
        response: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let response = response.into();
        Self {
            session_id,
            student_id,
            level: group.level(),
            exercise_group: group.group().to_string(),
            question_id: question.id(),
            is_correct: question.is_correct(&response),
            response,
            timestamp,
        }
    }

    /// # Errors
    ///
    /// Returns `ProgressError` if the group is blank or the question id is zero.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        session_id: Uuid,
        student_id: StudentId,
        level: Level,
        exercise_group: String,
        question_id: u32,
        response: String,
        is_correct: bool,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        if exercise_group.trim().is_empty() {
            return Err(ProgressError::EmptyGroup);
        }
        if question_id == 0 {
            return Err(ProgressError::InvalidQuestionId);
        }
        Ok(Self {
            session_id,
            student_id,
            level,
            exercise_group,
            question_id,
            response,
            is_correct,
            timestamp,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn exercise_group(&self) -> &str {
        &self.exercise_group
    }

    #[must_use]
    pub fn question_id(&self) -> u32 {
        self.question_id
    }

    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

//
// ─── SESSION LIST ──────────────────────────────────────────────────────────────
//

/// Unsaved answers from one practice run.
///
/// The list only empties through `discard` or `mark_saved`, so callers must
/// make an explicit choice before dropping a run with answers in it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "unsaved progress must be saved or discarded"]
pub struct SessionList {
    session_id: Uuid,
    records: Vec<ProgressRecord>,
}

impl SessionList {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    #[must_use]
    pub fn records(&self) -> &[ProgressRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn push(&mut self, record: ProgressRecord) -> &ProgressRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Drop every unsaved answer. Returns how many were discarded.
    pub fn discard(&mut self) -> usize {
        let count = self.records.len();
        self.records.clear();
        count
    }

    /// Clear the list after the whole batch has been persisted.
    pub fn mark_saved(&mut self) -> usize {
        self.discard()
    }
}

//
// ─── PROGRESS SUMMARY ──────────────────────────────────────────────────────────
//

/// Correct/total counts for one exercise group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupProgress {
    pub level: Level,
    pub exercise_group: String,
    pub correct: u32,
    pub total: u32,
}

impl GroupProgress {
    /// Share of correct answers, rounded to the nearest whole percent.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let correct = u64::from(self.correct);
        let total = u64::from(self.total);
        u32::try_from((correct * 100 + total / 2) / total).unwrap_or(u32::MAX)
    }
}

/// Fold answer events into per-group totals, in first-seen order.
#[must_use]
pub fn summarize_by_group(records: &[ProgressRecord]) -> Vec<GroupProgress> {
    let mut index: HashMap<(Level, &str), usize> = HashMap::new();
    let mut out: Vec<GroupProgress> = Vec::new();

    for record in records {
        let key = (record.level, record.exercise_group.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            out.push(GroupProgress {
                level: record.level,
                exercise_group: record.exercise_group.clone(),
                correct: 0,
                total: 0,
            });
            out.len() - 1
        });
        let entry = &mut out[slot];
        entry.total = entry.total.saturating_add(1);
        if record.is_correct {
            entry.correct = entry.correct.saturating_add(1);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn record(group: &str, question_id: u32, correct: bool) -> ProgressRecord {
        ProgressRecord::from_persisted(
            Uuid::nil(),
            StudentId::new(1),
            Level::Basic,
            group.to_string(),
            question_id,
            "1".to_string(),
            correct,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn answered_grades_response() {
        let question = Question::new(1, vec![4.0, 7.0, 2.0], 13.0).unwrap();
        let group = ExerciseGroup::new(Level::Junior, "Sums", vec![question.clone()]).unwrap();
        let rec = ProgressRecord::answered(
            Uuid::nil(),
            StudentId::new(3),
            &group,
            &question,
            "13",
            fixed_now(),
        );
        assert!(rec.is_correct());
        assert_eq!(rec.level(), Level::Junior);
        assert_eq!(rec.exercise_group(), "Sums");
    }

    #[test]
    fn session_list_discard_clears() {
        let mut list = SessionList::new(Uuid::nil());
        list.push(record("A", 1, true));
        list.push(record("A", 2, false));
        assert_eq!(list.len(), 2);
        assert_eq!(list.discard(), 2);
        assert!(list.is_empty());
    }

    #[test]
    fn summary_groups_in_first_seen_order() {
        let records = vec![
            record("B", 1, true),
            record("A", 1, false),
            record("B", 2, true),
            record("B", 3, false),
        ];
        let summary = summarize_by_group(&records);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].exercise_group, "B");
        assert_eq!((summary[0].correct, summary[0].total), (2, 3));
        assert_eq!(summary[0].percentage(), 67);
        assert_eq!(summary[1].percentage(), 0);
    }

    #[test]
    fn percentage_handles_large_counts() {
        let progress = GroupProgress {
            level: Level::Basic,
            exercise_group: "Marathon".into(),
            correct: 50_000_000,
            total: 100_000_000,
        };
        assert_eq!(progress.percentage(), 50);
    }

    #[test]
    fn rejects_blank_group() {
        let err = ProgressRecord::from_persisted(
            Uuid::nil(),
            StudentId::new(1),
            Level::Basic,
            " ".into(),
            1,
            String::new(),
            false,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, ProgressError::EmptyGroup);
    }
}
