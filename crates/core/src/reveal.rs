//! Timed reveal loop for one practice run over an exercise group.
//!
//! The sequencer never reads a clock. Callers pass `now` into [`FlashSequencer::advance`]
//! and [`FlashSequencer::submit`], and sleep until [`FlashSequencer::next_deadline`].

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::model::{
    ExerciseGroup, MAX_FLASH_INTERVAL_MS, MIN_FLASH_INTERVAL_MS, ProgressRecord, Question,
    SessionList, Student, StudentId,
};

pub const STARTUP_DELAY_MS: i64 = 1_000;
pub const FEEDBACK_DELAY_MS: i64 = 2_000;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RevealError {
    #[error("exercise group has no questions")]
    EmptyGroup,

    #[error("flash interval must be between 500 and 5000 ms, got {0} ms")]
    IntervalOutOfRange(u32),

    #[error("cannot accept an answer while {phase}")]
    NotAwaitingInput { phase: RevealPhase },

    #[error("no save or discard decision is pending")]
    NoDecisionPending,
}

//
// ─── TIMING ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    startup_delay: Duration,
    flash_interval: Duration,
    feedback_delay: Duration,
}

impl RevealTiming {
    /// Timing with the fixed startup and feedback delays.
    ///
    /// # Errors
    ///
    /// Returns `RevealError::IntervalOutOfRange` outside 0.5–5 s.
    pub fn new(flash_interval_ms: u32) -> Result<Self, RevealError> {
        if !(MIN_FLASH_INTERVAL_MS..=MAX_FLASH_INTERVAL_MS).contains(&flash_interval_ms) {
            return Err(RevealError::IntervalOutOfRange(flash_interval_ms));
        }
        Ok(Self::with_interval(Duration::milliseconds(i64::from(
            flash_interval_ms,
        ))))
    }

    /// Timing driven by the student's configured flash speed.
    #[must_use]
    pub fn for_student(student: &Student) -> Self {
        Self::with_interval(student.flash_interval())
    }

    fn with_interval(flash_interval: Duration) -> Self {
        Self {
            startup_delay: Duration::milliseconds(STARTUP_DELAY_MS),
            flash_interval,
            feedback_delay: Duration::milliseconds(FEEDBACK_DELAY_MS),
        }
    }

    #[must_use]
    pub fn startup_delay(&self) -> Duration {
        self.startup_delay
    }

    #[must_use]
    pub fn flash_interval(&self) -> Duration {
        self.flash_interval
    }

    #[must_use]
    pub fn feedback_delay(&self) -> Duration {
        self.feedback_delay
    }
}

//
// ─── PHASES AND EVENTS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    /// A question is loaded and waiting for the startup delay.
    Idle,
    /// Stimulus `i` of the current question is on screen.
    Revealing(usize),
    AwaitingInput,
    Feedback { is_correct: bool },
    Complete,
    Exited,
}

impl fmt::Display for RevealPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevealPhase::Idle => f.write_str("waiting to start"),
            RevealPhase::Revealing(i) => write!(f, "revealing number {}", i + 1),
            RevealPhase::AwaitingInput => f.write_str("awaiting input"),
            RevealPhase::Feedback { .. } => f.write_str("showing feedback"),
            RevealPhase::Complete => f.write_str("complete"),
            RevealPhase::Exited => f.write_str("exited"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RevealEvent {
    QuestionLoaded {
        question_id: u32,
        position: usize,
        total: usize,
    },
    Reveal {
        question_id: u32,
        index: usize,
        value: f64,
    },
    InputReady {
        question_id: u32,
    },
    Outcome {
        question_id: u32,
        is_correct: bool,
        correct_answer: f64,
    },
    SessionComplete {
        answered: usize,
        correct: usize,
    },
}

/// Result of leaving a run early or after it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Nothing was answered; the run can be dropped.
    Closed,
    /// Answers exist and must be saved or discarded.
    DecisionRequired { unsaved: usize },
}

//
// ─── SEQUENCER ─────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
pub struct FlashSequencer {
    group: ExerciseGroup,
    student_id: StudentId,
    timing: RevealTiming,
    position: usize,
    phase: RevealPhase,
    deadline: Option<DateTime<Utc>>,
    queued: Vec<RevealEvent>,
    session: SessionList,
}

impl FlashSequencer {
    /// Load the first question of `group`. The startup delay starts at `now`.
    ///
    /// # Errors
    ///
    /// Returns `RevealError::EmptyGroup` if the group has no questions.
    pub fn new(
        group: ExerciseGroup,
        student_id: StudentId,
        timing: RevealTiming,
        now: DateTime<Utc>,
    ) -> Result<Self, RevealError> {
        if group.questions().is_empty() {
            return Err(RevealError::EmptyGroup);
        }

        let session_id = Uuid::new_v4();
        debug!(%session_id, group = group.group(), "starting reveal sequence");

        let mut seq = Self {
            group,
            student_id,
            timing,
            position: 0,
            phase: RevealPhase::Idle,
            deadline: None,
            queued: Vec::new(),
            session: SessionList::new(session_id),
        };
        seq.load_question(now);
        Ok(seq)
    }

    #[must_use]
    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    /// When the pending timer fires, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    #[must_use]
    pub fn group(&self) -> &ExerciseGroup {
        &self.group
    }

    #[must_use]
    pub fn timing(&self) -> RevealTiming {
        self.timing
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_finished() {
            return None;
        }
        self.group.questions().get(self.position)
    }

    #[must_use]
    pub fn session(&self) -> &SessionList {
        &self.session
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, RevealPhase::Complete | RevealPhase::Exited)
    }

    #[must_use]
    pub fn needs_decision(&self) -> bool {
        self.is_finished() && !self.session.is_empty()
    }

    /// Fire every timer due at or before `now`, returning the events in order.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Vec<RevealEvent> {
        let mut events = std::mem::take(&mut self.queued);
        while let Some(deadline) = self.deadline {
            if deadline > now {
                break;
            }
            self.fire(deadline, &mut events);
        }
        events
    }

    /// Grade a response to the current question and record it.
    ///
    /// # Errors
    ///
    /// Returns `RevealError::NotAwaitingInput` unless every number has been shown
    /// and no answer was given yet.
    pub fn submit(&mut self, response: &str, now: DateTime<Utc>) -> Result<RevealEvent, RevealError> {
        if self.phase != RevealPhase::AwaitingInput {
            return Err(RevealError::NotAwaitingInput { phase: self.phase });
        }

        let question = &self.group.questions()[self.position];
        let record = ProgressRecord::answered(
            self.session.session_id(),
            self.student_id,
            &self.group,
            question,
            response,
            now,
        );
        let is_correct = record.is_correct();
        let event = RevealEvent::Outcome {
            question_id: question.id(),
            is_correct,
            correct_answer: question.correct_answer(),
        };
        self.session.push(record);

        self.phase = RevealPhase::Feedback { is_correct };
        self.deadline = Some(now + self.timing.feedback_delay);
        Ok(event)
    }

    /// Abandon the run. Cancels the pending timer.
    pub fn exit(&mut self) -> ExitOutcome {
        self.deadline = None;
        self.queued.clear();
        if self.phase != RevealPhase::Complete {
            self.phase = RevealPhase::Exited;
        }

        if self.session.is_empty() {
            ExitOutcome::Closed
        } else {
            ExitOutcome::DecisionRequired {
                unsaved: self.session.len(),
            }
        }
    }

    /// Unsaved answers of a finished run, for the save or discard decision.
    ///
    /// # Errors
    ///
    /// Returns `RevealError::NoDecisionPending` while the run is still going or
    /// when nothing is left unsaved.
    pub fn pending_session(&mut self) -> Result<&mut SessionList, RevealError> {
        if !self.needs_decision() {
            return Err(RevealError::NoDecisionPending);
        }
        Ok(&mut self.session)
    }

    fn load_question(&mut self, at: DateTime<Utc>) {
        let question_id = self.group.questions()[self.position].id();
        self.phase = RevealPhase::Idle;
        self.deadline = Some(at + self.timing.startup_delay);
        self.queued.push(RevealEvent::QuestionLoaded {
            question_id,
            position: self.position,
            total: self.group.question_count(),
        });
    }

    fn fire(&mut self, at: DateTime<Utc>, events: &mut Vec<RevealEvent>) {
        match self.phase {
            RevealPhase::Idle => self.reveal(0, at, events),
            RevealPhase::Revealing(i) => {
                let count = self.group.questions()[self.position].numbers().len();
                if i + 1 < count {
                    self.reveal(i + 1, at, events);
                } else {
                    let question_id = self.group.questions()[self.position].id();
                    self.phase = RevealPhase::AwaitingInput;
                    self.deadline = None;
                    events.push(RevealEvent::InputReady { question_id });
                }
            }
            RevealPhase::Feedback { .. } => {
                self.position += 1;
                if self.position < self.group.question_count() {
                    self.load_question(at);
                    events.append(&mut self.queued);
                } else {
                    self.phase = RevealPhase::Complete;
                    self.deadline = None;
                    let answered = self.session.len();
                    let correct = self
                        .session
                        .records()
                        .iter()
                        .filter(|r| r.is_correct())
                        .count();
                    debug!(answered, correct, "reveal sequence complete");
                    events.push(RevealEvent::SessionComplete { answered, correct });
                }
            }
            RevealPhase::AwaitingInput | RevealPhase::Complete | RevealPhase::Exited => {
                self.deadline = None;
            }
        }
    }

    fn reveal(&mut self, index: usize, at: DateTime<Utc>, events: &mut Vec<RevealEvent>) {
        let question = &self.group.questions()[self.position];
        events.push(RevealEvent::Reveal {
            question_id: question.id(),
            index,
            value: question.numbers()[index],
        });
        self.phase = RevealPhase::Revealing(index);
        self.deadline = Some(at + self.timing.flash_interval);
    }
}
