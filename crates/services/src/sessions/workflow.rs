use std::sync::Arc;

use flash_core::model::Level;
use flash_core::reveal::{ExitOutcome, FlashSequencer, RevealEvent, RevealTiming};
use tracing::info;

use super::decision::{DecisionOutcome, SaveDecision};
use crate::Clock;
use crate::account::UserSession;
use crate::error::SessionError;
use crate::exercise_service::ExerciseService;
use crate::progress_service::ProgressService;

/// Runs practice sessions against the clock and stores their outcome.
#[derive(Clone)]
pub struct FlashSessionService {
    clock: Clock,
    exercises: Arc<ExerciseService>,
    progress: Arc<ProgressService>,
}

impl FlashSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        exercises: Arc<ExerciseService>,
        progress: Arc<ProgressService>,
    ) -> Self {
        Self {
            clock,
            exercises,
            progress,
        }
    }

    /// Start a run over one group, timed by the student's flash speed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAStudent` for a teacher session and
    /// `SessionError::Exercise` if the group does not exist.
    pub async fn start(
        &self,
        user: &UserSession,
        level: Level,
        group: &str,
    ) -> Result<FlashSequencer, SessionError> {
        let student = user.student().ok_or(SessionError::NotAStudent)?;
        let group = self.exercises.find_group(level, group).await?;
        info!(
            student_id = %student.id(),
            group = group.group(),
            questions = group.question_count(),
            "starting practice"
        );
        let timing = RevealTiming::for_student(student);
        Ok(FlashSequencer::new(
            group,
            student.id(),
            timing,
            self.clock.now(),
        )?)
    }

    /// Fire every timer that is due now.
    pub fn advance(&self, seq: &mut FlashSequencer) -> Vec<RevealEvent> {
        seq.advance(self.clock.now())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Reveal` if the run is not waiting for an answer.
    pub fn submit(
        &self,
        seq: &mut FlashSequencer,
        response: &str,
    ) -> Result<RevealEvent, SessionError> {
        Ok(seq.submit(response, self.clock.now())?)
    }

    pub fn exit(&self, seq: &mut FlashSequencer) -> ExitOutcome {
        let outcome = seq.exit();
        info!(?outcome, "practice exited");
        outcome
    }

    /// Apply the save or discard choice for a finished run.
    ///
    /// A failed save leaves the answers in place so the choice can be made again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Reveal` if no decision is pending and
    /// `SessionError::Persistence` if saving fails.
    pub async fn resolve(
        &self,
        seq: &mut FlashSequencer,
        decision: SaveDecision,
    ) -> Result<DecisionOutcome, SessionError> {
        let list = seq.pending_session()?;
        match decision {
            SaveDecision::Save => {
                let saved = self.progress.save_session(list).await?;
                Ok(DecisionOutcome::Saved(saved))
            }
            SaveDecision::Discard => Ok(DecisionOutcome::Discarded(
                self.progress.discard_session(list),
            )),
        }
    }
}
