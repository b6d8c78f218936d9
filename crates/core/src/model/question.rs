use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id must be >= 1")]
    InvalidId,

    #[error("question {id} has no numbers to flash")]
    EmptyNumbers { id: u32 },

    #[error("question {id} contains a non-finite number")]
    NonFiniteNumber { id: u32 },

    #[error("question {id} has a non-finite correct answer")]
    NonFiniteAnswer { id: u32 },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One practice item: a run of numbers flashed in order plus the expected result.
///
/// Deserializing goes through [`Question::new`], so stored rows are re-validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuestionFields")]
pub struct Question {
    id: u32,
    numbers: Vec<f64>,
    correct_answer: f64,
}

#[derive(Deserialize)]
struct QuestionFields {
    id: u32,
    numbers: Vec<f64>,
    correct_answer: f64,
}

impl TryFrom<QuestionFields> for Question {
    type Error = QuestionError;

    fn try_from(fields: QuestionFields) -> Result<Self, Self::Error> {
        Question::new(fields.id, fields.numbers, fields.correct_answer)
    }
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id is zero, `numbers` is empty, or any
    /// value is NaN or infinite.
    pub fn new(id: u32, numbers: Vec<f64>, correct_answer: f64) -> Result<Self, QuestionError> {
        if id == 0 {
            return Err(QuestionError::InvalidId);
        }
        if numbers.is_empty() {
            return Err(QuestionError::EmptyNumbers { id });
        }
        if numbers.iter().any(|n| !n.is_finite()) {
            return Err(QuestionError::NonFiniteNumber { id });
        }
        if !correct_answer.is_finite() {
            return Err(QuestionError::NonFiniteAnswer { id });
        }

        Ok(Self {
            id,
            numbers,
            correct_answer,
        })
    }

    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn numbers(&self) -> &[f64] {
        &self.numbers
    }

    #[must_use]
    pub fn correct_answer(&self) -> f64 {
        self.correct_answer
    }

    /// Checks a raw learner response against the expected answer.
    ///
    /// Responses are compared as integers. Anything that does not parse as an
    /// integer (decimals, words, blanks) counts as incorrect.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn is_correct(&self, response: &str) -> bool {
        response
            .trim()
            .parse::<i64>()
            .is_ok_and(|value| value as f64 == self.correct_answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thirteen() -> Question {
        Question::new(1, vec![4.0, 7.0, 2.0], 13.0).unwrap()
    }

    #[test]
    fn integer_response_matches() {
        let q = thirteen();
        assert!(q.is_correct("13"));
        assert!(q.is_correct(" 13\n"));
        assert!(!q.is_correct("12"));
    }

    #[test]
    fn non_integer_response_is_incorrect_not_error() {
        let q = thirteen();
        assert!(!q.is_correct("13.5"));
        assert!(!q.is_correct("abc"));
        assert!(!q.is_correct(""));
    }

    #[test]
    fn negative_answers_compare() {
        let q = Question::new(2, vec![3.0, -8.0], -5.0).unwrap();
        assert!(q.is_correct("-5"));
    }

    #[test]
    fn rejects_empty_numbers() {
        let err = Question::new(1, Vec::new(), 1.0).unwrap_err();
        assert_eq!(err, QuestionError::EmptyNumbers { id: 1 });
    }

    #[test]
    fn rejects_zero_id_and_nan() {
        assert_eq!(
            Question::new(0, vec![1.0], 1.0).unwrap_err(),
            QuestionError::InvalidId
        );
        assert_eq!(
            Question::new(3, vec![f64::NAN], 1.0).unwrap_err(),
            QuestionError::NonFiniteNumber { id: 3 }
        );
        assert_eq!(
            Question::new(3, vec![1.0], f64::INFINITY).unwrap_err(),
            QuestionError::NonFiniteAnswer { id: 3 }
        );
    }

    #[test]
    fn deserializing_revalidates() {
        let q: Question =
            serde_json::from_str(r#"{"id":1,"numbers":[4.0,7.0,2.0],"correct_answer":13.0}"#)
                .unwrap();
        assert_eq!(q, thirteen());
        assert_eq!(
            serde_json::to_string(&q).unwrap(),
            r#"{"id":1,"numbers":[4.0,7.0,2.0],"correct_answer":13.0}"#
        );

        let err = serde_json::from_str::<Question>(r#"{"id":3,"numbers":[],"correct_answer":1.0}"#)
            .unwrap_err();
        assert!(err.to_string().contains("question 3 has no numbers"));
    }
}
