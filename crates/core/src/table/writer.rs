use csv::WriterBuilder;
use thiserror::Error;

use super::{ANSWER_COLUMN, COLUMN_COUNT, FIRST_NUMBER_COLUMN, NUMBER_COLUMNS};
use crate::model::ExerciseGroup;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    #[error("question {question_id} in group {group:?} has {count} numbers; the table holds at most 7")]
    TooManyNumbers {
        group: String,
        question_id: u32,
        count: usize,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("failed to finish table: {0}")]
    Io(String),
}

const HEADER: [&str; COLUMN_COUNT] = [
    "Group",
    "Question ID",
    "Num1",
    "Num2",
    "Num3",
    "Num4",
    "Num5",
    "Num6",
    "Num7",
    "Answer",
];

/// Render groups in the same table layout `parse_exercises` reads.
///
/// Every row has exactly ten cells. Questions are written in id order.
///
/// # Errors
///
/// Returns `ExportError::TooManyNumbers` when a question cannot fit the seven
/// number columns.
pub fn write_exercises(groups: &[ExerciseGroup]) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for group in groups {
        let mut header = blank_row();
        header[0] = "Group".to_string();
        header[1] = group.group().to_string();
        writer.write_record(&header)?;

        for question in group.questions_by_id() {
            let count = question.numbers().len();
            if count > NUMBER_COLUMNS {
                return Err(ExportError::TooManyNumbers {
                    group: group.group().to_string(),
                    question_id: question.id(),
                    count,
                });
            }

            let mut row = blank_row();
            row[1] = question.id().to_string();
            for (offset, number) in question.numbers().iter().enumerate() {
                row[FIRST_NUMBER_COLUMN + offset] = number.to_string();
            }
            row[ANSWER_COLUMN] = question.correct_answer().to_string();
            writer.write_record(&row)?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.error().to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Io(e.to_string()))
}

fn blank_row() -> Vec<String> {
    vec![String::new(); COLUMN_COUNT]
}
