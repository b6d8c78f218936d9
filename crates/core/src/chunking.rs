//! Splitting exercise groups into bounded storage chunks and reassembling them.

use thiserror::Error;

use crate::model::{ExerciseError, ExerciseGroup, Level, Question};

/// Upper bound on questions stored in one chunk.
pub const MAX_QUESTIONS_PER_CHUNK: usize = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChunkError {
    #[error("chunk size must be at least 1")]
    ZeroChunkSize,

    #[error("chunk group name cannot be empty")]
    EmptyGroup,

    #[error("chunk {chunk_number} of {total_chunks} is out of range")]
    InvalidPosition { chunk_number: u32, total_chunks: u32 },

    #[error("chunk {chunk_number} has no questions")]
    NoQuestions { chunk_number: u32 },
}

/// A slice of one group's questions as it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseChunk {
    level: Level,
    group: String,
    chunk_number: u32,
    total_chunks: u32,
    total_questions: u32,
    questions: Vec<Question>,
}

impl ExerciseChunk {
    /// # Errors
    ///
    /// Returns `ChunkError` if the chunk position or contents are inconsistent.
    pub fn from_persisted(
        level: Level,
        group: String,
        chunk_number: u32,
        total_chunks: u32,
        total_questions: u32,
        questions: Vec<Question>,
    ) -> Result<Self, ChunkError> {
        if group.trim().is_empty() {
            return Err(ChunkError::EmptyGroup);
        }
        if chunk_number == 0 || chunk_number > total_chunks {
            return Err(ChunkError::InvalidPosition {
                chunk_number,
                total_chunks,
            });
        }
        if questions.is_empty() {
            return Err(ChunkError::NoQuestions { chunk_number });
        }
        Ok(Self {
            level,
            group,
            chunk_number,
            total_chunks,
            total_questions,
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

    /// 1-based position of this chunk within its group.
    #[must_use]
    pub fn chunk_number(&self) -> u32 {
        self.chunk_number
    }

    #[must_use]
    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

/// Split a group into chunks of at most `max_per_chunk` questions.
///
/// # Errors
///
/// Returns `ChunkError::ZeroChunkSize` if `max_per_chunk` is zero.
pub fn split_into_chunks(
    group: &ExerciseGroup,
    max_per_chunk: usize,
) -> Result<Vec<ExerciseChunk>, ChunkError> {
    if max_per_chunk == 0 {
        return Err(ChunkError::ZeroChunkSize);
    }

    let slices: Vec<&[Question]> = group.questions().chunks(max_per_chunk).collect();
    let total_chunks = u32::try_from(slices.len()).unwrap_or(u32::MAX);
    let total_questions = u32::try_from(group.question_count()).unwrap_or(u32::MAX);

    Ok(slices
        .into_iter()
        .zip(1u32..)
        .map(|(slice, chunk_number)| ExerciseChunk {
            level: group.level(),
            group: group.group().to_string(),
            chunk_number,
            total_chunks,
            total_questions,
            questions: slice.to_vec(),
        })
        .collect())
}

/// Reassemble stored chunks into groups.
///
/// Groups come out in the order their first chunk appears. Within a group,
/// chunks are joined by chunk number and the questions are then stably sorted
/// by id.
///
/// # Errors
///
/// Returns `ExerciseError` if the merged questions do not form a valid group,
/// e.g. two chunks carry the same question id.
pub fn merge_chunks(chunks: Vec<ExerciseChunk>) -> Result<Vec<ExerciseGroup>, ExerciseError> {
    let mut order: Vec<(Level, String)> = Vec::new();
    let mut parts: Vec<Vec<ExerciseChunk>> = Vec::new();

    for chunk in chunks {
        let key = (chunk.level, chunk.group.clone());
        match order.iter().position(|k| *k == key) {
            Some(slot) => parts[slot].push(chunk),
            None => {
                order.push(key);
                parts.push(vec![chunk]);
            }
        }
    }

    order
        .into_iter()
        .zip(parts)
        .map(|((level, group), mut pieces)| {
            pieces.sort_by_key(ExerciseChunk::chunk_number);
            let mut questions: Vec<Question> =
                pieces.into_iter().flat_map(|c| c.questions).collect();
            questions.sort_by_key(Question::id);
            ExerciseGroup::new(level, group, questions)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, count: u32) -> ExerciseGroup {
        let questions = (1..=count)
            .map(|id| Question::new(id, vec![f64::from(id)], f64::from(id)).unwrap())
            .collect();
        ExerciseGroup::new(Level::Junior, name, questions).unwrap()
    }

    #[test]
    fn splits_at_the_bound() {
        let chunks = split_into_chunks(&group("Big", 250), MAX_QUESTIONS_PER_CHUNK).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].questions().len(), 100);
        assert_eq!(chunks[2].questions().len(), 50);
        assert!(chunks.iter().all(|c| c.total_chunks() == 3 && c.total_questions() == 250));
        assert_eq!(chunks[2].chunk_number(), 3);
    }

    #[test]
    fn small_group_is_one_chunk() {
        let chunks = split_into_chunks(&group("Small", 3), MAX_QUESTIONS_PER_CHUNK).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_number(), 1);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert_eq!(
            split_into_chunks(&group("A", 1), 0).unwrap_err(),
            ChunkError::ZeroChunkSize
        );
    }

    #[test]
    fn merge_restores_groups_in_first_seen_order() {
        let a = group("A", 5);
        let b = group("B", 2);
        let mut chunks = split_into_chunks(&a, 2).unwrap();
        chunks.extend(split_into_chunks(&b, 2).unwrap());
        // Stored order is not guaranteed to follow chunk numbers.
        chunks.swap(0, 2);

        let merged = merge_chunks(chunks).unwrap();
        assert_eq!(merged, vec![a, b]);
    }

    #[test]
    fn merge_rejects_overlapping_chunks() {
        let a = group("A", 2);
        let mut chunks = split_into_chunks(&a, 10).unwrap();
        chunks.push(chunks[0].clone());
        let err = merge_chunks(chunks).unwrap_err();
        assert!(matches!(err, ExerciseError::DuplicateQuestionId { .. }));
    }

    #[test]
    fn persisted_chunk_positions_are_checked() {
        let q = Question::new(1, vec![1.0], 1.0).unwrap();
        let err =
            ExerciseChunk::from_persisted(Level::Basic, "A".into(), 3, 2, 1, vec![q]).unwrap_err();
        assert_eq!(
            err,
            ChunkError::InvalidPosition {
                chunk_number: 3,
                total_chunks: 2
            }
        );
    }
}
