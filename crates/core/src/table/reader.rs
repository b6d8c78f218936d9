use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::debug;

use super::{
    ANSWER_COLUMN, DEFAULT_GROUP_NAME, FIRST_NUMBER_COLUMN, LAST_NUMBER_COLUMN, is_group_marker,
};
use crate::model::{ExerciseError, ExerciseGroup, Level, Question, QuestionError};

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    #[error("quoted field starting on line {line} is never closed")]
    UnterminatedQuote { line: usize },

    #[error("unable to find a comma delimiter in the table")]
    NoDelimiter,

    #[error("malformed table near line {line:?}: {reason}")]
    Malformed { line: Option<u64>, reason: String },

    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error(transparent)]
    Exercise(#[from] ExerciseError),
}

/// Parse an uploaded question table into exercise groups tagged with `level`.
///
/// Rows that carry no usable numbers or no numeric answer are dropped.
///
/// # Errors
///
/// Returns `ParseError` when the table structure itself is broken; nothing is
/// returned for the rows that did parse.
pub fn parse_exercises(input: &str, level: Level) -> Result<Vec<ExerciseGroup>, ParseError> {
    if let Some(line) = unterminated_quote_line(input) {
        return Err(ParseError::UnterminatedQuote { line });
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ParseError::Malformed {
            line: e.position().map(csv::Position::line),
            reason: e.to_string(),
        })?;
        rows.push(record);
    }

    if !rows.is_empty() && rows.iter().all(|row| row.len() < 2) {
        return Err(ParseError::NoDelimiter);
    }

    let mut acc = GroupAccumulator::new(level);
    for (index, row) in rows.iter().enumerate() {
        let first = row.get(0).unwrap_or("");
        if is_group_marker(first) {
            if index == 0 && is_column_header(row) {
                continue;
            }
            acc.start_group(row)?;
            continue;
        }

        match question_from_row(row, acc.next_id())? {
            Some(question) => acc.questions.push(question),
            None => debug!(row = index + 1, "dropping row without numbers or answer"),
        }
    }

    let groups = acc.finish()?;
    debug!(groups = groups.len(), %level, "parsed exercise table");
    Ok(groups)
}

struct GroupAccumulator {
    level: Level,
    current: Option<String>,
    questions: Vec<Question>,
    groups: Vec<ExerciseGroup>,
}

impl GroupAccumulator {
    fn new(level: Level) -> Self {
        Self {
            level,
            current: None,
            questions: Vec::new(),
            groups: Vec::new(),
        }
    }

    fn next_id(&self) -> u32 {
        u32::try_from(self.questions.len())
            .unwrap_or(u32::MAX - 1)
            .saturating_add(1)
    }

    fn flush(&mut self) -> Result<(), ParseError> {
        if self.questions.is_empty() {
            return Ok(());
        }
        let name = self
            .current
            .clone()
            .unwrap_or_else(|| DEFAULT_GROUP_NAME.to_string());
        let questions = std::mem::take(&mut self.questions);
        self.groups
            .push(ExerciseGroup::new(self.level, name, questions)?);
        Ok(())
    }

    fn start_group(&mut self, row: &StringRecord) -> Result<(), ParseError> {
        self.flush()?;
        self.current = Some(group_name(row, self.groups.len()));
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<ExerciseGroup>, ParseError> {
        self.flush()?;
        Ok(self.groups)
    }
}

/// The first row is a column header, not a group, when it has the header's shape:
/// `Question ID` in the id column or `Answer` in the answer column.
fn is_column_header(row: &StringRecord) -> bool {
    let cell = |index| row.get(index).map(str::trim).unwrap_or("");
    cell(1).eq_ignore_ascii_case("question id")
        || cell(ANSWER_COLUMN).eq_ignore_ascii_case("answer")
}

fn group_name(row: &StringRecord, emitted: usize) -> String {
    let second = row.get(1).map(str::trim).unwrap_or("");
    if !second.is_empty() {
        return second.to_string();
    }

    // `Group: Name` written in a single cell.
    let inline = row
        .get(0)
        .and_then(|cell| cell.split_once(':'))
        .map(|(_, rest)| rest.trim())
        .unwrap_or("");
    if !inline.is_empty() {
        return inline.to_string();
    }

    format!("Group {}", emitted + 1)
}

fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn question_from_row(row: &StringRecord, id: u32) -> Result<Option<Question>, ParseError> {
    let numbers: Vec<f64> = (FIRST_NUMBER_COLUMN..=LAST_NUMBER_COLUMN)
        .filter_map(|col| row.get(col).and_then(parse_number))
        .collect();
    let answer = row.get(ANSWER_COLUMN).and_then(parse_number);

    match answer {
        Some(answer) if !numbers.is_empty() => Ok(Some(Question::new(id, numbers, answer)?)),
        _ => Ok(None),
    }
}

/// Line on which a quoted field opens without ever closing.
fn unterminated_quote_line(input: &str) -> Option<usize> {
    let mut line = 1;
    let mut opened_at = 0;
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => line += 1,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if at_field_start => {
                in_quotes = true;
                opened_at = line;
                at_field_start = false;
            }
            ',' | '\r' => at_field_start = true,
            '\n' => {
                line += 1;
                at_field_start = true;
            }
            _ => at_field_start = false,
        }
    }

    in_quotes.then_some(opened_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(group: &ExerciseGroup, index: usize) -> Vec<f64> {
        group.questions()[index].numbers().to_vec()
    }

    #[test]
    fn skips_column_header_and_groups_questions() {
        let input = "\
Group,Question ID,Num1,Num2,Num3,Num4,Num5,Num6,Num7,Answer
Group,Warmup,,,,,,,,
,1,4,7,2,,,,,13
,2,1,1,,,,,,2
Group,Tens,,,,,,,,
,1,10,20,,,,,,30
";
        let groups = parse_exercises(input, Level::Basic).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group(), "Warmup");
        assert_eq!(groups[0].question_count(), 2);
        assert_eq!(numbers(&groups[0], 0), vec![4.0, 7.0, 2.0]);
        assert_eq!(groups[0].questions()[0].correct_answer(), 13.0);
        assert_eq!(groups[1].group(), "Tens");
        assert_eq!(groups[1].level(), Level::Basic);
    }

    #[test]
    fn first_group_named_answer_is_not_a_header() {
        let input = "Group,Answer\n,1,1,2,,,,,,3\n";
        let groups = parse_exercises(input, Level::Basic).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group(), "Answer");
    }

    #[test]
    fn header_without_answer_label_is_still_skipped() {
        let input = "Group,Question ID,Num1\nGroup,Real\n,1,1,2,,,,,,3\n";
        let groups = parse_exercises(input, Level::Basic).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group(), "Real");
    }

    #[test]
    fn extracts_only_numeric_cells_in_column_order() {
        let input = "\
Group,Mixed
x,y,,5,abc,-3, ,2.5,,4.5
";
        let groups = parse_exercises(input, Level::Junior).unwrap();
        assert_eq!(numbers(&groups[0], 0), vec![5.0, -3.0, 2.5]);
        assert_eq!(groups[0].questions()[0].correct_answer(), 4.5);
    }

    #[test]
    fn ignores_cells_past_the_number_span() {
        let input = ",,1,2,3,4,5,6,7,28,99,100\n";
        let groups = parse_exercises(input, Level::Basic).unwrap();
        assert_eq!(numbers(&groups[0], 0).len(), 7);
        assert_eq!(groups[0].questions()[0].correct_answer(), 28.0);
    }

    #[test]
    fn drops_rows_without_numbers_or_answer() {
        let input = "\
Group,Only
,1,,,,,,,,5
,2,3,4,,,,,,
,3,3,4,,,,,,seven
,4,3,4,,,,,,7
";
        let groups = parse_exercises(input, Level::Basic).unwrap();
        assert_eq!(groups[0].question_count(), 1);
        assert_eq!(groups[0].questions()[0].id(), 1);
        assert_eq!(numbers(&groups[0], 0), vec![3.0, 4.0]);
    }

    #[test]
    fn header_with_no_questions_emits_nothing() {
        let input = "\
Group,Empty,,,,,,,,
Group,Full,,,,,,,,
,1,1,2,,,,,,3
Group,AlsoEmpty,,,,,,,,
";
        let groups = parse_exercises(input, Level::Basic).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group(), "Full");
    }

    #[test]
    fn generates_names_for_unnamed_groups() {
        let input = "\
Group,First
,1,1,1,,,,,,2
group,
,1,2,2,,,,,,4
Group: Inline,
,1,3,3,,,,,,6
";
        let groups = parse_exercises(input, Level::Basic).unwrap();
        let names: Vec<&str> = groups.iter().map(ExerciseGroup::group).collect();
        assert_eq!(names, vec!["First", "Group 2", "Inline"]);
    }

    #[test]
    fn questions_without_header_use_default_group() {
        let input = "\
,1,1,2,,,,,,3
,2,2,2,,,,,,4
";
        let groups = parse_exercises(input, Level::Junior).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group(), DEFAULT_GROUP_NAME);
        let ids: Vec<u32> = groups[0].questions().iter().map(Question::id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn ids_restart_in_each_group() {
        let input = "\
Group,A
,9,1,1,,,,,,2
,9,1,2,,,,,,3
Group,B
,9,5,5,,,,,,10
";
        let groups = parse_exercises(input, Level::Basic).unwrap();
        assert_eq!(groups[0].questions()[1].id(), 2);
        assert_eq!(groups[1].questions()[0].id(), 1);
    }

    #[test]
    fn unterminated_quote_is_parse_error() {
        let input = "Group,A\n,1,\"2,3\n,4,5\n";
        let err = parse_exercises(input, Level::Basic).unwrap_err();
        assert_eq!(err, ParseError::UnterminatedQuote { line: 2 });
    }

    #[test]
    fn single_column_input_is_parse_error() {
        let err = parse_exercises("just\nwords\n", Level::Basic).unwrap_err();
        assert_eq!(err, ParseError::NoDelimiter);
    }

    #[test]
    fn quoted_group_names_are_supported() {
        let input = "Group,\"Sums, part 1\"\n,1,1,2,,,,,,3\n";
        let groups = parse_exercises(input, Level::Basic).unwrap();
        assert_eq!(groups[0].group(), "Sums, part 1");
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(parse_exercises("", Level::Basic).unwrap().is_empty());
    }
}
