//! Flat CSV exchange format for exercise groups.
//!
//! Layout (0-based columns):
//!
//! | 0          | 1           | 2..=8          | 9      |
//! |------------|-------------|----------------|--------|
//! | `Group`    | group name  |                |        |
//! | (ignored)  | question id | flashed numbers| answer |
//!
//! A row whose first cell mentions "group" starts a new group; every other
//! row is a question candidate.

mod reader;
mod writer;

pub use reader::{ParseError, parse_exercises};
pub use writer::{ExportError, write_exercises};

/// Name used for questions that appear before any group-header row.
pub const DEFAULT_GROUP_NAME: &str = "Default Group";

pub const FIRST_NUMBER_COLUMN: usize = 2;
pub const LAST_NUMBER_COLUMN: usize = 8;
pub const ANSWER_COLUMN: usize = 9;
pub const COLUMN_COUNT: usize = 10;
pub const NUMBER_COLUMNS: usize = LAST_NUMBER_COLUMN - FIRST_NUMBER_COLUMN + 1;

pub(crate) fn is_group_marker(cell: &str) -> bool {
    cell.to_lowercase().contains("group")
}
