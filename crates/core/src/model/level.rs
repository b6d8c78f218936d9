use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LevelError {
    #[error("level must be Basic or Junior, got {0:?}")]
    Unknown(String),
}

/// Difficulty tier shared by classrooms and exercise groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    #[default]
    Basic,
    Junior,
}

impl Level {
    pub const ALL: [Level; 2] = [Level::Basic, Level::Junior];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Basic => "Basic",
            Level::Junior => "Junior",
        }
    }

    /// Guess the level from an uploaded file name.
    ///
    /// Names mentioning "junior" map to `Junior`; everything else is `Basic`.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.to_lowercase().contains("junior") {
            Level::Junior
        } else {
            Level::Basic
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LevelError::Unknown(s.to_string()))
    }
}
