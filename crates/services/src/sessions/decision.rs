use std::fmt;
use std::str::FromStr;

/// What to do with the answers of a finished or abandoned run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDecision {
    Save,
    Discard,
}

impl FromStr for SaveDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "save" | "y" | "yes" => Ok(SaveDecision::Save),
            "d" | "discard" | "n" | "no" => Ok(SaveDecision::Discard),
            other => Err(format!("expected save or discard, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    Saved(usize),
    Discarded(usize),
}

impl fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionOutcome::Saved(n) => write!(f, "saved {n} answers"),
            DecisionOutcome::Discarded(n) => write!(f, "discarded {n} answers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prompt_answers() {
        assert_eq!("S".parse::<SaveDecision>(), Ok(SaveDecision::Save));
        assert_eq!(" discard ".parse::<SaveDecision>(), Ok(SaveDecision::Discard));
        assert!("maybe".parse::<SaveDecision>().is_err());
    }
}
