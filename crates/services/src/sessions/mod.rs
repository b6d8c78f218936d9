mod decision;
mod workflow;

// Public API of the practice subsystem.
pub use crate::error::SessionError;
pub use decision::{DecisionOutcome, SaveDecision};
pub use workflow::FlashSessionService;
