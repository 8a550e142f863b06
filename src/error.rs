//! Error taxonomy for the simulation core.
//!
//! Four failure classes with distinct handling contracts:
//! - `Validation`: caller error, always surfaced, never silently corrected.
//! - `CollaboratorUnavailable`: advisor timeout/retry exhaustion, recovered
//!   locally by the orchestrator (not fatal to the episode).
//! - `DegenerateState`: impossible population state, fatal for the step.
//! - `Persistence`: best-effort telemetry failure, logged and swallowed.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Malformed market state, out-of-range action code, bad tier weights.
    Validation(String),
    /// External vote collaborator failed after all retries.
    CollaboratorUnavailable { attempts: u32, reason: String },
    /// Empty actor population or similar impossible state.
    DegenerateState(String),
    /// Event store write failed.
    Persistence(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Validation(msg) => write!(f, "validation: {}", msg),
            SimError::CollaboratorUnavailable { attempts, reason } => {
                write!(f, "collaborator unavailable after {} attempts: {}", attempts, reason)
            }
            SimError::DegenerateState(msg) => write!(f, "degenerate state: {}", msg),
            SimError::Persistence(msg) => write!(f, "persistence: {}", msg),
        }
    }
}

impl std::error::Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_attempt_count() {
        let e = SimError::CollaboratorUnavailable {
            attempts: 3,
            reason: "timeout".to_string(),
        };
        let s = e.to_string();
        assert!(s.contains("3 attempts"));
        assert!(s.contains("timeout"));
    }
}
