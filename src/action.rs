//! Action vocabulary: the buy/sell/hold triple used by decision logic and
//! the ordinal 0-8 codes used on the wire and in the event store.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Direction of a proposed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Buy,
    Sell,
    Hold,
}

impl ActionType {
    /// Numeric vote used by the hybrid blend: buy=+1, hold=0, sell=-1.
    pub fn vote(&self) -> f64 {
        match self {
            ActionType::Buy => 1.0,
            ActionType::Hold => 0.0,
            ActionType::Sell => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Buy => "buy",
            ActionType::Sell => "sell",
            ActionType::Hold => "hold",
        }
    }
}

/// Persisted action codes. Ordinal layout is a wire contract: codes round-trip
/// to/from integers 0-8 and unknown codes fail loudly.
///
/// RampEz (7) and Trac (8) have no decision-policy rule; they are reachable
/// only via the external advisor or manual override, and stay valid members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionCode {
    Hold,
    Long025,
    Long050,
    Long100,
    Short025,
    Short050,
    Short100,
    RampEz,
    Trac,
}

impl ActionCode {
    pub fn code(&self) -> u8 {
        match self {
            ActionCode::Hold => 0,
            ActionCode::Long025 => 1,
            ActionCode::Long050 => 2,
            ActionCode::Long100 => 3,
            ActionCode::Short025 => 4,
            ActionCode::Short050 => 5,
            ActionCode::Short100 => 6,
            ActionCode::RampEz => 7,
            ActionCode::Trac => 8,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, SimError> {
        match code {
            0 => Ok(ActionCode::Hold),
            1 => Ok(ActionCode::Long025),
            2 => Ok(ActionCode::Long050),
            3 => Ok(ActionCode::Long100),
            4 => Ok(ActionCode::Short025),
            5 => Ok(ActionCode::Short050),
            6 => Ok(ActionCode::Short100),
            7 => Ok(ActionCode::RampEz),
            8 => Ok(ActionCode::Trac),
            other => Err(SimError::Validation(format!("unknown action code {}", other))),
        }
    }

    /// Risk fraction of capital committed by this code (RampEz is +10% of
    /// capital, Trac a fixed +2% of the base asset).
    pub fn risk_pct(&self) -> f64 {
        match self {
            ActionCode::Hold => 0.0,
            ActionCode::Long025 | ActionCode::Short025 => 0.25,
            ActionCode::Long050 | ActionCode::Short050 => 0.5,
            ActionCode::Long100 | ActionCode::Short100 => 1.0,
            ActionCode::RampEz => 10.0,
            ActionCode::Trac => 2.0,
        }
    }

    pub fn direction(&self) -> ActionType {
        match self {
            ActionCode::Hold => ActionType::Hold,
            ActionCode::Long025 | ActionCode::Long050 | ActionCode::Long100 => ActionType::Buy,
            ActionCode::Short025 | ActionCode::Short050 | ActionCode::Short100 => ActionType::Sell,
            // Ramp/Trac both add exposure.
            ActionCode::RampEz | ActionCode::Trac => ActionType::Buy,
        }
    }

    /// Coarse mapping from a blended (type, size) decision back into the
    /// persisted code vocabulary.
    pub fn from_decision(kind: ActionType, size: f64) -> Self {
        match kind {
            ActionType::Hold => ActionCode::Hold,
            ActionType::Buy => {
                if size >= 1.0 {
                    ActionCode::Long100
                } else if size >= 0.5 {
                    ActionCode::Long050
                } else {
                    ActionCode::Long025
                }
            }
            ActionType::Sell => {
                if size >= 1.0 {
                    ActionCode::Short100
                } else if size >= 0.5 {
                    ActionCode::Short050
                } else {
                    ActionCode::Short025
                }
            }
        }
    }
}

/// One actor's proposed move for the current tick. Never persisted beyond
/// the step that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedAction {
    pub kind: ActionType,
    pub size: f64,
    pub reasoning: String,
}

impl ProposedAction {
    pub fn hold(reasoning: impl Into<String>) -> Self {
        Self {
            kind: ActionType::Hold,
            size: 0.0,
            reasoning: reasoning.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0u8..=8 {
            let action = ActionCode::from_code(code).unwrap();
            assert_eq!(action.code(), code);
        }
    }

    #[test]
    fn unknown_code_fails() {
        assert!(ActionCode::from_code(9).is_err());
        assert!(ActionCode::from_code(255).is_err());
    }

    #[test]
    fn votes_are_signed() {
        assert_eq!(ActionType::Buy.vote(), 1.0);
        assert_eq!(ActionType::Hold.vote(), 0.0);
        assert_eq!(ActionType::Sell.vote(), -1.0);
    }

    #[test]
    fn decision_maps_to_nearest_code() {
        assert_eq!(ActionCode::from_decision(ActionType::Buy, 0.3), ActionCode::Long025);
        assert_eq!(ActionCode::from_decision(ActionType::Buy, 0.7), ActionCode::Long050);
        assert_eq!(ActionCode::from_decision(ActionType::Sell, 1.5), ActionCode::Short100);
        assert_eq!(ActionCode::from_decision(ActionType::Hold, 9.0), ActionCode::Hold);
    }

    #[test]
    fn ramp_and_trac_stay_reachable() {
        // Not produced by any policy rule, but must parse from the wire.
        assert_eq!(ActionCode::from_code(7).unwrap(), ActionCode::RampEz);
        assert_eq!(ActionCode::from_code(8).unwrap(), ActionCode::Trac);
        assert_eq!(ActionCode::RampEz.risk_pct(), 10.0);
        assert_eq!(ActionCode::Trac.risk_pct(), 2.0);
    }
}
