//! Per-step market snapshot consumed by all decision logic.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Immutable per-tick market snapshot. Produced by an external data
/// collaborator; read-only to every core component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    /// Last trade price, USD. Must be > 0.
    pub price: f64,
    /// Trading volume over the bar. Must be >= 0.
    pub volume: f64,
    /// Realized volatility (fractional, e.g. 0.03 = 3%). Must be >= 0.
    pub volatility: f64,
    /// Dollar index, when the macro feed provides it.
    pub dxy: Option<f64>,
    /// VIX level, when the macro feed provides it.
    pub vix: Option<f64>,
    /// Fear & Greed index in [0, 100].
    pub fear_greed: Option<f64>,
}

impl MarketState {
    pub fn new(price: f64, volume: f64, volatility: f64) -> Self {
        Self {
            price,
            volume,
            volatility,
            dxy: None,
            vix: None,
            fear_greed: None,
        }
    }

    /// Bounds check. A malformed snapshot is a caller error, not something
    /// to clamp into shape.
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(SimError::Validation(format!("price must be > 0, got {}", self.price)));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(SimError::Validation(format!("volume must be >= 0, got {}", self.volume)));
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(SimError::Validation(format!(
                "volatility must be >= 0, got {}",
                self.volatility
            )));
        }
        if let Some(fg) = self.fear_greed {
            if !(0.0..=100.0).contains(&fg) {
                return Err(SimError::Validation(format!(
                    "fear_greed must be in [0,100], got {}",
                    fg
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_snapshot_passes() {
        let mut m = MarketState::new(112_000.0, 1e9, 0.03);
        m.fear_greed = Some(55.0);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn zero_price_rejected() {
        let m = MarketState::new(0.0, 1e9, 0.03);
        assert!(matches!(m.validate(), Err(SimError::Validation(_))));
    }

    #[test]
    fn negative_volume_rejected() {
        let m = MarketState::new(100.0, -1.0, 0.03);
        assert!(m.validate().is_err());
    }

    #[test]
    fn fear_greed_out_of_range_rejected() {
        let mut m = MarketState::new(100.0, 1.0, 0.03);
        m.fear_greed = Some(101.0);
        assert!(m.validate().is_err());

        m.fear_greed = Some(100.0);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn nan_price_rejected() {
        let m = MarketState::new(f64::NAN, 1.0, 0.03);
        assert!(m.validate().is_err());
    }
}
