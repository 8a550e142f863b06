//! Nash equilibrium monitor over the actor population.
//!
//! Deviation is the L1 distance between the observed (long-ratio, short-ratio)
//! pair and a fixed target mixed-strategy point. The target is asymmetric on
//! purpose: swapping every position sign does NOT leave the deviation
//! invariant unless the target ratios are swapped too. That asymmetry is a
//! documented property of the model, not a bug.

use serde::{Deserialize, Serialize};

use crate::actor::ActorState;
use crate::error::SimError;

#[derive(Debug, Clone)]
pub struct NashConfig {
    /// Target long ratio of the mixed-strategy point.
    pub target_long: f64,
    /// Target short ratio of the mixed-strategy point.
    pub target_short: f64,
    /// Deviation below this counts as equilibrium.
    pub equilibrium_threshold: f64,
    /// Either ratio above this is a crowding warning.
    pub crowded_threshold: f64,
}

impl Default for NashConfig {
    fn default() -> Self {
        Self {
            target_long: 0.4,
            target_short: 0.6,
            equilibrium_threshold: 0.2,
            crowded_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NashState {
    pub is_equilibrium: bool,
    pub deviation: f64,
    pub analysis: String,
}

/// Compute the population's equilibrium state from position signs. Neutral
/// actors count toward N but toward neither ratio. An empty population is a
/// degenerate state, never a silent default.
pub fn check_equilibrium(actors: &[ActorState], cfg: &NashConfig) -> Result<NashState, SimError> {
    if actors.is_empty() {
        return Err(SimError::DegenerateState(
            "cannot check equilibrium over an empty actor population".to_string(),
        ));
    }

    let n = actors.len() as f64;
    let longs = actors.iter().filter(|a| a.position_size > 0.0).count() as f64;
    let shorts = actors.iter().filter(|a| a.position_size < 0.0).count() as f64;
    let long_ratio = longs / n;
    let short_ratio = shorts / n;

    let deviation =
        (long_ratio - cfg.target_long).abs() + (short_ratio - cfg.target_short).abs();
    let is_equilibrium = deviation < cfg.equilibrium_threshold;

    let analysis = if is_equilibrium {
        format!("population in equilibrium (deviation {:.3})", deviation)
    } else if long_ratio > cfg.crowded_threshold {
        format!("crowded long: {:.0}% of actors long, squeeze risk", long_ratio * 100.0)
    } else if short_ratio > cfg.crowded_threshold {
        format!("crowded short: {:.0}% of actors short, squeeze risk", short_ratio * 100.0)
    } else {
        format!("seeking equilibrium (deviation {:.3})", deviation)
    };

    Ok(NashState {
        is_equilibrium,
        deviation,
        analysis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorState, Archetype};

    fn actors_with_positions(positions: &[f64]) -> Vec<ActorState> {
        positions
            .iter()
            .map(|p| {
                let mut a = ActorState::new(Archetype::Retail);
                a.position_size = *p;
                a
            })
            .collect()
    }

    #[test]
    fn target_split_is_perfect_equilibrium() {
        // 5 actors: 2 long, 3 short -> ratios (0.4, 0.6), deviation 0.
        let actors = actors_with_positions(&[1.0, 1.0, -1.0, -1.0, -1.0]);
        let state = check_equilibrium(&actors, &NashConfig::default()).unwrap();
        assert!(state.deviation.abs() < 1e-12);
        assert!(state.is_equilibrium);
        assert!(state.analysis.contains("in equilibrium"));
    }

    #[test]
    fn empty_population_errors() {
        let err = check_equilibrium(&[], &NashConfig::default()).unwrap_err();
        assert!(matches!(err, SimError::DegenerateState(_)));
    }

    #[test]
    fn neutral_actors_count_toward_n_only() {
        // 1 long, 1 short, 2 flat -> ratios (0.25, 0.25), deviation 0.5.
        let actors = actors_with_positions(&[1.0, -1.0, 0.0, 0.0]);
        let state = check_equilibrium(&actors, &NashConfig::default()).unwrap();
        assert!((state.deviation - 0.5).abs() < 1e-12);
        assert!(!state.is_equilibrium);
    }

    #[test]
    fn crowded_long_warning() {
        let actors = actors_with_positions(&[1.0, 1.0, 1.0, 1.0, -1.0]);
        let state = check_equilibrium(&actors, &NashConfig::default()).unwrap();
        assert!(state.analysis.contains("crowded long"));
    }

    #[test]
    fn crowded_short_warning() {
        let actors = actors_with_positions(&[-1.0, -1.0, -1.0, -1.0, -1.0]);
        let state = check_equilibrium(&actors, &NashConfig::default()).unwrap();
        assert!(state.analysis.contains("crowded short"));
    }

    #[test]
    fn seeking_when_neither_crowded_nor_settled() {
        // 3 long, 2 short -> (0.6, 0.4), deviation 0.4, neither side > 0.7.
        let actors = actors_with_positions(&[1.0, 1.0, 1.0, -1.0, -1.0]);
        let state = check_equilibrium(&actors, &NashConfig::default()).unwrap();
        assert!(state.analysis.contains("seeking"));
    }

    #[test]
    fn sign_swap_symmetry_requires_target_swap() {
        // Known asymmetry: flipping all positions changes the deviation
        // unless the target ratios are flipped with them.
        let cfg = NashConfig::default();
        let actors = actors_with_positions(&[1.0, 1.0, -1.0, -1.0, -1.0]);
        let flipped = actors_with_positions(&[-1.0, -1.0, 1.0, 1.0, 1.0]);

        let base = check_equilibrium(&actors, &cfg).unwrap();
        let naive = check_equilibrium(&flipped, &cfg).unwrap();
        assert!(naive.deviation > base.deviation);

        let swapped = NashConfig {
            target_long: cfg.target_short,
            target_short: cfg.target_long,
            ..cfg
        };
        let restored = check_equilibrium(&flipped, &swapped).unwrap();
        assert!((restored.deviation - base.deviation).abs() < 1e-12);
    }

    #[test]
    fn equilibrium_boundary_is_strict() {
        // 2 long, 2 short of 5 -> (0.4, 0.4), deviation exactly 0.2: not eq.
        let actors = actors_with_positions(&[1.0, 1.0, -1.0, -1.0, 0.0]);
        let state = check_equilibrium(&actors, &NashConfig::default()).unwrap();
        assert!((state.deviation - 0.2).abs() < 1e-12);
        assert!(!state.is_equilibrium);
    }
}
