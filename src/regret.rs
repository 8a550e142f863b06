//! Regret forecasting: a behavioral-finance heuristic that prices the
//! anticipated emotional cost of a proposed action before it executes.
//!
//! Each archetype carries its own small condition table; the first matching
//! condition wins. Anything above the block threshold must be stopped at the
//! orchestration boundary, not merely logged.

use serde::{Deserialize, Serialize};

use crate::action::{ActionType, ProposedAction};
use crate::actor::{ActorState, Archetype};
use crate::market::MarketState;

#[derive(Debug, Clone)]
pub struct RegretConfig {
    /// Forecast value above this blocks the trade. The single most important
    /// invariant in the subsystem.
    pub block_threshold: f64,
    /// Price this far above avg entry while holding reads as missed upside.
    pub fomo_gap_pct: f64,
}

impl Default for RegretConfig {
    fn default() -> Self {
        Self {
            block_threshold: 0.7,
            fomo_gap_pct: 0.05,
        }
    }
}

/// Forecast for one actor's proposed move. Step-scoped; only the actor's
/// updated regret_score survives the tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegretForecast {
    /// Anticipated regret in [0, 1].
    pub value: f64,
    pub feeling: String,
    /// 1..=10.
    pub intensity: u8,
    /// Historical pattern the setup rhymes with.
    pub fractal_link: String,
}

impl RegretForecast {
    fn new(value: f64, feeling: &str, intensity: u8, fractal_link: &str) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            feeling: feeling.to_string(),
            intensity: intensity.clamp(1, 10),
            fractal_link: fractal_link.to_string(),
        }
    }

    fn neutral() -> Self {
        Self::new(0.0, "neutral", 5, "no pattern")
    }

    pub fn is_blocked(&self, cfg: &RegretConfig) -> bool {
        self.value > cfg.block_threshold
    }
}

pub fn forecast(
    actor: &ActorState,
    market: &MarketState,
    proposed: &ProposedAction,
    cfg: &RegretConfig,
) -> RegretForecast {
    match actor.archetype {
        Archetype::Retail => retail(actor, market, proposed, cfg),
        Archetype::Whale => whale(actor, market, proposed),
        // Machines feel nothing: near-zero emotional exposure by construction.
        Archetype::HftMm | Archetype::ArbBot => RegretForecast::new(0.05, "flow", 2, "no pattern"),
        Archetype::Institution => institution(market, proposed),
        Archetype::SentientTrader => sentient(actor, proposed),
    }
}

fn retail(
    actor: &ActorState,
    market: &MarketState,
    proposed: &ProposedAction,
    cfg: &RegretConfig,
) -> RegretForecast {
    let fg = market.fear_greed.unwrap_or(50.0);

    if proposed.kind == ActionType::Buy && fg > 85.0 {
        return RegretForecast::new(
            0.85,
            "euphoria",
            10,
            "2021-04 leverage blowoff: late longs into peak greed",
        );
    }
    if proposed.kind == ActionType::Sell && fg < 20.0 {
        return RegretForecast::new(
            0.75,
            "panic",
            9,
            "2020-03 liquidation cascade: selling the capitulation low",
        );
    }
    if proposed.kind == ActionType::Hold
        && actor.avg_entry_price > 0.0
        && market.price >= actor.avg_entry_price * (1.0 + cfg.fomo_gap_pct)
    {
        return RegretForecast::new(
            0.7,
            "FOMO",
            9,
            "2017-11 melt-up: watching from the sidelines",
        );
    }
    RegretForecast::neutral()
}

fn whale(actor: &ActorState, market: &MarketState, proposed: &ProposedAction) -> RegretForecast {
    match proposed.kind {
        ActionType::Sell if actor.avg_entry_price > 0.0 && market.price < actor.avg_entry_price => {
            RegretForecast::new(
                0.6,
                "capitulation",
                7,
                "2018-12 distribution under water",
            )
        }
        ActionType::Buy => RegretForecast::new(0.1, "conviction", 3, "2015 accumulation regime"),
        _ => RegretForecast::neutral(),
    }
}

fn institution(market: &MarketState, proposed: &ProposedAction) -> RegretForecast {
    if proposed.kind == ActionType::Buy && market.volume < 0.5e9 {
        return RegretForecast::new(
            0.4,
            "slippage anxiety",
            6,
            "2019 block prints moving thin books",
        );
    }
    RegretForecast::neutral()
}

fn sentient(actor: &ActorState, proposed: &ProposedAction) -> RegretForecast {
    if proposed.kind != ActionType::Hold && actor.regret_score > 0.6 {
        return RegretForecast::new(
            0.65,
            "hesitation",
            7,
            "own history: trading through unresolved regret",
        );
    }
    RegretForecast::neutral()
}
