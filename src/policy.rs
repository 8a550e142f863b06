//! Rule-based per-archetype decision policies.
//!
//! Each archetype maps to one deterministic rule (ArbBot flips a coin for
//! direction under high volatility, which models arbitrage noise rather than
//! conviction). SentientTrader is never decided here: its action comes from
//! the hybrid blend in the orchestrator.

use rand::Rng;

use crate::action::{ActionType, ProposedAction};
use crate::actor::{ActorState, Archetype};
use crate::market::MarketState;

/// Every threshold and size the policies use. Tests override these instead
/// of fighting magic numbers.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Fear & Greed above this: retail buys.
    pub retail_greed_buy: f64,
    /// Fear & Greed below this: retail sells.
    pub retail_fear_sell: f64,
    pub retail_size: f64,

    /// Whale accumulates while price is below this...
    pub whale_accumulate_below: f64,
    /// ...and its inventory is below this cap.
    pub whale_inventory_cap: f64,
    /// Whale distributes above this price.
    pub whale_distribute_above: f64,
    pub whale_buy_size: f64,
    pub whale_sell_size: f64,

    /// Gamma-pin reference level the market maker leans on.
    pub hft_pin_level: f64,
    /// Half-width of the pin band around the reference level.
    pub hft_pin_band: f64,
    pub hft_size: f64,

    /// Volume above this reads as institutional liquidity.
    pub institution_volume_threshold: f64,
    pub institution_size: f64,

    /// Volatility above this wakes the arb bot.
    pub arb_vol_threshold: f64,
    pub arb_size: f64,

    /// |score| above this flips the sentient local vote off hold.
    pub sentient_score_threshold: f64,
    pub sentient_size: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            retail_greed_buy: 70.0,
            retail_fear_sell: 30.0,
            retail_size: 0.5,

            whale_accumulate_below: 100_000.0,
            whale_inventory_cap: 50.0,
            whale_distribute_above: 120_000.0,
            whale_buy_size: 2.0,
            whale_sell_size: 1.0,

            hft_pin_level: 110_000.0,
            hft_pin_band: 1_000.0,
            hft_size: 0.25,

            institution_volume_threshold: 1.5e9,
            institution_size: 5.0,

            arb_vol_threshold: 0.05,
            arb_size: 0.3,

            sentient_score_threshold: 0.15,
            sentient_size: 0.2,
        }
    }
}

/// Propose an action for one actor. Returns `None` for SentientTrader,
/// whose move is deferred to the hybrid blend.
pub fn decide<R: Rng>(
    actor: &ActorState,
    market: &MarketState,
    cfg: &PolicyConfig,
    rng: &mut R,
) -> Option<ProposedAction> {
    let action = match actor.archetype {
        Archetype::Retail => retail(market, cfg),
        Archetype::Whale => whale(actor, market, cfg),
        Archetype::HftMm => hft_mm(market, cfg),
        Archetype::Institution => institution(market, cfg),
        Archetype::ArbBot => arb_bot(market, cfg, rng),
        Archetype::SentientTrader => return None,
    };
    Some(action)
}

fn retail(market: &MarketState, cfg: &PolicyConfig) -> ProposedAction {
    let fg = market.fear_greed.unwrap_or(50.0);
    if fg > cfg.retail_greed_buy {
        ProposedAction {
            kind: ActionType::Buy,
            size: cfg.retail_size,
            reasoning: format!("greed index {:.0} > {:.0}, chasing the move", fg, cfg.retail_greed_buy),
        }
    } else if fg < cfg.retail_fear_sell {
        ProposedAction {
            kind: ActionType::Sell,
            size: cfg.retail_size,
            reasoning: format!("fear index {:.0} < {:.0}, getting out", fg, cfg.retail_fear_sell),
        }
    } else {
        ProposedAction::hold("sentiment neutral, sitting tight")
    }
}

fn whale(actor: &ActorState, market: &MarketState, cfg: &PolicyConfig) -> ProposedAction {
    if market.price < cfg.whale_accumulate_below && actor.inventory < cfg.whale_inventory_cap {
        ProposedAction {
            kind: ActionType::Buy,
            size: cfg.whale_buy_size,
            reasoning: format!("accumulating below {:.0}", cfg.whale_accumulate_below),
        }
    } else if market.price > cfg.whale_distribute_above {
        ProposedAction {
            kind: ActionType::Sell,
            size: cfg.whale_sell_size,
            reasoning: format!("distributing above {:.0}", cfg.whale_distribute_above),
        }
    } else {
        ProposedAction::hold("price inside accumulation range, waiting")
    }
}

fn hft_mm(market: &MarketState, cfg: &PolicyConfig) -> ProposedAction {
    if (market.price - cfg.hft_pin_level).abs() <= cfg.hft_pin_band {
        ProposedAction {
            kind: ActionType::Buy,
            size: cfg.hft_size,
            reasoning: format!("price pinned near {:.0} gamma wall", cfg.hft_pin_level),
        }
    } else {
        ProposedAction::hold("outside pin band, quoting flat")
    }
}

fn institution(market: &MarketState, cfg: &PolicyConfig) -> ProposedAction {
    if market.volume > cfg.institution_volume_threshold {
        ProposedAction {
            kind: ActionType::Buy,
            size: cfg.institution_size,
            reasoning: "liquidity deep enough for block accumulation".to_string(),
        }
    } else {
        ProposedAction::hold("volume too thin for size")
    }
}

fn arb_bot<R: Rng>(market: &MarketState, cfg: &PolicyConfig, rng: &mut R) -> ProposedAction {
    if market.volatility > cfg.arb_vol_threshold {
        // Direction is noise: spreads open on both sides when vol spikes.
        let kind = if rng.gen_bool(0.5) { ActionType::Buy } else { ActionType::Sell };
        ProposedAction {
            kind,
            size: cfg.arb_size,
            reasoning: format!("vol {:.3} opened cross-venue spreads", market.volatility),
        }
    } else {
        ProposedAction::hold("spreads too tight to arb")
    }
}

/// Local half of the sentient trader's hybrid decision: a small
/// sentiment-momentum score thresholded into buy/sell/hold.
pub fn sentient_local_vote(market: &MarketState, cfg: &PolicyConfig) -> ProposedAction {
    let fg = market.fear_greed.unwrap_or(50.0);
    // Sentiment centered on 0, volatility drag against acting at all.
    let score = (fg - 50.0) / 100.0 - market.volatility;
    if score > cfg.sentient_score_threshold {
        ProposedAction {
            kind: ActionType::Buy,
            size: cfg.sentient_size,
            reasoning: format!("local vote: sentiment score {:.2} bullish", score),
        }
    } else if score < -cfg.sentient_score_threshold {
        ProposedAction {
            kind: ActionType::Sell,
            size: cfg.sentient_size,
            reasoning: format!("local vote: sentiment score {:.2} bearish", score),
        }
    } else {
        ProposedAction::hold(format!("local vote: score {:.2} inside deadband", score))
    }
}
