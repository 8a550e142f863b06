//! Actor archetypes and per-episode actor state.
//!
//! The archetype set is closed by design: six behavioral types, exhaustively
//! enumerated, each driving a deterministic decision rule (see `policy`).

use serde::{Deserialize, Serialize};

use crate::action::{ActionCode, ActionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Retail,
    Whale,
    HftMm,
    Institution,
    ArbBot,
    SentientTrader,
}

impl Archetype {
    pub const ALL: [Archetype; 6] = [
        Archetype::Retail,
        Archetype::Whale,
        Archetype::HftMm,
        Archetype::Institution,
        Archetype::ArbBot,
        Archetype::SentientTrader,
    ];

    fn index(&self) -> usize {
        match self {
            Archetype::Retail => 0,
            Archetype::Whale => 1,
            Archetype::HftMm => 2,
            Archetype::Institution => 3,
            Archetype::ArbBot => 4,
            Archetype::SentientTrader => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Retail => "retail",
            Archetype::Whale => "whale",
            Archetype::HftMm => "hft_mm",
            Archetype::Institution => "institution",
            Archetype::ArbBot => "arb_bot",
            Archetype::SentientTrader => "sentient_trader",
        }
    }

    /// Starting inventory in base-asset units.
    pub fn initial_inventory(&self) -> f64 {
        match self {
            Archetype::Retail => 0.1,
            Archetype::Whale => 26.0,
            Archetype::HftMm => 0.5,
            Archetype::Institution => 100.0,
            Archetype::ArbBot => 1.0,
            Archetype::SentientTrader => 1.0,
        }
    }
}

/// Mutable per-actor record. Owned exclusively by the `ActorBook`; mutated
/// only by the orchestrator after a step completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorState {
    pub archetype: Archetype,
    /// Base-asset units held. Never negative.
    pub inventory: f64,
    pub last_action: ActionCode,
    /// Clamped to [0, 1].
    pub regret_score: f64,
    /// Signed: >0 long, <0 short, 0 flat.
    pub position_size: f64,
    pub avg_entry_price: f64,
    pub pnl: f64,
    pub trade_count: u64,
}

impl ActorState {
    pub fn new(archetype: Archetype) -> Self {
        Self {
            archetype,
            inventory: archetype.initial_inventory(),
            last_action: ActionCode::Hold,
            regret_score: 0.0,
            position_size: 0.0,
            avg_entry_price: 0.0,
            pnl: 0.0,
            trade_count: 0,
        }
    }

    /// Apply an executed (non-blocked) trade. Entry price is the weighted
    /// average while adding, kept while reducing, reset on flip; realized
    /// pnl accrues on the closing portion.
    pub fn apply_trade(&mut self, kind: ActionType, size: f64, price: f64) {
        let qty = match kind {
            ActionType::Buy => size,
            ActionType::Sell => -size,
            ActionType::Hold => 0.0,
        };
        if qty == 0.0 {
            return;
        }

        let prev = self.position_size;
        let next = prev + qty;

        if prev != 0.0 && prev.signum() != qty.signum() {
            let close_qty = prev.abs().min(qty.abs());
            let dir = if prev > 0.0 { 1.0 } else { -1.0 };
            self.pnl += (price - self.avg_entry_price) * close_qty * dir;
        }

        if prev == 0.0 {
            self.avg_entry_price = price;
        } else if prev.signum() == next.signum() {
            if next.abs() > prev.abs() {
                let total = prev.abs() + qty.abs();
                self.avg_entry_price =
                    (self.avg_entry_price * prev.abs() + price * qty.abs()) / total;
            }
        } else if next != 0.0 {
            self.avg_entry_price = price;
        }

        self.position_size = next;
        self.inventory = (self.inventory + qty).max(0.0);
        self.trade_count += 1;
    }

    pub fn set_regret(&mut self, value: f64) {
        self.regret_score = value.clamp(0.0, 1.0);
    }
}

/// The per-episode actor population: exactly one record per archetype,
/// indexed by archetype so lookups cannot fail. One book per episode, never
/// shared across episodes, so independent episodes can run in parallel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorBook {
    actors: [ActorState; 6],
}

impl ActorBook {
    pub fn seeded() -> Self {
        Self {
            actors: Archetype::ALL.map(ActorState::new),
        }
    }

    pub fn actors(&self) -> &[ActorState] {
        &self.actors
    }

    pub fn get(&self, archetype: Archetype) -> &ActorState {
        &self.actors[archetype.index()]
    }

    pub fn get_mut(&mut self, archetype: Archetype) -> &mut ActorState {
        &mut self.actors[archetype.index()]
    }
}

impl Default for ActorBook {
    fn default() -> Self {
        Self::seeded()
    }
}
