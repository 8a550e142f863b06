//! Episode step orchestrator.
//!
//! Composes policy, regret forecasting, the hybrid advisor blend, actor
//! state mutation, the Nash monitor and reward shaping into one tick.
//! Strictly sequential within an episode: step N+1 never starts before
//! step N's actor mutation completes, because both the regret forecasts and
//! the Nash deviation read the just-mutated population. Independent episodes
//! own independent `ActorBook`s and may run in parallel.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::action::{ActionCode, ActionType, ProposedAction};
use crate::actor::{ActorBook, Archetype};
use crate::advisor::{DecisionAdvisor, VoteRequest, VoteResponse};
use crate::error::SimError;
use crate::logging::{json_log, obj, v_bool, v_num, v_str};
use crate::market::MarketState;
use crate::nash::{check_equilibrium, NashConfig, NashState};
use crate::policy::{decide, sentient_local_vote, PolicyConfig};
use crate::ppi::{score, EpisodeMetrics, MaslowTier, PpiResult, TierWeights};
use crate::regret::{forecast, RegretConfig, RegretForecast};
use crate::storage::{persist_best_effort, EventStore};

#[derive(Debug, Clone)]
pub struct EpisodeConfig {
    pub max_steps: u64,
    /// Divisor applied to the sentient equity delta in the reward.
    pub pnl_reward_scale: f64,
    /// Coefficient on mean population regret (negative term).
    pub regret_penalty: f64,
    /// Coefficient on Nash deviation (negative term).
    pub nash_penalty: f64,
    /// Flat bonus when deviation drops below `bonus_deviation`.
    pub equilibrium_bonus: f64,
    pub bonus_deviation: f64,
    /// Weight of the local vote in the hybrid blend (advisor gets 1 - w).
    pub blend_local_weight: f64,
    /// |blended vote| below this re-derives to hold.
    pub blend_deadband: f64,
    /// Conservative size used when the advisor is unavailable.
    pub fallback_size: f64,
    pub rng_seed: u64,
    /// Episode-level inputs from out-of-scope collaborators.
    pub community_engagement_count: u64,
    pub renewable_energy_percent: f64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_steps: 288,
            pnl_reward_scale: 1_000.0,
            regret_penalty: 0.4,
            nash_penalty: 0.3,
            equilibrium_bonus: 1.0,
            bonus_deviation: 0.1,
            blend_local_weight: 0.5,
            blend_deadband: 0.3,
            fallback_size: 0.1,
            rng_seed: 42,
            community_engagement_count: 0,
            renewable_energy_percent: 85.0,
        }
    }
}

/// All knobs for one simulation, grouped per subsystem.
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    pub policy: PolicyConfig,
    pub regret: RegretConfig,
    pub nash: NashConfig,
    pub weights: TierWeights,
    pub episode: EpisodeConfig,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl SimConfig {
    /// Defaults with env-var overrides for the knobs operators actually turn.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_parse("EPISODE_MAX_STEPS") {
            cfg.episode.max_steps = v;
        }
        if let Some(v) = env_parse("RNG_SEED") {
            cfg.episode.rng_seed = v;
        }
        if let Some(v) = env_parse("BLEND_LOCAL_WEIGHT") {
            cfg.episode.blend_local_weight = v;
        }
        if let Some(v) = env_parse("COMMUNITY_ENGAGEMENT_COUNT") {
            cfg.episode.community_engagement_count = v;
        }
        if let Some(v) = env_parse("RENEWABLE_ENERGY_PCT") {
            cfg.episode.renewable_energy_percent = v;
        }
        cfg
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Running,
    /// Terminal.
    Ended,
}

/// One actor's slice of a step result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub archetype: Archetype,
    pub proposed: ProposedAction,
    pub regret: RegretForecast,
    /// True when the regret forecast exceeded the block threshold and the
    /// action was substituted with a hold.
    pub blocked: bool,
    pub executed: ActionType,
    pub executed_size: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: u64,
    pub outcomes: Vec<StepOutcome>,
    pub nash: NashState,
    pub mean_regret: f64,
    pub reward: f64,
}

/// Merge the local vote and the advisor's vote into one action. The
/// continuous weighted average is quantized back to a discrete action by
/// sign with a deadband; this deadband is a behavior contract.
pub fn blend_votes(
    local: &ProposedAction,
    external: &VoteResponse,
    local_weight: f64,
    deadband: f64,
) -> ProposedAction {
    let w = local_weight.clamp(0.0, 1.0);
    let blended = w * local.kind.vote() + (1.0 - w) * external.action.vote();
    let size = w * local.size + (1.0 - w) * external.size;

    let kind = if blended > deadband {
        ActionType::Buy
    } else if blended < -deadband {
        ActionType::Sell
    } else {
        ActionType::Hold
    };

    ProposedAction {
        kind,
        size: if kind == ActionType::Hold { 0.0 } else { size },
        reasoning: format!(
            "[hybrid] local: {} ({:.2}) - {} | advisor: {} ({:.2}) - {} -> {} ({:.2})",
            local.kind.as_str(),
            local.size,
            local.reasoning,
            external.action.as_str(),
            external.size,
            external.reasoning,
            kind.as_str(),
            size
        ),
    }
}

pub struct Episode {
    id: String,
    cfg: SimConfig,
    phase: Phase,
    book: ActorBook,
    rng: StdRng,
    store: Option<EventStore>,

    step_count: u64,
    /// Running PPI estimate used only to label the advisor request.
    running_ppi: f64,
    /// USD notional of the sentient actor at episode start.
    initial_notional: f64,
    prev_equity: f64,
    peak_value: f64,
    max_drawdown_pct: f64,
    vol_sum_pct: f64,
    last_price: f64,
}

impl Episode {
    pub fn new(id: impl Into<String>, cfg: SimConfig) -> Self {
        let rng = StdRng::seed_from_u64(cfg.episode.rng_seed);
        Self {
            id: id.into(),
            cfg,
            phase: Phase::NotStarted,
            book: ActorBook::seeded(),
            rng,
            store: None,
            step_count: 0,
            running_ppi: 75.0,
            initial_notional: 0.0,
            prev_equity: 0.0,
            peak_value: 0.0,
            max_drawdown_pct: 0.0,
            vol_sum_pct: 0.0,
            last_price: 0.0,
        }
    }

    pub fn with_store(mut self, store: EventStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn book(&self) -> &ActorBook {
        &self.book
    }

    /// True once the step budget is spent. `step()` refuses past this point;
    /// the episode stays `Running` until the caller invokes `finish()`.
    pub fn is_complete(&self) -> bool {
        self.step_count >= self.cfg.episode.max_steps
    }

    pub fn begin(&mut self) -> Result<(), SimError> {
        if self.phase != Phase::NotStarted {
            return Err(SimError::Validation(format!(
                "episode {} already started",
                self.id
            )));
        }
        self.phase = Phase::Running;
        json_log("episode", obj(&[("event", v_str("begin")), ("id", v_str(&self.id))]));
        Ok(())
    }

    /// Mark-to-market equity of the sentient actor.
    fn sentient_equity(&self, price: f64) -> f64 {
        let s = self.book.get(Archetype::SentientTrader);
        let unrealized = if s.position_size != 0.0 && s.avg_entry_price > 0.0 {
            s.position_size * (price - s.avg_entry_price)
        } else {
            0.0
        };
        s.pnl + unrealized
    }

    /// Run one simulation tick. Strictly: validate market, decide+forecast
    /// every non-sentient archetype, blend the sentient vote, mutate actor
    /// states, check equilibrium over the mutated population, shape reward.
    pub async fn step(
        &mut self,
        market: &MarketState,
        advisor: &mut dyn DecisionAdvisor,
    ) -> Result<StepResult, SimError> {
        if self.phase != Phase::Running {
            return Err(SimError::Validation(format!(
                "episode {} is not running",
                self.id
            )));
        }
        if self.is_complete() {
            return Err(SimError::Validation(format!(
                "episode {} reached max_steps ({}); call finish()",
                self.id, self.cfg.episode.max_steps
            )));
        }
        market.validate()?;

        if self.step_count == 0 {
            let inv = self.book.get(Archetype::SentientTrader).inventory;
            self.initial_notional = inv * market.price;
            self.peak_value = self.initial_notional;
        }

        // Phase 1: propose + forecast against the pre-mutation population.
        let mut outcomes: Vec<StepOutcome> = Vec::with_capacity(Archetype::ALL.len());
        for archetype in Archetype::ALL {
            if archetype == Archetype::SentientTrader {
                continue;
            }
            let actor = self.book.get(archetype).clone();
            let Some(proposed) = decide(&actor, market, &self.cfg.policy, &mut self.rng) else {
                continue;
            };
            let regret = forecast(&actor, market, &proposed, &self.cfg.regret);
            let blocked = regret.is_blocked(&self.cfg.regret);
            let (executed, executed_size) = if blocked {
                (ActionType::Hold, 0.0)
            } else {
                (proposed.kind, proposed.size)
            };
            outcomes.push(StepOutcome {
                archetype,
                proposed,
                regret,
                blocked,
                executed,
                executed_size,
            });
        }

        // Phase 2: sentient hybrid blend (advisor failure is not fatal).
        outcomes.push(self.sentient_outcome(market, advisor).await?);

        // Phase 3: mutate actor states.
        for outcome in &outcomes {
            let actor = self.book.get_mut(outcome.archetype);
            actor.set_regret(outcome.regret.value);
            actor.last_action = ActionCode::from_decision(outcome.executed, outcome.executed_size);
            if !outcome.blocked && outcome.executed != ActionType::Hold {
                actor.apply_trade(outcome.executed, outcome.executed_size, market.price);
            }
        }

        // Phase 4: equilibrium over the mutated population.
        let nash = check_equilibrium(self.book.actors(), &self.cfg.nash)?;

        // Phase 5: reward shaping.
        let mean_regret =
            outcomes.iter().map(|o| o.regret.value).sum::<f64>() / outcomes.len() as f64;
        let equity = self.sentient_equity(market.price);
        let pnl_delta = equity - self.prev_equity;
        self.prev_equity = equity;

        let ep = &self.cfg.episode;
        let mut reward = pnl_delta / ep.pnl_reward_scale;
        reward -= ep.regret_penalty * mean_regret;
        reward -= ep.nash_penalty * nash.deviation;
        if nash.deviation < ep.bonus_deviation {
            reward += ep.equilibrium_bonus;
        }

        // Episode metric accumulation.
        self.vol_sum_pct += market.volatility * 100.0;
        let value = self.initial_notional + equity;
        self.peak_value = self.peak_value.max(value);
        if self.peak_value > 0.0 {
            let dd = (self.peak_value - value) / self.peak_value * 100.0;
            self.max_drawdown_pct = self.max_drawdown_pct.max(dd);
        }
        self.running_ppi = (self.running_ppi + reward * 2.0).clamp(0.0, 100.0);
        self.last_price = market.price;
        self.step_count += 1;

        // Telemetry is best-effort; failures never stop the episode.
        if let Some(store) = self.store.as_mut() {
            for o in &outcomes {
                persist_best_effort(
                    "actor_action",
                    store.record_action(
                        &self.id,
                        self.step_count,
                        o.archetype.as_str(),
                        o.executed,
                        o.executed_size,
                        market.price,
                        o.blocked,
                    ),
                );
                persist_best_effort(
                    "regret_event",
                    store.record_regret(&self.id, self.step_count, o.archetype.as_str(), &o.regret),
                );
            }
            persist_best_effort("nash_snapshot", store.record_nash(&self.id, self.step_count, &nash));
        }

        json_log(
            "episode",
            obj(&[
                ("event", v_str("step")),
                ("id", v_str(&self.id)),
                ("step", v_num(self.step_count as f64)),
                ("reward", v_num(reward)),
                ("mean_regret", v_num(mean_regret)),
                ("nash_deviation", v_num(nash.deviation)),
                ("equilibrium", v_bool(nash.is_equilibrium)),
            ]),
        );

        Ok(StepResult {
            step: self.step_count,
            outcomes,
            nash,
            mean_regret,
            reward,
        })
    }

    async fn sentient_outcome(
        &mut self,
        market: &MarketState,
        advisor: &mut dyn DecisionAdvisor,
    ) -> Result<StepOutcome, SimError> {
        let local = sentient_local_vote(market, &self.cfg.policy);
        let capital = self.book.get(Archetype::SentientTrader).inventory;
        let request = VoteRequest {
            price: market.price,
            volatility: market.volatility,
            ppi_tier: MaslowTier::from_score(self.running_ppi),
            capital,
        };

        let proposed = match advisor.vote(&request).await {
            Ok(vote) => blend_votes(
                &local,
                &vote,
                self.cfg.episode.blend_local_weight,
                self.cfg.episode.blend_deadband,
            ),
            Err(SimError::CollaboratorUnavailable { attempts, reason }) => {
                json_log(
                    "episode",
                    obj(&[
                        ("warning", v_str("advisor_fallback")),
                        ("id", v_str(&self.id)),
                        ("attempts", v_num(attempts as f64)),
                        ("reason", v_str(&reason)),
                    ]),
                );
                let size = if local.kind == ActionType::Hold {
                    0.0
                } else {
                    self.cfg.episode.fallback_size
                };
                ProposedAction {
                    kind: local.kind,
                    size,
                    reasoning: format!(
                        "advisor unavailable after {} attempts; local vote alone: {}",
                        attempts, local.reasoning
                    ),
                }
            }
            Err(other) => return Err(other),
        };

        let actor = self.book.get(Archetype::SentientTrader).clone();
        let regret = forecast(&actor, market, &proposed, &self.cfg.regret);
        let blocked = regret.is_blocked(&self.cfg.regret);
        let (executed, executed_size) = if blocked {
            (ActionType::Hold, 0.0)
        } else {
            (proposed.kind, proposed.size)
        };

        Ok(StepOutcome {
            archetype: Archetype::SentientTrader,
            proposed,
            regret,
            blocked,
            executed,
            executed_size,
        })
    }

    /// End the episode and score it. Terminal: the episode cannot be
    /// stepped or finished again afterwards.
    pub fn finish(&mut self) -> Result<PpiResult, SimError> {
        if self.phase != Phase::Running {
            return Err(SimError::Validation(format!(
                "episode {} is not running",
                self.id
            )));
        }

        let steps = self.step_count.max(1) as f64;
        let alpha = if self.initial_notional > 0.0 {
            (self.prev_equity / self.initial_notional) * 100.0
        } else {
            0.0
        };
        let metrics = EpisodeMetrics {
            volatility: self.vol_sum_pct / steps,
            max_drawdown: self.max_drawdown_pct,
            community_engagement_count: self.cfg.episode.community_engagement_count,
            alpha_vs_benchmark: alpha,
            renewable_energy_percent: self.cfg.episode.renewable_energy_percent,
        };
        let result = score(&metrics, &self.cfg.weights)?;

        if let Some(store) = self.store.as_mut() {
            persist_best_effort("ppi_result", store.record_ppi(&self.id, &result));
        }

        json_log(
            "episode",
            obj(&[
                ("event", v_str("end")),
                ("id", v_str(&self.id)),
                ("steps", v_num(self.step_count as f64)),
                ("ppi_total", v_num(result.total_score)),
                ("grade", v_str(result.grade.as_str())),
            ]),
        );

        self.phase = Phase::Ended;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Advisor stub with a fixed answer.
    struct FixedAdvisor {
        action: ActionType,
        size: f64,
    }

    #[async_trait]
    impl DecisionAdvisor for FixedAdvisor {
        async fn vote(&mut self, _req: &VoteRequest) -> Result<VoteResponse, SimError> {
            Ok(VoteResponse {
                action: self.action,
                size: self.size,
                reasoning: "fixed stub advisor response".to_string(),
            })
        }
    }

    /// Advisor stub that always fails with exhausted retries.
    struct DownAdvisor;

    #[async_trait]
    impl DecisionAdvisor for DownAdvisor {
        async fn vote(&mut self, _req: &VoteRequest) -> Result<VoteResponse, SimError> {
            Err(SimError::CollaboratorUnavailable {
                attempts: 4,
                reason: "connection refused".to_string(),
            })
        }
    }

    fn market(price: f64, volume: f64, vol: f64, fg: f64) -> MarketState {
        let mut m = MarketState::new(price, volume, vol);
        m.fear_greed = Some(fg);
        m
    }

    fn local(kind: ActionType, size: f64) -> ProposedAction {
        ProposedAction {
            kind,
            size,
            reasoning: "local test vote".to_string(),
        }
    }

    fn ext(kind: ActionType, size: f64) -> VoteResponse {
        VoteResponse {
            action: kind,
            size,
            reasoning: "external test vote".to_string(),
        }
    }

    #[test]
    fn blend_agreeing_buys_stays_buy() {
        let b = blend_votes(&local(ActionType::Buy, 0.4), &ext(ActionType::Buy, 0.6), 0.5, 0.3);
        assert_eq!(b.kind, ActionType::Buy);
        assert!((b.size - 0.5).abs() < 1e-12);
    }

    #[test]
    fn blend_disagreement_lands_in_deadband() {
        // buy(+1) and sell(-1) at 50/50 -> 0.0 -> hold.
        let b = blend_votes(&local(ActionType::Buy, 0.4), &ext(ActionType::Sell, 0.6), 0.5, 0.3);
        assert_eq!(b.kind, ActionType::Hold);
        assert_eq!(b.size, 0.0);
    }

    #[test]
    fn blend_half_vote_clears_default_deadband() {
        // buy(+1) and hold(0) at 50/50 -> 0.5 > 0.3 -> buy.
        let b = blend_votes(&local(ActionType::Buy, 0.4), &ext(ActionType::Hold, 0.2), 0.5, 0.3);
        assert_eq!(b.kind, ActionType::Buy);
    }

    #[test]
    fn blend_deadband_boundary_is_strict() {
        // Exactly at the deadband re-derives to hold, not buy.
        let b = blend_votes(&local(ActionType::Buy, 0.4), &ext(ActionType::Hold, 0.2), 0.3, 0.3);
        assert_eq!(b.kind, ActionType::Hold);
    }

    #[test]
    fn blend_concatenates_reasonings() {
        let b = blend_votes(&local(ActionType::Buy, 0.4), &ext(ActionType::Buy, 0.6), 0.5, 0.3);
        assert!(b.reasoning.contains("local test vote"));
        assert!(b.reasoning.contains("external test vote"));
    }

    #[test]
    fn blend_weight_tilts_toward_advisor() {
        // Local hold, advisor sell, advisor-heavy weighting -> sell.
        let b = blend_votes(&local(ActionType::Hold, 0.0), &ext(ActionType::Sell, 0.8), 0.2, 0.3);
        assert_eq!(b.kind, ActionType::Sell);
    }

    #[tokio::test]
    async fn step_requires_running_phase() {
        let mut ep = Episode::new("ep-test", SimConfig::default());
        let mut advisor = FixedAdvisor {
            action: ActionType::Hold,
            size: 0.1,
        };
        let err = ep
            .step(&market(110_000.0, 1e9, 0.03, 50.0), &mut advisor)
            .await
            .unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
    }

    #[tokio::test]
    async fn blocked_action_becomes_hold_and_leaves_state_untouched() {
        let mut ep = Episode::new("ep-block", SimConfig::default());
        ep.begin().unwrap();
        let mut advisor = FixedAdvisor {
            action: ActionType::Hold,
            size: 0.1,
        };
        // Extreme greed: retail's buy forecast exceeds the block threshold.
        let result = ep.step(&market(95_000.0, 1e9, 0.03, 95.0), &mut advisor).await.unwrap();

        let retail = result
            .outcomes
            .iter()
            .find(|o| o.archetype == Archetype::Retail)
            .unwrap();
        assert_eq!(retail.proposed.kind, ActionType::Buy);
        assert!(retail.blocked);
        assert_eq!(retail.executed, ActionType::Hold);
        assert_eq!(retail.executed_size, 0.0);

        let actor = ep.book().get(Archetype::Retail);
        assert_eq!(actor.trade_count, 0);
        assert_eq!(actor.position_size, 0.0);
        // The forecast still lands in the carried regret score.
        assert!(actor.regret_score > 0.7);
    }

    #[tokio::test]
    async fn advisor_outage_produces_single_fallback_with_attempt_count() {
        let mut ep = Episode::new("ep-fallback", SimConfig::default());
        ep.begin().unwrap();
        let mut advisor = DownAdvisor;

        // Bullish sentiment so the local vote is a buy.
        let result = ep.step(&market(110_000.0, 1e9, 0.01, 90.0), &mut advisor).await.unwrap();

        let sentient = result
            .outcomes
            .iter()
            .find(|o| o.archetype == Archetype::SentientTrader)
            .unwrap();
        assert_eq!(sentient.proposed.kind, ActionType::Buy);
        assert_eq!(sentient.executed_size, SimConfig::default().episode.fallback_size);
        assert!(sentient.proposed.reasoning.contains("4 attempts"));
    }

    #[tokio::test]
    async fn whole_population_mutates_and_nash_runs() {
        let mut ep = Episode::new("ep-full", SimConfig::default());
        ep.begin().unwrap();
        let mut advisor = FixedAdvisor {
            action: ActionType::Buy,
            size: 0.4,
        };
        // Below whale accumulation level, inside no pin band, heavy volume.
        let result = ep.step(&market(95_000.0, 2e9, 0.03, 50.0), &mut advisor).await.unwrap();

        assert_eq!(result.outcomes.len(), 6);
        assert!(result.nash.deviation >= 0.0);
        assert!(result.reward.is_finite());

        // Whale and institution both bought.
        let whale = ep.book().get(Archetype::Whale);
        assert_eq!(whale.trade_count, 1);
        assert!(whale.position_size > 0.0);
        let inst = ep.book().get(Archetype::Institution);
        assert_eq!(inst.trade_count, 1);
    }

    #[tokio::test]
    async fn seeded_episodes_replay_identically() {
        async fn run() -> Vec<f64> {
            let mut ep = Episode::new("ep-replay", SimConfig::default());
            ep.begin().unwrap();
            let mut advisor = FixedAdvisor {
                action: ActionType::Buy,
                size: 0.3,
            };
            let mut rewards = Vec::new();
            for i in 0..10 {
                let m = market(95_000.0 + i as f64 * 500.0, 1.8e9, 0.06, 55.0);
                rewards.push(ep.step(&m, &mut advisor).await.unwrap().reward);
            }
            rewards
        }
        let a = run().await;
        let b = run().await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn finish_scores_and_terminates() {
        let mut ep = Episode::new("ep-finish", SimConfig::default());
        ep.begin().unwrap();
        let mut advisor = FixedAdvisor {
            action: ActionType::Hold,
            size: 0.1,
        };
        for _ in 0..5 {
            ep.step(&market(110_000.0, 1e9, 0.02, 50.0), &mut advisor).await.unwrap();
        }
        let ppi = ep.finish().unwrap();
        assert!((0.0..=100.0).contains(&ppi.total_score));
        assert_eq!(ep.phase(), Phase::Ended);

        // Terminal: no more steps, no second finish.
        assert!(ep.finish().is_err());
        assert!(ep
            .step(&market(110_000.0, 1e9, 0.02, 50.0), &mut advisor)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn step_budget_is_enforced() {
        let mut cfg = SimConfig::default();
        cfg.episode.max_steps = 2;
        let mut ep = Episode::new("ep-budget", cfg);
        ep.begin().unwrap();
        let mut advisor = FixedAdvisor {
            action: ActionType::Hold,
            size: 0.1,
        };

        for _ in 0..2 {
            ep.step(&market(110_000.0, 1e9, 0.02, 50.0), &mut advisor).await.unwrap();
        }
        assert!(ep.is_complete());

        // The budget is spent: further steps refuse, finish still works.
        let err = ep
            .step(&market(110_000.0, 1e9, 0.02, 50.0), &mut advisor)
            .await
            .unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
        assert_eq!(ep.step_count(), 2);
        assert!(ep.finish().is_ok());
    }

    #[tokio::test]
    async fn invalid_market_is_surfaced() {
        let mut ep = Episode::new("ep-badmarket", SimConfig::default());
        ep.begin().unwrap();
        let mut advisor = FixedAdvisor {
            action: ActionType::Hold,
            size: 0.1,
        };
        let err = ep
            .step(&MarketState::new(-1.0, 1e9, 0.03), &mut advisor)
            .await
            .unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
    }
}
