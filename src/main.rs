//! Demo loop: run one episode on a synthetic random-walk market and report
//! the PPI result. The advisor endpoint comes from `ADVISOR_URL`; without it
//! a local stub advisor stands in so the loop runs offline.

use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sentient_sim::action::ActionType;
use sentient_sim::advisor::{DecisionAdvisor, HttpAdvisor, VoteRequest, VoteResponse};
use sentient_sim::episode::{Episode, SimConfig};
use sentient_sim::error::SimError;
use sentient_sim::logging::{json_log, obj, v_num, v_str};
use sentient_sim::market::MarketState;
use sentient_sim::storage::EventStore;

/// Offline stand-in for the advisor: momentum-flavored votes off the
/// request itself, no network.
struct StubAdvisor {
    rng: StdRng,
}

#[async_trait]
impl DecisionAdvisor for StubAdvisor {
    async fn vote(&mut self, req: &VoteRequest) -> Result<VoteResponse, SimError> {
        let lean: f64 = self.rng.gen_range(-1.0..=1.0);
        let action = if lean > 0.3 {
            ActionType::Buy
        } else if lean < -0.3 {
            ActionType::Sell
        } else {
            ActionType::Hold
        };
        Ok(VoteResponse {
            action,
            size: 0.1 + self.rng.gen_range(0.0..0.4),
            reasoning: format!(
                "stub advisor: lean {:.2} at price {:.0}, vol {:.3}",
                lean, req.price, req.volatility
            ),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = SimConfig::from_env();
    let steps = std::env::var("EPISODE_STEPS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(100)
        .min(cfg.episode.max_steps);

    let mut store = EventStore::new(
        &std::env::var("SQLITE_PATH").unwrap_or_else(|_| "sentient_sim.sqlite".to_string()),
    )?;
    store.init()?;

    let mut advisor: Box<dyn DecisionAdvisor> = match std::env::var("ADVISOR_URL") {
        Ok(url) => {
            json_log("main", obj(&[("advisor", v_str("http")), ("url", v_str(&url))]));
            Box::new(HttpAdvisor::new(url, 5)?)
        }
        Err(_) => {
            json_log("main", obj(&[("advisor", v_str("stub"))]));
            Box::new(StubAdvisor {
                rng: StdRng::seed_from_u64(cfg.episode.rng_seed ^ 0x5eed),
            })
        }
    };

    let episode_id = format!("ep-{}", chrono::Utc::now().timestamp());
    let mut episode = Episode::new(episode_id.as_str(), cfg.clone()).with_store(store);
    episode.begin()?;

    // Synthetic market: geometric random walk with a fear/greed drift.
    let mut rng = StdRng::seed_from_u64(cfg.episode.rng_seed);
    let mut price = 112_000.0;
    let mut fear_greed: f64 = 50.0;

    for _ in 0..steps {
        let ret: f64 = rng.gen_range(-0.01..0.01);
        price *= ret.exp();
        fear_greed = (fear_greed + rng.gen_range(-5.0..5.0)).clamp(0.0, 100.0);
        let mut market =
            MarketState::new(price, rng.gen_range(0.5e9..2e9), 0.03 + rng.gen_range(0.0..0.02));
        market.fear_greed = Some(fear_greed);

        let result = episode.step(&market, advisor.as_mut()).await?;
        for outcome in &result.outcomes {
            if outcome.blocked {
                json_log(
                    "main",
                    obj(&[
                        ("event", v_str("regret_block")),
                        ("archetype", v_str(outcome.archetype.as_str())),
                        ("feeling", v_str(&outcome.regret.feeling)),
                        ("regret", v_num(outcome.regret.value)),
                    ]),
                );
            }
        }
    }

    let ppi = episode.finish()?;
    json_log(
        "main",
        obj(&[
            ("event", v_str("episode_report")),
            ("episode_id", v_str(&episode_id)),
            ("ppi_total", v_num(ppi.total_score)),
            ("grade", v_str(ppi.grade.as_str())),
            ("recommendation", v_str(&ppi.recommendation)),
        ]),
    );

    Ok(())
}
