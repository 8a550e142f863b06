//! PPI trust scoring: a four-tier weighted aggregate (needs-hierarchy style)
//! that rolls an episode's market and behavioral metrics into one 0-100
//! score, a letter grade and a recommendation.
//!
//! Pure and idempotent: identical metrics in, bit-identical result out.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    Safety,
    Belonging,
    Esteem,
    SelfActualization,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Safety => "safety",
            Tier::Belonging => "belonging",
            Tier::Esteem => "esteem",
            Tier::SelfActualization => "self_actualization",
        }
    }
}

/// Five-level needs tier reported to the external advisor. Distinct from the
/// four scored tiers: this is the coarse "where is the agent on the
/// hierarchy" label derived from the running score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaslowTier {
    #[serde(rename = "Physiological")]
    Physiological,
    #[serde(rename = "Safety")]
    Safety,
    #[serde(rename = "Belonging")]
    Belonging,
    #[serde(rename = "Esteem")]
    Esteem,
    #[serde(rename = "Self-Actualization")]
    SelfActualization,
}

impl MaslowTier {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < 20.0 => MaslowTier::Physiological,
            s if s < 40.0 => MaslowTier::Safety,
            s if s < 60.0 => MaslowTier::Belonging,
            s if s < 80.0 => MaslowTier::Esteem,
            _ => MaslowTier::SelfActualization,
        }
    }
}

/// Tier weights. Fixed defaults 0.4/0.2/0.2/0.2; must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierWeights {
    pub safety: f64,
    pub belonging: f64,
    pub esteem: f64,
    pub self_actualization: f64,
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            safety: 0.4,
            belonging: 0.2,
            esteem: 0.2,
            self_actualization: 0.2,
        }
    }
}

impl TierWeights {
    pub fn sum(&self) -> f64 {
        self.safety + self.belonging + self.esteem + self.self_actualization
    }

    pub fn validate(&self) -> Result<(), SimError> {
        // NaN never compares greater, so test finiteness explicitly.
        if !self.sum().is_finite() || (self.sum() - 1.0).abs() > 1e-9 {
            return Err(SimError::Validation(format!(
                "tier weights must sum to 1.0, got {}",
                self.sum()
            )));
        }
        Ok(())
    }

    /// Scale all weights so they sum to 1.0 again after a single-weight edit.
    pub fn renormalized(&self) -> Result<Self, SimError> {
        let s = self.sum();
        if s <= 0.0 || !s.is_finite() {
            return Err(SimError::Validation(format!(
                "cannot renormalize weights summing to {}",
                s
            )));
        }
        Ok(Self {
            safety: self.safety / s,
            belonging: self.belonging / s,
            esteem: self.esteem / s,
            self_actualization: self.self_actualization / s,
        })
    }
}

/// Raw episode metrics the scorer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetrics {
    /// Mean realized volatility over the episode, percent.
    pub volatility: f64,
    /// Peak-to-trough drawdown, percent.
    pub max_drawdown: f64,
    pub community_engagement_count: u64,
    /// Return over benchmark, percent.
    pub alpha_vs_benchmark: f64,
    /// Share of compute/operations on renewable energy, percent.
    pub renewable_energy_percent: f64,
}

impl EpisodeMetrics {
    /// A non-finite metric would poison the total through the clamps, so it
    /// is a caller error, same as bad weights.
    pub fn validate(&self) -> Result<(), SimError> {
        for (name, value) in [
            ("volatility", self.volatility),
            ("max_drawdown", self.max_drawdown),
            ("alpha_vs_benchmark", self.alpha_vs_benchmark),
            ("renewable_energy_percent", self.renewable_energy_percent),
        ] {
            if !value.is_finite() {
                return Err(SimError::Validation(format!(
                    "metric {} must be finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierScore {
    pub tier: Tier,
    /// Clamped to [0, 100] before weighting.
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    F,
    D,
    C,
    B,
    A,
    S,
}

impl Grade {
    pub fn from_total(total: f64) -> Self {
        match total {
            t if t < 40.0 => Grade::F,
            t if t < 55.0 => Grade::D,
            t if t < 70.0 => Grade::C,
            t if t < 85.0 => Grade::B,
            t if t < 95.0 => Grade::A,
            _ => Grade::S,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::F => "F",
            Grade::D => "D",
            Grade::C => "C",
            Grade::B => "B",
            Grade::A => "A",
            Grade::S => "S",
        }
    }
}

/// Episode-scoped, immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpiResult {
    /// Weighted total in [0, 100], rounded to 2 decimals.
    pub total_score: f64,
    pub tier_breakdown: [TierScore; 4],
    pub grade: Grade,
    pub recommendation: String,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn safety_score(metrics: &EpisodeMetrics) -> f64 {
    let mut score = 100.0;
    if metrics.volatility > 5.0 {
        score -= ((metrics.volatility - 5.0) * 10.0).min(50.0);
    }
    if metrics.max_drawdown > 10.0 {
        score -= ((metrics.max_drawdown - 10.0) * 5.0).min(50.0);
    }
    score.clamp(0.0, 100.0)
}

/// Log-like piecewise map of the raw engagement count.
fn belonging_score(count: u64) -> f64 {
    let c = count as f64;
    let score = if count == 0 {
        0.0
    } else if c < 10.0 {
        c * 5.0
    } else if c < 100.0 {
        50.0 + (c - 10.0) * 0.28
    } else if c < 1000.0 {
        75.0 + (c - 100.0) * 0.028
    } else {
        100.0
    };
    score.clamp(0.0, 100.0)
}

fn esteem_score(alpha: f64) -> f64 {
    let score = if alpha < 5.0 {
        // Covers negative alpha too: 40 + alpha*4, floored at 0.
        (40.0 + alpha * 4.0).max(0.0)
    } else if alpha < 20.0 {
        60.0 + (alpha - 5.0) * 1.67
    } else {
        (85.0 + (alpha - 20.0) * 0.75).min(100.0)
    };
    score.clamp(0.0, 100.0)
}

fn self_actualization_score(renewable_pct: f64) -> f64 {
    renewable_pct.clamp(0.0, 100.0)
}

fn recommendation(total: f64, breakdown: &[TierScore; 4]) -> String {
    // Deterministic weakest-tier pick: stable ascending sort, first wins ties.
    let mut sorted: Vec<&TierScore> = breakdown.iter().collect();
    sorted.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal));
    let weakest = sorted[0];

    if total >= 80.0 {
        "Strong trust profile across all tiers; maintain current discipline.".to_string()
    } else if total >= 60.0 {
        format!(
            "Solid overall, but {} is the weakest tier ({:.1}); focus improvement there.",
            weakest.tier.as_str(),
            weakest.score
        )
    } else if total >= 40.0 {
        format!(
            "Trust profile is fragile: {} tier at {:.1} is dragging the score; address it before scaling up.",
            weakest.tier.as_str(),
            weakest.score
        )
    } else {
        format!(
            "Consider retraining: {} tier at {:.1} indicates a structural weakness.",
            weakest.tier.as_str(),
            weakest.score
        )
    }
}

/// Score an episode. Pure function: no hidden state, no randomness.
pub fn score(metrics: &EpisodeMetrics, weights: &TierWeights) -> Result<PpiResult, SimError> {
    weights.validate()?;
    metrics.validate()?;

    let breakdown = [
        TierScore {
            tier: Tier::Safety,
            score: safety_score(metrics),
            weight: weights.safety,
        },
        TierScore {
            tier: Tier::Belonging,
            score: belonging_score(metrics.community_engagement_count),
            weight: weights.belonging,
        },
        TierScore {
            tier: Tier::Esteem,
            score: esteem_score(metrics.alpha_vs_benchmark),
            weight: weights.esteem,
        },
        TierScore {
            tier: Tier::SelfActualization,
            score: self_actualization_score(metrics.renewable_energy_percent),
            weight: weights.self_actualization,
        },
    ];

    let total = round2(breakdown.iter().map(|t| t.score * t.weight).sum());

    Ok(PpiResult {
        total_score: total,
        grade: Grade::from_total(total),
        recommendation: recommendation(total, &breakdown),
        tier_breakdown: breakdown,
    })
}
