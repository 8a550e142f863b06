//! External decision-vote collaborator.
//!
//! The language model behind this seam supplies one of the two votes in the
//! hybrid decision blend. Everything here treats it as unreliable: bounded
//! timeout, retry with backoff, strict response validation (a bad payload is
//! the same as a transport failure), and a bounded FIFO cache of the last
//! few accepted responses for prompt context.

pub mod retry;

use std::collections::VecDeque;

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::action::ActionType;
use crate::error::SimError;
use crate::ppi::MaslowTier;
use retry::{retry_async, RetryConfig};

/// Accepted responses kept for prompt context. Oldest evicted first.
pub const RESPONSE_CACHE_CAP: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub price: f64,
    pub volatility: f64,
    pub ppi_tier: MaslowTier,
    pub capital: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub action: ActionType,
    pub size: f64,
    pub reasoning: String,
}

impl VoteResponse {
    /// Bounds contract on every response; a violation is treated exactly
    /// like a transport failure by the caller.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(0.1..=1.0).contains(&self.size) {
            return Err(SimError::Validation(format!(
                "advisor size must be in [0.1, 1.0], got {}",
                self.size
            )));
        }
        if self.reasoning.len() < 10 {
            return Err(SimError::Validation(format!(
                "advisor reasoning too short ({} chars)",
                self.reasoning.len()
            )));
        }
        Ok(())
    }
}

/// Seam the orchestrator blends against. `&mut self` because the client owns
/// its bounded response cache (explicit instance state, not a process-wide
/// singleton, so episodes stay testable in isolation).
#[async_trait]
pub trait DecisionAdvisor: Send {
    async fn vote(&mut self, req: &VoteRequest) -> Result<VoteResponse, SimError>;
}

/// HTTP client for the real advisor endpoint.
pub struct HttpAdvisor {
    client: reqwest::Client,
    url: String,
    retry_cfg: RetryConfig,
    recent: VecDeque<VoteResponse>,
}

impl HttpAdvisor {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            retry_cfg: RetryConfig::default(),
            recent: VecDeque::with_capacity(RESPONSE_CACHE_CAP),
        })
    }

    pub fn with_retry_config(mut self, cfg: RetryConfig) -> Self {
        self.retry_cfg = cfg;
        self
    }

    /// The accepted responses currently held for prompt context.
    pub fn recent_responses(&self) -> &VecDeque<VoteResponse> {
        &self.recent
    }

    fn remember(&mut self, resp: &VoteResponse) {
        if self.recent.len() == RESPONSE_CACHE_CAP {
            self.recent.pop_front();
        }
        self.recent.push_back(resp.clone());
    }

    async fn fetch_once(&self, req: &VoteRequest) -> anyhow::Result<VoteResponse> {
        let resp = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({
                "price": req.price,
                "volatility": req.volatility,
                "ppiTier": req.ppi_tier,
                "capital": req.capital,
                "recent": self.recent,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(anyhow!("advisor returned HTTP {}", resp.status()));
        }

        let vote: VoteResponse = resp.json().await?;
        // Validation failure == transport failure: both retried.
        vote.validate()?;
        Ok(vote)
    }
}

#[async_trait]
impl DecisionAdvisor for HttpAdvisor {
    async fn vote(&mut self, req: &VoteRequest) -> Result<VoteResponse, SimError> {
        let attempts = self.retry_cfg.max_retries + 1;
        let result = retry_async(&self.retry_cfg, "advisor_vote", || self.fetch_once(req)).await;
        match result {
            Ok(vote) => {
                self.remember(&vote);
                Ok(vote)
            }
            Err(e) => Err(SimError::CollaboratorUnavailable {
                attempts,
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(action: ActionType, size: f64, reasoning: &str) -> VoteResponse {
        VoteResponse {
            action,
            size,
            reasoning: reasoning.to_string(),
        }
    }

    #[test]
    fn response_bounds_enforced() {
        assert!(vote(ActionType::Buy, 0.5, "momentum looks strong").validate().is_ok());
        assert!(vote(ActionType::Buy, 0.05, "momentum looks strong").validate().is_err());
        assert!(vote(ActionType::Buy, 1.5, "momentum looks strong").validate().is_err());
        assert!(vote(ActionType::Buy, 0.5, "short").validate().is_err());
    }

    #[test]
    fn cache_evicts_oldest_first() {
        let mut advisor = HttpAdvisor::new("http://localhost:0/vote", 1).unwrap();
        for i in 0..7 {
            advisor.remember(&vote(ActionType::Hold, 0.1, &format!("reasoning number {}", i)));
        }
        assert_eq!(advisor.recent_responses().len(), RESPONSE_CACHE_CAP);
        // 0 and 1 were evicted; 2 is now the oldest.
        assert!(advisor.recent_responses()[0].reasoning.ends_with("2"));
        assert!(advisor.recent_responses()[4].reasoning.ends_with("6"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_reports_attempts() {
        let mut advisor = HttpAdvisor::new("http://127.0.0.1:1/vote", 1)
            .unwrap()
            .with_retry_config(RetryConfig {
                max_retries: 2,
                base_delay_ms: 1,
                ..Default::default()
            });
        let req = VoteRequest {
            price: 112_000.0,
            volatility: 0.03,
            ppi_tier: MaslowTier::Esteem,
            capital: 1.0,
        };
        let err = advisor.vote(&req).await.unwrap_err();
        match err {
            SimError::CollaboratorUnavailable { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected CollaboratorUnavailable, got {}", other),
        }
    }
}
