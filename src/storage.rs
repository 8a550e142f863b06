//! Best-effort sqlite event store.
//!
//! Persistence here is telemetry, not a correctness dependency: the
//! orchestrator writes fire-and-forget through `persist_best_effort`, which
//! logs failures and swallows them so the simulation keeps stepping.

use anyhow::Result;
use rusqlite::{params, Connection};

use crate::action::ActionType;
use crate::logging::{json_log, obj, v_str};
use crate::nash::NashState;
use crate::ppi::PpiResult;
use crate::regret::RegretForecast;

pub struct EventStore {
    conn: Connection,
}

impl EventStore {
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS actor_actions (
                episode_id TEXT NOT NULL,
                step INTEGER NOT NULL,
                archetype TEXT NOT NULL,
                action TEXT NOT NULL,
                size REAL NOT NULL,
                price REAL NOT NULL,
                blocked INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS regret_events (
                episode_id TEXT NOT NULL,
                step INTEGER NOT NULL,
                archetype TEXT NOT NULL,
                value REAL NOT NULL,
                feeling TEXT NOT NULL,
                intensity INTEGER NOT NULL,
                fractal_link TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS nash_snapshots (
                episode_id TEXT NOT NULL,
                step INTEGER NOT NULL,
                is_equilibrium INTEGER NOT NULL,
                deviation REAL NOT NULL,
                analysis TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS ppi_results (
                episode_id TEXT NOT NULL,
                total_score REAL NOT NULL,
                grade TEXT NOT NULL,
                recommendation TEXT NOT NULL,
                breakdown_json TEXT NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_action(
        &mut self,
        episode_id: &str,
        step: u64,
        archetype: &str,
        action: ActionType,
        size: f64,
        price: f64,
        blocked: bool,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO actor_actions (episode_id, step, archetype, action, size, price, blocked)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![episode_id, step as i64, archetype, action.as_str(), size, price, blocked as i64],
        )?;
        Ok(())
    }

    pub fn record_regret(
        &mut self,
        episode_id: &str,
        step: u64,
        archetype: &str,
        forecast: &RegretForecast,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO regret_events (episode_id, step, archetype, value, feeling, intensity, fractal_link)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                episode_id,
                step as i64,
                archetype,
                forecast.value,
                forecast.feeling,
                forecast.intensity as i64,
                forecast.fractal_link
            ],
        )?;
        Ok(())
    }

    pub fn record_nash(&mut self, episode_id: &str, step: u64, nash: &NashState) -> Result<()> {
        self.conn.execute(
            "INSERT INTO nash_snapshots (episode_id, step, is_equilibrium, deviation, analysis)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                episode_id,
                step as i64,
                nash.is_equilibrium as i64,
                nash.deviation,
                nash.analysis
            ],
        )?;
        Ok(())
    }

    pub fn record_ppi(&mut self, episode_id: &str, result: &PpiResult) -> Result<()> {
        let breakdown = serde_json::to_string(&result.tier_breakdown)?;
        self.conn.execute(
            "INSERT INTO ppi_results (episode_id, total_score, grade, recommendation, breakdown_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                episode_id,
                result.total_score,
                result.grade.as_str(),
                result.recommendation,
                breakdown
            ],
        )?;
        Ok(())
    }

    pub fn count_rows(&self, table: &str) -> Result<i64> {
        // Table names come from this module only.
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
        Ok(n)
    }
}

/// Log-and-swallow wrapper for fire-and-forget writes.
pub fn persist_best_effort(what: &str, result: Result<()>) {
    if let Err(e) = result {
        json_log(
            "storage",
            obj(&[
                ("warning", v_str("write_failed")),
                ("what", v_str(what)),
                ("error", v_str(&e.to_string())),
            ]),
        );
    }
}
