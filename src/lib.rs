//! Trading-actor simulation core.
//!
//! Six behavioral archetypes trade against a shared market snapshot; every
//! proposed action is priced for anticipated regret (trades above the block
//! threshold never execute), the population is monitored for a Nash
//! equilibrium, and each episode rolls up into a four-tier weighted PPI
//! trust score. The sentient archetype blends its local vote with an
//! external language-model advisor.

pub mod action;
pub mod actor;
pub mod advisor;
pub mod episode;
pub mod error;
pub mod logging;
pub mod market;
pub mod nash;
pub mod policy;
pub mod ppi;
pub mod regret;
pub mod storage;
