//! # bb_core - Deterministic Baseball Replay Simulation Engine
//!
//! This library simulates historical baseball games plate appearance by plate
//! appearance from per-player outcome rates.
//!
//! ## Features
//! - 100% deterministic simulation (same seed + same inputs = same play log)
//! - Batter/pitcher/league rate blending with handedness splits
//! - Era-aware lineup construction and managerial decisions
//! - Snapshot/restore of in-progress games
//!
//! ## Layers
//! - `models`: plain data (outcomes, bases, lineups, bullpens, events)
//! - `data`: typed ingestion records, DH rule table, team cache, usage tracking
//! - `engine`: rate model, baserunning, lineup builder, manager, game loop

// Game engine APIs often require many parameters for context, rng, config
#![allow(clippy::too_many_arguments)]

pub mod data;
pub mod engine;
pub mod error;
pub mod models;

pub use data::{DhRules, SeasonData, SeasonNorms, TeamCache, TeamMeta, TeamRoster, UsageTracker};
pub use engine::config::SimConfig;
pub use engine::game::{GameContext, GameEngine, GameResult, GameSnapshot};
pub use engine::rate_model::{Matchup, MatchupSide, RateModel};
pub use engine::season::{run_independent_games, ScheduledGame, SeasonReport, SeasonRunner, TeamStanding};
pub use error::{Result, SimError};
pub use models::{
    BaserunningState, EventRates, GameState, Half, Handedness, LineupState, Outcome, PlayEvent,
    PlayerId, Position, ProbabilityDistribution,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SNAPSHOT_VERSION: u32 = 1;
