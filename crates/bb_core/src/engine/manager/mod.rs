//! # Managerial Decision Engine
//!
//! Pitching changes, reliever choice, pinch hitting and the half-inning
//! lineup audit. Decisions read the game situation and bullpen state; only
//! the game engine applies them.
//!
//! Invariant shared by every decision here: a pitcher or player who has left
//! the game is never selected again.

pub mod audit;
pub mod pinch_hit;
pub mod pitching;
pub mod reliever;

pub use audit::{audit_lineup, pinch_hit_slot, AuditOutcome, AuditResolution};
pub use pinch_hit::{consider_pinch_hit, pinch_hit_required, PinchHitDecision, PinchHitReason, PinchHitRequest};
pub use pitching::{pull_probability, should_pull_pitcher, PullDecision, PullReason};
pub use reliever::{select_reliever, ReliefTier};

use serde::{Deserialize, Serialize};

use crate::data::{PullThresholds, RelieverBfpNorms, SeasonNorms};
use crate::engine::config::ManagerConfig;
use crate::models::{GameState, Half, TeamSide};

/// Game situation seen from one team's dugout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Situation {
    pub inning: u8,
    pub half: Half,
    pub outs: u8,
    pub bases_empty: bool,
    /// Runs this team leads by (negative when trailing).
    pub lead: i32,
    pub regulation_innings: u8,
}

impl Situation {
    pub fn from_state(state: &GameState, side: TeamSide, regulation_innings: u8) -> Self {
        Self {
            inning: state.inning,
            half: state.half,
            outs: state.outs(),
            bases_empty: state.bases.is_empty(),
            lead: state.lead_for(side),
            regulation_innings,
        }
    }

    /// Final regulation inning or later, leading by 1 to `max_lead`.
    pub fn is_save_situation(&self, max_lead: i32) -> bool {
        self.inning >= self.regulation_innings && (1..=max_lead).contains(&self.lead)
    }

    pub fn is_blowout(&self, margin: i32) -> bool {
        self.lead.abs() >= margin
    }

    /// The two innings before the last regulation inning.
    pub fn is_high_leverage(&self, max_lead: i32) -> bool {
        let last = self.regulation_innings;
        self.inning + 2 >= last && self.inning < last && self.lead.abs() <= max_lead
    }

    pub fn is_extra_innings(&self) -> bool {
        self.inning > self.regulation_innings
    }

    pub fn at_inning_start(&self) -> bool {
        self.outs == 0 && self.bases_empty
    }
}

/// Season-specific workload baselines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EraOptions {
    pub year: u16,
    pub thresholds: PullThresholds,
    pub reliever_norms: RelieverBfpNorms,
}

impl EraOptions {
    /// Season norms override the era table when they carry thresholds.
    pub fn for_season(norms: &SeasonNorms, config: &ManagerConfig) -> Self {
        Self {
            year: norms.year,
            thresholds: norms.pull_thresholds.unwrap_or_else(|| config.pull_thresholds_for(norms.year)),
            reliever_norms: norms.reliever_avg_bfp,
        }
    }
}
