//! Pitching-change decision.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{EraOptions, Situation};
use crate::data::InningBand;
use crate::engine::config::ManagerConfig;
use crate::models::{BullpenState, PitcherRole, PitcherRoleKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullReason {
    /// Starter reached the era's hard batters-faced limit.
    HardLimit,
    /// Starter workload inside the consider/likely band.
    Workload,
    /// Getting hit hard early.
    Struggling,
    /// Reliever at or past a typical outing.
    ReliefOuting,
    /// Lead to protect with the closer ready.
    SaveSituation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullDecision {
    Stay,
    Pull(PullReason),
}

/// Pull chance before the random draw, with the reason that applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullChance {
    pub probability: f64,
    pub reason: PullReason,
}

impl PullChance {
    fn none(reason: PullReason) -> Self {
        Self { probability: 0.0, reason }
    }
}

/// Decide whether the active pitcher comes out before the next batter.
///
/// Never pulls when the bullpen has nobody left to bring in.
pub fn should_pull_pitcher<R: Rng + ?Sized>(
    situation: &Situation,
    role: &PitcherRole,
    bullpen: &BullpenState,
    rng: &mut R,
    era: &EraOptions,
    config: &ManagerConfig,
) -> PullDecision {
    if !role.is_active() || !bullpen.available().any(|p| p.pitcher_id != role.pitcher_id) {
        return PullDecision::Stay;
    }
    let chance = pull_probability(situation, role, era, config);
    if chance.probability >= 1.0 {
        return PullDecision::Pull(chance.reason);
    }
    if chance.probability <= 0.0 {
        return PullDecision::Stay;
    }
    if rng.gen_bool(chance.probability) {
        PullDecision::Pull(chance.reason)
    } else {
        PullDecision::Stay
    }
}

/// Pure part of the pull decision.
pub fn pull_probability(
    situation: &Situation,
    role: &PitcherRole,
    era: &EraOptions,
    config: &ManagerConfig,
) -> PullChance {
    let chance = match role.role {
        PitcherRoleKind::Starter => starter_chance(situation, role, era, config),
        PitcherRoleKind::Reliever | PitcherRoleKind::Closer => reliever_chance(situation, role, era, config),
    };
    if chance.probability >= 1.0 {
        return chance;
    }
    let probability = (chance.probability * situation_factor(situation, role, config)).clamp(0.0, 0.97);
    PullChance { probability, ..chance }
}

fn performance_factor(role: &PitcherRole, config: &ManagerConfig) -> f64 {
    if role.batters_faced < 6 {
        return 1.0;
    }
    let rate = role.baserunners_per_bf();
    if rate >= config.struggling_baserunner_rate {
        1.6
    } else if rate <= config.cruising_baserunner_rate {
        0.5
    } else {
        1.0
    }
}

fn starter_chance(
    situation: &Situation,
    role: &PitcherRole,
    era: &EraOptions,
    config: &ManagerConfig,
) -> PullChance {
    let bonus = if role.complete_game_rate >= config.workhorse_cg_rate { config.workhorse_bonus_bfp } else { 0 };
    let consider = era.thresholds.consider_bfp + bonus;
    let likely = era.thresholds.likely_bfp + bonus;
    let hard = era.thresholds.hard_limit_bfp + bonus;
    let bf = role.batters_faced;

    if bf >= hard {
        return PullChance { probability: 1.0, reason: PullReason::HardLimit };
    }

    let perf = performance_factor(role, config);
    if bf < consider {
        // Early hook only for a starter getting knocked around
        if bf >= 9 && role.runs_allowed >= 5 && perf > 1.0 {
            return PullChance { probability: 0.35, reason: PullReason::Struggling };
        }
        return PullChance::none(PullReason::Workload);
    }

    let base = if bf < likely {
        0.08 + 0.25 * (bf - consider) as f64 / (likely - consider).max(1) as f64
    } else {
        0.35 + 0.5 * (bf - likely) as f64 / (hard - likely).max(1) as f64
    };
    // Late lead to protect: hand it to the pen
    if situation.is_save_situation(config.save_max_lead) && situation.at_inning_start() {
        return PullChance { probability: (base * perf * 2.0).min(0.95), reason: PullReason::SaveSituation };
    }
    PullChance { probability: base * perf, reason: PullReason::Workload }
}

/// Typical outing for a reliever: season figure capped by the league norm
/// for the inning they entered, or the norm itself.
pub fn typical_relief_bfp(role: &PitcherRole, era: &EraOptions, config: &ManagerConfig) -> f64 {
    let band = InningBand::for_inning(role.entered_inning.unwrap_or(7));
    let norm = era.reliever_norms.for_band(band);
    role.typical_bfp.map_or(norm, |t| t.min(norm * config.reliever_norm_cap_factor)).max(1.0)
}

fn reliever_chance(
    situation: &Situation,
    role: &PitcherRole,
    era: &EraOptions,
    config: &ManagerConfig,
) -> PullChance {
    let typical = typical_relief_bfp(role, era, config);
    let half_width = typical * config.reliever_band_fraction;
    let lower = typical - half_width;
    let upper = typical + half_width;
    let bf = role.batters_faced as f64;

    let mut probability = if bf < lower {
        0.0
    } else if bf < upper {
        0.15 + 0.6 * (bf - lower) / (upper - lower).max(1e-9)
    } else {
        (0.75 + 0.1 * (bf - upper)).min(0.97)
    };
    // A fresh inning is the natural time to change
    if probability > 0.0 && situation.at_inning_start() {
        probability += 0.2;
    }
    // Hard ceiling: twice the top of the band
    if bf >= upper * 2.0 {
        return PullChance { probability: 1.0, reason: PullReason::ReliefOuting };
    }
    PullChance {
        probability: probability * performance_factor(role, config),
        reason: PullReason::ReliefOuting,
    }
}

/// Score and inning adjustments shared by starters and relievers.
fn situation_factor(situation: &Situation, role: &PitcherRole, config: &ManagerConfig) -> f64 {
    if situation.lead >= config.blowout_margin {
        // Comfortable lead: let the pitcher eat innings
        0.7
    } else if situation.lead <= -config.blowout_margin && role.role == PitcherRoleKind::Starter {
        // Game out of reach: save the pen
        0.8
    } else {
        1.0
    }
}
