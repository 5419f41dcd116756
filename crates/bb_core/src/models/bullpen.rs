//! Pitcher lifecycle and the per-team bullpen pool.
//!
//! A pitcher moves `Available -> Active -> Removed`. `Removed` is terminal: no
//! code path may reactivate a removed pitcher or select it again.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::outcome::Outcome;
use super::player::PlayerId;
use crate::error::{Result, SimError};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PitcherRoleKind {
    Starter,
    Reliever,
    Closer,
}

/// Finer bullpen role used for reliever preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReliefSpecialty {
    Setup,
    Long,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PitcherStatus {
    Available,
    Active,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PitcherRole {
    pub pitcher_id: PlayerId,
    pub name: String,
    pub role: PitcherRoleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<ReliefSpecialty>,
    pub status: PitcherStatus,
    pub batters_faced: u32,
    /// Remaining stamina in [0, 1].
    pub stamina: f64,
    pub hits_allowed: u32,
    pub walks_allowed: u32,
    pub runs_allowed: u32,
    pub earned_runs_allowed: u32,
    pub outs_recorded: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entered_inning: Option<u8>,
    pub entered_mid_game: bool,
    /// Season complete-game rate (starters).
    pub complete_game_rate: f64,
    /// Season typical batters faced per relief outing (relievers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical_bfp: Option<f64>,
    /// Season baserunners allowed per batter faced; lower is better.
    pub season_baserunner_rate: f64,
}

impl PitcherRole {
    pub fn new(pitcher_id: PlayerId, name: impl Into<String>, role: PitcherRoleKind) -> Self {
        Self {
            pitcher_id,
            name: name.into(),
            role,
            specialty: None,
            status: PitcherStatus::Available,
            batters_faced: 0,
            stamina: 1.0,
            hits_allowed: 0,
            walks_allowed: 0,
            runs_allowed: 0,
            earned_runs_allowed: 0,
            outs_recorded: 0,
            entered_inning: None,
            entered_mid_game: false,
            complete_game_rate: 0.0,
            typical_bfp: None,
            season_baserunner_rate: 0.33,
        }
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.status == PitcherStatus::Available
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == PitcherStatus::Active
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        self.status == PitcherStatus::Removed
    }

    /// Bring the pitcher into the game. Only legal from `Available`.
    pub fn activate(&mut self, inning: u8, mid_game: bool) -> Result<()> {
        if self.status != PitcherStatus::Available {
            return Err(SimError::PitcherLifecycle {
                pitcher: self.pitcher_id.clone(),
                reason: format!("cannot enter from {:?}", self.status),
            });
        }
        self.status = PitcherStatus::Active;
        self.entered_inning = Some(inning);
        self.entered_mid_game = mid_game;
        Ok(())
    }

    /// Take the pitcher out for good. Only legal from `Active`.
    pub fn remove(&mut self) -> Result<()> {
        if self.status != PitcherStatus::Active {
            return Err(SimError::PitcherLifecycle {
                pitcher: self.pitcher_id.clone(),
                reason: format!("cannot be removed from {:?}", self.status),
            });
        }
        self.status = PitcherStatus::Removed;
        Ok(())
    }

    pub fn baserunners_allowed(&self) -> u32 {
        self.hits_allowed + self.walks_allowed
    }

    /// Baserunners per batter faced in this outing.
    pub fn baserunners_per_bf(&self) -> f64 {
        if self.batters_faced == 0 {
            return 0.0;
        }
        self.baserunners_allowed() as f64 / self.batters_faced as f64
    }

    /// Charge one plate appearance to this pitcher.
    pub fn record_plate_appearance(
        &mut self,
        outcome: Outcome,
        outs: u8,
        runs: u8,
        earned: u8,
        fatigue_bfp: f64,
    ) {
        self.batters_faced += 1;
        if outcome.is_hit() {
            self.hits_allowed += 1;
        }
        if matches!(outcome, Outcome::Walk | Outcome::HitByPitch) {
            self.walks_allowed += 1;
        }
        self.runs_allowed += runs as u32;
        self.earned_runs_allowed += earned as u32;
        self.outs_recorded += outs as u32;
        let drain = 1.0 / fatigue_bfp.max(1.0);
        self.stamina = (self.stamina - drain).max(0.0);
    }
}

/// All pitchers a team can use in one game, grouped by role.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct BullpenState {
    pub groups: BTreeMap<PitcherRoleKind, Vec<PitcherRole>>,
}

impl BullpenState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role: PitcherRole) {
        self.groups.entry(role.role).or_default().push(role);
    }

    pub fn all(&self) -> impl Iterator<Item = &PitcherRole> {
        self.groups.values().flatten()
    }

    pub fn get(&self, id: &PlayerId) -> Option<&PitcherRole> {
        self.all().find(|p| &p.pitcher_id == id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut PitcherRole> {
        self.groups.values_mut().flatten().find(|p| &p.pitcher_id == id)
    }

    pub fn active(&self) -> Option<&PitcherRole> {
        self.all().find(|p| p.is_active())
    }

    pub fn group(&self, kind: PitcherRoleKind) -> &[PitcherRole] {
        self.groups.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Arms that could still enter (never active, never removed).
    pub fn available(&self) -> impl Iterator<Item = &PitcherRole> {
        self.all().filter(|p| p.is_available())
    }

    pub fn has_available(&self) -> bool {
        self.available().next().is_some()
    }

    pub fn removed_ids(&self) -> Vec<PlayerId> {
        self.all().filter(|p| p.is_removed()).map(|p| p.pitcher_id.clone()).collect()
    }

    pub fn enter(&mut self, id: &PlayerId, inning: u8, mid_game: bool) -> Result<()> {
        let role = self.get_mut(id).ok_or_else(|| SimError::UnknownPlayer(id.clone()))?;
        role.activate(inning, mid_game)
    }

    pub fn remove(&mut self, id: &PlayerId) -> Result<()> {
        let role = self.get_mut(id).ok_or_else(|| SimError::UnknownPlayer(id.clone()))?;
        role.remove()
    }

    /// Drop pitchers that are no longer on the roster; returns the dropped ids.
    pub fn retain_known<F>(&mut self, mut known: F) -> Vec<PlayerId>
    where
        F: FnMut(&PlayerId) -> bool,
    {
        let mut dropped = Vec::new();
        for group in self.groups.values_mut() {
            group.retain(|p| {
                let keep = known(&p.pitcher_id);
                if !keep {
                    dropped.push(p.pitcher_id.clone());
                }
                keep
            });
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: &str, kind: PitcherRoleKind) -> PitcherRole {
        PitcherRole::new(PlayerId::from(id), id, kind)
    }

    #[test]
    fn test_lifecycle_is_one_way() {
        let mut p = role("rp1", PitcherRoleKind::Reliever);
        assert!(p.remove().is_err(), "cannot remove before entering");
        p.activate(6, true).unwrap();
        assert!(p.activate(7, true).is_err(), "cannot re-enter while active");
        p.remove().unwrap();
        assert!(p.is_removed());
        assert!(p.activate(8, true).is_err(), "removed is terminal");
        assert!(p.remove().is_err());
    }

    #[test]
    fn test_bullpen_grouping_and_queries() {
        let mut pen = BullpenState::new();
        pen.insert(role("sp", PitcherRoleKind::Starter));
        pen.insert(role("rp1", PitcherRoleKind::Reliever));
        pen.insert(role("cl", PitcherRoleKind::Closer));
        pen.enter(&PlayerId::from("sp"), 1, false).unwrap();

        assert_eq!(pen.active().unwrap().pitcher_id.as_str(), "sp");
        assert_eq!(pen.available().count(), 2);
        assert_eq!(pen.group(PitcherRoleKind::Closer).len(), 1);

        pen.remove(&PlayerId::from("sp")).unwrap();
        assert!(pen.active().is_none());
        assert_eq!(pen.removed_ids(), vec![PlayerId::from("sp")]);
    }

    #[test]
    fn test_record_plate_appearance() {
        let mut p = role("sp", PitcherRoleKind::Starter);
        p.activate(1, false).unwrap();
        p.record_plate_appearance(Outcome::Double, 0, 1, 1, 30.0);
        p.record_plate_appearance(Outcome::Walk, 0, 0, 0, 30.0);
        p.record_plate_appearance(Outcome::Strikeout, 1, 0, 0, 30.0);
        assert_eq!(p.batters_faced, 3);
        assert_eq!(p.baserunners_allowed(), 2);
        assert!((p.baserunners_per_bf() - 2.0 / 3.0).abs() < 1e-9);
        assert!((p.stamina - 0.9).abs() < 1e-9);
    }
}
