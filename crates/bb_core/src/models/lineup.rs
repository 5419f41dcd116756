//! Batting order + defensive alignment for one team, and its validator.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::player::{PlayerId, Position};

pub const LINEUP_SIZE: usize = 9;

/// Who a pinch-hitter batted for, kept until the half-inning audit resolves the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PinchFor {
    pub player_id: PlayerId,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LineupSlot {
    pub player_id: PlayerId,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinch_for: Option<PinchFor>,
}

impl LineupSlot {
    pub fn new(player_id: PlayerId, position: Position) -> Self {
        Self { player_id, position, pinch_for: None }
    }

    pub fn is_placeholder(&self) -> bool {
        self.position.is_placeholder()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, JsonSchema)]
pub enum LineupViolation {
    #[error("lineup has {0} slots, expected 9")]
    WrongSlotCount(usize),
    #[error("player {0} appears more than once")]
    DuplicatePlayer(PlayerId),
    #[error("position {0} is filled more than once")]
    DuplicatePosition(Position),
    #[error("position {0} is not filled")]
    MissingPosition(Position),
    #[error("player {player} is not eligible at {position}")]
    IneligiblePosition { player: PlayerId, position: Position },
    #[error("pinch-hitter {0} was never resolved to a position")]
    UnresolvedPlaceholder(PlayerId),
    #[error("pitcher in slot ({slot_pitcher}) differs from current pitcher ({current})")]
    PitcherMismatch { slot_pitcher: PlayerId, current: PlayerId },
    #[error("pitcher {0} bats although the DH is in effect")]
    PitcherBattingWithDh(PlayerId),
    #[error("current batter index {0} out of range")]
    BatterIndexOutOfRange(usize),
}

/// One team's lineup during a game.
///
/// Invariants: nine unique player ids, one per position 1-9, or 2-9 plus DH
/// when the DH is in effect (the pitcher then does not bat). Without the DH the
/// player at position 1 is the current pitcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LineupState {
    pub team_id: String,
    pub slots: Vec<LineupSlot>,
    pub current_batter: usize,
    pub current_pitcher: PlayerId,
    pub dh_in_effect: bool,
}

impl LineupState {
    pub fn new(
        team_id: impl Into<String>,
        slots: Vec<LineupSlot>,
        current_pitcher: PlayerId,
        dh_in_effect: bool,
    ) -> Self {
        Self { team_id: team_id.into(), slots, current_batter: 0, current_pitcher, dh_in_effect }
    }

    pub fn current_slot(&self) -> &LineupSlot {
        &self.slots[self.current_batter % self.slots.len()]
    }

    pub fn advance_batter(&mut self) {
        self.current_batter = (self.current_batter + 1) % self.slots.len();
    }

    /// The batter `ahead` spots after the current one.
    pub fn upcoming(&self, ahead: usize) -> &LineupSlot {
        &self.slots[(self.current_batter + ahead) % self.slots.len()]
    }

    pub fn slot_of(&self, id: &PlayerId) -> Option<usize> {
        self.slots.iter().position(|s| &s.player_id == id)
    }

    pub fn slot_at_position(&self, position: Position) -> Option<usize> {
        self.slots.iter().position(|s| s.position == position)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.slot_of(id).is_some()
    }

    pub fn placeholder_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_placeholder())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.slots.iter().map(|s| &s.player_id)
    }

    /// Positions a valid lineup must cover.
    pub fn required_positions(&self) -> Vec<Position> {
        let mut required = Vec::with_capacity(LINEUP_SIZE);
        if !self.dh_in_effect {
            required.push(Position::Pitcher);
        }
        required.extend_from_slice(&Position::FIELDERS);
        if self.dh_in_effect {
            required.push(Position::DesignatedHitter);
        }
        required
    }

    /// Run every lineup rule. An empty result means the lineup is legal.
    pub fn violations<F>(&self, is_eligible: F) -> Vec<LineupViolation>
    where
        F: Fn(&PlayerId, Position) -> bool,
    {
        let mut violations = Vec::new();

        if self.slots.len() != LINEUP_SIZE {
            violations.push(LineupViolation::WrongSlotCount(self.slots.len()));
        }
        if self.current_batter >= self.slots.len().max(1) {
            violations.push(LineupViolation::BatterIndexOutOfRange(self.current_batter));
        }

        let mut seen_players = BTreeSet::new();
        let mut seen_positions = BTreeSet::new();
        for slot in &self.slots {
            if !seen_players.insert(&slot.player_id) {
                violations.push(LineupViolation::DuplicatePlayer(slot.player_id.clone()));
            }
            if slot.is_placeholder() {
                violations.push(LineupViolation::UnresolvedPlaceholder(slot.player_id.clone()));
                continue;
            }
            if !seen_positions.insert(slot.position) {
                violations.push(LineupViolation::DuplicatePosition(slot.position));
            }
            if !is_eligible(&slot.player_id, slot.position) {
                violations.push(LineupViolation::IneligiblePosition {
                    player: slot.player_id.clone(),
                    position: slot.position,
                });
            }
        }

        for position in self.required_positions() {
            if !seen_positions.contains(&position) {
                violations.push(LineupViolation::MissingPosition(position));
            }
        }

        if self.dh_in_effect {
            if let Some(slot) = self.slots.iter().find(|s| s.position == Position::Pitcher) {
                violations.push(LineupViolation::PitcherBattingWithDh(slot.player_id.clone()));
            }
            if self.contains(&self.current_pitcher) {
                violations.push(LineupViolation::PitcherBattingWithDh(self.current_pitcher.clone()));
            }
        } else if let Some(slot) = self.slots.iter().find(|s| s.position == Position::Pitcher) {
            if slot.player_id != self.current_pitcher {
                violations.push(LineupViolation::PitcherMismatch {
                    slot_pitcher: slot.player_id.clone(),
                    current: self.current_pitcher.clone(),
                });
            }
        }

        violations
    }

    /// Structural check only (eligibility not consulted).
    pub fn structural_violations(&self) -> Vec<LineupViolation> {
        self.violations(|_, _| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PlayerId {
        PlayerId::from(s)
    }

    fn standard(dh: bool) -> LineupState {
        let mut positions = vec![
            Position::CenterField,
            Position::Shortstop,
            Position::RightField,
            Position::FirstBase,
            Position::LeftField,
            Position::ThirdBase,
            Position::SecondBase,
            Position::Catcher,
        ];
        positions.push(if dh { Position::DesignatedHitter } else { Position::Pitcher });
        let slots = positions
            .iter()
            .enumerate()
            .map(|(i, &pos)| {
                let pid = if pos == Position::Pitcher { id("sp") } else { id(&format!("h{}", i)) };
                LineupSlot::new(pid, pos)
            })
            .collect();
        LineupState::new("NYA", slots, id("sp"), dh)
    }

    #[test]
    fn test_valid_lineups() {
        assert!(standard(false).structural_violations().is_empty());
        assert!(standard(true).structural_violations().is_empty());
    }

    #[test]
    fn test_duplicate_player_detected() {
        let mut lineup = standard(false);
        lineup.slots[1].player_id = id("h0");
        let v = lineup.structural_violations();
        assert!(v.contains(&LineupViolation::DuplicatePlayer(id("h0"))));
    }

    #[test]
    fn test_missing_pitcher_without_dh() {
        let mut lineup = standard(false);
        lineup.slots[8] = LineupSlot::new(id("extra"), Position::DesignatedHitter);
        let v = lineup.structural_violations();
        assert!(v.contains(&LineupViolation::MissingPosition(Position::Pitcher)));
    }

    #[test]
    fn test_pitcher_mismatch_detected() {
        let mut lineup = standard(false);
        lineup.current_pitcher = id("reliever");
        let v = lineup.structural_violations();
        assert!(matches!(v[0], LineupViolation::PitcherMismatch { .. }));
    }

    #[test]
    fn test_unresolved_placeholder_is_violation() {
        let mut lineup = standard(false);
        lineup.slots[8] = LineupSlot {
            player_id: id("ph"),
            position: Position::PinchHitter,
            pinch_for: Some(PinchFor { player_id: id("sp"), position: Position::Pitcher }),
        };
        let v = lineup.structural_violations();
        assert!(v.contains(&LineupViolation::UnresolvedPlaceholder(id("ph"))));
        assert!(v.contains(&LineupViolation::MissingPosition(Position::Pitcher)));
    }

    #[test]
    fn test_eligibility_callback() {
        let lineup = standard(true);
        let v = lineup.violations(|pid, pos| !(pid.as_str() == "h7" && pos == Position::Catcher));
        assert_eq!(
            v,
            vec![LineupViolation::IneligiblePosition { player: id("h7"), position: Position::Catcher }]
        );
    }

    #[test]
    fn test_advance_wraps() {
        let mut lineup = standard(false);
        for _ in 0..9 {
            lineup.advance_batter();
        }
        assert_eq!(lineup.current_batter, 0);
        assert_eq!(lineup.upcoming(10).player_id, lineup.slots[1].player_id);
    }
}
