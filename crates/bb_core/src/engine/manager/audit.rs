//! Half-inning lineup audit.
//!
//! Runs when a team takes the field. Every pinch-hit placeholder is resolved
//! to a real defensive assignment, and without the DH the pitcher's spot is
//! brought in line with whoever is on the mound.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::TeamRoster;
use crate::engine::config::ManagerConfig;
use crate::models::{LineupSlot, LineupState, LineupViolation, PinchFor, PlayerId, Position, LINEUP_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditResolution {
    /// Pinch-hitter stays in at the position they batted for.
    StaysIn { player: PlayerId, position: Position },
    /// Pinch-hitter and a fielder swap positions.
    Realigned { player: PlayerId, position: Position, partner: PlayerId, partner_position: Position },
    /// Bench player replaces the pinch-hitter in the field.
    DefensiveReplacement { pinch_hitter: PlayerId, replacement: PlayerId, position: Position },
    /// The new pitcher takes the batting slot.
    PitcherTakesSlot { pinch_hitter: PlayerId, pitcher: PlayerId },
    /// Pinch-hitter stays in the field and the new pitcher bats in a departing fielder's slot.
    DoubleSwitch {
        pinch_hitter: PlayerId,
        position: Position,
        pitcher: PlayerId,
        pitcher_slot: usize,
        replaced: PlayerId,
    },
    /// Pitcher's slot held someone other than the current pitcher.
    PitcherSlotRepaired { previous: PlayerId, pitcher: PlayerId },
    /// No legal fix found; the pinch-hitter plays out of position.
    Unresolved { player: PlayerId, position: Position },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditOutcome {
    pub resolutions: Vec<AuditResolution>,
    /// Players who left the game during the audit.
    pub removed: Vec<PlayerId>,
    /// Bench players who entered during the audit.
    pub entered: Vec<PlayerId>,
    /// Whatever still fails the validator afterwards.
    pub violations: Vec<LineupViolation>,
}

impl AuditOutcome {
    pub fn changed(&self) -> bool {
        !self.resolutions.is_empty()
    }
}

/// Resolve placeholders in `lineup` for the half-inning about to be played in the field.
///
/// `bench` lists players who may still enter. The lineup is always left in
/// its best-effort state; remaining problems are reported in
/// [`AuditOutcome::violations`] rather than failing.
pub fn audit_lineup<R: Rng + ?Sized>(
    lineup: &mut LineupState,
    roster: &TeamRoster,
    bench: &[PlayerId],
    config: &ManagerConfig,
    rng: &mut R,
) -> AuditOutcome {
    let mut out = AuditOutcome::default();

    for i in lineup.placeholder_slots() {
        let ph = lineup.slots[i].player_id.clone();
        let vacated = lineup.slots[i]
            .pinch_for
            .as_ref()
            .map(|pf| pf.position)
            .unwrap_or_else(|| first_open_position(lineup));

        if vacated == Position::Pitcher && !lineup.dh_in_effect {
            resolve_pitcher_slot(lineup, roster, i, &ph, config, rng, &mut out);
        } else {
            resolve_fielder_slot(lineup, roster, bench, i, &ph, vacated, &mut out);
        }
    }

    if !lineup.dh_in_effect {
        repair_pitcher_slot(lineup, &mut out);
    }

    out.violations = lineup.violations(|id, pos| roster.is_eligible(id, pos));
    if !out.violations.is_empty() {
        tracing::warn!(
            team = %lineup.team_id,
            violations = out.violations.len(),
            "lineup still invalid after audit"
        );
    }
    out
}

fn resolve_pitcher_slot<R: Rng + ?Sized>(
    lineup: &mut LineupState,
    roster: &TeamRoster,
    slot: usize,
    ph: &PlayerId,
    config: &ManagerConfig,
    rng: &mut R,
    out: &mut AuditOutcome,
) {
    let pitcher = lineup.current_pitcher.clone();
    if lineup.contains(&pitcher) {
        lineup.slots[slot].position = Position::Pitcher;
        out.resolutions.push(AuditResolution::Unresolved { player: ph.clone(), position: Position::Pitcher });
        return;
    }

    if config.double_switch_rate > 0.0 && rng.gen_bool(config.double_switch_rate.min(1.0)) {
        if let Some(partner) = double_switch_partner(lineup, roster, slot, ph) {
            let position = lineup.slots[partner].position;
            let replaced = lineup.slots[partner].player_id.clone();
            lineup.slots[slot] = LineupSlot::new(ph.clone(), position);
            lineup.slots[partner] = LineupSlot::new(pitcher.clone(), Position::Pitcher);
            tracing::debug!(team = %lineup.team_id, pinch_hitter = %ph, %position, "double switch");
            out.removed.push(replaced.clone());
            out.resolutions.push(AuditResolution::DoubleSwitch {
                pinch_hitter: ph.clone(),
                position,
                pitcher,
                pitcher_slot: partner,
                replaced,
            });
            return;
        }
    }

    lineup.slots[slot] = LineupSlot::new(pitcher.clone(), Position::Pitcher);
    out.removed.push(ph.clone());
    out.resolutions.push(AuditResolution::PitcherTakesSlot { pinch_hitter: ph.clone(), pitcher });
}

/// Fielder whose batting slot comes up last, among positions the pinch-hitter can play.
fn double_switch_partner(lineup: &LineupState, roster: &TeamRoster, slot: usize, ph: &PlayerId) -> Option<usize> {
    let next = lineup.current_batter;
    lineup
        .slots
        .iter()
        .enumerate()
        .filter(|&(j, s)| j != slot && Position::FIELDERS.contains(&s.position))
        .filter(|(_, s)| roster.is_eligible(ph, s.position))
        .max_by_key(|&(j, _)| (j + LINEUP_SIZE - next) % LINEUP_SIZE)
        .map(|(j, _)| j)
}

fn resolve_fielder_slot(
    lineup: &mut LineupState,
    roster: &TeamRoster,
    bench: &[PlayerId],
    slot: usize,
    ph: &PlayerId,
    position: Position,
    out: &mut AuditOutcome,
) {
    if roster.is_eligible(ph, position) {
        lineup.slots[slot] = LineupSlot::new(ph.clone(), position);
        out.resolutions.push(AuditResolution::StaysIn { player: ph.clone(), position });
        return;
    }

    let replacement = bench
        .iter()
        .filter(|id| *id != ph && !lineup.contains(id) && !out.entered.contains(id))
        .filter(|id| roster.is_eligible(id, position))
        .max_by(|a, b| {
            let pa = |id: &PlayerId| roster.player(id).map_or(0, |p| p.plate_appearances());
            pa(*a).cmp(&pa(*b)).then_with(|| b.cmp(a))
        });
    if let Some(replacement) = replacement {
        lineup.slots[slot] = LineupSlot::new(replacement.clone(), position);
        out.removed.push(ph.clone());
        out.entered.push(replacement.clone());
        out.resolutions.push(AuditResolution::DefensiveReplacement {
            pinch_hitter: ph.clone(),
            replacement: replacement.clone(),
            position,
        });
        return;
    }

    let partner = lineup.slots.iter().enumerate().find(|&(j, s)| {
        j != slot
            && Position::FIELDERS.contains(&s.position)
            && roster.is_eligible(ph, s.position)
            && roster.is_eligible(&s.player_id, position)
    });
    if let Some((j, _)) = partner {
        let partner_position = lineup.slots[j].position;
        let partner_id = lineup.slots[j].player_id.clone();
        lineup.slots[j].position = position;
        lineup.slots[slot] = LineupSlot::new(ph.clone(), partner_position);
        out.resolutions.push(AuditResolution::Realigned {
            player: ph.clone(),
            position: partner_position,
            partner: partner_id,
            partner_position: position,
        });
        return;
    }

    lineup.slots[slot] = LineupSlot::new(ph.clone(), position);
    out.resolutions.push(AuditResolution::Unresolved { player: ph.clone(), position });
}

fn repair_pitcher_slot(lineup: &mut LineupState, out: &mut AuditOutcome) {
    let current = lineup.current_pitcher.clone();
    let Some(i) = lineup.slot_at_position(Position::Pitcher) else {
        return;
    };
    if lineup.slots[i].player_id == current || lineup.contains(&current) {
        return;
    }
    let previous = std::mem::replace(&mut lineup.slots[i], LineupSlot::new(current.clone(), Position::Pitcher));
    out.resolutions.push(AuditResolution::PitcherSlotRepaired { previous: previous.player_id, pitcher: current });
}

/// Required position nobody holds; used when a placeholder lost its `pinch_for`.
fn first_open_position(lineup: &LineupState) -> Position {
    lineup
        .required_positions()
        .into_iter()
        .find(|p| lineup.slot_at_position(*p).is_none())
        .unwrap_or(Position::DesignatedHitter)
}

/// Placeholder for a pinch-hitter batting in `slot`.
pub fn pinch_hit_slot(replaced: &LineupSlot, pinch_hitter: PlayerId) -> LineupSlot {
    LineupSlot {
        player_id: pinch_hitter,
        position: Position::PinchHitter,
        pinch_for: Some(PinchFor { player_id: replaced.player_id.clone(), position: replaced.position }),
    }
}
