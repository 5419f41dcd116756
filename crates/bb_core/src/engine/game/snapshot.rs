//! Snapshot and restore of an in-progress game.
//!
//! Two encodings: plain JSON for inspection, and a compact binary form
//! (MessagePack, LZ4 with the size prepended, SHA-256 appended) for storage.
//!
//! Restoring never trusts the stored lineups verbatim. Roster data may have
//! changed since the snapshot was taken, so every lineup, bullpen and bench is
//! reconciled against the current rosters; each change is recorded as a
//! `RosterChangedOnRestore` warning.

use std::collections::{BTreeMap, BTreeSet};

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rmp_serde::{from_slice, to_vec_named};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{GameContext, GameEngine};
use crate::engine::manager::{self, EraOptions, Situation};
use crate::engine::rate_model::RateModel;
use crate::error::{Result, SimError};
use crate::models::{
    BoxScore, BullpenState, GameState, GameWarning, LineupViolation, PlayerId, Position, TeamSide, WarningKind,
    LINEUP_SIZE,
};
use crate::SNAPSHOT_VERSION;

const CHECKSUM_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub version: u32,
    pub away_team: String,
    pub home_team: String,
    pub year: u16,
    pub seed: u64,
    /// Random stream position as `[high, low]` 64-bit halves.
    pub rng_word_pos: [u64; 2],
    pub state: GameState,
    pub bullpens: [BullpenState; 2],
    pub bench: [Vec<PlayerId>; 2],
    pub removed: BTreeSet<PlayerId>,
    pub used_pinch_hitters: BTreeSet<PlayerId>,
    pub mid_game_relievers: BTreeSet<PlayerId>,
    pub reached_on_error: BTreeSet<PlayerId>,
    pub needs_pitcher: [bool; 2],
    pub starters: [PlayerId; 2],
    pub pitcher_order: Vec<(TeamSide, PlayerId)>,
    pub plate_appearances_by: BTreeMap<PlayerId, u32>,
    pub warnings: Vec<GameWarning>,
    pub box_score: BoxScore,
    pub sequence: u32,
    pub truncated: bool,
}

impl GameSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// MessagePack, LZ4-compressed, with a trailing SHA-256 of the compressed payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let msgpack = to_vec_named(self).map_err(|e| SimError::Snapshot(e.to_string()))?;
        let mut bytes = compress_prepend_size(&msgpack);
        let checksum = Sha256::digest(&bytes);
        bytes.extend_from_slice(&checksum);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() <= CHECKSUM_LEN + 4 {
            return Err(SimError::Snapshot(format!("snapshot too short: {} bytes", bytes.len())));
        }
        let (payload, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
        if Sha256::digest(payload).as_slice() != checksum {
            return Err(SimError::ChecksumMismatch);
        }
        let msgpack = decompress_size_prepended(payload).map_err(|e| SimError::Snapshot(e.to_string()))?;
        from_slice(&msgpack).map_err(|e| SimError::Snapshot(e.to_string()))
    }
}

impl<'a> GameEngine<'a> {
    pub fn snapshot(&self) -> GameSnapshot {
        let pos = self.rng.get_word_pos();
        GameSnapshot {
            version: SNAPSHOT_VERSION,
            away_team: self.ctx.away.team_id.clone(),
            home_team: self.ctx.home.team_id.clone(),
            year: self.ctx.year(),
            seed: self.seed,
            rng_word_pos: [(pos >> 64) as u64, pos as u64],
            state: self.state.clone(),
            bullpens: self.bullpens.clone(),
            bench: self.bench.clone(),
            removed: self.removed.clone(),
            used_pinch_hitters: self.used_pinch_hitters.clone(),
            mid_game_relievers: self.mid_game_relievers.clone(),
            reached_on_error: self.reached_on_error.clone(),
            needs_pitcher: self.needs_pitcher,
            starters: self.starters.clone(),
            pitcher_order: self.pitcher_order.clone(),
            plate_appearances_by: self.plate_appearances_by.clone(),
            warnings: self.warnings.clone(),
            box_score: self.box_score.clone(),
            sequence: self.sequence,
            truncated: self.truncated,
        }
    }

    /// Resume a game from a snapshot against the current rosters in `ctx`.
    ///
    /// Fails when the snapshot belongs to a different matchup or season, when
    /// its game state is out of range, or when a lineup cannot be made whole
    /// from the current roster.
    pub fn restore(ctx: GameContext<'a>, snapshot: GameSnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SimError::Snapshot(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        if snapshot.away_team != ctx.away.team_id || snapshot.home_team != ctx.home.team_id {
            return Err(SimError::Snapshot(format!(
                "snapshot is {} at {}, context is {} at {}",
                snapshot.away_team, snapshot.home_team, ctx.away.team_id, ctx.home.team_id
            )));
        }
        if snapshot.year != ctx.year() {
            return Err(SimError::Snapshot(format!("snapshot is from {}, context is {}", snapshot.year, ctx.year())));
        }
        check_state(&snapshot.state)?;

        let mut rng = ChaCha8Rng::seed_from_u64(snapshot.seed);
        let [high, low] = snapshot.rng_word_pos;
        rng.set_word_pos(((high as u128) << 64) | low as u128);

        let mut engine = Self {
            ctx,
            model: RateModel::new(ctx.config.rates.clone()),
            era: EraOptions::for_season(&ctx.season.norms, &ctx.config.manager),
            seed: snapshot.seed,
            rng,
            state: snapshot.state,
            bullpens: snapshot.bullpens,
            bench: snapshot.bench,
            removed: snapshot.removed,
            used_pinch_hitters: snapshot.used_pinch_hitters,
            mid_game_relievers: snapshot.mid_game_relievers,
            reached_on_error: snapshot.reached_on_error,
            needs_pitcher: snapshot.needs_pitcher,
            starters: snapshot.starters,
            pitcher_order: snapshot.pitcher_order,
            plate_appearances_by: snapshot.plate_appearances_by,
            warnings: snapshot.warnings,
            box_score: snapshot.box_score,
            sequence: snapshot.sequence,
            truncated: snapshot.truncated,
        };
        for side in [TeamSide::Away, TeamSide::Home] {
            engine.reconcile_roster(side)?;
        }
        tracing::info!(
            away = %ctx.away.team_id,
            home = %ctx.home.team_id,
            inning = engine.state.inning,
            half = ?engine.state.half,
            "game restored"
        );
        Ok(engine)
    }

    fn reconcile_roster(&mut self, side: TeamSide) -> Result<()> {
        let i = side.index();
        let roster = self.ctx.roster(side);

        for id in self.bullpens[i].retain_known(|id| roster.contains(id)) {
            self.warn(WarningKind::RosterChangedOnRestore, format!("pitcher {id} left the {} roster", roster.team_id));
        }
        let before = self.bench[i].len();
        self.bench[i].retain(|id| roster.contains(id));
        if self.bench[i].len() != before {
            self.warn(
                WarningKind::RosterChangedOnRestore,
                format!("{} bench lost {} players", roster.team_id, before - self.bench[i].len()),
            );
        }

        let current = self.state.lineup(side).current_pitcher.clone();
        if !self.needs_pitcher[i] && !roster.contains(&current) {
            self.replace_missing_pitcher(side, &current)?;
        }

        for slot in 0..self.state.lineup(side).slots.len() {
            let entry = &self.state.lineup(side).slots[slot];
            if roster.contains(&entry.player_id) {
                continue;
            }
            let (gone, position) = (entry.player_id.clone(), entry.position);
            let replacement = self.bench[i]
                .iter()
                .filter(|id| !self.removed.contains(*id) && !self.state.lineup(side).contains(id))
                .filter(|id| position.is_placeholder() || roster.is_eligible(id, position))
                .max_by(|a, b| {
                    let pa = |id: &PlayerId| roster.player(id).map_or(0, |p| p.plate_appearances());
                    pa(*a).cmp(&pa(*b)).then_with(|| b.cmp(a))
                })
                .cloned()
                .ok_or_else(|| SimError::InsufficientRoster {
                    team: roster.team_id.clone(),
                    reason: format!("no bench player can replace {gone} at {position}"),
                })?;

            let lineup = self.state.lineup_mut(side);
            lineup.slots[slot].player_id = replacement.clone();
            self.bench[i].retain(|id| id != &replacement);
            self.removed.insert(gone.clone());
            self.warn(
                WarningKind::RosterChangedOnRestore,
                format!("{gone} left the {} roster; {replacement} takes over at {position}", roster.team_id),
            );
        }

        let lineup = self.state.lineup(side);
        // Placeholders are legal until the team next takes the field
        let vacated: Vec<Position> =
            lineup.slots.iter().filter_map(|s| s.pinch_for.as_ref().map(|pf| pf.position)).collect();
        let (fatal, ineligible): (Vec<LineupViolation>, Vec<LineupViolation>) = lineup
            .violations(|id, pos| roster.is_eligible(id, pos))
            .into_iter()
            .filter(|v| match v {
                LineupViolation::UnresolvedPlaceholder(_) => false,
                LineupViolation::MissingPosition(p) => !vacated.contains(p),
                LineupViolation::PitcherMismatch { .. } => !self.needs_pitcher[i],
                _ => true,
            })
            .partition(|v| !matches!(v, LineupViolation::IneligiblePosition { .. }));
        if !fatal.is_empty() {
            return Err(SimError::InvalidLineup { team: roster.team_id.clone(), violations: fatal });
        }
        if !ineligible.is_empty() {
            let list = ineligible.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
            self.warn(WarningKind::LineupRepairFailed, format!("{} restored with: {list}", roster.team_id));
        }
        Ok(())
    }

    fn replace_missing_pitcher(&mut self, side: TeamSide, gone: &PlayerId) -> Result<()> {
        let i = side.index();
        let roster = self.ctx.roster(side);
        let situation = Situation::from_state(&self.state, side, self.ctx.regulation_innings());
        let incoming =
            manager::select_reliever(&situation, &self.bullpens[i], gone, &self.removed, &self.ctx.config.manager)
                .ok_or_else(|| SimError::InsufficientRoster {
                    team: roster.team_id.clone(),
                    reason: format!("no pitcher can replace {gone}"),
                })?;
        self.bullpens[i].enter(&incoming, self.state.inning, true)?;
        self.removed.insert(gone.clone());
        self.mid_game_relievers.insert(incoming.clone());
        self.pitcher_order.push((side, incoming.clone()));

        let lineup = self.state.lineup_mut(side);
        lineup.current_pitcher = incoming.clone();
        if let Some(slot) = lineup.slot_of(gone) {
            if lineup.slots[slot].position == Position::Pitcher {
                lineup.slots[slot].player_id = incoming.clone();
            }
        }
        self.warn(
            WarningKind::RosterChangedOnRestore,
            format!("pitcher {gone} left the {} roster; {incoming} takes the mound", roster.team_id),
        );
        Ok(())
    }
}

/// Range checks on a decoded state. The checksum only proves the bytes are
/// the ones written, not that the writer was sane.
fn check_state(state: &GameState) -> Result<()> {
    if state.inning == 0 {
        return Err(SimError::Snapshot("inning must start at 1".to_string()));
    }
    state.bases.check_invariants().map_err(SimError::Snapshot)?;
    for side in [TeamSide::Away, TeamSide::Home] {
        let lineup = state.lineup(side);
        if lineup.slots.len() != LINEUP_SIZE {
            return Err(SimError::Snapshot(format!(
                "{} lineup has {} slots",
                lineup.team_id,
                lineup.slots.len()
            )));
        }
        if lineup.current_batter >= LINEUP_SIZE {
            return Err(SimError::Snapshot(format!(
                "{} batter index {} out of range",
                lineup.team_id, lineup.current_batter
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SimConfig;
    use crate::engine::test_fixtures::sample_season;

    #[test]
    fn test_binary_roundtrip_and_checksum() {
        let season = sample_season();
        let config = SimConfig::deterministic_test();
        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        let mut engine = GameEngine::new(ctx, 99).unwrap();
        for _ in 0..20 {
            engine.step().unwrap();
        }
        let snapshot = engine.snapshot();
        let bytes = snapshot.to_bytes().unwrap();
        assert_eq!(GameSnapshot::from_bytes(&bytes).unwrap(), snapshot);

        let mut corrupted = bytes.clone();
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xFF;
        assert!(matches!(GameSnapshot::from_bytes(&corrupted), Err(SimError::ChecksumMismatch)));
        assert!(GameSnapshot::from_bytes(&bytes[..10]).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let season = sample_season();
        let config = SimConfig::deterministic_test();
        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        let engine = GameEngine::new(ctx, 5).unwrap();
        let snapshot = engine.snapshot();
        let json = snapshot.to_json().unwrap();
        assert_eq!(GameSnapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn test_restore_rejects_out_of_range_state() {
        let season = sample_season();
        let config = SimConfig::deterministic_test();
        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        let mut engine = GameEngine::new(ctx, 5).unwrap();
        for _ in 0..10 {
            engine.step().unwrap();
        }
        let good = engine.snapshot();

        let mut bad_inning = good.clone();
        bad_inning.state.inning = 0;
        let mut bad_outs = good.clone();
        bad_outs.state.bases.outs = 3;
        let mut bad_batter = good.clone();
        bad_batter.state.home.current_batter = 9;
        let mut short_lineup = good.clone();
        short_lineup.state.away.slots.pop();

        for snapshot in [bad_inning, bad_outs, bad_batter, short_lineup] {
            // Corrupt state survives the binary round trip; restore is the gate
            let decoded = GameSnapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();
            let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
            assert!(matches!(GameEngine::restore(ctx, decoded), Err(SimError::Snapshot(_))));
        }

        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        assert!(GameEngine::restore(ctx, good).is_ok());
    }

    #[test]
    fn test_restore_rejects_other_matchup() {
        let season = sample_season();
        let config = SimConfig::deterministic_test();
        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        let snapshot = GameEngine::new(ctx, 5).unwrap().snapshot();

        let other = GameContext::new(&season, &config, "HOM", "AWY").unwrap();
        assert!(matches!(GameEngine::restore(other, snapshot), Err(SimError::Snapshot(_))));
    }

    #[test]
    fn test_restore_replaces_departed_player() {
        let season = sample_season();
        let config = SimConfig::deterministic_test();
        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        let mut engine = GameEngine::new(ctx, 17).unwrap();
        for _ in 0..10 {
            engine.step().unwrap();
        }
        let snapshot = engine.snapshot();
        let catcher_slot = snapshot.state.away.slot_at_position(Position::Catcher).unwrap();
        let catcher = snapshot.state.away.slots[catcher_slot].player_id.clone();

        let mut changed = season.clone();
        let away = changed.teams.iter_mut().find(|t| t.team_id == "AWY").unwrap();
        away.players.retain(|p| p.id != catcher);
        let ctx = GameContext::new(&changed, &config, "AWY", "HOM").unwrap();
        let restored = GameEngine::restore(ctx, snapshot).unwrap();

        let lineup = &restored.state().away;
        assert!(!lineup.contains(&catcher));
        assert!(lineup.slot_at_position(Position::Catcher).is_some());
        assert!(restored.warnings().iter().any(|w| w.kind == WarningKind::RosterChangedOnRestore));
    }
}
