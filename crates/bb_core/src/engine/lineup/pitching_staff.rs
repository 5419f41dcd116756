//! Starting pitcher choice and bullpen classification.

use rand::Rng;

use super::usage::{usage_multiplier, weighted_choice_index};
use crate::data::{SeasonNorms, TeamRoster, UsageTracker};
use crate::engine::config::SimConfig;
use crate::error::{Result, SimError};
use crate::models::{BullpenState, PitcherRole, PitcherRoleKind, PlayerId, ReliefSpecialty, RosterPlayer};

/// Weighted pick among pitchers at or above the games-started floor.
///
/// Returns the starter and whether their usage is past the hard cap.
pub fn select_starter<'a, R: Rng + ?Sized>(
    roster: &'a TeamRoster,
    usage: Option<&UsageTracker>,
    config: &SimConfig,
    rng: &mut R,
) -> Result<(&'a RosterPlayer, bool)> {
    let floor = config.lineup.starter_gs_rate_floor;
    let candidates: Vec<&RosterPlayer> = roster
        .pitchers()
        .filter(|p| p.pitching.as_ref().is_some_and(|s| s.games_started_rate() >= floor))
        .collect();

    if candidates.is_empty() {
        // Thin staff: whoever started the most, if anyone ever did
        return roster
            .pitchers()
            .filter(|p| p.pitching.as_ref().is_some_and(|s| s.games_started > 0))
            .max_by_key(|p| p.pitching.as_ref().map_or(0, |s| s.games_started))
            .map(|p| (p, false))
            .ok_or_else(|| SimError::NoStartingPitcher { team: roster.team_id.clone() });
    }

    let mut capped = Vec::with_capacity(candidates.len());
    let weights: Vec<f64> = candidates
        .iter()
        .map(|p| {
            let starts = p.pitching.as_ref().map_or(0, |s| s.games_started) as f64;
            let ratio = usage.and_then(|u| u.starts_ratio(&roster.team_id, p));
            let weight = usage_multiplier(ratio, &config.usage);
            capped.push(weight.hard_capped);
            starts.max(1.0) * weight.multiplier
        })
        .collect();

    let pick = weighted_choice_index(&weights, rng);
    Ok((candidates[pick], capped[pick]))
}

fn role_for(player: &RosterPlayer, norms: &SeasonNorms, kind: PitcherRoleKind) -> PitcherRole {
    let mut role = PitcherRole::new(player.id.clone(), player.name.clone(), kind);
    if let Some(stats) = &player.pitching {
        role.complete_game_rate = stats.complete_game_rate();
        role.typical_bfp = stats.typical_relief_bfp(norms.starter_avg_bfp);
        role.season_baserunner_rate = stats.baserunner_rate();
    }
    role
}

/// Active starter plus every relief arm, classified for reliever selection:
/// closer by saves, setup by holds, long relief by typical outing length.
/// Rotation starters other than today's are left out.
pub fn build_bullpen(
    roster: &TeamRoster,
    starter: &PlayerId,
    norms: &SeasonNorms,
    config: &SimConfig,
) -> Result<BullpenState> {
    let mut bullpen = BullpenState::new();

    let starter_player = roster.player(starter).ok_or_else(|| SimError::UnknownPlayer(starter.clone()))?;
    let mut starter_role = role_for(starter_player, norms, PitcherRoleKind::Starter);
    starter_role.activate(1, false)?;
    bullpen.insert(starter_role);

    let rotation_rate = config.lineup.rotation_gs_rate;
    let mut relievers: Vec<&RosterPlayer> = roster
        .pitchers()
        .filter(|p| &p.id != starter)
        .filter(|p| p.pitching.as_ref().is_some_and(|s| s.games_started_rate() < rotation_rate))
        .collect();
    // Stable, data-driven order so classification never depends on roster order quirks
    relievers.sort_by(|a, b| a.id.cmp(&b.id));

    fn saves(p: &RosterPlayer) -> u32 {
        p.pitching.as_ref().map_or(0, |s| s.saves)
    }
    fn holds(p: &RosterPlayer) -> u32 {
        p.pitching.as_ref().map_or(0, |s| s.holds)
    }

    let closer = relievers
        .iter()
        .filter(|p| saves(p) > 0)
        .max_by(|a, b| saves(a).cmp(&saves(b)).then(b.id.cmp(&a.id)))
        .map(|p| p.id.clone());

    let mut by_holds: Vec<&RosterPlayer> = relievers
        .iter()
        .copied()
        .filter(|p| Some(&p.id) != closer.as_ref() && holds(p) > 0)
        .collect();
    by_holds.sort_by(|a, b| holds(b).cmp(&holds(a)).then(a.id.cmp(&b.id)));
    let setup: Vec<PlayerId> = by_holds.iter().take(2).map(|p| p.id.clone()).collect();

    for player in relievers {
        if Some(&player.id) == closer.as_ref() {
            bullpen.insert(role_for(player, norms, PitcherRoleKind::Closer));
            continue;
        }
        let mut role = role_for(player, norms, PitcherRoleKind::Reliever);
        role.specialty = Some(if setup.contains(&player.id) {
            ReliefSpecialty::Setup
        } else if role.typical_bfp.unwrap_or(0.0) >= config.lineup.long_relief_bfp {
            ReliefSpecialty::Long
        } else {
            ReliefSpecialty::Middle
        });
        bullpen.insert(role);
    }

    Ok(bullpen)
}
