//! Defensive position assignment.
//!
//! Positions are filled scarcest first. Each attempt is a weighted-random pass
//! biased toward playing time; when every attempt dead-ends, a Hungarian
//! assignment over the same candidates gives a deterministic answer.

use std::collections::BTreeSet;

use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;
use rand::Rng;

use super::usage::weighted_choice_index;
use crate::models::{PlayerId, Position, RosterPlayer};

const COST_INCOMPATIBLE: i64 = 1_000_000;

/// A position player available for the starting lineup.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub player: &'a RosterPlayer,
    /// Plate appearances times usage multiplier.
    pub weight: f64,
}

/// Positions to fill, in fill order.
pub fn fill_order(dh_in_effect: bool) -> Vec<Position> {
    let mut order = Position::SCARCITY_ORDER.to_vec();
    if dh_in_effect {
        order.push(Position::DesignatedHitter);
    }
    order
}

fn position_weight(candidate: &Candidate<'_>, position: Position, secondary_factor: f64) -> f64 {
    if candidate.player.primary_position == position || position == Position::DesignatedHitter {
        candidate.weight
    } else {
        candidate.weight * secondary_factor
    }
}

/// One weighted-random pass. `None` when some position has no eligible
/// candidate left.
pub fn random_assignment<R: Rng + ?Sized>(
    candidates: &[Candidate<'_>],
    positions: &[Position],
    secondary_factor: f64,
    rng: &mut R,
) -> Option<Vec<(Position, PlayerId)>> {
    let mut taken: BTreeSet<usize> = BTreeSet::new();
    let mut assigned = Vec::with_capacity(positions.len());

    for &position in positions {
        let eligible: Vec<usize> = (0..candidates.len())
            .filter(|i| !taken.contains(i) && candidates[*i].player.is_eligible_at(position))
            .collect();
        if eligible.is_empty() {
            return None;
        }
        let weights: Vec<f64> = eligible
            .iter()
            .map(|&i| position_weight(&candidates[i], position, secondary_factor).max(1e-6))
            .collect();
        let pick = eligible[weighted_choice_index(&weights, rng)];
        taken.insert(pick);
        assigned.push((position, candidates[pick].player.id.clone()));
    }
    Some(assigned)
}

/// Deterministic assignment maximizing playing-time weight among eligible
/// pairs. `None` when no complete eligible matching exists.
pub fn fallback_assignment(
    candidates: &[Candidate<'_>],
    positions: &[Position],
) -> Option<Vec<(Position, PlayerId)>> {
    if candidates.len() < positions.len() || positions.is_empty() {
        return None;
    }

    // Rows are positions, columns candidates (kuhn_munkres needs rows <= columns)
    let costs = Matrix::from_fn(positions.len(), candidates.len(), |(row, col)| {
        let position = positions[row];
        let candidate = &candidates[col];
        if !candidate.player.is_eligible_at(position) {
            return COST_INCOMPATIBLE;
        }
        let off_position = if candidate.player.primary_position == position { 0 } else { 500 };
        // More weight, lower cost; roster order breaks ties
        let volume = 10_000 - (candidate.weight.round() as i64).clamp(0, 10_000);
        off_position + volume + col as i64
    });

    let (_, columns) = kuhn_munkres_min(&costs);

    let mut assigned = Vec::with_capacity(positions.len());
    for (row, &col) in columns.iter().enumerate() {
        let candidate = &candidates[col];
        if !candidate.player.is_eligible_at(positions[row]) {
            return None;
        }
        assigned.push((positions[row], candidate.player.id.clone()));
    }
    Some(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_fixtures::sample_team;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn candidates(team: &crate::data::TeamRoster) -> Vec<Candidate<'_>> {
        team.position_players()
            .map(|p| Candidate { player: p, weight: p.plate_appearances() as f64 })
            .collect()
    }

    fn assert_complete(assigned: &[(Position, PlayerId)], team: &crate::data::TeamRoster, dh: bool) {
        let positions: BTreeSet<Position> = assigned.iter().map(|(p, _)| *p).collect();
        let players: BTreeSet<&PlayerId> = assigned.iter().map(|(_, id)| id).collect();
        assert_eq!(positions.len(), if dh { 9 } else { 8 });
        assert_eq!(players.len(), assigned.len());
        for (pos, id) in assigned {
            assert!(team.is_eligible(id, *pos), "{id} at {pos}");
        }
    }

    #[test]
    fn test_random_assignment_fills_every_position() {
        let team = sample_team("POS", "AL", 5);
        let cands = candidates(&team);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for dh in [false, true] {
            let assigned = random_assignment(&cands, &fill_order(dh), 0.5, &mut rng).unwrap();
            assert_complete(&assigned, &team, dh);
        }
    }

    #[test]
    fn test_fallback_prefers_regulars() {
        let team = sample_team("POS", "AL", 5);
        let cands = candidates(&team);
        let assigned = fallback_assignment(&cands, &fill_order(true)).unwrap();
        assert_complete(&assigned, &team, true);
        let catcher = assigned.iter().find(|(p, _)| *p == Position::Catcher).unwrap();
        assert_eq!(catcher.1.as_str(), "pos-c1");
    }

    #[test]
    fn test_fallback_none_without_a_catcher() {
        let mut team = sample_team("POS", "AL", 5);
        team.players.retain(|p| !p.is_eligible_at(Position::Catcher));
        let cands = candidates(&team);
        assert!(fallback_assignment(&cands, &fill_order(false)).is_none());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(random_assignment(&cands, &fill_order(false), 0.5, &mut rng).is_none());
    }
}
