//! Pinch-hit decisions.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Situation;
use crate::data::TeamRoster;
use crate::engine::config::ManagerConfig;
use crate::models::{BullpenState, EventRates, Handedness, LineupState, PlayerId, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinchHitReason {
    /// A reliever who entered mid-game is due up without the DH.
    ReliefPitcherDue,
    /// Manager's choice for a better bat.
    Tactical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinchHitDecision {
    pub slot: usize,
    pub replaced: PlayerId,
    pub replaced_position: Position,
    pub pinch_hitter: PlayerId,
    pub reason: PinchHitReason,
}

/// Everything the pinch-hit check reads.
#[derive(Debug, Clone, Copy)]
pub struct PinchHitRequest<'a> {
    pub lineup: &'a LineupState,
    pub roster: &'a TeamRoster,
    /// Bench players still eligible to enter.
    pub bench: &'a [PlayerId],
    pub bullpen: &'a BullpenState,
    pub mid_game_relievers: &'a BTreeSet<PlayerId>,
    pub opposing_pitcher_throws: Handedness,
    /// Fallback rates for a pitcher with no batting record.
    pub pitcher_batting: &'a EventRates,
    pub situation: Situation,
    pub pinch_hits_per_game: f64,
}

impl PinchHitRequest<'_> {
    fn batter_ops(&self, id: &PlayerId) -> Option<f64> {
        let player = self.roster.player(id)?;
        let batting = player.batting.as_ref()?;
        Some(batting.rates.against(self.opposing_pitcher_throws).ops())
    }

    fn current_ops(&self) -> f64 {
        let slot = self.lineup.current_slot();
        self.batter_ops(&slot.player_id).unwrap_or_else(|| self.pitcher_batting.ops())
    }

    fn pitcher_due(&self) -> bool {
        !self.lineup.dh_in_effect && self.lineup.current_slot().position == Position::Pitcher
    }

    /// Somebody other than the active pitcher could take the mound.
    fn replacement_arm_exists(&self) -> bool {
        self.bullpen
            .available()
            .any(|p| p.pitcher_id != self.lineup.current_pitcher && !self.lineup.contains(&p.pitcher_id))
    }

    /// Best available bench bat against this pitcher.
    fn best_bench_bat(&self) -> Option<(PlayerId, f64)> {
        self.bench
            .iter()
            .filter(|id| !self.lineup.contains(id))
            .filter_map(|id| self.batter_ops(id).map(|ops| (id.clone(), ops)))
            .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
    }
}

/// A pinch-hitter is mandatory: a reliever who entered mid-game is due up
/// without the DH, and another arm is available to replace him on the mound.
pub fn pinch_hit_required(req: &PinchHitRequest<'_>) -> bool {
    let slot = req.lineup.current_slot();
    req.pitcher_due() && req.mid_game_relievers.contains(&slot.player_id) && req.replacement_arm_exists()
}

/// Decide whether to send up a pinch-hitter for the current batter.
pub fn consider_pinch_hit<R: Rng + ?Sized>(
    req: &PinchHitRequest<'_>,
    config: &ManagerConfig,
    rng: &mut R,
) -> Option<PinchHitDecision> {
    let slot = req.lineup.current_slot();
    if slot.is_placeholder() {
        return None;
    }
    let pitcher_due = req.pitcher_due();
    if pitcher_due && !req.replacement_arm_exists() {
        return None;
    }

    let (pinch_hitter, bench_ops) = req.best_bench_bat()?;
    let decision = |reason| PinchHitDecision {
        slot: req.lineup.current_batter,
        replaced: slot.player_id.clone(),
        replaced_position: slot.position,
        pinch_hitter: pinch_hitter.clone(),
        reason,
    };

    if pinch_hit_required(req) {
        return Some(decision(PinchHitReason::ReliefPitcherDue));
    }

    let s = &req.situation;
    let per_pa = req.pinch_hits_per_game / config.team_pa_per_game;
    let chance = if pitcher_due {
        per_pa
            * match s.inning {
                0..=4 => 1.0,
                5 => 4.0,
                6 => 10.0,
                _ => 25.0,
            }
    } else {
        if s.inning < 6 || bench_ops < req.current_ops() + config.pinch_hit_quality_margin {
            return None;
        }
        let late_and_close = s.inning + 2 >= s.regulation_innings && s.lead.abs() <= config.save_max_lead;
        per_pa * if late_and_close { 6.0 } else { 1.5 }
    };

    let chance = chance.clamp(0.0, 0.9);
    if chance > 0.0 && rng.gen_bool(chance) {
        Some(decision(PinchHitReason::Tactical))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SimConfig;
    use crate::engine::lineup::{LineupBuilder, LineupRequest};
    use crate::engine::test_fixtures::{pitcher_batting_rates, sample_norms, sample_team};
    use crate::models::{Half, PitcherRoleKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Fixture {
        roster: TeamRoster,
        lineup: LineupState,
        bench: Vec<PlayerId>,
        bullpen: BullpenState,
        pitcher_batting: EventRates,
    }

    fn fixture() -> Fixture {
        let roster = sample_team("PHT", "NL", 21);
        let norms = sample_norms();
        let config = SimConfig::default();
        let req = LineupRequest {
            roster: &roster,
            norms: &norms,
            year: 1985,
            dh_in_effect: false,
            usage: None,
            opposing_hand: None,
        };
        let built = LineupBuilder::new(&config).build(&req, &mut ChaCha8Rng::seed_from_u64(4)).unwrap();
        let mut lineup = built.lineup;
        lineup.current_batter = lineup.slot_at_position(Position::Pitcher).unwrap();
        Fixture { roster, lineup, bench: built.bench, bullpen: built.bullpen, pitcher_batting: pitcher_batting_rates() }
    }

    fn request<'a>(f: &'a Fixture, mid: &'a BTreeSet<PlayerId>, inning: u8) -> PinchHitRequest<'a> {
        PinchHitRequest {
            lineup: &f.lineup,
            roster: &f.roster,
            bench: &f.bench,
            bullpen: &f.bullpen,
            mid_game_relievers: mid,
            opposing_pitcher_throws: Handedness::Right,
            pitcher_batting: &f.pitcher_batting,
            situation: Situation {
                inning,
                half: Half::Top,
                outs: 1,
                bases_empty: true,
                lead: 0,
                regulation_innings: 9,
            },
            pinch_hits_per_game: 0.6,
        }
    }

    /// Swap a mid-game reliever into the pitcher's spot.
    fn with_reliever(f: &mut Fixture) -> PlayerId {
        let reliever = f
            .bullpen
            .available()
            .find(|p| p.role == PitcherRoleKind::Reliever)
            .map(|p| p.pitcher_id.clone())
            .unwrap();
        let starter = f.lineup.current_pitcher.clone();
        f.bullpen.remove(&starter).unwrap();
        f.bullpen.enter(&reliever, 5, true).unwrap();
        let slot = f.lineup.slot_at_position(Position::Pitcher).unwrap();
        f.lineup.slots[slot].player_id = reliever.clone();
        f.lineup.current_pitcher = reliever.clone();
        reliever
    }

    #[test]
    fn test_mid_game_reliever_must_be_hit_for() {
        let mut f = fixture();
        let reliever = with_reliever(&mut f);
        let mid = BTreeSet::from([reliever.clone()]);
        let req = request(&f, &mid, 5);
        assert!(pinch_hit_required(&req));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let d = consider_pinch_hit(&req, &ManagerConfig::default(), &mut rng).unwrap();
        assert_eq!(d.reason, PinchHitReason::ReliefPitcherDue);
        assert_eq!(d.replaced, reliever);
        assert_eq!(d.replaced_position, Position::Pitcher);
        assert!(f.bench.contains(&d.pinch_hitter));
    }

    #[test]
    fn test_not_required_without_replacement_arm() {
        let mut f = fixture();
        let reliever = with_reliever(&mut f);
        let others: Vec<PlayerId> = f.bullpen.available().map(|p| p.pitcher_id.clone()).collect();
        for id in others {
            f.bullpen.enter(&id, 6, true).unwrap();
            f.bullpen.remove(&id).unwrap();
        }
        let mid = BTreeSet::from([reliever]);
        let req = request(&f, &mid, 5);
        assert!(!pinch_hit_required(&req));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(consider_pinch_hit(&req, &ManagerConfig::default(), &mut rng).is_none());
    }

    #[test]
    fn test_empty_bench_means_no_pinch_hitter() {
        let mut f = fixture();
        let reliever = with_reliever(&mut f);
        f.bench.clear();
        let mid = BTreeSet::from([reliever]);
        let req = request(&f, &mid, 8);
        assert!(pinch_hit_required(&req));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(consider_pinch_hit(&req, &ManagerConfig::default(), &mut rng).is_none());
    }

    #[test]
    fn test_starting_pitcher_hit_for_more_often_late() {
        let f = fixture();
        let mid = BTreeSet::new();
        let config = ManagerConfig::default();
        let count = |inning| {
            let mut rng = ChaCha8Rng::seed_from_u64(17);
            (0..2000)
                .filter(|_| consider_pinch_hit(&request(&f, &mid, inning), &config, &mut rng).is_some())
                .count()
        };
        assert!(count(8) > count(3));
    }
}
