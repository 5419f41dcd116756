//! Test Fixtures Module
//!
//! Shared rosters and season data for engine tests.
//!
//! ## Usage
//! ```rust,ignore
//! use crate::engine::test_fixtures::*;
//! ```

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::data::{SeasonData, SeasonNorms, TeamMeta, TeamRoster};
use crate::models::{
    BattingProfile, EventRates, Handedness, Outcome, OutcomeTable, PitchingProfile, PlayerId,
    Position, RosterPlayer, SplitRates,
};

pub const FIXTURE_YEAR: u16 = 1985;

// =============================================================================
// Rate tables
// =============================================================================

/// Mid-1980s league baseline; sums to exactly 1.
pub fn league_rates() -> EventRates {
    OutcomeTable::from_pairs([
        (Outcome::Single, 0.150),
        (Outcome::Double, 0.045),
        (Outcome::Triple, 0.005),
        (Outcome::HomeRun, 0.025),
        (Outcome::Walk, 0.085),
        (Outcome::HitByPitch, 0.008),
        (Outcome::Strikeout, 0.170),
        (Outcome::GroundOut, 0.200),
        (Outcome::FlyOut, 0.150),
        (Outcome::LineOut, 0.060),
        (Outcome::PopOut, 0.050),
        (Outcome::SacrificeFly, 0.007),
        (Outcome::SacrificeBunt, 0.008),
        (Outcome::FieldersChoice, 0.020),
        (Outcome::ReachedOnError, 0.012),
        (Outcome::CatcherInterference, 0.005),
    ])
}

/// Pitchers at the plate: same shape, far more strikeouts.
pub fn pitcher_batting_rates() -> EventRates {
    let mut rates = league_rates();
    for outcome in [Outcome::Single, Outcome::GroundOut, Outcome::FlyOut] {
        rates.set(outcome, rates.get(outcome) - 0.06);
    }
    rates.set(Outcome::Strikeout, rates.get(Outcome::Strikeout) + 0.18);
    rates
}

/// League rates tilted by `quality` in [-1, 1]: positive means more hits for a
/// batter (or, used for a pitcher, more hits allowed).
pub fn tilted_rates(quality: f64) -> EventRates {
    let mut rates = league_rates();
    let shift = 0.03 * quality.clamp(-1.0, 1.0);
    rates.set(Outcome::Single, rates.get(Outcome::Single) + shift * 0.5);
    rates.set(Outcome::HomeRun, rates.get(Outcome::HomeRun) + shift * 0.2);
    rates.set(Outcome::Walk, rates.get(Outcome::Walk) + shift * 0.3);
    rates.set(Outcome::Strikeout, rates.get(Outcome::Strikeout) - shift);
    rates
}

pub fn sample_norms() -> SeasonNorms {
    SeasonNorms {
        year: FIXTURE_YEAR,
        league_rates: league_rates(),
        pitcher_batting_rates: Some(pitcher_batting_rates()),
        starter_avg_bfp: 26.0,
        reliever_avg_bfp: Default::default(),
        pinch_hits_per_game: 0.6,
        pull_thresholds: None,
    }
}

// =============================================================================
// Players
// =============================================================================

fn split(rng: &mut ChaCha8Rng) -> SplitRates {
    SplitRates {
        vs_left: tilted_rates(rng.gen_range(-1.0..1.0)),
        vs_right: tilted_rates(rng.gen_range(-1.0..1.0)),
    }
}

fn hand(rng: &mut ChaCha8Rng) -> Handedness {
    match rng.gen_range(0..6) {
        0 | 1 => Handedness::Left,
        2 => Handedness::Switch,
        _ => Handedness::Right,
    }
}

/// Position player with innings logged at `positions` (first one is primary).
pub fn hitter(
    team: &str,
    tag: &str,
    positions: &[Position],
    plate_appearances: u32,
    rng: &mut ChaCha8Rng,
) -> RosterPlayer {
    let primary = positions.first().copied().unwrap_or(Position::DesignatedHitter);
    let position_innings: BTreeMap<Position, f64> = positions
        .iter()
        .filter(|p| p.number().is_some())
        .enumerate()
        .map(|(i, &p)| (p, if i == 0 { 1000.0 } else { 120.0 }))
        .collect();
    RosterPlayer {
        id: PlayerId::new(format!("{}-{}", team.to_lowercase(), tag)),
        name: format!("{} {}", team, tag.to_uppercase()),
        bats: hand(rng),
        throws: Handedness::Right,
        primary_position: primary,
        position_innings,
        batting: Some(BattingProfile {
            rates: split(rng),
            plate_appearances,
            games: plate_appearances / 4,
            speed: rng.gen_range(0.0..1.0),
        }),
        pitching: None,
    }
}

pub struct PitcherLineSpec {
    pub games: u32,
    pub games_started: u32,
    pub complete_games: u32,
    pub saves: u32,
    pub holds: u32,
    pub batters_faced: u32,
}

pub fn pitcher(team: &str, tag: &str, line: PitcherLineSpec, rng: &mut ChaCha8Rng) -> RosterPlayer {
    let throws = if rng.gen_bool(0.3) { Handedness::Left } else { Handedness::Right };
    RosterPlayer {
        id: PlayerId::new(format!("{}-{}", team.to_lowercase(), tag)),
        name: format!("{} {}", team, tag.to_uppercase()),
        bats: throws,
        throws,
        primary_position: Position::Pitcher,
        position_innings: BTreeMap::from([(Position::Pitcher, 100.0)]),
        batting: None,
        pitching: Some(PitchingProfile {
            rates: split(rng),
            games: line.games,
            games_started: line.games_started,
            complete_games: line.complete_games,
            saves: line.saves,
            holds: line.holds,
            batters_faced: line.batters_faced,
        }),
    }
}

// =============================================================================
// Teams
// =============================================================================

/// 12 position players and 11 pitchers (5 starters, closer, 2 setup, long, 2 middle).
pub fn sample_team(team_id: &str, league: &str, seed: u64) -> TeamRoster {
    use Position::*;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let t = team_id;

    let mut players = vec![
        hitter(t, "c1", &[Catcher], 520, &mut rng),
        hitter(t, "1b", &[FirstBase], 610, &mut rng),
        hitter(t, "2b", &[SecondBase, Shortstop], 630, &mut rng),
        hitter(t, "3b", &[ThirdBase], 590, &mut rng),
        hitter(t, "ss", &[Shortstop, SecondBase], 600, &mut rng),
        hitter(t, "lf", &[LeftField, RightField], 560, &mut rng),
        hitter(t, "cf", &[CenterField, LeftField, RightField], 650, &mut rng),
        hitter(t, "rf", &[RightField, LeftField], 580, &mut rng),
        hitter(t, "c2", &[Catcher, FirstBase], 210, &mut rng),
        hitter(t, "ut", &[SecondBase, Shortstop, ThirdBase], 260, &mut rng),
        hitter(t, "of", &[CenterField, LeftField, RightField], 240, &mut rng),
        hitter(t, "dh", &[FirstBase], 480, &mut rng),
    ];

    for (i, cg) in [9u32, 3, 2, 1, 0].into_iter().enumerate() {
        players.push(pitcher(
            t,
            &format!("sp{}", i + 1),
            PitcherLineSpec {
                games: 33,
                games_started: 32 - i as u32,
                complete_games: cg,
                saves: 0,
                holds: 0,
                batters_faced: 880 - 20 * i as u32,
            },
            &mut rng,
        ));
    }
    let relief = [
        ("cl", 62, 38, 2, 265),
        ("su1", 66, 2, 24, 300),
        ("su2", 58, 1, 15, 270),
        ("lr", 44, 0, 1, 380),
        ("mr1", 50, 0, 4, 280),
        ("mr2", 46, 0, 3, 250),
    ];
    for (tag, games, saves, holds, bf) in relief {
        players.push(pitcher(
            t,
            tag,
            PitcherLineSpec { games, games_started: 0, complete_games: 0, saves, holds, batters_faced: bf },
            &mut rng,
        ));
    }

    TeamRoster { team_id: team_id.to_string(), league: league.to_string(), players }
}

/// Give every position player a relief line good enough to outrank the real
/// pen (most saves, most holds), as for clubs whose hitters mopped up.
pub fn add_position_player_relief(team: &mut TeamRoster) {
    for p in team.players.iter_mut().filter(|p| !p.is_pitcher()) {
        p.pitching = Some(PitchingProfile {
            rates: SplitRates::uniform(tilted_rates(-0.5)),
            games: 70,
            games_started: 0,
            complete_games: 0,
            saves: 60,
            holds: 40,
            batters_faced: 90,
        });
    }
}

/// 1985 season with two NL clubs (no DH) and one AL club (DH).
pub fn sample_season() -> SeasonData {
    let teams = vec![
        sample_team("HOM", "NL", 11),
        sample_team("AWY", "NL", 22),
        sample_team("ALH", "AL", 33),
    ];
    let team_meta = teams
        .iter()
        .map(|t| TeamMeta {
            team_id: t.team_id.clone(),
            year: FIXTURE_YEAR,
            name: format!("{} Club", t.team_id),
            city: "Testville".to_string(),
            league: t.league.clone(),
        })
        .collect();
    SeasonData {
        year: FIXTURE_YEAR,
        season_games: 162,
        norms: sample_norms(),
        teams,
        team_meta,
        dh_rules: None,
    }
}
