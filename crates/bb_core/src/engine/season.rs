//! Season replay: many independent games.
//!
//! `SeasonRunner` plays a schedule in order and is the single writer of the
//! usage tracker, so lineups later in the season see usage from earlier games.
//! `run_independent_games` drops that coupling and fans games out over rayon.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{SeasonData, UsageTracker};
use crate::engine::config::SimConfig;
use crate::engine::game::{GameContext, GameEngine, GameResult};
use crate::error::Result;
use crate::models::TeamSide;

/// One game on the schedule. Without an explicit seed the game seed is
/// derived from the run's base seed and the game's position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledGame {
    pub away: String,
    pub home: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ScheduledGame {
    pub fn new(away: impl Into<String>, home: impl Into<String>) -> Self {
        Self { away: away.into(), home: home.into(), seed: None }
    }

    pub fn seed_for(&self, base_seed: u64, index: usize) -> u64 {
        self.seed.unwrap_or_else(|| base_seed.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_id: String,
    pub wins: u32,
    pub losses: u32,
    pub runs_for: u32,
    pub runs_against: u32,
}

impl TeamStanding {
    pub fn win_pct(&self) -> f64 {
        let games = self.wins + self.losses;
        if games == 0 {
            0.0
        } else {
            self.wins as f64 / games as f64
        }
    }

    pub fn run_differential(&self) -> i64 {
        self.runs_for as i64 - self.runs_against as i64
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeasonReport {
    pub games_played: u32,
    /// Games abandoned on an error; the rest of the schedule still runs.
    pub games_failed: u32,
    pub truncated_games: u32,
    pub plate_appearances: u64,
    pub warnings: u32,
    /// Stopped early by the cancellation flag.
    pub cancelled: bool,
    pub standings: BTreeMap<String, TeamStanding>,
}

impl SeasonReport {
    pub fn record(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.plate_appearances += result.plate_appearances as u64;
        self.warnings += result.warnings.len() as u32;
        if result.truncated {
            self.truncated_games += 1;
        }

        let score = result.final_score;
        let winner = score.winner();
        for (side, team, scored, allowed) in [
            (TeamSide::Away, &result.away_team, score.away, score.home),
            (TeamSide::Home, &result.home_team, score.home, score.away),
        ] {
            let standing = self
                .standings
                .entry(team.clone())
                .or_insert_with(|| TeamStanding { team_id: team.clone(), ..TeamStanding::default() });
            standing.runs_for += scored as u32;
            standing.runs_against += allowed as u32;
            match winner {
                Some(w) if w == side => standing.wins += 1,
                Some(_) => standing.losses += 1,
                // Truncated ties count for neither column
                None => {}
            }
        }
    }

    /// Best record first; ties broken by run differential, then team id.
    pub fn standings_sorted(&self) -> Vec<&TeamStanding> {
        let mut rows: Vec<&TeamStanding> = self.standings.values().collect();
        rows.sort_by(|a, b| {
            b.win_pct()
                .total_cmp(&a.win_pct())
                .then(b.run_differential().cmp(&a.run_differential()))
                .then(a.team_id.cmp(&b.team_id))
        });
        rows
    }
}

// ============================================================================
// Sequential runner
// ============================================================================

pub struct SeasonRunner<'a> {
    season: &'a SeasonData,
    config: &'a SimConfig,
    base_seed: u64,
    usage: UsageTracker,
}

impl<'a> SeasonRunner<'a> {
    pub fn new(season: &'a SeasonData, config: &'a SimConfig, base_seed: u64) -> Self {
        Self {
            season,
            config,
            base_seed,
            usage: UsageTracker::new(season.season_games, config.usage.min_prorated_target),
        }
    }

    /// Continue from usage accumulated elsewhere (an earlier partial run).
    pub fn with_usage(mut self, usage: UsageTracker) -> Self {
        self.usage = usage;
        self
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Play one game against the current usage, then fold its usage in.
    pub fn play(&mut self, game: &ScheduledGame, seed: u64) -> Result<GameResult> {
        let (result, usage) = {
            let ctx = GameContext::new(self.season, self.config, &game.away, &game.home)?.with_usage(&self.usage);
            let mut engine = GameEngine::new(ctx, seed)?;
            let result = engine.simulate()?;
            (result, engine.usage())
        };
        self.usage.record_game(&usage);
        Ok(result)
    }

    /// Play the schedule in order. `cancel` is only checked between games; a
    /// game in progress always runs to completion.
    pub fn run(&mut self, schedule: &[ScheduledGame], cancel: &AtomicBool) -> SeasonReport {
        let mut report = SeasonReport::default();
        for (index, game) in schedule.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                tracing::info!(played = report.games_played, remaining = schedule.len() - index, "season cancelled");
                report.cancelled = true;
                break;
            }
            let seed = game.seed_for(self.base_seed, index);
            match self.play(game, seed) {
                Ok(result) => report.record(&result),
                Err(e) => {
                    tracing::warn!(index, away = %game.away, home = %game.home, seed, error = %e, "game abandoned");
                    report.games_failed += 1;
                }
            }
        }
        tracing::info!(
            games = report.games_played,
            failed = report.games_failed,
            truncated = report.truncated_games,
            "season complete"
        );
        report
    }
}

// ============================================================================
// Parallel runner
// ============================================================================

/// Play games with no usage feedback between them, in parallel. Each engine
/// lives on one worker; results come back in schedule order.
pub fn run_independent_games(
    season: &SeasonData,
    config: &SimConfig,
    schedule: &[ScheduledGame],
    base_seed: u64,
) -> Vec<Result<GameResult>> {
    schedule
        .par_iter()
        .enumerate()
        .map(|(index, game)| {
            let ctx = GameContext::new(season, config, &game.away, &game.home)?;
            GameEngine::new(ctx, game.seed_for(base_seed, index))?.simulate()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_fixtures::sample_season;

    fn schedule() -> Vec<ScheduledGame> {
        vec![
            ScheduledGame::new("AWY", "HOM"),
            ScheduledGame::new("HOM", "AWY"),
            ScheduledGame::new("AWY", "ALH"),
            ScheduledGame { seed: Some(77), ..ScheduledGame::new("ALH", "HOM") },
        ]
    }

    #[test]
    fn test_season_runs_every_game() {
        let season = sample_season();
        let config = SimConfig::default();
        let mut runner = SeasonRunner::new(&season, &config, 5);
        let report = runner.run(&schedule(), &AtomicBool::new(false));

        assert_eq!(report.games_played, 4);
        assert_eq!(report.games_failed, 0);
        assert!(!report.cancelled);
        let wins: u32 = report.standings.values().map(|s| s.wins).sum();
        let losses: u32 = report.standings.values().map(|s| s.losses).sum();
        assert_eq!(wins, 4);
        assert_eq!(losses, 4);
        assert_eq!(runner.usage().games_played("AWY"), 3);
        assert_eq!(runner.usage().games_played("ALH"), 2);
    }

    #[test]
    fn test_cancel_stops_before_next_game() {
        let season = sample_season();
        let config = SimConfig::default();
        let mut runner = SeasonRunner::new(&season, &config, 5);
        let report = runner.run(&schedule(), &AtomicBool::new(true));
        assert!(report.cancelled);
        assert_eq!(report.games_played, 0);
        assert_eq!(runner.usage().games_played("AWY"), 0);
    }

    #[test]
    fn test_unknown_team_is_skipped() {
        let season = sample_season();
        let config = SimConfig::default();
        let mut runner = SeasonRunner::new(&season, &config, 5);
        let games = vec![ScheduledGame::new("AWY", "NOPE"), ScheduledGame::new("AWY", "HOM")];
        let report = runner.run(&games, &AtomicBool::new(false));
        assert_eq!(report.games_failed, 1);
        assert_eq!(report.games_played, 1);
    }

    #[test]
    fn test_parallel_matches_sequential_engine() {
        let season = sample_season();
        let config = SimConfig::default();
        let games = schedule();
        let results = run_independent_games(&season, &config, &games, 11);
        assert_eq!(results.len(), games.len());

        for (index, (game, result)) in games.iter().zip(&results).enumerate() {
            let result = result.as_ref().unwrap();
            let ctx = GameContext::new(&season, &config, &game.away, &game.home).unwrap();
            let solo = GameEngine::new(ctx, game.seed_for(11, index)).unwrap().simulate().unwrap();
            assert_eq!(result.plays, solo.plays);
            assert_eq!(result.home_team, game.home);
        }
    }

    #[test]
    fn test_explicit_seed_wins() {
        let game = ScheduledGame { seed: Some(3), ..ScheduledGame::new("A", "B") };
        assert_eq!(game.seed_for(1000, 7), 3);
        let derived = ScheduledGame::new("A", "B");
        assert_ne!(derived.seed_for(1000, 0), derived.seed_for(1000, 1));
    }

    #[test]
    fn test_standings_order() {
        let mut report = SeasonReport::default();
        report.standings.insert(
            "A".into(),
            TeamStanding { team_id: "A".into(), wins: 5, losses: 5, runs_for: 40, runs_against: 30 },
        );
        report.standings.insert(
            "B".into(),
            TeamStanding { team_id: "B".into(), wins: 6, losses: 4, runs_for: 30, runs_against: 35 },
        );
        report.standings.insert(
            "C".into(),
            TeamStanding { team_id: "C".into(), wins: 5, losses: 5, runs_for: 30, runs_against: 40 },
        );
        let order: Vec<&str> = report.standings_sorted().iter().map(|s| s.team_id.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }
}
