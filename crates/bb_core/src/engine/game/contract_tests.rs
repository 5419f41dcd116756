//! Game engine contract tests
//!
//! Properties every full game must keep:
//! 1. Deterministic replay from a seed
//! 2. No removed player or pitcher ever comes back
//! 3. Walk-off truncation
//! 4. Third out clears the bases and resets outs
//! 5. Snapshot/restore continues the same game

#[cfg(test)]
mod tests {
    use crate::data::SeasonData;
    use crate::engine::config::SimConfig;
    use crate::engine::game::{game_over, GameContext, GameEngine, GameSnapshot};
    use crate::engine::test_fixtures::{add_position_player_relief, sample_season};
    use crate::models::{
        BaserunningState, GameState, Half, Outcome, PlayEvent, PlayerId, TeamSide, WarningKind,
    };

    fn play(season: &SeasonData, config: &SimConfig, home: &str, seed: u64) -> crate::engine::game::GameResult {
        let ctx = GameContext::new(season, config, "AWY", home).unwrap();
        GameEngine::new(ctx, seed).unwrap().simulate().unwrap()
    }

    fn last_plate_appearance(state: &GameState) -> &PlayEvent {
        state.plays.iter().find(|p| p.is_plate_appearance()).unwrap()
    }

    fn loaded(state: &GameState, side: TeamSide) -> BaserunningState {
        let slots = &state.lineup(side).slots;
        BaserunningState {
            outs: 0,
            first: Some(slots[0].player_id.clone()),
            second: Some(slots[1].player_id.clone()),
            third: Some(slots[2].player_id.clone()),
        }
    }

    /// Bottom of the 9th, bases loaded, nobody out.
    fn walk_off_setup(engine: &mut GameEngine<'_>, away: u16, home: u16) {
        engine.state.inning = 9;
        engine.state.half = Half::Bottom;
        engine.state.away_score = away;
        engine.state.home_score = home;
        engine.state.home.current_batter = 3;
        engine.state.bases = loaded(&engine.state, TeamSide::Home);
    }

    // ========== Determinism ==========

    #[test]
    fn test_same_seed_same_play_log() {
        let season = sample_season();
        let config = SimConfig::default();
        for seed in [1, 7, 2024] {
            let a = play(&season, &config, "HOM", seed);
            let b = play(&season, &config, "HOM", seed);
            assert_eq!(a.plays, b.plays, "seed {seed} diverged");
            assert_eq!(a.final_score, b.final_score);
        }
    }

    #[test]
    fn test_games_finish_by_the_rules() {
        let season = sample_season();
        let config = SimConfig::default();
        for seed in 0..30 {
            let result = play(&season, &config, "HOM", seed);
            assert!(!result.truncated, "seed {seed} hit the plate appearance cap");
            assert!(result.innings >= 9);
            assert!(result.final_score.winner().is_some(), "seed {seed} ended tied");

            let by_inning: u16 = result.box_score.home.runs_by_inning.iter().sum();
            assert_eq!(by_inning, result.final_score.home);
            assert_eq!(result.box_score.away.runs, result.final_score.away);

            let hits = result
                .plays
                .iter()
                .filter(|p| p.outcome.is_some_and(|o| o.is_hit()))
                .count() as u16;
            assert_eq!(hits, result.box_score.away.hits + result.box_score.home.hits);

            let sequences: Vec<u32> = result.plays.iter().map(|p| p.sequence).collect();
            assert!(sequences.windows(2).all(|w| w[1] == w[0] + 1));
        }
    }

    // ========== Substitution invariants ==========

    /// Pitchers of record for one fielding side, in order of appearance.
    fn pitcher_runs(plays: &[PlayEvent], fielding_half: Half) -> Vec<PlayerId> {
        let mut runs: Vec<PlayerId> = Vec::new();
        for p in plays.iter().filter(|p| p.is_plate_appearance() && p.half == fielding_half) {
            if let Some(id) = &p.pitcher_id {
                if runs.last() != Some(id) {
                    runs.push(id.clone());
                }
            }
        }
        runs
    }

    #[test]
    fn test_removed_pitcher_never_returns() {
        let season = sample_season();
        let config = SimConfig::default();
        let mut changes = 0;
        for seed in 0..60 {
            let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
            let mut engine = GameEngine::new(ctx, seed).unwrap();
            while !engine.is_complete() {
                engine.step().unwrap();
                if engine.is_complete() {
                    break;
                }
                let fielding = engine.state().fielding_side();
                let current = &engine.state().lineup(fielding).current_pitcher;
                assert!(!engine.removed_players().contains(current), "seed {seed}: {current} re-entered");
                assert!(engine.state().lineup(fielding).structural_violations().is_empty(), "seed {seed}");
            }

            let result = engine.result();
            // Home pitches in the top half, away in the bottom
            for half in [Half::Top, Half::Bottom] {
                let runs = pitcher_runs(&result.plays, half);
                for (i, id) in runs.iter().enumerate() {
                    assert!(!runs[i + 1..].contains(id), "seed {seed}: {id} pitched twice");
                }
                changes += runs.len() - 1;
            }
            for side in [TeamSide::Away, TeamSide::Home] {
                for slot in &engine.state().lineup(side).slots {
                    assert!(!engine.removed_players().contains(&slot.player_id), "seed {seed}");
                }
            }
        }
        assert!(changes > 0, "no pitching changes in 60 games");
    }

    #[test]
    fn test_hitters_with_relief_lines_never_pitch() {
        let mut season = sample_season();
        for team in season.teams.iter_mut() {
            add_position_player_relief(team);
        }
        let config = SimConfig::default();
        for (seed, home) in (0..40).zip(["HOM", "ALH"].into_iter().cycle()) {
            let ctx = GameContext::new(&season, &config, "AWY", home).unwrap();
            let mut engine = GameEngine::new(ctx, seed).unwrap();
            while !engine.is_complete() {
                engine.step().unwrap();
                for side in [TeamSide::Away, TeamSide::Home] {
                    let lineup = engine.state().lineup(side);
                    assert!(lineup.structural_violations().is_empty(), "seed {seed} {side:?}");
                    let roster = season.team(&lineup.team_id).unwrap();
                    let pitcher = roster.player(&lineup.current_pitcher).unwrap();
                    assert!(pitcher.is_pitcher(), "seed {seed}: {} took the mound", pitcher.id);
                }
            }
        }
    }

    #[test]
    fn test_pinch_hitters_are_used_once() {
        let season = sample_season();
        let config = SimConfig::default();
        let mut pinch_hits = 0;
        for seed in 0..40 {
            let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
            let mut engine = GameEngine::new(ctx, seed).unwrap();
            let result = engine.simulate().unwrap();
            let events = result.plays.iter().filter(|p| p.flags.pinch_hit).count();
            assert_eq!(events, engine.used_pinch_hitters().len());
            pinch_hits += events;
        }
        assert!(pinch_hits > 0, "no pinch hitters in 40 games without the DH");
    }

    #[test]
    fn test_pitchers_never_bat_with_dh() {
        let season = sample_season();
        let config = SimConfig::default();
        let home = season.team("ALH").unwrap();
        let away = season.team("AWY").unwrap();
        for seed in 0..10 {
            let result = play(&season, &config, "ALH", seed);
            for p in result.plays.iter().filter(|p| p.is_plate_appearance()) {
                let batter = p.batter_id.as_ref().unwrap();
                let player = home.player(batter).or_else(|| away.player(batter)).unwrap();
                assert!(!player.is_pitcher(), "seed {seed}: pitcher {batter} batted with the DH");
            }
        }
    }

    // ========== Walk-off ==========

    #[test]
    fn test_walk_off_double_in_tied_game_counts_one_run() {
        let season = sample_season();
        let config = SimConfig::deterministic_test();
        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        let mut engine = GameEngine::new(ctx, 3).unwrap();
        walk_off_setup(&mut engine, 3, 3);

        engine.resolve_plate_appearance(Outcome::Double).unwrap();

        assert!(engine.is_complete());
        let last = last_plate_appearance(engine.state());
        assert_eq!(last.runs.total(), 1);
        assert!(last.flags.walk_off);
        assert_eq!(engine.state().home_score, 4);
        assert_eq!(engine.result().final_score.winner(), Some(TeamSide::Home));
    }

    #[test]
    fn test_walk_off_double_when_trailing_by_one_counts_two_runs() {
        let season = sample_season();
        let config = SimConfig::deterministic_test();
        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        let mut engine = GameEngine::new(ctx, 3).unwrap();
        walk_off_setup(&mut engine, 4, 3);

        engine.resolve_plate_appearance(Outcome::Double).unwrap();

        assert!(engine.is_complete());
        assert_eq!(last_plate_appearance(engine.state()).runs.total(), 2);
        assert_eq!(engine.state().home_score, 5);
    }

    #[test]
    fn test_walk_off_home_run_counts_every_run() {
        let season = sample_season();
        let config = SimConfig::deterministic_test();
        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        let mut engine = GameEngine::new(ctx, 3).unwrap();
        walk_off_setup(&mut engine, 3, 3);

        engine.resolve_plate_appearance(Outcome::HomeRun).unwrap();
        assert!(engine.is_complete());
        assert_eq!(engine.state().home_score, 7);
    }

    // ========== Half-inning end ==========

    #[test]
    fn test_ground_out_for_third_out_resets_bases() {
        let season = sample_season();
        let config = SimConfig::deterministic_test();
        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        let mut engine = GameEngine::new(ctx, 8).unwrap();
        engine.state.inning = 3;
        engine.state.bases = BaserunningState {
            outs: 2,
            third: Some(engine.state.away.slots[4].player_id.clone()),
            ..BaserunningState::empty()
        };
        let away_before = engine.state().away_score;

        engine.resolve_plate_appearance(Outcome::GroundOut).unwrap();

        let state = engine.state();
        assert_eq!(state.outs(), 0);
        assert!(state.bases.is_empty());
        assert_eq!(state.half, Half::Bottom);
        assert_eq!(state.away_score, away_before);
        let last = last_plate_appearance(state);
        assert_eq!(last.runs.total(), 0);
        assert!(last.bases_after.is_empty());
        assert_eq!(last.bases_after.outs, 0);
        assert!(state.plays.iter().any(|p| p.flags.summary));
    }

    #[test]
    fn test_runs_after_error_are_unearned() {
        let season = sample_season();
        let config = SimConfig::deterministic_test();
        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        let mut engine = GameEngine::new(ctx, 8).unwrap();
        let runner = engine.state.away.slots[6].player_id.clone();
        engine.state.bases = BaserunningState { outs: 1, third: Some(runner.clone()), ..BaserunningState::empty() };
        engine.reached_on_error.insert(runner);

        engine.resolve_plate_appearance(Outcome::Single).unwrap();
        let last = last_plate_appearance(engine.state());
        assert_eq!(last.runs.unearned, 1);
        assert_eq!(last.runs.earned, 0);
    }

    #[test]
    fn test_completion_rule() {
        let season = sample_season();
        let config = SimConfig::deterministic_test();
        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        let mut state = GameEngine::new(ctx, 1).unwrap().state().clone();

        state.inning = 9;
        state.half = Half::Top;
        state.home_score = 2;
        assert!(!game_over(&state, 9, false));
        assert!(game_over(&state, 9, true), "home leads after the top of the 9th");

        state.half = Half::Bottom;
        state.home_score = 0;
        state.away_score = 1;
        assert!(!game_over(&state, 9, false));
        assert!(game_over(&state, 9, true));

        state.away_score = 0;
        assert!(!game_over(&state, 9, true), "tie goes to extra innings");

        state.inning = 8;
        state.home_score = 5;
        assert!(!game_over(&state, 9, true));
    }

    #[test]
    fn test_plate_appearance_cap() {
        let season = sample_season();
        let mut config = SimConfig::deterministic_test();
        config.game.max_plate_appearances = 30;
        let result = play(&season, &config, "HOM", 4);
        assert!(result.truncated);
        assert_eq!(result.plate_appearances, 30);
        assert!(result.warnings.iter().any(|w| w.kind == WarningKind::PlateAppearanceCap));
    }

    // ========== Snapshot ==========

    #[test]
    fn test_restore_continues_the_same_game() {
        let season = sample_season();
        let config = SimConfig::default();
        for (seed, split_at) in [(42u64, 37usize), (9, 61)] {
            let uninterrupted = play(&season, &config, "HOM", seed);

            let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
            let mut first = GameEngine::new(ctx, seed).unwrap();
            for _ in 0..split_at {
                first.step().unwrap();
            }
            let bytes = first.snapshot().to_bytes().unwrap();
            drop(first);

            let snapshot = GameSnapshot::from_bytes(&bytes).unwrap();
            let mut resumed = GameEngine::restore(ctx, snapshot).unwrap();
            let result = resumed.simulate().unwrap();

            assert_eq!(result.plays, uninterrupted.plays, "seed {seed}");
            assert_eq!(result.final_score, uninterrupted.final_score);
        }
    }

    #[test]
    fn test_usage_matches_box_score() {
        let season = sample_season();
        let config = SimConfig::default();
        let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
        let mut engine = GameEngine::new(ctx, 12).unwrap();
        let result = engine.simulate().unwrap();
        let usage = engine.usage();

        let pa: u32 = usage.players.values().map(|r| r.plate_appearances).sum();
        assert_eq!(pa, result.plate_appearances);
        let bf: u32 = usage.players.values().map(|r| r.batters_faced).sum();
        assert_eq!(bf, result.plate_appearances);
        let starts: u32 = usage.players.values().map(|r| r.games_started).sum();
        assert_eq!(starts, 2);
    }
}
