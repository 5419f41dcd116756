//! bb - replay historical baseball games from per-player rate data.
//!
//! `bb game` plays one game and prints the play log (or the full JSON
//! result); `bb season` plays a schedule with season usage tracking and
//! prints standings.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use bb_core::{
    GameContext, GameEngine, GameResult, ScheduledGame, SeasonData, SeasonReport, SeasonRunner, SimConfig, TeamCache,
};

#[derive(Parser)]
#[command(name = "bb")]
#[command(about = "Deterministic baseball replay simulator", long_about = None)]
struct Cli {
    /// Simulation config (JSON or YAML); overrides BB_SIM_CONFIG_PATH
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game
    Game {
        /// Season data JSON file
        #[arg(long)]
        data: PathBuf,

        /// Home team id
        #[arg(long)]
        home: String,

        /// Away team id
        #[arg(long)]
        away: String,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Print the full result as JSON instead of the play log
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Play a schedule of games in order
    Season {
        /// Season data JSON file
        #[arg(long)]
        data: PathBuf,

        /// Schedule JSON file: a list of {"away", "home", "seed"?}
        #[arg(long)]
        schedule: PathBuf,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Stop starting new games after this many seconds
        #[arg(long)]
        time_limit: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Game { data, home, away, seed, json } => {
            let season = load_season(&data, &config)?;
            let result = play_game(&season, &config, &away, &home, seed)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render_game(&result));
            }
        }

        Commands::Season { data, schedule, seed, time_limit } => {
            let season = load_season(&data, &config)?;
            let schedule = load_schedule(&schedule)?;

            let cancel = Arc::new(AtomicBool::new(false));
            if let Some(secs) = time_limit {
                let flag = Arc::clone(&cancel);
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_secs(secs));
                    flag.store(true, Ordering::Relaxed);
                });
            }

            let mut runner = SeasonRunner::new(&season, &config, seed);
            let report = runner.run(&schedule, &cancel);
            print!("{}", render_standings(&report, &season.team_cache(), season.year));
        }
    }

    Ok(())
}

/// Names the config file when `--config` is not given.
const SIM_CONFIG_PATH_ENV: &str = "BB_SIM_CONFIG_PATH";

/// `--config` wins over the environment; an empty variable means unset.
fn config_path(flag: Option<&Path>, env_value: Option<String>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf).or_else(|| {
        env_value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).map(PathBuf::from)
    })
}

fn load_config(flag: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = config_path(flag, std::env::var(SIM_CONFIG_PATH_ENV).ok()) else {
        return Ok(SimConfig::default());
    };
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("failed to read config {}", path.display()))?;
    let is_yaml = matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"));
    let parsed = if is_yaml { SimConfig::from_yaml(&content) } else { SimConfig::from_json(&content) };
    let config = parsed.with_context(|| format!("malformed config {}", path.display()))?;
    config.validate().with_context(|| format!("invalid simulation config {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded simulation config");
    Ok(config)
}

fn load_season(path: &Path, config: &SimConfig) -> Result<SeasonData> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("failed to read season data {}", path.display()))?;
    let season = SeasonData::from_json(&json).with_context(|| format!("malformed season data {}", path.display()))?;
    season
        .validate_records(config.rates.sum_tolerance)
        .with_context(|| format!("invalid season data {}", path.display()))?;
    tracing::info!(year = season.year, teams = season.teams.len(), "loaded season data from {}", path.display());
    Ok(season)
}

fn load_schedule(path: &Path) -> Result<Vec<ScheduledGame>> {
    let json = std::fs::read_to_string(path).with_context(|| format!("failed to read schedule {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("malformed schedule {}", path.display()))
}

fn play_game(season: &SeasonData, config: &SimConfig, away: &str, home: &str, seed: u64) -> Result<GameResult> {
    let ctx = GameContext::new(season, config, away, home).with_context(|| format!("cannot set up {away} at {home}"))?;
    let mut engine = GameEngine::new(ctx, seed).context("failed to build lineups")?;
    engine.simulate().with_context(|| format!("game {away} at {home} (seed {seed}) failed"))
}

fn render_game(result: &GameResult) -> String {
    let mut out = String::new();
    for play in &result.plays {
        if play.flags.summary {
            out.push_str(&format!("  -- {}\n", play.description));
        } else if play.is_plate_appearance() {
            out.push_str(&format!(
                "{:>2} {:<6} {} out  {}\n",
                play.inning,
                format!("{:?}", play.half).to_lowercase(),
                play.outs_before,
                play.description
            ));
        } else {
            out.push_str(&format!("   * {}\n", play.description));
        }
    }

    let line = |team: &bb_core::models::TeamBox| {
        let innings: Vec<String> = team.runs_by_inning.iter().map(|r| r.to_string()).collect();
        format!(
            "{:<5} {}  R {:>2}  H {:>2}  E {:>2}  LOB {:>2}\n",
            team.team_id,
            innings.join(" "),
            team.runs,
            team.hits,
            team.errors,
            team.left_on_base
        )
    };
    out.push('\n');
    out.push_str(&line(&result.box_score.away));
    out.push_str(&line(&result.box_score.home));
    for p in &result.box_score.pitchers {
        out.push_str(&format!(
            "  {:<5} {:<24} IP {:>4}  BF {:>2}  H {:>2}  BB {:>2}  R {:>2}  ER {:>2}\n",
            p.team_id,
            p.name,
            p.innings_pitched(),
            p.batters_faced,
            p.hits,
            p.walks,
            p.runs,
            p.earned_runs
        ));
    }
    for w in &result.warnings {
        out.push_str(&format!("warning: {}\n", w.message));
    }
    if result.truncated {
        out.push_str("game stopped at the plate appearance cap\n");
    }
    out
}

fn render_standings(report: &SeasonReport, names: &TeamCache, year: u16) -> String {
    let mut out = format!("{:<24} {:>4} {:>4} {:>6} {:>5} {:>5}\n", "Team", "W", "L", "Pct", "RS", "RA");
    for s in report.standings_sorted() {
        out.push_str(&format!(
            "{:<24} {:>4} {:>4} {:>6.3} {:>5} {:>5}\n",
            names.display_name(&s.team_id, year),
            s.wins,
            s.losses,
            s.win_pct(),
            s.runs_for,
            s.runs_against
        ));
    }
    out.push_str(&format!(
        "\n{} games, {} plate appearances, {} warnings",
        report.games_played, report.plate_appearances, report.warnings
    ));
    if report.games_failed > 0 {
        out.push_str(&format!(", {} failed", report.games_failed));
    }
    if report.truncated_games > 0 {
        out.push_str(&format!(", {} truncated", report.truncated_games));
    }
    if report.cancelled {
        out.push_str(" (cancelled)");
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_core::engine::test_fixtures::sample_season;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_cli_parses_game_command() {
        let cli = Cli::try_parse_from(["bb", "game", "--data", "s.json", "--home", "HOM", "--away", "AWY", "--seed", "9"])
            .unwrap();
        match cli.command {
            Commands::Game { home, away, seed, json, .. } => {
                assert_eq!(home, "HOM");
                assert_eq!(away, "AWY");
                assert_eq!(seed, 9);
                assert!(!json);
            }
            Commands::Season { .. } => panic!("expected game"),
        }
    }

    #[test]
    fn test_season_file_round_trip_and_play() {
        let season = sample_season();
        let file = write_temp(&serde_json::to_string(&season).unwrap());
        let config = SimConfig::default();
        let loaded = load_season(file.path(), &config).unwrap();

        let result = play_game(&loaded, &config, "AWY", "HOM", 3).unwrap();
        let text = render_game(&result);
        assert!(text.contains("AWY"));
        assert!(text.contains("IP"));
    }

    #[test]
    fn test_schedule_seed_is_optional() {
        let file = write_temp(r#"[{"away": "AWY", "home": "HOM"}, {"away": "HOM", "home": "AWY", "seed": 4}]"#);
        let schedule = load_schedule(file.path()).unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].seed, None);
        assert_eq!(schedule[1].seed, Some(4));
    }

    #[test]
    fn test_config_flag_overrides_env() {
        let flag = PathBuf::from("flag.yaml");
        assert_eq!(config_path(Some(flag.as_path()), Some("env.json".into())), Some(flag));
        assert_eq!(config_path(None, Some(" env.json ".into())), Some(PathBuf::from("env.json")));
        assert_eq!(config_path(None, Some("   ".into())), None);
        assert_eq!(config_path(None, None), None);
    }

    #[test]
    fn test_yaml_config_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        file.write_all(b"game:\n  max_plate_appearances: 300\n  regulation_innings: 7\n").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.game.regulation_innings, 7);
        assert_eq!(config.game.max_plate_appearances, 300);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let file = write_temp(r#"{"game": {"max_plate_appearances": 10, "regulation_innings": 9}}"#);
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("invalid simulation config"));
    }

    #[test]
    fn test_invalid_season_is_rejected() {
        let mut season = sample_season();
        season.norms.year = 1950;
        let file = write_temp(&serde_json::to_string(&season).unwrap());
        let err = load_season(file.path(), &SimConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid season data"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_schedule(Path::new("/nonexistent/schedule.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/schedule.json"));
    }

    #[test]
    fn test_standings_render() {
        let season = sample_season();
        let config = SimConfig::default();
        let mut runner = SeasonRunner::new(&season, &config, 1);
        let schedule = vec![ScheduledGame::new("AWY", "HOM"), ScheduledGame::new("HOM", "AWY")];
        let report = runner.run(&schedule, &AtomicBool::new(false));
        let text = render_standings(&report, &season.team_cache(), season.year);
        assert!(text.starts_with("Team"));
        assert!(text.contains("HOM Club"));
        assert!(text.contains("2 games"));
    }
}
