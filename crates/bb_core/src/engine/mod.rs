pub mod baserunning;
pub mod config;
pub mod game;
pub mod lineup;
pub mod manager;
pub mod rate_model;
pub mod season;
pub mod test_fixtures; // Shared rosters for tests and benches

pub use baserunning::{transition, TransitionResult};
pub use config::SimConfig;
pub use game::{game_over, FinalScore, GameContext, GameEngine, GameResult, GameSnapshot};
pub use lineup::{BuiltLineup, LineupBuilder, LineupRequest};
pub use rate_model::{Matchup, MatchupSide, RateModel};
pub use season::{run_independent_games, ScheduledGame, SeasonReport, SeasonRunner, TeamStanding};
