//! Season usage accounting across games.
//!
//! Ratios compare actual simulated usage with the player's historical volume
//! prorated to the team's games played so far. The tracker is written only
//! between games, by a single writer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{PlayerId, RosterPlayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageRecord {
    pub plate_appearances: u32,
    pub games_started: u32,
    pub batters_faced: u32,
}

impl UsageRecord {
    fn absorb(&mut self, other: &UsageRecord) {
        self.plate_appearances += other.plate_appearances;
        self.games_started += other.games_started;
        self.batters_faced += other.batters_faced;
    }
}

/// Usage produced by one completed game.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameUsage {
    pub away_team: String,
    pub home_team: String,
    pub players: BTreeMap<PlayerId, UsageRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageTracker {
    season_games: u32,
    /// Below this prorated volume a ratio is too noisy to act on.
    min_prorated_target: f64,
    team_games: BTreeMap<String, u32>,
    players: BTreeMap<PlayerId, UsageRecord>,
}

impl UsageTracker {
    pub fn new(season_games: u32, min_prorated_target: f64) -> Self {
        Self {
            season_games: season_games.max(1),
            min_prorated_target,
            team_games: BTreeMap::new(),
            players: BTreeMap::new(),
        }
    }

    pub fn record_game(&mut self, usage: &GameUsage) {
        *self.team_games.entry(usage.away_team.clone()).or_default() += 1;
        *self.team_games.entry(usage.home_team.clone()).or_default() += 1;
        for (id, record) in &usage.players {
            self.players.entry(id.clone()).or_default().absorb(record);
        }
    }

    pub fn games_played(&self, team_id: &str) -> u32 {
        self.team_games.get(team_id).copied().unwrap_or(0)
    }

    pub fn record(&self, id: &PlayerId) -> UsageRecord {
        self.players.get(id).copied().unwrap_or_default()
    }

    fn season_fraction(&self, team_id: &str) -> f64 {
        (self.games_played(team_id) as f64 / self.season_games as f64).min(1.0)
    }

    fn ratio(&self, used: u32, season_total: u32, team_id: &str) -> Option<f64> {
        let prorated = season_total as f64 * self.season_fraction(team_id);
        if prorated < self.min_prorated_target {
            return None;
        }
        Some(used as f64 / prorated)
    }

    /// Plate appearances used vs prorated historical plate appearances.
    pub fn batting_ratio(&self, team_id: &str, player: &RosterPlayer) -> Option<f64> {
        let actual = player.batting.as_ref()?.plate_appearances;
        self.ratio(self.record(&player.id).plate_appearances, actual, team_id)
    }

    /// Starts made vs prorated historical games started.
    pub fn starts_ratio(&self, team_id: &str, player: &RosterPlayer) -> Option<f64> {
        let actual = player.pitching.as_ref()?.games_started;
        self.ratio(self.record(&player.id).games_started, actual, team_id)
    }

    pub fn reset(&mut self) {
        self.team_games.clear();
        self.players.clear();
    }
}
