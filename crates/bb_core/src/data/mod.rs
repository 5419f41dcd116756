//! Typed ingestion boundary.
//!
//! Everything the data-preparation collaborator hands over is parsed into the
//! records below and validated once, before any game starts. After that the
//! data is read-only for the duration of a game.

mod dh_rules;
mod norms;
mod team_cache;
mod usage;

pub use dh_rules::{DhRule, DhRules};
pub use norms::{InningBand, PullThresholds, RelieverBfpNorms, SeasonNorms};
pub use team_cache::TeamCache;
pub use usage::{GameUsage, UsageRecord, UsageTracker};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Result, SimError};
use crate::models::{PlayerId, Position, RosterPlayer};

fn default_season_games() -> u32 {
    162
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TeamMeta {
    #[validate(length(min = 1))]
    pub team_id: String,
    pub year: u16,
    pub name: String,
    #[serde(default)]
    pub city: String,
    pub league: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TeamRoster {
    #[validate(length(min = 1))]
    pub team_id: String,
    pub league: String,
    #[validate(length(min = 10))]
    pub players: Vec<RosterPlayer>,
}

impl TeamRoster {
    pub fn player(&self, id: &PlayerId) -> Option<&RosterPlayer> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn name_of(&self, id: &PlayerId) -> String {
        self.player(id).map_or_else(|| id.to_string(), |p| p.name.clone())
    }

    /// Primary pitchers with a pitching record. Position players who took
    /// the mound during the season are not staff and never come out of it.
    pub fn pitchers(&self) -> impl Iterator<Item = &RosterPlayer> {
        self.players.iter().filter(|p| p.is_pitcher() && p.pitching.is_some())
    }

    /// Non-pitchers with a batting record.
    pub fn position_players(&self) -> impl Iterator<Item = &RosterPlayer> {
        self.players.iter().filter(|p| !p.is_pitcher() && p.batting.is_some())
    }

    pub fn is_eligible(&self, id: &PlayerId, position: Position) -> bool {
        self.player(id).is_some_and(|p| p.is_eligible_at(position))
    }

    pub fn validate_records(&self, tolerance: f64) -> Result<()> {
        self.validate().map_err(|e| SimError::InvalidData(format!("team {}: {}", self.team_id, e)))?;

        let mut seen = BTreeSet::new();
        for player in &self.players {
            player
                .validate()
                .map_err(|e| SimError::InvalidData(format!("player {}: {}", player.id, e)))?;
            if let Some(batting) = &player.batting {
                batting
                    .validate()
                    .map_err(|e| SimError::InvalidData(format!("player {}: {}", player.id, e)))?;
            }
            if let Some(pitching) = &player.pitching {
                pitching
                    .validate()
                    .map_err(|e| SimError::InvalidData(format!("player {}: {}", player.id, e)))?;
            }
            if !seen.insert(&player.id) {
                return Err(SimError::InvalidData(format!(
                    "team {} lists player {} twice",
                    self.team_id, player.id
                )));
            }
            player.validate_rates(tolerance)?;
        }
        if self.pitchers().next().is_none() {
            return Err(SimError::InsufficientRoster {
                team: self.team_id.clone(),
                reason: "no pitchers".to_string(),
            });
        }
        Ok(())
    }
}

/// Everything needed to replay one league season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonData {
    pub year: u16,
    #[serde(default = "default_season_games")]
    pub season_games: u32,
    pub norms: SeasonNorms,
    pub teams: Vec<TeamRoster>,
    #[serde(default)]
    pub team_meta: Vec<TeamMeta>,
    #[serde(default)]
    pub dh_rules: Option<DhRules>,
}

impl SeasonData {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate_records(&self, tolerance: f64) -> Result<()> {
        self.norms.validate().map_err(|e| SimError::InvalidData(format!("norms: {}", e)))?;
        if self.norms.year != self.year {
            return Err(SimError::InvalidData(format!(
                "norms year {} does not match season {}",
                self.norms.year, self.year
            )));
        }
        self.norms.league_rates.validate("league", "baseline", tolerance)?;
        if let Some(rates) = &self.norms.pitcher_batting_rates {
            rates.validate("league", "pitcher batting", tolerance)?;
        }
        if let Some(t) = &self.norms.pull_thresholds {
            if !t.is_ordered() {
                return Err(SimError::InvalidData("pull thresholds out of order".to_string()));
            }
        }
        for team in &self.teams {
            team.validate_records(tolerance)?;
        }
        for meta in &self.team_meta {
            meta.validate().map_err(|e| SimError::InvalidData(format!("team meta: {}", e)))?;
        }
        Ok(())
    }

    pub fn team(&self, team_id: &str) -> Result<&TeamRoster> {
        self.teams
            .iter()
            .find(|t| t.team_id == team_id)
            .ok_or_else(|| SimError::UnknownTeam(team_id.to_string()))
    }

    pub fn dh_rules(&self) -> DhRules {
        self.dh_rules.clone().unwrap_or_default()
    }

    /// Cache of this season's team metadata.
    pub fn team_cache(&self) -> TeamCache {
        let mut cache = TeamCache::new();
        cache.init(self.team_meta.iter().cloned());
        cache
    }
}
