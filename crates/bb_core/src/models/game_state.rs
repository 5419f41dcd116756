//! Aggregate game state, owned and mutated only by the game engine.

use std::collections::VecDeque;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::bases::BaserunningState;
use super::events::PlayEvent;
use super::lineup::LineupState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Half {
    Top,
    Bottom,
}

impl Half {
    /// Team at bat during this half.
    pub fn batting_side(self) -> TeamSide {
        match self {
            Half::Top => TeamSide::Away,
            Half::Bottom => TeamSide::Home,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Away,
    Home,
}

impl TeamSide {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            TeamSide::Away => 0,
            TeamSide::Home => 1,
        }
    }

    #[inline]
    pub fn opponent(self) -> Self {
        match self {
            TeamSide::Away => TeamSide::Home,
            TeamSide::Home => TeamSide::Away,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum GameStatus {
    InProgress { inning: u8, half: Half, outs: u8 },
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub inning: u8,
    pub half: Half,
    pub bases: BaserunningState,
    pub away: LineupState,
    pub home: LineupState,
    pub away_score: u16,
    pub home_score: u16,
    /// Play log, newest first. Append-only: entries are never edited or removed.
    pub plays: VecDeque<PlayEvent>,
    pub home_batted_this_inning: bool,
    pub complete: bool,
    pub plate_appearances: u32,
}

impl GameState {
    pub fn new(away: LineupState, home: LineupState) -> Self {
        Self {
            inning: 1,
            half: Half::Top,
            bases: BaserunningState::empty(),
            away,
            home,
            away_score: 0,
            home_score: 0,
            plays: VecDeque::new(),
            home_batted_this_inning: false,
            complete: false,
            plate_appearances: 0,
        }
    }

    #[inline]
    pub fn outs(&self) -> u8 {
        self.bases.outs
    }

    pub fn status(&self) -> GameStatus {
        if self.complete {
            GameStatus::Complete
        } else {
            GameStatus::InProgress { inning: self.inning, half: self.half, outs: self.bases.outs }
        }
    }

    #[inline]
    pub fn batting_side(&self) -> TeamSide {
        self.half.batting_side()
    }

    #[inline]
    pub fn fielding_side(&self) -> TeamSide {
        self.batting_side().opponent()
    }

    pub fn lineup(&self, side: TeamSide) -> &LineupState {
        match side {
            TeamSide::Away => &self.away,
            TeamSide::Home => &self.home,
        }
    }

    pub fn lineup_mut(&mut self, side: TeamSide) -> &mut LineupState {
        match side {
            TeamSide::Away => &mut self.away,
            TeamSide::Home => &mut self.home,
        }
    }

    pub fn score(&self, side: TeamSide) -> u16 {
        match side {
            TeamSide::Away => self.away_score,
            TeamSide::Home => self.home_score,
        }
    }

    pub fn add_runs(&mut self, side: TeamSide, runs: u16) {
        match side {
            TeamSide::Away => self.away_score += runs,
            TeamSide::Home => self.home_score += runs,
        }
    }

    /// `side`'s score minus the opponent's.
    pub fn lead_for(&self, side: TeamSide) -> i32 {
        self.score(side) as i32 - self.score(side.opponent()) as i32
    }

    pub fn push_play(&mut self, event: PlayEvent) {
        self.plays.push_front(event);
    }

    /// Play log oldest first.
    pub fn plays_chronological(&self) -> impl Iterator<Item = &PlayEvent> {
        self.plays.iter().rev()
    }

    pub fn last_play(&self) -> Option<&PlayEvent> {
        self.plays.front()
    }
}
