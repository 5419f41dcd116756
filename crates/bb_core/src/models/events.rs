use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::bases::BaserunningState;
use super::game_state::Half;
use super::outcome::Outcome;
use super::player::PlayerId;

/// One entry in the play log handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlayEvent {
    /// Monotonic position in the game (0-based).
    pub sequence: u32,
    pub inning: u8,
    pub half: Half,
    pub outs_before: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batter_id: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batter_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitcher_id: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitcher_name: Option<String>,
    pub runs: RunsScored,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scorer_ids: Vec<PlayerId>,
    pub bases_before: BaserunningState,
    pub bases_after: BaserunningState,
    pub away_score: u16,
    pub home_score: u16,
    pub description: String,
    pub flags: EventFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct RunsScored {
    pub earned: u8,
    pub unearned: u8,
}

impl RunsScored {
    #[inline]
    pub fn total(&self) -> u8 {
        self.earned + self.unearned
    }
}

/// Marks non plate-appearance entries and notable plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct EventFlags {
    #[serde(default)]
    pub summary: bool,
    #[serde(default)]
    pub lineup: bool,
    #[serde(default)]
    pub pinch_hit: bool,
    #[serde(default)]
    pub pitching_change: bool,
    #[serde(default)]
    pub walk_off: bool,
}

impl PlayEvent {
    pub fn is_plate_appearance(&self) -> bool {
        self.outcome.is_some()
    }
}

// ============================================================================
// Warnings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    NoRelieverAvailable,
    EmptyPinchHitPool,
    UsageHardCap,
    LineupRepairFailed,
    PlateAppearanceCap,
    RosterChangedOnRestore,
    SkippedIllegalSubstitution,
}

/// A recoverable degradation recorded during a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GameWarning {
    pub kind: WarningKind,
    pub inning: u8,
    pub half: Half,
    pub message: String,
}

// ============================================================================
// Box score
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TeamBox {
    pub team_id: String,
    pub runs_by_inning: Vec<u16>,
    pub runs: u16,
    pub hits: u16,
    pub errors: u16,
    pub left_on_base: u16,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PitcherLine {
    pub team_id: String,
    pub pitcher_id: PlayerId,
    pub name: String,
    pub outs_recorded: u32,
    pub batters_faced: u32,
    pub hits: u32,
    pub walks: u32,
    pub runs: u32,
    pub earned_runs: u32,
}

impl PitcherLine {
    /// Innings pitched in the conventional `6.1` notation.
    pub fn innings_pitched(&self) -> String {
        format!("{}.{}", self.outs_recorded / 3, self.outs_recorded % 3)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct BoxScore {
    pub away: TeamBox,
    pub home: TeamBox,
    pub pitchers: Vec<PitcherLine>,
}

/// JSON schema of the play log records, for the persistence collaborator.
pub fn play_event_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(PlayEvent);
    serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
}
