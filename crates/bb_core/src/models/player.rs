//! Player identity, handedness, defensive positions and per-player rate records.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::outcome::EventRates;
use crate::error::Result;

// ============================================================================
// PlayerId
// ============================================================================

/// Stable historical player identifier (e.g. `"ruthb101"`).
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ============================================================================
// Handedness
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum Handedness {
    #[serde(rename = "L", alias = "left")]
    Left,
    #[default]
    #[serde(rename = "R", alias = "right")]
    Right,
    /// Switch hitter ("B" in historical data)
    #[serde(rename = "B", alias = "S", alias = "switch")]
    Switch,
}

impl Handedness {
    pub fn opposite(self) -> Self {
        match self {
            Handedness::Left => Handedness::Right,
            Handedness::Right | Handedness::Switch => Handedness::Left,
        }
    }

    /// Side of the plate a batter with this handedness uses against a pitcher
    /// throwing with `pitcher_throws`. Switch hitters bat opposite the throwing hand.
    pub fn batting_side_against(self, pitcher_throws: Handedness) -> Handedness {
        match self {
            Handedness::Switch => pitcher_throws.throwing_hand().opposite(),
            side => side,
        }
    }

    /// Ambidextrous pitchers are treated as right-handed.
    pub fn throwing_hand(self) -> Handedness {
        match self {
            Handedness::Left => Handedness::Left,
            Handedness::Right | Handedness::Switch => Handedness::Right,
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Handedness::Left => "L",
            Handedness::Right => "R",
            Handedness::Switch => "B",
        }
    }
}

// ============================================================================
// Position
// ============================================================================

/// Defensive position (scorekeeping numbers 1-9) plus DH and the transient
/// pinch-hitter placeholder used between a pinch-hit and the next audit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Position {
    #[serde(rename = "P")]
    Pitcher,
    #[serde(rename = "C")]
    Catcher,
    #[serde(rename = "1B")]
    FirstBase,
    #[serde(rename = "2B")]
    SecondBase,
    #[serde(rename = "3B")]
    ThirdBase,
    #[serde(rename = "SS")]
    Shortstop,
    #[serde(rename = "LF")]
    LeftField,
    #[serde(rename = "CF")]
    CenterField,
    #[serde(rename = "RF")]
    RightField,
    #[serde(rename = "DH")]
    DesignatedHitter,
    #[serde(rename = "PH")]
    PinchHitter,
}

impl Position {
    /// Fielding positions other than pitcher.
    pub const FIELDERS: [Position; 8] = [
        Position::Catcher,
        Position::FirstBase,
        Position::SecondBase,
        Position::ThirdBase,
        Position::Shortstop,
        Position::LeftField,
        Position::CenterField,
        Position::RightField,
    ];

    /// Fill order for lineup construction: scarce defensive positions first.
    pub const SCARCITY_ORDER: [Position; 8] = [
        Position::Catcher,
        Position::Shortstop,
        Position::SecondBase,
        Position::CenterField,
        Position::ThirdBase,
        Position::RightField,
        Position::LeftField,
        Position::FirstBase,
    ];

    /// Scorekeeping number, `None` for DH and placeholders.
    pub fn number(self) -> Option<u8> {
        match self {
            Position::Pitcher => Some(1),
            Position::Catcher => Some(2),
            Position::FirstBase => Some(3),
            Position::SecondBase => Some(4),
            Position::ThirdBase => Some(5),
            Position::Shortstop => Some(6),
            Position::LeftField => Some(7),
            Position::CenterField => Some(8),
            Position::RightField => Some(9),
            Position::DesignatedHitter | Position::PinchHitter => None,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Position::Pitcher),
            2 => Some(Position::Catcher),
            3 => Some(Position::FirstBase),
            4 => Some(Position::SecondBase),
            5 => Some(Position::ThirdBase),
            6 => Some(Position::Shortstop),
            7 => Some(Position::LeftField),
            8 => Some(Position::CenterField),
            9 => Some(Position::RightField),
            _ => None,
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Position::Pitcher => "P",
            Position::Catcher => "C",
            Position::FirstBase => "1B",
            Position::SecondBase => "2B",
            Position::ThirdBase => "3B",
            Position::Shortstop => "SS",
            Position::LeftField => "LF",
            Position::CenterField => "CF",
            Position::RightField => "RF",
            Position::DesignatedHitter => "DH",
            Position::PinchHitter => "PH",
        }
    }

    #[inline]
    pub fn is_placeholder(self) -> bool {
        matches!(self, Position::PinchHitter)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

// ============================================================================
// Rate records
// ============================================================================

/// Outcome rates split by opposing handedness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRates {
    pub vs_left: EventRates,
    pub vs_right: EventRates,
}

impl SplitRates {
    pub fn uniform(rates: EventRates) -> Self {
        Self { vs_left: rates, vs_right: rates }
    }

    /// Rates against an opponent of the given (effective) hand.
    pub fn against(&self, opponent: Handedness) -> &EventRates {
        match opponent {
            Handedness::Left => &self.vs_left,
            Handedness::Right | Handedness::Switch => &self.vs_right,
        }
    }

    pub fn validate(&self, owner: &str, tolerance: f64) -> Result<()> {
        self.vs_left.validate(owner, "vs L", tolerance)?;
        self.vs_right.validate(owner, "vs R", tolerance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BattingProfile {
    pub rates: SplitRates,
    /// Season plate appearances (actual historical volume).
    pub plate_appearances: u32,
    #[serde(default)]
    pub games: u32,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PitchingProfile {
    pub rates: SplitRates,
    pub games: u32,
    pub games_started: u32,
    #[serde(default)]
    pub complete_games: u32,
    #[serde(default)]
    pub saves: u32,
    #[serde(default)]
    pub holds: u32,
    #[validate(range(min = 1))]
    pub batters_faced: u32,
}

impl PitchingProfile {
    pub fn games_started_rate(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.games_started as f64 / self.games as f64
    }

    pub fn complete_game_rate(&self) -> f64 {
        if self.games_started == 0 {
            return 0.0;
        }
        self.complete_games as f64 / self.games_started as f64
    }

    pub fn relief_appearances(&self) -> u32 {
        self.games.saturating_sub(self.games_started)
    }

    /// Typical batters faced per relief outing, estimated by charging each
    /// start with `starter_bfp` batters.
    pub fn typical_relief_bfp(&self, starter_bfp: f64) -> Option<f64> {
        let apps = self.relief_appearances();
        if apps == 0 {
            return None;
        }
        let relief_bf = self.batters_faced as f64 - self.games_started as f64 * starter_bfp;
        Some((relief_bf / apps as f64).max(1.0))
    }

    /// Baserunners allowed per batter faced, averaged over both splits.
    pub fn baserunner_rate(&self) -> f64 {
        (self.rates.vs_left.on_base_share() + self.rates.vs_right.on_base_share()) / 2.0
    }
}

/// One roster member as delivered by the data-preparation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RosterPlayer {
    pub id: PlayerId,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub bats: Handedness,
    #[serde(default)]
    pub throws: Handedness,
    pub primary_position: Position,
    /// Innings played at each defensive position during the season.
    #[serde(default)]
    pub position_innings: BTreeMap<Position, f64>,
    #[serde(default)]
    pub batting: Option<BattingProfile>,
    #[serde(default)]
    pub pitching: Option<PitchingProfile>,
}

impl RosterPlayer {
    pub fn is_pitcher(&self) -> bool {
        self.primary_position == Position::Pitcher
    }

    /// Eligible at a position if it is the primary position or any innings were logged there.
    /// Any non-pitcher with a batting record may DH.
    pub fn is_eligible_at(&self, position: Position) -> bool {
        match position {
            Position::DesignatedHitter => !self.is_pitcher() && self.batting.is_some(),
            Position::PinchHitter => self.batting.is_some(),
            Position::Pitcher => self.pitching.is_some() || self.is_pitcher(),
            pos => {
                self.primary_position == pos
                    || self.position_innings.get(&pos).is_some_and(|&inn| inn > 0.0)
            }
        }
    }

    pub fn plate_appearances(&self) -> u32 {
        self.batting.as_ref().map_or(0, |b| b.plate_appearances)
    }

    pub fn batting_rates(&self) -> Option<&SplitRates> {
        self.batting.as_ref().map(|b| &b.rates)
    }

    pub fn pitching_rates(&self) -> Option<&SplitRates> {
        self.pitching.as_ref().map(|p| &p.rates)
    }

    /// Validate every rate table this player carries.
    pub fn validate_rates(&self, tolerance: f64) -> Result<()> {
        if let Some(batting) = &self.batting {
            batting.rates.validate(self.id.as_str(), tolerance)?;
        }
        if let Some(pitching) = &self.pitching {
            pitching.rates.validate(self.id.as_str(), tolerance)?;
        }
        Ok(())
    }
}
