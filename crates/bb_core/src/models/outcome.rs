//! Plate appearance outcomes and 16-key outcome tables.
//!
//! `OutcomeTable` is the shared shape of per-player `EventRates` and of the
//! blended `ProbabilityDistribution`. It serializes as a map keyed by the
//! camelCase outcome name (`"homeRun": 0.031`).

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

pub const OUTCOME_COUNT: usize = 16;

// ============================================================================
// Outcome
// ============================================================================

/// Closed set of plate appearance results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Single,
    Double,
    Triple,
    HomeRun,
    Walk,
    HitByPitch,
    Strikeout,
    GroundOut,
    FlyOut,
    LineOut,
    PopOut,
    SacrificeFly,
    SacrificeBunt,
    FieldersChoice,
    ReachedOnError,
    CatcherInterference,
}

impl Outcome {
    /// Fixed iteration order. Sampling walks the cumulative distribution in this order.
    pub const ALL: [Outcome; OUTCOME_COUNT] = [
        Outcome::Single,
        Outcome::Double,
        Outcome::Triple,
        Outcome::HomeRun,
        Outcome::Walk,
        Outcome::HitByPitch,
        Outcome::Strikeout,
        Outcome::GroundOut,
        Outcome::FlyOut,
        Outcome::LineOut,
        Outcome::PopOut,
        Outcome::SacrificeFly,
        Outcome::SacrificeBunt,
        Outcome::FieldersChoice,
        Outcome::ReachedOnError,
        Outcome::CatcherInterference,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_hit(self) -> bool {
        matches!(self, Outcome::Single | Outcome::Double | Outcome::Triple | Outcome::HomeRun)
    }

    /// Extra-base hits other than the home run (walk-off downgrade candidates).
    #[inline]
    pub fn is_extra_base_hit(self) -> bool {
        matches!(self, Outcome::Double | Outcome::Triple | Outcome::HomeRun)
    }

    /// Outcomes where the batter is retired on the play.
    #[inline]
    pub fn is_batter_out(self) -> bool {
        matches!(
            self,
            Outcome::Strikeout
                | Outcome::GroundOut
                | Outcome::FlyOut
                | Outcome::LineOut
                | Outcome::PopOut
                | Outcome::SacrificeFly
                | Outcome::SacrificeBunt
        )
    }

    /// Free passes: only forced runners move.
    #[inline]
    pub fn is_base_award(self) -> bool {
        matches!(self, Outcome::Walk | Outcome::HitByPitch | Outcome::CatcherInterference)
    }

    /// Runs driven in on these plays are charged as unearned.
    #[inline]
    pub fn is_defensive_miscue(self) -> bool {
        matches!(self, Outcome::ReachedOnError | Outcome::CatcherInterference)
    }

    /// Does the pitcher get charged with a baserunner.
    #[inline]
    pub fn is_pitcher_baserunner(self) -> bool {
        self.is_hit() || matches!(self, Outcome::Walk | Outcome::HitByPitch)
    }

    pub fn total_bases(self) -> u8 {
        match self {
            Outcome::Single => 1,
            Outcome::Double => 2,
            Outcome::Triple => 3,
            Outcome::HomeRun => 4,
            _ => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Single => "singles",
            Outcome::Double => "doubles",
            Outcome::Triple => "triples",
            Outcome::HomeRun => "homers",
            Outcome::Walk => "walks",
            Outcome::HitByPitch => "is hit by a pitch",
            Outcome::Strikeout => "strikes out",
            Outcome::GroundOut => "grounds out",
            Outcome::FlyOut => "flies out",
            Outcome::LineOut => "lines out",
            Outcome::PopOut => "pops out",
            Outcome::SacrificeFly => "hits a sacrifice fly",
            Outcome::SacrificeBunt => "lays down a sacrifice bunt",
            Outcome::FieldersChoice => "reaches on a fielder's choice",
            Outcome::ReachedOnError => "reaches on an error",
            Outcome::CatcherInterference => "reaches on catcher's interference",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Outcome::Single => "single",
            Outcome::Double => "double",
            Outcome::Triple => "triple",
            Outcome::HomeRun => "homeRun",
            Outcome::Walk => "walk",
            Outcome::HitByPitch => "hitByPitch",
            Outcome::Strikeout => "strikeout",
            Outcome::GroundOut => "groundOut",
            Outcome::FlyOut => "flyOut",
            Outcome::LineOut => "lineOut",
            Outcome::PopOut => "popOut",
            Outcome::SacrificeFly => "sacrificeFly",
            Outcome::SacrificeBunt => "sacrificeBunt",
            Outcome::FieldersChoice => "fieldersChoice",
            Outcome::ReachedOnError => "reachedOnError",
            Outcome::CatcherInterference => "catcherInterference",
        };
        f.write_str(name)
    }
}

// ============================================================================
// OutcomeTable
// ============================================================================

/// Dense table with one value per outcome.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Outcome, f64>", into = "BTreeMap<Outcome, f64>")]
pub struct OutcomeTable {
    values: [f64; OUTCOME_COUNT],
}

/// A player's (or league's) outcome rates against one opposing handedness.
pub type EventRates = OutcomeTable;

impl OutcomeTable {
    pub fn zeros() -> Self {
        Self::default()
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Outcome, f64)>,
    {
        let mut table = Self::zeros();
        for (outcome, value) in pairs {
            table.values[outcome.index()] = value;
        }
        table
    }

    #[inline]
    pub fn get(&self, outcome: Outcome) -> f64 {
        self.values[outcome.index()]
    }

    #[inline]
    pub fn set(&mut self, outcome: Outcome, value: f64) {
        self.values[outcome.index()] = value;
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Outcome, f64)> + '_ {
        Outcome::ALL.iter().map(move |&o| (o, self.values[o.index()]))
    }

    /// Check a rate table against the ingestion tolerance.
    ///
    /// Small historical samples rarely sum exactly to one, so the sum may drift
    /// by up to `tolerance`. Any negative or non-finite entry is rejected outright.
    pub fn validate(&self, owner: &str, split: &str, tolerance: f64) -> Result<()> {
        for (outcome, value) in self.iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidProbability {
                    owner: owner.to_string(),
                    outcome: outcome.to_string(),
                    value,
                });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(SimError::InvalidRates {
                owner: owner.to_string(),
                split: split.to_string(),
                sum,
                tolerance,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Quality signals (used by lineup ordering and managerial choices)
    // ------------------------------------------------------------------------

    /// Share of plate appearances ending with the batter safely on base.
    pub fn on_base_share(&self) -> f64 {
        [
            Outcome::Single,
            Outcome::Double,
            Outcome::Triple,
            Outcome::HomeRun,
            Outcome::Walk,
            Outcome::HitByPitch,
        ]
        .iter()
        .map(|&o| self.get(o))
        .sum()
    }

    /// Total bases per official at-bat, approximated from rates.
    pub fn slugging_share(&self) -> f64 {
        let bases: f64 = Outcome::ALL.iter().map(|&o| self.get(o) * o.total_bases() as f64).sum();
        let non_at_bat = self.get(Outcome::Walk)
            + self.get(Outcome::HitByPitch)
            + self.get(Outcome::SacrificeFly)
            + self.get(Outcome::SacrificeBunt)
            + self.get(Outcome::CatcherInterference);
        let at_bats = (self.sum() - non_at_bat).max(1e-6);
        bases / at_bats
    }

    pub fn contact_share(&self) -> f64 {
        (1.0 - self.get(Outcome::Strikeout)).max(0.0)
    }

    /// On-base plus slugging, the default hitter quality ranking.
    pub fn ops(&self) -> f64 {
        self.on_base_share() + self.slugging_share()
    }
}

impl From<BTreeMap<Outcome, f64>> for OutcomeTable {
    fn from(map: BTreeMap<Outcome, f64>) -> Self {
        Self::from_pairs(map)
    }
}

impl From<OutcomeTable> for BTreeMap<Outcome, f64> {
    fn from(table: OutcomeTable) -> Self {
        table.iter().collect()
    }
}

// ============================================================================
// ProbabilityDistribution
// ============================================================================

/// Normalized outcome distribution. Only constructible through normalization,
/// so the sum is always 1 within floating point error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProbabilityDistribution {
    table: OutcomeTable,
}

impl ProbabilityDistribution {
    /// Normalize non-negative weights into a distribution.
    pub fn normalize(weights: OutcomeTable) -> Result<Self> {
        for (outcome, value) in weights.iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidProbability {
                    owner: "distribution".to_string(),
                    outcome: outcome.to_string(),
                    value,
                });
            }
        }
        let total = weights.sum();
        if total <= 0.0 {
            return Err(SimError::EmptyDistribution);
        }
        let mut table = OutcomeTable::zeros();
        for (outcome, value) in weights.iter() {
            table.set(outcome, value / total);
        }
        Ok(Self { table })
    }

    #[inline]
    pub fn probability(&self, outcome: Outcome) -> f64 {
        self.table.get(outcome)
    }

    pub fn sum(&self) -> f64 {
        self.table.sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Outcome, f64)> + '_ {
        self.table.iter()
    }

    pub fn as_table(&self) -> &OutcomeTable {
        &self.table
    }

    /// Drop the listed outcomes and renormalize what is left.
    pub fn without(&self, excluded: &[Outcome]) -> Result<Self> {
        if excluded.is_empty() {
            return Ok(*self);
        }
        let mut weights = self.table;
        for &outcome in excluded {
            weights.set(outcome, 0.0);
        }
        Self::normalize(weights)
    }
}
