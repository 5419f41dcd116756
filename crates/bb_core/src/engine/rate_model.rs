//! Plate appearance outcome model
//!
//! Blends batter, pitcher and league rates into one distribution and samples
//! from it. Everything here is a pure function of its inputs plus the random
//! source the caller hands in, so a seeded game replays bit-for-bit.

use rand::Rng;

use super::config::{BlendFormula, RateConfig};
use crate::error::Result;
use crate::models::{
    Base, BaserunningState, EventRates, Handedness, Outcome, OutcomeTable, PlayerId,
    ProbabilityDistribution, SplitRates,
};

// ============================================================================
// Matchup
// ============================================================================

/// One participant of a matchup: split rates plus the hand they use.
///
/// For a batter `hand` is the batting side (switch hitters allowed), for a
/// pitcher it is the throwing hand.
#[derive(Debug, Clone, Copy)]
pub struct MatchupSide<'a> {
    pub id: &'a PlayerId,
    pub rates: &'a SplitRates,
    pub hand: Handedness,
}

/// Built fresh for every plate appearance.
#[derive(Debug, Clone, Copy)]
pub struct Matchup<'a> {
    pub batter: MatchupSide<'a>,
    pub pitcher: MatchupSide<'a>,
    pub league: &'a EventRates,
    pub year: u16,
}

impl<'a> Matchup<'a> {
    /// Side the batter actually hits from against this pitcher.
    pub fn batting_side(&self) -> Handedness {
        self.batter.hand.batting_side_against(self.pitcher.hand.throwing_hand())
    }

    /// Batter rates against the pitcher's arm, pitcher rates against the
    /// batter's effective side.
    pub fn resolved_rates(&self) -> (&'a EventRates, &'a EventRates) {
        let batter = self.batter.rates.against(self.pitcher.hand.throwing_hand());
        let pitcher = self.pitcher.rates.against(self.batting_side());
        (batter, pitcher)
    }
}

// ============================================================================
// RateModel
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RateModel {
    config: RateConfig,
}

impl RateModel {
    pub fn new(config: RateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RateConfig {
        &self.config
    }

    /// Blend the matchup into a normalized distribution.
    ///
    /// Fails when any input split is outside the sum tolerance, or holds a
    /// negative or non-finite rate.
    pub fn predict(&self, matchup: &Matchup<'_>) -> Result<ProbabilityDistribution> {
        let tolerance = self.config.sum_tolerance;
        let (batter, pitcher) = matchup.resolved_rates();
        let batter_split = split_label(matchup.pitcher.hand.throwing_hand());
        let pitcher_split = split_label(matchup.batting_side());

        batter.validate(matchup.batter.id.as_str(), batter_split, tolerance)?;
        pitcher.validate(matchup.pitcher.id.as_str(), pitcher_split, tolerance)?;
        matchup.league.validate("league", &matchup.year.to_string(), tolerance)?;

        let weights = self.blend(batter, pitcher, matchup.league);
        ProbabilityDistribution::normalize(weights)
    }

    /// Per-outcome blend of clamped inputs (not yet normalized).
    pub fn blend(&self, batter: &EventRates, pitcher: &EventRates, league: &EventRates) -> OutcomeTable {
        let eps = self.config.epsilon;
        let mut weights = OutcomeTable::zeros();
        for outcome in Outcome::ALL {
            let b = batter.get(outcome).max(eps);
            let p = pitcher.get(outcome).max(eps);
            let l = league.get(outcome).max(eps);
            let w = match self.config.blend {
                BlendFormula::OddsRatio => b * p / l,
                BlendFormula::Log5 => {
                    let odds = odds(b) * odds(p) / odds(l);
                    odds / (1.0 + odds)
                }
            };
            weights.set(outcome, w);
        }
        weights
    }

    /// Single uniform draw against the cumulative distribution.
    pub fn sample<R: Rng + ?Sized>(distribution: &ProbabilityDistribution, rng: &mut R) -> Outcome {
        let draw: f64 = rng.gen();
        let mut cumulative = 0.0;
        let mut last_possible = Outcome::Strikeout;
        for (outcome, p) in distribution.iter() {
            if p <= 0.0 {
                continue;
            }
            cumulative += p;
            last_possible = outcome;
            if draw < cumulative {
                return outcome;
            }
        }
        // Rounding left the cumulative sum a hair under the draw
        last_possible
    }

    pub fn simulate<R: Rng + ?Sized>(&self, matchup: &Matchup<'_>, rng: &mut R) -> Result<Outcome> {
        let distribution = self.predict(matchup)?;
        Ok(Self::sample(&distribution, rng))
    }

    /// Outcomes that cannot happen from the given base/out state.
    pub fn impossible_outcomes(bases: &BaserunningState) -> Vec<Outcome> {
        let mut excluded = Vec::new();
        if bases.is_empty() {
            excluded.push(Outcome::FieldersChoice);
            excluded.push(Outcome::SacrificeBunt);
        } else if bases.outs >= 2 {
            excluded.push(Outcome::SacrificeBunt);
        }
        if bases.outs >= 2 || !bases.is_occupied(Base::Third) {
            excluded.push(Outcome::SacrificeFly);
        }
        excluded
    }

    /// Strip situationally impossible outcomes and renormalize.
    pub fn situational(
        distribution: &ProbabilityDistribution,
        bases: &BaserunningState,
    ) -> Result<ProbabilityDistribution> {
        distribution.without(&Self::impossible_outcomes(bases))
    }
}

#[inline]
fn odds(p: f64) -> f64 {
    let p = p.min(1.0 - 1e-9);
    p / (1.0 - p)
}

fn split_label(opponent: Handedness) -> &'static str {
    match opponent {
        Handedness::Left => "vs L",
        _ => "vs R",
    }
}

// ========== Tests ==========
