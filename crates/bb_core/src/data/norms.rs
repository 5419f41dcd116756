//! League-season norms consumed by the manager and rate model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::EventRates;

/// Inning ranges used to bucket reliever workloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InningBand {
    Early,
    Middle,
    Late,
}

impl InningBand {
    pub fn for_inning(inning: u8) -> Self {
        match inning {
            0..=5 => InningBand::Early,
            6..=7 => InningBand::Middle,
            _ => InningBand::Late,
        }
    }
}

/// Average batters faced per relief outing, by the inning the reliever entered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelieverBfpNorms {
    pub early: f64,
    pub middle: f64,
    pub late: f64,
}

impl Default for RelieverBfpNorms {
    fn default() -> Self {
        Self { early: 8.0, middle: 5.5, late: 4.3 }
    }
}

impl RelieverBfpNorms {
    pub fn for_band(&self, band: InningBand) -> f64 {
        match band {
            InningBand::Early => self.early,
            InningBand::Middle => self.middle,
            InningBand::Late => self.late,
        }
    }
}

/// Starter batters-faced thresholds: begin considering a pull, pull is likely,
/// pull is mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullThresholds {
    pub consider_bfp: u32,
    pub likely_bfp: u32,
    pub hard_limit_bfp: u32,
}

impl PullThresholds {
    pub fn is_ordered(&self) -> bool {
        self.consider_bfp < self.likely_bfp && self.likely_bfp <= self.hard_limit_bfp
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SeasonNorms {
    #[validate(range(min = 1871, max = 2100))]
    pub year: u16,
    /// League-average outcome rates (the baseline divided out by the rate model).
    pub league_rates: EventRates,
    /// League-average rates of pitchers at the plate; falls back to `league_rates`.
    #[serde(default)]
    pub pitcher_batting_rates: Option<EventRates>,
    #[validate(range(min = 1.0, max = 60.0))]
    pub starter_avg_bfp: f64,
    #[serde(default)]
    pub reliever_avg_bfp: RelieverBfpNorms,
    /// Pinch-hit appearances per team game.
    #[validate(range(min = 0.0, max = 10.0))]
    pub pinch_hits_per_game: f64,
    /// Overrides the era table in the manager config.
    #[serde(default)]
    pub pull_thresholds: Option<PullThresholds>,
}

impl SeasonNorms {
    pub fn pitcher_batting(&self) -> &EventRates {
        self.pitcher_batting_rates.as_ref().unwrap_or(&self.league_rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inning_bands() {
        assert_eq!(InningBand::for_inning(1), InningBand::Early);
        assert_eq!(InningBand::for_inning(6), InningBand::Middle);
        assert_eq!(InningBand::for_inning(8), InningBand::Late);
        assert_eq!(InningBand::for_inning(12), InningBand::Late);
    }

    #[test]
    fn test_threshold_ordering() {
        let t = PullThresholds { consider_bfp: 24, likely_bfp: 28, hard_limit_bfp: 35 };
        assert!(t.is_ordered());
        let bad = PullThresholds { consider_bfp: 30, likely_bfp: 28, hard_limit_bfp: 35 };
        assert!(!bad.is_ordered());
    }
}
