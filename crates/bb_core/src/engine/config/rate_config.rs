//! Rate model configuration

use serde::{Deserialize, Serialize};

/// How batter, pitcher and league rates are combined per outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlendFormula {
    /// `batter * pitcher / league`, then renormalize.
    #[default]
    OddsRatio,
    /// Log5 on per-outcome odds: `o_b * o_p / o_l`, mapped back to a probability.
    Log5,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConfig {
    /// Allowed deviation of an input rate table's sum from 1.0 (default: 0.25)
    pub sum_tolerance: f64,
    /// Floor applied to every input rate before blending (default: 1e-4)
    pub epsilon: f64,
    pub blend: BlendFormula,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self { sum_tolerance: 0.25, epsilon: 1e-4, blend: BlendFormula::OddsRatio }
    }
}
