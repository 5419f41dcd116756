//! Usage multiplier thresholds for lineup and starting pitcher selection.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    // === Over-use ===
    /// Ratio above which weight starts to fall gently (default: 1.00)
    pub soft_threshold: f64,
    /// Ratio above which the penalty becomes steep (default: 1.25)
    pub steep_threshold: f64,
    /// Ratio above which a hard-cap warning is raised (default: 1.50)
    pub hard_cap: f64,
    /// Weight at `steep_threshold` (default: 0.5)
    pub steep_floor: f64,
    /// Weight at and beyond `hard_cap` (default: 0.05)
    pub hard_cap_floor: f64,

    // === Under-use ===
    /// Ratio below which a player is considered underused (default: 0.85)
    pub underuse_threshold: f64,
    /// Maximum weight boost for a fully unused player (default: 1.6)
    pub underuse_max_boost: f64,

    /// Prorated volume below which ratios are ignored (default: 5.0)
    pub min_prorated_target: f64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            soft_threshold: 1.0,
            steep_threshold: 1.25,
            hard_cap: 1.5,
            steep_floor: 0.5,
            hard_cap_floor: 0.05,
            underuse_threshold: 0.85,
            underuse_max_boost: 1.6,
            min_prorated_target: 5.0,
        }
    }
}
