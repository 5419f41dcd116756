//! Lineup and roster construction settings

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupConfig {
    /// Weighted-random assembly attempts before the deterministic fallback (default: 25)
    pub max_attempts: u32,
    /// Minimum games-started share for a pitcher to be a starting candidate (default: 0.30)
    pub starter_gs_rate_floor: f64,
    /// Typical relief BF at or above which a reliever is a long man (default: 7.0)
    pub long_relief_bfp: f64,
    /// Games-started share that marks a rotation arm, kept out of the bullpen (default: 0.6)
    pub rotation_gs_rate: f64,
    /// Weight factor for a fielder playing away from their primary position (default: 0.5)
    pub secondary_position_weight: f64,
}

impl Default for LineupConfig {
    fn default() -> Self {
        Self {
            max_attempts: 25,
            starter_gs_rate_floor: 0.30,
            long_relief_bfp: 7.0,
            rotation_gs_rate: 0.6,
            secondary_position_weight: 0.5,
        }
    }
}
